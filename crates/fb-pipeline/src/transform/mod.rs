//! Lowering of complex declared types to directly passable native shapes.

mod func;
mod registry;
mod string;

pub use func::FnTransformer;
pub use registry::TransformerRegistry;
pub use string::StringTransformer;

use fb_core::{Error, Ownership, Result, TypeRef, Value};
use fb_native::ScratchBuffers;
use std::ffi::c_void;
use std::fmt;

/// Converts values of one complex declared type to and from its lowered form.
///
/// `lower` runs before the native call for a parameter, `raise` after it for
/// a return value. The lowered form must be directly passable or nullable.
pub trait TypeTransformer: Send + Sync {
    fn lowered_type(&self) -> TypeRef;

    fn lower(&self, value: Value, ctx: &mut MarshalContext<'_, '_>) -> Result<Value>;

    fn raise(&self, value: Value, ctx: &mut MarshalContext<'_, '_>) -> Result<Value>;
}

/// Which value of the call is being converted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position<'d> {
    Param { index: usize, name: &'d str },
    Return,
}

impl fmt::Display for Position<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Position::Param { name, .. } => write!(f, "parameter `{name}`"),
            Position::Return => f.write_str("return value"),
        }
    }
}

/// Per-value state handed to a transformer during one call.
pub struct MarshalContext<'c, 'a> {
    member: &'c str,
    position: Position<'c>,
    ownership: Ownership,
    scratch: &'c mut ScratchBuffers<'a>,
}

impl<'c, 'a> MarshalContext<'c, 'a> {
    pub fn new(
        member: &'c str,
        position: Position<'c>,
        ownership: Ownership,
        scratch: &'c mut ScratchBuffers<'a>,
    ) -> Self {
        Self {
            member,
            position,
            ownership,
            scratch,
        }
    }

    pub fn member(&self) -> &str {
        self.member
    }

    pub fn position(&self) -> Position<'c> {
        self.position
    }

    pub fn ownership(&self) -> Ownership {
        self.ownership
    }

    /// Allocate a native buffer for a lowered argument.
    ///
    /// A caller-frees buffer is released when the call ends. Otherwise the
    /// buffer is handed to native code once the call completes, and released
    /// only if the call never got that far.
    pub fn allocate(&mut self, size: usize) -> Result<*mut c_void> {
        let ptr = self.scratch.allocate(size);
        if ptr.is_null() {
            return Err(self.error(format!("failed to allocate {size} bytes")));
        }
        if self.ownership.caller_frees() {
            self.scratch.track(ptr);
        } else {
            self.scratch.transfer(ptr);
        }
        Ok(ptr)
    }

    /// Release a buffer received from native code when the call ends.
    pub fn release_after_call(&mut self, ptr: *mut c_void) {
        self.scratch.track(ptr);
    }

    pub fn error(&self, message: impl fmt::Display) -> Error {
        Error::marshalling(self.member, format!("{}: {message}", self.position))
    }
}
