#[macro_use]
pub mod macros;

pub mod config;
pub mod decl;
pub mod error;
pub mod ty;
pub mod value;

// Re-export commonly used items for convenience
pub use tracing;

pub use config::{BindingConfig, OptionalStage, StageSet};
pub use decl::{InterfaceDecl, MemberDecl, ParamDecl, ReturnDecl};
pub use ty::{CallingConvention, NativeType, Ownership, TypeKey, TypeRef};
pub use value::{NativePrimitive, NativeValue, Record, Value};

pub type Error = crate::error::Error;
pub type Result<T> = crate::error::Result<T>;
