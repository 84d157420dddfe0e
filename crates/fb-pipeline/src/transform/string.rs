use super::{MarshalContext, TypeTransformer};
use fb_core::{NativeType, Result, TypeRef, Value};
use std::ffi::{c_char, CStr};
use std::ptr;

/// `string` <-> NUL-terminated UTF-8 buffer.
#[derive(Debug, Default, Clone, Copy)]
pub struct StringTransformer;

impl TypeTransformer for StringTransformer {
    fn lowered_type(&self) -> TypeRef {
        TypeRef::Native(NativeType::Pointer)
    }

    fn lower(&self, value: Value, ctx: &mut MarshalContext<'_, '_>) -> Result<Value> {
        let text = match value {
            Value::Str(text) => text,
            other => return Err(ctx.error(format!("expected a string, got {}", other.kind()))),
        };
        if text.as_bytes().contains(&0) {
            return Err(ctx.error("string contains an interior NUL byte"));
        }
        let buf = ctx.allocate(text.len() + 1)?;
        unsafe {
            ptr::copy_nonoverlapping(text.as_ptr(), buf as *mut u8, text.len());
            *(buf as *mut u8).add(text.len()) = 0;
        }
        Ok(Value::Pointer(buf))
    }

    fn raise(&self, value: Value, ctx: &mut MarshalContext<'_, '_>) -> Result<Value> {
        let ptr = match value {
            Value::Pointer(ptr) => ptr,
            other => return Err(ctx.error(format!("expected a pointer, got {}", other.kind()))),
        };
        if ptr.is_null() {
            return Err(ctx.error("native code returned a null string"));
        }
        let text = unsafe { CStr::from_ptr(ptr as *const c_char) }
            .to_str()
            .map(str::to_owned)
            .map_err(|err| ctx.error(format!("returned string is not UTF-8: {err}")));
        if ctx.ownership().caller_frees() {
            ctx.release_after_call(ptr);
        }
        text.map(Value::Str)
    }
}
