use fb_core::{NativeType, Result, Value};
use fb_native::{
    call_native, DynamicLibrary, LibcAllocator, NativeSignature, ScratchBuffers, SymbolResolver,
    SymbolSlot, SymbolTable,
};
use pretty_assertions::assert_eq;
use std::ffi::c_void;
use std::sync::Arc;

extern "C" fn sum_u32(a: u32, b: u32, c: u32) -> u32 {
    a + b + c
}

#[test]
fn table_backed_slot_calls_through() -> Result<()> {
    let table = Arc::new(SymbolTable::new().with_fn("sum", sum_u32 as *const c_void));
    let slot = SymbolSlot::lazy(table, "sum", "Sum");
    let sig = NativeSignature::new(vec![NativeType::U32; 3], NativeType::U32);
    let out = unsafe {
        call_native(
            "Sum",
            slot.address()?,
            &sig,
            &[Value::U32(1), Value::U32(2), Value::U32(3)],
        )?
    };
    assert_eq!(out, Value::U32(6));
    assert!(slot.is_resolved());
    Ok(())
}

#[cfg(unix)]
#[test]
fn calls_libc_strlen_with_a_scratch_buffer() -> Result<()> {
    let libc = DynamicLibrary::open_default()?;
    let strlen = SymbolSlot::eager(&libc, "strlen", "strlen")?;
    let sig = NativeSignature::new(vec![NativeType::Pointer], NativeType::Usize);

    let alloc = LibcAllocator;
    let mut scratch = ScratchBuffers::new(&alloc);
    let text = b"hello\0";
    let buf = scratch.allocate(text.len());
    scratch.track(buf);
    unsafe { std::ptr::copy_nonoverlapping(text.as_ptr(), buf as *mut u8, text.len()) };

    let out = unsafe { call_native("strlen", strlen.address()?, &sig, &[Value::Pointer(buf)])? };
    assert_eq!(out, Value::Usize(5));
    assert!(libc.describe().contains("libc") || libc.name() == "<self>");
    Ok(())
}
