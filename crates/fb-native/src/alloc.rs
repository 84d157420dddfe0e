use fb_core::{NativeType, Value};
use std::ffi::c_void;
use std::ptr;

/// Allocator for unmanaged buffers handed across the native boundary.
///
/// Buffers whose ownership passes to native code must come from the
/// allocator the native side frees with, which is why the default is libc.
pub trait NativeAllocator: Send + Sync {
    /// Returns null when the allocation fails.
    fn allocate(&self, size: usize) -> *mut c_void;

    /// # Safety
    ///
    /// `ptr` must come from `allocate` on the same allocator and not be freed twice.
    unsafe fn free(&self, ptr: *mut c_void);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct LibcAllocator;

impl NativeAllocator for LibcAllocator {
    fn allocate(&self, size: usize) -> *mut c_void {
        unsafe { libc::malloc(size.max(1)) }
    }

    unsafe fn free(&self, ptr: *mut c_void) {
        unsafe { libc::free(ptr) }
    }
}

/// Buffers owned by one call activation, freed when the activation ends.
///
/// Dropping the set releases every tracked buffer exactly once, whichever way
/// the call returns. A buffer handed to native code with `transfer` is freed
/// too unless the call completed and `commit_transfers` gave it away.
pub struct ScratchBuffers<'a> {
    allocator: &'a dyn NativeAllocator,
    owned: Vec<*mut c_void>,
    transferring: Vec<*mut c_void>,
}

impl<'a> ScratchBuffers<'a> {
    pub fn new(allocator: &'a dyn NativeAllocator) -> Self {
        Self {
            allocator,
            owned: Vec::new(),
            transferring: Vec::new(),
        }
    }

    pub fn allocator(&self) -> &'a dyn NativeAllocator {
        self.allocator
    }

    /// Allocate a buffer; returns null on failure.
    pub fn allocate(&self, size: usize) -> *mut c_void {
        self.allocator.allocate(size)
    }

    /// Free `ptr` when the activation ends.
    pub fn track(&mut self, ptr: *mut c_void) {
        if !ptr.is_null() {
            self.owned.push(ptr);
        }
    }

    /// `ptr` becomes native-owned once the call completes.
    pub fn transfer(&mut self, ptr: *mut c_void) {
        if !ptr.is_null() {
            self.transferring.push(ptr);
        }
    }

    /// The native call returned; transferred buffers now belong to it.
    pub fn commit_transfers(&mut self) {
        self.transferring.clear();
    }

    pub fn tracked(&self) -> usize {
        self.owned.len() + self.transferring.len()
    }
}

impl Drop for ScratchBuffers<'_> {
    fn drop(&mut self) {
        for ptr in self.owned.drain(..).chain(self.transferring.drain(..)) {
            unsafe { self.allocator.free(ptr) };
        }
    }
}

/// Store `value` at `dst` using the native layout of `ty`.
///
/// Returns `false` if the value does not have type `ty`.
///
/// # Safety
///
/// `dst` must be valid for `ty.size()` bytes of writes.
pub unsafe fn write_value(dst: *mut c_void, ty: NativeType, value: &Value) -> bool {
    unsafe {
        match (ty, value) {
            (NativeType::Bool, Value::Bool(v)) => ptr::write_unaligned(dst as *mut u8, *v as u8),
            (NativeType::I8, Value::I8(v)) => ptr::write_unaligned(dst as *mut i8, *v),
            (NativeType::I16, Value::I16(v)) => ptr::write_unaligned(dst as *mut i16, *v),
            (NativeType::I32, Value::I32(v)) => ptr::write_unaligned(dst as *mut i32, *v),
            (NativeType::I64, Value::I64(v)) => ptr::write_unaligned(dst as *mut i64, *v),
            (NativeType::U8, Value::U8(v)) => ptr::write_unaligned(dst as *mut u8, *v),
            (NativeType::U16, Value::U16(v)) => ptr::write_unaligned(dst as *mut u16, *v),
            (NativeType::U32, Value::U32(v)) => ptr::write_unaligned(dst as *mut u32, *v),
            (NativeType::U64, Value::U64(v)) => ptr::write_unaligned(dst as *mut u64, *v),
            (NativeType::Isize, Value::Isize(v)) => ptr::write_unaligned(dst as *mut isize, *v),
            (NativeType::Usize, Value::Usize(v)) => ptr::write_unaligned(dst as *mut usize, *v),
            (NativeType::F32, Value::F32(v)) => ptr::write_unaligned(dst as *mut f32, *v),
            (NativeType::F64, Value::F64(v)) => ptr::write_unaligned(dst as *mut f64, *v),
            (NativeType::Pointer, Value::Pointer(v)) => {
                ptr::write_unaligned(dst as *mut *mut c_void, *v)
            }
            _ => return false,
        }
    }
    true
}

/// Load a value of type `ty` from `src`.
///
/// # Safety
///
/// `src` must be valid for `ty.size()` bytes of reads.
pub unsafe fn read_value(src: *const c_void, ty: NativeType) -> Value {
    unsafe {
        match ty {
            NativeType::Void => Value::Void,
            NativeType::Bool => Value::Bool(ptr::read_unaligned(src as *const u8) != 0),
            NativeType::I8 => Value::I8(ptr::read_unaligned(src as *const i8)),
            NativeType::I16 => Value::I16(ptr::read_unaligned(src as *const i16)),
            NativeType::I32 => Value::I32(ptr::read_unaligned(src as *const i32)),
            NativeType::I64 => Value::I64(ptr::read_unaligned(src as *const i64)),
            NativeType::U8 => Value::U8(ptr::read_unaligned(src as *const u8)),
            NativeType::U16 => Value::U16(ptr::read_unaligned(src as *const u16)),
            NativeType::U32 => Value::U32(ptr::read_unaligned(src as *const u32)),
            NativeType::U64 => Value::U64(ptr::read_unaligned(src as *const u64)),
            NativeType::Isize => Value::Isize(ptr::read_unaligned(src as *const isize)),
            NativeType::Usize => Value::Usize(ptr::read_unaligned(src as *const usize)),
            NativeType::F32 => Value::F32(ptr::read_unaligned(src as *const f32)),
            NativeType::F64 => Value::F64(ptr::read_unaligned(src as *const f64)),
            NativeType::Pointer => {
                Value::Pointer(ptr::read_unaligned(src as *const *mut c_void))
            }
        }
    }
}
