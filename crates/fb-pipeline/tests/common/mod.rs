#![allow(dead_code)]

use fb_pipeline::{LibcAllocator, NativeAllocator};
use std::ffi::c_void;
use std::sync::atomic::{AtomicUsize, Ordering};

/// libc allocation with counters, to check every buffer is freed exactly once.
#[derive(Default)]
pub struct CountingAllocator {
    pub allocations: AtomicUsize,
    pub frees: AtomicUsize,
}

impl CountingAllocator {
    pub fn allocations(&self) -> usize {
        self.allocations.load(Ordering::SeqCst)
    }

    pub fn frees(&self) -> usize {
        self.frees.load(Ordering::SeqCst)
    }
}

impl NativeAllocator for CountingAllocator {
    fn allocate(&self, size: usize) -> *mut c_void {
        self.allocations.fetch_add(1, Ordering::SeqCst);
        LibcAllocator.allocate(size)
    }

    unsafe fn free(&self, ptr: *mut c_void) {
        self.frees.fetch_add(1, Ordering::SeqCst);
        unsafe { LibcAllocator.free(ptr) }
    }
}

/// An allocator that is always out of memory.
pub struct FailingAllocator;

impl NativeAllocator for FailingAllocator {
    fn allocate(&self, _size: usize) -> *mut c_void {
        std::ptr::null_mut()
    }

    unsafe fn free(&self, _ptr: *mut c_void) {}
}
