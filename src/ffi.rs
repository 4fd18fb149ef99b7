//! C-ABI exports for external linking, gated behind `features = ["ffi"]`.
//!
//! The C side carries sizes explicitly; there is no header sniffing, so
//! `rsmempool_free` and `rsmempool_realloc` take the original size.

use crate::size_class::{class_index, MAX_BYTES};
use crate::{allocate, deallocate};
use core::ptr;

#[unsafe(no_mangle)]
pub extern "C" fn rsmempool_alloc(size: usize) -> *mut u8 {
    allocate(size)
}

/// # Safety
/// `ptr` must come from `rsmempool_alloc(size)` with this exact `size`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn rsmempool_free(ptr: *mut u8, size: usize) {
    unsafe { deallocate(ptr, size) }
}

/// # Safety
/// `ptr` must come from `rsmempool_alloc(old_size)` with this exact
/// `old_size`, or be null.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn rsmempool_realloc(
    ptr: *mut u8,
    old_size: usize,
    new_size: usize,
) -> *mut u8 {
    if ptr.is_null() {
        return allocate(new_size);
    }
    if new_size == 0 {
        unsafe { deallocate(ptr, old_size) };
        return ptr::null_mut();
    }

    // Same size class: the existing block already fits.
    if old_size > 0
        && old_size <= MAX_BYTES
        && new_size <= MAX_BYTES
        && class_index(old_size) == class_index(new_size)
    {
        return ptr;
    }

    let new_ptr = allocate(new_size);
    if !new_ptr.is_null() {
        unsafe {
            ptr::copy_nonoverlapping(ptr, new_ptr, old_size.min(new_size));
            deallocate(ptr, old_size);
        }
    }
    new_ptr
}
