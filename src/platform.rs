//! OS page source.
//!
//! `acquire_pages` returns a page-aligned anonymous region of exactly
//! `count * PAGE_SIZE` bytes, or null when the OS refuses. `release_pages`
//! gives a region back. During normal operation the pool holds its pages
//! for the process lifetime; release exists for tests and for callers that
//! manage spans directly.

use crate::PAGE_SIZE;
use core::ptr;

#[cfg(unix)]
pub fn acquire_pages(count: usize) -> *mut u8 {
    let Some(len) = count.checked_mul(PAGE_SIZE) else {
        return ptr::null_mut();
    };
    if len == 0 {
        return ptr::null_mut();
    }

    let addr = unsafe {
        libc::mmap(
            ptr::null_mut(),
            len,
            libc::PROT_READ | libc::PROT_WRITE,
            libc::MAP_PRIVATE | libc::MAP_ANONYMOUS,
            -1,
            0,
        )
    };
    if addr == libc::MAP_FAILED {
        ptr::null_mut()
    } else {
        addr.cast()
    }
}

/// # Safety
/// `base` must be a region of `count` pages obtained from `acquire_pages`
/// and no longer referenced.
#[cfg(unix)]
pub unsafe fn release_pages(base: *mut u8, count: usize) {
    unsafe { libc::munmap(base.cast(), count * PAGE_SIZE) };
}

#[cfg(windows)]
pub fn acquire_pages(count: usize) -> *mut u8 {
    use windows_sys::Win32::System::Memory::{
        VirtualAlloc, MEM_COMMIT, MEM_RESERVE, PAGE_READWRITE,
    };

    let Some(len) = count.checked_mul(PAGE_SIZE) else {
        return ptr::null_mut();
    };
    if len == 0 {
        return ptr::null_mut();
    }

    // VirtualAlloc regions are 64 KiB aligned, which covers PAGE_SIZE.
    let addr =
        unsafe { VirtualAlloc(ptr::null(), len, MEM_COMMIT | MEM_RESERVE, PAGE_READWRITE) };
    addr.cast()
}

/// # Safety
/// `base` must be a region of `count` pages obtained from `acquire_pages`
/// and no longer referenced.
#[cfg(windows)]
pub unsafe fn release_pages(base: *mut u8, _count: usize) {
    use windows_sys::Win32::System::Memory::{VirtualFree, MEM_RELEASE};

    unsafe { VirtualFree(base.cast(), 0, MEM_RELEASE) };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pages_are_aligned_and_writable() {
        let base = acquire_pages(2);
        assert!(!base.is_null());
        assert_eq!(base as usize % PAGE_SIZE, 0);
        unsafe {
            base.write_bytes(0xEE, 2 * PAGE_SIZE);
            assert_eq!(*base.add(2 * PAGE_SIZE - 1), 0xEE);
            release_pages(base, 2);
        }
    }

    #[test]
    fn zero_pages_is_null() {
        assert!(acquire_pages(0).is_null());
    }
}
