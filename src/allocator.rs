//! Process-wide wiring: the singleton tiers, the thread-local cache, and
//! the public entry points.
//!
//! Static state lives here. Both singletons are const-initialized, so the
//! PageCache is usable before the first CentralCache refill and there is
//! no init order to get wrong. Teardown is left to the OS.

use crate::block::FreeBlock;
use crate::central_cache::CentralCache;
use crate::page_cache::PageCache;
use crate::size_class::{class_index, MAX_BYTES};
use crate::thread_cache::ThreadCache;
use core::ptr;
use std::cell::UnsafeCell;

static CENTRAL_CACHE: CentralCache = CentralCache::new();
static PAGE_CACHE: PageCache = PageCache::new();

/// TLS slot wrapper: flushes the residual lists back to the central tier
/// when the thread exits.
struct CacheSlot(ThreadCache);

impl Drop for CacheSlot {
    fn drop(&mut self) {
        self.0.flush(&CENTRAL_CACHE);
    }
}

thread_local! {
    static THREAD_CACHE: UnsafeCell<CacheSlot> = UnsafeCell::new(CacheSlot(ThreadCache::new()));
}

/// Run `f` against this thread's cache. Returns None while TLS is being
/// created or torn down.
#[inline]
fn with_thread_cache<R>(f: impl FnOnce(&mut ThreadCache) -> R) -> Option<R> {
    THREAD_CACHE
        .try_with(|cell| {
            // SAFETY: the slot is only ever touched from its own thread,
            // and nothing in the tiers re-enters this TLS key.
            let slot = unsafe { &mut *cell.get() };
            f(&mut slot.0)
        })
        .ok()
}

/// Allocate at least `size` bytes, `ALIGNMENT`-aligned and uninitialized.
///
/// Returns null on OOM. `size == 0` yields a distinct minimum-class block.
/// Requests above `MAX_BYTES` are served as whole page spans with no
/// pooling benefit.
#[inline]
pub fn allocate(size: usize) -> *mut u8 {
    match with_thread_cache(|tc| tc.allocate(size, &CENTRAL_CACHE, &PAGE_CACHE)) {
        Some(ptr) => ptr,
        None => alloc_from_central(size),
    }
}

/// Return a block obtained from [`allocate`].
///
/// This is a sized free: the caller must pass the same `size` it allocated
/// with. Null is ignored.
///
/// # Safety
/// `ptr` must come from `allocate(size)` on this allocator with this exact
/// `size`, and must not be used after this call.
#[inline]
pub unsafe fn deallocate(ptr: *mut u8, size: usize) {
    if ptr.is_null() {
        return;
    }
    let served =
        with_thread_cache(|tc| unsafe { tc.deallocate(ptr, size, &CENTRAL_CACHE, &PAGE_CACHE) });
    if served.is_none() {
        unsafe { free_to_central(ptr, size) };
    }
}

/// [`allocate`], named for call sites that care that the calling thread's
/// cache is the one selected.
#[inline]
pub fn concurrent_alloc(size: usize) -> *mut u8 {
    allocate(size)
}

/// See [`deallocate`].
///
/// # Safety
/// Same contract as [`deallocate`].
#[inline]
pub unsafe fn concurrent_free(ptr: *mut u8, size: usize) {
    unsafe { deallocate(ptr, size) }
}

/// Fallback when the thread tier is unreachable: a single-block fetch
/// straight from the central tier.
#[cold]
fn alloc_from_central(size: usize) -> *mut u8 {
    if size > MAX_BYTES {
        return PAGE_CACHE.allocate_span(PageCache::pages_for(size));
    }
    let size = if size == 0 { 1 } else { size };
    let (head, taken) = CENTRAL_CACHE.fetch_range(class_index(size), 1, &PAGE_CACHE);
    if taken == 0 {
        ptr::null_mut()
    } else {
        head.cast()
    }
}

/// Fallback free when the thread tier is unreachable.
#[cold]
unsafe fn free_to_central(ptr: *mut u8, size: usize) {
    if size > MAX_BYTES {
        unsafe { PAGE_CACHE.deallocate_span(ptr) };
        return;
    }
    let size = if size == 0 { 1 } else { size };
    let block = ptr.cast::<FreeBlock>();
    unsafe {
        (*block).next = ptr::null_mut();
        CENTRAL_CACHE.return_range(block, 1, class_index(size));
    }
}
