//! CentralCache: the broker tier.
//!
//! One shared freelist per size class, each an atomic head guarded by a
//! spin flag. An empty class refills by carving a fresh PageCache span into
//! a null-terminated chain; thread caches move blocks in and out in
//! batches. Head installs use release stores so the next-pointer writes
//! are visible before the head is.

use crate::block::{self, FreeBlock};
use crate::page_cache::PageCache;
use crate::size_class::{class_size, FREE_LIST_SIZE};
use crate::sync::SpinFlag;
use crate::{PAGE_SIZE, SPAN_PAGES};
use core::ptr;
use core::sync::atomic::{AtomicPtr, Ordering};

pub struct CentralCache {
    heads: [AtomicPtr<FreeBlock>; FREE_LIST_SIZE],
    locks: [SpinFlag; FREE_LIST_SIZE],
}

impl CentralCache {
    pub const fn new() -> Self {
        Self {
            heads: [const { AtomicPtr::new(ptr::null_mut()) }; FREE_LIST_SIZE],
            locks: [const { SpinFlag::new() }; FREE_LIST_SIZE],
        }
    }

    /// Detach up to `count` blocks of class `index`.
    ///
    /// Returns the head of a null-terminated chain and the number of blocks
    /// actually taken, or `(null, 0)` on OOM. The count may come up short
    /// when a fresh span yields fewer blocks than asked for.
    pub fn fetch_range(
        &self,
        index: usize,
        count: usize,
        pages: &PageCache,
    ) -> (*mut FreeBlock, usize) {
        debug_assert!(index < FREE_LIST_SIZE);
        debug_assert!(count >= 1);

        let _guard = self.locks[index].lock();

        let head = {
            let current = self.heads[index].load(Ordering::Relaxed);
            if current.is_null() {
                // Refill under the class lock: the carved chain is
                // published through the same head slot.
                let carved = Self::refill(index, pages);
                if carved.is_null() {
                    return (ptr::null_mut(), 0);
                }
                carved
            } else {
                current
            }
        };

        // Walk forward, sever after the last taken block, park the rest.
        // SAFETY: the class lock makes us the only owner of this chain, and
        // every chain entering the cache is null-terminated.
        unsafe {
            let mut tail = head;
            let mut taken = 1;
            while taken < count && !(*tail).next.is_null() {
                tail = (*tail).next;
                taken += 1;
            }
            let rest = (*tail).next;
            (*tail).next = ptr::null_mut();
            self.heads[index].store(rest, Ordering::Release);
            (head, taken)
        }
    }

    /// Prepend a chain of `count` blocks onto class `index`.
    ///
    /// # Safety
    /// `start` must head a null-terminated chain of exactly `count` free
    /// blocks of class `index`, owned by the caller and reachable from no
    /// other thread.
    pub unsafe fn return_range(&self, start: *mut FreeBlock, count: usize, index: usize) {
        if start.is_null() || index >= FREE_LIST_SIZE {
            return;
        }

        let _guard = self.locks[index].lock();

        // SAFETY: exclusive chain per the caller contract; the tail walk is
        // bounded by `count` rather than trusting the chain's own links.
        unsafe {
            let mut tail = start;
            let mut walked = 1;
            while walked < count && !(*tail).next.is_null() {
                tail = (*tail).next;
                walked += 1;
            }
            (*tail).next = self.heads[index].load(Ordering::Relaxed);
            self.heads[index].store(start, Ordering::Release);
        }
    }

    /// Carve a fresh span into a chain for class `index`. Null on OOM.
    #[cold]
    fn refill(index: usize, pages: &PageCache) -> *mut FreeBlock {
        let block_size = class_size(index);
        let span_pages = if block_size <= SPAN_PAGES * PAGE_SIZE {
            SPAN_PAGES
        } else {
            PageCache::pages_for(block_size)
        };

        let base = pages.allocate_span(span_pages);
        if base.is_null() {
            return ptr::null_mut();
        }

        // SAFETY: the span is fresh, page-aligned, span_pages * PAGE_SIZE
        // bytes, and exclusively ours until published through the head.
        let (head, _) = unsafe { block::carve(base, span_pages * PAGE_SIZE, block_size) };
        head
    }
}
