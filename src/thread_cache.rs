//! ThreadCache: the hot path.
//!
//! Each thread owns an array of freelists keyed by size class. Allocate and
//! deallocate touch only thread-local state; a miss pulls one batch from
//! the CentralCache, and a list that outgrows its watermark goes back to
//! the CentralCache in one piece. Requests above `MAX_BYTES` skip the class
//! tiers and deal with the PageCache directly.

use crate::block::FreeBlock;
use crate::central_cache::CentralCache;
use crate::page_cache::PageCache;
use crate::size_class::{batch_count, class_index, FREE_LIST_SIZE, MAX_BYTES};
use core::ptr;

/// Per-class freelist. Length is tracked on push/pop so the deallocate
/// path stays O(1).
struct FreeList {
    head: *mut FreeBlock,
    len: usize,
}

impl FreeList {
    const fn new() -> Self {
        Self {
            head: ptr::null_mut(),
            len: 0,
        }
    }

    #[inline]
    fn pop(&mut self) -> *mut FreeBlock {
        let block = self.head;
        if !block.is_null() {
            // SAFETY: blocks on the list are free and owned by this cache.
            self.head = unsafe { (*block).next };
            self.len -= 1;
        }
        block
    }

    #[inline]
    fn push(&mut self, block: *mut FreeBlock) {
        // SAFETY: the caller hands over sole ownership of `block`.
        unsafe { (*block).next = self.head };
        self.head = block;
        self.len += 1;
    }

    /// Adopt an already-linked chain of `count` blocks.
    fn push_chain(&mut self, head: *mut FreeBlock, count: usize) {
        if head.is_null() || count == 0 {
            return;
        }
        // SAFETY: the chain is exclusively ours; the walk is bounded by
        // `count` rather than trusting the links.
        unsafe {
            let mut tail = head;
            let mut walked = 1;
            while walked < count && !(*tail).next.is_null() {
                tail = (*tail).next;
                walked += 1;
            }
            (*tail).next = self.head;
        }
        self.head = head;
        self.len += count;
    }

    /// Detach the whole list.
    fn take(&mut self) -> (*mut FreeBlock, usize) {
        let head = self.head;
        let len = self.len;
        self.head = ptr::null_mut();
        self.len = 0;
        (head, len)
    }
}

/// Per-thread cache holding one freelist per size class. Never shared: an
/// instance lives and dies with its thread.
pub struct ThreadCache {
    lists: Box<[FreeList]>,
}

impl ThreadCache {
    pub fn new() -> Self {
        Self {
            lists: (0..FREE_LIST_SIZE).map(|_| FreeList::new()).collect(),
        }
    }

    /// Serve a request of `size` bytes. Null on OOM.
    #[inline]
    pub fn allocate(&mut self, size: usize, central: &CentralCache, pages: &PageCache) -> *mut u8 {
        if size > MAX_BYTES {
            return pages.allocate_span(PageCache::pages_for(size));
        }
        let size = if size == 0 { 1 } else { size };
        let index = class_index(size);

        let block = self.lists[index].pop();
        if !block.is_null() {
            return block.cast();
        }
        self.fetch_from_central(index, central, pages)
    }

    /// Take back a block previously returned by `allocate` with `size`.
    ///
    /// # Safety
    /// `ptr` must come from `allocate` on this allocator with this exact
    /// `size`, and must not be used after this call. Null is ignored.
    #[inline]
    pub unsafe fn deallocate(
        &mut self,
        ptr: *mut u8,
        size: usize,
        central: &CentralCache,
        pages: &PageCache,
    ) {
        if ptr.is_null() {
            return;
        }
        if size > MAX_BYTES {
            unsafe { pages.deallocate_span(ptr) };
            return;
        }
        let size = if size == 0 { 1 } else { size };
        let index = class_index(size);

        let list = &mut self.lists[index];
        list.push(ptr.cast());

        // Past the watermark the whole list goes back in one batch.
        if list.len >= 2 * batch_count(index) {
            let (head, count) = list.take();
            unsafe { central.return_range(head, count, index) };
        }
    }

    /// Miss path: pull one batch for `index` from the central tier, hand
    /// the first block to the caller, keep the rest.
    #[cold]
    fn fetch_from_central(
        &mut self,
        index: usize,
        central: &CentralCache,
        pages: &PageCache,
    ) -> *mut u8 {
        let (head, count) = central.fetch_range(index, batch_count(index), pages);
        if head.is_null() {
            return ptr::null_mut();
        }

        // SAFETY: fetch_range handed over exclusive ownership of `count`
        // linked blocks.
        unsafe {
            if count > 1 {
                self.lists[index].push_chain((*head).next, count - 1);
            }
        }
        head.cast()
    }

    /// Return every residual list to the central tier. Runs on thread exit.
    pub fn flush(&mut self, central: &CentralCache) {
        for index in 0..FREE_LIST_SIZE {
            let list = &mut self.lists[index];
            if list.head.is_null() {
                continue;
            }
            let (head, count) = list.take();
            // SAFETY: the chain is ours until this call transfers it.
            unsafe { central.return_range(head, count, index) };
        }
    }
}
