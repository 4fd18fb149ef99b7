//! PageCache: the leaf tier.
//!
//! Obtains page-aligned regions from the OS and vends spans, contiguous
//! runs of pages. Free spans are listed per page count; a larger free span
//! is split to satisfy a smaller request. Spans are never coalesced by
//! address: a returned span is reused whole, or re-split on a later
//! request.

use crate::platform;
use crate::PAGE_SIZE;
use core::ptr;
use parking_lot::Mutex;
use std::collections::BTreeMap;

struct SpanLists {
    /// page count -> bases of free spans with exactly that count.
    free_spans: BTreeMap<usize, Vec<usize>>,
    /// span base -> page count, for every span this cache has vended.
    span_map: BTreeMap<usize, usize>,
}

/// Process-wide span store. Every operation takes the one internal mutex;
/// span traffic is rare next to block traffic, so a sleeping lock is the
/// right trade here.
pub struct PageCache {
    inner: Mutex<SpanLists>,
}

impl PageCache {
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(SpanLists {
                free_spans: BTreeMap::new(),
                span_map: BTreeMap::new(),
            }),
        }
    }

    /// Hand out a span of exactly `count` pages: the smallest free span
    /// that fits, split if it is larger, else fresh pages from the OS.
    /// Returns null on OOM or when `count` is zero.
    pub fn allocate_span(&self, count: usize) -> *mut u8 {
        if count == 0 {
            return ptr::null_mut();
        }
        let mut inner = self.inner.lock();
        let state = &mut *inner;

        let found = state
            .free_spans
            .range(count..)
            .find(|(_, spans)| !spans.is_empty())
            .map(|(&pages, _)| pages);

        if let Some(pages) = found {
            let base = state.free_spans.get_mut(&pages).and_then(Vec::pop);
            if let Some(base) = base {
                if pages > count {
                    // Split: the caller gets the first `count` pages, the
                    // remainder goes back on the free lists under its own
                    // base.
                    let rest = base + count * PAGE_SIZE;
                    state.span_map.insert(rest, pages - count);
                    state.free_spans.entry(pages - count).or_default().push(rest);
                }
                state.span_map.insert(base, count);
                return base as *mut u8;
            }
        }

        // The mutex stays held across the OS call; an OS failure just
        // unwinds to a null return.
        let base = platform::acquire_pages(count);
        if base.is_null() {
            return ptr::null_mut();
        }
        state.span_map.insert(base as usize, count);
        base
    }

    /// Return a span previously handed out by `allocate_span`.
    ///
    /// # Safety
    /// `base` must be a span base obtained from `allocate_span` on this
    /// cache, with no live blocks carved out of it.
    pub unsafe fn deallocate_span(&self, base: *mut u8) {
        let mut inner = self.inner.lock();
        let state = &mut *inner;
        let addr = base as usize;
        let Some(&count) = state.span_map.get(&addr) else {
            // Not a span base we vended. Invalid frees are not detected.
            return;
        };
        state.free_spans.entry(count).or_default().push(addr);
    }

    /// Pages needed to cover `size` bytes.
    #[inline]
    pub fn pages_for(size: usize) -> usize {
        size.div_ceil(PAGE_SIZE)
    }
}
