//! rsmempool: a tiered thread-cache / central-cache / page-cache memory
//! pool.
//!
//! Three tiers serve small-to-medium allocations across many threads:
//! - Thread caches: per-thread freelists, no synchronization on the hot
//!   path
//! - Central cache: one shared freelist per size class behind a spin flag
//! - Page cache: span management over the OS page source
//!
//! A request enters the thread cache; a hit returns immediately, a miss
//! pulls a batch from the central cache, which in turn carves spans
//! obtained from the page cache. This is a sized allocator: `deallocate`
//! takes the same size that was passed to `allocate`.
//!
//! # Usage
//!
//! ```
//! let ptr = rsmempool::concurrent_alloc(64);
//! assert!(!ptr.is_null());
//! unsafe { rsmempool::concurrent_free(ptr, 64) };
//! ```

pub mod allocator;
pub mod block;
pub mod central_cache;
pub mod page_cache;
pub mod platform;
pub mod size_class;
pub mod sync;
pub mod thread_cache;

#[cfg(feature = "ffi")]
pub mod ffi;

/// Span granularity obtained from the OS (4 KiB pages).
pub const PAGE_SIZE: usize = 4096;

/// Pages per span carved for any size class whose block fits one.
pub const SPAN_PAGES: usize = 8;

pub use allocator::{allocate, concurrent_alloc, concurrent_free, deallocate};
pub use central_cache::CentralCache;
pub use page_cache::PageCache;
pub use thread_cache::ThreadCache;
