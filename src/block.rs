//! The intrusive freelist node.
//!
//! A free block's first machine word holds the pointer to the next free
//! block of the same class, or null at the end of the chain. The overlay is
//! only read or written while the block is owned by one of the tiers;
//! user-owned memory is never interpreted as a `FreeBlock`.

use core::ptr;

/// Freelist node overlaid on the head of a free block.
#[repr(C)]
pub struct FreeBlock {
    pub next: *mut FreeBlock,
}

/// Thread a fresh span into a null-terminated chain of `block_size` blocks.
///
/// Returns the chain head and the number of blocks carved. Trailing bytes
/// that do not fit a whole block are wasted.
///
/// # Safety
/// `base` must point to `span_bytes` bytes of writable memory exclusively
/// owned by the caller and aligned to `ALIGNMENT`, with
/// `block_size <= span_bytes` and `block_size` a multiple of `ALIGNMENT`.
pub unsafe fn carve(
    base: *mut u8,
    span_bytes: usize,
    block_size: usize,
) -> (*mut FreeBlock, usize) {
    let count = span_bytes / block_size;
    debug_assert!(count >= 1);

    let mut cur = base;
    for _ in 1..count {
        unsafe {
            let next = cur.add(block_size);
            (*cur.cast::<FreeBlock>()).next = next.cast();
            cur = next;
        }
    }
    unsafe { (*cur.cast::<FreeBlock>()).next = ptr::null_mut() };

    (base.cast(), count)
}
