//! Scratch slot handles.
//!
//! Slots are allocated as process-unique handles; the concrete slot number a
//! handle occupies is decided only when a whole program is assembled.

use std::sync::atomic::{AtomicU32, Ordering};

/// Number of scratch slots available to a single program.
pub const NUM_SLOTS: usize = 256;

static NEXT_SLOT_ID: AtomicU32 = AtomicU32::new(0);

/// A handle to a scratch slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScratchSlot(u32);

impl ScratchSlot {
    /// Allocate a fresh slot handle distinct from every other handle.
    pub fn new() -> Self {
        ScratchSlot(NEXT_SLOT_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// A handle with a fixed id. Used when canonicalizing lowered graphs.
    pub fn with_id(id: u32) -> Self {
        ScratchSlot(id)
    }

    pub fn id(self) -> u32 {
        self.0
    }
}

impl Default for ScratchSlot {
    fn default() -> Self {
        Self::new()
    }
}
