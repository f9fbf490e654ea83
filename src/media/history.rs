//! Frame history for rewinding
//!
//! The player keeps the last N synchronized frame sets so the operator can
//! step back through them while playback is frozen. Once a frame set is
//! evicted it cannot be shown again.
//!
//! Offsets are negative and count from the newest entry:
//! ```text
//!   oldest                       newest
//!   [ s0 ][ s1 ][ s2 ][ s3 ][ s4 ]
//!    -5    -4    -3    -2    -1
//! ```

use super::frame::FrameSet;

/// Bounded ring buffer of frame sets
///
/// Slots are filled once and then overwritten in place, so a warm cache
/// never reallocates.
#[derive(Debug)]
pub struct HistoryCache {
    /// Maximum number of frame sets
    capacity: usize,
    /// Stored frame sets; grows to `capacity`, then wraps
    slots: Vec<FrameSet>,
    /// Slot holding the oldest frame set once the buffer has wrapped
    head: usize,
}

impl HistoryCache {
    /// Create a cache holding at most `capacity` frame sets
    ///
    /// A capacity of zero is clamped to one.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            slots: Vec::with_capacity(capacity),
            head: 0,
        }
    }

    /// Append a frame set, evicting the oldest one when full
    pub fn push(&mut self, frames: FrameSet) {
        if self.slots.len() < self.capacity {
            self.slots.push(frames);
        } else {
            self.slots[self.head] = frames;
            self.head = (self.head + 1) % self.capacity;
        }
    }

    /// Get the frame set at a negative offset (`-1` is the newest)
    ///
    /// Returns `None` for any offset outside `[-len, -1]`.
    pub fn get(&self, offset: isize) -> Option<&FrameSet> {
        let len = self.slots.len() as isize;
        if offset >= 0 || offset < -len {
            return None;
        }
        let pos = (len + offset) as usize;
        Some(&self.slots[(self.head + pos) % self.slots.len()])
    }

    /// Get the newest frame set
    pub fn latest(&self) -> Option<&FrameSet> {
        self.get(-1)
    }

    /// Offset of the oldest cached frame set (`-len`)
    pub fn oldest_offset(&self) -> isize {
        -(self.slots.len() as isize)
    }

    /// Number of cached frame sets
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether nothing has been cached yet
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Maximum number of cached frame sets
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Iterate oldest-first
    pub fn iter(&self) -> impl Iterator<Item = &FrameSet> {
        let (newer, older) = self.slots.split_at(self.head);
        older.iter().chain(newer.iter())
    }

    /// Drop every cached frame set
    pub fn clear(&mut self) {
        self.slots.clear();
        self.head = 0;
    }
}
