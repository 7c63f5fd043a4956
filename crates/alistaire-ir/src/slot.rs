//! Slot identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Index of an addressable slot within a job description.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SlotId(pub u32);

impl SlotId {
    /// The slot index as a `usize`, for bit arithmetic.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s{}", self.0)
    }
}

impl From<u32> for SlotId {
    fn from(id: u32) -> Self {
        SlotId(id)
    }
}
