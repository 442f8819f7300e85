//! Physical qubit and classical bit indices.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Physical qubit index in the flat index space of a circuit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QubitId(pub u32);

impl QubitId {
    /// The index as a `usize`, for slicing.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for QubitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}", self.0)
    }
}

impl From<u32> for QubitId {
    fn from(id: u32) -> Self {
        QubitId(id)
    }
}

/// Index of a classical bit receiving a measurement outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClbitId(pub u32);

impl fmt::Display for ClbitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "c{}", self.0)
    }
}

impl From<u32> for ClbitId {
    fn from(id: u32) -> Self {
        ClbitId(id)
    }
}

/// Build a run of contiguous qubit ids `[start, start + count)`.
pub fn qubit_range(start: u32, count: u32) -> Vec<QubitId> {
    (start..start + count).map(QubitId).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qubit_display() {
        assert_eq!(QubitId(3).to_string(), "$3");
        assert_eq!(ClbitId(1).to_string(), "c1");
    }

    #[test]
    fn test_qubit_range() {
        assert_eq!(qubit_range(2, 3), vec![QubitId(2), QubitId(3), QubitId(4)]);
        assert!(qubit_range(5, 0).is_empty());
    }
}
