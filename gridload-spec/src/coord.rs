//! # Grid Coordinates
//!
//! A machine is a 2D grid of chips; each chip carries a set of processors.
//! Placement assigns work to a processor, so a core is addressed by
//! `(x, y, p)` and its shared memory budget by the owning chip `(x, y)`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One physical execution unit on the machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CoreCoordinate {
    pub x: u8,
    pub y: u8,
    pub p: u8,
}

impl CoreCoordinate {
    pub const fn new(x: u8, y: u8, p: u8) -> Self {
        Self { x, y, p }
    }

    /// The chip this core lives on; all cores on a chip share its SDRAM
    #[inline]
    pub const fn chip(&self) -> ChipCoordinate {
        ChipCoordinate {
            x: self.x,
            y: self.y,
        }
    }
}

impl fmt::Display for CoreCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.x, self.y, self.p)
    }
}

/// One chip on the grid; the granularity at which memory is budgeted
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ChipCoordinate {
    pub x: u8,
    pub y: u8,
}

impl ChipCoordinate {
    pub const fn new(x: u8, y: u8) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for ChipCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.x, self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_display() {
        let core = CoreCoordinate::new(3, 7, 11);
        assert_eq!(core.to_string(), "3:7:11");
    }

    #[test]
    fn test_chip_display() {
        let chip = ChipCoordinate::new(2, 5);
        assert_eq!(chip.to_string(), "2,5");
    }

    #[test]
    fn test_chip_projection() {
        let core = CoreCoordinate::new(1, 2, 3);
        assert_eq!(core.chip(), ChipCoordinate::new(1, 2));
    }

    #[test]
    fn test_ordering_groups_by_chip() {
        let mut cores = vec![
            CoreCoordinate::new(1, 0, 2),
            CoreCoordinate::new(0, 1, 5),
            CoreCoordinate::new(0, 1, 1),
            CoreCoordinate::new(0, 0, 3),
        ];
        cores.sort();
        assert_eq!(
            cores,
            vec![
                CoreCoordinate::new(0, 0, 3),
                CoreCoordinate::new(0, 1, 1),
                CoreCoordinate::new(0, 1, 5),
                CoreCoordinate::new(1, 0, 2),
            ]
        );
    }
}
