//! # Machine Description
//!
//! The subset of the machine model the loader needs: which chips exist and
//! how much shared SDRAM each one has. Discovery and boot are someone else's
//! problem; this is a plain lookup table handed in by the caller.

use crate::error::HostError;
use gridload_spec::ChipCoordinate;
use std::collections::BTreeMap;

/// Per-chip SDRAM capacities
#[derive(Debug, Clone, Default)]
pub struct Machine {
    sdram: BTreeMap<ChipCoordinate, u64>,
}

impl Machine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style chip registration
    pub fn with_chip(mut self, chip: ChipCoordinate, sdram_bytes: u64) -> Self {
        self.add_chip(chip, sdram_bytes);
        self
    }

    pub fn add_chip(&mut self, chip: ChipCoordinate, sdram_bytes: u64) {
        self.sdram.insert(chip, sdram_bytes);
    }

    /// SDRAM capacity of a chip; placement onto an unknown chip is a
    /// planning error
    pub fn sdram_at(&self, chip: ChipCoordinate) -> Result<u64, HostError> {
        self.sdram
            .get(&chip)
            .copied()
            .ok_or(HostError::UnknownChip { chip })
    }

    pub fn n_chips(&self) -> usize {
        self.sdram.len()
    }
}
