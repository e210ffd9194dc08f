//! # Per-Chip Memory Budget
//!
//! All cores on a chip share its SDRAM. As each core's region sizes become
//! known during specification execution, its total is committed here and
//! checked against the chip's capacity, so over-allocation surfaces before
//! any expensive remote I/O. An overflow is a planning error; it is never
//! retried and aborts the whole pass.

use crate::error::HostError;
use crate::machine::Machine;
use gridload_spec::{ChipCoordinate, CoreCoordinate};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use tracing::warn;

/// One core's committed memory, kept for the diagnostic breakdown
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CoreUsage {
    pub core: CoreCoordinate,
    /// Label of the logical unit placed on the core
    pub label: String,
    /// Bytes actually committed, including table overhead
    pub used_bytes: u64,
    /// Bytes the planning stage estimated for the core
    pub estimated_bytes: u64,
}

/// Per-core breakdown attached to a capacity failure
#[derive(Debug, Clone, Default, Serialize)]
pub struct ChipUsageReport {
    pub committed: Vec<CoreUsage>,
}

impl fmt::Display for ChipUsageReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for usage in &self.committed {
            writeln!(
                f,
                "    {} on {}: {} bytes (estimated {})",
                usage.label, usage.core, usage.used_bytes, usage.estimated_bytes
            )?;
        }
        Ok(())
    }
}

/// Running totals for one generation pass; created at the start of the pass
/// and discarded with it
#[derive(Debug)]
pub struct ChipBudget<'m> {
    machine: &'m Machine,
    used: BTreeMap<ChipCoordinate, u64>,
    committed: BTreeMap<ChipCoordinate, Vec<CoreUsage>>,
}

impl<'m> ChipBudget<'m> {
    pub fn new(machine: &'m Machine) -> Self {
        Self {
            machine,
            used: BTreeMap::new(),
            committed: BTreeMap::new(),
        }
    }

    /// Add a core's committed bytes to its chip's running total.
    ///
    /// Fails with [`HostError::CapacityExceeded`] the first time a chip's
    /// cumulative total would pass its capacity; the report includes the
    /// offending commit.
    pub fn commit(&mut self, usage: CoreUsage) -> Result<(), HostError> {
        let chip = usage.core.chip();
        let capacity = self.machine.sdram_at(chip)?;

        if usage.used_bytes > usage.estimated_bytes {
            warn!(
                core = %usage.core,
                label = %usage.label,
                estimated = usage.estimated_bytes,
                actual = usage.used_bytes,
                "core is bigger than expected"
            );
        }

        let requested = usage.used_bytes;
        let committed = self.committed.entry(chip).or_default();
        committed.push(usage);

        let total = self.used.entry(chip).or_insert(0);
        if *total + requested > capacity {
            return Err(HostError::CapacityExceeded {
                chip,
                capacity,
                requested,
                report: ChipUsageReport {
                    committed: committed.clone(),
                },
            });
        }
        *total += requested;
        Ok(())
    }

    /// Bytes committed so far on a chip
    pub fn used_on(&self, chip: ChipCoordinate) -> u64 {
        self.used.get(&chip).copied().unwrap_or(0)
    }
}
