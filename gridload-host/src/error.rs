//! # Host-Side Error Types
//!
//! Every fatal error carries the coordinates and observed values needed to
//! act on it without re-deriving machine state.

use crate::budget::ChipUsageReport;
use crate::executor::ExecuteError;
use crate::transport::TransportError;
use gridload_spec::{ChipCoordinate, CoreCoordinate, CoreState, TableError};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// A displayable list of core coordinates
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoreList(pub Vec<CoreCoordinate>);

impl CoreList {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for CoreList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for core in &self.0 {
            if !first {
                f.write_str(", ")?;
            }
            write!(f, "{core}")?;
            first = false;
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum HostError {
    #[error("Table format error: {0}")]
    Table(#[from] TableError),

    #[error("Data specification error: {0}")]
    Execute(#[from] ExecuteError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("No chip at {chip} in the machine description")]
    UnknownChip { chip: ChipCoordinate },

    #[error(
        "Too much SDRAM has been used on chip {chip}: {requested} bytes requested \
         against a capacity of {capacity} bytes. Usage on that chip:\n{report}"
    )]
    CapacityExceeded {
        chip: ChipCoordinate,
        capacity: u64,
        requested: u64,
        report: ChipUsageReport,
    },

    #[error(
        "Region {region} of core {core} has grown from {old_words} to {new_words} words \
         and would overwrite the next region"
    )]
    RegionGrowth {
        core: CoreCoordinate,
        region: usize,
        old_words: u32,
        new_words: u32,
    },

    #[error("Cores not in state {state} after {waited:?}: {pending}")]
    StateTimeout {
        state: CoreState,
        waited: Duration,
        pending: CoreList,
    },

    #[error(
        "Some cores have crashed. RTE cores: [{rte}], watch-dogged cores: [{watchdog}], \
         idle cores: [{idle}]"
    )]
    CoresFaulted {
        rte: CoreList,
        watchdog: CoreList,
        idle: CoreList,
    },
}
