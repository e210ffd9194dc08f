//! # Data Specification Executor Interface
//!
//! The executor interprets a core's data specification and yields the byte
//! buffers and references that make up the core's memory image. Its bytecode
//! and instruction semantics are opaque here; the loader only consumes the
//! result.

use gridload_spec::{Address, CoreCoordinate, BYTES_PER_WORD, MAX_REGIONS};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExecuteError {
    #[error("Data specification failed on core {core}: {message}")]
    Failed {
        core: CoreCoordinate,
        message: String,
    },

    #[error("Region id {region} out of range in data specification for core {core}")]
    RegionOutOfRange { core: CoreCoordinate, region: usize },

    #[error(
        "Region {region} on core {core} reserves {reserved} bytes but was written with {written}"
    )]
    DataExceedsReservation {
        core: CoreCoordinate,
        region: usize,
        reserved: u32,
        written: usize,
    },

    #[error("Region {region} on core {core} reserves {reserved} bytes, not a whole word multiple")]
    UnalignedReservation {
        core: CoreCoordinate,
        region: usize,
        reserved: u32,
    },
}

/// One region produced by executing a data specification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutedRegion {
    /// Region id within the core's table
    pub region: usize,
    /// Reserved extent in bytes; always a whole number of words
    pub size_bytes: u32,
    /// Bytes to write, or `None` for a region that is reserved but unfilled
    pub data: Option<Vec<u8>>,
}

/// A region that redirects to another region's storage and carries no bytes
/// of its own
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionReference {
    pub region: usize,
    pub pointer: Address,
}

/// The full result of executing one core's data specification
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutedSpec {
    /// Regions in layout order; laid out contiguously by the loader
    pub regions: Vec<ExecutedRegion>,
    /// Reference regions resolved to the pointers they redirect to
    pub references: Vec<RegionReference>,
}

impl ExecutedSpec {
    /// Total reserved bytes across all regions, excluding table overhead
    pub fn total_data_bytes(&self) -> u64 {
        self.regions.iter().map(|r| u64::from(r.size_bytes)).sum()
    }

    /// Check the executor kept its contract: region ids in range, reserved
    /// sizes word-aligned, written data within its reservation
    pub fn validate(&self, core: CoreCoordinate) -> Result<(), ExecuteError> {
        for region in &self.regions {
            if region.region >= MAX_REGIONS {
                return Err(ExecuteError::RegionOutOfRange {
                    core,
                    region: region.region,
                });
            }
            if region.size_bytes as usize % BYTES_PER_WORD != 0 {
                return Err(ExecuteError::UnalignedReservation {
                    core,
                    region: region.region,
                    reserved: region.size_bytes,
                });
            }
            if let Some(data) = &region.data {
                if data.len() > region.size_bytes as usize {
                    return Err(ExecuteError::DataExceedsReservation {
                        core,
                        region: region.region,
                        reserved: region.size_bytes,
                        written: data.len(),
                    });
                }
            }
        }
        for reference in &self.references {
            if reference.region >= MAX_REGIONS {
                return Err(ExecuteError::RegionOutOfRange {
                    core,
                    region: reference.region,
                });
            }
        }
        Ok(())
    }
}

/// Interprets data specifications. Must be callable again for the same core
/// during a reload without side effects on the first result.
pub trait SpecExecutor {
    /// The opaque per-core data specification
    type Spec;

    fn execute(
        &mut self,
        core: CoreCoordinate,
        spec: &Self::Spec,
    ) -> Result<ExecutedSpec, ExecuteError>;
}
