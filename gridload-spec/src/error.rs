//! # Format Error Types

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TableError {
    #[error("Invalid table magic: expected 0xad130ad6, got {0:#010x}")]
    InvalidMagic(u32),

    #[error("Invalid table version: expected {expected:#010x}, found {found:#010x}")]
    InvalidVersion { expected: u32, found: u32 },

    #[error("Invalid table size: expected {expected} bytes, found {found} bytes")]
    InvalidTableSize { expected: usize, found: usize },

    #[error("Region id {region} out of range (valid range: 0-31)")]
    RegionOutOfRange { region: usize },
}
