//! # Region Pointer Table
//!
//! The on-device directory of a core's memory regions. Written once at the
//! base of the core's data allocation; the executor on the core validates the
//! header before trusting any pointer in it.
//!
//! Binary format (little-endian):
//! ```text
//! Offset  Size  Field
//! ──────────────────────────────────
//! 0x00    4     magic
//! 0x04    4     version
//! 0x08    12    entry 0: (pointer, n_words, checksum)
//! 0x14    12    entry 1
//! ...           exactly MAX_REGIONS entries
//! ```
//!
//! A pointer of 0 means the region was never allocated. Reference regions
//! carry another region's pointer and zero size/checksum.

use crate::error::TableError;
use crate::{
    Address, BYTES_PER_WORD, ENTRY_BYTES, HEADER_BYTES, MAX_REGIONS, TABLE_BYTES, TABLE_MAGIC,
    TABLE_VERSION,
};

/// Byte offset of the `n_words` field within an entry; the `n_words` and
/// `checksum` fields are adjacent, so a reload patches both with one write
pub const SIZE_CHECKSUM_OFFSET: usize = 4;

/// Bytes covered by an in-place size + checksum patch
pub const SIZE_CHECKSUM_BYTES: usize = 8;

/// Wraparound sum of `data` viewed as little-endian 32-bit words.
///
/// Data is zero-padded up to a word boundary before summing, matching what
/// the writer actually puts in device memory.
pub fn word_checksum(data: &[u8]) -> u32 {
    let mut sum = 0u32;
    let mut chunks = data.chunks_exact(BYTES_PER_WORD);
    for chunk in &mut chunks {
        sum = sum.wrapping_add(u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]));
    }
    let tail = chunks.remainder();
    if !tail.is_empty() {
        let mut last = [0u8; BYTES_PER_WORD];
        last[..tail.len()].copy_from_slice(tail);
        sum = sum.wrapping_add(u32::from_le_bytes(last));
    }
    sum
}

/// Stored word count for `len` bytes of region data, rounded up to a whole
/// word
#[inline]
pub const fn padded_words(len: usize) -> u32 {
    len.div_ceil(BYTES_PER_WORD) as u32
}

/// One table entry
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegionEntry {
    /// Absolute device address of the region's data; 0 = unused
    pub pointer: Address,
    /// Region length in words; 0 means "unknown, determine from layout"
    pub n_words: u32,
    /// Wraparound word sum of the region's contents
    pub checksum: u32,
}

impl RegionEntry {
    /// Whether this entry points at allocated storage
    #[inline]
    pub const fn is_allocated(&self) -> bool {
        self.pointer != 0
    }

    /// Serialize to the 12-byte wire form
    pub fn to_bytes(&self) -> [u8; ENTRY_BYTES] {
        let mut bytes = [0u8; ENTRY_BYTES];
        bytes[0..4].copy_from_slice(&self.pointer.to_le_bytes());
        bytes[4..8].copy_from_slice(&self.n_words.to_le_bytes());
        bytes[8..12].copy_from_slice(&self.checksum.to_le_bytes());
        bytes
    }

    /// Deserialize from the 12-byte wire form
    pub fn from_bytes(bytes: &[u8; ENTRY_BYTES]) -> Self {
        Self {
            pointer: u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            n_words: u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
            checksum: u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]),
        }
    }
}

/// A full region pointer table: exactly [`MAX_REGIONS`] entries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PointerTable {
    pub(crate) entries: [RegionEntry; MAX_REGIONS],
}

impl PointerTable {
    /// An empty table; every entry unallocated
    pub fn new() -> Self {
        Self {
            entries: [RegionEntry::default(); MAX_REGIONS],
        }
    }

    fn check_region(region: usize) -> Result<(), TableError> {
        if region >= MAX_REGIONS {
            return Err(TableError::RegionOutOfRange { region });
        }
        Ok(())
    }

    /// Record a filled region: its pointer plus the size and checksum of the
    /// bytes written there
    pub fn set_region(
        &mut self,
        region: usize,
        pointer: Address,
        data: &[u8],
    ) -> Result<(), TableError> {
        Self::check_region(region)?;
        self.entries[region] = RegionEntry {
            pointer,
            n_words: padded_words(data.len()),
            checksum: word_checksum(data),
        };
        Ok(())
    }

    /// Record a pointer without contents: reserved-but-unfilled regions and
    /// reference regions that redirect to another region's storage
    pub fn set_pointer(&mut self, region: usize, pointer: Address) -> Result<(), TableError> {
        Self::check_region(region)?;
        self.entries[region].pointer = pointer;
        Ok(())
    }

    /// Look up one entry
    pub fn entry(&self, region: usize) -> Result<&RegionEntry, TableError> {
        Self::check_region(region)?;
        Ok(&self.entries[region])
    }

    /// Replace one entry wholesale
    pub fn set_entry(&mut self, region: usize, entry: RegionEntry) -> Result<(), TableError> {
        Self::check_region(region)?;
        self.entries[region] = entry;
        Ok(())
    }

    /// All entries in region-id order
    #[inline]
    pub fn entries(&self) -> &[RegionEntry; MAX_REGIONS] {
        &self.entries
    }

    /// Serialize header + entries; always [`TABLE_BYTES`] long
    pub fn to_device_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(TABLE_BYTES);
        bytes.extend_from_slice(&TABLE_MAGIC.to_le_bytes());
        bytes.extend_from_slice(&TABLE_VERSION.to_le_bytes());
        for entry in &self.entries {
            bytes.extend_from_slice(&entry.to_bytes());
        }
        bytes
    }

    /// Deserialize a full table, validating the header
    pub fn from_device_bytes(bytes: &[u8]) -> Result<Self, TableError> {
        if bytes.len() != TABLE_BYTES {
            return Err(TableError::InvalidTableSize {
                expected: TABLE_BYTES,
                found: bytes.len(),
            });
        }
        let magic = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        if magic != TABLE_MAGIC {
            return Err(TableError::InvalidMagic(magic));
        }
        let version = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
        if version != TABLE_VERSION {
            return Err(TableError::InvalidVersion {
                expected: TABLE_VERSION,
                found: version,
            });
        }
        Self::from_entry_bytes(&bytes[HEADER_BYTES..])
    }

    /// Deserialize the entry array alone. A read-back of an existing table
    /// starts past the header, which was validated by the device at start-up.
    pub fn from_entry_bytes(bytes: &[u8]) -> Result<Self, TableError> {
        if bytes.len() != MAX_REGIONS * ENTRY_BYTES {
            return Err(TableError::InvalidTableSize {
                expected: MAX_REGIONS * ENTRY_BYTES,
                found: bytes.len(),
            });
        }
        let mut table = Self::new();
        for (region, chunk) in bytes.chunks_exact(ENTRY_BYTES).enumerate() {
            let mut raw = [0u8; ENTRY_BYTES];
            raw.copy_from_slice(chunk);
            table.entries[region] = RegionEntry::from_bytes(&raw);
        }
        Ok(table)
    }

    /// Device address of a region's table entry, given the table base
    pub fn entry_address(base: Address, region: usize) -> Result<Address, TableError> {
        Self::check_region(region)?;
        Ok(base + HEADER_BYTES as u32 + (region * ENTRY_BYTES) as u32)
    }

    /// The 8-byte image of an entry's `n_words` + `checksum` fields, written
    /// at `entry_address + SIZE_CHECKSUM_OFFSET` to patch an entry in place
    /// without touching its pointer
    pub fn size_checksum_patch(entry: &RegionEntry) -> [u8; SIZE_CHECKSUM_BYTES] {
        let mut patch = [0u8; SIZE_CHECKSUM_BYTES];
        patch[0..4].copy_from_slice(&entry.n_words.to_le_bytes());
        patch[4..8].copy_from_slice(&entry.checksum.to_le_bytes());
        patch
    }
}

impl Default for PointerTable {
    fn default() -> Self {
        Self::new()
    }
}
