//! # Region Reload
//!
//! Re-runs data specifications for cores flagged dirty and rewrites their
//! regions in place. The remote side offers no transactions, so this is an
//! explicit two-phase protocol: read the existing table back, repair and
//! validate locally, then write only the region bytes and each entry's size
//! and checksum fields. Pointers are never rewritten; a region keeps its
//! address for the life of the allocation.

use crate::error::HostError;
use crate::executor::{ExecutedSpec, SpecExecutor};
use crate::loader::LoadUnit;
use crate::transport::Transport;
use gridload_spec::table::SIZE_CHECKSUM_OFFSET;
use gridload_spec::{
    padded_words, repair_sizes, word_checksum, Address, CoreCoordinate, PointerTable, RegionEntry,
    ENTRY_BYTES, HEADER_BYTES, MAX_REGIONS, UNRESOLVED_WORDS,
};
use tracing::{debug, info, warn};

/// Rewrites regions for cores whose governing logical unit needs a reload
pub struct ReloadEngine<'a, E, T> {
    executor: &'a mut E,
    transport: &'a mut T,
}

impl<'a, E, T> ReloadEngine<'a, E, T>
where
    E: SpecExecutor,
    T: Transport,
{
    pub fn new(executor: &'a mut E, transport: &'a mut T) -> Self {
        Self {
            executor,
            transport,
        }
    }

    /// Reload every unit with `needs_reload` set, clearing the flag as each
    /// core completes. Returns how many cores were rewritten.
    pub fn reload_dirty(&mut self, units: &mut [LoadUnit<E::Spec>]) -> Result<usize, HostError> {
        let mut reloaded = 0;
        for unit in units.iter_mut() {
            if !unit.needs_reload {
                continue;
            }
            self.reload_unit(unit)?;
            unit.needs_reload = false;
            reloaded += 1;
        }
        if reloaded > 0 {
            info!(reloaded, "reloaded data regions");
        }
        Ok(reloaded)
    }

    fn reload_unit(&mut self, unit: &mut LoadUnit<E::Spec>) -> Result<(), HostError> {
        let executed = self.executor.execute(unit.core, &unit.spec)?;
        executed.validate(unit.core)?;

        // read back the table as the device sees it, then repair sizes that
        // were written as zero placeholders
        let base = self.transport.read_base_register(unit.core)?;
        let entry_bytes = self.transport.read(
            unit.core,
            base + HEADER_BYTES as Address,
            MAX_REGIONS * ENTRY_BYTES,
        )?;
        let old_table = repair_sizes(&PointerTable::from_entry_bytes(&entry_bytes)?);

        // every growth check passes before a single byte is written; a
        // partial rewrite would desynchronize host and device views
        for (region, data) in filled_regions(&executed) {
            let old = old_table.entry(region)?;
            if !old.is_allocated() {
                continue;
            }
            let new_words = padded_words(data.len());
            if old.n_words != UNRESOLVED_WORDS && new_words > old.n_words {
                return Err(HostError::RegionGrowth {
                    core: unit.core,
                    region,
                    old_words: old.n_words,
                    new_words,
                });
            }
        }

        for (region, data) in filled_regions(&executed) {
            let old = old_table.entry(region)?;
            if !old.is_allocated() {
                warn!(
                    core = %unit.core,
                    region,
                    "region was never allocated on first load; skipping"
                );
                continue;
            }
            self.transport.write(unit.core, old.pointer, data)?;

            let fresh = RegionEntry {
                pointer: old.pointer,
                n_words: padded_words(data.len()),
                checksum: word_checksum(data),
            };
            let entry_address = PointerTable::entry_address(base, region)?;
            self.transport.write(
                unit.core,
                entry_address + SIZE_CHECKSUM_OFFSET as Address,
                &PointerTable::size_checksum_patch(&fresh),
            )?;
            debug!(
                core = %unit.core,
                region,
                n_words = fresh.n_words,
                "region rewritten in place"
            );
        }
        Ok(())
    }
}

fn filled_regions(executed: &ExecutedSpec) -> impl Iterator<Item = (usize, &[u8])> {
    executed
        .regions
        .iter()
        .filter_map(|region| region.data.as_deref().map(|data| (region.region, data)))
}

/// On-device address of one region's data, found through the core's base
/// register and table entry
pub fn locate_region<T: Transport>(
    transport: &mut T,
    core: CoreCoordinate,
    region: usize,
) -> Result<Address, HostError> {
    let base = transport.read_base_register(core)?;
    let entry_address = PointerTable::entry_address(base, region)?;
    let bytes = transport.read(core, entry_address, ENTRY_BYTES)?;
    let raw: [u8; ENTRY_BYTES] = bytes.as_slice().try_into().map_err(|_| {
        gridload_spec::TableError::InvalidTableSize {
            expected: ENTRY_BYTES,
            found: bytes.len(),
        }
    })?;
    Ok(RegionEntry::from_bytes(&raw).pointer)
}
