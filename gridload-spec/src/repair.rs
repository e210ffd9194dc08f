//! # Size-Inference Repair
//!
//! A table written on first load may carry zero in the `n_words` field of a
//! filled region (the writer did not know the final extent). Regions are laid
//! out contiguously, so the true size of such a region can be recovered from
//! where the next allocated region starts.

use crate::table::PointerTable;
use crate::{BYTES_PER_WORD, UNRESOLVED_WORDS};

/// Fill in sizes for entries that declare `n_words == 0`.
///
/// Allocated entries (`pointer != 0`) are walked in increasing pointer order;
/// an unsized entry takes `(next.pointer - entry.pointer) / word` as its
/// repaired size. The last allocated entry has no successor to measure
/// against, so an unsized one gets [`UNRESOLVED_WORDS`] and is excluded from
/// growth checking by its consumers. Pointers and already-sized entries are
/// copied through untouched.
pub fn repair_sizes(table: &PointerTable) -> PointerTable {
    let mut repaired = table.clone();

    let mut allocated: Vec<usize> = table
        .entries()
        .iter()
        .enumerate()
        .filter(|(_, entry)| entry.is_allocated())
        .map(|(region, _)| region)
        .collect();
    allocated.sort_by_key(|&region| table.entries()[region].pointer);

    for pair in allocated.windows(2) {
        let (region, next) = (pair[0], pair[1]);
        let entry = table.entries()[region];
        if entry.n_words == 0 {
            let gap = table.entries()[next].pointer - entry.pointer;
            repaired.entries[region].n_words = gap / BYTES_PER_WORD as u32;
        }
    }

    if let Some(&last) = allocated.last() {
        if table.entries()[last].n_words == 0 {
            repaired.entries[last].n_words = UNRESOLVED_WORDS;
        }
    }

    repaired
}
