//! Damage events for in-place updates.
//!
//! When a document is opened with in-place mode enabled, size-preserving
//! scalar replacements are recorded as damage events instead of forcing a
//! full re-serialization. Each event describes one byte-range patch: copy
//! `size` bytes from `source_offset` in the replacement-value buffer to
//! `target_offset` in the original document buffer. Applying the queued
//! events to a copy of the original buffer reproduces the mutated
//! document.

/// One byte-range patch descriptor.
///
/// Offsets are into two different buffers: `target_offset` indexes the
/// original document bytes the caller owns, `source_offset` indexes the
/// replacement-value buffer returned alongside the queue.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize,
)]
pub struct DamageEvent {
    /// Where in the original buffer the patch lands.
    pub target_offset: u32,
    /// Where in the source buffer the replacement bytes start.
    pub source_offset: u32,
    /// Patch length in bytes.
    pub size: u32,
}

/// Queue of damage events, in the order they must be applied.
pub type DamageVector = Vec<DamageEvent>;

/// Whether a document records size-preserving mutations as damage events.
///
/// The mode is chosen at construction and is monotone: any mutation that
/// cannot be expressed in place disables it for good.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InPlaceMode {
    /// Mutations always force re-serialization.
    Disabled,
    /// Qualifying mutations are recorded as damage events.
    Enabled,
}

/// Apply a damage queue to a writable copy of the original document.
///
/// This is a reference applier for tests and small callers; a downstream
/// storage engine would typically apply the same triples to its own copy
/// of the page.
pub fn apply_damages(target: &mut [u8], source: &[u8], damages: &[DamageEvent]) {
    for event in damages {
        let from = event.source_offset as usize..(event.source_offset + event.size) as usize;
        let to = event.target_offset as usize..(event.target_offset + event.size) as usize;
        target[to].copy_from_slice(&source[from]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_copies_ranges() {
        let mut target = vec![0u8; 8];
        let source = [1u8, 2, 3, 4];
        apply_damages(
            &mut target,
            &source,
            &[
                DamageEvent {
                    target_offset: 0,
                    source_offset: 2,
                    size: 2,
                },
                DamageEvent {
                    target_offset: 6,
                    source_offset: 0,
                    size: 1,
                },
            ],
        );
        assert_eq!(target, [3, 4, 0, 0, 0, 0, 1, 0]);
    }

    #[test]
    fn events_apply_in_order() {
        // Two events touching the same target range: the later one wins.
        let mut target = vec![0u8; 2];
        let source = [0xAA, 0xBB];
        apply_damages(
            &mut target,
            &source,
            &[
                DamageEvent {
                    target_offset: 0,
                    source_offset: 0,
                    size: 1,
                },
                DamageEvent {
                    target_offset: 0,
                    source_offset: 1,
                    size: 1,
                },
            ],
        );
        assert_eq!(target, [0xBB, 0x00]);
    }
}
