//! Canned scenario scripts mirroring the end-to-end scenarios the engine's
//! testable properties are stated against, built from the catalogue
//! programs in [`z80_harness_core::programs`].
//!
//! These are shared between the crate's own unit tests, `z80-harness-core`'s
//! `tests/` integration tests, and `z80-harness-cli`'s interactive menu, so
//! all three exercise exactly the same scripted bus traffic.

use z80_harness_core::programs;

use crate::script::{BusCycle, Script};

/// `HALT_ONLY`: a halted Z80 keeps re-fetching the same opcode. Scripts a
/// handful of repeated fetches at the same base address.
#[must_use]
pub fn halt_only(base: u16) -> Script {
    let mut script = Script::new();
    for _ in 0..4 {
        script.push(BusCycle::fetch(base));
    }
    script
}

/// `SINGLE_WRITE`: `LD A,0x42` / `LD (0x8000),A` / `HALT`, fetched in order
/// with the one write in between.
#[must_use]
pub fn single_write(base: u16) -> Script {
    let _ = programs::SINGLE_WRITE;
    vec![
        BusCycle::fetch(base),
        BusCycle::read(base.wrapping_add(1)),
        BusCycle::fetch(base.wrapping_add(2)),
        BusCycle::write(0x8000, 0x42),
        BusCycle::fetch(base.wrapping_add(5)),
    ]
}

/// `MULTI_WRITE`: three stores to consecutive addresses, each preceded by
/// the fetches `MULTI_WRITE` implies, ending in `HALT`.
#[must_use]
pub fn multi_write(base: u16) -> Script {
    let _ = programs::MULTI_WRITE;
    vec![
        BusCycle::fetch(base),
        BusCycle::read(base.wrapping_add(1)),
        BusCycle::fetch(base.wrapping_add(2)),
        BusCycle::write(0x8000, 0x11),
        BusCycle::fetch(base.wrapping_add(5)),
        BusCycle::write(0x8001, 0x22),
        BusCycle::fetch(base.wrapping_add(8)),
        BusCycle::write(0x8002, 0x33),
        BusCycle::fetch(base.wrapping_add(11)),
    ]
}

/// `ALTERNATING_PATTERN`: `count` round trips of the 0xAA/0x55 write loop,
/// unrolled (the program itself loops forever; the script stops where the
/// caller asks).
#[must_use]
pub fn alternating_pattern(count: usize) -> Script {
    let _ = programs::ALTERNATING_PATTERN;
    let mut script = Script::new();
    for _ in 0..count {
        script.push(BusCycle::write(0x8000, 0xAA));
        script.push(BusCycle::write(0x8000, 0x55));
    }
    script
}

/// `count` back-to-back writes with no interleaved draining — used to drive
/// the ring past `HIGH_WATER` and exercise backpressure, the way the
/// alternating-pattern program does under a slow consumer.
#[must_use]
pub fn burst_writes(count: usize) -> Script {
    (0..count).map(|i| BusCycle::write(0x8000, if i % 2 == 0 { 0xAA } else { 0x55 })).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::SimPlatform;
    use crate::script::play;
    use z80_harness_core::{CaptureMode, CoreState};

    #[test]
    fn halt_only_establishes_base_and_leaves_no_writes() {
        let mut core = CoreState::new();
        core.set_program(&[0x76], 1).unwrap();
        let mut platform = SimPlatform::new();
        play(&mut core, &mut platform, &halt_only(0x4000));

        assert!(core.counters().read_isr_count() >= 1);
        assert_eq!(core.base_addr(), Some(0x4000));
        assert_eq!(core.captured_count(), 0);
    }

    #[test]
    fn single_write_is_validated_in_off_mode() {
        let mut core = CoreState::new();
        core.set_program(&[0x3E, 0x42, 0x32, 0x00, 0x80, 0x76], 6).unwrap();
        let mut platform = SimPlatform::new();
        play(&mut core, &mut platform, &single_write(0x0000));

        assert!(core.validate_write(0x8000, 0x42));
        assert_eq!(core.captured_count(), 1);
    }

    #[test]
    fn multi_write_preserves_order_in_buffered_mode() {
        let mut core = CoreState::new();
        let mut platform = SimPlatform::new();
        core.set_mode(&mut platform, CaptureMode::Buffered);
        core.set_program(&[0x3E, 0xAA, 0x32, 0x00, 0x80, 0x32, 0x01, 0x80, 0x32, 0x02, 0x80, 0x76], 12)
            .unwrap();
        play(&mut core, &mut platform, &multi_write(0x0000));

        let mut writes = Vec::new();
        while let Some(tx) = core.read_one(&mut platform) {
            if tx.op == z80_harness_core::BusOp::Write {
                writes.push((tx.address, tx.data));
            }
        }
        assert_eq!(writes, vec![(0x8000, 0x11), (0x8001, 0x22), (0x8002, 0x33)]);
    }

    #[test]
    fn alternating_pattern_keeps_counts_balanced() {
        let mut core = CoreState::new();
        let mut platform = SimPlatform::new();
        core.set_mode(&mut platform, CaptureMode::Buffered);
        // Drain as we go so the ring never overflows across many iterations.
        for cycle in alternating_pattern(50) {
            crate::script::play(&mut core, &mut platform, &vec![cycle]);
            core.process(&mut platform);
        }
        let aa = core.counters().count_aa();
        let fifty_five = core.counters().count_55();
        assert!(aa.abs_diff(fifty_five) <= 1);
    }
}
