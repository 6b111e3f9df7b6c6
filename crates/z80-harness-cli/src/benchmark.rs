//! Performance self-test — the portable analogue of the original firmware's
//! `testReadPerformance`/`testWritePerformance`/`findMaximumSpeed` routines.
//!
//! A quality metric, not a pass/fail gate (see the open question on
//! tolerance in the design notes): each probed frequency bursts a fixed
//! number of unconsumed writes through the engine and reports how many the
//! ring actually absorbed before overflowing, then flags a deviation of
//! more than 15% from the 100 kHz baseline.

use z80_harness_core::{CaptureMode, CoreState};
use z80_harness_sim::{play, scenario, SimPlatform};

/// Frequencies probed, matching the original firmware's four-point sweep.
pub const PROBE_HZ: [u32; 4] = [100_000, 500_000, 1_000_000, 2_000_000];

/// Writes bursted, unconsumed, at each probe — large enough to run the ring
/// past `HIGH_WATER` and into overflow at every probed frequency.
const BURST_LEN: usize = 64;

/// Deviation beyond which a probe is flagged against the 100 kHz baseline.
const TOLERANCE_PCT: f32 = 15.0;

/// One probed frequency's result.
#[derive(Debug, Clone, Copy)]
pub struct ProbeResult {
    pub target_hz: u32,
    pub delivered: usize,
    pub overflow_count: u32,
    pub deviation_pct: f32,
    pub flagged: bool,
}

/// The full sweep, in probe order — `probes[0]` is the 100 kHz baseline
/// every later entry's `deviation_pct` is measured against.
#[derive(Debug, Clone)]
pub struct Report {
    pub probes: Vec<ProbeResult>,
}

/// Run the sweep against `core`/`platform`, clearing captured state and
/// resetting counters between probes. Leaves the engine in Buffered mode at
/// the last probed frequency; callers that reuse `core` afterward should
/// call `set_mode`/`set_frequency` again first.
#[must_use]
pub fn run(core: &mut CoreState, platform: &mut SimPlatform) -> Report {
    let mut probes = Vec::with_capacity(PROBE_HZ.len());
    let mut baseline_delivered: Option<usize> = None;
    // `ring_overflow_count` is cumulative for the engine's lifetime (it
    // reflects history, not live state — see the ring's own doc comment), so
    // each probe's delivered count is measured against the running total
    // observed just before it, not against zero.
    let mut overflow_before = core.ring_overflow_count();

    for &hz in &PROBE_HZ {
        core.clear();
        core.reset_isr_state();
        // Each probe deliberately bursts past HIGH_WATER without draining,
        // so WAIT is left asserted at the end of every probe; release it
        // before starting the next one rather than let it ride, self-healed
        // only by a consumer this benchmark never runs.
        core.release_wait(platform);
        core.set_mode(platform, CaptureMode::Buffered);

        let result = if core.frequency() == 0 {
            core.init_clock(platform, hz)
        } else {
            core.set_frequency(platform, hz)
        };
        if result.is_err() {
            // Out-of-range probe frequencies can't happen with this fixed
            // sweep, but a misconfigured core shouldn't panic the benchmark.
            continue;
        }

        let script = scenario::burst_writes(BURST_LEN);
        play(core, platform, &script);

        let overflow_count = core.ring_overflow_count() - overflow_before;
        overflow_before = core.ring_overflow_count();
        let delivered = BURST_LEN - overflow_count as usize;
        let baseline = *baseline_delivered.get_or_insert(delivered);
        let deviation_pct = if baseline == 0 {
            0.0
        } else {
            ((delivered as f32 - baseline as f32) / baseline as f32) * 100.0
        };

        probes.push(ProbeResult {
            target_hz: hz,
            delivered,
            overflow_count,
            deviation_pct,
            flagged: deviation_pct.abs() > TOLERANCE_PCT,
        });
    }

    // The last probe leaves WAIT asserted the same way every earlier one
    // did; release it so the sweep doesn't leave the Z80 stalled on exit.
    core.release_wait(platform);

    Report { probes }
}

/// Print a report the way the menu's other commands print: one line per
/// probe, `println!` only.
pub fn print_report(report: &Report) {
    println!("performance self-test (100 kHz baseline, ±{TOLERANCE_PCT}% tolerance):");
    for probe in &report.probes {
        let marker = if probe.flagged { "FLAGGED" } else { "ok" };
        println!(
            "  {:>8} Hz: delivered {:>3}/{BURST_LEN}, overflow {:>3}, deviation {:+.1}% [{marker}]",
            probe.target_hz, probe.delivered, probe.overflow_count, probe.deviation_pct
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sweep_reports_one_probe_per_frequency_with_a_sane_baseline() {
        let mut core = CoreState::new();
        let mut platform = SimPlatform::new();
        core.init_pins(&mut platform);

        let report = run(&mut core, &mut platform);

        assert_eq!(report.probes.len(), PROBE_HZ.len());
        assert_eq!(report.probes[0].target_hz, 100_000);
        assert_eq!(report.probes[0].deviation_pct, 0.0);
        for probe in &report.probes {
            assert!(probe.delivered <= BURST_LEN);
            assert_eq!(probe.delivered + probe.overflow_count as usize, BURST_LEN);
        }
    }

    #[test]
    fn overflow_counts_are_per_probe_not_cumulative_across_the_sweep() {
        // Each probe bursts the same fixed-length, unconsumed write sequence
        // into a ring that's cleared (but not overflow-reset) beforehand, so
        // a naive `BURST_LEN - core.ring_overflow_count()` would under-report
        // every probe after the first by the prior probes' overflow total.
        let mut core = CoreState::new();
        let mut platform = SimPlatform::new();
        core.init_pins(&mut platform);

        let report = run(&mut core, &mut platform);

        // The ring behaves identically at every probed frequency in this
        // simulated, instantaneous-playback harness, so every probe should
        // see the same delivered/overflow split as the 100 kHz baseline.
        let baseline = report.probes[0];
        for probe in &report.probes[1..] {
            assert_eq!(probe.overflow_count, baseline.overflow_count);
            assert_eq!(probe.delivered, baseline.delivered);
        }
    }

    #[test]
    fn sweep_does_not_leave_wait_asserted_on_exit() {
        // Every probe bursts past HIGH_WATER without draining; if nothing
        // released WAIT afterward the Z80 would be left stalled once `bench`
        // returns.
        let mut core = CoreState::new();
        let mut platform = SimPlatform::new();
        core.init_pins(&mut platform);

        run(&mut core, &mut platform);

        assert!(!platform.wait_asserted());
    }
}
