//! Backpressure state machine (C4): WAIT assertion, then clock throttling
//! with hysteresis.
//!
//! Replaces the original two-booleans-plus-timestamp representation with the
//! explicit `BackpressureZone` enum recommended in the design notes, so
//! "are we throttled, and by how much" is a single value instead of a pair
//! that can disagree.

use crate::clock::ClockState;
use crate::platform::ClockTimer;
use crate::tuning::{FACTOR, HIGH_WATER, LOW_WATER, MIN_HZ, SUSTAINED_WAIT_US};

/// Capture mode, selected by the caller via `set_mode`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaptureMode {
    /// Fastest; writes update a single-slot record, reads are not recorded.
    #[default]
    Off,
    /// Ring buffer plus backpressure.
    Buffered,
    /// WAIT pre-asserted on mode switch; each ISR fills the single slot and
    /// leaves WAIT asserted until the consumer acknowledges.
    Immediate,
}

/// The explicit running/throttled state machine spanning C2 and C4.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackpressureZone {
    /// No backpressure in effect.
    Normal,
    /// WAIT has been asserted, but not yet held long enough to throttle.
    WaitOnly,
    /// Throttled `n` halving-steps below `target_hz`, with headroom to throttle further.
    Throttled(u8),
    /// Throttled all the way down to `MIN_HZ`; cannot throttle further.
    AtFloor,
}

/// WAIT assertion and clock-throttling state (C4), driven by ring occupancy.
#[derive(Debug, Clone, Copy)]
pub struct BackpressureState {
    mode: CaptureMode,
    wait_asserted: bool,
    zone: BackpressureZone,
    wait_start_us: Option<u32>,
    low_water_us: Option<u32>,
    target_hz: u32,
    current_hz: u32,
}

impl BackpressureState {
    #[must_use]
    pub const fn new(target_hz: u32) -> Self {
        Self {
            mode: CaptureMode::Off,
            wait_asserted: false,
            zone: BackpressureZone::Normal,
            wait_start_us: None,
            low_water_us: None,
            target_hz,
            current_hz: target_hz,
        }
    }

    #[must_use]
    pub const fn mode(&self) -> CaptureMode {
        self.mode
    }

    #[must_use]
    pub const fn wait_asserted(&self) -> bool {
        self.wait_asserted
    }

    #[must_use]
    pub const fn zone(&self) -> BackpressureZone {
        self.zone
    }

    #[must_use]
    pub const fn current_hz(&self) -> u32 {
        self.current_hz
    }

    #[must_use]
    pub const fn is_throttled(&self) -> bool {
        matches!(self.zone, BackpressureZone::Throttled(_) | BackpressureZone::AtFloor)
    }

    /// `set_mode(m)`: idempotent. Switching into Immediate pre-asserts WAIT,
    /// as deterministic single-step semantics require; switching away from
    /// it does not itself release WAIT (the caller releases explicitly).
    pub fn set_mode(&mut self, mode: CaptureMode, control: &mut impl crate::platform::ControlLines) {
        if mode == self.mode {
            return;
        }
        self.mode = mode;
        if mode == CaptureMode::Immediate {
            control.assert_wait();
            self.wait_asserted = true;
        }
    }

    /// Update `target_hz` (e.g. after the caller calls `Clock::set_frequency`
    /// directly). Does not itself touch `current_hz` or the zone.
    pub fn set_target_hz(&mut self, target_hz: u32) {
        self.target_hz = target_hz;
    }

    /// A direct, user-driven frequency override (`set_frequency`): unlike
    /// `set_target_hz`, this also cancels any in-progress throttling, since
    /// the caller is explicitly asking for a new running frequency, not
    /// reporting what the floor for future throttling should be.
    pub fn reset_target(&mut self, hz: u32) {
        self.target_hz = hz;
        self.current_hz = hz;
        self.zone = BackpressureZone::Normal;
        self.wait_start_us = None;
        self.low_water_us = None;
    }

    /// Record that WAIT was asserted by a caller outside the occupancy path
    /// (`reset_z80`, switching into Immediate mode), so a later `note_pop`
    /// or `tick` doesn't release a WAIT it didn't itself assert.
    pub fn force_wait_asserted(&mut self) {
        self.wait_asserted = true;
    }

    /// Release WAIT on the caller's explicit say-so (the end of `reset_z80`,
    /// or a consumer acknowledging an Immediate-mode capture), keeping the
    /// bookkeeping flag in sync so a later `note_push`/`tick` starts from a
    /// known state instead of believing a WAIT it didn't assert is still held.
    pub fn release_wait_externally(&mut self, control: &mut impl crate::platform::ControlLines) {
        control.release_wait();
        self.wait_asserted = false;
    }

    /// Called from the ISR's ring-push path: if occupancy has reached
    /// `HIGH_WATER` and WAIT isn't already asserted, assert it. No timing
    /// state is touched here — that's the main loop's job in `tick`.
    pub fn note_push(&mut self, level: usize, control: &mut impl crate::platform::ControlLines) {
        if level >= HIGH_WATER && !self.wait_asserted {
            control.assert_wait();
            self.wait_asserted = true;
        }
    }

    /// Called from the main loop after each ring pop: if occupancy has
    /// dropped to `LOW_WATER` and WAIT is asserted, release it immediately.
    pub fn note_pop(&mut self, level: usize, control: &mut impl crate::platform::ControlLines) {
        if level <= LOW_WATER && self.wait_asserted {
            control.release_wait();
            self.wait_asserted = false;
        }
    }

    /// The periodic main-loop evaluation of the hysteresis state machine
    /// (`manage_backpressure`). `now_us` is a free-running microsecond
    /// counter; differences are computed with wrapping subtraction so a
    /// single wraparound within the measurement window is harmless.
    pub fn tick<P: ClockTimer + crate::platform::ControlLines>(
        &mut self,
        clock: &mut ClockState,
        platform: &mut P,
        now_us: u32,
        level: usize,
    ) {
        if level >= HIGH_WATER {
            self.low_water_us = None;
            if !self.wait_asserted {
                platform.assert_wait();
                self.wait_asserted = true;
            }
            if self.zone == BackpressureZone::Normal {
                self.zone = BackpressureZone::WaitOnly;
            }
            let start = *self.wait_start_us.get_or_insert(now_us);
            let held_us = now_us.wrapping_sub(start);
            if held_us > SUSTAINED_WAIT_US && self.current_hz > MIN_HZ {
                self.throttle_step(clock, platform);
                self.wait_start_us = Some(now_us);
            }
        } else if level <= LOW_WATER {
            if self.wait_asserted {
                platform.release_wait();
                self.wait_asserted = false;
            }
            self.wait_start_us = None;
            let start = *self.low_water_us.get_or_insert(now_us);
            let quiet_us = now_us.wrapping_sub(start);
            if self.is_throttled() && quiet_us > SUSTAINED_WAIT_US {
                self.current_hz = self.target_hz;
                let _ = clock.set_frequency(platform, self.current_hz);
                self.zone = BackpressureZone::Normal;
                self.low_water_us = None;
            }
        }
        // MID zone: hysteresis dead-band, no state change.
    }

    fn throttle_step<P: ClockTimer>(&mut self, clock: &mut ClockState, platform: &mut P) {
        let halved = (self.current_hz / FACTOR).max(MIN_HZ);
        let reached_floor = halved <= MIN_HZ;
        // A frequency change that cannot be realised leaves the clock
        // untouched; we still record the attempted zone so WAIT stays
        // asserted and the machine doesn't spin retrying every tick.
        if clock.set_frequency(platform, halved).is_ok() {
            self.current_hz = halved;
        }
        self.zone = match self.zone {
            BackpressureZone::Normal | BackpressureZone::WaitOnly => {
                if reached_floor { BackpressureZone::AtFloor } else { BackpressureZone::Throttled(1) }
            }
            BackpressureZone::Throttled(n) => {
                if reached_floor { BackpressureZone::AtFloor } else { BackpressureZone::Throttled(n + 1) }
            }
            BackpressureZone::AtFloor => BackpressureZone::AtFloor,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{AddressBus, ClockTimer, ControlLines, DataBus};

    #[derive(Default)]
    struct FakeControl {
        wait: bool,
    }
    impl AddressBus for FakeControl {
        fn read_address(&self) -> u16 {
            0
        }
    }
    impl DataBus for FakeControl {
        fn read_data(&self) -> u8 {
            0
        }
        fn drive_data(&mut self, _v: u8) {}
        fn release_data(&mut self) {}
    }
    impl ControlLines for FakeControl {
        fn is_memory_request(&self) -> bool {
            true
        }
        fn is_read_cycle(&self) -> bool {
            false
        }
        fn is_write_cycle(&self) -> bool {
            false
        }
        fn is_io_request(&self) -> bool {
            false
        }
        fn is_refresh_cycle(&self) -> bool {
            false
        }
        fn is_m1_cycle(&self) -> bool {
            false
        }
        fn is_halt(&self) -> bool {
            false
        }
        fn is_bus_ack(&self) -> bool {
            false
        }
        fn assert_reset(&mut self) {}
        fn release_reset(&mut self) {}
        fn assert_wait(&mut self) {
            self.wait = true;
        }
        fn release_wait(&mut self) {
            self.wait = false;
        }
        fn pulse_nmi(&mut self, _width_us: u32) {}
        fn pulse_int(&mut self, _vector: u8, _width_us: u32) -> bool {
            true
        }
    }
    impl ClockTimer for FakeControl {
        fn host_hz(&self) -> u32 {
            16_000_000
        }
        fn apply(&mut self, _prescaler: u16, _top: u16) {}
        fn connect_output(&mut self) {}
        fn disconnect_output(&mut self) {}
        fn manual_pulse(&mut self) {}
    }

    #[test]
    fn boundary_at_high_water_minus_one_does_not_assert() {
        let mut bp = BackpressureState::new(2_000_000);
        let mut fc = FakeControl::default();
        bp.note_push(HIGH_WATER - 1, &mut fc);
        assert!(!bp.wait_asserted());
    }

    #[test]
    fn boundary_at_high_water_asserts_within_one_push() {
        let mut bp = BackpressureState::new(2_000_000);
        let mut fc = FakeControl::default();
        bp.note_push(HIGH_WATER, &mut fc);
        assert!(bp.wait_asserted());
        assert!(fc.wait);
    }

    #[test]
    fn boundary_low_water_plus_one_keeps_wait_low_water_releases() {
        let mut bp = BackpressureState::new(2_000_000);
        let mut fc = FakeControl::default();
        bp.note_push(HIGH_WATER, &mut fc);
        bp.note_pop(LOW_WATER + 1, &mut fc);
        assert!(bp.wait_asserted());
        bp.note_pop(LOW_WATER, &mut fc);
        assert!(!bp.wait_asserted());
    }

    #[test]
    fn sustained_high_water_throttles_by_factor_then_restores() {
        let mut bp = BackpressureState::new(2_000_000);
        let mut fc = FakeControl::default();
        let mut clock = ClockState::init(&mut fc, 2_000_000).unwrap();

        bp.tick(&mut clock, &mut fc, 0, HIGH_WATER);
        assert!(!bp.is_throttled());
        bp.tick(&mut clock, &mut fc, SUSTAINED_WAIT_US + 1, HIGH_WATER);
        assert!(bp.is_throttled());
        assert!(bp.current_hz() <= 2_000_000 / FACTOR);
        assert_eq!(clock.frequency(), bp.current_hz());

        // Ring drains and stays quiet for the sustained window: restore.
        bp.tick(&mut clock, &mut fc, SUSTAINED_WAIT_US + 2, LOW_WATER);
        bp.tick(&mut clock, &mut fc, 2 * SUSTAINED_WAIT_US + 10, LOW_WATER);
        assert!(!bp.is_throttled());
        assert_eq!(bp.current_hz(), 2_000_000);
    }

    #[test]
    fn mid_zone_is_a_no_op_dead_band() {
        let mut bp = BackpressureState::new(2_000_000);
        let mut fc = FakeControl::default();
        let mut clock = ClockState::init(&mut fc, 2_000_000).unwrap();
        bp.tick(&mut clock, &mut fc, 0, (HIGH_WATER + LOW_WATER) / 2);
        assert!(!bp.wait_asserted());
        assert!(!bp.is_throttled());
    }

    #[test]
    fn set_mode_is_idempotent() {
        let mut bp = BackpressureState::new(1_000_000);
        let mut fc = FakeControl::default();
        bp.set_mode(CaptureMode::Immediate, &mut fc);
        assert!(bp.wait_asserted());
        fc.wait = true;
        bp.set_mode(CaptureMode::Immediate, &mut fc);
        assert_eq!(bp.mode(), CaptureMode::Immediate);
    }
}
