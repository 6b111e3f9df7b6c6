//! Ties C1–C4 together and exposes the operations external collaborators
//! (menu, benchmark) call, per the external-interfaces section.

mod isr;

use crate::backpressure::{BackpressureState, CaptureMode};
use crate::clock::ClockState;
use crate::counters::Counters;
use crate::error::ConfigError;
use crate::image::ProgramImage;
use crate::observable::{Observable, Value};
use crate::platform::{ClockTimer, ControlLines, Platform};
use crate::ring::CaptureRing;
use crate::transaction::{BusOp, Transaction};
use crate::tuning::RING_CAPACITY;

/// The complete, platform-agnostic state of the bus-cycle engine.
///
/// Every mutable datum here has a single conceptual owner — the ISR
/// ([`on_read_edge`](CoreState::on_read_edge)/[`on_write_edge`](CoreState::on_write_edge))
/// or the main loop — as described in the data model's ownership note.
/// Multi-field updates from the main loop that must appear atomic to the ISR
/// (program loads, counter snapshots) are the caller's responsibility to
/// wrap in an interrupt-masked section; this type does not mask interrupts
/// itself since it has no platform-independent notion of "mask".
pub struct CoreState {
    pins_initialized: bool,
    memory_handler_initialized: bool,
    clock: ClockState,
    image: ProgramImage,
    ring: CaptureRing<RING_CAPACITY>,
    backpressure: BackpressureState,
    counters: Counters,
}

impl CoreState {
    /// Construct an unconfigured engine. The clock must be configured with
    /// [`init_clock`](Self::init_clock) before `start`/`set_frequency`
    /// become meaningful.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            pins_initialized: false,
            memory_handler_initialized: false,
            clock: ClockState::uninitialized(),
            image: ProgramImage::new(),
            ring: CaptureRing::new(),
            backpressure: BackpressureState::new(crate::tuning::FREQ_MIN),
            counters: Counters::new(),
        }
    }

    // ---- Initialisation -------------------------------------------------

    /// `init_pins()`: idempotent. Puts every control output into its
    /// inactive (high) state and tri-states the data bus.
    pub fn init_pins<P: Platform>(&mut self, platform: &mut P) {
        platform.release_reset();
        platform.release_wait();
        platform.release_data();
        self.pins_initialized = true;
    }

    /// `init_memory_handler()`: idempotent. Marks the engine ready to wire
    /// the ISR entry points to [`on_read_edge`](Self::on_read_edge) and
    /// [`on_write_edge`](Self::on_write_edge).
    pub fn init_memory_handler(&mut self) {
        self.memory_handler_initialized = true;
    }

    #[must_use]
    pub const fn pins_initialized(&self) -> bool {
        self.pins_initialized
    }

    #[must_use]
    pub const fn memory_handler_initialized(&self) -> bool {
        self.memory_handler_initialized
    }

    /// `reset_z80` begin phase: drive reset low and assert WAIT so the Z80
    /// halts on its first fetch after release. Split from the end phase
    /// because the core has no timing source of its own — the caller (main
    /// loop) holds reset for `duration` between the two calls.
    pub fn begin_reset<P: Platform>(&mut self, platform: &mut P) {
        platform.assert_wait();
        self.backpressure_note_external_wait();
        platform.assert_reset();
    }

    /// `reset_z80` end phase: release reset. WAIT is left asserted; the
    /// caller releases it explicitly once ready for the Z80 to run.
    pub fn end_reset<P: Platform>(&mut self, platform: &mut P) {
        platform.release_reset();
    }

    /// Release WAIT after a `reset_z80` sequence (or to acknowledge an
    /// Immediate-mode capture), once the caller is ready for the Z80 to run.
    /// Keeps the backpressure manager's bookkeeping in sync, unlike calling
    /// `platform.release_wait()` directly.
    pub fn release_wait<P: ControlLines>(&mut self, platform: &mut P) {
        self.backpressure.release_wait_externally(platform);
    }

    fn backpressure_note_external_wait(&mut self) {
        // WAIT was asserted by a caller outside the ring-occupancy path
        // (reset, Immediate mode); keep the bookkeeping flag in sync so a
        // later `note_pop`/`tick` doesn't release a WAIT it didn't assert.
        self.backpressure.force_wait_asserted();
    }

    // ---- Pulse generators -------------------------------------------------

    /// `trigger_nmi()`.
    pub fn trigger_nmi<P: Platform>(&mut self, platform: &mut P) {
        let width = crate::clock::pulse_width_us(self.clock.frequency());
        platform.pulse_nmi(width);
    }

    /// `trigger_int(vector)`. Returns whether the Z80 acknowledged within
    /// the bounded spin count.
    pub fn trigger_int<P: Platform>(&mut self, platform: &mut P, vector: u8) -> bool {
        let width = crate::clock::pulse_width_us(self.clock.frequency());
        platform.pulse_int(vector, width)
    }

    // ---- Program loading --------------------------------------------------

    /// `set_program(bytes, length)`. The caller masks interrupts for the
    /// duration of this call.
    pub fn set_program(&mut self, bytes: &[u8], length: u16) -> Result<(), ConfigError> {
        self.image.set_program(bytes, length)
    }

    /// `load_program_to_cache(bytes, length)`. The caller masks interrupts
    /// for the duration of this call.
    pub fn load_program_to_cache(&mut self, bytes: &[u8], length: u16) -> Result<(), ConfigError> {
        self.image.load_program_to_cache(bytes, length)
    }

    /// `set_cache_size(bytes)`.
    pub fn set_cache_size(&mut self, bytes: u16) -> Result<(), ConfigError> {
        self.image.set_cache_size(bytes)
    }

    // ---- Clock --------------------------------------------------------

    /// `init(hz)`.
    pub fn init_clock<P: ClockTimer>(&mut self, platform: &mut P, hz: u32) -> Result<(), ConfigError> {
        self.clock = ClockState::init(platform, hz)?;
        self.backpressure.set_target_hz(hz);
        Ok(())
    }

    /// `start()`.
    pub fn start_clock<P: ClockTimer>(&mut self, platform: &mut P) {
        self.clock.start(platform);
    }

    /// `stop()`.
    pub fn stop_clock<P: ClockTimer>(&mut self, platform: &mut P) {
        self.clock.stop(platform);
    }

    /// `set_frequency(hz)`: a direct, user-driven override. Unlike the
    /// backpressure manager's internal throttle/restore calls, this resets
    /// any in-progress throttling, since the caller is explicitly asking for
    /// a new target.
    pub fn set_frequency<P: ClockTimer>(&mut self, platform: &mut P, hz: u32) -> Result<(), ConfigError> {
        self.clock.set_frequency(platform, hz)?;
        self.backpressure.reset_target(hz);
        Ok(())
    }

    /// `single_step()`.
    pub fn single_step<P: ClockTimer>(&mut self, platform: &mut P) -> Result<(), ConfigError> {
        self.clock.single_step(platform)
    }

    /// `frequency()`.
    #[must_use]
    pub const fn frequency(&self) -> u32 {
        self.clock.frequency()
    }

    /// `is_running()`.
    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.clock.is_running()
    }

    // ---- Capture --------------------------------------------------------

    /// `set_mode(mode)`.
    pub fn set_mode<P: ControlLines>(&mut self, platform: &mut P, mode: CaptureMode) {
        self.backpressure.set_mode(mode, platform);
    }

    #[must_use]
    pub const fn mode(&self) -> CaptureMode {
        self.backpressure.mode()
    }

    /// `level()`.
    #[must_use]
    pub const fn level(&self) -> usize {
        self.ring.level()
    }

    /// `read_one(&out)`: pop one transaction from the ring, releasing WAIT if
    /// occupancy has dropped to `LOW_WATER`.
    pub fn read_one<P: ControlLines>(&mut self, platform: &mut P) -> Option<Transaction> {
        let tx = self.ring.pop()?;
        self.backpressure.note_pop(self.ring.level(), platform);
        Some(tx)
    }

    /// `clear()`: discard unconsumed ring entries (does not reset the
    /// overflow counter, which reflects history, not live state).
    pub fn clear(&mut self) {
        self.ring.clear();
    }

    /// `process()`: drain every currently-queued transaction, releasing WAIT
    /// as occupancy falls, without acting on the records. Collaborators that
    /// need the records call `read_one` in a loop instead; `process` is for
    /// a consumer that only cares about keeping the pipe flowing (e.g. while
    /// polling counters).
    pub fn process<P: ControlLines>(&mut self, platform: &mut P) {
        while self.read_one(platform).is_some() {}
    }

    /// `manage_backpressure()`: the periodic hysteresis evaluation.
    pub fn manage_backpressure<P: ClockTimer + ControlLines>(&mut self, platform: &mut P, now_us: u32) {
        let level = self.ring.level();
        self.backpressure.tick(&mut self.clock, platform, now_us, level);
    }

    // ---- Validation -------------------------------------------------------

    /// `validate_write(addr, data)`: in Off mode this consumes the
    /// single-slot flag; in Buffered mode it scans the live ring without
    /// advancing `tail`. Addresses are absolute bus addresses.
    #[must_use]
    pub fn validate_write(&mut self, addr: u16, data: u8) -> bool {
        match self.backpressure.mode() {
            CaptureMode::Off | CaptureMode::Immediate => self
                .counters
                .take_slot()
                .is_some_and(|slot| slot.address == addr && slot.data == data),
            CaptureMode::Buffered => self
                .ring
                .iter()
                .any(|tx| tx.op == BusOp::Write && tx.address == addr && tx.data == data),
        }
    }

    /// `get_captured_write(index, &addr, &data)`: the `index`-th live write
    /// in Buffered mode's ring (scanning without consuming); in Off/Immediate
    /// mode only `index == 0` can resolve, against the single slot.
    #[must_use]
    pub fn get_captured_write(&self, index: usize) -> Option<(u16, u8)> {
        match self.backpressure.mode() {
            CaptureMode::Off | CaptureMode::Immediate => {
                if index == 0 {
                    let slot = self.counters.peek_slot();
                    slot.ready.then_some((slot.address, slot.data))
                } else {
                    None
                }
            }
            CaptureMode::Buffered => self
                .ring
                .iter()
                .filter(|tx| tx.op == BusOp::Write)
                .nth(index)
                .map(|tx| (tx.address, tx.data)),
        }
    }

    /// `captured_count()`. In Off mode this cannot distinguish "no write
    /// observed" from "a write of 0x00 to address 0x0000" — see the open
    /// question in the design notes; callers needing disambiguation should
    /// use Buffered mode.
    #[must_use]
    pub fn captured_count(&self) -> u8 {
        match self.backpressure.mode() {
            CaptureMode::Off | CaptureMode::Immediate => u8::from(self.counters.peek_slot().ready),
            CaptureMode::Buffered => {
                self.ring.iter().filter(|tx| tx.op == BusOp::Write).count() as u8
            }
        }
    }

    // ---- State snapshot ---------------------------------------------------

    /// `reset_isr_state()`: zero every counter and invalidate the captured
    /// base address. Does not touch the program image contents, the clock,
    /// or the capture mode.
    pub fn reset_isr_state(&mut self) {
        self.counters.reset();
        self.image.invalidate_base();
    }

    #[must_use]
    pub const fn counters(&self) -> &Counters {
        &self.counters
    }

    #[must_use]
    pub const fn base_addr(&self) -> Option<u16> {
        self.image.base_addr()
    }

    #[must_use]
    pub const fn ring_overflow_count(&self) -> u32 {
        self.ring.overflow_count()
    }

}

impl Default for CoreState {
    fn default() -> Self {
        Self::new()
    }
}

impl Observable for CoreState {
    fn query(&self, path: &str) -> Option<Value> {
        Some(match path {
            "clock.frequency_hz" => Value::U32(self.clock.frequency()),
            "clock.running" => Value::Bool(self.clock.is_running()),
            "counters.trigger_count" => Value::U32(self.counters.trigger_count()),
            "counters.read_isr_count" => Value::U32(self.counters.read_isr_count()),
            "counters.write_isr_count" => Value::U32(self.counters.write_isr_count()),
            "counters.refresh_reject_count" => Value::U32(self.counters.refresh_reject_count()),
            "counters.last_read_address" => Value::U16(self.counters.last_read_address()),
            "counters.last_write_address" => Value::U16(self.counters.last_write_address()),
            "counters.count_aa" => Value::U32(self.counters.count_aa()),
            "counters.count_55" => Value::U32(self.counters.count_55()),
            "ring.level" => Value::U32(self.ring.level() as u32),
            "ring.overflow_count" => Value::U32(self.ring.overflow_count()),
            "backpressure.wait_asserted" => Value::Bool(self.backpressure.wait_asserted()),
            "backpressure.throttled" => Value::Bool(self.backpressure.is_throttled()),
            "backpressure.current_hz" => Value::U32(self.backpressure.current_hz()),
            "image.base_valid" => Value::Bool(self.image.base_addr().is_some()),
            _ => return None,
        })
    }

    fn query_paths(&self) -> &'static [&'static str] {
        &[
            "clock.frequency_hz",
            "clock.running",
            "counters.trigger_count",
            "counters.read_isr_count",
            "counters.write_isr_count",
            "counters.refresh_reject_count",
            "counters.last_read_address",
            "counters.last_write_address",
            "counters.count_aa",
            "counters.count_55",
            "ring.level",
            "ring.overflow_count",
            "backpressure.wait_asserted",
            "backpressure.throttled",
            "backpressure.current_hz",
            "image.base_valid",
        ]
    }
}
