//! The platform seam (C0).
//!
//! Everything register-level lives behind these traits. The bus-cycle engine
//! in [`crate::core_state`] is generic over [`Platform`] so the same code runs
//! unmodified against real AVR silicon (`z80-harness-avr`) and a host-side
//! simulated bus used by tests (`z80-harness-sim`).

/// Read-only access to the Z80 address bus.
pub trait AddressBus {
    /// Compose the low and high address halves into a 16-bit address.
    fn read_address(&self) -> u16;
}

/// Bidirectional access to the Z80 data bus.
///
/// The bus is tri-stated (input mode) except for the brief window between
/// [`drive_data`](DataBus::drive_data) and the following
/// [`release_data`](DataBus::release_data).
pub trait DataBus {
    /// Set the data port to input mode and read the byte currently on it.
    fn read_data(&self) -> u8;

    /// Set the data port to output mode and drive `value` onto it.
    ///
    /// The port value is written before output mode is enabled, so the bus
    /// never glitches through an intermediate byte.
    fn drive_data(&mut self, value: u8);

    /// Return the data port to input mode (tri-state).
    fn release_data(&mut self);
}

/// The Z80 control signals: eight inputs the host observes, five outputs it drives.
pub trait ControlLines {
    /// `MREQ` is active (low).
    fn is_memory_request(&self) -> bool;
    /// `RD` is active (low).
    fn is_read_cycle(&self) -> bool;
    /// `WR` is active (low).
    fn is_write_cycle(&self) -> bool;
    /// `IORQ` is active (low).
    fn is_io_request(&self) -> bool;
    /// `RFSH` is active (low) — a DRAM refresh cycle, not a real memory access.
    fn is_refresh_cycle(&self) -> bool;
    /// `M1` is active (low) — an opcode fetch.
    fn is_m1_cycle(&self) -> bool;
    /// `HALT` is active (low).
    fn is_halt(&self) -> bool;
    /// `BUSACK` is active (low).
    fn is_bus_ack(&self) -> bool;

    /// Drive `RESET` low.
    fn assert_reset(&mut self);
    /// Release `RESET` (drive high).
    fn release_reset(&mut self);
    /// Drive `WAIT` low, holding the current bus cycle open.
    fn assert_wait(&mut self);
    /// Release `WAIT` (drive high).
    fn release_wait(&mut self);
    /// Emit a single low pulse of `width_us` microseconds on `NMI`.
    ///
    /// `width_us` is computed portably from the current clock frequency by
    /// [`crate::clock::pulse_width_us`]; only the raw timed pulse is
    /// platform-specific.
    fn pulse_nmi(&mut self, width_us: u32);
    /// Emit a single low pulse of `width_us` microseconds on `INT`, presenting
    /// `vector` on the data bus if the Z80 acknowledges with an
    /// interrupt-acknowledge cycle within a bounded spin count. Returns
    /// `true` if the Z80 acknowledged.
    fn pulse_int(&mut self, vector: u8, width_us: u32) -> bool;
}

/// The hardware timer that drives the Z80 clock pin (C2).
///
/// The prescaler-selection arithmetic itself is portable (see
/// [`crate::clock::choose_prescaler`]); this trait only covers the
/// platform-specific act of applying a chosen `(prescaler, top)` pair to a
/// running timer and connecting/disconnecting its output from the pin.
pub trait ClockTimer {
    /// The timer's input clock frequency in Hz (the AVR system crystal, or a
    /// simulated equivalent).
    fn host_hz(&self) -> u32;

    /// Configure the timer for fast-PWM, 50% duty, at the given
    /// `(prescaler, top)` pair, and connect the output to the clock pin.
    fn apply(&mut self, prescaler: u16, top: u16);

    /// Connect the timer's PWM output to the clock pin.
    fn connect_output(&mut self);

    /// Disconnect the timer's PWM output from the pin and drive it low.
    fn disconnect_output(&mut self);

    /// Emit one manual low→high→low transition on the clock pin, with brief
    /// settle delays. Only meaningful while the timer output is disconnected.
    fn manual_pulse(&mut self);
}

/// The full platform surface threaded through the bus-cycle engine.
pub trait Platform: AddressBus + DataBus + ControlLines + ClockTimer {}

impl<T> Platform for T where T: AddressBus + DataBus + ControlLines + ClockTimer {}
