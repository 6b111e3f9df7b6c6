//! AVR (`ATmega2560`) implementation of the bus-cycle engine's platform
//! seam (C0). Every register poke the engine needs lives here, behind the
//! same four traits the host-side simulator implements; `z80-harness-core`
//! never sees this crate and runs unmodified against either.
#![no_std]

pub mod pins;
pub mod timer1;

use avr_device::atmega2560::Peripherals;
use z80_harness_core::tuning::INT_ACK_SPIN_LIMIT;
use z80_harness_core::{AddressBus, ClockTimer, ControlLines, DataBus};

use pins::Pins;
use timer1::Timer1;

/// The concrete platform the bus-cycle engine runs against on real silicon.
///
/// Holds the singleton [`Peripherals`] handle; every trait method is a thin
/// wrapper around [`pins`] or [`timer1`]. `z80-harness-core`'s ISR entry
/// points (`on_read_edge`/`on_write_edge`) are called directly from the
/// `INT0`/`INT1` vectors in `main.rs` with a `&mut AvrPlatform` built from
/// this handle.
pub struct AvrPlatform {
    dp: Peripherals,
    last_prescaler: u16,
}

impl AvrPlatform {
    /// Take the device peripherals and bring every pin to its idle state.
    /// Panics (via `.unwrap()`, the standard `avr-device` idiom) if called
    /// more than once — there is exactly one set of peripherals.
    #[must_use]
    pub fn take() -> Self {
        let dp = Peripherals::take().unwrap();
        Pins::init(&dp);
        Timer1::init(&dp);
        Self { dp, last_prescaler: 1 }
    }

    /// Configure `INT0` (`RD`) and `INT1` (`WR`) for falling-edge sensitivity
    /// and unmask both. Left out of [`take`](Self::take) since the caller
    /// still has interrupts globally disabled at that point and may want to
    /// finish bringing up state before the first edge can land.
    pub fn configure_strobe_interrupts(&mut self) {
        self.dp.EXINT.eicra.modify(|_, w| w.isc0().bits(0b10).isc1().bits(0b10));
        self.dp.EXINT.eimsk.modify(|r, w| unsafe { w.bits(r.bits() | 0b0000_0011) });
    }
}

impl AddressBus for AvrPlatform {
    fn read_address(&self) -> u16 {
        Pins::read_address(&self.dp)
    }
}

impl DataBus for AvrPlatform {
    fn read_data(&self) -> u8 {
        Pins::read_data(&self.dp)
    }

    fn drive_data(&mut self, value: u8) {
        Pins::drive_data(&self.dp, value);
    }

    fn release_data(&mut self) {
        Pins::release_data(&self.dp);
    }
}

impl ControlLines for AvrPlatform {
    fn is_memory_request(&self) -> bool {
        Pins::is_memory_request(&self.dp)
    }

    fn is_read_cycle(&self) -> bool {
        Pins::is_read_cycle(&self.dp)
    }

    fn is_write_cycle(&self) -> bool {
        Pins::is_write_cycle(&self.dp)
    }

    fn is_io_request(&self) -> bool {
        Pins::is_io_request(&self.dp)
    }

    fn is_refresh_cycle(&self) -> bool {
        Pins::is_refresh_cycle(&self.dp)
    }

    fn is_m1_cycle(&self) -> bool {
        Pins::is_m1_cycle(&self.dp)
    }

    fn is_halt(&self) -> bool {
        Pins::is_halt(&self.dp)
    }

    fn is_bus_ack(&self) -> bool {
        Pins::is_bus_ack(&self.dp)
    }

    fn assert_reset(&mut self) {
        Pins::assert_reset(&self.dp);
    }

    fn release_reset(&mut self) {
        Pins::release_reset(&self.dp);
    }

    fn assert_wait(&mut self) {
        Pins::assert_wait(&self.dp);
    }

    fn release_wait(&mut self) {
        Pins::release_wait(&self.dp);
    }

    fn pulse_nmi(&mut self, width_us: u32) {
        Pins::assert_nmi(&self.dp);
        avr_device::asm::delay_cycles(width_us * (timer1::HOST_HZ / 1_000_000));
        Pins::release_nmi(&self.dp);
    }

    fn pulse_int(&mut self, vector: u8, width_us: u32) -> bool {
        Pins::assert_int(&self.dp);
        let mut acked = false;
        for _ in 0..INT_ACK_SPIN_LIMIT {
            if Pins::is_int_ack(&self.dp) {
                acked = true;
                break;
            }
        }
        if acked {
            // The Z80 reads the interrupt vector from the data bus during the
            // acknowledge cycle; drive it for the remainder of the pulse and
            // tri-state before releasing INT so the next bus cycle starts clean.
            Pins::drive_data(&self.dp, vector);
        }
        avr_device::asm::delay_cycles(width_us * (timer1::HOST_HZ / 1_000_000));
        if acked {
            Pins::release_data(&self.dp);
        }
        Pins::release_int(&self.dp);
        acked
    }
}

impl ClockTimer for AvrPlatform {
    fn host_hz(&self) -> u32 {
        timer1::HOST_HZ
    }

    fn apply(&mut self, prescaler: u16, top: u16) {
        self.last_prescaler = prescaler;
        Timer1::apply(&self.dp, top);
    }

    fn connect_output(&mut self) {
        Timer1::connect(&self.dp, self.last_prescaler);
    }

    fn disconnect_output(&mut self) {
        Timer1::disconnect(&self.dp);
    }

    fn manual_pulse(&mut self) {
        Timer1::manual_pulse(&self.dp);
    }
}
