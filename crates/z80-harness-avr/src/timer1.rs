//! C2's register-level half: `TIMER1` configured for fast-PWM, 50% duty,
//! driving `OC1A` (`PB5`) as the Z80 clock pin.
//!
//! The prescaler-selection arithmetic itself lives in
//! `z80_harness_core::clock` as portable code; this module only ever
//! applies an already-chosen `(prescaler, top)` pair to the timer hardware,
//! per the design notes' "confine register pokes to a platform module"
//! guidance.

use avr_device::atmega2560::Peripherals;

/// The ATmega2560 system crystal this harness was built against.
pub const HOST_HZ: u32 = 16_000_000;

fn prescaler_bits(prescaler: u16) -> u8 {
    match prescaler {
        1 => 0b001,
        8 => 0b010,
        64 => 0b011,
        256 => 0b100,
        1024 => 0b101,
        _ => 0b000, // no clock source; unreachable given `choose_prescaler`'s output set
    }
}

pub struct Timer1;

impl Timer1 {
    /// Configure `PB5` (`OC1A`) as an output and put `TIMER1` into fast-PWM
    /// mode 14 (`ICR1` as `TOP`), clear-on-compare-match on channel A, with
    /// the timer stopped (clock source `0`) until [`connect`](Self::connect).
    pub fn init(dp: &Peripherals) {
        dp.PORTB.ddrb.modify(|r, w| unsafe { w.bits(r.bits() | (1 << 5)) });
        dp.TC1.tccr1a.write(|w| w.wgm1().bits(0b10).com1a().match_clear());
        dp.TC1.tccr1b.write(|w| w.wgm1().bits(0b11).cs1().direct());
    }

    /// Apply `(prescaler, top)`: `ICR1 := top`, `OCR1A := top/2` (50% duty,
    /// floored), without touching the clock-source bits — those are set
    /// separately by [`connect`]/[`disconnect`].
    pub fn apply(dp: &Peripherals, top: u16) {
        dp.TC1.icr1.write(|w| unsafe { w.bits(top) });
        dp.TC1.ocr1a.write(|w| unsafe { w.bits(top / 2) });
    }

    /// Start the timer at `prescaler` and connect `OC1A` to the pin.
    pub fn connect(dp: &Peripherals, prescaler: u16) {
        dp.TC1.tccr1b.modify(|_, w| w.cs1().bits(prescaler_bits(prescaler)));
    }

    /// Stop the timer's clock source and drive the pin low directly, so the
    /// Z80 sees a defined idle level rather than a floating or stuck-high
    /// clock input.
    pub fn disconnect(dp: &Peripherals) {
        dp.TC1.tccr1b.modify(|_, w| w.cs1().bits(0));
        dp.PORTB.portb.modify(|r, w| unsafe { w.bits(r.bits() & !(1 << 5)) });
    }

    /// One manual low→high→low transition with a brief settle delay,
    /// for use only while the timer clock source is disconnected.
    pub fn manual_pulse(dp: &Peripherals) {
        dp.PORTB.portb.modify(|r, w| unsafe { w.bits(r.bits() | (1 << 5)) });
        avr_device::asm::delay_cycles(u32::from(HOST_HZ / 1_000_000) * 2);
        dp.PORTB.portb.modify(|r, w| unsafe { w.bits(r.bits() & !(1 << 5)) });
    }
}
