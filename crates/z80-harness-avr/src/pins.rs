//! C1, confined to the ATmega2560's GPIO registers.
//!
//! Pin assignment (the spec pins down roles and polarities only, §6):
//!
//! | Signal group | Port | Notes |
//! |---|---|---|
//! | Address low byte | `PORTA` | input |
//! | Address high byte | `PORTC` | input |
//! | Data bus | `PORTL` | bidirectional, `DDRL` switched per direction |
//! | `RD,WR,MREQ,IORQ,M1,RFSH,HALT,BUSACK` | `PORTG` bits 0-5, `PORTJ` bits 0-1 | active low |
//! | `RESET,WAIT,INT,NMI,BUSRQ` | `PORTK` bits 0-4 | active low outputs |
//!
//! A 40-pin target like the Z80 needs more I/O than a 328p exposes, hence
//! the 2560: the Mega's eight full 8-bit ports give the address/data buses
//! dedicated ports instead of a shift-register multiplexer.

use avr_device::atmega2560::Peripherals;

const RD_BIT: u8 = 1 << 0;
const WR_BIT: u8 = 1 << 1;
const MREQ_BIT: u8 = 1 << 2;
const IORQ_BIT: u8 = 1 << 3;
const M1_BIT: u8 = 1 << 4;
const RFSH_BIT: u8 = 1 << 5;
const HALT_BIT: u8 = 1 << 0; // PORTJ
const BUSACK_BIT: u8 = 1 << 1; // PORTJ

const RESET_BIT: u8 = 1 << 0;
const WAIT_BIT: u8 = 1 << 1;
const INT_BIT: u8 = 1 << 2;
const NMI_BIT: u8 = 1 << 3;
const BUSRQ_BIT: u8 = 1 << 4;

/// Borrow of the GPIO registers this module owns. Constructed once from the
/// singleton [`Peripherals`] and threaded through [`crate::AvrPlatform`].
pub struct Pins;

impl Pins {
    /// Configure data direction registers: address and control-input ports
    /// as input, the data port tri-stated, control-output port as output
    /// with every line driven to its inactive (high) state.
    pub fn init(dp: &Peripherals) {
        dp.PORTA.ddra.write(|w| unsafe { w.bits(0x00) });
        dp.PORTC.ddrc.write(|w| unsafe { w.bits(0x00) });
        dp.PORTL.ddrl.write(|w| unsafe { w.bits(0x00) });
        dp.PORTG.ddrg.write(|w| unsafe { w.bits(0x00) });
        dp.PORTJ.ddrj.write(|w| unsafe { w.bits(0x00) });

        dp.PORTK.ddrk.write(|w| unsafe { w.bits(0xFF) });
        dp.PORTK.portk.write(|w| unsafe { w.bits(0xFF) }); // all outputs inactive (high)
    }

    pub fn read_address(dp: &Peripherals) -> u16 {
        let lo = dp.PORTA.pina.read().bits();
        let hi = dp.PORTC.pinc.read().bits();
        u16::from(lo) | (u16::from(hi) << 8)
    }

    pub fn read_data(dp: &Peripherals) -> u8 {
        dp.PORTL.ddrl.write(|w| unsafe { w.bits(0x00) });
        // One no-op settle for the input synchroniser before sampling.
        avr_device::asm::nop();
        dp.PORTL.pinl.read().bits()
    }

    pub fn drive_data(dp: &Peripherals, value: u8) {
        dp.PORTL.portl.write(|w| unsafe { w.bits(value) });
        dp.PORTL.ddrl.write(|w| unsafe { w.bits(0xFF) });
    }

    pub fn release_data(dp: &Peripherals) {
        dp.PORTL.ddrl.write(|w| unsafe { w.bits(0x00) });
    }

    fn control_g_low(dp: &Peripherals, bit: u8) -> bool {
        dp.PORTG.ping.read().bits() & bit == 0
    }

    fn control_j_low(dp: &Peripherals, bit: u8) -> bool {
        dp.PORTJ.pinj.read().bits() & bit == 0
    }

    pub fn is_memory_request(dp: &Peripherals) -> bool {
        Self::control_g_low(dp, MREQ_BIT)
    }

    pub fn is_read_cycle(dp: &Peripherals) -> bool {
        Self::control_g_low(dp, RD_BIT)
    }

    pub fn is_write_cycle(dp: &Peripherals) -> bool {
        Self::control_g_low(dp, WR_BIT)
    }

    pub fn is_io_request(dp: &Peripherals) -> bool {
        Self::control_g_low(dp, IORQ_BIT)
    }

    pub fn is_refresh_cycle(dp: &Peripherals) -> bool {
        Self::control_g_low(dp, RFSH_BIT)
    }

    pub fn is_m1_cycle(dp: &Peripherals) -> bool {
        Self::control_g_low(dp, M1_BIT)
    }

    pub fn is_halt(dp: &Peripherals) -> bool {
        Self::control_j_low(dp, HALT_BIT)
    }

    pub fn is_bus_ack(dp: &Peripherals) -> bool {
        Self::control_j_low(dp, BUSACK_BIT)
    }

    fn set_k_bit(dp: &Peripherals, bit: u8, active: bool) {
        dp.PORTK.portk.modify(|r, w| {
            let bits = r.bits();
            unsafe { w.bits(if active { bits & !bit } else { bits | bit }) }
        });
    }

    pub fn assert_reset(dp: &Peripherals) {
        Self::set_k_bit(dp, RESET_BIT, true);
    }

    pub fn release_reset(dp: &Peripherals) {
        Self::set_k_bit(dp, RESET_BIT, false);
    }

    pub fn assert_wait(dp: &Peripherals) {
        Self::set_k_bit(dp, WAIT_BIT, true);
    }

    pub fn release_wait(dp: &Peripherals) {
        Self::set_k_bit(dp, WAIT_BIT, false);
    }

    pub fn assert_nmi(dp: &Peripherals) {
        Self::set_k_bit(dp, NMI_BIT, true);
    }

    pub fn release_nmi(dp: &Peripherals) {
        Self::set_k_bit(dp, NMI_BIT, false);
    }

    pub fn assert_int(dp: &Peripherals) {
        Self::set_k_bit(dp, INT_BIT, true);
    }

    pub fn release_int(dp: &Peripherals) {
        Self::set_k_bit(dp, INT_BIT, false);
    }

    pub fn is_int_ack(dp: &Peripherals) -> bool {
        // IORQ and M1 both low during an interrupt-acknowledge cycle.
        Self::is_io_request(dp) && Self::is_m1_cycle(dp)
    }

    #[allow(dead_code)]
    pub fn is_bus_request_line_set(dp: &Peripherals) -> bool {
        dp.PORTK.pink.read().bits() & BUSRQ_BIT == 0
    }
}
