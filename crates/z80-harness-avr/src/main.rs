//! Firmware entry point: wires the two edge-triggered interrupts to the
//! engine's ISR handlers and runs the cooperative main loop.
//!
//! There is no UART menu here — the interactive text menu is a host-side
//! collaborator (`z80-harness-cli`) that talks to the simulated platform;
//! shipping a wire protocol to drive this firmware from a host terminal is
//! out of scope (§1). This binary demonstrates the engine running against
//! real silicon with one catalogue program pre-loaded, the way a bring-up
//! smoke test would.
#![no_std]
#![no_main]

use core::cell::RefCell;

use avr_device::interrupt;
use avr_device::interrupt::Mutex;
use panic_halt as _;

use z80_harness_core::{programs, CaptureMode, CoreState};
use z80_harness_avr::AvrPlatform;

/// Default clock frequency the firmware brings the Z80 up at.
const DEFAULT_HZ: u32 = 500_000;

/// How often the main loop polls the ring and backpressure state, in
/// microseconds. Coarser than the hardware's real timing resolution; fine
/// for a cooperative consumer since the ISRs themselves never wait on it.
const POLL_PERIOD_US: u32 = 200;

static STATE: Mutex<RefCell<Option<CoreState>>> = Mutex::new(RefCell::new(None));
static PLATFORM: Mutex<RefCell<Option<AvrPlatform>>> = Mutex::new(RefCell::new(None));

#[avr_device::entry]
fn main() -> ! {
    let mut platform = AvrPlatform::take();
    let mut core = CoreState::new();

    core.init_pins(&mut platform);
    core.init_memory_handler();
    // A missing or oversized program is a configuration error the menu
    // would normally surface; the bring-up default is known to fit.
    core.load_program_to_cache(programs::SINGLE_WRITE, programs::SINGLE_WRITE.len() as u16)
        .ok();
    core.set_mode(&mut platform, CaptureMode::Buffered);
    core.init_clock(&mut platform, DEFAULT_HZ).ok();

    interrupt::free(|cs| {
        STATE.borrow(cs).replace(Some(core));
        PLATFORM.borrow(cs).replace(Some(platform));
    });

    configure_strobe_interrupts();
    unsafe {
        interrupt::enable();
    }

    let mut now_us: u32 = 0;
    loop {
        interrupt::free(|cs| {
            let mut state = STATE.borrow(cs).borrow_mut();
            let mut plat = PLATFORM.borrow(cs).borrow_mut();
            if let (Some(core), Some(platform)) = (state.as_mut(), plat.as_mut()) {
                core.process(platform);
                core.manage_backpressure(platform, now_us);
            }
        });
        now_us = now_us.wrapping_add(POLL_PERIOD_US);
        avr_device::asm::delay_cycles(u32::from(z80_harness_avr::timer1::HOST_HZ / 1_000_000) * POLL_PERIOD_US);
    }
}

/// `INT0`/`INT1` on the ATmega2560 are configured for falling-edge
/// sensitivity (`ISCn1:0 = 0b10`) and unmasked. No other interrupt source
/// is enabled — the hot path is exactly these two vectors, per §6.
fn configure_strobe_interrupts() {
    interrupt::free(|cs| {
        let mut plat = PLATFORM.borrow(cs).borrow_mut();
        if let Some(platform) = plat.as_mut() {
            platform.configure_strobe_interrupts();
        }
    });
}

#[avr_device::interrupt(atmega2560)]
fn INT0() {
    interrupt::free(|cs| {
        let mut state = STATE.borrow(cs).borrow_mut();
        let mut plat = PLATFORM.borrow(cs).borrow_mut();
        if let (Some(core), Some(platform)) = (state.as_mut(), plat.as_mut()) {
            core.on_read_edge(platform);
        }
    });
}

#[avr_device::interrupt(atmega2560)]
fn INT1() {
    interrupt::free(|cs| {
        let mut state = STATE.borrow(cs).borrow_mut();
        let mut plat = PLATFORM.borrow(cs).borrow_mut();
        if let (Some(core), Some(platform)) = (state.as_mut(), plat.as_mut()) {
            core.on_write_edge(platform);
        }
    });
}
