//! [`SimPlatform`]: a host-side stand-in for the real AVR pins and timer.
//!
//! Every register the real platform would poke is a plain [`Cell`] here —
//! the direct analogue of the teacher's `SimpleBus`, which stands in for
//! cartridge/RAM wiring in CPU instruction tests. Interior mutability
//! through `Cell` rather than a `&mut self` receiver lets test code hold a
//! `&SimPlatform` for assertions (`applied()`, `is_connected()`, ...) at the
//! same time the engine holds a `&mut` through the `Platform` traits,
//! without reaching for `unsafe`.

use std::cell::Cell;

use z80_harness_core::{AddressBus, ClockTimer, ControlLines, DataBus};

/// The state of the simulated data port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DataPort {
    /// Tri-stated; the Z80 (or the test script) drives it.
    Input(u8),
    /// The host is driving it.
    Output(u8),
}

/// A host-side simulated Z80 bus and timer, implementing every trait in
/// [`z80_harness_core::platform`].
///
/// Construct with [`SimPlatform::new`], drive a bus cycle by setting
/// `address`/`incoming_data`/the relevant control-line cell with the
/// `set_*` helpers, then call the engine's `on_read_edge`/`on_write_edge`.
pub struct SimPlatform {
    address: Cell<u16>,
    data: Cell<DataPort>,
    memory_request: Cell<bool>,
    read_cycle: Cell<bool>,
    write_cycle: Cell<bool>,
    io_request: Cell<bool>,
    refresh: Cell<bool>,
    m1: Cell<bool>,
    halt: Cell<bool>,
    bus_ack: Cell<bool>,
    reset_asserted: Cell<bool>,
    wait_asserted: Cell<bool>,
    last_nmi_width_us: Cell<Option<u32>>,
    last_int: Cell<Option<(u8, u32)>>,
    ack_int: Cell<bool>,
    host_hz: Cell<u32>,
    applied: Cell<(u16, u16)>,
    connected: Cell<bool>,
    manual_pulses: Cell<u32>,
}

impl SimPlatform {
    /// A freshly reset platform: every control line inactive, data bus
    /// tri-stated, a 16 MHz host clock (the AVR crystal this harness was
    /// designed against).
    #[must_use]
    pub fn new() -> Self {
        Self::with_host_hz(16_000_000)
    }

    /// As [`new`](Self::new), with an explicit host clock frequency — useful
    /// for exercising [`z80_harness_core::clock::choose_prescaler`]'s
    /// fallback paths against a non-AVR crystal.
    #[must_use]
    pub fn with_host_hz(host_hz: u32) -> Self {
        Self {
            address: Cell::new(0),
            data: Cell::new(DataPort::Input(0)),
            memory_request: Cell::new(false),
            read_cycle: Cell::new(false),
            write_cycle: Cell::new(false),
            io_request: Cell::new(false),
            refresh: Cell::new(false),
            m1: Cell::new(false),
            halt: Cell::new(false),
            bus_ack: Cell::new(false),
            reset_asserted: Cell::new(false),
            wait_asserted: Cell::new(false),
            last_nmi_width_us: Cell::new(None),
            last_int: Cell::new(None),
            ack_int: Cell::new(true),
            host_hz: Cell::new(host_hz),
            applied: Cell::new((0, 0)),
            connected: Cell::new(false),
            manual_pulses: Cell::new(0),
        }
    }

    /// Present a read cycle at `address` (memory request asserted, read
    /// strobe implied) for the next ISR call.
    pub fn present_read(&self, address: u16, m1: bool) {
        self.address.set(address);
        self.memory_request.set(true);
        self.io_request.set(false);
        self.read_cycle.set(true);
        self.write_cycle.set(false);
        self.refresh.set(false);
        self.m1.set(m1);
        self.data.set(DataPort::Input(0));
    }

    /// Present a write cycle at `address` with `data` already on the bus
    /// (as the Z80 would drive it before the write strobe falls).
    pub fn present_write(&self, address: u16, data: u8) {
        self.address.set(address);
        self.memory_request.set(true);
        self.io_request.set(false);
        self.read_cycle.set(false);
        self.write_cycle.set(true);
        self.refresh.set(false);
        self.m1.set(false);
        self.data.set(DataPort::Input(data));
    }

    /// Present a refresh cycle: memory request asserted, neither strobe
    /// meaningful, `RFSH` asserted. Used to exercise the defensive guard in
    /// the ISR handlers.
    pub fn present_refresh(&self, address: u16) {
        self.address.set(address);
        self.memory_request.set(true);
        self.refresh.set(true);
        self.m1.set(false);
    }

    /// Present an I/O cycle: memory request *not* asserted. The ISR must
    /// drop this without touching the data bus.
    pub fn present_io(&self, address: u16) {
        self.address.set(address);
        self.memory_request.set(false);
        self.io_request.set(true);
        self.refresh.set(false);
    }

    /// What the host drove onto the data bus, if anything, since the last
    /// [`release_data`](DataBus::release_data).
    #[must_use]
    pub fn driven(&self) -> Option<u8> {
        match self.data.get() {
            DataPort::Output(v) => Some(v),
            DataPort::Input(_) => None,
        }
    }

    /// Whether the data port is currently tri-stated (input mode). True
    /// immediately after construction and after every `release_data`.
    #[must_use]
    pub fn is_tri_stated(&self) -> bool {
        matches!(self.data.get(), DataPort::Input(_))
    }

    #[must_use]
    pub fn reset_asserted(&self) -> bool {
        self.reset_asserted.get()
    }

    #[must_use]
    pub fn wait_asserted(&self) -> bool {
        self.wait_asserted.get()
    }

    /// The `(prescaler, top)` pair most recently applied by `ClockTimer::apply`.
    #[must_use]
    pub fn applied(&self) -> (u16, u16) {
        self.applied.get()
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connected.get()
    }

    #[must_use]
    pub fn manual_pulse_count(&self) -> u32 {
        self.manual_pulses.get()
    }

    #[must_use]
    pub fn last_nmi_width_us(&self) -> Option<u32> {
        self.last_nmi_width_us.get()
    }

    #[must_use]
    pub fn last_int(&self) -> Option<(u8, u32)> {
        self.last_int.get()
    }

    /// Control whether `pulse_int` reports an acknowledged interrupt —
    /// models whether the scripted Z80 responds within the spin budget.
    pub fn set_int_ack(&self, ack: bool) {
        self.ack_int.set(ack);
    }
}

impl Default for SimPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl AddressBus for SimPlatform {
    fn read_address(&self) -> u16 {
        self.address.get()
    }
}

impl DataBus for SimPlatform {
    fn read_data(&self) -> u8 {
        match self.data.get() {
            DataPort::Input(v) | DataPort::Output(v) => v,
        }
    }

    fn drive_data(&mut self, value: u8) {
        self.data.set(DataPort::Output(value));
    }

    fn release_data(&mut self) {
        let v = self.read_data();
        self.data.set(DataPort::Input(v));
    }
}

impl ControlLines for SimPlatform {
    fn is_memory_request(&self) -> bool {
        self.memory_request.get()
    }

    fn is_read_cycle(&self) -> bool {
        self.read_cycle.get()
    }

    fn is_write_cycle(&self) -> bool {
        self.write_cycle.get()
    }

    fn is_io_request(&self) -> bool {
        self.io_request.get()
    }

    fn is_refresh_cycle(&self) -> bool {
        self.refresh.get()
    }

    fn is_m1_cycle(&self) -> bool {
        self.m1.get()
    }

    fn is_halt(&self) -> bool {
        self.halt.get()
    }

    fn is_bus_ack(&self) -> bool {
        self.bus_ack.get()
    }

    fn assert_reset(&mut self) {
        self.reset_asserted.set(true);
    }

    fn release_reset(&mut self) {
        self.reset_asserted.set(false);
    }

    fn assert_wait(&mut self) {
        self.wait_asserted.set(true);
    }

    fn release_wait(&mut self) {
        self.wait_asserted.set(false);
    }

    fn pulse_nmi(&mut self, width_us: u32) {
        self.last_nmi_width_us.set(Some(width_us));
    }

    fn pulse_int(&mut self, vector: u8, width_us: u32) -> bool {
        self.last_int.set(Some((vector, width_us)));
        self.ack_int.get()
    }
}

impl ClockTimer for SimPlatform {
    fn host_hz(&self) -> u32 {
        self.host_hz.get()
    }

    fn apply(&mut self, prescaler: u16, top: u16) {
        self.applied.set((prescaler, top));
    }

    fn connect_output(&mut self) {
        self.connected.set(true);
    }

    fn disconnect_output(&mut self) {
        self.connected.set(false);
    }

    fn manual_pulse(&mut self) {
        self.manual_pulses.set(self.manual_pulses.get() + 1);
    }
}
