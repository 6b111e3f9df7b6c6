//! Host-side simulated platform for the Z80 bus-cycle engine.
//!
//! Implements every trait in `z80_harness_core::platform` with `Cell`-backed
//! state instead of hardware registers — the direct analogue of the
//! teacher's `SimpleBus` test double, but for a pin/bus interface rather
//! than a memory map. Used by `z80-harness-core`'s own `tests/` integration
//! suite and by the `z80-harness-cli` demo binary; never linked into
//! anything that runs on the real AVR target.

pub mod platform;
pub mod scenario;
pub mod script;

pub use platform::SimPlatform;
pub use script::{play, BusCycle, Script};
