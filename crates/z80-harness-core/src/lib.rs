//! Platform-agnostic bus-cycle engine for the Z80 processor-validation
//! harness.
//!
//! This crate is `no_std`: it holds the state and algorithms shared by the
//! real AVR host (`z80-harness-avr`) and the host-side simulator used for
//! tests and the CLI (`z80-harness-sim`). Everything that touches a
//! register, a pin, or a timer lives behind the [`platform`] seam; this
//! crate only ever sees that seam through its traits.
//!
//! `no_std` except under `cfg(test)`, where the host's test harness needs
//! `std` regardless of what the crate under test links against.
#![cfg_attr(not(test), no_std)]

pub mod backpressure;
pub mod clock;
pub mod core_state;
pub mod counters;
pub mod error;
pub mod image;
pub mod observable;
pub mod platform;
pub mod programs;
pub mod ring;
pub mod transaction;
pub mod tuning;

pub use backpressure::{BackpressureState, BackpressureZone, CaptureMode};
pub use clock::ClockState;
pub use core_state::CoreState;
pub use counters::{CapturedWrite, Counters};
pub use error::ConfigError;
pub use image::ProgramImage;
pub use observable::{Observable, Value};
pub use platform::{AddressBus, ClockTimer, ControlLines, DataBus, Platform};
pub use ring::CaptureRing;
pub use transaction::{BusOp, Transaction};
