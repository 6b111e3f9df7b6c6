//! Compiled-in tuning constants.
//!
//! This domain has no user-facing configuration file: every knob here is a
//! constant chosen for a specific AVR target and Z80 part, the way the
//! teacher workspace keeps per-region timing as `const` items on small
//! config types rather than behind runtime configuration.

/// Lowest clock frequency the generator will accept, in Hz.
pub const FREQ_MIN: u32 = 100_000;
/// Highest clock frequency the generator will accept, in Hz.
pub const FREQ_MAX: u32 = 3_000_000;

/// Floor the backpressure throttle will not go below, in Hz.
pub const MIN_HZ: u32 = 100_000;

/// Capture ring capacity. Must be a power of two.
pub const RING_CAPACITY: usize = 16;

/// Ring occupancy at or above which WAIT is asserted.
pub const HIGH_WATER: usize = 12;

/// Ring occupancy at or below which WAIT is released.
pub const LOW_WATER: usize = 4;

/// How long WAIT must be continuously held (or the ring continuously at or
/// below `LOW_WATER`) before the backpressure manager acts, in microseconds.
pub const SUSTAINED_WAIT_US: u32 = 10_000;

/// Multiplicative throttle factor applied to `current_hz` on sustained backpressure.
pub const FACTOR: u32 = 2;

/// Largest program-cache capacity, in bytes.
pub const MAX_CACHE: usize = 1024;

/// Cache sizes `set_cache_size` accepts.
pub const CACHE_SIZES: [u16; 4] = [128, 256, 512, 1024];

/// Floor on generated NMI/INT pulse width, in microseconds.
pub const MIN_PULSE_US: u32 = 5;

/// Spin-count ceiling while waiting for an interrupt-acknowledge cycle
/// before `pulse_int` gives up and releases INT anyway.
pub const INT_ACK_SPIN_LIMIT: u32 = 10_000;
