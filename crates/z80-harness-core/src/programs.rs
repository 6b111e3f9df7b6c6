//! The built-in validation programs offered by the CLI/sim menu.
//!
//! These are plain Z80 machine code, chosen to exercise one bus behaviour
//! each rather than to do anything useful once running.

/// `3E 00 76` — `LD A,0` then `HALT`. The minimal single-byte-read scenario:
/// one opcode fetch, one halt, and nothing else on the bus.
pub const HALT_ONLY: &[u8] = &[0x3E, 0x00, 0x76];

/// `3E AA 32 00 80 76` — load the accumulator with `0xAA` and store it to
/// `0x8000`, then halt. Exercises a single captured write.
pub const SINGLE_WRITE: &[u8] = &[0x3E, 0xAA, 0x32, 0x00, 0x80, 0x76];

/// Writes `0xAA` to four consecutive addresses before halting. Exercises
/// the ring filling past `LOW_WATER` without reaching `HIGH_WATER`.
pub const MULTI_WRITE: &[u8] = &[
    0x3E, 0xAA, // LD A,0xAA
    0x32, 0x00, 0x80, // LD (0x8000),A
    0x32, 0x01, 0x80, // LD (0x8001),A
    0x32, 0x02, 0x80, // LD (0x8002),A
    0x32, 0x03, 0x80, // LD (0x8003),A
    0x76, // HALT
];

/// An unbounded loop alternating `0xAA`/`0x55` writes to `0x8000`. Used to
/// drive the ring past `HIGH_WATER` under sustained load and exercise
/// backpressure; the caller is responsible for halting the clock since this
/// program never executes `HALT` on its own.
pub const ALTERNATING_PATTERN: &[u8] = &[
    0x3E, 0xAA, // LD A,0xAA
    0x32, 0x00, 0x80, // LD (0x8000),A
    0x3E, 0x55, // LD A,0x55
    0x32, 0x00, 0x80, // LD (0x8000),A
    0xC3, 0x00, 0x00, // JP 0x0000
];
