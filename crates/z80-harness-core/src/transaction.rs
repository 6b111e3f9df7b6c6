//! A single captured bus transaction.

/// The direction of a captured bus transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusOp {
    /// A read (instruction fetch or data read) served by the ISR.
    Read,
    /// A write sampled by the ISR.
    Write,
}

/// One completed Z80 bus cycle, as recorded by the capture pipeline.
///
/// Immutable once pushed into the ring; `timestamp` is reserved and is only
/// populated outside the hot path (the ISR never reads a clock).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transaction {
    pub address: u16,
    pub data: u8,
    pub op: BusOp,
    pub timestamp: u32,
}

impl Transaction {
    #[must_use]
    pub const fn new(address: u16, data: u8, op: BusOp) -> Self {
        Self { address, data, op, timestamp: 0 }
    }
}
