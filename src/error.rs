use thiserror::Error;

/// faults detected on the link
///
/// none of them is fatal: the link absorbs them with counters and flow control, they are only surfaced by the
/// lower level building blocks
#[derive(Error, Debug, Copy, Clone, PartialEq)]
pub enum Error {
    #[error("ring buffer is full")]
    Overflow,
    #[error("ring buffer is empty")]
    Underflow,
    #[error("frame checksum mismatch, computed {expected:#06x} received {received:#06x}")]
    CrcMismatch { expected: u16, received: u16 },
    #[error("expected start marker, got {0:#04x}")]
    BadStart(u8),
}

pub type Result<T> = core::result::Result<T, Error>;
