use std::collections::TryReserveError;
use std::io;
use thiserror::Error;

/// Main error type for the bitstream writer.
///
/// Every variant except `Io` and `OutOfMemory` describes a broken internal
/// invariant: the inputs come from an already-validated encoder configuration,
/// so callers are expected to abort the encode rather than recover.
#[derive(Error, Debug)]
pub enum BitstreamError {
    /// An I/O error occurred while writing a finished picture
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// A bit buffer could not grow
    #[error("Out of memory: {0}")]
    OutOfMemory(#[from] TryReserveError),
    /// The configuration failed validation
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    /// The padding between coded and display size cannot be signalled
    #[error("Odd conformance window padding: {width_pad}x{height_pad}")]
    OddConformancePadding { width_pad: u32, height_pad: u32 },
    /// A terminal unit produced no bytes
    #[error("Substream of unit {unit} is empty")]
    EmptySubstream { unit: usize },
    /// A terminal unit's byte length was queried while it ended mid-byte
    #[error("Substream of unit {unit} is not byte aligned ({bits} bits)")]
    UnalignedSubstream { unit: usize, bits: usize },
    /// A unit that does not end its slice must end a partition or a CTU row
    #[error("Unit {unit} ends neither its slice, its partition nor a CTU row")]
    InvalidUnitBoundary { unit: usize },
    /// The picture has nothing to wrap in the alternate container
    #[error("Picture has no coded payload")]
    MissingPayload,
    /// A finished picture did not end on a byte boundary
    #[error("Picture bitstream is not byte aligned ({bits} bits)")]
    UnalignedPicture { bits: usize },
}

/// A specialized `Result` type for bitstream operations.
pub type Result<T> = std::result::Result<T, BitstreamError>;
