//! Error types for OxiHuf operations.
//!
//! Every component reports the first failure it hits through [`HufError`] and
//! unwinds without attempting partial recovery. There is no retry logic in the
//! codec; retries belong to the caller at the I/O layer.

use std::io;
use thiserror::Error;

/// The main error type for OxiHuf operations.
#[derive(Debug, Error)]
pub enum HufError {
    /// A caller-sized buffer could not be allocated.
    #[error("Memory allocation failed: could not reserve {requested} bytes")]
    MemoryAllocation {
        /// Number of bytes (or elements) requested.
        requested: usize,
    },

    /// An argument passed to a component is out of range.
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Description of the invalid argument.
        message: String,
    },

    /// The underlying source or sink failed, or returned fewer bytes than requested.
    #[error("Read/write error: {0}")]
    ReadWrite(#[from] io::Error),

    /// An internal invariant does not hold.
    #[error("Fatal error: {message}")]
    Fatal {
        /// Description of the violated invariant.
        message: String,
    },

    /// Declared serialized tree length is zero, negative or above the maximum.
    #[error("Serialized tree length {length} is out of range 1..={max}")]
    BtreeOverflow {
        /// The declared tree element count.
        length: i64,
        /// Maximum allowed tree element count.
        max: usize,
    },

    /// Serialized tree does not parse within its declared length.
    #[error("Serialized tree is corrupted at element {position} of {length}")]
    BtreeCorrupted {
        /// Element position where parsing failed.
        position: usize,
        /// Declared tree element count.
        length: usize,
    },
}

/// Result type alias for OxiHuf operations.
pub type Result<T> = std::result::Result<T, HufError>;

impl HufError {
    /// Create an allocation failure error.
    pub fn memory_allocation(requested: usize) -> Self {
        Self::MemoryAllocation { requested }
    }

    /// Create an invalid argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Create a fatal error.
    pub fn fatal(message: impl Into<String>) -> Self {
        Self::Fatal {
            message: message.into(),
        }
    }

    /// Create a tree overflow error.
    pub fn btree_overflow(length: i64, max: usize) -> Self {
        Self::BtreeOverflow { length, max }
    }

    /// Create a tree corruption error.
    pub fn btree_corrupted(position: usize, length: usize) -> Self {
        Self::BtreeCorrupted { position, length }
    }

    /// Create a short read error: the source ran dry before `requested` bytes.
    pub fn short_read(requested: usize, available: usize) -> Self {
        Self::ReadWrite(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("short read: requested {requested} bytes, got {available}"),
        ))
    }

    /// Create an error for a stream that ended inside a chunk.
    pub fn truncated_chunk(pending: usize) -> Self {
        Self::ReadWrite(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("stream ended mid-chunk with {pending} bytes pending"),
        ))
    }

    /// Returns `true` if the error was caused by the source running out of data.
    pub fn is_unexpected_eof(&self) -> bool {
        matches!(self, Self::ReadWrite(e) if e.kind() == io::ErrorKind::UnexpectedEof)
    }
}

/// Allocate a zero-filled byte vector of exactly `len` bytes, reporting
/// allocation failure instead of aborting.
pub fn try_alloc_bytes(len: usize) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    bytes
        .try_reserve_exact(len)
        .map_err(|_| HufError::memory_allocation(len))?;
    bytes.resize(len, 0);
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = HufError::btree_overflow(0, 1024);
        assert!(err.to_string().contains("out of range"));

        let err = HufError::btree_corrupted(7, 3);
        assert!(err.to_string().contains("corrupted"));

        let err = HufError::invalid_argument("iota must be non-zero");
        assert!(err.to_string().contains("iota"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::BrokenPipe, "pipe closed");
        let err: HufError = io_err.into();
        assert!(matches!(err, HufError::ReadWrite(_)));
        assert!(!err.is_unexpected_eof());
    }

    #[test]
    fn test_short_read_is_eof() {
        let err = HufError::short_read(8, 3);
        assert!(err.is_unexpected_eof());
        assert!(err.to_string().contains("requested 8"));
    }

    #[test]
    fn test_truncated_chunk_is_eof() {
        let err = HufError::truncated_chunk(5);
        assert!(err.is_unexpected_eof());
        assert!(err.to_string().contains("mid-chunk with 5 bytes pending"));
    }

    #[test]
    fn test_try_alloc_bytes() {
        let bytes = try_alloc_bytes(16).unwrap();
        assert_eq!(bytes.len(), 16);
        assert!(bytes.iter().all(|&b| b == 0));

        assert!(matches!(
            try_alloc_bytes(usize::MAX),
            Err(HufError::MemoryAllocation { .. })
        ));
    }
}
