//! # OxiHuf Core
//!
//! Core components for the OxiHuf streaming Huffman codec.
//!
//! - [`bufio`]: Fixed-capacity buffered reader/writer with byte accounting
//! - [`bitstream`]: MSB-first single-bit accumulators for code packing
//! - [`error`]: Error types
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │ L3: Front ends                                          │
//! │     oxihuf CLI, in-memory and incremental helpers       │
//! ├─────────────────────────────────────────────────────────┤
//! │ L2: Codec (oxihuf)                                      │
//! │     Histogram, Huffman tree, symbol table, chunk codec  │
//! ├─────────────────────────────────────────────────────────┤
//! │ L1: Stream (this crate)                                 │
//! │     BufferedStream, BitWriter/BitReader, HufError       │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust
//! use oxihuf_core::{BitReader, BitWriter, BufferedStream};
//!
//! let mut packed = Vec::new();
//! {
//!     let mut out = BufferedStream::new(&mut packed).unwrap();
//!     let mut bits = BitWriter::new();
//!     bits.write_bits(&[true, false, true], &mut out).unwrap();
//!     bits.flush(&mut out).unwrap();
//!     out.flush().unwrap();
//! }
//! assert_eq!(packed, vec![0b1010_0000]);
//!
//! let mut input = BufferedStream::new(&packed[..]).unwrap();
//! let mut bits = BitReader::new();
//! assert!(bits.read_bit(&mut input).unwrap());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![forbid(unsafe_code)]

pub mod bitstream;
pub mod bufio;
pub mod error;

// Re-exports for convenience
pub use bitstream::{BitReader, BitWriter};
pub use bufio::{BufferedStream, DEFAULT_BUFFER_SIZE};
pub use error::{HufError, Result};
