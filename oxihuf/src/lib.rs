//! # OxiHuf: Pure Rust Streaming Huffman Compression
//!
//! This crate compresses a byte stream chunk by chunk, building an
//! independently optimal Huffman tree for every chunk and shipping that tree
//! in front of the chunk's payload.
//!
//! ## Features
//!
//! - **Pure Rust**: No C dependencies, 100% safe Rust
//! - **Bounded memory**: One chunk buffer plus fixed-size I/O buffers
//! - **Self-describing chunks**: Every chunk carries its own serialized tree
//! - **Hostile input checks**: Tree sizes and tree structure are validated
//!   before anything is decoded
//!
//! ## Stream Format
//!
//! A stream is a sequence of chunks with no outer framing:
//!
//! - **Chunk length** (`u64`, little-endian): plaintext bytes in the chunk
//! - **Tree element count** (`i16`, little-endian): between 1 and 1024
//! - **Tree**: that many `i16` values, preorder, `-1` marking an absent subtree
//! - **Payload**: the chunk's symbol codes packed MSB-first, zero-padded to a byte
//!
//! Because there is no outer header, the decoder is told how many compressed
//! bytes to consume, just as the encoder is told how many plaintext bytes.
//!
//! ## Example
//!
//! ```rust
//! use oxihuf::{compress, decompress};
//!
//! let original = b"TOBEORNOTTOBEORTOBEORNOT";
//!
//! // Compress
//! let compressed = compress(original).unwrap();
//!
//! // Decompress
//! let decompressed = decompress(&compressed).unwrap();
//!
//! assert_eq!(decompressed, original);
//! ```
//!
//! ## Streaming
//!
//! ```rust
//! use oxihuf::{HufConfig, decode, encode};
//!
//! let data = b"stream me through a reader and a writer".repeat(20);
//!
//! let mut compressed = Vec::new();
//! let config = HufConfig::new(data.len() as u64).with_chunk_size(128);
//! encode(&config, &data[..], &mut compressed).unwrap();
//!
//! let mut restored = Vec::new();
//! let config = HufConfig::new(compressed.len() as u64);
//! let summary = decode(&config, &compressed[..], &mut restored).unwrap();
//!
//! assert_eq!(restored, data);
//! assert_eq!(summary.chunks, 7);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![forbid(unsafe_code)]

pub mod config;
pub mod decoder;
pub mod encoder;
pub mod histogram;
pub mod streaming;
pub mod summary;
pub mod symbol;
pub mod tree;

pub use config::HufConfig;
pub use decoder::{ChunkDecoder, DecoderPhase, HufDecoder};
pub use encoder::{ChunkEncoder, EncoderPhase, HufEncoder};
pub use histogram::{ASCII_COUNT, HUF_HISTOGRAM_LEN, Histogram};
pub use oxihuf_core::{DEFAULT_BUFFER_SIZE, HufError, Result};
pub use streaming::{HufCompressor, HufDecompressor};
pub use summary::{ChunkInfo, StreamSummary};
pub use symbol::{SymbolCode, SymbolTable};
pub use tree::{HUF_BTREE_LEN, SENTINEL, Tree};

use std::io::{Read, Write};

/// Encode `config.length` plaintext bytes from `reader` into `writer`.
///
/// # Parameters
///
/// - `config`: Stream length, chunk size and buffer sizes
/// - `reader`: Plaintext source; must hold at least `config.length` bytes
/// - `writer`: Destination for the compressed stream
///
/// # Returns
///
/// Chunk and byte totals for the call.
pub fn encode<R: Read, W: Write>(
    config: &HufConfig,
    reader: R,
    writer: W,
) -> Result<StreamSummary> {
    HufEncoder::new(*config).encode(reader, writer)
}

/// Encode like [`encode`], calling `observer` once per completed chunk.
pub fn encode_observed<R, W, F>(
    config: &HufConfig,
    reader: R,
    writer: W,
    observer: F,
) -> Result<StreamSummary>
where
    R: Read,
    W: Write,
    F: FnMut(&ChunkInfo),
{
    HufEncoder::new(*config).encode_observed(reader, writer, observer)
}

/// Decode `config.length` compressed bytes from `reader` into `writer`.
///
/// # Parameters
///
/// - `config`: Compressed length and buffer sizes (the chunk size is not used)
/// - `reader`: Compressed source
/// - `writer`: Destination for the plaintext
///
/// # Returns
///
/// Chunk and byte totals for the call.
pub fn decode<R: Read, W: Write>(
    config: &HufConfig,
    reader: R,
    writer: W,
) -> Result<StreamSummary> {
    HufDecoder::new(*config).decode(reader, writer)
}

/// Decode like [`decode`], calling `observer` once per completed chunk.
pub fn decode_observed<R, W, F>(
    config: &HufConfig,
    reader: R,
    writer: W,
    observer: F,
) -> Result<StreamSummary>
where
    R: Read,
    W: Write,
    F: FnMut(&ChunkInfo),
{
    HufDecoder::new(*config).decode_observed(reader, writer, observer)
}

/// Compress `data` as a single chunk.
///
/// # Example
///
/// ```rust
/// use oxihuf::compress;
///
/// let compressed = compress(b"aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa").unwrap();
/// // 10 header bytes, a 3-element tree and 40 one-bit codes.
/// assert_eq!(compressed.len(), 8 + 2 + 6 + 5);
/// ```
pub fn compress(data: &[u8]) -> Result<Vec<u8>> {
    compress_with_chunk_size(data, 0)
}

/// Compress `data` in chunks of `chunk_size` bytes (0 = one chunk).
pub fn compress_with_chunk_size(data: &[u8], chunk_size: u64) -> Result<Vec<u8>> {
    let config = HufConfig::new(data.len() as u64).with_chunk_size(chunk_size);
    let mut out = Vec::new();
    encode(&config, data, &mut out)?;
    Ok(out)
}

/// Decompress a complete compressed stream.
pub fn decompress(data: &[u8]) -> Result<Vec<u8>> {
    let config = HufConfig::new(data.len() as u64);
    let mut out = Vec::new();
    decode(&config, data, &mut out)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip_simple() {
        let original = b"Hello, World!";
        let compressed = compress(original).unwrap();
        let decompressed = decompress(&compressed).unwrap();
        assert_eq!(decompressed, original);
    }

    #[test]
    fn test_empty_input() {
        let compressed = compress(b"").unwrap();
        assert!(compressed.is_empty());
        assert!(decompress(&compressed).unwrap().is_empty());
    }

    #[test]
    fn test_skewed_input_shrinks() {
        let mut data = vec![b'e'; 4000];
        data.extend_from_slice(b"rare bytes");
        let compressed = compress(&data).unwrap();
        assert!(compressed.len() < data.len() / 4);
        assert_eq!(decompress(&compressed).unwrap(), data);
    }

    #[test]
    fn test_observers_agree() {
        let data = b"observe every chunk as it goes by".repeat(10);
        let config = HufConfig::new(data.len() as u64).with_chunk_size(64);

        let mut compressed = Vec::new();
        let mut encoded = Vec::new();
        encode_observed(&config, &data[..], &mut compressed, |info| encoded.push(*info)).unwrap();

        let mut restored = Vec::new();
        let mut decoded = Vec::new();
        let config = HufConfig::new(compressed.len() as u64);
        decode_observed(&config, &compressed[..], &mut restored, |info| decoded.push(*info))
            .unwrap();

        assert_eq!(restored, data);
        assert_eq!(encoded, decoded);
        let total: u64 = encoded.iter().map(ChunkInfo::compressed_length).sum();
        assert_eq!(total, compressed.len() as u64);
    }
}
