//! Incremental compression and decompression.
//!
//! [`HufCompressor`] and [`HufDecompressor`] accept input in arbitrary
//! pieces and hand back whatever output is complete so far. Their output is
//! byte-identical to the whole-stream functions for the same chunk size.
//!
//! # Example
//!
//! ```
//! use oxihuf::{HufCompressor, HufDecompressor};
//!
//! let mut compressor = HufCompressor::new(16);
//! let mut compressed = compressor.compress(b"hello, ").unwrap();
//! compressed.extend(compressor.compress(b"incremental world").unwrap());
//! compressed.extend(compressor.finish().unwrap());
//!
//! let mut decompressor = HufDecompressor::new();
//! let mut restored = Vec::new();
//! for piece in compressed.chunks(5) {
//!     restored.extend(decompressor.decompress(piece).unwrap());
//! }
//! decompressor.finish().unwrap();
//! assert_eq!(restored, b"hello, incremental world");
//! ```

use crate::decoder::{CHUNK_HEADER_LEN, ChunkDecoder};
use crate::encoder::ChunkEncoder;
use oxihuf_core::bufio::{BufferedStream, DEFAULT_BUFFER_SIZE};
use oxihuf_core::error::{HufError, Result};
use tracing::trace;

/// Push-style compressor.
///
/// Input is held back until a full chunk is available; [`finish`](Self::finish)
/// encodes whatever remains as the last chunk.
#[derive(Debug)]
pub struct HufCompressor {
    chunk_size: usize,
    pending: Vec<u8>,
    encoder: ChunkEncoder,
    finished: bool,
}

impl HufCompressor {
    /// Create a compressor emitting chunks of `chunk_size` plaintext bytes.
    ///
    /// A chunk size of 0 buffers everything into a single chunk.
    pub fn new(chunk_size: usize) -> Self {
        Self {
            chunk_size,
            pending: Vec::new(),
            encoder: ChunkEncoder::new(),
            finished: false,
        }
    }

    /// Plaintext bytes waiting for a full chunk.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Feed `data`; returns the encoding of every chunk it completed.
    pub fn compress(&mut self, data: &[u8]) -> Result<Vec<u8>> {
        self.check_open()?;
        self.pending.extend_from_slice(data);

        let mut out = Vec::new();
        if self.chunk_size == 0 || self.pending.len() < self.chunk_size {
            return Ok(out);
        }

        let complete = self.pending.len() - self.pending.len() % self.chunk_size;
        {
            let mut writer = BufferedStream::with_capacity(&mut out, DEFAULT_BUFFER_SIZE)?;
            for chunk in self.pending[..complete].chunks(self.chunk_size) {
                self.encoder.encode_chunk(chunk, &mut writer)?;
            }
            writer.flush()?;
        }
        self.pending.drain(..complete);

        trace!(
            emitted = out.len(),
            pending = self.pending.len(),
            "compressor emitted chunks"
        );
        Ok(out)
    }

    /// Encode the remaining input as the final chunk.
    pub fn finish(&mut self) -> Result<Vec<u8>> {
        self.check_open()?;
        self.finished = true;

        let mut out = Vec::new();
        if !self.pending.is_empty() {
            let mut writer = BufferedStream::with_capacity(&mut out, DEFAULT_BUFFER_SIZE)?;
            self.encoder.encode_chunk(&self.pending, &mut writer)?;
            writer.flush()?;
        }
        self.pending.clear();
        Ok(out)
    }

    fn check_open(&self) -> Result<()> {
        if self.finished {
            return Err(HufError::invalid_argument("compressor already finished"));
        }
        Ok(())
    }
}

/// Where a [`HufDecompressor`] is within the current chunk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum Position {
    /// Waiting for a chunk header and its whole tree.
    #[default]
    Header,
    /// Decoding the payload: `remaining` symbols are due and `bit` is the
    /// offset into the pending bytes of the next unread bit.
    Payload { remaining: u64, bit: usize },
}

/// Push-style decompressor.
///
/// A chunk's header and tree are buffered until they are complete. After
/// that, plaintext is returned as soon as each symbol's bits arrive, and
/// decoding resumes where it stopped when more input is fed.
#[derive(Debug, Default)]
pub struct HufDecompressor {
    pending: Vec<u8>,
    decoder: ChunkDecoder,
    position: Position,
    chunks: u64,
}

impl HufDecompressor {
    /// Create a decompressor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Compressed bytes received but not yet fully decoded.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Number of chunks decoded so far.
    pub fn chunks(&self) -> u64 {
        self.chunks
    }

    /// Feed `data`; returns all plaintext it completed.
    pub fn decompress(&mut self, data: &[u8]) -> Result<Vec<u8>> {
        self.pending.extend_from_slice(data);

        let mut out = Vec::new();
        if let Err(e) = self.advance(&mut out) {
            self.decoder.reset();
            self.position = Position::Header;
            return Err(e);
        }
        Ok(out)
    }

    /// Check that the input ended on a chunk boundary.
    pub fn finish(&mut self) -> Result<()> {
        if self.pending.is_empty() && self.position == Position::Header {
            return Ok(());
        }
        Err(HufError::truncated_chunk(self.pending.len()))
    }

    fn advance(&mut self, out: &mut Vec<u8>) -> Result<()> {
        // Start of the next chunk header within `pending`.
        let mut chunk_start = 0;
        loop {
            match self.position {
                Position::Header => match self.start_chunk(chunk_start)? {
                    Some((remaining, payload_start)) => {
                        self.position = Position::Payload {
                            remaining,
                            bit: payload_start * 8,
                        };
                    }
                    None => break,
                },
                Position::Payload { remaining, bit } => {
                    let (remaining, bit) = self
                        .decoder
                        .unpack_partial(&self.pending, bit, remaining, out)?;
                    if remaining > 0 {
                        self.position = Position::Payload { remaining, bit };
                        break;
                    }

                    chunk_start = bit.div_ceil(8);
                    self.decoder.reset();
                    self.position = Position::Header;
                    self.chunks += 1;
                    trace!(chunk = self.chunks, "decompressor finished chunk");
                }
            }
        }

        let consumed = match &mut self.position {
            Position::Header => chunk_start,
            Position::Payload { bit, .. } => {
                let whole = *bit / 8;
                *bit -= whole * 8;
                whole
            }
        };
        self.pending.drain(..consumed);
        Ok(())
    }

    /// Read the header and tree at `offset` once both are buffered.
    ///
    /// Returns the chunk's plaintext length and the offset of its payload.
    fn start_chunk(&mut self, offset: usize) -> Result<Option<(u64, usize)>> {
        let available = &self.pending[offset..];
        if available.len() < CHUNK_HEADER_LEN {
            return Ok(None);
        }

        let mut input = BufferedStream::with_capacity(available, CHUNK_HEADER_LEN)?;
        let header = self.decoder.read_header(&mut input)?;
        let tree_elements = ChunkDecoder::validate_tree_size(header.tree_elements)?;
        let tree_end = CHUNK_HEADER_LEN + 2 * tree_elements;
        if available.len() < tree_end {
            return Ok(None);
        }

        self.decoder.read_tree(tree_elements, &mut input)?;
        Ok(Some((header.plaintext_length, offset + tree_end)))
    }
}
