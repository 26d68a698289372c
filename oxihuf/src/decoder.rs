//! Chunked Huffman stream decoder.
//!
//! The decoder trusts nothing it reads: the declared tree size is range
//! checked before any buffer is sized from it, and the tree itself is
//! bounds checked while it is rebuilt.

use crate::config::HufConfig;
use crate::summary::{ChunkInfo, StreamSummary};
use crate::tree::{HUF_BTREE_LEN, NodeId, Tree};
use oxihuf_core::bitstream::BitReader;
use oxihuf_core::bufio::BufferedStream;
use oxihuf_core::error::{HufError, Result};
use std::io::{Read, Write};
use tracing::{debug, warn};

/// Bytes in a chunk header: the `u64` length and the `i16` tree element count.
pub const CHUNK_HEADER_LEN: usize = 10;

/// Decoder state machine phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecoderPhase {
    /// Ready to start the next chunk.
    AwaitingHeader,
    /// Reading the chunk length and tree element count.
    ReadingHeader,
    /// Range checking the tree element count.
    ValidatingTreeSize,
    /// Reading and rebuilding the tree.
    DeserializingTree,
    /// Walking the tree to emit plaintext.
    UnpackingChunk,
    /// Dropping the chunk's tree.
    ResettingTree,
    /// Whole stream decoded.
    Done,
    /// A step failed; the output is incomplete.
    Failed,
}

/// Chunk header as read from the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkHeader {
    /// Plaintext bytes the chunk decodes to.
    pub plaintext_length: u64,
    /// Declared number of serialized tree elements, not yet validated.
    pub tree_elements: i16,
}

/// Per-chunk decoding state, reused from chunk to chunk.
#[derive(Debug)]
pub struct ChunkDecoder {
    tree: Tree,
    bits: BitReader,
    tree_buf: Vec<i16>,
    tree_bytes: Vec<u8>,
}

impl ChunkDecoder {
    /// Create a chunk decoder.
    pub fn new() -> Self {
        Self {
            tree: Tree::new(),
            bits: BitReader::new(),
            tree_buf: Vec::with_capacity(HUF_BTREE_LEN),
            tree_bytes: Vec::with_capacity(HUF_BTREE_LEN * 2),
        }
    }

    /// Tree of the chunk being decoded.
    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    /// Read a chunk header.
    pub fn read_header<R: Read>(&mut self, input: &mut BufferedStream<R>) -> Result<ChunkHeader> {
        let plaintext_length = input.read_u64_le()?;
        let tree_elements = input.read_i16_le()?;
        Ok(ChunkHeader {
            plaintext_length,
            tree_elements,
        })
    }

    /// Check a declared tree element count against `1..=HUF_BTREE_LEN`.
    pub fn validate_tree_size(tree_elements: i16) -> Result<usize> {
        match usize::try_from(tree_elements) {
            Ok(count) if (1..=HUF_BTREE_LEN).contains(&count) => Ok(count),
            _ => Err(HufError::btree_overflow(
                i64::from(tree_elements),
                HUF_BTREE_LEN,
            )),
        }
    }

    /// Read `count` serialized tree elements and rebuild the tree from them.
    pub fn read_tree<R: Read>(&mut self, count: usize, input: &mut BufferedStream<R>) -> Result<()> {
        self.tree_bytes.resize(count * 2, 0);
        input.read(&mut self.tree_bytes)?;

        self.tree_buf.clear();
        self.tree_buf.extend(
            self.tree_bytes
                .chunks_exact(2)
                .map(|pair| i16::from_le_bytes([pair[0], pair[1]])),
        );
        self.tree.deserialize(&self.tree_buf)
    }

    /// Decode `plaintext_length` symbols, then drop the chunk's padding bits.
    pub fn unpack<R: Read, W: Write>(
        &mut self,
        plaintext_length: u64,
        input: &mut BufferedStream<R>,
        output: &mut BufferedStream<W>,
    ) -> Result<()> {
        self.bits.reset();

        let Some(root) = self.tree.root() else {
            if plaintext_length == 0 {
                return Ok(());
            }
            return Err(HufError::btree_corrupted(0, self.tree_buf.len()));
        };

        if let Some(symbol) = self.tree.node(root).symbol() {
            // A lone leaf still spends one bit per symbol.
            for _ in 0..plaintext_length {
                self.bits.read_bit(input)?;
                output.write_u8(symbol)?;
            }
        } else {
            for _ in 0..plaintext_length {
                let symbol = self.walk(root, input)?;
                output.write_u8(symbol)?;
            }
        }

        self.bits.reset();
        Ok(())
    }

    /// Decode up to `remaining` symbols from the in-memory `payload`,
    /// starting at bit offset `bit`.
    ///
    /// Decoding stops at the last whole symbol the payload holds. Returns the
    /// symbols still to decode and the bit offset after the last one decoded,
    /// so a later call can resume once more payload has arrived.
    pub fn unpack_partial(
        &self,
        payload: &[u8],
        mut bit: usize,
        mut remaining: u64,
        output: &mut Vec<u8>,
    ) -> Result<(u64, usize)> {
        let available = (payload.len() * 8).saturating_sub(bit);
        let Some(root) = self.tree.root() else {
            if remaining == 0 {
                return Ok((0, bit));
            }
            return Err(HufError::btree_corrupted(0, self.tree_buf.len()));
        };

        if let Some(symbol) = self.tree.node(root).symbol() {
            let take = remaining.min(available as u64);
            output.resize(output.len() + take as usize, symbol);
            return Ok((remaining - take, bit + take as usize));
        }

        let end = bit + available;
        'symbols: while remaining > 0 {
            let mut cursor = bit;
            let mut position = root;
            let symbol = loop {
                if cursor == end {
                    break 'symbols;
                }
                let value = (payload[cursor / 8] >> (7 - cursor % 8)) & 1 == 1;
                cursor += 1;
                match self.step(position, value)? {
                    (_, Some(symbol)) => break symbol,
                    (next, None) => position = next,
                }
            };
            output.push(symbol);
            bit = cursor;
            remaining -= 1;
        }
        Ok((remaining, bit))
    }

    #[inline]
    fn walk<R: Read>(&mut self, root: NodeId, input: &mut BufferedStream<R>) -> Result<u8> {
        let mut position = root;
        loop {
            let bit = self.bits.read_bit(input)?;
            match self.step(position, bit)? {
                (_, Some(symbol)) => return Ok(symbol),
                (next, None) => position = next,
            }
        }
    }

    /// Follow one bit down from `position`, yielding the symbol at a leaf.
    #[inline]
    fn step(&self, position: NodeId, bit: bool) -> Result<(NodeId, Option<u8>)> {
        let next = self
            .tree
            .child(position, bit)
            .ok_or_else(|| HufError::fatal("internal node is missing a child"))?;

        let node = self.tree.node(next);
        if !node.is_leaf() {
            return Ok((next, None));
        }
        node.symbol()
            .map(|symbol| (next, Some(symbol)))
            .ok_or_else(|| HufError::fatal("leaf index outside the byte range"))
    }

    /// Drop all per-chunk state.
    pub fn reset(&mut self) {
        self.tree.reset();
        self.bits.reset();
        self.tree_buf.clear();
        self.tree_bytes.clear();
    }

    /// Decode one complete chunk and reset.
    pub fn decode_chunk<R: Read, W: Write>(
        &mut self,
        input: &mut BufferedStream<R>,
        output: &mut BufferedStream<W>,
    ) -> Result<ChunkInfo> {
        let mut phase = DecoderPhase::AwaitingHeader;
        self.decode_chunk_tracked(input, output, &mut phase)
    }

    /// Decode one chunk, recording each step in `phase`, and reset.
    fn decode_chunk_tracked<R: Read, W: Write>(
        &mut self,
        input: &mut BufferedStream<R>,
        output: &mut BufferedStream<W>,
        phase: &mut DecoderPhase,
    ) -> Result<ChunkInfo> {
        let result = self.decode_chunk_inner(input, output, phase);
        if result.is_ok() {
            *phase = DecoderPhase::ResettingTree;
        }
        self.reset();
        result
    }

    fn decode_chunk_inner<R: Read, W: Write>(
        &mut self,
        input: &mut BufferedStream<R>,
        output: &mut BufferedStream<W>,
        phase: &mut DecoderPhase,
    ) -> Result<ChunkInfo> {
        *phase = DecoderPhase::ReadingHeader;
        let header = self.read_header(input)?;

        *phase = DecoderPhase::ValidatingTreeSize;
        let tree_elements = Self::validate_tree_size(header.tree_elements)?;

        *phase = DecoderPhase::DeserializingTree;
        self.read_tree(tree_elements, input)?;

        *phase = DecoderPhase::UnpackingChunk;
        let payload_start = input.processed();
        self.unpack(header.plaintext_length, input, output)?;

        Ok(ChunkInfo {
            plaintext_length: header.plaintext_length,
            tree_elements,
            packed_bytes: input.processed() - payload_start,
        })
    }
}

impl Default for ChunkDecoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Whole-stream Huffman decoder.
#[derive(Debug)]
pub struct HufDecoder {
    config: HufConfig,
    chunk: ChunkDecoder,
    phase: DecoderPhase,
}

impl HufDecoder {
    /// Create a decoder for the given configuration.
    ///
    /// `config.length` is the number of compressed bytes to consume.
    pub fn new(config: HufConfig) -> Self {
        Self {
            config,
            chunk: ChunkDecoder::new(),
            phase: DecoderPhase::AwaitingHeader,
        }
    }

    /// Configuration in use.
    pub fn config(&self) -> &HufConfig {
        &self.config
    }

    /// Current state machine phase.
    pub fn phase(&self) -> DecoderPhase {
        self.phase
    }

    /// Decode `config.length` compressed bytes from `reader` into `writer`.
    pub fn decode<R: Read, W: Write>(&mut self, reader: R, writer: W) -> Result<StreamSummary> {
        self.decode_observed(reader, writer, |_| {})
    }

    /// Decode like [`decode`](Self::decode), calling `observer` after each chunk.
    pub fn decode_observed<R, W, F>(
        &mut self,
        reader: R,
        writer: W,
        mut observer: F,
    ) -> Result<StreamSummary>
    where
        R: Read,
        W: Write,
        F: FnMut(&ChunkInfo),
    {
        self.phase = DecoderPhase::AwaitingHeader;
        let result = self.run(reader, writer, &mut observer);
        self.chunk.reset();

        match &result {
            Ok(summary) => {
                self.phase = DecoderPhase::Done;
                debug!(
                    chunks = summary.chunks,
                    bytes_read = summary.bytes_read,
                    bytes_written = summary.bytes_written,
                    "huffman decode complete"
                );
            }
            Err(e) => {
                warn!(error = %e, phase = ?self.phase, "huffman decode failed");
                self.phase = DecoderPhase::Failed;
            }
        }
        result
    }

    fn run<R, W, F>(&mut self, reader: R, writer: W, observer: &mut F) -> Result<StreamSummary>
    where
        R: Read,
        W: Write,
        F: FnMut(&ChunkInfo),
    {
        let length = self.config.length;
        let mut summary = StreamSummary::default();
        if length == 0 {
            return Ok(summary);
        }

        let mut input = BufferedStream::with_capacity(reader, self.config.reader_capacity())?;
        let mut output = BufferedStream::with_capacity(writer, self.config.writer_capacity())?;

        while input.processed() < length {
            self.phase = DecoderPhase::AwaitingHeader;
            let chunk_start = input.processed();

            let info = self
                .chunk
                .decode_chunk_tracked(&mut input, &mut output, &mut self.phase)?;
            debug!(
                chunk = summary.chunks,
                offset = chunk_start,
                plaintext_length = info.plaintext_length,
                tree_elements = info.tree_elements,
                packed_bytes = info.packed_bytes,
                "decoded chunk"
            );
            observer(&info);
            summary.chunks += 1;
        }

        if input.processed() > length {
            return Err(HufError::invalid_argument(format!(
                "last chunk ends at byte {} beyond the declared {length} bytes",
                input.processed()
            )));
        }

        summary.bytes_read = input.processed();
        summary.bytes_written = output.processed();
        output.into_inner()?;
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::HufEncoder;

    fn encoded(data: &[u8], chunk_size: u64) -> Vec<u8> {
        let config = HufConfig::new(data.len() as u64).with_chunk_size(chunk_size);
        let mut out = Vec::new();
        HufEncoder::new(config).encode(data, &mut out).unwrap();
        out
    }

    fn header(plaintext_length: u64, tree_elements: i16) -> Vec<u8> {
        let mut bytes = plaintext_length.to_le_bytes().to_vec();
        bytes.extend_from_slice(&tree_elements.to_le_bytes());
        bytes
    }

    #[test]
    fn test_validate_tree_size() {
        assert_eq!(ChunkDecoder::validate_tree_size(1).unwrap(), 1);
        assert_eq!(ChunkDecoder::validate_tree_size(1024).unwrap(), 1024);
        for bad in [0i16, -1, 1025, i16::MAX] {
            assert!(matches!(
                ChunkDecoder::validate_tree_size(bad),
                Err(HufError::BtreeOverflow { .. })
            ));
        }
    }

    #[test]
    fn test_roundtrip_phase_done() {
        let data = b"abracadabra, abracadabra";
        let stream = encoded(data, 5);

        let mut decoder = HufDecoder::new(HufConfig::new(stream.len() as u64));
        let mut out = Vec::new();
        let summary = decoder.decode(&stream[..], &mut out).unwrap();

        assert_eq!(out, data);
        assert_eq!(summary.chunks, 5);
        assert_eq!(summary.bytes_read, stream.len() as u64);
        assert_eq!(decoder.phase(), DecoderPhase::Done);
    }

    #[test]
    fn test_overflow_fails_at_validation() {
        let stream = header(4, 1025);
        let mut decoder = HufDecoder::new(HufConfig::new(stream.len() as u64));
        let mut out = Vec::new();
        let err = decoder.decode(&stream[..], &mut out).unwrap_err();

        assert!(matches!(err, HufError::BtreeOverflow { length: 1025, .. }));
        assert_eq!(decoder.phase(), DecoderPhase::Failed);
        assert!(out.is_empty());
    }

    #[test]
    fn test_empty_tree_with_symbols_is_corrupted() {
        let mut stream = header(3, 1);
        stream.extend_from_slice(&(-1i16).to_le_bytes());
        stream.push(0);

        let mut decoder = HufDecoder::new(HufConfig::new(stream.len() as u64));
        let mut out = Vec::new();
        assert!(matches!(
            decoder.decode(&stream[..], &mut out),
            Err(HufError::BtreeCorrupted { .. })
        ));
    }

    #[test]
    fn test_length_past_stream_end() {
        let stream = encoded(b"hello", 0);
        let declared = stream.len() as u64 + 4;

        let mut decoder = HufDecoder::new(HufConfig::new(declared));
        let mut out = Vec::new();
        let err = decoder.decode(&stream[..], &mut out).unwrap_err();
        assert!(err.is_unexpected_eof());
    }

    #[test]
    fn test_length_inside_chunk_rejected() {
        let stream = encoded(b"hello world", 0);
        let mut decoder = HufDecoder::new(HufConfig::new(stream.len() as u64 - 1));
        let mut out = Vec::new();
        assert!(matches!(
            decoder.decode(&stream[..], &mut out),
            Err(HufError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_chunk_decoder_reports_payload() {
        let stream = encoded(b"aaaaaaab", 0);
        let mut input = BufferedStream::with_capacity(&stream[..], 16).unwrap();
        let mut sink = Vec::new();
        let mut output = BufferedStream::with_capacity(&mut sink, 16).unwrap();

        let mut chunk = ChunkDecoder::new();
        let info = chunk.decode_chunk(&mut input, &mut output).unwrap();
        output.flush().unwrap();
        drop(output);

        assert_eq!(info.plaintext_length, 8);
        assert_eq!(info.tree_elements, 7);
        assert_eq!(info.packed_bytes, 1);
        assert_eq!(info.compressed_length(), stream.len() as u64);
        assert!(chunk.tree().is_empty());
        assert_eq!(sink, b"aaaaaaab");
    }

    #[test]
    fn test_chunk_phase_tracks_failing_step() {
        let mut chunk = ChunkDecoder::new();
        let mut sink = Vec::new();
        let mut output = BufferedStream::with_capacity(&mut sink, 16).unwrap();

        let stream = header(4, 1025);
        let mut input = BufferedStream::with_capacity(&stream[..], 16).unwrap();
        let mut phase = DecoderPhase::AwaitingHeader;
        assert!(
            chunk
                .decode_chunk_tracked(&mut input, &mut output, &mut phase)
                .is_err()
        );
        assert_eq!(phase, DecoderPhase::ValidatingTreeSize);

        let stream = encoded(b"ok", 0);
        let mut input = BufferedStream::with_capacity(&stream[..], 16).unwrap();
        let mut phase = DecoderPhase::AwaitingHeader;
        chunk
            .decode_chunk_tracked(&mut input, &mut output, &mut phase)
            .unwrap();
        assert_eq!(phase, DecoderPhase::ResettingTree);
        assert!(chunk.tree().is_empty());
    }

    #[test]
    fn test_unpack_partial_resumes_mid_symbol() {
        let data = b"resume decoding wherever the payload runs out";
        let stream = encoded(data, 0);
        let count = ChunkDecoder::validate_tree_size(i16::from_le_bytes([stream[8], stream[9]]))
            .unwrap();
        let payload_start = CHUNK_HEADER_LEN + 2 * count;

        let mut chunk = ChunkDecoder::new();
        let mut input = BufferedStream::with_capacity(&stream[CHUNK_HEADER_LEN..], 16).unwrap();
        chunk.read_tree(count, &mut input).unwrap();

        let payload = &stream[payload_start..];
        let mut out = Vec::new();
        let mut remaining = data.len() as u64;
        let mut bit = 0;
        for end in 1..=payload.len() {
            (remaining, bit) = chunk
                .unpack_partial(&payload[..end], bit, remaining, &mut out)
                .unwrap();
            assert!(bit <= end * 8);
            assert!(data.starts_with(&out));
        }

        assert_eq!(remaining, 0);
        assert_eq!(bit.div_ceil(8), payload.len());
        assert_eq!(out, data);
    }
}
