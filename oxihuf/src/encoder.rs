//! Chunked Huffman stream encoder.
//!
//! Each chunk is written as
//!
//! ```text
//! +----------------+-----------------+------------------+-------------+
//! | length: u64 LE | elements: i16 LE| tree: i16 LE × n | packed bits |
//! +----------------+-----------------+------------------+-------------+
//! ```
//!
//! and carries its own tree, so chunks never depend on each other.

use crate::config::HufConfig;
use crate::histogram::Histogram;
use crate::summary::{ChunkInfo, StreamSummary};
use crate::symbol::SymbolTable;
use crate::tree::{HUF_BTREE_LEN, Tree};
use oxihuf_core::bitstream::BitWriter;
use oxihuf_core::bufio::BufferedStream;
use oxihuf_core::error::{HufError, Result, try_alloc_bytes};
use std::io::{Read, Write};
use tracing::{debug, warn};

/// Encoder state machine phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncoderPhase {
    /// Ready to start the next chunk.
    AwaitingChunk,
    /// Reading chunk plaintext from the source.
    ReadingChunk,
    /// Counting symbols and building the tree and code table.
    BuildingTree,
    /// Writing the chunk length and serialized tree.
    WritingHeader,
    /// Writing the bit-packed payload.
    PackingBits,
    /// Whole stream encoded.
    Done,
    /// A step failed; the output is incomplete.
    Failed,
}

/// Per-chunk encoding state, reused from chunk to chunk.
#[derive(Debug)]
pub struct ChunkEncoder {
    histogram: Histogram,
    tree: Tree,
    table: SymbolTable,
    bits: BitWriter,
    tree_buf: Vec<i16>,
}

impl ChunkEncoder {
    /// Create a chunk encoder.
    pub fn new() -> Self {
        Self {
            histogram: Histogram::bytes(),
            tree: Tree::new(),
            table: SymbolTable::new(),
            bits: BitWriter::new(),
            tree_buf: Vec::with_capacity(HUF_BTREE_LEN),
        }
    }

    /// Tree of the chunk being encoded.
    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    /// Code table of the chunk being encoded.
    pub fn table(&self) -> &SymbolTable {
        &self.table
    }

    /// Count `chunk`, build its tree and code table, and serialize the tree.
    ///
    /// Returns the number of serialized tree elements.
    pub fn analyze(&mut self, chunk: &[u8]) -> Result<usize> {
        self.histogram.populate(chunk)?;
        self.tree.build(&self.histogram)?;
        self.table.build(&self.tree);

        self.tree_buf.clear();
        let elements = self.tree.serialize(&mut self.tree_buf);
        if elements > HUF_BTREE_LEN {
            return Err(HufError::fatal(format!(
                "serialized tree has {elements} elements, limit is {HUF_BTREE_LEN}"
            )));
        }
        Ok(elements)
    }

    /// Write the chunk length and the serialized tree from the last [`analyze`](Self::analyze).
    pub fn write_header<W: Write>(
        &mut self,
        plaintext_length: u64,
        out: &mut BufferedStream<W>,
    ) -> Result<()> {
        let elements = i16::try_from(self.tree_buf.len())
            .map_err(|_| HufError::fatal("tree element count does not fit 16 bits"))?;

        out.write_u64_le(plaintext_length)?;
        out.write_i16_le(elements)?;
        for &value in &self.tree_buf {
            out.write_i16_le(value)?;
        }
        Ok(())
    }

    /// Write the code of every byte of `chunk`, then pad to a byte boundary.
    pub fn pack<W: Write>(&mut self, chunk: &[u8], out: &mut BufferedStream<W>) -> Result<()> {
        self.bits.reset();
        for &byte in chunk {
            let code = self
                .table
                .get(byte)
                .ok_or_else(|| HufError::fatal(format!("symbol {byte} has no code")))?;
            self.bits.write_bits(code.bits(), out)?;
        }
        self.bits.flush(out)
    }

    /// Drop all per-chunk state.
    pub fn reset(&mut self) {
        self.histogram.reset();
        self.tree.reset();
        self.table.reset();
        self.bits.reset();
        self.tree_buf.clear();
    }

    /// Encode one complete chunk and reset.
    pub fn encode_chunk<W: Write>(
        &mut self,
        chunk: &[u8],
        out: &mut BufferedStream<W>,
    ) -> Result<ChunkInfo> {
        let mut phase = EncoderPhase::AwaitingChunk;
        self.encode_chunk_tracked(chunk, out, &mut phase)
    }

    /// Encode one chunk, recording each step in `phase`, and reset.
    fn encode_chunk_tracked<W: Write>(
        &mut self,
        chunk: &[u8],
        out: &mut BufferedStream<W>,
        phase: &mut EncoderPhase,
    ) -> Result<ChunkInfo> {
        let result = self.encode_chunk_inner(chunk, out, phase);
        self.reset();
        result
    }

    fn encode_chunk_inner<W: Write>(
        &mut self,
        chunk: &[u8],
        out: &mut BufferedStream<W>,
        phase: &mut EncoderPhase,
    ) -> Result<ChunkInfo> {
        *phase = EncoderPhase::BuildingTree;
        let tree_elements = self.analyze(chunk)?;

        *phase = EncoderPhase::WritingHeader;
        self.write_header(chunk.len() as u64, out)?;

        *phase = EncoderPhase::PackingBits;
        let payload_start = out.processed();
        self.pack(chunk, out)?;

        Ok(ChunkInfo {
            plaintext_length: chunk.len() as u64,
            tree_elements,
            packed_bytes: out.processed() - payload_start,
        })
    }
}

impl Default for ChunkEncoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Whole-stream Huffman encoder.
#[derive(Debug)]
pub struct HufEncoder {
    config: HufConfig,
    chunk: ChunkEncoder,
    phase: EncoderPhase,
}

impl HufEncoder {
    /// Create an encoder for the given configuration.
    pub fn new(config: HufConfig) -> Self {
        Self {
            config,
            chunk: ChunkEncoder::new(),
            phase: EncoderPhase::AwaitingChunk,
        }
    }

    /// Configuration in use.
    pub fn config(&self) -> &HufConfig {
        &self.config
    }

    /// Current state machine phase.
    pub fn phase(&self) -> EncoderPhase {
        self.phase
    }

    /// Encode `config.length` bytes from `reader` into `writer`.
    pub fn encode<R: Read, W: Write>(&mut self, reader: R, writer: W) -> Result<StreamSummary> {
        self.encode_observed(reader, writer, |_| {})
    }

    /// Encode like [`encode`](Self::encode), calling `observer` after each chunk.
    pub fn encode_observed<R, W, F>(
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
        self.phase = EncoderPhase::AwaitingChunk;
        let result = self.run(reader, writer, &mut observer);
        self.chunk.reset();

        match &result {
            Ok(summary) => {
                self.phase = EncoderPhase::Done;
                debug!(
                    chunks = summary.chunks,
                    bytes_read = summary.bytes_read,
                    bytes_written = summary.bytes_written,
                    "huffman encode complete"
                );
            }
            Err(e) => {
                warn!(error = %e, phase = ?self.phase, "huffman encode failed");
                self.phase = EncoderPhase::Failed;
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

        let chunk_size = self.config.effective_chunk_size().min(length);
        let chunk_size = usize::try_from(chunk_size).map_err(|_| {
            HufError::invalid_argument(format!("chunk size {chunk_size} exceeds address space"))
        })?;
        let mut buffer = try_alloc_bytes(chunk_size)?;

        let mut input = BufferedStream::with_capacity(reader, self.config.reader_capacity())?;
        let mut output = BufferedStream::with_capacity(writer, self.config.writer_capacity())?;

        while input.processed() < length {
            self.phase = EncoderPhase::AwaitingChunk;
            let take = (length - input.processed()).min(chunk_size as u64) as usize;
            let plaintext = &mut buffer[..take];

            self.phase = EncoderPhase::ReadingChunk;
            input.read(plaintext)?;

            let info = self
                .chunk
                .encode_chunk_tracked(plaintext, &mut output, &mut self.phase)?;
            debug!(
                chunk = summary.chunks,
                plaintext_length = info.plaintext_length,
                tree_elements = info.tree_elements,
                packed_bytes = info.packed_bytes,
                "encoded chunk"
            );
            observer(&info);
            summary.chunks += 1;
        }

        summary.bytes_read = input.processed();
        summary.bytes_written = output.processed();
        output.into_inner()?;
        Ok(summary)
    }
}
