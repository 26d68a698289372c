//! Per-chunk and per-stream statistics.

/// Statistics for one chunk, reported as it completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChunkInfo {
    /// Plaintext bytes in the chunk.
    pub plaintext_length: u64,
    /// Number of 16-bit values in the serialized tree.
    pub tree_elements: usize,
    /// Bytes of bit-packed payload, padding included.
    pub packed_bytes: u64,
}

impl ChunkInfo {
    /// Size of the chunk on the wire: header, tree and payload.
    pub fn compressed_length(&self) -> u64 {
        8 + 2 + 2 * self.tree_elements as u64 + self.packed_bytes
    }
}

/// Totals for a completed encode or decode call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StreamSummary {
    /// Number of chunks processed.
    pub chunks: u64,
    /// Bytes consumed from the reader.
    pub bytes_read: u64,
    /// Bytes handed to the writer.
    pub bytes_written: u64,
}

impl StreamSummary {
    /// Output size relative to input size, 0.0 for an empty stream.
    pub fn ratio(&self) -> f64 {
        if self.bytes_read == 0 {
            0.0
        } else {
            self.bytes_written as f64 / self.bytes_read as f64
        }
    }
}
