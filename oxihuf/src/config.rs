//! Stream configuration for encode and decode calls.

use oxihuf_core::bufio::DEFAULT_BUFFER_SIZE;

/// Huffman stream parameters.
///
/// The meaning of `length` depends on the direction: the encoder consumes
/// `length` bytes of plaintext, the decoder consumes `length` bytes of
/// compressed input. Zero-valued sizes fall back to their defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HufConfig {
    /// Total bytes to consume from the reader. Zero means nothing to do.
    pub length: u64,
    /// Plaintext bytes per chunk (0 = one chunk for the whole stream).
    pub chunk_size: u64,
    /// Read buffer capacity in bytes (0 = 64 KiB).
    pub reader_buffer_size: usize,
    /// Write buffer capacity in bytes (0 = 64 KiB).
    pub writer_buffer_size: usize,
}

impl HufConfig {
    /// Create a configuration for `length` input bytes with default sizes.
    pub fn new(length: u64) -> Self {
        Self {
            length,
            chunk_size: 0,
            reader_buffer_size: 0,
            writer_buffer_size: 0,
        }
    }

    /// Set the chunk size.
    pub fn with_chunk_size(mut self, chunk_size: u64) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Set the read buffer capacity.
    pub fn with_reader_buffer_size(mut self, size: usize) -> Self {
        self.reader_buffer_size = size;
        self
    }

    /// Set the write buffer capacity.
    pub fn with_writer_buffer_size(mut self, size: usize) -> Self {
        self.writer_buffer_size = size;
        self
    }

    /// Set both buffer capacities.
    pub fn with_buffer_size(self, size: usize) -> Self {
        self.with_reader_buffer_size(size).with_writer_buffer_size(size)
    }

    /// Chunk size after defaulting to `length`.
    pub fn effective_chunk_size(&self) -> u64 {
        if self.chunk_size == 0 {
            self.length
        } else {
            self.chunk_size
        }
    }

    /// Read buffer capacity after defaulting.
    pub fn reader_capacity(&self) -> usize {
        if self.reader_buffer_size == 0 {
            DEFAULT_BUFFER_SIZE
        } else {
            self.reader_buffer_size
        }
    }

    /// Write buffer capacity after defaulting.
    pub fn writer_capacity(&self) -> usize {
        if self.writer_buffer_size == 0 {
            DEFAULT_BUFFER_SIZE
        } else {
            self.writer_buffer_size
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = HufConfig::new(1000);
        assert_eq!(config.effective_chunk_size(), 1000);
        assert_eq!(config.reader_capacity(), 64 * 1024);
        assert_eq!(config.writer_capacity(), 64 * 1024);
    }

    #[test]
    fn test_builders() {
        let config = HufConfig::new(1000)
            .with_chunk_size(256)
            .with_reader_buffer_size(512)
            .with_writer_buffer_size(128);
        assert_eq!(config.effective_chunk_size(), 256);
        assert_eq!(config.reader_capacity(), 512);
        assert_eq!(config.writer_capacity(), 128);

        let config = HufConfig::new(10).with_buffer_size(32);
        assert_eq!(config.reader_capacity(), 32);
        assert_eq!(config.writer_capacity(), 32);
    }

    #[test]
    fn test_zero_length() {
        let config = HufConfig::new(0);
        assert_eq!(config.effective_chunk_size(), 0);
    }
}
