//! Symbol frequency histogram.
//!
//! The histogram counts fixed-width symbols in a byte window. Its index space
//! is larger than the symbol alphabet so the tree builder can assign weights
//! to internal nodes in the same numbering (see [`HUF_HISTOGRAM_LEN`]).

use oxihuf_core::error::{HufError, Result};

/// Number of distinct byte symbols.
pub const ASCII_COUNT: usize = 256;

/// Histogram length: room for every symbol plus every internal node.
pub const HUF_HISTOGRAM_LEN: usize = ASCII_COUNT * 2;

/// Occurrence counts of fixed-width symbols.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Histogram {
    /// Frequency of each symbol value.
    frequencies: Vec<u64>,
    /// Width of one symbol in bytes.
    iota: usize,
    /// Lowest symbol value observed so far.
    start: Option<usize>,
}

impl Histogram {
    /// Create an empty histogram of `length` entries over `iota`-byte symbols.
    ///
    /// `iota` must be a power of two between 1 and 8.
    pub fn new(iota: usize, length: usize) -> Result<Self> {
        if !matches!(iota, 1 | 2 | 4 | 8) {
            return Err(HufError::invalid_argument(format!(
                "symbol width must be 1, 2, 4 or 8 bytes, got {iota}"
            )));
        }
        if length == 0 {
            return Err(HufError::invalid_argument("histogram length must be non-zero"));
        }

        let mut frequencies = Vec::new();
        frequencies
            .try_reserve_exact(length)
            .map_err(|_| HufError::memory_allocation(length))?;
        frequencies.resize(length, 0);

        Ok(Self {
            frequencies,
            iota,
            start: None,
        })
    }

    /// Histogram over single-byte symbols, sized for tree construction.
    pub fn bytes() -> Self {
        Self {
            frequencies: vec![0; HUF_HISTOGRAM_LEN],
            iota: 1,
            start: None,
        }
    }

    /// Count every `iota`-byte symbol in `buf`.
    ///
    /// Symbols are read little-endian. Trailing bytes that do not form a whole
    /// symbol are ignored. A symbol value outside the histogram is rejected
    /// before any count is touched.
    pub fn populate(&mut self, buf: &[u8]) -> Result<()> {
        let length = self.frequencies.len();

        if self.iota == 1 && length >= ASCII_COUNT {
            for &byte in buf {
                self.frequencies[byte as usize] += 1;
                self.observe(byte as usize);
            }
            return Ok(());
        }

        if let Some(value) = buf
            .chunks_exact(self.iota)
            .map(read_symbol)
            .find(|&value| value >= length as u64)
        {
            return Err(out_of_range(value as usize, length));
        }

        for chunk in buf.chunks_exact(self.iota) {
            let value = read_symbol(chunk) as usize;
            self.frequencies[value] += 1;
            self.observe(value);
        }
        Ok(())
    }

    /// Zero all frequencies and forget the start position.
    pub fn reset(&mut self) {
        self.frequencies.fill(0);
        self.start = None;
    }

    /// Lowest observed symbol value, or `None` for an empty histogram.
    pub fn start(&self) -> Option<usize> {
        self.start
    }

    /// All frequencies, indexed by symbol value.
    pub fn frequencies(&self) -> &[u64] {
        &self.frequencies
    }

    /// Frequency of a single symbol value.
    pub fn frequency(&self, value: usize) -> u64 {
        self.frequencies.get(value).copied().unwrap_or(0)
    }

    /// Symbol width in bytes.
    pub fn iota(&self) -> usize {
        self.iota
    }

    /// Number of histogram entries.
    pub fn len(&self) -> usize {
        self.frequencies.len()
    }

    /// Returns `true` if nothing has been counted.
    pub fn is_empty(&self) -> bool {
        self.start.is_none()
    }

    /// Number of distinct symbol values observed.
    pub fn distinct(&self) -> usize {
        self.frequencies.iter().filter(|&&f| f > 0).count()
    }

    #[inline]
    fn observe(&mut self, value: usize) {
        match self.start {
            Some(start) if start <= value => {}
            _ => self.start = Some(value),
        }
    }
}

fn read_symbol(chunk: &[u8]) -> u64 {
    let mut bytes = [0u8; 8];
    bytes[..chunk.len()].copy_from_slice(chunk);
    u64::from_le_bytes(bytes)
}

fn out_of_range(value: usize, length: usize) -> HufError {
    HufError::invalid_argument(format!(
        "symbol value {value} exceeds histogram length {length}"
    ))
}
