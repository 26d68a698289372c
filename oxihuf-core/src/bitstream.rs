//! MSB-first single-bit accumulators for Huffman code packing.
//!
//! Codes are packed most significant bit first: the first bit of a chunk
//! lands in bit 7 of the first byte. A partially filled byte at the end of a
//! chunk is padded with zero bits; the decoder stops on the declared symbol
//! count, so pad bits are never interpreted.
//!
//! Unlike a `BitWriter<W>` that owns its sink, these accumulators borrow the
//! [`BufferedStream`] per call, so the same stream can interleave byte-aligned
//! chunk headers with bit-packed payloads.

use crate::bufio::BufferedStream;
use crate::error::Result;
use std::io::{Read, Write};

/// Accumulates single bits into bytes, MSB first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitWriter {
    /// Partially filled byte.
    bits: u8,
    /// Fill position, counting down from 8. Zero means the byte is full.
    offset: u8,
    /// Total bits written since creation.
    total_bits: u64,
}

impl BitWriter {
    /// Create an empty bit writer.
    pub fn new() -> Self {
        Self {
            bits: 0,
            offset: 8,
            total_bits: 0,
        }
    }

    /// Discard any pending bits and start a fresh byte.
    pub fn reset(&mut self) {
        self.bits = 0;
        self.offset = 8;
    }

    /// Number of bits waiting in the accumulator.
    pub fn pending_bits(&self) -> u8 {
        8 - self.offset
    }

    /// Total bits written since creation.
    pub fn total_bits(&self) -> u64 {
        self.total_bits
    }

    /// Append one bit; a completed byte is handed to `out`.
    #[inline]
    pub fn write_bit<W: Write>(&mut self, bit: bool, out: &mut BufferedStream<W>) -> Result<()> {
        self.offset -= 1;
        self.bits |= (bit as u8) << self.offset;
        self.total_bits += 1;

        if self.offset == 0 {
            out.write_u8(self.bits)?;
            self.reset();
        }
        Ok(())
    }

    /// Append a sequence of bits in order.
    pub fn write_bits<W: Write>(&mut self, bits: &[bool], out: &mut BufferedStream<W>) -> Result<()> {
        for &bit in bits {
            self.write_bit(bit, out)?;
        }
        Ok(())
    }

    /// Emit a partially filled byte, zero padded. A no-op on a byte boundary.
    pub fn flush<W: Write>(&mut self, out: &mut BufferedStream<W>) -> Result<()> {
        if self.offset != 8 {
            out.write_u8(self.bits)?;
            self.reset();
        }
        Ok(())
    }
}

impl Default for BitWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// Yields single bits from bytes, MSB first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BitReader {
    /// Byte currently being consumed.
    byte: u8,
    /// Bits left in `byte`.
    remaining: u8,
    /// Total bits read since creation.
    total_bits: u64,
}

impl BitReader {
    /// Create an empty bit reader.
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop the rest of the current byte (chunk padding).
    pub fn reset(&mut self) {
        self.byte = 0;
        self.remaining = 0;
    }

    /// Bits left in the current byte.
    pub fn remaining_bits(&self) -> u8 {
        self.remaining
    }

    /// Total bits read since creation.
    pub fn total_bits(&self) -> u64 {
        self.total_bits
    }

    /// Read the next bit, pulling a new byte from `input` when needed.
    #[inline]
    pub fn read_bit<R: Read>(&mut self, input: &mut BufferedStream<R>) -> Result<bool> {
        if self.remaining == 0 {
            self.byte = input.read_u8()?;
            self.remaining = 8;
        }

        self.remaining -= 1;
        self.total_bits += 1;
        Ok((self.byte >> self.remaining) & 1 == 1)
    }
}
