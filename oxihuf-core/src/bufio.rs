//! Byte-granularity buffered I/O over an abstract source or sink.
//!
//! [`BufferedStream`] is a single buffer type that serves either the read role
//! (over any [`Read`]) or the write role (over any [`Write`]). One instance is
//! used per direction; the codec never reads and writes through the same one.
//!
//! Besides buffering, the stream keeps a running count of every byte that
//! crossed the buffer boundary. The stream decoder relies on that count to
//! know how much of the compressed input it has consumed.
//!
//! # Example
//!
//! ```
//! use oxihuf_core::bufio::BufferedStream;
//!
//! let mut sink = Vec::new();
//! {
//!     let mut writer = BufferedStream::with_capacity(&mut sink, 4).unwrap();
//!     writer.write(b"hello").unwrap();
//!     writer.flush().unwrap();
//!     assert_eq!(writer.processed(), 5);
//! }
//! assert_eq!(sink, b"hello");
//!
//! let mut reader = BufferedStream::with_capacity(&sink[..], 4).unwrap();
//! let mut word = [0u8; 5];
//! reader.read(&mut word).unwrap();
//! assert_eq!(&word, b"hello");
//! ```

use crate::error::{HufError, Result, try_alloc_bytes};
use std::io::{self, Read, Write};

/// Default capacity of the read and write buffers (64 KiB).
pub const DEFAULT_BUFFER_SIZE: usize = 64 * 1024;

/// A fixed-capacity read-ahead / write-behind buffer.
#[derive(Debug)]
pub struct BufferedStream<S> {
    /// Underlying source or sink.
    inner: S,
    /// Buffer storage; its length is the capacity.
    bytes: Vec<u8>,
    /// Number of valid bytes in `bytes`.
    length: usize,
    /// Read offset into the valid bytes.
    offset: usize,
    /// Total bytes passed through the buffer boundary.
    processed: u64,
}

impl<S> BufferedStream<S> {
    /// Create a buffered stream with the given capacity in bytes.
    ///
    /// A zero capacity is rejected; callers resolve defaults beforehand.
    pub fn with_capacity(inner: S, capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(HufError::invalid_argument(
                "buffer capacity must be non-zero",
            ));
        }

        Ok(Self {
            inner,
            bytes: try_alloc_bytes(capacity)?,
            length: 0,
            offset: 0,
            processed: 0,
        })
    }

    /// Create a buffered stream with the default 64 KiB capacity.
    pub fn new(inner: S) -> Result<Self> {
        Self::with_capacity(inner, DEFAULT_BUFFER_SIZE)
    }

    /// Buffer capacity in bytes.
    pub fn capacity(&self) -> usize {
        self.bytes.len()
    }

    /// Total number of bytes that crossed the buffer boundary so far.
    pub fn processed(&self) -> u64 {
        self.processed
    }

    /// Number of bytes currently held in the buffer.
    pub fn buffered(&self) -> usize {
        self.length - self.offset
    }

    /// Get a reference to the underlying source or sink.
    pub fn get_ref(&self) -> &S {
        &self.inner
    }

    /// Get a mutable reference to the underlying source or sink.
    pub fn get_mut(&mut self) -> &mut S {
        &mut self.inner
    }
}

impl<R: Read> BufferedStream<R> {
    /// Read exactly `buf.len()` bytes.
    ///
    /// Already-buffered bytes are served first. A remaining request at least as
    /// large as the capacity is read straight into `buf`; a smaller one
    /// refills the internal buffer once. If the source runs dry before the
    /// request is satisfied, a short read error is returned.
    pub fn read(&mut self, buf: &mut [u8]) -> Result<()> {
        let requested = buf.len();
        let mut filled = 0;

        let available = self.length - self.offset;
        if available > 0 && requested > 0 {
            let count = available.min(requested);
            buf[..count].copy_from_slice(&self.bytes[self.offset..self.offset + count]);
            self.offset += count;
            filled = count;
        }

        let remaining = requested - filled;
        if remaining == 0 {
            self.processed += requested as u64;
            return Ok(());
        }

        if remaining >= self.capacity() {
            self.length = 0;
            self.offset = 0;

            let got = fill_from(&mut self.inner, &mut buf[filled..])?;
            if got < remaining {
                return Err(HufError::short_read(requested, filled + got));
            }
        } else {
            let got = fill_from(&mut self.inner, &mut self.bytes)?;
            self.length = got;
            self.offset = 0;

            if got < remaining {
                return Err(HufError::short_read(requested, filled + got));
            }

            buf[filled..].copy_from_slice(&self.bytes[..remaining]);
            self.offset = remaining;
        }

        self.processed += requested as u64;
        Ok(())
    }

    /// Read a single byte.
    pub fn read_u8(&mut self) -> Result<u8> {
        let mut byte = [0u8; 1];
        self.read(&mut byte)?;
        Ok(byte[0])
    }

    /// Read a little-endian `i16`.
    pub fn read_i16_le(&mut self) -> Result<i16> {
        let mut bytes = [0u8; 2];
        self.read(&mut bytes)?;
        Ok(i16::from_le_bytes(bytes))
    }

    /// Read a little-endian `u64`.
    pub fn read_u64_le(&mut self) -> Result<u64> {
        let mut bytes = [0u8; 8];
        self.read(&mut bytes)?;
        Ok(u64::from_le_bytes(bytes))
    }
}

impl<W: Write> BufferedStream<W> {
    /// Write all of `buf`.
    ///
    /// If the data does not fit next to what is already buffered, the buffer
    /// is flushed first. Data at least as large as the capacity bypasses the
    /// buffer and goes straight to the sink.
    pub fn write(&mut self, buf: &[u8]) -> Result<()> {
        if self.length + buf.len() > self.capacity() {
            self.flush()?;
        }

        if buf.len() >= self.capacity() {
            self.inner.write_all(buf)?;
        } else {
            self.bytes[self.length..self.length + buf.len()].copy_from_slice(buf);
            self.length += buf.len();
        }

        self.processed += buf.len() as u64;
        Ok(())
    }

    /// Write a single byte.
    pub fn write_u8(&mut self, byte: u8) -> Result<()> {
        if self.length == self.capacity() {
            self.flush()?;
        }
        self.bytes[self.length] = byte;
        self.length += 1;
        self.processed += 1;
        Ok(())
    }

    /// Write a little-endian `i16`.
    pub fn write_i16_le(&mut self, value: i16) -> Result<()> {
        self.write(&value.to_le_bytes())
    }

    /// Write a little-endian `u64`.
    pub fn write_u64_le(&mut self, value: u64) -> Result<()> {
        self.write(&value.to_le_bytes())
    }

    /// Write buffered bytes to the sink. A no-op when the buffer is empty.
    pub fn flush(&mut self) -> Result<()> {
        if self.length == 0 {
            return Ok(());
        }

        self.inner.write_all(&self.bytes[..self.length])?;
        self.length = 0;
        Ok(())
    }

    /// Flush and return the underlying sink.
    pub fn into_inner(mut self) -> Result<W> {
        self.flush()?;
        self.inner.flush()?;
        Ok(self.inner)
    }
}

/// Read from `source` until `buf` is full or the source reports end of data.
fn fill_from<R: Read>(source: &mut R, buf: &mut [u8]) -> Result<usize> {
    let mut total = 0;
    while total < buf.len() {
        match source.read(&mut buf[total..]) {
            Ok(0) => break,
            Ok(n) => total += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Source that hands out at most `step` bytes per call.
    struct Trickle<'a> {
        data: &'a [u8],
        step: usize,
    }

    impl Read for Trickle<'_> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let n = self.step.min(buf.len()).min(self.data.len());
            buf[..n].copy_from_slice(&self.data[..n]);
            self.data = &self.data[n..];
            Ok(n)
        }
    }

    /// Sink that counts calls to `write`.
    #[derive(Default)]
    struct CountingSink {
        data: Vec<u8>,
        writes: usize,
    }

    impl Write for CountingSink {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.writes += 1;
            self.data.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let result = BufferedStream::with_capacity(Vec::<u8>::new(), 0);
        assert!(matches!(result, Err(HufError::InvalidArgument { .. })));
    }

    #[test]
    fn test_read_across_refills() {
        let data: Vec<u8> = (0..=99).collect();
        let mut reader = BufferedStream::with_capacity(&data[..], 16).unwrap();

        let mut out = Vec::new();
        let mut piece = [0u8; 7];
        for _ in 0..14 {
            reader.read(&mut piece).unwrap();
            out.extend_from_slice(&piece);
        }
        let mut tail = [0u8; 2];
        reader.read(&mut tail).unwrap();
        out.extend_from_slice(&tail);

        assert_eq!(out, data);
        assert_eq!(reader.processed(), 100);
    }

    #[test]
    fn test_large_read_bypasses_buffer() {
        let data: Vec<u8> = (0..64).collect();
        let mut reader = BufferedStream::with_capacity(&data[..], 8).unwrap();

        let mut head = [0u8; 3];
        reader.read(&mut head).unwrap();
        assert_eq!(reader.buffered(), 5);

        let mut big = [0u8; 40];
        reader.read(&mut big).unwrap();
        assert_eq!(&big[..], &data[3..43]);
        assert_eq!(reader.buffered(), 0);
        assert_eq!(reader.processed(), 43);
    }

    #[test]
    fn test_short_read_reports_eof() {
        let data = [1u8, 2, 3];
        let mut reader = BufferedStream::with_capacity(&data[..], 16).unwrap();
        let mut buf = [0u8; 4];
        let err = reader.read(&mut buf).unwrap_err();
        assert!(err.is_unexpected_eof());
        assert_eq!(reader.processed(), 0);
    }

    #[test]
    fn test_trickling_source_is_accumulated() {
        let data: Vec<u8> = (0..50).collect();
        let source = Trickle {
            data: &data,
            step: 3,
        };
        let mut reader = BufferedStream::with_capacity(source, 32).unwrap();
        let mut buf = [0u8; 50];
        reader.read(&mut buf).unwrap();
        assert_eq!(&buf[..], &data[..]);
    }

    #[test]
    fn test_little_endian_helpers() {
        let mut sink = Vec::new();
        {
            let mut writer = BufferedStream::with_capacity(&mut sink, 4).unwrap();
            writer.write_u64_le(0x0102_0304_0506_0708).unwrap();
            writer.write_i16_le(-2).unwrap();
            writer.write_u8(0xAB).unwrap();
            writer.flush().unwrap();
            assert_eq!(writer.processed(), 11);
        }
        assert_eq!(sink[..8], [8, 7, 6, 5, 4, 3, 2, 1]);

        let mut reader = BufferedStream::with_capacity(&sink[..], 4).unwrap();
        assert_eq!(reader.read_u64_le().unwrap(), 0x0102_0304_0506_0708);
        assert_eq!(reader.read_i16_le().unwrap(), -2);
        assert_eq!(reader.read_u8().unwrap(), 0xAB);
    }

    #[test]
    fn test_write_flushes_only_when_full() {
        let mut writer = BufferedStream::with_capacity(CountingSink::default(), 8).unwrap();
        writer.write(b"abc").unwrap();
        writer.write(b"def").unwrap();
        assert_eq!(writer.get_ref().writes, 0);

        writer.write(b"ghi").unwrap();
        assert_eq!(writer.get_ref().writes, 1);
        assert_eq!(writer.get_ref().data, b"abcdef");

        let sink = writer.into_inner().unwrap();
        assert_eq!(sink.data, b"abcdefghi");
    }

    #[test]
    fn test_oversized_write_goes_direct() {
        let mut writer = BufferedStream::with_capacity(CountingSink::default(), 4).unwrap();
        writer.write(b"xy").unwrap();
        writer.write(b"0123456789").unwrap();
        assert_eq!(writer.get_ref().data, b"xy0123456789");
        assert_eq!(writer.buffered(), 0);
        assert_eq!(writer.processed(), 12);
    }

    #[test]
    fn test_flush_empty_is_noop() {
        let mut writer = BufferedStream::with_capacity(CountingSink::default(), 4).unwrap();
        writer.flush().unwrap();
        assert_eq!(writer.get_ref().writes, 0);
    }
}
