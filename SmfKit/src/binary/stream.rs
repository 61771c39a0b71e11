//! Position-tracking stream adapters.
//!
//! [`StreamReader`] and [`StreamWriter`] count every octet that passes
//! through them so errors can carry absolute positions and the writer can
//! enforce section alignment. [`BoundedReader`] restricts reads to one
//! section's payload.

use std::io::{self, Read, Write};

use super::align_next;
use crate::error::{Error, Result};

/// A reader that knows its absolute position.
#[derive(Debug)]
pub struct StreamReader<R> {
    inner: R,
    position: u64,
}

impl<R: Read> StreamReader<R> {
    pub fn new(inner: R) -> Self {
        Self { inner, position: 0 }
    }

    #[must_use]
    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    /// Read exactly `buf.len()` octets.
    pub fn fill(&mut self, buf: &mut [u8]) -> Result<()> {
        let position = self.position;
        self.read_exact(buf)
            .map_err(|e| eof_as(e, || Error::UnexpectedEndOfStream { position }))
    }

    /// Discard `count` octets.
    pub fn skip(&mut self, count: u64) -> Result<()> {
        let copied = io::copy(&mut (&mut self.inner).take(count), &mut io::sink())?;
        self.position += copied;
        if copied < count {
            return Err(Error::UnexpectedEndOfStream {
                position: self.position,
            });
        }
        Ok(())
    }

    /// A reader limited to the next `size` octets.
    pub fn bounded(&mut self, size: u64) -> Result<BoundedReader<'_, R>> {
        let start = self.position;
        let end = start.checked_add(size).ok_or(Error::ArithmeticOverflow {
            context: "section end",
        })?;
        Ok(BoundedReader {
            inner: self,
            start,
            end,
        })
    }
}

impl<R: Read> Read for StreamReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.position += n as u64;
        Ok(n)
    }
}

/// A view of a [`StreamReader`] that ends after a fixed number of octets.
#[derive(Debug)]
pub struct BoundedReader<'a, R> {
    inner: &'a mut StreamReader<R>,
    start: u64,
    end: u64,
}

impl<R: Read> BoundedReader<'_, R> {
    #[must_use]
    pub fn position(&self) -> u64 {
        self.inner.position
    }

    #[must_use]
    pub fn start(&self) -> u64 {
        self.start
    }

    #[must_use]
    pub fn end(&self) -> u64 {
        self.end
    }

    /// Octets left before the bound.
    #[must_use]
    pub fn remaining(&self) -> u64 {
        self.end.saturating_sub(self.inner.position)
    }

    /// Read exactly `buf.len()` octets, failing with a section overrun at the bound.
    pub fn fill(&mut self, buf: &mut [u8]) -> Result<()> {
        let position = self.position();
        let end = self.end;
        if (buf.len() as u64) > self.remaining() {
            return Err(Error::SectionOverrun { position, end });
        }
        self.inner.fill(buf)
    }

    /// Read `count` octets into a new vector.
    pub fn read_vec(&mut self, count: u64) -> Result<Vec<u8>> {
        if count > self.remaining() {
            return Err(Error::SectionOverrun {
                position: self.position(),
                end: self.end,
            });
        }
        let len = usize::try_from(count).map_err(|_| Error::ArithmeticOverflow {
            context: "read length",
        })?;
        let mut data = vec![0u8; len];
        self.inner.fill(&mut data)?;
        Ok(data)
    }

    /// Advance to the absolute position `target`, which must lie within the bound.
    pub fn skip_to(&mut self, target: u64) -> Result<()> {
        let position = self.position();
        if target > self.end {
            return Err(Error::SectionOverrun {
                position: target,
                end: self.end,
            });
        }
        if target > position {
            self.inner.skip(target - position)?;
        }
        Ok(())
    }

    /// Advance to the next multiple of `alignment` relative to the section start.
    pub fn skip_to_alignment(&mut self, alignment: u64) -> Result<()> {
        let relative = self.position() - self.start;
        let aligned = align_next(relative, alignment).ok_or(Error::ArithmeticOverflow {
            context: "aligned offset",
        })?;
        self.skip_to(self.start + aligned)
    }

    /// Discard everything up to the bound.
    pub fn skip_to_end(&mut self) -> Result<()> {
        let end = self.end;
        self.skip_to(end)
    }
}

impl<R: Read> Read for BoundedReader<'_, R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let max = usize::try_from(self.remaining()).unwrap_or(usize::MAX);
        let len = buf.len().min(max);
        if len == 0 {
            return Ok(0);
        }
        self.inner.read(&mut buf[..len])
    }
}

/// A writer that knows its absolute position.
#[derive(Debug)]
pub struct StreamWriter<W> {
    inner: W,
    position: u64,
}

impl<W: Write> StreamWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner, position: 0 }
    }

    #[must_use]
    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn into_inner(self) -> W {
        self.inner
    }

    /// Fail unless the position is a multiple of `alignment`.
    pub fn check_alignment(&self, alignment: u64) -> Result<()> {
        if self.position % alignment != 0 {
            return Err(Error::MisalignedSection {
                position: self.position,
                alignment,
            });
        }
        Ok(())
    }

    /// Write zeros up to the next multiple of `alignment`.
    pub fn pad_to_alignment(&mut self, alignment: u64) -> Result<()> {
        const ZEROS: [u8; 16] = [0; 16];

        let target = align_next(self.position, alignment).ok_or(Error::ArithmeticOverflow {
            context: "padding",
        })?;
        let mut left = (target - self.position) as usize;
        while left > 0 {
            let n = left.min(ZEROS.len());
            self.write_all(&ZEROS[..n])?;
            left -= n;
        }
        Ok(())
    }
}

impl<W: Write> Write for StreamWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.position += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

fn eof_as(error: io::Error, make: impl FnOnce() -> Error) -> Error {
    if error.kind() == io::ErrorKind::UnexpectedEof {
        make()
    } else {
        Error::Io(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use byteorder::{BigEndian, ReadBytesExt};

    #[test]
    fn test_reader_tracks_position() {
        let data: Vec<u8> = (0u8..32).collect();
        let mut reader = StreamReader::new(data.as_slice());
        reader.skip(4).unwrap();
        assert_eq!(reader.read_u32::<BigEndian>().unwrap(), 0x04050607);
        assert_eq!(reader.position(), 8);
    }

    #[test]
    fn test_bounded_reader_stops_at_bound() {
        let data = [1u8; 32];
        let mut reader = StreamReader::new(&data[..]);
        let mut section = reader.bounded(6).unwrap();
        let mut buf = [0u8; 4];
        section.fill(&mut buf).unwrap();
        assert_eq!(section.remaining(), 2);
        assert!(matches!(
            section.fill(&mut buf),
            Err(Error::SectionOverrun { position: 4, end: 6 })
        ));
        section.skip_to_end().unwrap();
        assert_eq!(reader.position(), 6);
    }

    #[test]
    fn test_bounded_alignment_is_relative_to_start() {
        let data = [0u8; 64];
        let mut reader = StreamReader::new(&data[..]);
        reader.skip(16).unwrap();
        let mut section = reader.bounded(40).unwrap();
        let mut buf = [0u8; 3];
        section.fill(&mut buf).unwrap();
        section.skip_to_alignment(16).unwrap();
        assert_eq!(section.position(), 32);
    }

    #[test]
    fn test_skip_past_end_of_stream() {
        let data = [0u8; 4];
        let mut reader = StreamReader::new(&data[..]);
        assert!(matches!(
            reader.skip(10),
            Err(Error::UnexpectedEndOfStream { position: 4 })
        ));
    }

    #[test]
    fn test_writer_padding() {
        let mut writer = StreamWriter::new(Vec::new());
        writer.write_all(&[7u8; 5]).unwrap();
        assert!(writer.check_alignment(16).is_err());
        writer.pad_to_alignment(16).unwrap();
        writer.check_alignment(16).unwrap();
        let bytes = writer.into_inner();
        assert_eq!(bytes.len(), 16);
        assert!(bytes[5..].iter().all(|&b| b == 0));
    }
}
