//! Fixed-width big-endian primitives over byte streams.
//!
//! Every NBD structure is a sequence of fixed-width big-endian fields.
//! These helpers read and write exactly the declared width; a short
//! read surfaces as [`std::io::ErrorKind::UnexpectedEof`] from
//! `read_exact` and fails the whole structure. No partial-structure
//! recovery is attempted anywhere in the codec.

use std::io::{self, Read, Write};

/// Reads a big-endian `u16`.
#[inline]
pub fn read_u16<R: Read>(reader: &mut R) -> io::Result<u16> {
    let mut buf = [0u8; 2];
    reader.read_exact(&mut buf)?;
    Ok(u16::from_be_bytes(buf))
}

/// Reads a big-endian `u32`.
#[inline]
pub fn read_u32<R: Read>(reader: &mut R) -> io::Result<u32> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    Ok(u32::from_be_bytes(buf))
}

/// Reads a big-endian `u64`.
#[inline]
pub fn read_u64<R: Read>(reader: &mut R) -> io::Result<u64> {
    let mut buf = [0u8; 8];
    reader.read_exact(&mut buf)?;
    Ok(u64::from_be_bytes(buf))
}

/// Writes a big-endian `u16`.
#[inline]
pub fn write_u16<W: Write>(writer: &mut W, value: u16) -> io::Result<()> {
    writer.write_all(&value.to_be_bytes())
}

/// Writes a big-endian `u32`.
#[inline]
pub fn write_u32<W: Write>(writer: &mut W, value: u32) -> io::Result<()> {
    writer.write_all(&value.to_be_bytes())
}

/// Writes a big-endian `u64`.
#[inline]
pub fn write_u64<W: Write>(writer: &mut W, value: u64) -> io::Result<()> {
    writer.write_all(&value.to_be_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn round_trips_preserve_byte_order() {
        let mut buf = Vec::new();
        write_u16(&mut buf, 0x0102).expect("write u16");
        write_u32(&mut buf, 0x03040506).expect("write u32");
        write_u64(&mut buf, 0x0708090a0b0c0d0e).expect("write u64");
        assert_eq!(
            buf,
            [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0a, 0x0b, 0x0c, 0x0d, 0x0e]
        );

        let mut cursor = Cursor::new(buf);
        assert_eq!(read_u16(&mut cursor).expect("read u16"), 0x0102);
        assert_eq!(read_u32(&mut cursor).expect("read u32"), 0x03040506);
        assert_eq!(read_u64(&mut cursor).expect("read u64"), 0x0708090a0b0c0d0e);
    }

    #[test]
    fn short_input_fails_with_unexpected_eof() {
        let mut cursor = Cursor::new(vec![0x01, 0x02, 0x03]);
        let err = read_u32(&mut cursor).expect_err("three bytes cannot satisfy a u32");
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }
}
