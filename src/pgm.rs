// Binary PGM ("P5") reader and writer. Only 8-bit images are supported;
// a larger maxval is an error, not silently truncated.

use std::io;
use std::io::prelude::*;

use byteorder::ReadBytesExt;

use crate::array2d::Array2D;

fn invalid<T>(msg: &str) -> io::Result<T> {
  Err(io::Error::new(io::ErrorKind::InvalidData, msg))
}

fn is_pgm_whitespace(byte: u8) -> bool {
  matches!(byte, b' ' | b'\t' | b'\n' | b'\r')
}

// Read one whitespace-delimited decimal header field. Consumes the single
// whitespace byte terminating the field, which for the last header field is
// exactly the separator the format requires before the pixel data.
fn read_decimal<R: Read>(r: &mut R) -> io::Result<usize> {
  let mut byte = r.read_u8()?;
  while is_pgm_whitespace(byte) {
    byte = r.read_u8()?;
  }
  if !byte.is_ascii_digit() {
    return invalid("expected decimal header field in PGM file");
  }

  let mut value = 0usize;
  while byte.is_ascii_digit() {
    value = 10 * value + (byte - b'0') as usize;
    byte = r.read_u8()?;
  }
  if !is_pgm_whitespace(byte) {
    return invalid("malformed header field in PGM file");
  }
  return Ok(value);
}

pub fn read_pgm<R: Read>(r: &mut R) -> io::Result<Array2D<u8>> {
  let mut magic = [0u8; 2];
  r.read_exact(&mut magic)?;
  if &magic != b"P5" {
    return invalid("not a binary (P5) PGM file");
  }

  let width = read_decimal(r)?;
  let height = read_decimal(r)?;
  let maxval = read_decimal(r)?;

  if width == 0 || height == 0 {
    return invalid("zero PGM image dimension");
  }
  if maxval > 255 {
    return invalid("only 8-bit PGM images are supported");
  }

  let mut img = Array2D::zeroed(height, width);
  for i in 0..height {
    r.read_exact(&mut img[i])?;
  }
  return Ok(img);
}

pub fn write_pgm<W: Write>(w: &mut W, img: &Array2D<u8>) -> io::Result<()> {
  write!(w, "P5\n{} {}\n255\n", img.cols(), img.rows())?;
  for i in 0..img.rows() {
    w.write_all(&img[i])?;
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn round_trip() {
    let img = Array2D::new_with(3, 5, |i, j| (i * 16 + j) as u8);
    let mut buf = Vec::new();
    write_pgm(&mut buf, &img).unwrap();
    assert!(buf.starts_with(b"P5\n5 3\n255\n"));

    let back = read_pgm(&mut &buf[..]).unwrap();
    assert_eq!(back.rows(), 3);
    assert_eq!(back.cols(), 5);
    for i in 0..3 {
      assert_eq!(&back[i], &img[i]);
    }
  }

  #[test]
  fn accepts_loose_header_whitespace() {
    let data = b"P5  64\n\t2\r\n255\n".iter().chain([0u8; 128].iter()).copied().collect::<Vec<u8>>();
    let img = read_pgm(&mut &data[..]).unwrap();
    assert_eq!((img.rows(), img.cols()), (2, 64));
  }

  #[test]
  fn rejects_bad_magic_and_deep_images() {
    assert!(read_pgm(&mut &b"P2\n2 2\n255\n"[..]).is_err());
    assert!(read_pgm(&mut &b"P5\n2 2\n65535\n"[..]).is_err());
    // truncated pixel data
    assert!(read_pgm(&mut &b"P5\n4 4\n255\nxx"[..]).is_err());
  }
}
