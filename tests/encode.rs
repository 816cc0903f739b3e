// End-to-end encoder scenarios: stream framing, reconstruction quality,
// cropping, and the bitrate/quality response to the quantization level.

use tinyhevc::array2d::Array2D;
use tinyhevc::{EncodeError, EncodedImage, HevcEncoder};

fn encode(img: &Array2D<u8>, qpd6: u8) -> EncodedImage {
  let encoder = HevcEncoder::new(img.rows(), img.cols(), qpd6, 7).unwrap();
  encoder.encode_image(img)
}

fn mse(a: &Array2D<u8>, b: &Array2D<u8>) -> f64 {
  let rows = a.rows().min(b.rows());
  let cols = a.cols().min(b.cols());
  let mut sse = 0u64;
  for i in 0..rows {
    for j in 0..cols {
      let diff = a[i][j] as i64 - b[i][j] as i64;
      sse += (diff * diff) as u64;
    }
  }
  sse as f64 / (rows * cols) as f64
}

fn psnr(a: &Array2D<u8>, b: &Array2D<u8>) -> f64 {
  10.0 * ((255.0 * 255.0) / mse(a, b).max(1e-9)).log10()
}

// Byte length of the fixed headers ahead of the CABAC slice payload
fn header_len(width: usize, height: usize) -> usize {
  let ue_bits = |value: usize| {
    let mut len = 1;
    let mut tmp = value + 2;
    while tmp != 1 {
      len += 2;
      tmp >>= 1;
    }
    len
  };
  let picture_bits = 4 + ue_bits(width) + ue_bits(height) + 22 + 24;
  50 + (picture_bits + 7) / 8 + 17 + 2
}

// A deterministic textured image: smooth gradients plus mid-amplitude noise
fn textured(rows: usize, cols: usize) -> Array2D<u8> {
  let mut state = 0x2F6E2B1u32;
  Array2D::new_with(rows, cols, |i, j| {
    state = state.wrapping_mul(1103515245).wrapping_add(12345);
    let noise = (state >> 24) & 0x3F;
    ((i + 2 * j) as u32 / 2 + noise).min(255) as u8
  })
}

#[test]
fn constant_gray_reconstructs_exactly() {
  // Every border degrades to mid-gray, so every predictor is exact and all
  // residuals quantize to zero
  const NAL_PREFIX: [u8; 50] = [
    0x00, 0x00, 0x00, 0x01, 0x40, 0x01, 0x0C, 0x01, 0xFF, 0xFF, 0x03, 0x10, 0x00, 0x00, 0x03,
    0x00, 0x00, 0x03, 0x00, 0x00, 0x03, 0x00, 0x00, 0x03, 0x00, 0xB4, 0xF0, 0x24, 0x00, 0x00,
    0x01, 0x42, 0x01, 0x01, 0x03, 0x10, 0x00, 0x00, 0x03, 0x00, 0x00, 0x03, 0x00, 0x00, 0x03,
    0x00, 0x00, 0x03, 0x00, 0xB4,
  ];

  let img = Array2D::new_with(32, 32, |_, _| 128u8);
  let out = encode(&img, 3);

  assert_eq!(&out.stream[..50], &NAL_PREFIX);
  assert_eq!(out.recon.rows(), 32);
  assert_eq!(out.recon.cols(), 32);
  for i in 0..32 {
    assert_eq!(&out.recon[i], &img[i]);
  }
}

#[test]
fn diagonal_ramp_reconstructs_cleanly_at_fine_qp() {
  let img = Array2D::new_with(64, 64, |i, j| ((i + j) % 256) as u8);
  let out = encode(&img, 0);
  assert!(psnr(&img, &out.recon) > 38.0, "PSNR {:.2}", psnr(&img, &out.recon));
}

#[test]
fn horizontal_gradient_compresses_tightly() {
  let img = Array2D::new_with(32, 64, |_, j| ((j * 255) / 63) as u8);
  let out = encode(&img, 2);
  assert!(out.stream.len() <= 200, "stream is {} bytes", out.stream.len());
}

#[test]
fn odd_dimensions_crop_to_ctu_multiples() {
  let img = Array2D::new_with(33, 65, |i, j| (i * 7 + j * 3) as u8);
  let encoder = HevcEncoder::new(img.rows(), img.cols(), 3, 7).unwrap();
  assert_eq!((encoder.height(), encoder.width()), (32, 64));

  let out = encoder.encode_image(&img);
  assert_eq!((out.recon.rows(), out.recon.cols()), (32, 64));
  assert!(out.stream.len() > header_len(64, 32));
}

#[test]
fn sub_ctu_image_is_rejected() {
  assert_eq!(HevcEncoder::new(31, 31, 3, 7).err(), Some(EncodeError::ImageTooSmall));
}

#[test]
fn qp_endpoints_trade_rate_for_distortion() {
  let img = textured(128, 128);
  let fine = encode(&img, 0);
  let coarse = encode(&img, 4);

  assert!(
    fine.stream.len() > coarse.stream.len(),
    "bytes: qpd6=0 {} vs qpd6=4 {}",
    fine.stream.len(),
    coarse.stream.len()
  );
  assert!(
    mse(&img, &fine.recon) <= mse(&img, &coarse.recon),
    "mse: qpd6=0 {:.3} vs qpd6=4 {:.3}",
    mse(&img, &fine.recon),
    mse(&img, &coarse.recon)
  );
}

#[test]
fn re_encoding_the_reconstruction_stabilizes() {
  // Reconstructed samples sit on the quantizer's reconstruction points, so
  // feeding the encoder its own output reaches a fixed point within the
  // first generation or two; from there every stream is byte-identical
  let img = textured(64, 64);
  let mut current = encode(&img, 3);

  let mut stable = false;
  for _ in 0..6 {
    let next = encode(&current.recon, 3);
    if next.stream == current.stream {
      stable = true;
      break;
    }
    current = next;
  }
  assert!(stable, "re-encoding did not converge to a byte-stable stream");
}

#[test]
fn slice_payload_has_no_start_code_emulation() {
  // 0x03 escapes keep 00 00 00..02 out of the payload; 00 00 03 is the
  // escape pattern itself and is allowed
  for img in [textured(64, 64), Array2D::new_with(64, 64, |_, _| 128u8)] {
    for qpd6 in [0u8, 3] {
      let out = encode(&img, qpd6);
      let payload = &out.stream[header_len(64, 64)..];
      for (i, w) in payload.windows(3).enumerate() {
        assert!(
          !(w[0] == 0x00 && w[1] == 0x00 && w[2] <= 0x02),
          "qpd6={} offset {}: {:02x?}",
          qpd6,
          i,
          w
        );
      }
    }
  }
}
