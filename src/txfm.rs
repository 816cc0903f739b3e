// Forward and inverse integer DCT at sizes 8, 16 and 32.
//
// The forward transform is two plain matrix multiplies against the DCT basis
// (the encoder runs it once per candidate mode, clarity wins). The inverse
// transform uses the even/odd butterfly factorization so its fixed-point
// behavior matches what a decoder computes.

use crate::array2d::Array2D;
use crate::consts::*;
use crate::util::*;

fn dct_row(cu_sz: usize, i: usize) -> &'static [i32] {
  match cu_sz {
    8 => &DCT8_MAT[i],
    16 => &DCT16_MAT[i],
    32 => &DCT32_MAT[i],
    _ => panic!("unsupported transform size {}", cu_sz),
  }
}

// dst = (DCT x src) >> sft, with rounding
fn mul_dct_left(cu_sz: usize, sft: u32, src: &Array2D<i32>) -> Array2D<i32> {
  let add = (1i32 << sft) >> 1;
  Array2D::new_with(cu_sz, cu_sz, |i, j| {
    let row = dct_row(cu_sz, i);
    let mut sum = add;
    for k in 0..cu_sz {
      sum += row[k] * src[k][j];
    }
    sum >> sft
  })
}

// dst = (src x DCT^T) >> sft, with rounding
fn mul_dct_right_t(cu_sz: usize, sft: u32, src: &Array2D<i32>) -> Array2D<i32> {
  let add = (1i32 << sft) >> 1;
  Array2D::new_with(cu_sz, cu_sz, |i, j| {
    let row = dct_row(cu_sz, j);
    let mut sum = add;
    for k in 0..cu_sz {
      sum += src[i][k] * row[k];
    }
    sum >> sft
  })
}

// Forward DCT of a residual block. The per-pass shifts keep the output in
// 16-bit coefficient range for 8-bit input.
pub fn transform(cu_sz: usize, resi: &Array2D<i32>) -> Array2D<i32> {
  let sft1 = cu_sz.ilog2() - 1; // 2, 3, 4 for 8, 16, 32
  let sft2 = sft1 + 7;

  let tmp = mul_dct_left(cu_sz, sft1, resi);
  return mul_dct_right_t(cu_sz, sft2, &tmp);
}

// One inverse pass: for each column j of src, reconstruct the 1-D signal
// into row j of the output through the even/odd decomposition
fn inv_pass(cu_sz: usize, src: &Array2D<i32>) -> Array2D<i32> {
  let m = |i: usize, k: usize| dct_row(cu_sz, i)[k];
  let mut dst = Array2D::zeroed(cu_sz, cu_sz);

  match cu_sz {
    8 => {
      for j in 0..8 {
        let mut o = [0i32; 4];
        for k in 0..4 {
          o[k] = m(1, k) * src[1][j] + m(3, k) * src[3][j] + m(5, k) * src[5][j] + m(7, k) * src[7][j];
        }
        let eo = [
          m(2, 0) * src[2][j] + m(6, 0) * src[6][j],
          m(2, 1) * src[2][j] + m(6, 1) * src[6][j],
        ];
        let ee = [
          m(0, 0) * src[0][j] + m(4, 0) * src[4][j],
          m(0, 1) * src[0][j] + m(4, 1) * src[4][j],
        ];
        let e = [ee[0] + eo[0], ee[1] + eo[1], ee[1] - eo[1], ee[0] - eo[0]];
        for k in 0..4 {
          dst[j][k] = e[k] + o[k];
          dst[j][k + 4] = e[3 - k] - o[3 - k];
        }
      }
    }

    16 => {
      for j in 0..16 {
        let mut o = [0i32; 8];
        for k in 0..8 {
          o[k] = m(1, k) * src[1][j] + m(3, k) * src[3][j] + m(5, k) * src[5][j] + m(7, k) * src[7][j]
               + m(9, k) * src[9][j] + m(11, k) * src[11][j] + m(13, k) * src[13][j] + m(15, k) * src[15][j];
        }
        let mut eo = [0i32; 4];
        for k in 0..4 {
          eo[k] = m(2, k) * src[2][j] + m(6, k) * src[6][j] + m(10, k) * src[10][j] + m(14, k) * src[14][j];
        }
        let eeo = [
          m(4, 0) * src[4][j] + m(12, 0) * src[12][j],
          m(4, 1) * src[4][j] + m(12, 1) * src[12][j],
        ];
        let eee = [
          m(0, 0) * src[0][j] + m(8, 0) * src[8][j],
          m(0, 1) * src[0][j] + m(8, 1) * src[8][j],
        ];
        let ee = [eee[0] + eeo[0], eee[1] + eeo[1], eee[1] - eeo[1], eee[0] - eeo[0]];
        let mut e = [0i32; 8];
        for k in 0..4 {
          e[k] = ee[k] + eo[k];
          e[k + 4] = ee[3 - k] - eo[3 - k];
        }
        for k in 0..8 {
          dst[j][k] = e[k] + o[k];
          dst[j][k + 8] = e[7 - k] - o[7 - k];
        }
      }
    }

    32 => {
      for j in 0..32 {
        let mut o = [0i32; 16];
        for k in 0..16 {
          let mut sum = 0;
          for n in 0..16 {
            sum += m(2 * n + 1, k) * src[2 * n + 1][j];
          }
          o[k] = sum;
        }
        let mut eo = [0i32; 8];
        for k in 0..8 {
          let mut sum = 0;
          for n in 0..8 {
            sum += m(4 * n + 2, k) * src[4 * n + 2][j];
          }
          eo[k] = sum;
        }
        let mut eeo = [0i32; 4];
        for k in 0..4 {
          eeo[k] = m(4, k) * src[4][j] + m(12, k) * src[12][j] + m(20, k) * src[20][j] + m(28, k) * src[28][j];
        }
        let eeeo = [
          m(8, 0) * src[8][j] + m(24, 0) * src[24][j],
          m(8, 1) * src[8][j] + m(24, 1) * src[24][j],
        ];
        let eeee = [
          m(0, 0) * src[0][j] + m(16, 0) * src[16][j],
          m(0, 1) * src[0][j] + m(16, 1) * src[16][j],
        ];
        let eee = [eeee[0] + eeeo[0], eeee[1] + eeeo[1], eeee[1] - eeeo[1], eeee[0] - eeeo[0]];
        let mut ee = [0i32; 8];
        for k in 0..4 {
          ee[k] = eee[k] + eeo[k];
          ee[k + 4] = eee[3 - k] - eeo[3 - k];
        }
        let mut e = [0i32; 16];
        for k in 0..8 {
          e[k] = ee[k] + eo[k];
          e[k + 8] = ee[7 - k] - eo[7 - k];
        }
        for k in 0..16 {
          dst[j][k] = e[k] + o[k];
          dst[j][k + 16] = e[15 - k] - o[15 - k];
        }
      }
    }

    _ => panic!("unsupported transform size {}", cu_sz),
  }

  return dst;
}

// Inverse DCT of a dequantized block, producing the reconstructed residual.
// Intermediate and final values are rounded and clipped to coefficient range.
pub fn inv_transform(cu_sz: usize, deqt: &Array2D<i32>) -> Array2D<i32> {
  const SFT1: i32 = 7;
  const SFT2: i32 = 12;
  const ADD1: i32 = (1 << SFT1) >> 1;
  const ADD2: i32 = (1 << SFT2) >> 1;

  let mut tmp = inv_pass(cu_sz, deqt);
  for i in 0..cu_sz {
    for j in 0..cu_sz {
      tmp[i][j] = coef_clip((tmp[i][j] + ADD1) >> SFT1);
    }
  }

  let mut dst = inv_pass(cu_sz, &tmp);
  for i in 0..cu_sz {
    for j in 0..cu_sz {
      dst[i][j] = coef_clip((dst[i][j] + ADD2) >> SFT2);
    }
  }

  return dst;
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn flat_residual_is_pure_dc() {
    let resi = Array2D::new_with(8, 8, |_, _| 4);
    let tran = transform(8, &resi);
    // DC gain for an 8x8 block is 128: two passes of (x 64*8) >> (2, 9)
    assert_eq!(tran[0][0], 512);
    for i in 0..8 {
      for j in 0..8 {
        if (i, j) != (0, 0) {
          assert_eq!(tran[i][j], 0, "AC coefficient at ({}, {})", i, j);
        }
      }
    }
  }

  #[test]
  fn dc_only_block_reconstructs_flat() {
    let mut deqt = Array2D::zeroed(8, 8);
    deqt[0][0] = 512;
    let resr = inv_transform(8, &deqt);
    for i in 0..8 {
      assert!(resr[i].iter().all(|&v| v == 4));
    }
  }

  #[test]
  fn single_ac_coefficient_is_odd_symmetric() {
    // The first AC basis function is odd around the block center, so its
    // reconstruction negates under reversal
    let mut deqt = Array2D::zeroed(8, 8);
    deqt[0][1] = 512;
    let resr = inv_transform(8, &deqt);
    for i in 0..8 {
      for j in 0..4 {
        assert_eq!(resr[i][j], -resr[i][7 - j]);
      }
    }
  }

  #[test]
  fn larger_sizes_round_trip_a_flat_block() {
    // The DC gain is 128 at every size: the per-size shifts exactly cancel
    // the extra basis length
    for &cu_sz in &[16usize, 32] {
      let resi = Array2D::new_with(cu_sz, cu_sz, |_, _| 4);
      let tran = transform(cu_sz, &resi);
      assert_eq!(tran[0][0], 512);
      assert_eq!(tran[1][0], 0);
      assert_eq!(tran[0][1], 0);

      let resr = inv_transform(cu_sz, &tran);
      for i in 0..cu_sz {
        assert!(resr[i].iter().all(|&v| v == 4));
      }
    }
  }
}
