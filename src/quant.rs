// Copyright (c) 2025, The tinyhevc contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License. If
// the BSD 2 Clause License was not distributed with this source code in the
// LICENSE file, you can obtain it at opensource.org/licenses/BSD-2-Clause

// Rate-distortion-optimized quantization with sign-bit hiding, the matching
// dequantizer, and the saturating RD-cost combiner used by the whole encoder.

use crate::array2d::Array2D;
use crate::consts::*;
use crate::util::*;

// Distortion/bit weights per quantization level; together they set the
// effective lambda of the search
const RDCOST_WEIGHT_DIST: [i32; 5] = [11, 11, 11, 5, 1];
const RDCOST_WEIGHT_BITS: [i32; 5] = [1, 4, 16, 29, 23];

// Combine distortion and bits, saturating at i32::MAX instead of wrapping
pub fn rd_cost(qpd6: usize, dist: i32, bits: i32) -> i32 {
  let weight_dist = RDCOST_WEIGHT_DIST[qpd6];
  let weight_bits = RDCOST_WEIGHT_BITS[qpd6];
  let cost1 = if i32::MAX / weight_dist <= dist { i32::MAX } else { weight_dist * dist };
  let cost2 = if i32::MAX / weight_bits <= bits { i32::MAX } else { weight_bits * bits };
  if i32::MAX - cost1 <= cost2 {
    i32::MAX
  } else {
    cost1 + cost2
  }
}

// Fixed-point rate model for one quantized level: levels 0..2 cost a flat
// amount, larger levels grow like the Exp-Golomb escape code that will
// eventually encode them
fn ic_rate(level: i32) -> i32 {
  if level >= 3 {
    let mut level = level - 3;
    if level < 3 {
      92000 + ((level + 1) << 15)
    } else {
      let mut length = 0;
      level -= 3;
      while level >= (1 << length) {
        level -= 1 << length;
        length += 1;
      }
      92000 + ((3 + length * 2 + 1) << 15)
    }
  } else if level == 2 {
    90000
  } else if level == 1 {
    70000
  } else {
    0
  }
}

// Quantize a transformed CU. Per coefficient, the nominal level and its two
// lower neighbours are scored with the rate model and the cheapest wins.
// Whole trailing coefficient groups with a tiny magnitude sum are zeroed,
// and one sign bit per group is hidden in the level-sum parity where the
// group's nonzero span allows it.
pub fn rdo_quantize(cu_sz: usize, qpd6: usize, scan: &[(u8, u8)], tran: &Array2D<i32>) -> Array2D<i32> {
  let log2_cu_sz = cu_sz.ilog2();
  let iq_bits = 21 + qpd6 as u32 - log2_cu_sz;
  let iq_value = (1i32 << iq_bits) >> 1;
  let max_dlevel = i32::MAX - iq_value;
  let dist_sft1 = 10 - log2_cu_sz;
  let dist_sft2 = 7;

  let mut quat = Array2D::zeroed(cu_sz, cu_sz);

  for y in 0..cu_sz {
    for x in 0..cu_sz {
      let absval = tran[y][x].abs();
      let dlevel = if absval > 0x1ffff { max_dlevel } else { ((absval & 0x1ffff) << 14).min(max_dlevel) };
      let mut level = ((dlevel + iq_value) >> iq_bits).min(COEF_MAX_VALUE);
      let min_level = (level - 2).max(0);
      let mut best_cost = i32::MAX;
      let mut best_level = 0;

      while level >= min_level {
        let dist1 = (dlevel - (level << iq_bits)).abs() >> dist_sft1;
        let dist = if dist1 < 46340 { dist1 * dist1 } else { i32::MAX };
        let cost = rd_cost(qpd6, dist >> dist_sft2, ic_rate(level));
        if cost < best_cost {
          best_cost = cost;
          best_level = level;
        }
        level -= 1;
      }

      quat[y][x] = if tran[y][x] < 0 { -best_level } else { best_level };
    }
  }

  // Zero out trailing CGs whose magnitude sum is negligible, walking the
  // scan in reverse until the first CG worth keeping
  let mut sum_abs = 0;
  for i_cg in (0..cu_sz * cu_sz / CG_SZXSZ).rev() {
    let mut sum_abs_cg = 0;
    for i_in_cg in 0..CG_SZXSZ {
      let (y, x) = scan[i_cg * CG_SZXSZ + i_in_cg];
      sum_abs_cg += quat[y as usize][x as usize].abs();
    }
    if sum_abs <= 0 && sum_abs_cg <= 2 {
      for i_in_cg in 0..CG_SZXSZ {
        let (y, x) = scan[i_cg * CG_SZXSZ + i_in_cg];
        quat[y as usize][x as usize] = 0;
      }
    } else {
      sum_abs += sum_abs_cg;
    }
  }

  if sum_abs >= 2 {
    // Sign-bit hiding: where a CG's first and last nonzero positions are at
    // least 4 apart, the decoder infers the first sign from the parity of
    // the level sum, so force the parity to match by nudging the last level
    // toward zero.
    let mut nonzero_cg_seen = false;

    for i_cg in (0..cu_sz * cu_sz / CG_SZXSZ).rev() {
      let mut i_in_cg_first = -1i32;
      let mut i_in_cg_diff = 0;
      let mut y_last = 0usize;
      let mut x_last = 0usize;
      let mut lsb = 0i32;

      for i_in_cg in 0..CG_SZXSZ {
        let (y, x) = scan[i_cg * CG_SZXSZ + i_in_cg];
        let (y, x) = (y as usize, x as usize);

        lsb ^= quat[y][x] & 1;

        if quat[y][x] != 0 {
          if i_in_cg_first < 0 {
            i_in_cg_first = i_in_cg as i32;
            if quat[y][x] < 0 {
              lsb ^= 1;
            }
          }
          i_in_cg_diff = i_in_cg as i32 - i_in_cg_first;
        }

        if quat[y][x] != 0 || nonzero_cg_seen {
          y_last = y;
          x_last = x;
        }
      }

      if i_in_cg_first >= 0 {
        nonzero_cg_seen = true;
      }

      if lsb != 0 && i_in_cg_diff >= 4 {
        quat[y_last][x_last] += if tran[y_last][x_last] < 0 { 1 } else { -1 };
      }
    }
  }

  return quat;
}

// Scale levels back to coefficients; the shift is the whole inverse-quant step
pub fn dequantize(cu_sz: usize, qpd6: usize, quat: &Array2D<i32>) -> Array2D<i32> {
  let sft = 7 + qpd6 as u32 - cu_sz.ilog2();
  Array2D::new_with(cu_sz, cu_sz, |i, j| coef_clip(quat[i][j] << sft))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::scan::{ScanTables, ScanType};

  #[test]
  fn rate_model_fixed_points() {
    assert_eq!(ic_rate(0), 0);
    assert_eq!(ic_rate(1), 70000);
    assert_eq!(ic_rate(2), 90000);
    assert_eq!(ic_rate(3), 92000 + (1 << 15));
    assert_eq!(ic_rate(4), 92000 + (2 << 15));
    assert_eq!(ic_rate(6), 92000 + (4 << 15));
  }

  #[test]
  fn rd_cost_saturates() {
    assert_eq!(rd_cost(0, i32::MAX, 0), i32::MAX);
    assert_eq!(rd_cost(4, 0, i32::MAX), i32::MAX);
    assert_eq!(rd_cost(2, 10, 3), 11 * 10 + 16 * 3);
  }

  #[test]
  fn exact_multiple_quantizes_without_loss() {
    // 512 in an 8x8 at qpd6=0 sits exactly on level 32 (zero distortion),
    // and dequantizes back to 512
    let tables = ScanTables::new();
    let scan = tables.get(8, ScanType::Diag);

    let mut tran = Array2D::zeroed(8, 8);
    tran[0][0] = 512;
    let quat = rdo_quantize(8, 0, scan, &tran);
    assert_eq!(quat[0][0], 32);
    assert!(quat[1].iter().all(|&v| v == 0));

    let deqt = dequantize(8, 0, &quat);
    assert_eq!(deqt[0][0], 512);
  }

  #[test]
  fn negligible_trailing_groups_are_zeroed() {
    // A lone level-1 coefficient is dropped by the trailing-CG sweep
    let tables = ScanTables::new();
    let scan = tables.get(8, ScanType::Diag);

    let mut tran = Array2D::zeroed(8, 8);
    tran[0][0] = 16; // quantizes to 1 at qpd6=0
    let quat = rdo_quantize(8, 0, scan, &tran);
    for i in 0..8 {
      assert!(quat[i].iter().all(|&v| v == 0));
    }
  }

  #[test]
  fn sign_bit_hiding_fixes_parity() {
    // Levels 5 and 4 in the first CG, 5 scan positions apart: parity is odd
    // and the span allows hiding, so the last level is pulled toward zero
    let tables = ScanTables::new();
    let scan = tables.get(8, ScanType::Diag);

    let mut tran = Array2D::zeroed(8, 8);
    tran[0][0] = 80; // scan index 0, level 5
    tran[0][2] = 64; // scan index 5, level 4
    let quat = rdo_quantize(8, 0, scan, &tran);
    assert_eq!(quat[0][0], 5);
    assert_eq!(quat[0][2], 3);
  }

  #[test]
  fn negative_input_keeps_its_sign() {
    let tables = ScanTables::new();
    let scan = tables.get(8, ScanType::Diag);

    let mut tran = Array2D::zeroed(8, 8);
    tran[0][0] = -512;
    tran[2][0] = 512; // scan index 3, keeps the CG from being zeroed alone
    let quat = rdo_quantize(8, 0, scan, &tran);
    assert_eq!(quat[0][0], -32);
    assert_eq!(quat[2][0], 32);
  }
}
