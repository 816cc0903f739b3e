// Copyright (c) 2025, The tinyhevc contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License. If
// the BSD 2 Clause License was not distributed with this source code in the
// LICENSE file, you can obtain it at opensource.org/licenses/BSD-2-Clause

// The HEVC intra-CU syntax, written bin by bin through the CABAC coder:
// split flag, partition size, prediction modes, coded-block flags, the
// last-significant position, and the coefficient groups.

use crate::array2d::Array2D;
use crate::cabac::{CabacCoder, ContextSet};
use crate::consts::*;
use crate::scan::ScanType;

// The split flag is only present above maximum depth; its context counts
// how many of the left/above neighbours are split finer than this CU
pub fn put_split_flag(
  cabac: &mut CabacCoder,
  ctxs: &mut ContextSet,
  cudep: usize,
  split: bool,
  split_left: bool,
  split_above: bool,
) {
  if cudep < CUDEP_MAX {
    let ctx_idx = split_left as usize + split_above as usize;
    cabac.put_bin(split, &mut ctxs.split_flag[ctx_idx]);
  }
}

// Derive the three most probable modes from the neighbouring CUs' modes
pub fn probable_pmodes(pmode_left: usize, pmode_above: usize) -> [usize; 3] {
  if pmode_left != pmode_above {
    let third = if pmode_left != PMODE_PLANAR && pmode_above != PMODE_PLANAR {
      PMODE_PLANAR
    } else if pmode_left + pmode_above < 2 {
      PMODE_VER
    } else {
      PMODE_DC
    };
    [pmode_left, pmode_above, third]
  } else if pmode_left > PMODE_DC {
    // angular neighbours predict their two angular neighbours as well
    [pmode_left, ((pmode_left + 29) % 32) + 2, ((pmode_left - 1) % 32) + 2]
  } else {
    [PMODE_PLANAR, PMODE_DC, PMODE_VER]
  }
}

fn put_y_pmode(
  cabac: &mut CabacCoder,
  ctxs: &mut ContextSet,
  pmode: usize,
  pmode_left: usize,
  pmode_above: usize,
) {
  let pmodes = probable_pmodes(pmode_left, pmode_above);

  for i in 0..3 {
    if pmodes[i] == pmode {
      cabac.put_bin(true, &mut ctxs.y_pmode);
      cabac.put_bins((i > 0) as u32, 1);
      if i > 0 {
        cabac.put_bins((i - 1) as u32, 1);
      }
      return;
    }
  }

  // not an MPM: code the index into the remaining 32 modes
  let mut sorted = pmodes;
  sorted.sort_unstable_by(|a, b| b.cmp(a));

  cabac.put_bin(false, &mut ctxs.y_pmode);
  let mut pmode = pmode;
  for i in 0..3 {
    if pmode > sorted[i] {
      pmode -= 1;
    }
  }
  cabac.put_bins(pmode as u32, 5);
}

// Position of the last significant coefficient: unary-coded group index per
// coordinate (context-coded), then the offset within the group as bypass bins
fn put_last_significant_xy(
  cabac: &mut CabacCoder,
  ctxs: &mut ContextSet,
  cu_sz: usize,
  scan_type: ScanType,
  y: usize,
  x: usize,
) {
  const GROUP_INDEX_TABLE: [u8; 32] = [
    0, 1, 2, 3, 4, 4, 5, 5, 6, 6, 6, 6, 7, 7, 7, 7,
    8, 8, 8, 8, 8, 8, 8, 8, 9, 9, 9, 9, 9, 9, 9, 9,
  ];
  const MIN_IN_GROUP_TABLE: [u8; 10] = [0, 1, 2, 3, 4, 6, 8, 12, 16, 24];

  let log2_cu_sz_m2 = cu_sz.ilog2() as usize - 2;
  let (ty, tx) = if scan_type == ScanType::Ver { (x, y) } else { (y, x) };
  let gy = GROUP_INDEX_TABLE[ty] as usize;
  let gx = GROUP_INDEX_TABLE[tx] as usize;

  let offset = log2_cu_sz_m2 * 3 + ((log2_cu_sz_m2 + 1) >> 2);
  let shift = (log2_cu_sz_m2 + 3) >> 2;
  let g_max = GROUP_INDEX_TABLE[cu_sz - 1] as usize;

  for i in 0..gx {
    cabac.put_bin(true, &mut ctxs.last_x[0][offset + (i >> shift)]);
  }
  if gx < g_max {
    cabac.put_bin(false, &mut ctxs.last_x[0][offset + (gx >> shift)]);
  }

  for i in 0..gy {
    cabac.put_bin(true, &mut ctxs.last_y[0][offset + (i >> shift)]);
  }
  if gy < g_max {
    cabac.put_bin(false, &mut ctxs.last_y[0][offset + (gy >> shift)]);
  }

  if gx > 3 {
    let tx = tx - MIN_IN_GROUP_TABLE[gx] as usize;
    for i in (0..((gx - 2) >> 1)).rev() {
      cabac.put_bins((tx >> i) as u32 & 1, 1);
    }
  }

  if gy > 3 {
    let ty = ty - MIN_IN_GROUP_TABLE[gy] as usize;
    for i in (0..((gy - 2) >> 1)).rev() {
      cabac.put_bins((ty >> i) as u32 & 1, 1);
    }
  }
}

// Context index for one significance bin, from the position within its
// coefficient group and the significance of the neighbouring groups
fn sig_ctx_idx(log2_cu_sz_m2: usize, scan_type: ScanType, y: usize, x: usize, sig_ctx: u8) -> usize {
  const SIG_CTX_BASE: [[u8; 4]; 3] = [
    // TU size:  4   8  16  32
    [0, 9, 21, 21],  // diagonal scan
    [0, 15, 21, 21], // horizontal scan
    [0, 15, 21, 21], // vertical scan
  ];
  const CTX_OFFSET_4X4: [[u8; 4]; 4] = [[0, 1, 4, 5], [2, 3, 4, 5], [6, 6, 8, 8], [7, 7, 8, 8]];
  const CTX_IDX_1: [u8; 7] = [2, 1, 1, 0, 0, 0, 0];
  const CTX_IDX_2: [u8; 4] = [2, 1, 0, 0];

  let y_in_cg = y % CG_SZ;
  let x_in_cg = x % CG_SZ;
  let scan_row = match scan_type {
    ScanType::Diag => 0,
    ScanType::Hor => 1,
    ScanType::Ver => 2,
  };

  let mut ctx_idx = SIG_CTX_BASE[scan_row][log2_cu_sz_m2] as usize;

  if y == 0 && x == 0 {
    // dedicated DC context
    ctx_idx = 0;
  } else if log2_cu_sz_m2 == 0 {
    ctx_idx += CTX_OFFSET_4X4[y][x] as usize;
  } else {
    ctx_idx += match sig_ctx {
      0 => CTX_IDX_1[y_in_cg + x_in_cg] as usize,
      1 => CTX_IDX_2[y_in_cg] as usize,
      2 => CTX_IDX_2[x_in_cg] as usize,
      _ => 2,
    };
    if y / CG_SZ != 0 || x / CG_SZ != 0 {
      ctx_idx += 3; // luma, beyond the first coefficient group
    }
  }

  return ctx_idx;
}

// Bypass-coded Exp-Golomb escape for coefficient magnitudes beyond what the
// level flags can carry, with Rice parameter `rparam`
fn put_remain_exgolomb(cabac: &mut CabacCoder, value: i32, rparam: i32) {
  if value < (3 << rparam) {
    let len = value >> rparam;
    cabac.put_bins((1 << (len + 1)) - 2, (len + 1) as u32);
    cabac.put_bins((value % (1 << rparam)) as u32, rparam as u32);
  } else {
    let mut len = rparam;
    let mut value = value - (3 << rparam);
    while value >= (1 << len) {
      value -= 1 << len;
      len += 1;
    }
    let prefix = 4 + len - rparam;
    cabac.put_bins((1u32 << prefix) - 2, prefix as u32);
    cabac.put_bins(value as u32, len as u32);
  }
}

// Code the quantized coefficients of one (luma) CU
fn put_coef(
  cabac: &mut CabacCoder,
  ctxs: &mut ContextSet,
  cu_sz: usize,
  scan: &[(u8, u8)],
  scan_type: ScanType,
  quat: &Array2D<i32>,
) {
  let log2_cu_sz_m2 = cu_sz.ilog2() as usize - 2;
  let n_cg_side = cu_sz / CG_SZ;

  // Per-CG significance map and the last significant position in scan order
  let mut sig_map = [[false; CTU_SZ / CG_SZ]; CTU_SZ / CG_SZ];
  sig_map[0][0] = true;

  let mut i_last = 0;
  for i in 0..cu_sz * cu_sz {
    let (y, x) = scan[i];
    if quat[y as usize][x as usize] != 0 {
      sig_map[y as usize / CG_SZ][x as usize / CG_SZ] = true;
      i_last = i;
    }
  }

  let (last_y, last_x) = scan[i_last];
  put_last_significant_xy(cabac, ctxs, cu_sz, scan_type, last_y as usize, last_x as usize);

  let i_cg_last = i_last / CG_SZXSZ;
  let mut c1: i32 = 1;

  for i_cg in (0..=i_cg_last).rev() {
    let y_cg = scan[i_cg * CG_SZXSZ].0 as usize / CG_SZ;
    let x_cg = scan[i_cg * CG_SZXSZ].1 as usize / CG_SZ;

    let mut arr_abs_nz = [0i32; CG_SZXSZ];
    let mut i_nz = 0usize;
    let mut signs: u32 = 0;
    let mut i_in_cg_diff = 0i32;
    let mut i_in_cg_last = -1i32;

    let mut sig_ctx: u8 = 0;
    if x_cg < n_cg_side - 1 && sig_map[y_cg][x_cg + 1] {
      sig_ctx |= 1;
    }
    if y_cg < n_cg_side - 1 && sig_map[y_cg + 1][x_cg] {
      sig_ctx |= 2;
    }

    if i_cg != 0 && i_cg != i_cg_last {
      cabac.put_bin(sig_map[y_cg][x_cg], &mut ctxs.cg_sig[(sig_ctx != 0) as usize]);
    }

    if sig_map[y_cg][x_cg] {
      for i_in_cg in (0..CG_SZXSZ).rev() {
        let i = i_cg * CG_SZXSZ + i_in_cg;
        let (y, x) = scan[i];
        let (y, x) = (y as usize, x as usize);
        let sig = quat[y][x] != 0;

        // The last significant coefficient is implied, and the first
        // position of a trailing all-zero-so-far CG is inferred from the
        // CG significance flag
        if i < i_last && (i_in_cg > 0 || i_cg == 0 || i_nz != 0) {
          let ctx_idx = sig_ctx_idx(log2_cu_sz_m2, scan_type, y, x, sig_ctx);
          cabac.put_bin(sig, &mut ctxs.sig[ctx_idx]);
        }

        if sig {
          arr_abs_nz[i_nz] = quat[y][x].abs();
          i_nz += 1;
          signs <<= 1;
          if quat[y][x] < 0 {
            signs |= 1;
          }
          if i_in_cg_last < 0 {
            i_in_cg_last = i_in_cg as i32;
          }
          i_in_cg_diff = i_in_cg_last - i_in_cg as i32;
        }
      }
    }

    if i_nz > 0 {
      let ctx_set = (if i_cg > 0 { 2 } else { 0 }) + (c1 == 0) as usize;
      let mut escape_flag = i_nz > 8;
      let mut idx_first_c2 = -1i32;
      c1 = 1;

      // greater-than-1 flags for up to the first 8 levels
      for i in 0..i_nz.min(8) {
        let flag = arr_abs_nz[i] > 1;
        cabac.put_bin(flag, &mut ctxs.one_flag[4 * ctx_set + c1 as usize]);
        if flag {
          c1 = 0;
          if idx_first_c2 == -1 {
            idx_first_c2 = i as i32;
          } else {
            escape_flag = true;
          }
        } else if c1 > 0 && c1 < 3 {
          c1 += 1;
        }
      }

      // one greater-than-2 flag for the first level that was >1
      if c1 == 0 && idx_first_c2 != -1 {
        let flag = arr_abs_nz[idx_first_c2 as usize] > 2;
        cabac.put_bin(flag, &mut ctxs.abs_flag[ctx_set]);
        escape_flag |= flag;
      }

      if i_in_cg_diff >= 4 {
        // the first sign is hidden in the level-sum parity
        cabac.put_bins(signs >> 1, i_nz as u32 - 1);
      } else {
        cabac.put_bins(signs, i_nz as u32);
      }

      if escape_flag {
        let mut first_coeff2 = 1;
        let mut gorice_param = 0;
        for i in 0..i_nz {
          let base_level = if i < 8 { 2 + first_coeff2 } else { 1 };
          let escape_value = arr_abs_nz[i] - base_level;
          if arr_abs_nz[i] >= 2 {
            first_coeff2 = 0;
          }
          if escape_value >= 0 {
            put_remain_exgolomb(cabac, escape_value, gorice_param);
            if arr_abs_nz[i] > (3 << gorice_param) {
              gorice_param = (gorice_param + 1).min(4);
            }
          }
        }
      }
    }
  }
}

// The complete CU payload that follows the split flag
pub fn put_cu(
  cabac: &mut CabacCoder,
  ctxs: &mut ContextSet,
  cudep: usize,
  pmode: usize,
  pmode_left: usize,
  pmode_above: usize,
  scan: &[(u8, u8)],
  scan_type: ScanType,
  quat: &Array2D<i32>,
) {
  let cu_sz = cu_size(cudep);

  let mut y_cbf = false;
  for i in 0..cu_sz {
    if quat[i].iter().any(|&v| v != 0) {
      y_cbf = true;
      break;
    }
  }

  // partition size is only signalled at maximum depth (always 2Nx2N)
  if cudep == CUDEP_MAX {
    cabac.put_bin(true, &mut ctxs.part_size);
  }

  put_y_pmode(cabac, ctxs, pmode, pmode_left, pmode_above);

  // chroma always inherits the luma mode
  cabac.put_bin(false, &mut ctxs.uv_pmode);

  // no chroma residual is ever coded; luma CBF comes last
  cabac.put_bin(false, &mut ctxs.uv_cbf);
  cabac.put_bin(false, &mut ctxs.uv_cbf);
  cabac.put_bin(y_cbf, &mut ctxs.y_cbf);

  if y_cbf {
    put_coef(cabac, ctxs, cu_sz, scan, scan_type, quat);
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn mpm_from_distinct_neighbours() {
    assert_eq!(probable_pmodes(0, 1), [0, 1, 26]);
    assert_eq!(probable_pmodes(5, 7), [5, 7, 0]);
    assert_eq!(probable_pmodes(0, 17), [0, 17, 1]);
  }

  #[test]
  fn mpm_from_matching_angular_neighbours() {
    // An angular mode predicts itself and its two angular neighbours,
    // wrapping within 2..=33
    assert_eq!(probable_pmodes(10, 10), [10, 9, 11]);
    assert_eq!(probable_pmodes(2, 2), [2, 33, 3]);
    assert_eq!(probable_pmodes(34, 34), [34, 33, 3]);
  }

  #[test]
  fn mpm_default_triplet() {
    assert_eq!(probable_pmodes(1, 1), [0, 1, 26]);
    assert_eq!(probable_pmodes(0, 0), [0, 1, 26]);
  }

  #[test]
  fn exgolomb_bin_counts() {
    // value < 3<<k: unary prefix of len+1 bins plus k suffix bins;
    // larger values grow the prefix by two bins per doubling
    let mut cabac = CabacCoder::new();
    put_remain_exgolomb(&mut cabac, 0, 0);
    assert_eq!(cabac.len_bits(), 1);

    let mut cabac = CabacCoder::new();
    put_remain_exgolomb(&mut cabac, 2, 0);
    assert_eq!(cabac.len_bits(), 3);

    let mut cabac = CabacCoder::new();
    put_remain_exgolomb(&mut cabac, 3, 0);
    assert_eq!(cabac.len_bits(), 4);

    let mut cabac = CabacCoder::new();
    put_remain_exgolomb(&mut cabac, 4, 1);
    assert_eq!(cabac.len_bits(), 4);
  }

  #[test]
  fn sig_ctx_has_a_dedicated_dc_slot() {
    assert_eq!(sig_ctx_idx(1, ScanType::Diag, 0, 0, 0), 0);
    // position (0,1) in the first CG of an 8x8, no significant neighbours:
    // base 9 + CTX_IDX_1[1] = 10
    assert_eq!(sig_ctx_idx(1, ScanType::Diag, 0, 1, 0), 10);
    // same position in a later CG adds the luma offset of 3
    assert_eq!(sig_ctx_idx(1, ScanType::Diag, 4, 5, 0), 9 + 1 + 3);
  }
}
