// Copyright (c) 2025, The tinyhevc contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License. If
// the BSD 2 Clause License was not distributed with this source code in the
// LICENSE file, you can obtain it at opensource.org/licenses/BSD-2-Clause

// Intra prediction: border acquisition from the reconstructed image, border
// smoothing, and the 35 HEVC luma predictors (planar, DC, 33 angular).

use crate::array2d::Array2D;
use crate::consts::*;
use crate::util::*;

// Reference samples around a CU: the left-above corner sample, the left plus
// left-below column, and the above plus above-right row.
#[derive(Clone)]
pub struct Borders {
  pub bla: u8,
  pub bllb: [u8; CTU_SZ * 2],
  pub baar: [u8; CTU_SZ * 2],
}

// Read a sample with coordinates clamped into the image, so border fetches
// past the bottom/right edge repeat the outermost reconstructed sample
fn sample(img: &Array2D<u8>, y: isize, x: isize) -> u8 {
  let y = y.clamp(0, img.rows() as isize - 1) as usize;
  let x = x.clamp(0, img.cols() as isize - 1) as usize;
  img[y][x]
}

// Gather the border samples of the CU at (y, x) from the reconstructed
// image. Whether the left-below and above-right extensions have been
// reconstructed yet depends on the CU's position within its CTU; missing
// regions fall back to the nearest available sample, the opposite border,
// or mid-gray.
pub fn get_border(rcon: &Array2D<u8>, y: usize, x: usize, cudep: usize) -> Borders {
  let cu_sz = cu_size(cudep);
  let y_cu_in_ctu = (y % CTU_SZ) / cu_sz;
  let x_cu_in_ctu = (x % CTU_SZ) / cu_sz;

  let bll_exist = x > 0;
  let blb_exist = bll_exist && (y + cu_sz < rcon.rows()) && CU_BLB_EXIST[cudep][y_cu_in_ctu][x_cu_in_ctu];
  let baa_exist = y > 0;
  let bar_exist = baa_exist && (x + cu_sz < rcon.cols()) && CU_BAR_EXIST[cudep][y_cu_in_ctu][x_cu_in_ctu];

  let yi = y as isize;
  let xi = x as isize;

  let bla = if bll_exist && baa_exist {
    sample(rcon, yi - 1, xi - 1)
  } else if bll_exist {
    sample(rcon, yi, xi - 1)
  } else if baa_exist {
    sample(rcon, yi - 1, xi)
  } else {
    PIX_MIDDLE_VALUE
  };

  let mut bllb = [0u8; CTU_SZ * 2];
  let mut baar = [0u8; CTU_SZ * 2];

  for i in 0..cu_sz {
    bllb[i] = if bll_exist { sample(rcon, yi + i as isize, xi - 1) } else { bla };
  }
  for i in cu_sz..cu_sz * 2 {
    bllb[i] = if blb_exist { sample(rcon, yi + i as isize, xi - 1) } else { bllb[cu_sz - 1] };
  }
  for i in 0..cu_sz {
    baar[i] = if baa_exist { sample(rcon, yi - 1, xi + i as isize) } else { bla };
  }
  for i in cu_sz..cu_sz * 2 {
    baar[i] = if bar_exist { sample(rcon, yi - 1, xi + i as isize) } else { baar[cu_sz - 1] };
  }

  Borders { bla: bla, bllb: bllb, baar: baar }
}

// Smooth the borders with the [1,2,1]/4 filter; the far ends keep their
// values and the corner mixes both neighbouring borders
pub fn filter_border(cu_sz: usize, ub: &Borders) -> Borders {
  let mut fb = Borders {
    bla: ((2 + ub.bllb[0] as u32 + ub.baar[0] as u32 + 2 * ub.bla as u32) >> 2) as u8,
    bllb: [0u8; CTU_SZ * 2],
    baar: [0u8; CTU_SZ * 2],
  };

  fb.bllb[0] = ((2 + 2 * ub.bllb[0] as u32 + ub.bllb[1] as u32 + ub.bla as u32) >> 2) as u8;
  fb.baar[0] = ((2 + 2 * ub.baar[0] as u32 + ub.baar[1] as u32 + ub.bla as u32) >> 2) as u8;

  for i in 1..cu_sz * 2 - 1 {
    fb.bllb[i] = ((2 + 2 * ub.bllb[i] as u32 + ub.bllb[i - 1] as u32 + ub.bllb[i + 1] as u32) >> 2) as u8;
    fb.baar[i] = ((2 + 2 * ub.baar[i] as u32 + ub.baar[i - 1] as u32 + ub.baar[i + 1] as u32) >> 2) as u8;
  }

  fb.bllb[cu_sz * 2 - 1] = ub.bllb[cu_sz * 2 - 1];
  fb.baar[cu_sz * 2 - 1] = ub.baar[cu_sz * 2 - 1];

  return fb;
}

// Produce the cu_sz x cu_sz prediction for one mode. `ub`/`fb` are the
// unfiltered and filtered borders; a per-(size, mode) table picks which
// one each mode reads.
pub fn predict(cu_sz: usize, pmode: usize, ub: &Borders, fb: &Borders) -> Array2D<u8> {
  let log2_cu_sz = cu_sz.ilog2() as usize;
  let filter_edge = cu_sz <= 16;
  let use_filtered = BORDER_FILTER_TABLE[log2_cu_sz - 2][pmode];
  let b = if use_filtered { fb } else { ub };
  let (bla, bllb, baar) = (b.bla, &b.bllb, &b.baar);

  let mut pred = Array2D::zeroed(cu_sz, cu_sz);

  if pmode == PMODE_PLANAR {
    for i in 0..cu_sz {
      for j in 0..cu_sz {
        let hor = (cu_sz - j - 1) as i32 * bllb[i] as i32 + (j + 1) as i32 * baar[cu_sz] as i32;
        let ver = (cu_sz - i - 1) as i32 * baar[j] as i32 + (i + 1) as i32 * bllb[cu_sz] as i32;
        pred[i][j] = ((cu_sz as i32 + hor + ver) >> (log2_cu_sz + 1)) as u8;
      }
    }

  } else if pmode == PMODE_DC {
    let mut dc_pix = cu_sz as i32;
    for i in 0..cu_sz {
      dc_pix += bllb[i] as i32 + baar[i] as i32;
    }
    dc_pix >>= log2_cu_sz + 1;

    for i in 0..cu_sz {
      for j in 0..cu_sz {
        pred[i][j] = dc_pix as u8;
      }
    }

    if filter_edge {
      pred[0][0] = ((2 + 2 * dc_pix + bllb[0] as i32 + baar[0] as i32) >> 2) as u8;
      for i in 1..cu_sz {
        pred[0][i] = ((2 + 3 * dc_pix + baar[i] as i32) >> 2) as u8;
        pred[i][0] = ((2 + 3 * dc_pix + bllb[i] as i32) >> 2) as u8;
      }
    }

  } else if pmode == PMODE_HOR {
    for i in 0..cu_sz {
      for j in 0..cu_sz {
        pred[i][j] = bllb[i];
      }
    }

    if filter_edge {
      for j in 0..cu_sz {
        let bias = (baar[j] as i32 - bla as i32) >> 1;
        pred[0][j] = pix_clip(bias + pred[0][j] as i32);
      }
    }

  } else if pmode == PMODE_VER {
    for i in 0..cu_sz {
      for j in 0..cu_sz {
        pred[i][j] = baar[j];
      }
    }

    if filter_edge {
      for i in 0..cu_sz {
        let bias = (bllb[i] as i32 - bla as i32) >> 1;
        pred[i][0] = pix_clip(bias + pred[i][0] as i32);
      }
    }

  } else {
    // Angular. The prediction direction selects which border is the main
    // reference; the other border is projected onto its extension below
    // index 0 via the inverse angle.
    let is_horizontal = pmode < PMODE_DEG135;
    let angle = ANGLE_TABLE[pmode];
    let abs_inv_angle = ABS_INV_ANGLE_TABLE[pmode];

    let bmain: &[u8] = if is_horizontal { bllb } else { baar };
    let bside: &[u8] = if is_horizontal { baar } else { bllb };

    // 1-D reference array, centered so indices -2*cu_sz..=2*cu_sz are valid
    let mut ref_buf = [0u8; CTU_SZ * 4 + 1];
    let base = (CTU_SZ * 2) as isize;
    let r = |i: isize| (base + i) as usize;

    ref_buf[r(0)] = bla;
    for i in 0..cu_sz * 2 {
      ref_buf[r(1 + i as isize)] = bside[i];
    }
    let limit = (cu_sz as i32 * angle) >> 5;
    let mut i = -1i32;
    while i > limit {
      let j = (128 - abs_inv_angle * i) >> 8;
      ref_buf[r(i as isize)] = ref_buf[r(j as isize)];
      i -= 1;
    }
    for i in 0..cu_sz * 2 {
      ref_buf[r(1 + i as isize)] = bmain[i];
    }

    for i in 0..cu_sz {
      let off = angle * (i as i32 + 1);
      let off_i = (off >> 5) as isize;
      let off_f = off & 0x1f;
      for j in 0..cu_sz {
        let pix1 = ref_buf[r(off_i + j as isize + 1)] as i32;
        let pix2 = ref_buf[r(off_i + j as isize + 2)] as i32;
        let pix = (((32 - off_f) * pix1 + off_f * pix2 + 16) >> 5) as u8;
        if is_horizontal {
          pred[j][i] = pix;
        } else {
          pred[i][j] = pix;
        }
      }
    }
  }

  return pred;
}

#[cfg(test)]
mod tests {
  use super::*;

  fn flat_borders(v: u8) -> Borders {
    Borders { bla: v, bllb: [v; CTU_SZ * 2], baar: [v; CTU_SZ * 2] }
  }

  #[test]
  fn no_neighbours_predicts_mid_gray_everywhere() {
    // A CU in the image corner has no reconstructed neighbours, so the
    // borders degrade to the constant 128 and every mode predicts flat gray
    let rcon = Array2D::<u8>::zeroed(CTU_SZ, CTU_SZ);
    let ub = get_border(&rcon, 0, 0, 0);
    assert_eq!(ub.bla, 128);
    assert!(ub.bllb.iter().all(|&p| p == 128));
    assert!(ub.baar.iter().all(|&p| p == 128));

    let fb = filter_border(CTU_SZ, &ub);
    for pmode in 0..PMODE_COUNT {
      let pred = predict(CTU_SZ, pmode, &ub, &fb);
      for i in 0..CTU_SZ {
        assert!(pred[i].iter().all(|&p| p == 128), "mode {} row {}", pmode, i);
      }
    }
  }

  #[test]
  fn dc_is_the_border_mean() {
    let mut ub = flat_borders(0);
    // left column all 40, top row all 80 (an 8x8 CU reads 8 of each)
    for i in 0..16 {
      ub.bllb[i] = 40;
      ub.baar[i] = 80;
    }
    ub.bla = 60;
    let fb = filter_border(8, &ub);
    let pred = predict(8, PMODE_DC, &ub, &fb);
    // mean = (8 + 8*40 + 8*80) >> 4 = 60; interior stays unfiltered
    assert_eq!(pred[3][3], 60);
    // top row (past the corner) gets the [3,1]/4 filter against baar
    assert_eq!(pred[0][3], ((2 + 3 * 60 + 80) >> 2) as u8);
    // left column gets the [3,1]/4 filter against bllb
    assert_eq!(pred[3][0], ((2 + 3 * 60 + 40) >> 2) as u8);
    // the corner mixes both borders
    assert_eq!(pred[0][0], ((2 + 2 * 60 + 40 + 80) >> 2) as u8);
  }

  #[test]
  fn vertical_replicates_the_top_row() {
    let mut rcon = Array2D::<u8>::zeroed(CTU_SZ, CTU_SZ);
    let top = [10u8, 20, 30, 40, 50, 60, 70, 80];
    for j in 0..8 {
      rcon[7][8 + j] = top[j];
    }
    // flat left column so the edge bias is zero
    rcon[7][7] = 50;
    for i in 0..8 {
      rcon[8 + i][7] = 50;
    }

    let ub = get_border(&rcon, 8, 8, 2);
    assert_eq!(&ub.baar[..8], &top);
    let fb = filter_border(8, &ub);
    let pred = predict(8, PMODE_VER, &ub, &fb);
    for i in 0..8 {
      for j in 1..8 {
        assert_eq!(pred[i][j], top[j]);
      }
      assert_eq!(pred[i][0], pix_clip(((50 - 50) >> 1) + top[0] as i32));
    }
  }

  #[test]
  fn horizontal_replicates_the_left_column() {
    let mut rcon = Array2D::<u8>::zeroed(CTU_SZ, CTU_SZ);
    let left = [15u8, 25, 35, 45, 55, 65, 75, 85];
    for i in 0..8 {
      rcon[8 + i][7] = left[i];
    }
    rcon[7][7] = 90;
    for j in 0..8 {
      rcon[7][8 + j] = 90;
    }

    let ub = get_border(&rcon, 8, 8, 2);
    assert_eq!(&ub.bllb[..8], &left);
    let fb = filter_border(8, &ub);
    let pred = predict(8, PMODE_HOR, &ub, &fb);
    for i in 1..8 {
      for j in 0..8 {
        assert_eq!(pred[i][j], left[i]);
      }
    }
  }

  #[test]
  fn unavailable_left_below_repeats_the_last_left_sample() {
    // CU at the bottom-right of a CTU: neither extension is reconstructed
    let mut rcon = Array2D::<u8>::zeroed(CTU_SZ * 2, CTU_SZ * 2);
    for i in 0..64 {
      for j in 0..64 {
        rcon[i][j] = (i * 3 + j) as u8;
      }
    }
    let ub = get_border(&rcon, 24, 24, 2);
    assert!(ub.bllb[8..].iter().all(|&p| p == ub.bllb[7]));
    assert!(ub.baar[8..].iter().all(|&p| p == ub.baar[7]));
  }
}
