// Copyright (c) 2025, The tinyhevc contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License. If
// the BSD 2 Clause License was not distributed with this source code in the
// LICENSE file, you can obtain it at opensource.org/licenses/BSD-2-Clause

use std::error::Error;
use std::fmt;

use crate::array2d::Array2D;
use crate::bitcode::BitWriter;
use crate::cabac::{CabacCoder, ContextSet};
use crate::consts::*;
use crate::predict::*;
use crate::quant::*;
use crate::scan::{scan_type, ScanTables};
use crate::syntax::*;
use crate::txfm::*;
use crate::util::*;

// Fixed NAL-unit bytes surrounding the slice: start codes plus the
// VPS/SPS/PPS payloads up to the point where the picture size is coded.
// These are opaque to the encoder and must be reproduced byte-for-byte.
const HEADER_PREFIX: [u8; 50] = [
  0x00, 0x00, 0x00, 0x01, 0x40, 0x01, 0x0C, 0x01, 0xFF, 0xFF, 0x03, 0x10, 0x00, 0x00, 0x03, 0x00,
  0x00, 0x03, 0x00, 0x00, 0x03, 0x00, 0x00, 0x03, 0x00, 0xB4, 0xF0, 0x24, 0x00, 0x00, 0x01, 0x42,
  0x01, 0x01, 0x03, 0x10, 0x00, 0x00, 0x03, 0x00, 0x00, 0x03, 0x00, 0x00, 0x03, 0x00, 0x00, 0x03,
  0x00, 0xB4,
];

const HEADER_TAIL: [u8; 17] = [
  0x00, 0x00, 0x01, 0x44, 0x01, 0xC1, 0x90, 0x91, 0x81, 0xD9, 0x20, 0x00, 0x00, 0x01, 0x26, 0x01,
  0xAC,
];

// Slice-header bytes selecting the QP delta, indexed by qpd6
const SLICE_QP_BYTES: [[u8; 2]; 5] = [
  [0x16, 0xDE], [0x10, 0xDE], [0x2B, 0x78], [0x4D, 0xE0], [0x97, 0x80],
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodeError {
  // The input, cropped to CTU multiples, is smaller than one CTU
  ImageTooSmall,
}

impl fmt::Display for EncodeError {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match self {
      EncodeError::ImageTooSmall => {
        write!(f, "image is smaller than one {}x{} coding tree unit", CTU_SZ, CTU_SZ)
      }
    }
  }
}

impl Error for EncodeError {}

pub struct EncodedImage {
  pub stream: Box<[u8]>,
  pub recon: Array2D<u8>,
}

// Top-level encoder state
pub struct HevcEncoder {
  // Size used for encoding - cropped down to a multiple of the CTU size
  height: usize,
  width: usize,

  qpd6: usize,
  pmode_cand: usize,
}

impl HevcEncoder {
  // Crops the given size to CTU multiples (capped at 8192x8192) and fails
  // if nothing remains. `qpd6` selects the quantization level, `pmode_cand`
  // the number of intra modes searched per CU after the SAD pre-sort.
  pub fn new(height: usize, width: usize, qpd6: u8, pmode_cand: u8) -> Result<Self, EncodeError> {
    assert!(qpd6 <= 4);
    assert!(1 <= pmode_cand && pmode_cand as usize <= PMODE_COUNT);

    let height = (height.min(MAX_YSZ) / CTU_SZ) * CTU_SZ;
    let width = (width.min(MAX_XSZ) / CTU_SZ) * CTU_SZ;
    if height < CTU_SZ || width < CTU_SZ {
      return Err(EncodeError::ImageTooSmall);
    }

    Ok(Self {
      height: height,
      width: width,
      qpd6: qpd6 as usize,
      pmode_cand: pmode_cand as usize,
    })
  }

  pub fn height(&self) -> usize {
    self.height
  }

  pub fn width(&self) -> usize {
    self.width
  }

  // All stream bytes ahead of the CABAC payload: the fixed NAL prefix, the
  // picture-size continuation of the SPS, the PPS tail, and the slice-header
  // bytes carrying the QP delta
  fn generate_headers(&self) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&HEADER_PREFIX);

    let mut w = BitWriter::new();
    w.write_bits(0x0A, 4);
    w.write_ue(self.width as u32);
    w.write_ue(self.height as u32);
    w.write_bits(0x197EE4, 22);
    w.write_bits(0x707B44, 24);
    out.extend_from_slice(&w.finalize());

    out.extend_from_slice(&HEADER_TAIL);
    out.extend_from_slice(&SLICE_QP_BYTES[self.qpd6]);
    return out;
  }

  // Encode one image. The source must cover at least the cropped size;
  // anything beyond it is ignored. Returns the complete elementary stream
  // and the reconstruction a conforming decoder would produce.
  pub fn encode_image(&self, source: &Array2D<u8>) -> EncodedImage {
    assert!(source.rows() >= self.height);
    assert!(source.cols() >= self.width);

    let mut slice = SliceEncoder {
      encoder: &self,
      cabac: CabacCoder::new(),
      ctxs: ContextSet::new(self.qpd6),
      scans: ScanTables::new(),
      map_cudep: Array2D::zeroed((1 << CUDEP_MAX) + 1, self.width >> LOG2_MIN_CU_SZ),
      map_pmode: Array2D::zeroed((1 << CUDEP_MAX) + 1, self.width >> LOG2_MIN_CU_SZ),
      source: source,
      recon: Array2D::zeroed(self.height, self.width),
      stream: self.generate_headers(),
    };

    slice.encode();

    EncodedImage {
      stream: slice.stream.into_boxed_slice(),
      recon: slice.recon,
    }
  }
}

// Mutable state while encoding the single slice of a picture
struct SliceEncoder<'a> {
  encoder: &'a HevcEncoder,
  cabac: CabacCoder,
  ctxs: ContextSet,
  scans: ScanTables,

  // Per-8x8 CU depth and prediction mode, for the split-flag context and the
  // most-probable-mode derivation. Row 0 carries the bottom edge of the
  // previous CTU row (scrolled in after each row); rows 1..=4 follow the
  // current CTU row, shifted down by one 8-pixel unit.
  map_cudep: Array2D<u8>,
  map_pmode: Array2D<u8>,

  // Source image; may be larger than the cropped encode size
  source: &'a Array2D<u8>,

  // Reconstructed image, written CU by CU as decisions are committed. This
  // is what prediction of later CUs reads its borders from.
  recon: Array2D<u8>,

  // Output stream under construction
  stream: Vec<u8>,
}

impl<'a> SliceEncoder<'a> {
  fn encode(&mut self) {
    let height = self.encoder.height;
    let width = self.encoder.width;

    for ctu_y in (0..height).step_by(CTU_SZ) {
      for ctu_x in (0..width).step_by(CTU_SZ) {
        self.process_cu(ctu_y, ctu_x, 0);

        let last = ctu_y + CTU_SZ >= height && ctu_x + CTU_SZ >= width;
        self.cabac.put_terminate(last);
        // Keep two tail bytes so the emulation-prevention check still sees
        // a possible trailing zero pair
        self.cabac.commit_to(&mut self.stream, 2);
      }

      // scroll the context maps: the bottom edge becomes the new top row
      for x in 0..self.map_cudep.cols() {
        let cudep = self.map_cudep[1 << CUDEP_MAX][x];
        let pmode = self.map_pmode[1 << CUDEP_MAX][x];
        self.map_cudep[0][x] = cudep;
        self.map_pmode[0][x] = pmode;
      }
    }

    self.cabac.finish();
    self.cabac.commit_to(&mut self.stream, 0);
  }

  // Sum of absolute (or squared) differences between the source CU at
  // (y, x) and a candidate block
  fn cu_diff(&self, y: usize, x: usize, other: &Array2D<u8>, square: bool) -> i32 {
    let cu_sz = other.rows();
    let mut sum = 0;
    for i in 0..cu_sz {
      for j in 0..cu_sz {
        let diff = (self.source[y + i][x + j] as i32 - other[i][j] as i32).abs();
        sum += if square { diff * diff } else { diff };
      }
    }
    return sum;
  }

  // Recursively encode the CU at (y, x): rate-distortion-search the intra
  // modes for the undivided CU, try the quad-split below maximum depth, and
  // commit whichever is cheaper. Returns the RD-cost of the committed choice.
  //
  // Speculative encodings run on snapshots of the CABAC coder and contexts;
  // the split branch instead encodes on the live coder, because its children
  // commit themselves during recursion.
  fn process_cu(&mut self, y: usize, x: usize, cudep: usize) -> i32 {
    let cu_sz = cu_size(cudep);
    let qpd6 = self.encoder.qpd6;
    let pmode_cand = self.encoder.pmode_cand;

    let start_bits = self.cabac.len_bits();

    // Neighbour context. Left neighbours read one map row down because the
    // maps are shifted so row 0 can hold the previous CTU row's bottom edge;
    // the above neighbour of a CTU-top CU is exactly that saved edge.
    let map_row = (y % CTU_SZ) >> LOG2_MIN_CU_SZ;
    let map_col = x >> LOG2_MIN_CU_SZ;
    let split_left = x > 0 && cudep < self.map_cudep[map_row + 1][map_col - 1] as usize;
    let split_above = y > 0 && cudep < self.map_cudep[map_row][map_col] as usize;
    let pmode_left = if x == 0 { PMODE_DC } else { self.map_pmode[map_row + 1][map_col - 1] as usize };
    let pmode_above = if y % CTU_SZ == 0 { PMODE_DC } else { self.map_pmode[map_row][map_col] as usize };

    let ub = get_border(&self.recon, y, x, cudep);
    let fb = filter_border(cu_sz, &ub);

    // Cheap SAD pre-sort to narrow the full RDO search to pmode_cand modes
    let modes: Vec<usize> = if pmode_cand < PMODE_COUNT {
      let sad: Vec<i32> = (0..PMODE_COUNT)
        .map(|pmode| self.cu_diff(y, x, &predict(cu_sz, pmode, &ub, &fb), false))
        .collect();
      let mut order: Vec<usize> = (0..PMODE_COUNT).collect();
      order.sort_by_key(|&pmode| sad[pmode]);
      order.truncate(pmode_cand);
      order
    } else {
      (0..PMODE_COUNT).collect()
    };

    let mut rdcost_best = i32::MAX;
    let mut pmode_best = PMODE_DC;
    let mut best_cabac = self.cabac.clone();
    let mut best_ctxs = self.ctxs.clone();
    let mut best_rcon = Array2D::zeroed(cu_sz, cu_sz);

    for &pmode in &modes {
      let pred = predict(cu_sz, pmode, &ub, &fb);
      let resi = Array2D::new_with(cu_sz, cu_sz, |i, j| {
        self.source[y + i][x + j] as i32 - pred[i][j] as i32
      });

      let st = scan_type(cudep, pmode);
      let scan = self.scans.get(cu_sz, st);

      let tran = transform(cu_sz, &resi);
      let quat = rdo_quantize(cu_sz, qpd6, scan, &tran);
      let deqt = dequantize(cu_sz, qpd6, &quat);
      let resr = inv_transform(cu_sz, &deqt);

      let rcon = Array2D::new_with(cu_sz, cu_sz, |i, j| pix_clip(resr[i][j] + pred[i][j] as i32));

      // Speculatively encode the whole CU on a snapshot to measure its
      // exact bit cost
      let mut t_cabac = self.cabac.clone();
      let mut t_ctxs = self.ctxs.clone();
      put_split_flag(&mut t_cabac, &mut t_ctxs, cudep, false, split_left, split_above);
      put_cu(&mut t_cabac, &mut t_ctxs, cudep, pmode, pmode_left, pmode_above, scan, st, &quat);

      let dist = self.cu_diff(y, x, &rcon, true);
      let rdcost = rd_cost(qpd6, dist, t_cabac.len_bits() - start_bits);

      if rdcost_best >= rdcost {
        rdcost_best = rdcost;
        pmode_best = pmode;
        best_cabac = t_cabac;
        best_ctxs = t_ctxs;
        best_rcon = rcon;
      }
    }

    if cudep < CUDEP_MAX {
      put_split_flag(&mut self.cabac, &mut self.ctxs, cudep, true, split_left, split_above);
      let mut rdcost = rd_cost(qpd6, 0, self.cabac.len_bits() - start_bits);

      let half = cu_sz / 2;
      rdcost = rdcost.saturating_add(self.process_cu(y, x, cudep + 1));
      rdcost = rdcost.saturating_add(self.process_cu(y, x + half, cudep + 1));
      rdcost = rdcost.saturating_add(self.process_cu(y + half, x, cudep + 1));
      rdcost = rdcost.saturating_add(self.process_cu(y + half, x + half, cudep + 1));

      if rdcost < rdcost_best {
        // the children already committed their reconstruction and context
        return rdcost;
      }
    }

    // Commit the undivided CU: reconstruction, context maps, coder state
    for i in 0..cu_sz {
      for j in 0..cu_sz {
        self.recon[y + i][x + j] = best_rcon[i][j];
      }
    }
    for i in (0..cu_sz).step_by(1 << LOG2_MIN_CU_SZ) {
      for j in (0..cu_sz).step_by(1 << LOG2_MIN_CU_SZ) {
        let row = (((y + i) % CTU_SZ) >> LOG2_MIN_CU_SZ) + 1;
        let col = (x + j) >> LOG2_MIN_CU_SZ;
        self.map_cudep[row][col] = cudep as u8;
        self.map_pmode[row][col] = pmode_best as u8;
      }
    }
    self.cabac = best_cabac;
    self.ctxs = best_ctxs;

    return rdcost_best;
  }
}
