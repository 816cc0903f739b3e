use crate::consts::*;

// Clip a value to the 8-bit sample range
pub fn pix_clip(v: i32) -> u8 {
  v.clamp(0, 255) as u8
}

// Clip a value to the HEVC transform coefficient range
pub fn coef_clip(v: i32) -> i32 {
  v.clamp(COEF_MIN_VALUE, COEF_MAX_VALUE)
}
