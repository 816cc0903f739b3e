// A small single-frame H.265/HEVC intra encoder for 8-bit grayscale images.
// The pipeline is the classic one: recursive coding-tree partitioning with
// rate-distortion-optimized intra mode selection, integer DCT, RDO
// quantization with sign-bit hiding, and a CABAC coder producing a stream
// any conforming HEVC decoder accepts.

pub mod array2d;
pub mod bitcode;
pub mod cabac;
pub mod consts;
pub mod hevc_encoder;
pub mod pgm;
pub mod predict;
pub mod quant;
pub mod scan;
pub mod syntax;
pub mod txfm;
pub mod util;

pub use hevc_encoder::{EncodeError, EncodedImage, HevcEncoder};
