use std::error::Error;
use std::fs;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::PathBuf;

use clap::Parser;

use tinyhevc::array2d::Array2D;
use tinyhevc::pgm;
use tinyhevc::HevcEncoder;

/// Single-frame H.265/HEVC intra encoder for 8-bit grayscale PGM images
#[derive(Parser)]
#[command(version)]
struct Args {
  /// Input image (binary PGM)
  input: PathBuf,

  /// Output HEVC elementary stream (.hevc / .h265)
  output: PathBuf,

  /// Quantization level; effective Qp = 6*qpd6 + 4. Larger means smaller
  /// output and lower quality
  #[arg(short, long, default_value_t = 3, value_parser = clap::value_parser!(u8).range(0..=4))]
  qpd6: u8,

  /// Number of intra prediction modes searched per CU, after a cheap
  /// SAD-based pre-sort of all 35
  #[arg(long = "modes", default_value_t = 7, value_parser = clap::value_parser!(u8).range(1..=35))]
  pmode_cand: u8,

  /// Also write the reconstructed image (what a decoder will see) as PGM
  #[arg(short, long)]
  recon: Option<PathBuf>,
}

fn image_distortion(orig: &Array2D<u8>, recon: &Array2D<u8>) -> (f64, f64) {
  let rows = orig.rows().min(recon.rows());
  let cols = orig.cols().min(recon.cols());

  let mut sse = 0u64;
  for i in 0..rows {
    for j in 0..cols {
      let diff = orig[i][j] as i64 - recon[i][j] as i64;
      sse += (diff * diff) as u64;
    }
  }

  let mse = (sse as f64 / (rows * cols) as f64).max(1e-9);
  let psnr = 10.0 * ((255.0 * 255.0) / mse).log10();
  (mse, psnr)
}

fn main() -> Result<(), Box<dyn Error>> {
  let args = Args::parse();

  let img = pgm::read_pgm(&mut BufReader::new(File::open(&args.input)?))?;

  println!("arguments:");
  println!("  input  image file   = {}", args.input.display());
  println!("  output stream file  = {}", args.output.display());
  println!("  qpd6                = {}     (Qp = {})", args.qpd6, args.qpd6 * 6 + 4);
  println!("  mode candidates     = {}", args.pmode_cand);
  println!("  image size          = {} x {}", img.cols(), img.rows());

  let encoder = HevcEncoder::new(img.rows(), img.cols(), args.qpd6, args.pmode_cand)?;
  let encoded = encoder.encode_image(&img);
  let (mse, psnr) = image_distortion(&img, &encoded.recon);

  let pixels = encoder.width() * encoder.height();
  println!("result:");
  println!("  encoded image size  = {} x {}", encoder.width(), encoder.height());
  println!("  stream length       = {} bytes", encoded.stream.len());
  println!("  compression ratio   = {:.5}", pixels as f64 / encoded.stream.len() as f64);
  println!("  bits per pixel      = {:.5}", 8.0 * encoded.stream.len() as f64 / pixels as f64);
  println!("  MSE                 = {:.7}", mse);
  println!("  PSNR                = {:.4} dB", psnr);

  fs::write(&args.output, &encoded.stream[..])?;

  if let Some(path) = &args.recon {
    pgm::write_pgm(&mut BufWriter::new(File::create(path)?), &encoded.recon)?;
  }

  Ok(())
}
