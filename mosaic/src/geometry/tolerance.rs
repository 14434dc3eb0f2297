// Centralized tolerances and helpers for robust geometry (map units)

pub const EPS_POS: f64 = 1e-9;            // point coincidence threshold
pub const EPS_LEN: f64 = 1e-12;           // zero-length vector threshold
pub const EPS_DENOM: f64 = 1e-12;         // denominator guard for LS/ratios
pub const EPS_FACE_AREA: f64 = 1e-9;      // faces smaller than this are noise from noding
pub const EPS_ANG: f64 = 1e-12;           // angle compare slack (radians)

// Quantization grid for merging noded vertices (1e-6 map units)
pub const QUANT_SCALE: f64 = 1e6;

// Parts smaller than this are dropped before they are written
pub const MIN_PART_AREA: f64 = 0.1;

// Chords per quarter circle for round joins and point buffers
pub const DEFAULT_SEGMENTS: u32 = 20;

// Default snap/sync radius
pub const DEFAULT_SNAP_TOLERANCE: f64 = 1e-3;

#[inline] pub fn clamp01(x: f64) -> f64 { x.max(0.0).min(1.0) }
#[inline] pub fn approx_eq(a: f64, b: f64, eps: f64) -> bool { (a - b).abs() <= eps }

#[inline]
pub fn norm2(mut x: f64, mut y: f64) -> ((f64, f64), f64) {
    let len = (x*x + y*y).sqrt();
    if len > EPS_LEN { x/=len; y/=len; ((x,y), len) } else { ((0.0,0.0), 0.0) }
}
