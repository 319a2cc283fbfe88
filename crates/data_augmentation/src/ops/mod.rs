//! src/ops/mod.rs
//!
//! Pixel-level primitives shared by the variable-sized and fixed-size
//! pipelines, split by their primary function:
//!
//! ```text
//! ops/
//! ├── geometric.rs    → resize (area / cubic / short-side), crop, rotation
//! └── photometric.rs  → channel shift, contrast/brightness, smoothing
//! ```
//!
//! All primitives operate on the two normalized working formats produced by
//! the decode adapter (`Luma8` or `Rgb8`).

pub mod geometric;
pub mod photometric;

pub use geometric::{crop, resize_area, resize_cubic, resize_min_side, rotate_expanded};
pub use photometric::{channel_shift, contrast_brightness, smooth, SmoothKind};
