//! HSV color space conversion
//!
//! Hue and saturation are normalized to [0, 1]; value stays in the 8-bit sample
//! range [0, 255] so it can be swapped for an intensity sample directly.

mod conversions;
pub mod types;


pub use conversions::{
    rgb_to_hsv,
    rgb_to_hsv_into,
    rgb_to_hsv_pixel,
    hsv_to_rgb_into,
    hsv_to_rgb_pixel,
};
pub use types::HsvRow;
