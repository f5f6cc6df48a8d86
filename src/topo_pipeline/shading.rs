//! Shading steps
//!
//! Raster arithmetic around the HSV merge: blending slope and hillshade into the
//! intensity raster, deriving a flat-area water mask from slope, and burning the
//! larger water regions into the finished topo image.

mod types;
mod blend;
mod water;

#[cfg(test)]
mod tests;

pub use types::{ShadeBlend, WaterBurn};
pub use blend::{blend_slope_hillshade, slope_water_mask};
pub use water::burn_water;
