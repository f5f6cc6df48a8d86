/// Weights of the slope/hillshade blend.
///
/// `out = (slope / full_scale_slope * 255) * slope_weight + hillshade * hillshade_weight + offset`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadeBlend {
    pub slope_weight: f64,
    pub hillshade_weight: f64,
    /// Slope in degrees mapped to full brightness
    pub full_scale_slope: f64,
    /// Brightness added to every pixel
    pub offset: f64,
}

impl Default for ShadeBlend {
    fn default() -> Self {
        Self {
            slope_weight: 0.7,
            hillshade_weight: 0.3,
            full_scale_slope: 90.0,
            offset: 70.0,
        }
    }
}

impl ShadeBlend {
    #[inline]
    pub fn apply(&self, slope: f64, hillshade: f64) -> f64 {
        (slope / self.full_scale_slope * 255.0) * self.slope_weight
            + hillshade * self.hillshade_weight
            + self.offset
    }
}

/// Settings for burning water regions into the topo image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaterBurn {
    /// RGB written into bands 1-3 of water pixels
    pub color: [u8; 3],
    /// Regions must cover strictly more than this area, in squared map units
    pub min_area: f64,
    /// Whether the batch pipeline runs the water steps at all
    pub enabled: bool,
}

impl Default for WaterBurn {
    fn default() -> Self {
        Self {
            color: [35, 170, 181],
            min_area: 0.0000009,
            enabled: true,
        }
    }
}
