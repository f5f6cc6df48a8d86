//! HSV scan line types

/// One scan line in HSV form, stored as three parallel arrays.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HsvRow {
    /// Hue in [0, 1]
    pub h: Vec<f64>,
    /// Saturation in [0, 1]
    pub s: Vec<f64>,
    /// Value in the source sample range
    pub v: Vec<f64>,
}

impl HsvRow {
    pub fn with_width(width: usize) -> Self {
        Self {
            h: vec![0.0; width],
            s: vec![0.0; width],
            v: vec![0.0; width],
        }
    }

    pub fn width(&self) -> usize {
        self.v.len()
    }

    pub(crate) fn resize(&mut self, width: usize) {
        self.h.resize(width, 0.0);
        self.s.resize(width, 0.0);
        self.v.resize(width, 0.0);
    }
}
