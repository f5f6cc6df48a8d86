use std::path::Path;

use tracing::{debug, info, instrument};

use crate::topo_pipeline::common::error::{Result, TopoError};
use crate::topo_pipeline::raster::{RasterReader, RasterSource, RasterWriter, RowSink};
use crate::topo_pipeline::shading::blend::check_same_grid;
use crate::topo_pipeline::shading::types::WaterBurn;

/// Label of pixels outside every region.
const BACKGROUND: usize = 0;

/// Disjoint-set forest over provisional region labels, with a pixel count per root.
struct RegionForest {
    parent: Vec<usize>,
    pixels: Vec<u64>,
}

impl RegionForest {
    fn new() -> Self {
        Self {
            parent: vec![BACKGROUND],
            pixels: vec![0],
        }
    }

    fn len(&self) -> usize {
        self.parent.len()
    }

    fn push(&mut self) -> usize {
        let label = self.parent.len();
        self.parent.push(label);
        self.pixels.push(0);
        label
    }

    fn find(&mut self, mut label: usize) -> usize {
        let mut root = label;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        while self.parent[label] != root {
            let next = self.parent[label];
            self.parent[label] = root;
            label = next;
        }
        root
    }

    fn union(&mut self, a: usize, b: usize) -> usize {
        let (a, b) = (self.find(a), self.find(b));
        if a == b {
            return a;
        }
        let (root, child) = if a < b { (a, b) } else { (b, a) };
        self.parent[child] = root;
        self.pixels[root] += self.pixels[child];
        self.pixels[child] = 0;
        root
    }
}

/// Streaming 4-connected labeling of mask rows.
///
/// The first pass (`counting`) builds the forest and pixel counts. A second pass
/// over the same rows hands out the same provisional labels in the same order, so
/// with the finished forest every pixel resolves to its final region root.
struct RegionLabeler {
    forest: RegionForest,
    next_label: usize,
    above: Vec<usize>,
    current: Vec<usize>,
}

impl RegionLabeler {
    fn new(width: usize) -> Self {
        Self {
            forest: RegionForest::new(),
            next_label: 1,
            above: vec![BACKGROUND; width],
            current: vec![BACKGROUND; width],
        }
    }

    fn restart(&mut self) {
        self.next_label = 1;
        self.above.fill(BACKGROUND);
        self.current.fill(BACKGROUND);
    }

    /// Labels one row; afterwards `current()` holds the row's region roots.
    fn label_row(&mut self, foreground: impl Iterator<Item = bool>, counting: bool) {
        std::mem::swap(&mut self.above, &mut self.current);

        for (x, is_region) in foreground.enumerate() {
            if !is_region {
                self.current[x] = BACKGROUND;
                continue;
            }

            let left = if x > 0 { self.current[x - 1] } else { BACKGROUND };
            let up = self.above[x];

            let label = match (left, up) {
                (BACKGROUND, BACKGROUND) => {
                    let label = self.next_label;
                    self.next_label += 1;
                    if counting {
                        self.forest.push();
                    }
                    label
                }
                (label, BACKGROUND) | (BACKGROUND, label) => label,
                (left, up) if counting => self.forest.union(left, up),
                (left, _) => left,
            };

            let root = self.forest.find(label);
            if counting {
                self.forest.pixels[root] += 1;
            }
            self.current[x] = root;
        }
    }

    fn current(&self) -> &[usize] {
        &self.current
    }
}

/// Paints the water color into bands 1-3 of `topo_path` wherever the mask marks a
/// 4-connected water region whose area exceeds `burn.min_area`, writing the result to
/// `output_path`. Returns the number of regions burned.
///
/// Region area is pixel count times the mask's pixel area, or the pixel count when
/// the mask has no geotransform. Mask pixels equal to 1 are water.
#[instrument(skip_all, fields(topo = %topo_path.display(), mask = %mask_path.display()))]
pub fn burn_water<S: RasterSource, W: RasterWriter>(
    source: &S,
    writer: &W,
    topo_path: &Path,
    mask_path: &Path,
    output_path: &Path,
    burn: &WaterBurn,
) -> Result<usize> {
    let mut topo = source.open(topo_path)?;
    let mut mask = source.open(mask_path)?;
    let topo_info = topo.info().clone();
    let mask_info = mask.info().clone();

    if topo_info.bands < 3 {
        return Err(TopoError::InsufficientBands(topo_info.bands));
    }
    check_same_grid((topo_path, &topo_info), (mask_path, &mask_info))?;

    let (width, height) = (topo_info.width, topo_info.height);
    let pixel_area = mask_info
        .geotransform
        .map(|gt| gt.pixel_area())
        .unwrap_or(1.0);

    let is_water = |sample: f64| sample == 1.0 && !mask_info.is_nodata(sample);
    let mut mask_line = vec![0.0; width];
    let mut labeler = RegionLabeler::new(width);

    {
        let _span = tracing::info_span!("label_regions", width, height).entered();
        for row in 0..height {
            mask.read_row(0, row, &mut mask_line)?;
            labeler.label_row(mask_line.iter().map(|&s| is_water(s)), true);
        }
    }

    let mut keep = vec![false; labeler.forest.len()];
    let mut regions = 0;
    let mut kept_regions = 0;
    for label in 1..labeler.forest.len() {
        if labeler.forest.find(label) != label {
            continue;
        }
        regions += 1;
        if labeler.forest.pixels[label] as f64 * pixel_area > burn.min_area {
            keep[label] = true;
            kept_regions += 1;
        }
    }

    debug!(regions, kept_regions, pixel_area, min_area = burn.min_area, "Water regions labeled");

    labeler.restart();
    let mut bands = vec![vec![0.0; width]; topo_info.bands];
    let color = burn.color.map(f64::from);

    let _span = tracing::info_span!("burn_regions", kept_regions).entered();
    writer.write_raster(output_path, &topo_info, &mut |sink: &mut dyn RowSink| {
        for row in 0..height {
            for (band, line) in bands.iter_mut().enumerate() {
                topo.read_row(band, row, line)?;
            }

            if kept_regions > 0 {
                mask.read_row(0, row, &mut mask_line)?;
                labeler.label_row(mask_line.iter().map(|&s| is_water(s)), false);

                for (x, &root) in labeler.current().iter().enumerate() {
                    if keep[root] {
                        for (line, &value) in bands.iter_mut().zip(&color) {
                            line[x] = value;
                        }
                    }
                }
            }

            for (band, line) in bands.iter().enumerate() {
                sink.write_row(band, row, line)?;
            }
        }
        Ok(())
    })?;

    info!(regions, burned = kept_regions, "Water burned into topo");
    Ok(kept_regions)
}
