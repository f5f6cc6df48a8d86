use crate::topo_pipeline::hsv::types::HsvRow;

/// Number of hexagon sectors in the HSV model.
const SECTORS: f64 = 6.0;

/// Highest valid sector index; `h == 1.0` lands here instead of a seventh sector.
const LAST_SECTOR: usize = 5;

/// Converts one RGB pixel (samples in [0, 255]) to `(h, s, v)`.
///
/// Where several channels share the maximum, red takes precedence over green and
/// green over blue. Achromatic pixels get `h = 0` and `s = 0`.
pub fn rgb_to_hsv_pixel(r: f64, g: f64, b: f64) -> (f64, f64, f64) {
    let maxc = r.max(g.max(b));
    let minc = r.min(g.min(b));
    let v = maxc;

    let diff = if minc == maxc { 1.0 } else { maxc - minc };
    let s = (maxc - minc) / maxc.max(1.0);

    let rc = (maxc - r) / diff;
    let gc = (maxc - g) / diff;
    let bc = (maxc - b) / diff;

    let mut h = 0.0;
    if maxc == b {
        h = 4.0 + gc - rc;
    }
    if maxc == g {
        h = 2.0 + rc - bc;
    }
    if maxc == r {
        h = bc - gc;
    }

    ((h / SECTORS).rem_euclid(1.0), s, v)
}

/// Converts one HSV pixel back to 8-bit RGB.
///
/// Channels are clamped to [0, 255] and truncated.
pub fn hsv_to_rgb_pixel(h: f64, s: f64, v: f64) -> (u8, u8, u8) {
    let scaled = h * SECTORS;
    let i = (scaled as usize).min(LAST_SECTOR);
    let f = scaled - i as f64;

    let p = v * (1.0 - s);
    let q = v * (1.0 - s * f);
    let t = v * (1.0 - s * (1.0 - f));

    let (r, g, b) = match i {
        0 => (v, t, p),
        1 => (q, v, p),
        2 => (p, v, t),
        3 => (p, q, v),
        4 => (t, p, v),
        _ => (v, p, q),
    };

    (to_u8(r), to_u8(g), to_u8(b))
}

fn to_u8(value: f64) -> u8 {
    value.clamp(0.0, 255.0) as u8
}

/// Converts an RGB scan line into a freshly allocated [`HsvRow`].
pub fn rgb_to_hsv(r: &[f64], g: &[f64], b: &[f64]) -> HsvRow {
    let mut hsv = HsvRow::with_width(r.len());
    rgb_to_hsv_into(r, g, b, &mut hsv);
    hsv
}

/// Converts an RGB scan line into `out`, resizing it to the line width.
pub fn rgb_to_hsv_into(r: &[f64], g: &[f64], b: &[f64], out: &mut HsvRow) {
    debug_assert!(r.len() == g.len() && g.len() == b.len());
    out.resize(r.len());

    for (x, ((&r, &g), &b)) in r.iter().zip(g).zip(b).enumerate() {
        let (h, s, v) = rgb_to_hsv_pixel(r, g, b);
        out.h[x] = h;
        out.s[x] = s;
        out.v[x] = v;
    }
}

/// Converts an HSV scan line to 8-bit RGB, writing into the three output slices.
pub fn hsv_to_rgb_into(hsv: &HsvRow, r: &mut [u8], g: &mut [u8], b: &mut [u8]) {
    debug_assert!(r.len() == hsv.width() && g.len() == hsv.width() && b.len() == hsv.width());

    for x in 0..hsv.width() {
        let (rv, gv, bv) = hsv_to_rgb_pixel(hsv.h[x], hsv.s[x], hsv.v[x]);
        r[x] = rv;
        g[x] = gv;
        b[x] = bv;
    }
}
