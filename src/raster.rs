//! Procedural rasterization for the pre-baked panel images.
//!
//! Everything here draws into a plain straight-alpha RGBA8 buffer. The
//! target always starts fully transparent and shapes are only ever painted
//! once per pixel colour, so "source over transparent" reduces to a plain
//! store and overlapping spans cannot darken into seams.

/// Straight (non-premultiplied) RGBA colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const TRANSPARENT: Rgba = Rgba::new(0, 0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }
}

/// An owned RGBA8 pixel buffer, row-major, 4 bytes per pixel.
#[derive(Clone, PartialEq, Eq)]
pub struct RgbaImage {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl std::fmt::Debug for RgbaImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RgbaImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

impl RgbaImage {
    pub fn transparent(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width as usize * height as usize * 4],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.pixels
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.pixels
    }

    /// Fill the inclusive horizontal span `[xa, xb]` on row `y`, clipped.
    fn hspan(&mut self, xa: i32, xb: i32, y: i32, color: Rgba) {
        if y < 0 || y >= self.height as i32 {
            return;
        }
        let lo = xa.min(xb).max(0);
        let hi = xa.max(xb).min(self.width as i32 - 1);
        if lo > hi {
            return;
        }
        let row = y as usize * self.width as usize;
        for x in lo as usize..=hi as usize {
            let i = (row + x) * 4;
            self.pixels[i..i + 4].copy_from_slice(&[color.r, color.g, color.b, color.a]);
        }
    }

    /// Fill an axis-aligned rectangle, clipped to the image.
    fn fill_rect(&mut self, x: i32, y: i32, w: i32, h: i32, color: Rgba) {
        if w <= 0 || h <= 0 {
            return;
        }
        for row in y..y + h {
            self.hspan(x, x + w - 1, row, color);
        }
    }

    /// Rasterize one filled quarter disc of radius `r` centred on `(cx, cy)`,
    /// growing towards `corner`.
    ///
    /// Midpoint circle walk: `y` advances every step, `x` only shrinks once
    /// the decision term turns non-negative. Each step emits the two
    /// octant-mirrored scanlines of that quadrant.
    fn fill_quarter_disc(&mut self, cx: i32, cy: i32, r: i32, corner: Corner, color: Rgba) {
        let (sx, sy) = corner.signs();
        let mut x = r;
        let mut y = 0;
        let mut d = 1 - r;

        while x >= y {
            self.hspan(cx, cx + sx * x, cy + sy * y, color);
            self.hspan(cx, cx + sx * y, cy + sy * x, color);
            y += 1;
            if d < 0 {
                d += 2 * y + 1;
            } else {
                x -= 1;
                d += 2 * (y - x) + 1;
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Corner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Corner {
    const ALL: [Corner; 4] = [
        Corner::TopLeft,
        Corner::TopRight,
        Corner::BottomLeft,
        Corner::BottomRight,
    ];

    fn signs(self) -> (i32, i32) {
        match self {
            Corner::TopLeft => (-1, -1),
            Corner::TopRight => (1, -1),
            Corner::BottomLeft => (-1, 1),
            Corner::BottomRight => (1, 1),
        }
    }

    /// Centre of this corner's arc inside a `w`×`h` box with radius `r`.
    fn center(self, w: i32, h: i32, r: i32) -> (i32, i32) {
        match self {
            Corner::TopLeft => (r, r),
            Corner::TopRight => (w - r - 1, r),
            Corner::BottomLeft => (r, h - r - 1),
            Corner::BottomRight => (w - r - 1, h - r - 1),
        }
    }
}

/// Size, corner radius and fill of one rounded panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PanelSpec {
    pub width: u32,
    pub height: u32,
    pub radius: u32,
    pub color: Rgba,
}

impl PanelSpec {
    pub const fn new(width: u32, height: u32, radius: u32, color: Rgba) -> Self {
        Self { width, height, radius, color }
    }
}

/// Render a filled rectangle with four circular corners.
///
/// Pixels outside the rounded silhouette stay fully transparent; pixels
/// inside carry exactly `spec.color`. The radius is clamped to half of the
/// shorter side.
pub fn render_rounded_panel(spec: PanelSpec) -> RgbaImage {
    let mut img = RgbaImage::transparent(spec.width, spec.height);
    let (w, h) = (spec.width as i32, spec.height as i32);
    let r = (spec.radius as i32).min(w / 2).min(h / 2);
    let color = spec.color;

    if r == 0 {
        img.fill_rect(0, 0, w, h, color);
        return img;
    }

    // Central cross: full-height band and full-width band.
    img.fill_rect(r, 0, w - 2 * r, h, color);
    img.fill_rect(0, r, w, h - 2 * r, color);

    for corner in Corner::ALL {
        let (cx, cy) = corner.center(w, h, r);
        img.fill_quarter_disc(cx, cy, r, corner, color);
    }
    img
}

/// Vertical two-stop gradient, fully opaque. Used as the wallpaper when no
/// image file is available.
pub fn vertical_gradient(width: u32, height: u32, top: Rgba, bottom: Rgba) -> RgbaImage {
    let mut img = RgbaImage::transparent(width, height);
    let lerp = |a: u8, b: u8, t: f32| (a as f32 + (b as f32 - a as f32) * t) as u8;
    for y in 0..height {
        let t = y as f32 / height as f32;
        let c = Rgba::new(
            lerp(top.r, bottom.r, t),
            lerp(top.g, bottom.g, t),
            lerp(top.b, bottom.b, t),
            255,
        );
        img.hspan(0, width as i32 - 1, y as i32, c);
    }
    img
}
