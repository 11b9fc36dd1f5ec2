//! Software rasterizer backing the headless runner.
//!
//! Pixels are kept premultiplied in `f32` so repeated translucent fades and
//! glows accumulate without banding; they are converted to straight 8-bit
//! RGBA only on export.

use bytemuck::{Pod, Zeroable};
use glam::Vec2;
use image::RgbaImage;
use stardrift_platform::{
    CirclePaint, Color, DrawingSurface, RadialGradient, Result, Stroke, Viewport,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct Premultiplied {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Premultiplied {
    fn from_color(color: Color, coverage: f32) -> Self {
        let a = (color.a * coverage).clamp(0.0, 1.0);
        Self {
            r: color.r * a,
            g: color.g * a,
            b: color.b * a,
            a,
        }
    }

    fn over(self, dst: Self) -> Self {
        let keep = 1.0 - self.a;
        Self {
            r: self.r + dst.r * keep,
            g: self.g + dst.g * keep,
            b: self.b + dst.b * keep,
            a: self.a + dst.a * keep,
        }
    }

    fn screen(self, dst: Self) -> Self {
        Self {
            r: self.r + dst.r - self.r * dst.r,
            g: self.g + dst.g - self.g * dst.g,
            b: self.b + dst.b - self.b * dst.b,
            a: self.a + dst.a - self.a * dst.a,
        }
    }

    fn to_rgba8(self) -> [u8; 4] {
        if self.a <= 0.0 {
            return [0; 4];
        }
        let channel = |v: f32| ((v / self.a).clamp(0.0, 1.0) * 255.0).round() as u8;
        [
            channel(self.r),
            channel(self.g),
            channel(self.b),
            (self.a.clamp(0.0, 1.0) * 255.0).round() as u8,
        ]
    }
}

#[derive(Debug, Clone)]
pub struct PixelSurface {
    viewport: Viewport,
    pixels: Vec<Premultiplied>,
}

impl PixelSurface {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            pixels: vec![Premultiplied::default(); viewport.area() as usize],
        }
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Premultiplied> {
        if x >= self.viewport.width || y >= self.viewport.height {
            return None;
        }
        self.pixels
            .get((y * self.viewport.width + x) as usize)
            .copied()
    }

    /// Overlay `top` onto this surface with the screen blend mode.
    pub fn screen(&mut self, top: &PixelSurface) {
        let width = self.viewport.width.min(top.viewport.width);
        let height = self.viewport.height.min(top.viewport.height);
        for y in 0..height {
            for x in 0..width {
                let dst = (y * self.viewport.width + x) as usize;
                let src = (y * top.viewport.width + x) as usize;
                self.pixels[dst] = top.pixels[src].screen(self.pixels[dst]);
            }
        }
    }

    pub fn to_image(&self) -> RgbaImage {
        let rgba: Vec<[u8; 4]> = self.pixels.iter().map(|p| p.to_rgba8()).collect();
        let bytes: &[u8] = bytemuck::cast_slice(rgba.as_slice());
        RgbaImage::from_raw(self.viewport.width, self.viewport.height, bytes.to_vec())
            .unwrap_or_else(|| RgbaImage::new(self.viewport.width, self.viewport.height))
    }

    pub fn save_png(&self, path: &std::path::Path) -> Result<()> {
        self.to_image().save(path)?;
        Ok(())
    }

    /// Blend every pixel whose centre lies in the bounding box of `min..max`,
    /// weighted by `coverage(pixel_centre)`.
    fn blend_region(
        &mut self,
        min: Vec2,
        max: Vec2,
        mut coverage: impl FnMut(Vec2) -> Option<(Color, f32)>,
    ) {
        if self.viewport.is_empty() {
            return;
        }
        let extent = self.viewport.size();
        let min = min.max(Vec2::ZERO).floor();
        let max = max.min(extent).ceil();
        if min.x >= max.x || min.y >= max.y {
            return;
        }
        let width = self.viewport.width as usize;
        for y in min.y as usize..max.y as usize {
            for x in min.x as usize..max.x as usize {
                let centre = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
                if let Some((color, weight)) = coverage(centre) {
                    if weight > 0.0 {
                        let px = &mut self.pixels[y * width + x];
                        *px = Premultiplied::from_color(color, weight).over(*px);
                    }
                }
            }
        }
    }
}

fn segment_distance(p: Vec2, a: Vec2, b: Vec2) -> f32 {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq <= f32::EPSILON {
        return p.distance(a);
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    p.distance(a + ab * t)
}

/// Coverage of a pixel centre at `distance` from an edge at `radius`.
fn edge_coverage(distance: f32, radius: f32) -> f32 {
    (radius + 0.5 - distance).clamp(0.0, 1.0)
}

impl DrawingSurface for PixelSurface {
    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn resize(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        self.pixels.clear();
        self.pixels
            .resize(viewport.area() as usize, Premultiplied::default());
    }

    fn fill_rect(&mut self, origin: Vec2, size: Vec2, color: Color) {
        self.blend_region(origin, origin + size, |_| Some((color, 1.0)));
    }

    fn fill_circle(&mut self, center: Vec2, radius: f32, paint: &CirclePaint) {
        if radius <= 0.0 || paint.alpha <= 0.0 {
            return;
        }
        let reach = radius + paint.glow.map_or(0.0, |g| g.blur) + 1.0;
        let alpha = paint.alpha;
        self.blend_region(center - Vec2::splat(reach), center + Vec2::splat(reach), |p| {
            let distance = p.distance(center);
            let fill = edge_coverage(distance, radius);
            if fill > 0.0 {
                return Some((paint.color, fill * alpha));
            }
            let glow = paint.glow?;
            if glow.blur <= 0.0 {
                return None;
            }
            let falloff = 1.0 - (distance - radius) / glow.blur;
            Some((glow.color, falloff.max(0.0) * 0.5 * alpha))
        });
    }

    fn stroke_line(&mut self, from: Vec2, to: Vec2, stroke: &Stroke) {
        let half = stroke.width / 2.0;
        let pad = Vec2::splat(half + 1.0);
        let color = stroke.color;
        self.blend_region(from.min(to) - pad, from.max(to) + pad, |p| {
            Some((color, edge_coverage(segment_distance(p, from, to), half)))
        });
    }

    fn stroke_path(&mut self, points: &[Vec2], stroke: &Stroke) {
        for pair in points.windows(2) {
            self.stroke_line(pair[0], pair[1], stroke);
        }
    }

    fn fill_radial_gradient(&mut self, gradient: &RadialGradient) {
        if gradient.radius <= 0.0 {
            return;
        }
        let reach = Vec2::splat(gradient.radius);
        self.blend_region(gradient.center - reach, gradient.center + reach, |p| {
            let t = p.distance(gradient.center) / gradient.radius;
            (t <= 1.0).then(|| (gradient.color_at(t), 1.0))
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stardrift_platform::Glow;

    fn alpha_at(surface: &PixelSurface, x: u32, y: u32) -> f32 {
        surface.pixel(x, y).unwrap().a
    }

    #[test]
    fn fade_accumulates_towards_colour() {
        let mut surface = PixelSurface::new(Viewport::new(4, 4));
        for _ in 0..200 {
            surface.fade(Color::rgba(10, 10, 10, 0.05));
        }
        assert!(alpha_at(&surface, 3, 3) > 0.99);
        assert_eq!(surface.to_image().get_pixel(0, 0).0, [10, 10, 10, 255]);
    }

    #[test]
    fn circle_with_glow_reaches_past_radius() {
        let mut surface = PixelSurface::new(Viewport::new(40, 40));
        let paint = CirclePaint {
            color: Color::hsl(240.0, 0.6, 0.6),
            alpha: 1.0,
            glow: Some(Glow {
                blur: 10.0,
                color: Color::hsl(240.0, 0.6, 0.6),
            }),
        };
        surface.fill_circle(Vec2::new(20.0, 20.0), 3.0, &paint);
        assert!((alpha_at(&surface, 20, 20) - 1.0).abs() < 1e-6);
        let halo = alpha_at(&surface, 27, 20);
        assert!(halo > 0.0 && halo < 0.5);
        assert_eq!(alpha_at(&surface, 0, 0), 0.0);
    }

    #[test]
    fn line_covers_its_path_only() {
        let mut surface = PixelSurface::new(Viewport::new(20, 20));
        let stroke = Stroke {
            color: Color::rgba(255, 255, 255, 1.0),
            width: 2.0,
        };
        surface.stroke_line(Vec2::new(0.0, 10.0), Vec2::new(20.0, 10.0), &stroke);
        assert!(alpha_at(&surface, 5, 9) > 0.9);
        assert_eq!(alpha_at(&surface, 5, 2), 0.0);
    }

    #[test]
    fn gradient_is_strongest_at_centre() {
        let mut surface = PixelSurface::new(Viewport::new(100, 100));
        let gradient = RadialGradient::new(Vec2::new(50.0, 50.0), 40.0)
            .with_stop(0.0, Color::rgba(102, 126, 234, 0.3))
            .with_stop(1.0, Color::rgba(102, 126, 234, 0.0));
        surface.fill_radial_gradient(&gradient);
        assert!(alpha_at(&surface, 50, 50) > alpha_at(&surface, 70, 50));
        assert_eq!(alpha_at(&surface, 95, 50), 0.0);
    }

    #[test]
    fn drawing_outside_is_clipped() {
        let mut surface = PixelSurface::new(Viewport::new(10, 10));
        let paint = CirclePaint {
            color: Color::rgba(255, 0, 0, 1.0),
            alpha: 1.0,
            glow: None,
        };
        surface.fill_circle(Vec2::new(-50.0, -50.0), 5.0, &paint);
        surface.fill_rect(Vec2::new(20.0, 20.0), Vec2::splat(5.0), Color::rgba(0, 0, 0, 1.0));
        assert!(surface.pixels.iter().all(|p| p.a == 0.0));
    }

    #[test]
    fn screen_brightens() {
        let mut base = PixelSurface::new(Viewport::new(2, 2));
        base.fill_rect(Vec2::ZERO, Vec2::splat(2.0), Color::rgba(128, 128, 128, 1.0));
        let mut top = PixelSurface::new(Viewport::new(2, 2));
        top.fill_rect(Vec2::ZERO, Vec2::splat(2.0), Color::rgba(128, 128, 128, 1.0));
        let before = base.pixel(0, 0).unwrap().r;
        base.screen(&top);
        assert!(base.pixel(0, 0).unwrap().r > before);
        assert!(base.pixel(1, 1).unwrap().a <= 1.0);
    }

    #[test]
    fn resize_clears() {
        let mut surface = PixelSurface::new(Viewport::new(4, 4));
        surface.fade(Color::rgba(255, 255, 255, 1.0));
        surface.resize(Viewport::new(8, 2));
        assert_eq!(surface.pixels.len(), 16);
        assert_eq!(alpha_at(&surface, 7, 1), 0.0);
        assert!(surface.pixel(0, 3).is_none());
    }
}
