//! Platform abstraction traits so `stardrift-core` stays host-agnostic.
//!
//! A host provides three things to an animation engine: a 2D immediate-mode
//! drawing surface, a "run this before the next paint" scheduling primitive
//! with cancellation, and a registry for pointer-move / resize listeners.

use glam::Vec2;
use serde::{Deserialize, Serialize};

mod headless;
mod paint;
mod recording;

pub use headless::HeadlessHost;
pub use paint::{CirclePaint, Color, Glow, GradientStop, RadialGradient, Stroke};
pub use recording::{DrawCommand, RecordingSurface};

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Rectangle of a drawing surface in client coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            x: 0,
            y: 0,
            width,
            height,
        }
    }

    pub fn with_origin(mut self, x: i32, y: i32) -> Self {
        self.x = x;
        self.y = y;
        self
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Extent as floats, for simulation math.
    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width as f32, self.height as f32)
    }

    /// Whether a surface-local point lies in `[0, width) x [0, height)`.
    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= 0.0
            && point.y >= 0.0
            && point.x < self.width as f32
            && point.y < self.height as f32
    }

    /// Translate a client-space point into surface-local coordinates.
    pub fn to_local(&self, client: Vec2) -> Vec2 {
        client - Vec2::new(self.x as f32, self.y as f32)
    }
}

/// Opaque token returned by [`FrameScheduler::request_frame`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FrameHandle(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ListenerId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ListenerKind {
    PointerMove,
    Resize,
}

/// Immediate-mode 2D raster surface an engine renders into each frame.
pub trait DrawingSurface {
    fn viewport(&self) -> Viewport;
    fn resize(&mut self, viewport: Viewport);
    fn fill_rect(&mut self, origin: Vec2, size: Vec2, color: Color);
    fn fill_circle(&mut self, center: Vec2, radius: f32, paint: &CirclePaint);
    fn stroke_line(&mut self, from: Vec2, to: Vec2, stroke: &Stroke);
    fn stroke_path(&mut self, points: &[Vec2], stroke: &Stroke);
    fn fill_radial_gradient(&mut self, gradient: &RadialGradient);

    /// Cover the whole surface with a translucent colour instead of clearing it.
    fn fade(&mut self, color: Color) {
        let size = self.viewport().size();
        self.fill_rect(Vec2::ZERO, size, color);
    }
}

/// The host's "run once before the next paint" primitive.
pub trait FrameScheduler {
    fn request_frame(&mut self) -> FrameHandle;
    /// Cancelling an unknown or already fired handle does nothing.
    fn cancel_frame(&mut self, handle: FrameHandle);
}

/// Registration of host notifications.
pub trait EventRegistry {
    fn add_listener(&mut self, kind: ListenerKind) -> ListenerId;
    /// Removing a listener twice does nothing.
    fn remove_listener(&mut self, id: ListenerId);
    fn is_listening(&self, id: ListenerId) -> bool;
}

/// Everything an engine needs from the environment it is mounted in.
pub trait Host: FrameScheduler + EventRegistry {
    fn viewport(&self) -> Viewport;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn viewport_area_and_bounds() {
        let viewport = Viewport::new(800, 600);
        assert_eq!(viewport.area(), 480_000);
        assert!(viewport.contains(Vec2::new(0.0, 0.0)));
        assert!(viewport.contains(Vec2::new(799.9, 599.9)));
        assert!(!viewport.contains(Vec2::new(800.0, 10.0)));
        assert!(!viewport.contains(Vec2::new(10.0, -0.1)));
        assert!(Viewport::new(0, 600).is_empty());
    }

    #[test]
    fn to_local_subtracts_origin() {
        let viewport = Viewport::new(100, 100).with_origin(20, -5);
        assert_eq!(viewport.to_local(Vec2::new(30.0, 5.0)), Vec2::new(10.0, 10.0));
    }

    #[test]
    fn default_fade_covers_viewport() {
        let mut surface = RecordingSurface::new(Viewport::new(40, 30));
        surface.fade(Color::rgba(10, 10, 10, 0.05));
        match &surface.commands()[0] {
            DrawCommand::FillRect { origin, size, .. } => {
                assert_eq!(*origin, Vec2::ZERO);
                assert_eq!(*size, Vec2::new(40.0, 30.0));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
