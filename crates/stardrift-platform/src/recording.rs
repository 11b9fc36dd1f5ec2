use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::{CirclePaint, Color, DrawingSurface, RadialGradient, Stroke, Viewport};

/// One primitive call made against a [`RecordingSurface`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DrawCommand {
    Resize {
        viewport: Viewport,
    },
    FillRect {
        origin: Vec2,
        size: Vec2,
        color: Color,
    },
    FillCircle {
        center: Vec2,
        radius: f32,
        paint: CirclePaint,
    },
    StrokeLine {
        from: Vec2,
        to: Vec2,
        stroke: Stroke,
    },
    StrokePath {
        points: Vec<Vec2>,
        stroke: Stroke,
    },
    FillRadialGradient {
        gradient: RadialGradient,
    },
}

/// Drawing surface that keeps a log of every call instead of rasterizing.
#[derive(Debug, Clone, Default)]
pub struct RecordingSurface {
    viewport: Viewport,
    commands: Vec<DrawCommand>,
}

impl RecordingSurface {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            commands: Vec::new(),
        }
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn take_commands(&mut self) -> Vec<DrawCommand> {
        std::mem::take(&mut self.commands)
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }

    pub fn lines(&self) -> impl Iterator<Item = (Vec2, Vec2, &Stroke)> {
        self.commands.iter().filter_map(|command| match command {
            DrawCommand::StrokeLine { from, to, stroke } => Some((*from, *to, stroke)),
            _ => None,
        })
    }

    pub fn circles(&self) -> impl Iterator<Item = (Vec2, f32, &CirclePaint)> {
        self.commands.iter().filter_map(|command| match command {
            DrawCommand::FillCircle {
                center,
                radius,
                paint,
            } => Some((*center, *radius, paint)),
            _ => None,
        })
    }

    pub fn gradients(&self) -> impl Iterator<Item = &RadialGradient> {
        self.commands.iter().filter_map(|command| match command {
            DrawCommand::FillRadialGradient { gradient } => Some(gradient),
            _ => None,
        })
    }

    pub fn paths(&self) -> impl Iterator<Item = (&[Vec2], &Stroke)> {
        self.commands.iter().filter_map(|command| match command {
            DrawCommand::StrokePath { points, stroke } => Some((points.as_slice(), stroke)),
            _ => None,
        })
    }
}

impl DrawingSurface for RecordingSurface {
    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn resize(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        self.commands.push(DrawCommand::Resize { viewport });
    }

    fn fill_rect(&mut self, origin: Vec2, size: Vec2, color: Color) {
        self.commands.push(DrawCommand::FillRect {
            origin,
            size,
            color,
        });
    }

    fn fill_circle(&mut self, center: Vec2, radius: f32, paint: &CirclePaint) {
        self.commands.push(DrawCommand::FillCircle {
            center,
            radius,
            paint: *paint,
        });
    }

    fn stroke_line(&mut self, from: Vec2, to: Vec2, stroke: &Stroke) {
        self.commands.push(DrawCommand::StrokeLine {
            from,
            to,
            stroke: *stroke,
        });
    }

    fn stroke_path(&mut self, points: &[Vec2], stroke: &Stroke) {
        self.commands.push(DrawCommand::StrokePath {
            points: points.to_vec(),
            stroke: *stroke,
        });
    }

    fn fill_radial_gradient(&mut self, gradient: &RadialGradient) {
        self.commands.push(DrawCommand::FillRadialGradient {
            gradient: gradient.clone(),
        });
    }
}
