//! Ambient background field: slowly drifting particles joined by faint lines
//! when they come close, pulled gently towards the pointer.
//!
//! Motion advances by a fixed time step per frame rather than by measured
//! elapsed time, so the apparent speed follows the host's frame rate.

use glam::Vec2;
use rand::rngs::SmallRng;
use stardrift_platform::{
    CirclePaint, Color, DrawingSurface, FrameHandle, Glow, Host, ListenerId, RadialGradient,
    Stroke, Viewport,
};
use tracing::debug;

use crate::config::{FieldConfig, MIN_WAVE_STEP};
use crate::engine::{
    proximity_alpha, sample, seeded_rng, AnimationEngine, EngineState, Lifecycle,
};

const POINTER_GLOW_RGB: (u8, u8, u8) = (102, 126, 234);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldParticle {
    pub pos: Vec2,
    pub vel: Vec2,
    pub size: f32,
    pub base_opacity: f32,
    pub hue: f32,
    /// Random point picked at creation. Nothing steers towards it yet.
    pub target: Vec2,
}

impl FieldParticle {
    fn spawn(rng: &mut SmallRng, extent: Vec2, config: &FieldConfig) -> Self {
        let pos = random_point(rng, extent);
        let target = random_point(rng, extent);
        Self {
            pos,
            vel: Vec2::new(sample(rng, &config.velocity), sample(rng, &config.velocity)),
            size: sample(rng, &config.size),
            base_opacity: sample(rng, &config.opacity),
            hue: sample(rng, &config.hue),
            target,
        }
    }

    /// Drift, friction, then wrap back into `[0, w) x [0, h)`.
    fn advance(&mut self, time: f32, extent: Vec2, config: &FieldConfig) {
        let drift = Vec2::new(
            (time + self.pos.x * config.drift_frequency).sin(),
            (time + self.pos.y * config.drift_frequency).cos(),
        ) * config.drift_amplitude;
        self.pos += self.vel + drift;
        self.vel *= config.friction;
        self.pos = Vec2::new(wrap(self.pos.x, extent.x), wrap(self.pos.y, extent.y));
    }

    pub fn opacity_at(&self, time: f32, config: &FieldConfig) -> f32 {
        let pulse = (time * 2.0 + self.pos.x * config.drift_frequency).sin() * config.pulse_amplitude;
        (self.base_opacity + pulse).max(config.opacity_floor)
    }
}

fn random_point(rng: &mut SmallRng, extent: Vec2) -> Vec2 {
    Vec2::new(sample(rng, &(0.0..extent.x)), sample(rng, &(0.0..extent.y)))
}

/// Toroidal wrap of one coordinate.
pub fn wrap(value: f32, extent: f32) -> f32 {
    if extent <= 0.0 {
        return 0.0;
    }
    let wrapped = value.rem_euclid(extent);
    // rem_euclid can round up to `extent` for tiny negative inputs
    if wrapped >= extent {
        0.0
    } else {
        wrapped
    }
}

/// Population size for a viewport: one particle per `area_per_particle`
/// pixels, capped at `max_count`.
pub fn particle_count(viewport: Viewport, config: &FieldConfig) -> usize {
    let raw = (viewport.area() as f64 / config.area_per_particle as f64).floor();
    if raw.is_nan() || raw < 0.0 {
        return 0;
    }
    (raw as usize).min(config.max_count)
}

/// Velocity impulse towards the pointer. Magnitude is
/// `pull_strength * (1 - d / radius)` inside the radius and zero outside.
pub fn pull_impulse(pos: Vec2, pointer: Vec2, config: &FieldConfig) -> Vec2 {
    let offset = pointer - pos;
    let distance = offset.length();
    match proximity_alpha(distance, config.interaction_radius, config.pull_strength) {
        Some(magnitude) if distance > 0.0 => offset / distance * magnitude,
        _ => Vec2::ZERO,
    }
}

pub struct FieldEngine<S> {
    config: FieldConfig,
    lifecycle: Lifecycle<S>,
    rng: SmallRng,
    particles: Vec<FieldParticle>,
    pointer: Option<Vec2>,
    time: f32,
}

impl<S: DrawingSurface> FieldEngine<S> {
    /// `surface` is `None` when the host could not provide a 2D surface; the
    /// engine then never leaves `Uninitialized`.
    pub fn new(config: FieldConfig, surface: Option<S>) -> Self {
        Self {
            config,
            lifecycle: Lifecycle::new("field", surface),
            rng: seeded_rng(None),
            particles: Vec::new(),
            pointer: None,
            time: 0.0,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = seeded_rng(Some(seed));
        self
    }

    pub fn particles(&self) -> &[FieldParticle] {
        &self.particles
    }

    pub fn pointer(&self) -> Option<Vec2> {
        self.pointer
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn config(&self) -> &FieldConfig {
        &self.config
    }

    pub fn surface(&self) -> Option<&S> {
        self.lifecycle.surface()
    }

    /// Discard the population and allocate a fresh one sized for `viewport`.
    fn init_particles(&mut self, viewport: Viewport) {
        let count = particle_count(viewport, &self.config);
        let extent = viewport.size();
        self.particles.clear();
        self.particles.reserve(count);
        for _ in 0..count {
            let particle = FieldParticle::spawn(&mut self.rng, extent, &self.config);
            self.particles.push(particle);
        }
        debug!(
            count,
            width = viewport.width,
            height = viewport.height,
            "field population rebuilt"
        );
    }
}

fn draw_particle(
    surface: &mut impl DrawingSurface,
    particle: &FieldParticle,
    time: f32,
    config: &FieldConfig,
) {
    let paint = CirclePaint {
        color: Color::hsl(particle.hue + time.sin() * config.hue_wobble, 0.6, 0.6),
        alpha: particle.opacity_at(time, config),
        glow: Some(Glow {
            blur: config.glow_blur,
            color: Color::hsl(particle.hue, 0.6, 0.6),
        }),
    };
    surface.fill_circle(particle.pos, particle.size, &paint);
}

/// O(n^2) over unordered pairs; the population is capped so this stays cheap.
fn draw_connections(
    surface: &mut impl DrawingSurface,
    particles: &[FieldParticle],
    config: &FieldConfig,
) {
    for (i, a) in particles.iter().enumerate() {
        for b in &particles[i + 1..] {
            let distance = a.pos.distance(b.pos);
            if let Some(alpha) =
                proximity_alpha(distance, config.connection_distance, config.connection_opacity)
            {
                let stroke = Stroke {
                    color: Color::hsla(240.0, 0.5, 0.7, alpha),
                    width: 1.0,
                };
                surface.stroke_line(a.pos, b.pos, &stroke);
            }
        }
    }
}

fn draw_pointer(
    surface: &mut impl DrawingSurface,
    particles: &mut [FieldParticle],
    pointer: Vec2,
    config: &FieldConfig,
) {
    let (r, g, b) = POINTER_GLOW_RGB;
    let glow = RadialGradient::new(pointer, config.pointer_glow_radius)
        .with_stop(0.0, Color::rgba(r, g, b, 0.1))
        .with_stop(0.5, Color::rgba(r, g, b, 0.05))
        .with_stop(1.0, Color::rgba(r, g, b, 0.0));
    surface.fill_radial_gradient(&glow);

    for particle in particles.iter_mut() {
        let distance = particle.pos.distance(pointer);
        if let Some(alpha) =
            proximity_alpha(distance, config.interaction_radius, config.interaction_opacity)
        {
            let stroke = Stroke {
                color: Color::hsla(250.0, 0.6, 0.8, alpha),
                width: 2.0,
            };
            surface.stroke_line(particle.pos, pointer, &stroke);
            particle.vel += pull_impulse(particle.pos, pointer, config);
        }
    }
}

fn draw_waves(surface: &mut impl DrawingSurface, time: f32, config: &FieldConfig) {
    let viewport = surface.viewport();
    if viewport.is_empty() {
        return;
    }
    let width = viewport.width as f32;
    let mid = viewport.height as f32 / 2.0;
    let stroke = Stroke {
        color: Color::hsla(240.0 + time.sin() * 20.0, 0.5, 0.7, config.wave_opacity),
        width: 2.0,
    };
    let step = config.wave_step.max(MIN_WAVE_STEP);
    let samples = (width / step).floor() as usize + 1;
    let mut points = Vec::with_capacity(samples);
    for wave in 0..config.wave_count {
        let phase = wave as f32;
        points.clear();
        points.extend((0..samples).map(|i| {
            let x = i as f32 * step;
            let y = mid
                + ((x + time * 100.0) * 0.01 + phase * 2.0).sin() * 50.0
                + ((x + time * 50.0) * 0.005 + phase).sin() * 30.0;
            Vec2::new(x, y)
        }));
        surface.stroke_path(&points, &stroke);
    }
}

impl<S: DrawingSurface> AnimationEngine for FieldEngine<S> {
    fn name(&self) -> &'static str {
        "field"
    }

    fn state(&self) -> EngineState {
        self.lifecycle.state()
    }

    fn create(&mut self, host: &mut dyn Host) {
        if let Some(viewport) = self.lifecycle.create(host) {
            self.init_particles(viewport);
            self.lifecycle.schedule(host);
        }
    }

    fn step(&mut self, host: &mut dyn Host) {
        let Some(surface) = self.lifecycle.begin_frame(host) else {
            return;
        };
        let config = &self.config;
        self.time += config.time_step;
        let time = self.time;

        surface.fade(config.fade);
        let extent = surface.viewport().size();
        for particle in self.particles.iter_mut() {
            particle.advance(time, extent, config);
            draw_particle(surface, particle, time, config);
        }
        draw_connections(surface, &self.particles, config);
        if let Some(pointer) = self.pointer {
            draw_pointer(surface, &mut self.particles, pointer, config);
        }
        draw_waves(surface, time, config);

        self.lifecycle.schedule(host);
    }

    fn on_resize(&mut self, viewport: Viewport) {
        let Some(surface) = self.lifecycle.running_surface() else {
            return;
        };
        surface.resize(viewport);
        self.init_particles(viewport);
    }

    fn on_pointer_move(&mut self, client: Vec2) {
        if let Some(surface) = self.lifecycle.running_surface() {
            self.pointer = Some(surface.viewport().to_local(client));
        }
    }

    fn teardown(&mut self, host: &mut dyn Host) {
        self.lifecycle.teardown(host);
        self.particles.clear();
    }

    fn pending_frame(&self) -> Option<FrameHandle> {
        self.lifecycle.pending()
    }

    fn owns_listener(&self, id: ListenerId) -> bool {
        self.lifecycle.owns_listener(id)
    }
}
