//! Pointer trail: short-lived particles spawned in bursts as the pointer
//! moves, shrinking and fading until their life runs out.

use glam::Vec2;
use rand::rngs::SmallRng;
use rand::Rng;
use stardrift_platform::{
    CirclePaint, Color, DrawingSurface, FrameHandle, Glow, Host, ListenerId, RadialGradient,
    Viewport,
};
use tracing::trace;

use crate::config::TrailConfig;
use crate::engine::{sample, seeded_rng, AnimationEngine, EngineState, Lifecycle};

const POINTER_GLOW_RGB: (u8, u8, u8) = (102, 126, 234);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrailParticle {
    pub pos: Vec2,
    pub vel: Vec2,
    /// Frames left; counts down from `max_life`.
    pub life: u32,
    pub max_life: u32,
    pub size: f32,
    pub hue: f32,
}

impl TrailParticle {
    fn spawn(rng: &mut SmallRng, at: Vec2, config: &TrailConfig) -> Self {
        let jitter = -config.jitter..config.jitter;
        let max_life = if config.max_life.start < config.max_life.end {
            rng.gen_range(config.max_life.clone())
        } else {
            config.max_life.start
        };
        let max_life = max_life.max(1);
        Self {
            pos: at + Vec2::new(sample(rng, &jitter), sample(rng, &jitter)),
            vel: Vec2::new(sample(rng, &config.velocity), sample(rng, &config.velocity)),
            life: max_life,
            max_life,
            size: sample(rng, &config.size),
            hue: sample(rng, &config.hue),
        }
    }

    /// Remaining life in `[0, 1]`; scales both radius and alpha.
    pub fn remaining(&self) -> f32 {
        self.life as f32 / self.max_life as f32
    }

    pub fn is_alive(&self) -> bool {
        self.life > 0
    }
}

/// Number of particles a pointer displacement of `distance` spawns.
pub fn burst_size(distance: f32, config: &TrailConfig) -> usize {
    if distance.is_nan() || distance < config.spawn_threshold || config.spawn_scale <= 0.0 {
        return 0;
    }
    ((distance / config.spawn_scale).floor() as usize).min(config.burst_cap)
}

pub struct TrailEngine<S> {
    config: TrailConfig,
    lifecycle: Lifecycle<S>,
    rng: SmallRng,
    particles: Vec<TrailParticle>,
    pointer: Option<Vec2>,
    last_burst: Vec2,
}

impl<S: DrawingSurface> TrailEngine<S> {
    pub fn new(config: TrailConfig, surface: Option<S>) -> Self {
        Self {
            config,
            lifecycle: Lifecycle::new("trail", surface),
            rng: seeded_rng(None),
            particles: Vec::new(),
            pointer: None,
            last_burst: Vec2::ZERO,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = seeded_rng(Some(seed));
        self
    }

    pub fn particles(&self) -> &[TrailParticle] {
        &self.particles
    }

    pub fn pointer(&self) -> Option<Vec2> {
        self.pointer
    }

    pub fn config(&self) -> &TrailConfig {
        &self.config
    }

    pub fn surface(&self) -> Option<&S> {
        self.lifecycle.surface()
    }

    fn spawn_burst(&mut self, at: Vec2, count: usize) {
        self.particles.reserve(count);
        for _ in 0..count {
            let particle = TrailParticle::spawn(&mut self.rng, at, &self.config);
            self.particles.push(particle);
        }
    }
}

impl<S: DrawingSurface> AnimationEngine for TrailEngine<S> {
    fn name(&self) -> &'static str {
        "trail"
    }

    fn state(&self) -> EngineState {
        self.lifecycle.state()
    }

    fn create(&mut self, host: &mut dyn Host) {
        if self.lifecycle.create(host).is_some() {
            self.lifecycle.schedule(host);
        }
    }

    fn step(&mut self, host: &mut dyn Host) {
        let Some(surface) = self.lifecycle.begin_frame(host) else {
            return;
        };
        let config = &self.config;
        surface.fade(config.fade);

        self.particles.retain_mut(|particle| {
            particle.pos += particle.vel;
            particle.vel *= config.friction;
            particle.life = particle.life.saturating_sub(1);
            if !particle.is_alive() {
                return false;
            }
            let remaining = particle.remaining();
            let color = Color::hsl(particle.hue, 0.7, 0.6);
            let paint = CirclePaint {
                color,
                alpha: remaining,
                glow: Some(Glow {
                    blur: config.glow_blur,
                    color,
                }),
            };
            surface.fill_circle(particle.pos, particle.size * remaining, &paint);
            true
        });

        if let Some(pointer) = self.pointer {
            let (r, g, b) = POINTER_GLOW_RGB;
            let glow = RadialGradient::new(pointer, config.pointer_glow_radius)
                .with_stop(0.0, Color::rgba(r, g, b, 0.3))
                .with_stop(0.5, Color::rgba(r, g, b, 0.1))
                .with_stop(1.0, Color::rgba(r, g, b, 0.0));
            surface.fill_radial_gradient(&glow);
        }

        self.lifecycle.schedule(host);
    }

    /// The trail keeps its particles across resizes; only the surface changes.
    fn on_resize(&mut self, viewport: Viewport) {
        if let Some(surface) = self.lifecycle.running_surface() {
            surface.resize(viewport);
        }
    }

    fn on_pointer_move(&mut self, client: Vec2) {
        let Some(surface) = self.lifecycle.running_surface() else {
            return;
        };
        let local = surface.viewport().to_local(client);
        self.pointer = Some(local);

        let distance = local.distance(self.last_burst);
        if distance < self.config.spawn_threshold {
            return;
        }
        let count = burst_size(distance, &self.config);
        self.spawn_burst(local, count);
        self.last_burst = local;
        trace!(count, distance, live = self.particles.len(), "trail burst");
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
