//! Lifecycle shared by both engines.
//!
//! ```text
//! Uninitialized --create--> Running --teardown--> TornDown
//!                            |   ^
//!                            +---+ step / resize / pointer move
//! ```
//!
//! `Running` is the only state with visible side effects. A missing surface
//! keeps the engine `Uninitialized`: nothing is registered and nothing is
//! scheduled, so the page simply shows no animation.

use std::ops::Range;

use glam::Vec2;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use stardrift_platform::{
    DrawingSurface, FrameHandle, Host, ListenerId, ListenerKind, Viewport,
};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Uninitialized,
    Running,
    TornDown,
}

/// Operations a presentation layer drives an engine with.
///
/// The host calls `step` when the frame handle reported by
/// [`AnimationEngine::pending_frame`] fires, and forwards pointer-move and
/// resize notifications to engines that own a live listener of that kind.
pub trait AnimationEngine {
    fn name(&self) -> &'static str;
    fn state(&self) -> EngineState;
    fn create(&mut self, host: &mut dyn Host);
    fn step(&mut self, host: &mut dyn Host);
    fn on_resize(&mut self, viewport: Viewport);
    /// `client` is in host client coordinates.
    fn on_pointer_move(&mut self, client: Vec2);
    fn teardown(&mut self, host: &mut dyn Host);
    fn pending_frame(&self) -> Option<FrameHandle>;
    fn owns_listener(&self, id: ListenerId) -> bool;
}

/// Surface ownership, the outstanding frame handle and listener ids.
pub(crate) struct Lifecycle<S> {
    name: &'static str,
    state: EngineState,
    surface: Option<S>,
    pending: Option<FrameHandle>,
    listeners: Vec<ListenerId>,
}

impl<S: DrawingSurface> Lifecycle<S> {
    pub(crate) fn new(name: &'static str, surface: Option<S>) -> Self {
        Self {
            name,
            state: EngineState::Uninitialized,
            surface,
            pending: None,
            listeners: Vec::new(),
        }
    }

    /// Resizes the surface to the host viewport, registers listeners and
    /// enters `Running`. Returns the viewport to build state for, or `None`
    /// when the engine must stay inert.
    pub(crate) fn create(&mut self, host: &mut dyn Host) -> Option<Viewport> {
        if self.state != EngineState::Uninitialized {
            debug!(engine = self.name, state = ?self.state, "create ignored");
            return None;
        }
        let Some(surface) = self.surface.as_mut() else {
            debug!(engine = self.name, "no drawing surface; staying inert");
            return None;
        };
        let viewport = host.viewport();
        surface.resize(viewport);
        self.listeners = vec![
            host.add_listener(ListenerKind::PointerMove),
            host.add_listener(ListenerKind::Resize),
        ];
        self.state = EngineState::Running;
        info!(
            engine = self.name,
            width = viewport.width,
            height = viewport.height,
            "engine created"
        );
        Some(viewport)
    }

    pub(crate) fn schedule(&mut self, host: &mut dyn Host) {
        if self.state == EngineState::Running {
            self.pending = Some(host.request_frame());
        }
    }

    /// Consumes the outstanding frame handle and hands out the surface to
    /// draw on. A step that runs before its frame fired withdraws that frame
    /// from the host, so at most one frame per engine is ever queued.
    pub(crate) fn begin_frame(&mut self, host: &mut dyn Host) -> Option<&mut S> {
        if self.state != EngineState::Running {
            return None;
        }
        if let Some(handle) = self.pending.take() {
            host.cancel_frame(handle);
        }
        self.surface.as_mut()
    }

    pub(crate) fn running_surface(&mut self) -> Option<&mut S> {
        match self.state {
            EngineState::Running => self.surface.as_mut(),
            _ => None,
        }
    }

    pub(crate) fn teardown(&mut self, host: &mut dyn Host) {
        if self.state == EngineState::TornDown {
            return;
        }
        // The frame goes first so nothing can fire against a released surface.
        if let Some(handle) = self.pending.take() {
            host.cancel_frame(handle);
        }
        for id in self.listeners.drain(..) {
            host.remove_listener(id);
        }
        self.surface = None;
        self.state = EngineState::TornDown;
        info!(engine = self.name, "engine torn down");
    }

    pub(crate) fn state(&self) -> EngineState {
        self.state
    }

    pub(crate) fn pending(&self) -> Option<FrameHandle> {
        self.pending
    }

    pub(crate) fn owns_listener(&self, id: ListenerId) -> bool {
        self.listeners.contains(&id)
    }

    pub(crate) fn surface(&self) -> Option<&S> {
        self.surface.as_ref()
    }
}

pub(crate) fn seeded_rng(seed: Option<u64>) -> SmallRng {
    match seed {
        Some(seed) => SmallRng::seed_from_u64(seed),
        None => SmallRng::from_entropy(),
    }
}

/// Uniform sample that degrades to `range.start` for an empty range
/// instead of panicking.
pub(crate) fn sample(rng: &mut SmallRng, range: &Range<f32>) -> f32 {
    if range.start < range.end {
        rng.gen_range(range.clone())
    } else {
        range.start
    }
}

/// Linear opacity falloff: `peak` at distance 0, `None` from `max_distance` on.
pub fn proximity_alpha(distance: f32, max_distance: f32, peak: f32) -> Option<f32> {
    if distance < max_distance {
        Some((1.0 - distance / max_distance) * peak)
    } else {
        None
    }
}
