//! Stardrift core engine: host-agnostic particle effects for a page backdrop
//! and a pointer trail overlay.
//!
//! Both engines render through [`stardrift_platform::DrawingSurface`] and are
//! driven through the [`AnimationEngine`] lifecycle by whatever presentation
//! layer mounts them.

pub mod config;
pub mod engine;
pub mod error;
pub mod field;
pub mod trail;

pub use config::{EngineConfig, FieldConfig, TrailConfig};
pub use engine::{proximity_alpha, AnimationEngine, EngineState};
pub use error::{ConfigError, Result};
pub use field::{particle_count, pull_impulse, wrap, FieldEngine, FieldParticle};
pub use trail::{burst_size, TrailEngine, TrailParticle};
