//! Reusable per-act force-field simulation: tempo-following beat detection, a spring-damped
//! pulse scale, an implicit-surface force field and particle integration.

mod beat;
mod field;
mod particles;
mod pulse;

pub use beat::{BeatSettings, BeatTracker};
pub use field::{
    BloomShape, FieldRegion, FieldSample, FieldSettings, HeartShape, ImplicitShape, TorusShape,
};
pub use particles::{IntegrationSettings, ParticleSystem, StepDrive, StepStats};
pub use pulse::{PulseSettings, PulseSpring};
