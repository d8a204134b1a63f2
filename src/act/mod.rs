mod content;

use crate::audio::AudioFeatureSnapshot;
use crate::easing::Easing;
use crate::layout::ActId;
use glam::Vec3;
use thiserror::Error;

pub use content::{
    load_optional, Asset, AssetKind, AssetRequest, ContentError, ContentFactory, ProceduralContent,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActLifecycle {
    Idle,
    Preparing,
    Entering,
    Active,
    Exiting,
}

impl ActLifecycle {
    pub fn label(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Preparing => "preparing",
            Self::Entering => "entering",
            Self::Active => "active",
            Self::Exiting => "exiting",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActAnchor {
    pub position: Vec3,
    pub look_at: Vec3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FadeDirection {
    In,
    Out,
}

/// Timed fade advanced once per host tick. Starts from whatever fade value the act currently
/// has, so interrupted fades stay monotone.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FadeAnimation {
    direction: FadeDirection,
    from: f32,
    elapsed: f32,
    duration: f32,
    easing: Easing,
}

impl FadeAnimation {
    pub fn new(direction: FadeDirection, from: f32, duration: f32, easing: Easing) -> Self {
        Self {
            direction,
            from: from.clamp(0.0, 1.0),
            elapsed: 0.0,
            duration: duration.max(0.0),
            easing,
        }
    }

    pub fn direction(&self) -> FadeDirection {
        self.direction
    }

    pub fn progress(&self) -> f32 {
        if self.duration <= 0.0 {
            1.0
        } else {
            (self.elapsed / self.duration).clamp(0.0, 1.0)
        }
    }

    pub fn value(&self) -> f32 {
        let e = self.easing.apply(self.progress());
        match self.direction {
            FadeDirection::In => self.from + (1.0 - self.from) * e,
            FadeDirection::Out => self.from * (1.0 - e),
        }
    }

    /// Steps the fade by `dt` seconds; returns `true` once it has finished.
    pub fn advance(&mut self, dt: f32) -> bool {
        self.elapsed += dt.max(0.0);
        self.progress() >= 1.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActEvent {
    Entered(ActId),
    Exited(ActId),
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ActError {
    #[error("required content failed: {0}")]
    Content(#[from] ContentError),
    #[error("{count} particles left the finite range and were reset")]
    NonFinite { count: usize },
    #[error("content used before create_content")]
    NotCreated,
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("{act}: cannot {op} while {from}")]
pub struct LifecycleError {
    pub act: ActId,
    pub op: &'static str,
    pub from: &'static str,
}

/// Read-only view of an act's simulation for status lines and tests.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ActStatus {
    pub particle_count: usize,
    pub pulse_scale: f32,
    pub beat_interval_ms: Option<f64>,
    pub beat_flash: f32,
    pub has_label: bool,
}

/// The simulation and visuals behind one act.
pub trait ActContent {
    fn name(&self) -> &'static str;

    /// One-time setup. Optional content must degrade instead of failing.
    fn create_content(&mut self, id: ActId, factory: &mut dyn ContentFactory) -> Result<(), ActError>;

    fn update_content(&mut self, audio: &AudioFeatureSnapshot, dt: f32) -> Result<(), ActError>;

    fn update_visual_effects(&mut self, _dt: f32) {}

    /// Receives the current fade value and the derived presentation scale every tick.
    fn apply_fade(&mut self, _fade: f32, _presentation_scale: f32) {}

    fn enter_easing(&self) -> Easing {
        Easing::EaseOutCubic
    }

    fn exit_easing(&self) -> Easing {
        Easing::EaseInCubic
    }

    fn enter_secs(&self) -> f32 {
        1.2
    }

    fn exit_secs(&self) -> f32 {
        0.8
    }

    fn status(&self) -> ActStatus {
        ActStatus::default()
    }

    fn dispose(&mut self) {}
}

/// Outcome of one act tick. A fault never stops the fade animation from advancing.
#[derive(Debug, Clone, PartialEq)]
pub struct ActTick {
    pub event: Option<ActEvent>,
    pub fault: Option<ActError>,
}

pub struct Act {
    id: ActId,
    lifecycle: ActLifecycle,
    fade: f32,
    anchor: Option<ActAnchor>,
    animation: Option<FadeAnimation>,
    is_simulating: bool,
    created: bool,
    disposed: bool,
    enter_count: u32,
    exit_count: u32,
    content: Box<dyn ActContent>,
}

impl Act {
    pub fn new(id: ActId, content: Box<dyn ActContent>) -> Self {
        Self {
            id,
            lifecycle: ActLifecycle::Idle,
            fade: 0.0,
            anchor: None,
            animation: None,
            is_simulating: true,
            created: false,
            disposed: false,
            enter_count: 0,
            exit_count: 0,
            content,
        }
    }

    pub fn id(&self) -> ActId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.content.name()
    }

    pub fn lifecycle(&self) -> ActLifecycle {
        self.lifecycle
    }

    pub fn fade(&self) -> f32 {
        self.fade
    }

    pub fn anchor(&self) -> Option<ActAnchor> {
        self.anchor
    }

    pub fn is_simulating(&self) -> bool {
        self.is_simulating
    }

    pub fn set_simulating(&mut self, on: bool) {
        self.is_simulating = on;
    }

    pub fn is_created(&self) -> bool {
        self.created
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    pub fn enter_count(&self) -> u32 {
        self.enter_count
    }

    pub fn exit_count(&self) -> u32 {
        self.exit_count
    }

    pub fn status(&self) -> ActStatus {
        self.content.status()
    }

    /// "Pop in / sink out": 0.8 at fade 0, 1.0 at fade 1.
    pub fn presentation_scale(&self) -> f32 {
        match self.lifecycle {
            ActLifecycle::Exiting => 1.0 - (1.0 - self.fade) * 0.2,
            ActLifecycle::Active => 1.0,
            _ => 0.8 + self.fade * 0.2,
        }
    }

    /// Anchors are assigned once; later calls are ignored.
    pub fn assign_anchor(&mut self, anchor: ActAnchor) {
        if self.anchor.is_some() {
            log::warn!("{}: anchor already assigned", self.id);
            return;
        }
        self.anchor = Some(anchor);
    }

    pub fn create(&mut self, factory: &mut dyn ContentFactory) -> Result<(), ActError> {
        if self.created {
            return Ok(());
        }
        self.content.create_content(self.id, factory)?;
        self.created = true;
        log::debug!("{} '{}' created", self.id, self.name());
        Ok(())
    }

    pub fn prepare_entry(&mut self) -> Result<(), LifecycleError> {
        match self.lifecycle {
            ActLifecycle::Entering => Err(self.lifecycle_error("prepare entry")),
            _ => {
                self.animation = None;
                self.lifecycle = ActLifecycle::Preparing;
                Ok(())
            }
        }
    }

    pub fn enter(&mut self) -> Result<(), LifecycleError> {
        if self.lifecycle != ActLifecycle::Preparing {
            return Err(self.lifecycle_error("enter"));
        }
        self.animation = Some(FadeAnimation::new(
            FadeDirection::In,
            self.fade,
            self.content.enter_secs(),
            self.content.enter_easing(),
        ));
        self.lifecycle = ActLifecycle::Entering;
        self.enter_count += 1;
        Ok(())
    }

    pub fn exit(&mut self) -> Result<(), LifecycleError> {
        if !matches!(self.lifecycle, ActLifecycle::Active | ActLifecycle::Entering) {
            return Err(self.lifecycle_error("exit"));
        }
        self.animation = Some(FadeAnimation::new(
            FadeDirection::Out,
            self.fade,
            self.content.exit_secs(),
            self.content.exit_easing(),
        ));
        self.lifecycle = ActLifecycle::Exiting;
        self.exit_count += 1;
        Ok(())
    }

    /// One host tick: advances the fade, then (if simulating) the content.
    pub fn update(&mut self, audio: &AudioFeatureSnapshot, dt: f32) -> ActTick {
        let event = self.advance_animation(dt);
        self.content.apply_fade(self.fade, self.presentation_scale());

        let mut fault = None;
        if self.is_simulating && self.created && !self.disposed {
            if let Err(err) = self.content.update_content(audio, dt) {
                fault = Some(err);
            }
            self.content.update_visual_effects(dt);
        }
        ActTick { event, fault }
    }

    fn advance_animation(&mut self, dt: f32) -> Option<ActEvent> {
        let anim = self.animation.as_mut()?;
        let done = anim.advance(dt);
        self.fade = anim.value();
        if !done {
            return None;
        }
        self.animation = None;
        match self.lifecycle {
            ActLifecycle::Entering => {
                self.fade = 1.0;
                self.lifecycle = ActLifecycle::Active;
                Some(ActEvent::Entered(self.id))
            }
            ActLifecycle::Exiting => {
                self.fade = 0.0;
                self.lifecycle = ActLifecycle::Idle;
                Some(ActEvent::Exited(self.id))
            }
            _ => None,
        }
    }

    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.content.dispose();
        self.disposed = true;
        self.animation = None;
        self.lifecycle = ActLifecycle::Idle;
    }

    fn lifecycle_error(&self, op: &'static str) -> LifecycleError {
        LifecycleError {
            act: self.id,
            op,
            from: self.lifecycle.label(),
        }
    }
}
