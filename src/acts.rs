//! The four stock acts. Each is a [`ParticleAct`] configured with its own implicit shape and
//! audio response; they differ only in data, so new acts are a constructor away.

use crate::act::{
    load_optional, Act, ActContent, ActError, ActStatus, Asset, AssetKind, AssetRequest,
    ContentFactory,
};
use crate::audio::AudioFeatureSnapshot;
use crate::layout::ActId;
use crate::sim::{
    BeatSettings, BeatTracker, BloomShape, FieldSettings, HeartShape, ImplicitShape,
    IntegrationSettings, ParticleSystem, PulseSettings, PulseSpring, StepDrive, StepStats,
    TorusShape,
};
use crate::smoothing::SmoothingBank;

const BASS_SMOOTHING: f32 = 0.25;
const TREBLE_SMOOTHING: f32 = 0.15;
const VOLUME_SMOOTHING: f32 = 0.1;
const FLASH_DECAY_PER_SEC: f32 = 4.0;

/// How an act reacts to rhythm.
enum Rhythm {
    /// Own beat detection on bass, driving a spring-damped pulse scale.
    Tracked {
        tracker: BeatTracker,
        pulse: PulseSpring,
    },
    /// Follows the stream's beat flag with an outward velocity burst.
    Burst { strength: f32 },
    /// Continuous response only.
    Ambient,
}

pub struct ParticleAct {
    name: &'static str,
    shape: Box<dyn ImplicitShape>,
    count: usize,
    seed: u64,
    field: FieldSettings,
    integration: IntegrationSettings,
    rhythm: Rhythm,
    smoothing: SmoothingBank,
    particles: Option<ParticleSystem>,
    label: Option<Asset>,
    clock_ms: f64,
    beat_flash: f32,
    presentation_scale: f32,
    last_stats: StepStats,
}

impl ParticleAct {
    fn new(name: &'static str, shape: Box<dyn ImplicitShape>, count: usize, rhythm: Rhythm) -> Self {
        Self {
            name,
            shape,
            count,
            seed: 0x5eed_a11c,
            field: FieldSettings::default(),
            integration: IntegrationSettings::default(),
            rhythm,
            smoothing: SmoothingBank::new()
                .with_channel("bass", BASS_SMOOTHING)
                .with_channel("treble", TREBLE_SMOOTHING)
                .with_channel("volume", VOLUME_SMOOTHING),
            particles: None,
            label: None,
            clock_ms: 0.0,
            beat_flash: 0.0,
            presentation_scale: 0.8,
            last_stats: StepStats::default(),
        }
    }

    fn tracked() -> Rhythm {
        Rhythm::Tracked {
            tracker: BeatTracker::new(BeatSettings::default()),
            pulse: PulseSpring::new(PulseSettings::default()),
        }
    }

    pub fn heart() -> Self {
        Self::new("heartbeat", Box::new(HeartShape { radius: 2.4 }), 1_200, Self::tracked())
    }

    pub fn torus() -> Self {
        let mut act = Self::new(
            "orbit",
            Box::new(TorusShape {
                major: 2.2,
                minor: 0.8,
            }),
            1_000,
            Self::tracked(),
        );
        act.field.tangent_strength = 1.6;
        act
    }

    pub fn swarm() -> Self {
        let mut act = Self::new(
            "swarm",
            Box::new(BloomShape {
                radius: 2.5,
                lobes: 0,
                lobe_depth: 0.0,
            }),
            800,
            Rhythm::Burst { strength: 0.6 },
        );
        act.integration.noise_gain = 0.08;
        act.integration.rest_return = 0.2;
        act
    }

    pub fn bloom() -> Self {
        let mut act = Self::new(
            "bloom",
            Box::new(BloomShape {
                radius: 2.2,
                lobes: 5,
                lobe_depth: 0.25,
            }),
            1_000,
            Rhythm::Ambient,
        );
        act.field.bass_tolerance = 0.45;
        act
    }

    pub fn with_particle_count(mut self, count: usize) -> Self {
        self.count = count;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn particles(&self) -> Option<&ParticleSystem> {
        self.particles.as_ref()
    }

    pub fn last_stats(&self) -> StepStats {
        self.last_stats
    }

    fn pulse_scale(&self) -> f32 {
        match &self.rhythm {
            Rhythm::Tracked { pulse, .. } => pulse.current(),
            _ => 1.0,
        }
    }
}

impl ActContent for ParticleAct {
    fn name(&self) -> &'static str {
        self.name
    }

    fn create_content(&mut self, id: ActId, factory: &mut dyn ContentFactory) -> Result<(), ActError> {
        factory.load(&AssetRequest {
            act: id,
            name: "particles",
            kind: AssetKind::Geometry,
            optional: false,
        })?;
        self.label = load_optional(
            factory,
            &AssetRequest {
                act: id,
                name: "label",
                kind: AssetKind::Font,
                optional: true,
            },
        );
        let seed = self.seed ^ u64::from(id.0).wrapping_mul(0x9e37_79b9_7f4a_7c15);
        self.particles = Some(ParticleSystem::new(self.count, self.shape.as_ref(), seed));
        log::debug!(
            "{id}: {} particles on a {} field",
            self.count,
            self.shape.name()
        );
        Ok(())
    }

    fn update_content(&mut self, audio: &AudioFeatureSnapshot, dt: f32) -> Result<(), ActError> {
        let dt = dt.max(0.0);
        self.clock_ms += f64::from(dt) * 1_000.0;
        let bass = self.smoothing.update("bass", audio.bass, BASS_SMOOTHING);
        let treble = self.smoothing.update("treble", audio.treble, TREBLE_SMOOTHING);
        let volume = self.smoothing.update("volume", audio.volume, VOLUME_SMOOTHING);

        let Some(particles) = self.particles.as_mut() else {
            return Err(ActError::NotCreated);
        };

        match &mut self.rhythm {
            Rhythm::Tracked { tracker, pulse } => {
                if tracker.detect(audio.bass, self.clock_ms) {
                    pulse.trigger(audio.bass);
                    self.beat_flash = 1.0;
                }
                pulse.step(dt);
            }
            Rhythm::Burst { strength } => {
                if audio.beat {
                    particles.burst(*strength * (0.5 + bass));
                    self.beat_flash = 1.0;
                }
            }
            Rhythm::Ambient => {}
        }

        let pulse_scale = match &self.rhythm {
            Rhythm::Tracked { pulse, .. } => pulse.current(),
            _ => 1.0,
        };
        let drive = StepDrive {
            scale: self.presentation_scale * pulse_scale,
            pulse: pulse_scale - 1.0,
            bass,
            treble,
            scale_boost: 1.0 + volume * 0.5,
            dt,
        };
        self.last_stats = particles.step(self.shape.as_ref(), &self.field, &self.integration, drive);
        if self.last_stats.reset > 0 {
            return Err(ActError::NonFinite {
                count: self.last_stats.reset,
            });
        }
        Ok(())
    }

    fn update_visual_effects(&mut self, dt: f32) {
        self.beat_flash = (self.beat_flash - dt.max(0.0) * FLASH_DECAY_PER_SEC).max(0.0);
    }

    fn apply_fade(&mut self, _fade: f32, presentation_scale: f32) {
        self.presentation_scale = presentation_scale;
    }

    fn status(&self) -> ActStatus {
        ActStatus {
            particle_count: self.particles.as_ref().map_or(0, ParticleSystem::len),
            pulse_scale: self.pulse_scale(),
            beat_interval_ms: match &self.rhythm {
                Rhythm::Tracked { tracker, .. } => Some(tracker.interval_ms()),
                _ => None,
            },
            beat_flash: self.beat_flash,
            has_label: self.label.is_some(),
        }
    }

    fn dispose(&mut self) {
        self.particles = None;
        self.label = None;
    }
}

/// Builds the four stock acts with ids 1..=4.
pub fn default_acts() -> Vec<Act> {
    vec![
        Act::new(ActId(1), Box::new(ParticleAct::heart())),
        Act::new(ActId(2), Box::new(ParticleAct::torus())),
        Act::new(ActId(3), Box::new(ParticleAct::swarm())),
        Act::new(ActId(4), Box::new(ParticleAct::bloom())),
    ]
}

/// Same acts with fewer particles, for tests and quick headless runs.
pub fn lightweight_acts(count: usize) -> Vec<Act> {
    vec![
        Act::new(ActId(1), Box::new(ParticleAct::heart().with_particle_count(count))),
        Act::new(ActId(2), Box::new(ParticleAct::torus().with_particle_count(count))),
        Act::new(ActId(3), Box::new(ParticleAct::swarm().with_particle_count(count))),
        Act::new(ActId(4), Box::new(ParticleAct::bloom().with_particle_count(count))),
    ]
}
