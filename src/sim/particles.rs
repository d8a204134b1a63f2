use super::field::{FieldRegion, FieldSettings, ImplicitShape};
use glam::Vec3;
use std::f32::consts::TAU;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntegrationSettings {
    pub force_gain: f32,
    /// Per-tick velocity multiplier.
    pub damping: f32,
    pub time_scale: f32,
    pub noise_gain: f32,
    /// Rate (per second) at which positions are pulled back toward their rest positions.
    pub rest_return: f32,
}

impl Default for IntegrationSettings {
    fn default() -> Self {
        Self {
            force_gain: 0.08,
            damping: 0.94,
            time_scale: 1.0,
            noise_gain: 0.03,
            rest_return: 0.35,
        }
    }
}

/// Inputs for one integration step, already smoothed by the owning act.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepDrive {
    pub scale: f32,
    pub pulse: f32,
    pub bass: f32,
    pub treble: f32,
    pub scale_boost: f32,
    pub dt: f32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepStats {
    pub inside: usize,
    pub outside: usize,
    pub boundary: usize,
    pub reset: usize,
}

/// Particle buffers for one act: position, velocity, rest position, phase and speed.
pub struct ParticleSystem {
    positions: Vec<Vec3>,
    velocities: Vec<Vec3>,
    rest: Vec<Vec3>,
    phase: Vec<f32>,
    speed: Vec<f32>,
    rng: fastrand::Rng,
}

impl ParticleSystem {
    /// Seeds `count` particles on (or near) `shape`'s surface.
    pub fn new(count: usize, shape: &dyn ImplicitShape, seed: u64) -> Self {
        let mut rng = fastrand::Rng::with_seed(seed);
        let extent = shape.extent();
        let mut rest = Vec::with_capacity(count);
        for _ in 0..count {
            let guess = Vec3::new(
                (rng.f32() * 2.0 - 1.0) * extent,
                (rng.f32() * 2.0 - 1.0) * extent,
                (rng.f32() * 2.0 - 1.0) * extent,
            );
            let mut p = shape.project(guess, 12);
            if !p.is_finite() {
                p = guess * 0.5;
            }
            rest.push(p);
        }
        let phase = (0..count).map(|_| rng.f32() * TAU).collect();
        let speed = (0..count).map(|_| 0.5 + rng.f32()).collect();
        Self {
            positions: rest.clone(),
            velocities: vec![Vec3::ZERO; count],
            rest,
            phase,
            speed,
            rng,
        }
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    pub fn velocities(&self) -> &[Vec3] {
        &self.velocities
    }

    pub fn rest_positions(&self) -> &[Vec3] {
        &self.rest
    }

    pub fn set_position(&mut self, index: usize, p: Vec3) {
        if let Some(slot) = self.positions.get_mut(index) {
            *slot = p;
        }
    }

    pub fn centroid(&self) -> Vec3 {
        if self.positions.is_empty() {
            return Vec3::ZERO;
        }
        self.positions.iter().copied().sum::<Vec3>() / self.positions.len() as f32
    }

    pub fn max_radius(&self) -> f32 {
        self.positions.iter().map(|p| p.length()).fold(0.0, f32::max)
    }

    /// Adds the same velocity kick to every particle along its outward rest direction.
    pub fn burst(&mut self, strength: f32) {
        for (v, r) in self.velocities.iter_mut().zip(&self.rest) {
            *v += r.normalize_or_zero() * strength;
        }
    }

    /// One tick: field force, treble noise, integration, damping and rest spring.
    pub fn step(
        &mut self,
        shape: &dyn ImplicitShape,
        field: &FieldSettings,
        integ: &IntegrationSettings,
        drive: StepDrive,
    ) -> StepStats {
        let mut stats = StepStats::default();
        let dt = drive.dt.max(0.0);
        let return_k = (integ.rest_return * dt).clamp(0.0, 1.0);

        for i in 0..self.positions.len() {
            let p = self.positions[i];
            let sample = field.sample(shape, p, drive.scale, drive.pulse, drive.bass);
            match sample.region {
                FieldRegion::Inside => stats.inside += 1,
                FieldRegion::Outside => stats.outside += 1,
                FieldRegion::Boundary => stats.boundary += 1,
            }

            self.phase[i] = (self.phase[i] + self.speed[i] * dt * TAU) % TAU;
            let ph = self.phase[i];
            let wobble = Vec3::new(ph.sin(), (ph * 1.3).cos(), (ph * 0.7).sin());
            let jitter = Vec3::new(
                self.rng.f32() - 0.5,
                self.rng.f32() - 0.5,
                self.rng.f32() - 0.5,
            );
            let noise = (wobble * 0.5 + jitter) * drive.treble * integ.noise_gain * self.speed[i];

            let mut v = self.velocities[i] + sample.force * integ.force_gain * drive.scale_boost + noise;
            let mut np = p + v * dt * integ.time_scale;
            v *= integ.damping;
            np += (self.rest[i] * drive.scale - np) * return_k;

            if !np.is_finite() || !v.is_finite() {
                np = self.rest[i] * drive.scale;
                v = Vec3::ZERO;
                stats.reset += 1;
            }
            self.positions[i] = np;
            self.velocities[i] = v;
        }
        stats
    }
}
