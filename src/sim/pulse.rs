#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PulseSettings {
    pub base: f32,
    pub gain: f32,
    pub impulse: f32,
    pub spring: f32,
    /// Per-tick velocity multiplier.
    pub damping: f32,
    pub baseline: f32,
    pub relax: f32,
}

impl Default for PulseSettings {
    fn default() -> Self {
        Self {
            base: 1.05,
            gain: 0.35,
            impulse: 0.9,
            spring: 60.0,
            damping: 0.86,
            baseline: 1.0,
            relax: 3.0,
        }
    }
}

/// Spring-damped "heartbeat" scale. Beats kick the target and the velocity; every tick the
/// scale chases the target while the target relaxes back to the baseline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PulseSpring {
    settings: PulseSettings,
    current: f32,
    target: f32,
    velocity: f32,
}

impl PulseSpring {
    pub fn new(settings: PulseSettings) -> Self {
        Self {
            current: settings.baseline,
            target: settings.baseline,
            velocity: 0.0,
            settings,
        }
    }

    pub fn current(&self) -> f32 {
        self.current
    }

    pub fn target(&self) -> f32 {
        self.target
    }

    pub fn velocity(&self) -> f32 {
        self.velocity
    }

    pub fn trigger(&mut self, bass: f32) {
        self.target = self.settings.base + bass * self.settings.gain;
        self.velocity += self.settings.impulse;
    }

    pub fn step(&mut self, dt: f32) {
        let s = &self.settings;
        self.velocity += (self.target - self.current) * s.spring * dt;
        self.velocity *= s.damping;
        self.current += self.velocity * dt;
        self.target += (s.baseline - self.target) * dt * s.relax;
    }
}
