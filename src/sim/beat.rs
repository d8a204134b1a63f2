use ringbuf::HeapRb;
use ringbuf::traits::{Consumer as _, Observer as _, RingBuffer as _};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BeatSettings {
    /// Bass energy that must be exceeded for a beat.
    pub threshold: f32,
    /// Fraction of the current interval during which new beats are ignored.
    pub refractory: f64,
    pub initial_interval_ms: f64,
    pub history: usize,
    pub min_samples: usize,
    /// Gaps longer than this are treated as a lost tempo and not averaged in.
    pub max_gap_ms: f64,
}

impl Default for BeatSettings {
    fn default() -> Self {
        Self {
            threshold: 0.55,
            refractory: 0.6,
            initial_interval_ms: 500.0,
            history: 10,
            min_samples: 3,
            max_gap_ms: 2_000.0,
        }
    }
}

/// Tempo-following bass beat detector.
pub struct BeatTracker {
    settings: BeatSettings,
    last_beat_ms: Option<f64>,
    interval_ms: f64,
    deltas: HeapRb<f64>,
}

impl BeatTracker {
    pub fn new(settings: BeatSettings) -> Self {
        Self {
            deltas: HeapRb::new(settings.history.max(1)),
            last_beat_ms: None,
            interval_ms: settings.initial_interval_ms,
            settings,
        }
    }

    pub fn settings(&self) -> &BeatSettings {
        &self.settings
    }

    pub fn interval_ms(&self) -> f64 {
        self.interval_ms
    }

    pub fn bpm(&self) -> f64 {
        60_000.0 / self.interval_ms.max(1.0)
    }

    pub fn last_beat_ms(&self) -> Option<f64> {
        self.last_beat_ms
    }

    pub fn sample_count(&self) -> usize {
        self.deltas.occupied_len()
    }

    pub fn deltas(&self) -> Vec<f64> {
        self.deltas.iter().copied().collect()
    }

    /// Feeds one tick of bass energy at `now_ms`; returns whether a beat fired.
    pub fn detect(&mut self, bass: f32, now_ms: f64) -> bool {
        if bass <= self.settings.threshold {
            return false;
        }
        let refractory_ms = self.interval_ms * self.settings.refractory;
        if let Some(last) = self.last_beat_ms {
            let delta = now_ms - last;
            if delta <= refractory_ms {
                return false;
            }
            if delta <= self.settings.max_gap_ms {
                self.record_delta(delta);
            }
        }
        self.last_beat_ms = Some(now_ms);
        true
    }

    /// Pushes an inter-beat delta and re-derives the interval once enough samples exist.
    pub fn record_delta(&mut self, delta_ms: f64) {
        self.deltas.push_overwrite(delta_ms);
        let n = self.deltas.occupied_len();
        if n >= self.settings.min_samples {
            self.interval_ms = self.deltas.iter().sum::<f64>() / n as f64;
        }
    }

    pub fn reset(&mut self) {
        self.deltas.clear();
        self.last_beat_ms = None;
        self.interval_ms = self.settings.initial_interval_ms;
    }
}
