use std::collections::BTreeMap;

/// One exponentially smoothed value: `smoothed += (x - smoothed) * coefficient`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Smoothed {
    value: f32,
    coefficient: f32,
}

impl Smoothed {
    pub fn new(initial: f32, coefficient: f32) -> Self {
        Self {
            value: initial,
            coefficient: coefficient.clamp(0.0, 1.0),
        }
    }

    pub fn update(&mut self, instantaneous: f32) -> f32 {
        self.value += (instantaneous - self.value) * self.coefficient;
        self.value
    }

    pub fn value(&self) -> f32 {
        self.value
    }

    pub fn coefficient(&self) -> f32 {
        self.coefficient
    }

    pub fn reset(&mut self, value: f32) {
        self.value = value;
    }
}

/// Named smoothing channels, each updated at most once per tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SmoothingBank {
    channels: BTreeMap<&'static str, Smoothed>,
}

impl SmoothingBank {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_channel(mut self, name: &'static str, coefficient: f32) -> Self {
        self.channels.insert(name, Smoothed::new(0.0, coefficient));
        self
    }

    /// Feeds `x` into `name`, creating the channel with `coefficient` on first use.
    pub fn update(&mut self, name: &'static str, x: f32, coefficient: f32) -> f32 {
        self.channels
            .entry(name)
            .or_insert_with(|| Smoothed::new(0.0, coefficient))
            .update(x)
    }

    pub fn get(&self, name: &str) -> f32 {
        self.channels.get(name).map(Smoothed::value).unwrap_or(0.0)
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }
}
