use std::path::Path;
use thiserror::Error;

/// Act and transition durations in milliseconds. `demo_mode` picks the demo pair wholesale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimingProfile {
    act_duration: f64,
    transition_duration: f64,
    demo_act_duration: f64,
    demo_transition_duration: f64,
}

impl Default for TimingProfile {
    fn default() -> Self {
        Self {
            act_duration: 45_000.0,
            transition_duration: 4_000.0,
            demo_act_duration: 12_000.0,
            demo_transition_duration: 2_000.0,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum TimingError {
    #[error("I/O error: {0}")]
    Io(String),
    #[error("parse error at line {line}: {message}")]
    Parse { line: usize, message: String },
    #[error("{field} must be a positive, finite number of milliseconds (got {value})")]
    InvalidDuration { field: &'static str, value: f64 },
}

impl TimingProfile {
    pub fn new(
        act_duration: f64,
        transition_duration: f64,
        demo_act_duration: f64,
        demo_transition_duration: f64,
    ) -> Result<Self, TimingError> {
        let profile = Self {
            act_duration,
            transition_duration,
            demo_act_duration,
            demo_transition_duration,
        };
        profile.validate()?;
        Ok(profile)
    }

    pub fn act_duration(&self) -> f64 {
        self.act_duration
    }

    pub fn transition_duration(&self) -> f64 {
        self.transition_duration
    }

    pub fn demo_act_duration(&self) -> f64 {
        self.demo_act_duration
    }

    pub fn demo_transition_duration(&self) -> f64 {
        self.demo_transition_duration
    }

    pub fn act_duration_for(&self, demo_mode: bool) -> f64 {
        if demo_mode {
            self.demo_act_duration
        } else {
            self.act_duration
        }
    }

    pub fn transition_duration_for(&self, demo_mode: bool) -> f64 {
        if demo_mode {
            self.demo_transition_duration
        } else {
            self.transition_duration
        }
    }

    /// Parses `key=value` lines; unspecified keys keep their defaults.
    pub fn parse(text: &str) -> Result<Self, TimingError> {
        let mut p = Self::default();
        for (line_idx, raw) in text.lines().enumerate() {
            let line_no = line_idx + 1;
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key_raw, value_raw)) = line.split_once('=') else {
                return Err(TimingError::Parse {
                    line: line_no,
                    message: "expected <key>=<value>".to_string(),
                });
            };
            let value = value_raw.trim().parse::<f64>().map_err(|_| TimingError::Parse {
                line: line_no,
                message: format!("invalid number '{}'", value_raw.trim()),
            })?;
            match key_raw.trim() {
                "act_duration_ms" => p.act_duration = value,
                "transition_duration_ms" => p.transition_duration = value,
                "demo_act_duration_ms" => p.demo_act_duration = value,
                "demo_transition_duration_ms" => p.demo_transition_duration = value,
                other => {
                    return Err(TimingError::Parse {
                        line: line_no,
                        message: format!("unknown key '{other}'"),
                    });
                }
            }
        }
        p.validate()?;
        Ok(p)
    }

    /// Missing files yield the default profile.
    pub fn load(path: Option<&Path>) -> Result<Self, TimingError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        match std::fs::read_to_string(path) {
            Ok(text) => Self::parse(&text),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(TimingError::Io(err.to_string())),
        }
    }

    pub fn to_text(&self) -> String {
        format!(
            "act_duration_ms={}\ntransition_duration_ms={}\ndemo_act_duration_ms={}\ndemo_transition_duration_ms={}\n",
            self.act_duration,
            self.transition_duration,
            self.demo_act_duration,
            self.demo_transition_duration
        )
    }

    fn validate(&self) -> Result<(), TimingError> {
        let fields = [
            ("act_duration", self.act_duration),
            ("transition_duration", self.transition_duration),
            ("demo_act_duration", self.demo_act_duration),
            ("demo_transition_duration", self.demo_transition_duration),
        ];
        for (field, value) in fields {
            if !value.is_finite() || value <= 0.0 {
                return Err(TimingError::InvalidDuration { field, value });
            }
        }
        Ok(())
    }
}
