use crate::camera::LookAtMode;
use crate::orchestrator::NavigationMode;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(name = "act-stage", version, about = "Audio-reactive four-act particle performance driven from the terminal")]
pub struct Config {
    #[arg(long, value_enum, default_value_t = AudioSource::Synthetic)]
    pub source: AudioSource,

    /// Substring of the input device name (mic source only).
    #[arg(long)]
    pub device: Option<String>,

    /// Tempo of the synthetic source.
    #[arg(long, default_value_t = 120.0)]
    pub bpm: f32,

    #[arg(long, default_value_t = 60)]
    pub fps: u32,

    #[arg(long, default_value_t = false)]
    pub demo: bool,

    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub auto_progress: bool,

    #[arg(long, value_enum, default_value_t = Navigation::Camera)]
    pub navigation: Navigation,

    #[arg(long, value_enum, default_value_t = LookAt::Smooth)]
    pub look_at: LookAt,

    /// Camera easing: linear, easeInOut, easeInOutCubic, easeInOutQuart or easeOutBack.
    #[arg(long, default_value = "easeInOutCubic")]
    pub easing: String,

    /// `key=value` timing overrides (milliseconds).
    #[arg(long)]
    pub timing: Option<PathBuf>,

    /// Act placement file; defaults to the built-in square.
    #[arg(long)]
    pub layout: Option<PathBuf>,

    /// Run without a terminal UI on a simulated clock.
    #[arg(long, default_value_t = false)]
    pub headless: bool,

    /// Frames to run in headless mode.
    #[arg(long, default_value_t = 600)]
    pub frames: u64,

    #[arg(long, default_value_t = false)]
    pub list_devices: bool,

    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..=4))]
    pub start_act: u32,

    /// Stop simulating acts that are off stage.
    #[arg(long, default_value_t = false)]
    pub pause_background: bool,
}

impl Config {
    /// Tick length in milliseconds for the configured frame rate.
    pub fn frame_ms(&self) -> f64 {
        1_000.0 / f64::from(self.fps.clamp(1, 240))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AudioSource {
    #[value(alias = "synth", alias = "demo")]
    Synthetic,
    #[value(alias = "none")]
    Silent,
    #[value(alias = "microphone", alias = "live")]
    Mic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Navigation {
    #[value(alias = "fly")]
    Camera,
    #[value(alias = "cut")]
    Fade,
}

impl From<Navigation> for NavigationMode {
    fn from(n: Navigation) -> Self {
        match n {
            Navigation::Camera => Self::Camera,
            Navigation::Fade => Self::Fade,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LookAt {
    Smooth,
    Snap,
}

impl From<LookAt> for LookAtMode {
    fn from(l: LookAt) -> Self {
        match l {
            LookAt::Smooth => Self::Smooth,
            LookAt::Snap => Self::Snap,
        }
    }
}
