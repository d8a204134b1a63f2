use crate::act::ProceduralContent;
use crate::acts::default_acts;
use crate::audio::{AudioFeatureStream, LiveAudio, SilentAudio, SyntheticAudio};
use crate::camera::CameraSettings;
use crate::config::{AudioSource, Config};
use crate::easing::Easing;
use crate::layout::{LayoutProvider, StaticLayout};
use crate::orchestrator::{Orchestrator, OrchestratorEvent, OrchestratorSettings};
use crate::terminal::StageScreen;
use crate::timing::TimingProfile;
use anyhow::Context;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use std::fmt::Write as _;
use std::time::{Duration, Instant};

/// Builds and initializes the orchestrator described by `cfg`.
pub fn build_orchestrator(cfg: &Config) -> anyhow::Result<Orchestrator> {
    let timing = TimingProfile::load(cfg.timing.as_deref()).context("load timing profile")?;
    let layout: Box<dyn LayoutProvider> = match &cfg.layout {
        Some(path) => Box::new(
            StaticLayout::load(path).with_context(|| format!("load layout {}", path.display()))?,
        ),
        None => Box::new(StaticLayout::default()),
    };
    if !Easing::is_camera_name(&cfg.easing) {
        log::warn!("'{}' is not a camera easing, using easeInOutCubic", cfg.easing);
    }
    let camera = CameraSettings {
        easing: Easing::camera_by_name(&cfg.easing),
        look_at_mode: cfg.look_at.into(),
        ..CameraSettings::default()
    };
    let settings = OrchestratorSettings {
        timing,
        demo_mode: cfg.demo,
        auto_progress: cfg.auto_progress,
        navigation: cfg.navigation.into(),
        simulate_background_acts: !cfg.pause_background,
        start_act: cfg.start_act,
        ..OrchestratorSettings::default()
    };

    let mut orchestrator = Orchestrator::new(default_acts(), layout, camera, settings)?;
    orchestrator
        .initialize(&mut ProceduralContent::new())
        .context("create act content")?;
    Ok(orchestrator)
}

pub fn open_audio(cfg: &Config) -> anyhow::Result<Box<dyn AudioFeatureStream>> {
    Ok(match cfg.source {
        AudioSource::Synthetic => Box::new(SyntheticAudio::new(cfg.bpm, cfg.fps, 0x00c0_ffee)),
        AudioSource::Silent => Box::new(SilentAudio),
        AudioSource::Mic => Box::new(
            LiveAudio::new(cfg.device.as_deref())
                .with_context(|| format!("start audio (source={:?})", cfg.source))?,
        ),
    })
}

pub fn run(cfg: Config) -> anyhow::Result<()> {
    let mut orchestrator = build_orchestrator(&cfg)?;
    let mut audio = open_audio(&cfg)?;
    let result = if cfg.headless {
        run_headless(&cfg, &mut orchestrator, audio.as_mut())
    } else {
        run_interactive(&cfg, &mut orchestrator, audio.as_mut())
    };
    orchestrator.shutdown();
    result
}

/// Fixed number of frames on a simulated clock; status goes to the log.
pub fn run_headless(
    cfg: &Config,
    orchestrator: &mut Orchestrator,
    audio: &mut dyn AudioFeatureStream,
) -> anyhow::Result<()> {
    let frame_ms = cfg.frame_ms();
    let report_every = u64::from(cfg.fps.max(1));
    for frame in 0..cfg.frames {
        let time = frame as f64 * frame_ms;
        audio.update();
        let snapshot = audio.snapshot();
        orchestrator.update(time, &snapshot);
        for ev in orchestrator.drain_events() {
            log_event(&ev);
        }
        if frame % report_every == 0 {
            log::info!("{}", status_line(orchestrator));
        }
    }
    println!("{}", status_line(orchestrator));
    Ok(())
}

fn run_interactive(
    cfg: &Config,
    orchestrator: &mut Orchestrator,
    audio: &mut dyn AudioFeatureStream,
) -> anyhow::Result<()> {
    let mut screen = StageScreen::open()?;

    let start = Instant::now();
    let target = Duration::from_secs_f64(cfg.frame_ms() / 1_000.0);
    let mut fps = FpsCounter::new();
    let mut last_event = String::new();

    loop {
        let now = Instant::now();

        while event::poll(Duration::from_millis(0))? {
            if let Event::Key(k) = event::read()? {
                if k.kind == KeyEventKind::Release {
                    continue;
                }
                if handle_key(k.code, k.modifiers, orchestrator) {
                    return Ok(());
                }
            }
        }

        audio.update();
        let snapshot = audio.snapshot();
        let time = now.duration_since(start).as_secs_f64() * 1_000.0;
        let tick_start = Instant::now();
        orchestrator.update(time, &snapshot);
        let tick_ms = tick_start.elapsed().as_secs_f32() * 1_000.0;
        for ev in orchestrator.drain_events() {
            log_event(&ev);
            last_event = describe_event(&ev);
        }

        fps.tick();
        let mut hud = status_line(orchestrator);
        let _ = write!(hud, "  | {:.0} fps {:.2} ms", fps.fps(), tick_ms);
        let acts = act_lines(orchestrator);
        screen.draw(
            std::iter::once(hud.as_str())
                .chain(acts.iter().map(String::as_str))
                .chain([last_event.as_str(), help_text()]),
        )?;

        let elapsed = now.elapsed();
        if elapsed < target {
            std::thread::sleep(target - elapsed);
        }
    }
}

/// Returns `true` when the host should quit.
pub fn handle_key(code: KeyCode, mods: KeyModifiers, orchestrator: &mut Orchestrator) -> bool {
    if mods.contains(KeyModifiers::CONTROL) && matches!(code, KeyCode::Char('c')) {
        return true;
    }

    match code {
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('Q') => return true,
        KeyCode::Char(c @ '1'..='4') => {
            let target = c as u32 - '0' as u32;
            if target == orchestrator.current_act().0 {
                orchestrator.return_to_current();
            } else {
                orchestrator.transition_to_act(target);
            }
        }
        KeyCode::Char(c) if hard_cut_target(c).is_some() => {
            if let Some(n) = hard_cut_target(c) {
                orchestrator.set_act(n);
            }
        }
        KeyCode::Char('o') | KeyCode::Char('O') => {
            orchestrator.show_overview();
        }
        KeyCode::Char('d') | KeyCode::Char('D') => {
            let on = !orchestrator.demo_mode();
            orchestrator.enable_demo_mode(on);
        }
        KeyCode::Char('a') | KeyCode::Char('A') => {
            let on = !orchestrator.auto_progress();
            orchestrator.set_auto_progress(on);
        }
        _ => {}
    }
    false
}

/// Shifted digits on a US layout cut straight to an act.
fn hard_cut_target(c: char) -> Option<u32> {
    match c {
        '!' => Some(1),
        '@' => Some(2),
        '#' => Some(3),
        '$' => Some(4),
        _ => None,
    }
}

fn help_text() -> &'static str {
    "1-4 fly to act  !@#$ cut  o overview  d demo  a auto  q quit"
}

pub fn status_line(orchestrator: &Orchestrator) -> String {
    let cam = orchestrator.camera();
    let p = cam.position();
    let mut s = format!("{}", orchestrator.current_act());
    match orchestrator.transition() {
        Some(tr) => {
            let _ = write!(
                s,
                " -> {} [{} {:>3.0}%]",
                tr.dest,
                tr.phase.label(),
                tr.progress * 100.0
            );
        }
        None if cam.is_transitioning() => s.push_str(" [camera]"),
        None => {}
    }
    let _ = write!(
        s,
        "  cam ({:.1}, {:.1}, {:.1}) on {}",
        p.x,
        p.y,
        p.z,
        cam.focused_act()
    );
    let _ = write!(
        s,
        "  {}{}",
        if orchestrator.demo_mode() { "demo " } else { "" },
        if orchestrator.auto_progress() { "auto" } else { "manual" }
    );
    s
}

fn act_lines(orchestrator: &Orchestrator) -> Vec<String> {
    orchestrator
        .acts()
        .iter()
        .map(|act| {
            let st = act.status();
            let bar_len = (act.fade() * 10.0).round() as usize;
            let mut line = format!(
                "{:<6} {:<10} {:<9} [{:<10}] pulse {:.2}",
                act.id().to_string(),
                act.name(),
                act.lifecycle().label(),
                "#".repeat(bar_len),
                st.pulse_scale
            );
            if let Some(ms) = st.beat_interval_ms {
                let _ = write!(line, "  {:.0} bpm", 60_000.0 / ms.max(1.0));
            }
            if st.beat_flash > 0.5 {
                line.push_str("  *");
            }
            line
        })
        .collect()
}

fn describe_event(ev: &OrchestratorEvent) -> String {
    match ev {
        OrchestratorEvent::TransitionStarted { from, to } => format!("transition {from} -> {to}"),
        OrchestratorEvent::TransitionProgress { to, progress } => {
            format!("moving to {to}: {:.0}%", progress * 100.0)
        }
        OrchestratorEvent::TransitionCompleted { to, .. } => format!("arrived at {to}"),
        OrchestratorEvent::Cut { to, .. } => format!("cut to {to}"),
        OrchestratorEvent::OverviewReached => "overview".to_string(),
        OrchestratorEvent::ActEntered(id) => format!("{id} entered"),
        OrchestratorEvent::ActExited(id) => format!("{id} exited"),
        OrchestratorEvent::ActFault { act, message } => format!("{act} fault: {message}"),
    }
}

fn log_event(ev: &OrchestratorEvent) {
    match ev {
        OrchestratorEvent::TransitionProgress { .. } => {}
        OrchestratorEvent::ActFault { .. } => log::warn!("{}", describe_event(ev)),
        _ => log::debug!("{}", describe_event(ev)),
    }
}

struct FpsCounter {
    last: Instant,
    frames: u32,
    fps: f32,
}

impl FpsCounter {
    fn new() -> Self {
        Self {
            last: Instant::now(),
            frames: 0,
            fps: 0.0,
        }
    }

    fn tick(&mut self) {
        self.frames += 1;
        let now = Instant::now();
        let dt = now.duration_since(self.last).as_secs_f32();
        if dt >= 0.5 {
            self.fps = (self.frames as f32) / dt;
            self.frames = 0;
            self.last = now;
        }
    }

    fn fps(&self) -> f32 {
        self.fps
    }
}
