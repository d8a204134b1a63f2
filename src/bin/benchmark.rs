use std::time::Instant;

use act_stage::act::ProceduralContent;
use act_stage::acts::{default_acts, lightweight_acts};
use act_stage::audio::{AudioFeatureStream, SyntheticAudio};
use act_stage::camera::CameraSettings;
use act_stage::layout::StaticLayout;
use act_stage::orchestrator::{NavigationMode, Orchestrator, OrchestratorSettings};
use act_stage::timing::TimingProfile;
use anyhow::Result;

struct Args {
    frames: usize,
    fps: u32,
    particles: Option<usize>,
    navigation: NavigationMode,
    ci_smoke: bool,
    quick: bool,
    max_ms: f64,
}

fn parse_args() -> Args {
    let mut args = Args {
        frames: 1_800,
        fps: 60,
        particles: None,
        navigation: NavigationMode::Camera,
        ci_smoke: false,
        quick: false,
        max_ms: 8.0,
    };

    let argv = std::env::args().skip(1).collect::<Vec<_>>();
    let mut i = 0usize;
    while i < argv.len() {
        let k = argv[i].as_str();
        let v = argv.get(i + 1).map(|s| s.as_str());
        match (k, v) {
            ("--frames", Some(x)) => {
                if let Ok(n) = x.parse::<usize>() {
                    args.frames = n.max(1);
                }
                i += 2;
            }
            ("--fps", Some(x)) => {
                if let Ok(n) = x.parse::<u32>() {
                    args.fps = n.clamp(1, 240);
                }
                i += 2;
            }
            ("--particles", Some(x)) => {
                args.particles = x.parse::<usize>().ok();
                i += 2;
            }
            ("--navigation", Some("camera")) => {
                args.navigation = NavigationMode::Camera;
                i += 2;
            }
            ("--navigation", Some("fade")) => {
                args.navigation = NavigationMode::Fade;
                i += 2;
            }
            ("--ci-smoke", Some(x)) if !x.starts_with("--") => {
                args.ci_smoke = parse_bool(x).unwrap_or(true);
                i += 2;
            }
            ("--ci-smoke", _) => {
                args.ci_smoke = true;
                i += 1;
            }
            ("--quick", _) => {
                args.quick = true;
                i += 1;
            }
            ("--max-ms", Some(x)) => {
                if let Ok(v) = x.parse::<f64>() {
                    args.max_ms = v.max(0.1);
                }
                i += 2;
            }
            _ => {
                i += 1;
            }
        }
    }

    if args.quick {
        args.frames = args.frames.min(240);
    }

    args
}

fn parse_bool(s: &str) -> Option<bool> {
    let v = s.trim().to_ascii_lowercase();
    match v.as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let idx = ((sorted.len() - 1) as f64 * p).round() as usize;
    sorted[idx.min(sorted.len() - 1)]
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("error")).init();
    let args = parse_args();

    let acts = match args.particles {
        Some(n) => lightweight_acts(n),
        None => default_acts(),
    };
    // Short demo timings so the run crosses several transitions.
    let timing = TimingProfile::new(6_000.0, 1_500.0, 3_000.0, 1_000.0)?;
    let settings = OrchestratorSettings {
        timing,
        demo_mode: true,
        auto_progress: true,
        navigation: args.navigation,
        ..OrchestratorSettings::default()
    };
    let mut orchestrator = Orchestrator::new(
        acts,
        Box::new(StaticLayout::default()),
        CameraSettings::default(),
        settings,
    )?;
    orchestrator.initialize(&mut ProceduralContent::new())?;
    let mut audio = SyntheticAudio::new(124.0, args.fps, 7);

    let frame_ms = 1_000.0 / f64::from(args.fps);
    let mut samples = Vec::with_capacity(args.frames);
    let mut transitions = 0usize;
    for frame in 0..args.frames {
        audio.update();
        let snapshot = audio.snapshot();
        let start = Instant::now();
        orchestrator.update(frame as f64 * frame_ms, &snapshot);
        samples.push(start.elapsed().as_secs_f64() * 1_000.0);
        transitions += orchestrator
            .drain_events()
            .filter(|e| matches!(e, act_stage::orchestrator::OrchestratorEvent::TransitionCompleted { .. }))
            .count();
    }
    let particles: usize = orchestrator.acts().iter().map(|a| a.status().particle_count).sum();
    orchestrator.shutdown();

    let mean = samples.iter().sum::<f64>() / samples.len().max(1) as f64;
    let mut sorted = samples.clone();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let p95 = percentile(&sorted, 0.95);

    println!(
        "Benchmark: frames={} fps={} navigation={} particles={}",
        args.frames,
        args.fps,
        args.navigation.label(),
        particles
    );
    println!("tick: {:>8.3} ms mean  {:>8.3} ms p95  transitions={}", mean, p95, transitions);

    if args.ci_smoke {
        if p95 > args.max_ms {
            eprintln!("CI smoke: FAIL (p95 {:.3} ms > {:.3})", p95, args.max_ms);
            std::process::exit(1);
        }
        println!("CI smoke: PASS (max_ms={:.3})", args.max_ms);
    }
    Ok(())
}
