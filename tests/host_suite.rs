use act_stage::act::ProceduralContent;
use act_stage::acts::lightweight_acts;
use act_stage::app::{build_orchestrator, handle_key, run_headless, status_line};
use act_stage::audio::{
    AtomicAudioFeatures, AudioFeatureSnapshot, AudioFeatureStream, SilentAudio, SyntheticAudio,
};
use act_stage::camera::CameraSettings;
use act_stage::config::Config;
use act_stage::layout::{ActId, StaticLayout};
use act_stage::orchestrator::{Orchestrator, OrchestratorSettings};
use clap::Parser;
use crossterm::event::{KeyCode, KeyModifiers};

fn stage() -> Orchestrator {
    let mut o = Orchestrator::new(
        lightweight_acts(16),
        Box::new(StaticLayout::default()),
        CameraSettings::default(),
        OrchestratorSettings::default(),
    )
    .expect("orchestrator");
    o.initialize(&mut ProceduralContent::new()).expect("initialize");
    o.update(0.0, &AudioFeatureSnapshot::silent());
    o.drain_events().for_each(drop);
    o
}

fn press(o: &mut Orchestrator, c: char) -> bool {
    handle_key(KeyCode::Char(c), KeyModifiers::NONE, o)
}

#[test]
fn digit_keys_fly_and_shifted_digits_cut() {
    let mut o = stage();
    assert!(!press(&mut o, '2'));
    let tr = o.transition().expect("camera transition started");
    assert_eq!(tr.dest, ActId(2));
    assert!(status_line(&o).starts_with("act 1 -> act 2"), "{}", status_line(&o));

    let mut o = stage();
    assert!(!press(&mut o, '#'));
    assert_eq!(o.current_act(), ActId(3));
    assert!(o.transition().is_none());
    assert_eq!(o.camera().focused_act(), ActId(3));
}

#[test]
fn toggles_and_overview_keys() {
    let mut o = stage();
    assert!(!o.demo_mode() && !o.auto_progress());
    press(&mut o, 'd');
    press(&mut o, 'a');
    assert!(o.demo_mode() && o.auto_progress());
    let line = status_line(&o);
    assert!(line.contains("demo auto"), "{line}");

    press(&mut o, 'o');
    assert!(o.camera().is_transitioning());
    assert_eq!(o.current_act(), ActId(1));
}

#[test]
fn current_act_digit_flies_back_from_the_overview() {
    let mut o = stage();
    press(&mut o, 'o');
    let quiet = AudioFeatureSnapshot::silent();
    for step in 1..=80 {
        o.update(f64::from(step) * 100.0, &quiet);
    }
    assert!(o.camera().focused_act().is_overview());

    press(&mut o, '1');
    assert!(o.camera().is_transitioning());
    assert!(o.transition().is_none());
    assert_eq!(o.current_act(), ActId(1));
}

#[test]
fn quit_keys_end_the_loop() {
    let mut o = stage();
    assert!(press(&mut o, 'q'));
    assert!(handle_key(KeyCode::Esc, KeyModifiers::NONE, &mut o));
    assert!(handle_key(KeyCode::Char('c'), KeyModifiers::CONTROL, &mut o));
    assert!(!press(&mut o, 'x'));
}

#[test]
fn synthetic_audio_beats_once_per_period() {
    let mut audio = SyntheticAudio::new(120.0, 60, 9);
    let mut beats = 0;
    for _ in 0..600 {
        audio.update();
        let snap = audio.snapshot();
        assert!((0.0..=1.0).contains(&snap.bass));
        assert!((0.0..=1.0).contains(&snap.treble));
        beats += usize::from(snap.beat);
    }
    // Ten seconds at 120 bpm.
    assert!((19..=20).contains(&beats), "beats={beats}");

    let mut silent = SilentAudio;
    silent.update();
    assert_eq!(silent.snapshot(), AudioFeatureSnapshot::silent());
}

#[test]
fn published_beats_latch_until_taken() {
    let cell = AtomicAudioFeatures::new();
    cell.store(AudioFeatureSnapshot {
        bass: 0.9,
        beat: true,
        ..AudioFeatureSnapshot::default()
    });
    cell.store(AudioFeatureSnapshot {
        bass: 0.4,
        ..AudioFeatureSnapshot::default()
    });
    let first = cell.take();
    assert!(first.beat);
    assert!((first.bass - 0.4).abs() < 1e-6);
    assert!(!cell.take().beat);
}

#[test]
fn headless_run_rotates_acts_on_the_demo_clock() {
    let cfg = Config::try_parse_from([
        "act_stage",
        "--headless",
        "--source",
        "silent",
        "--demo",
        "--fps",
        "30",
        "--frames",
        "450",
    ])
    .expect("flags parse");
    let mut o = build_orchestrator(&cfg).expect("build");
    let mut audio = SilentAudio;
    run_headless(&cfg, &mut o, &mut audio).expect("headless run");
    // 15 s of demo clock: a 12 s act, then a 2 s flight to act 2.
    assert_eq!(o.current_act(), ActId(2));
    o.shutdown();
}
