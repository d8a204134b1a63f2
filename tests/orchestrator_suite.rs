use act_stage::act::{
    Act, ActContent, ActError, ActLifecycle, ActStatus, ContentFactory, ProceduralContent,
};
use act_stage::acts::lightweight_acts;
use act_stage::audio::AudioFeatureSnapshot;
use act_stage::camera::CameraSettings;
use act_stage::layout::{ActId, LayoutProvider, StaticLayout};
use act_stage::orchestrator::{
    NavigationMode, Orchestrator, OrchestratorError, OrchestratorEvent, OrchestratorSettings,
    TransitionPhase,
};
use act_stage::timing::TimingProfile;

fn timing() -> TimingProfile {
    TimingProfile::new(10_000.0, 1_000.0, 4_000.0, 500.0).expect("valid timing")
}

fn settings() -> OrchestratorSettings {
    OrchestratorSettings {
        timing: timing(),
        ..OrchestratorSettings::default()
    }
}

fn stage(settings: OrchestratorSettings) -> Orchestrator {
    stage_with(lightweight_acts(24), settings)
}

fn stage_with(acts: Vec<Act>, settings: OrchestratorSettings) -> Orchestrator {
    let mut o = Orchestrator::new(
        acts,
        Box::new(StaticLayout::default()),
        CameraSettings::default(),
        settings,
    )
    .expect("orchestrator");
    o.initialize(&mut ProceduralContent::new()).expect("initialize");
    o.update(0.0, &AudioFeatureSnapshot::silent());
    o.drain_events().for_each(drop);
    o
}

fn count(events: &[OrchestratorEvent], pred: impl Fn(&OrchestratorEvent) -> bool) -> usize {
    events.iter().filter(|e| pred(e)).count()
}

/// Ticks every `step` ms from `from` (exclusive) to `to` (inclusive), collecting events.
fn run(o: &mut Orchestrator, from: f64, to: f64, step: f64) -> Vec<OrchestratorEvent> {
    let quiet = AudioFeatureSnapshot::silent();
    let mut events = Vec::new();
    let mut t = from;
    while t < to {
        t = (t + step).min(to);
        o.update(t, &quiet);
        events.extend(o.drain_events());
    }
    events
}

/// Counts its updates and can be told to fail every one of them.
struct Ticker {
    ticks: usize,
    fail: bool,
}

impl ActContent for Ticker {
    fn name(&self) -> &'static str {
        "ticker"
    }

    fn create_content(&mut self, _id: ActId, _factory: &mut dyn ContentFactory) -> Result<(), ActError> {
        Ok(())
    }

    fn update_content(&mut self, _audio: &AudioFeatureSnapshot, _dt: f32) -> Result<(), ActError> {
        self.ticks += 1;
        if self.fail {
            return Err(ActError::NonFinite { count: 1 });
        }
        Ok(())
    }

    fn status(&self) -> ActStatus {
        ActStatus {
            particle_count: self.ticks,
            ..ActStatus::default()
        }
    }
}

fn tickers(failing: u32) -> Vec<Act> {
    (1..=4)
        .map(|id| {
            let ticker = Ticker {
                ticks: 0,
                fail: id == failing,
            };
            Act::new(ActId(id), Box::new(ticker))
        })
        .collect()
}

fn act(o: &Orchestrator, id: u32) -> &Act {
    o.act(ActId(id)).expect("act exists")
}

#[test]
fn initialize_enters_the_start_act_only() {
    let o = stage(settings());
    assert_eq!(o.current_act(), ActId(1));
    assert_eq!(act(&o, 1).enter_count(), 1);
    for id in 2..=4 {
        assert_eq!(act(&o, id).enter_count(), 0);
        assert_eq!(act(&o, id).lifecycle(), ActLifecycle::Idle);
        assert!(act(&o, id).is_simulating(), "background acts keep simulating");
    }
    assert!(act(&o, 3).anchor().is_some());
}

#[test]
fn same_act_request_is_a_no_op() {
    let mut o = stage(settings());
    assert!(!o.transition_to_act(1));
    assert!(o.transition().is_none());
    assert!(!o.camera().is_transitioning());
    assert!(o.drain_events().next().is_none());
}

#[test]
fn out_of_range_request_is_a_no_op() {
    let mut o = stage(settings());
    assert!(!o.transition_to_act(0));
    assert!(!o.transition_to_act(5));
    assert!(o.transition().is_none());
    assert_eq!(act(&o, 1).lifecycle(), ActLifecycle::Entering);
}

#[test]
fn request_during_transition_is_a_no_op() {
    let mut o = stage(settings());
    assert!(o.transition_to_act(2));
    assert!(!o.transition_to_act(3));
    assert!(!o.set_act(4));
    assert!(!o.show_overview());
    let tr = o.transition().expect("in flight");
    assert_eq!(tr.dest, ActId(2));
    assert_eq!(tr.phase, TransitionPhase::CameraMoving);
    assert_eq!(act(&o, 3).lifecycle(), ActLifecycle::Idle);
}

#[test]
fn completion_enters_destination_exactly_once() {
    let mut o = stage(settings());
    assert!(o.transition_to_act(2));
    assert_eq!(act(&o, 2).lifecycle(), ActLifecycle::Preparing);

    let events = run(&mut o, 0.0, 1_000.0, 100.0);
    assert_eq!(
        count(&events, |e| matches!(e, OrchestratorEvent::TransitionCompleted { .. })),
        1
    );
    assert_eq!(o.current_act(), ActId(2));
    assert!(o.transition().is_none());
    assert_eq!(act(&o, 2).enter_count(), 1);
    assert_eq!(act(&o, 2).lifecycle(), ActLifecycle::Entering);
    // The source is not exited by default and keeps simulating.
    assert_eq!(act(&o, 1).exit_count(), 0);
    assert!(act(&o, 1).is_simulating());

    let expected = StaticLayout::default()
        .act_position(ActId(2))
        .expect("placed");
    assert_eq!(o.camera().position(), expected);

    let later = run(&mut o, 1_000.0, 3_000.0, 100.0);
    assert_eq!(count(&later, |e| matches!(e, OrchestratorEvent::ActEntered(ActId(2)))), 1);
    assert_eq!(act(&o, 2).lifecycle(), ActLifecycle::Active);
    assert_eq!(act(&o, 2).enter_count(), 1);
}

#[test]
fn auto_progress_triggers_once_per_act_duration() {
    let mut o = stage(OrchestratorSettings {
        auto_progress: true,
        ..settings()
    });

    let before = run(&mut o, 0.0, 9_900.0, 100.0);
    assert_eq!(
        count(&before, |e| matches!(e, OrchestratorEvent::TransitionStarted { .. })),
        0
    );

    let around = run(&mut o, 9_900.0, 10_900.0, 100.0);
    assert_eq!(
        count(&around, |e| matches!(e, OrchestratorEvent::TransitionStarted { .. })),
        1
    );
    assert!(around.contains(&OrchestratorEvent::TransitionStarted {
        from: ActId(1),
        to: ActId(2),
    }));
}

#[test]
fn auto_progress_wraps_from_four_to_one() {
    let mut o = stage(OrchestratorSettings {
        auto_progress: true,
        start_act: 4,
        ..settings()
    });
    let events = run(&mut o, 0.0, 11_000.0, 100.0);
    assert!(events.contains(&OrchestratorEvent::TransitionCompleted {
        from: ActId(4),
        to: ActId(1),
    }));
    assert_eq!(o.current_act(), ActId(1));
}

#[test]
fn update_auto_progress_can_be_driven_directly() {
    let mut o = stage(settings());
    o.update_auto_progress(9_999.0);
    assert!(o.transition().is_none());
    o.update_auto_progress(10_000.0);
    assert_eq!(o.transition().map(|t| t.dest), Some(ActId(2)));
    o.update_auto_progress(25_000.0);
    assert_eq!(o.transition().map(|t| t.dest), Some(ActId(2)));
}

#[test]
fn demo_mode_selects_demo_durations() {
    let mut o = stage(settings());
    o.enable_demo_mode(true);
    assert!(o.transition_to_act(3));
    let tr = o.transition().expect("in flight");
    assert!((tr.duration - 500.0).abs() < 1e-9);
}

#[test]
fn timing_changes_wait_for_the_transition_boundary() {
    let mut o = stage(settings());
    assert!(o.transition_to_act(2));
    let faster = TimingProfile::new(5_000.0, 250.0, 2_000.0, 100.0).expect("valid");
    o.set_timing_config(faster);
    o.enable_demo_mode(true);
    assert_eq!(*o.timing(), timing());
    assert!(!o.demo_mode());

    run(&mut o, 0.0, 1_000.0, 100.0);
    assert!(o.transition().is_none());
    assert_eq!(*o.timing(), faster);
    assert!(o.demo_mode());
}

#[test]
fn fade_navigation_exits_source_then_cuts_camera() {
    let mut o = stage(OrchestratorSettings {
        navigation: NavigationMode::Fade,
        ..settings()
    });
    assert!(o.transition_to_act(2));
    assert_eq!(
        o.transition().map(|t| t.phase),
        Some(TransitionPhase::ContentTransitioning)
    );
    assert_eq!(act(&o, 1).lifecycle(), ActLifecycle::Exiting);

    let events = run(&mut o, 0.0, 1_500.0, 50.0);
    assert_eq!(count(&events, |e| matches!(e, OrchestratorEvent::ActExited(ActId(1)))), 1);
    assert_eq!(
        count(&events, |e| matches!(e, OrchestratorEvent::TransitionCompleted { .. })),
        1
    );
    assert_eq!(o.current_act(), ActId(2));
    assert_eq!(act(&o, 1).lifecycle(), ActLifecycle::Idle);
    assert_eq!(act(&o, 2).enter_count(), 1);
    let expected = StaticLayout::default()
        .act_position(ActId(2))
        .expect("placed");
    assert_eq!(o.camera().position(), expected);
}

#[test]
fn set_act_cuts_without_camera_motion() {
    let mut o = stage(settings());
    assert!(o.set_act(3));
    assert_eq!(o.current_act(), ActId(3));
    assert!(o.transition().is_none());
    assert!(!o.camera().is_transitioning());
    assert_eq!(act(&o, 3).lifecycle(), ActLifecycle::Entering);
    let expected = StaticLayout::default()
        .act_position(ActId(3))
        .expect("placed");
    assert_eq!(o.camera().position(), expected);
    assert!(!o.set_act(3));
    assert!(!o.set_act(7));
}

#[test]
fn overview_keeps_the_current_act_and_can_return() {
    let mut o = stage(settings());
    assert!(o.show_overview());
    let events = run(&mut o, 0.0, 1_500.0, 100.0);
    assert_eq!(count(&events, |e| matches!(e, OrchestratorEvent::OverviewReached)), 1);
    assert_eq!(o.current_act(), ActId(1));
    assert!(o.camera().focused_act().is_overview());

    assert!(!o.transition_to_act(1), "the current act is never a transition target");
    assert!(!o.camera().is_transitioning());

    assert!(o.return_to_current());
    assert!(o.transition().is_none());
    run(&mut o, 1_500.0, 2_500.0, 100.0);
    assert_eq!(o.camera().focused_act(), ActId(1));
    assert_eq!(act(&o, 1).enter_count(), 1);
    assert!(!o.return_to_current(), "already there");
}

#[test]
fn request_during_overview_flight_completes_immediately() {
    let mut o = stage(settings());
    assert!(o.show_overview());
    o.update(100.0, &AudioFeatureSnapshot::silent());
    assert!(o.camera().is_transitioning());

    assert!(o.transition_to_act(3));
    assert_eq!(o.current_act(), ActId(3));
    assert!(o.transition().is_none());
    assert_eq!(act(&o, 3).enter_count(), 1);
    assert_eq!(act(&o, 3).lifecycle(), ActLifecycle::Entering);

    // The overview flight finishes, then the camera cuts to the new act.
    let events = run(&mut o, 100.0, 2_000.0, 100.0);
    assert_eq!(count(&events, |e| matches!(e, OrchestratorEvent::OverviewReached)), 1);
    assert!(!o.camera().is_transitioning());
    assert_eq!(o.camera().focused_act(), ActId(3));
    let expected = StaticLayout::default()
        .act_position(ActId(3))
        .expect("placed");
    assert_eq!(o.camera().position(), expected);
}

#[test]
fn set_act_and_auto_progress_work_during_overview_flight() {
    let mut o = stage(settings());
    assert!(o.show_overview());
    o.update(100.0, &AudioFeatureSnapshot::silent());
    assert!(o.set_act(4));
    assert_eq!(o.current_act(), ActId(4));
    run(&mut o, 100.0, 2_000.0, 100.0);
    assert_eq!(o.camera().focused_act(), ActId(4));

    let mut o = stage(OrchestratorSettings {
        auto_progress: true,
        ..settings()
    });
    run(&mut o, 0.0, 9_500.0, 500.0);
    assert!(o.show_overview());
    let events = run(&mut o, 9_500.0, 10_100.0, 100.0);
    assert_eq!(
        count(&events, |e| matches!(e, OrchestratorEvent::TransitionCompleted { to: ActId(2), .. })),
        1
    );
    assert_eq!(o.current_act(), ActId(2));
}

#[test]
fn failing_act_does_not_stall_the_stage() {
    let mut o = stage_with(tickers(1), settings());
    let before: Vec<usize> = o.acts().iter().map(|a| a.status().particle_count).collect();
    assert!(o.transition_to_act(2));

    let events = run(&mut o, 0.0, 1_000.0, 100.0);
    assert_eq!(
        count(&events, |e| matches!(e, OrchestratorEvent::ActFault { act: ActId(1), .. })),
        10,
        "one fault per tick"
    );
    assert_eq!(count(&events, |e| matches!(e, OrchestratorEvent::ActFault { .. })), 10);
    assert_eq!(
        count(&events, |e| matches!(e, OrchestratorEvent::TransitionCompleted { to: ActId(2), .. })),
        1
    );
    assert_eq!(o.current_act(), ActId(2));
    assert_eq!(o.camera().focused_act(), ActId(2));
    for (a, prev) in o.acts().iter().zip(before) {
        assert_eq!(a.status().particle_count, prev + 10, "{} kept ticking", a.id());
    }
}

#[test]
fn required_content_failure_fails_initialize() {
    let mut o = Orchestrator::new(
        lightweight_acts(8),
        Box::new(StaticLayout::default()),
        CameraSettings::default(),
        settings(),
    )
    .expect("orchestrator");
    let err = o
        .initialize(&mut ProceduralContent::new().with_unavailable("particles"))
        .expect_err("particles are required");
    assert!(matches!(err, OrchestratorError::Content { act: ActId(1), .. }));
}

#[test]
fn optional_content_failure_is_tolerated() {
    let mut o = Orchestrator::new(
        lightweight_acts(8),
        Box::new(StaticLayout::default()),
        CameraSettings::default(),
        settings(),
    )
    .expect("orchestrator");
    o.initialize(&mut ProceduralContent::new().with_unavailable("label"))
        .expect("labels are optional");
    assert!(o.acts().iter().all(|a| !a.status().has_label));
}

#[test]
fn construction_validates_acts_and_start() {
    let mut acts = lightweight_acts(4);
    acts.swap(0, 1);
    let err = Orchestrator::new(
        acts,
        Box::new(StaticLayout::default()),
        CameraSettings::default(),
        settings(),
    )
    .err()
    .expect("ids out of order");
    assert!(matches!(err, OrchestratorError::NonContiguous { position: 0, .. }));

    let err = Orchestrator::new(
        lightweight_acts(4),
        Box::new(StaticLayout::default()),
        CameraSettings::default(),
        OrchestratorSettings {
            start_act: 0,
            ..settings()
        },
    )
    .err()
    .expect("start act 0 is the overview");
    assert!(matches!(err, OrchestratorError::InvalidStartAct(0)));

    let small = StaticLayout::parse("act 1 0 2 12 0 0 0 6 6 6\nact 2 10 2 12 10 0 0 6 6 6\n")
        .expect("layout");
    let err = Orchestrator::new(lightweight_acts(4), Box::new(small), CameraSettings::default(), settings())
        .err()
        .expect("layout lacks acts 3 and 4");
    assert!(matches!(err, OrchestratorError::MissingPlacement(ActId(3))));
}

#[test]
fn paused_background_acts_stop_simulating() {
    let mut o = stage(OrchestratorSettings {
        simulate_background_acts: false,
        ..settings()
    });
    assert!(act(&o, 1).is_simulating());
    assert!(!act(&o, 2).is_simulating());
    assert!(o.transition_to_act(2));
    run(&mut o, 0.0, 1_000.0, 100.0);
    assert!(act(&o, 2).is_simulating());
    assert!(!act(&o, 1).is_simulating());
}

#[test]
fn shutdown_disposes_every_act() {
    let mut o = stage(settings());
    o.shutdown();
    assert!(o.acts().iter().all(|a| a.is_disposed()));
    o.update(100.0, &AudioFeatureSnapshot::silent());
}
