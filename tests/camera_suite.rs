use act_stage::camera::{CameraEvent, CameraNavigator, CameraSettings, LookAtMode};
use act_stage::easing::Easing;
use act_stage::layout::{ActId, LayoutProvider, StaticLayout};
use glam::Vec3;

fn navigator() -> CameraNavigator {
    let mut nav = CameraNavigator::new(Box::new(StaticLayout::default()), CameraSettings::default());
    assert!(nav.jump_to_act(ActId(1)));
    nav
}

fn approx_vec(a: Vec3, b: Vec3) -> bool {
    a.distance(b) < 1e-4
}

fn completions(nav: &mut CameraNavigator) -> usize {
    nav.drain_events()
        .filter(|e| matches!(e, CameraEvent::Completed { .. }))
        .count()
}

#[test]
fn transition_snaps_exactly_to_target_and_completes_once() {
    let mut nav = navigator();
    let layout = StaticLayout::default();
    let target = layout.act_position(ActId(2)).expect("act 2 placed");
    let target_look = layout.act_look_at(ActId(2)).expect("act 2 placed");

    assert!(nav.transition_to_act(ActId(2), 1_000.0, 0.0));
    nav.update(400.0);
    assert!(nav.is_transitioning());
    assert_eq!(completions(&mut nav), 0);

    nav.update(1_000.0);
    assert_eq!(nav.position(), target);
    assert_eq!(nav.look_at(), target_look);
    assert!(!nav.is_transitioning());
    assert_eq!(nav.focused_act(), ActId(2));
    assert_eq!(completions(&mut nav), 1);

    nav.update(1_100.0);
    nav.update(5_000.0);
    assert_eq!(completions(&mut nav), 0);
    assert_eq!(nav.position(), target);
}

#[test]
fn progress_events_carry_eased_value_and_act() {
    let mut nav = navigator();
    assert!(nav.transition_to_act(ActId(3), 1_000.0, 0.0));
    nav.update(250.0);
    let events: Vec<CameraEvent> = nav.drain_events().collect();
    assert_eq!(events.len(), 1);
    match events[0] {
        CameraEvent::Progress { eased, act } => {
            assert_eq!(act, ActId(3));
            assert!((eased - Easing::EaseInOutCubic.apply(0.25)).abs() < 1e-6);
        }
        other => panic!("unexpected event {other:?}"),
    }
}

#[test]
fn second_request_while_moving_is_rejected() {
    let mut nav = navigator();
    assert!(nav.transition_to_act(ActId(2), 1_000.0, 0.0));
    assert!(!nav.transition_to_act(ActId(3), 1_000.0, 10.0));
    assert!(!nav.transition_to_overview(1_000.0, 10.0));
    assert_eq!(nav.transition().map(|t| t.act), Some(ActId(2)));
}

#[test]
fn unknown_act_is_rejected() {
    let mut nav = navigator();
    assert!(!nav.transition_to_act(ActId(9), 1_000.0, 0.0));
    assert!(!nav.is_transitioning());
}

#[test]
fn overview_frames_the_centroid_from_above_and_behind() {
    let mut nav = navigator();
    assert!(nav.transition_to_overview(1_000.0, 0.0));
    let tr = *nav.transition().expect("overview in flight");
    assert_eq!(tr.act, ActId::OVERVIEW);
    assert!((tr.duration - 1_500.0).abs() < 1e-9);

    nav.update(1_000.0);
    assert!(nav.is_transitioning(), "overview runs 1.5x longer");
    nav.update(1_500.0);
    assert!(approx_vec(nav.position(), Vec3::new(5.0, 30.0, 55.0)), "{:?}", nav.position());
    assert!(approx_vec(nav.look_at(), Vec3::new(5.0, 0.0, 5.0)), "{:?}", nav.look_at());
    assert!(nav.focused_act().is_overview());
}

#[test]
fn snap_mode_swaps_look_at_past_the_midpoint() {
    let mut nav = navigator();
    nav.set_look_at_mode(LookAtMode::Snap);
    nav.set_easing_by_name("linear");
    let start_look = nav.look_at();
    let target_look = StaticLayout::default()
        .act_look_at(ActId(2))
        .expect("act 2 placed");

    assert!(nav.transition_to_act(ActId(2), 1_000.0, 0.0));
    nav.update(400.0);
    assert_eq!(nav.look_at(), start_look);
    nav.update(600.0);
    assert_eq!(nav.look_at(), target_look);
}

#[test]
fn unknown_easing_name_selects_in_out_cubic() {
    let mut nav = navigator();
    nav.set_easing_by_name("linear");
    assert_eq!(nav.settings().easing, Easing::Linear);
    nav.set_easing_by_name("wobble");
    assert_eq!(nav.settings().easing, Easing::EaseInOutCubic);
}

#[test]
fn optimal_distance_respects_fov_padding_and_minimum() {
    let layout = StaticLayout::parse(
        "act 1 0 2 12 0 0 0 6 6 6\n\
         act 2 10 2 12 10 0 0 20 10 4\n",
    )
    .expect("layout");
    let nav = CameraNavigator::new(Box::new(layout), CameraSettings::default());

    assert_eq!(nav.calculate_optimal_distance(ActId(1)), Some(8.0));
    let far = nav.calculate_optimal_distance(ActId(2)).expect("act 2");
    let expected = 20.0 / (2.0 * 30f32.to_radians().tan()) * 1.2;
    assert!((far - expected).abs() < 1e-3, "far={far} expected={expected}");
    assert_eq!(nav.calculate_optimal_distance(ActId(3)), None);
}

#[test]
fn zero_duration_completes_on_first_update() {
    let mut nav = navigator();
    assert!(nav.transition_to_act(ActId(4), 0.0, 100.0));
    nav.update(100.0);
    assert!(!nav.is_transitioning());
    assert_eq!(completions(&mut nav), 1);
}
