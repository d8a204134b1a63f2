use crate::act::{Act, ActAnchor, ActError, ActEvent, ContentFactory};
use crate::audio::AudioFeatureSnapshot;
use crate::camera::{CameraEvent, CameraNavigator, CameraSettings};
use crate::layout::{ActId, LayoutProvider};
use crate::timing::TimingProfile;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationMode {
    /// Fly the camera to the destination act.
    Camera,
    /// Fade the source act out, then cut the camera to the destination.
    Fade,
}

impl NavigationMode {
    pub fn label(self) -> &'static str {
        match self {
            Self::Camera => "camera",
            Self::Fade => "fade",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrchestratorSettings {
    pub timing: TimingProfile,
    pub demo_mode: bool,
    pub auto_progress: bool,
    pub navigation: NavigationMode,
    /// Start the source act's exit fade as soon as a camera transition begins.
    pub exit_source_on_transition: bool,
    /// Keep simulating acts that are not the current one.
    pub simulate_background_acts: bool,
    pub start_act: u32,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            timing: TimingProfile::default(),
            demo_mode: false,
            auto_progress: false,
            navigation: NavigationMode::Camera,
            exit_source_on_transition: false,
            simulate_background_acts: true,
            start_act: 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionPhase {
    Preparing,
    CameraMoving,
    ContentTransitioning,
    Complete,
}

impl TransitionPhase {
    pub fn label(self) -> &'static str {
        match self {
            Self::Preparing => "preparing",
            Self::CameraMoving => "camera",
            Self::ContentTransitioning => "content",
            Self::Complete => "complete",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transition {
    pub source: ActId,
    pub dest: ActId,
    pub phase: TransitionPhase,
    pub start_time: f64,
    pub duration: f64,
    pub progress: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum OrchestratorEvent {
    TransitionStarted { from: ActId, to: ActId },
    TransitionProgress { to: ActId, progress: f32 },
    TransitionCompleted { from: ActId, to: ActId },
    /// Hard cut through `set_act`.
    Cut { from: ActId, to: ActId },
    OverviewReached,
    ActEntered(ActId),
    ActExited(ActId),
    ActFault { act: ActId, message: String },
}

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("no acts registered")]
    NoActs,
    #[error("act ids must run 1..=n in order; found {found} at position {position}")]
    NonContiguous { position: usize, found: ActId },
    #[error("layout has no placement for {0}")]
    MissingPlacement(ActId),
    #[error("start act {0} is out of range")]
    InvalidStartAct(u32),
    #[error("{act} failed to create its content")]
    Content {
        act: ActId,
        #[source]
        source: ActError,
    },
}

/// Owns every act and the camera, and sequences transitions between acts. Driven by
/// [`Orchestrator::update`] once per host tick with a millisecond clock.
pub struct Orchestrator {
    acts: Vec<Act>,
    camera: CameraNavigator,
    settings: OrchestratorSettings,
    pending_timing: Option<TimingProfile>,
    pending_demo: Option<bool>,
    /// Act the camera cuts to once its current flight ends.
    pending_camera: Option<ActId>,
    current: ActId,
    transition: Option<Transition>,
    auto_baseline: Option<f64>,
    last_time: Option<f64>,
    now: f64,
    events: Vec<OrchestratorEvent>,
}

impl Orchestrator {
    pub fn new(
        acts: Vec<Act>,
        layout: Box<dyn LayoutProvider>,
        camera_settings: CameraSettings,
        settings: OrchestratorSettings,
    ) -> Result<Self, OrchestratorError> {
        if acts.is_empty() {
            return Err(OrchestratorError::NoActs);
        }
        for (i, act) in acts.iter().enumerate() {
            if act.id().0 as usize != i + 1 {
                return Err(OrchestratorError::NonContiguous {
                    position: i,
                    found: act.id(),
                });
            }
        }
        if settings.start_act == 0 || settings.start_act as usize > acts.len() {
            return Err(OrchestratorError::InvalidStartAct(settings.start_act));
        }

        let mut acts = acts;
        for act in &mut acts {
            let id = act.id();
            let (Some(position), Some(look_at)) = (layout.act_position(id), layout.act_look_at(id))
            else {
                return Err(OrchestratorError::MissingPlacement(id));
            };
            act.assign_anchor(ActAnchor { position, look_at });
        }

        let current = ActId(settings.start_act);
        let mut camera = CameraNavigator::new(layout, camera_settings);
        camera.jump_to_act(current);

        Ok(Self {
            acts,
            camera,
            settings,
            pending_timing: None,
            pending_demo: None,
            pending_camera: None,
            current,
            transition: None,
            auto_baseline: None,
            last_time: None,
            now: 0.0,
            events: Vec::new(),
        })
    }

    /// Creates every act's content and starts the first act's entrance.
    pub fn initialize(&mut self, factory: &mut dyn ContentFactory) -> Result<(), OrchestratorError> {
        let background = self.settings.simulate_background_acts;
        let current = self.current;
        for act in &mut self.acts {
            let id = act.id();
            act.create(factory)
                .map_err(|source| OrchestratorError::Content { act: id, source })?;
            act.set_simulating(background || id == current);
        }
        if let Some(act) = self.act_mut(current) {
            if let Err(err) = act.prepare_entry().and_then(|_| act.enter()) {
                log::warn!("{err}");
            }
        }
        log::info!("initialized {} acts, starting at {current}", self.acts.len());
        Ok(())
    }

    pub fn act_count(&self) -> usize {
        self.acts.len()
    }

    pub fn acts(&self) -> &[Act] {
        &self.acts
    }

    pub fn act(&self, id: ActId) -> Option<&Act> {
        id.0.checked_sub(1).and_then(|i| self.acts.get(i as usize))
    }

    fn act_mut(&mut self, id: ActId) -> Option<&mut Act> {
        id.0.checked_sub(1).and_then(|i| self.acts.get_mut(i as usize))
    }

    pub fn current_act(&self) -> ActId {
        self.current
    }

    pub fn transition(&self) -> Option<&Transition> {
        self.transition.as_ref()
    }

    pub fn is_transitioning(&self) -> bool {
        self.transition.is_some()
    }

    pub fn camera(&self) -> &CameraNavigator {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut CameraNavigator {
        &mut self.camera
    }

    pub fn settings(&self) -> &OrchestratorSettings {
        &self.settings
    }

    pub fn timing(&self) -> &TimingProfile {
        &self.settings.timing
    }

    pub fn demo_mode(&self) -> bool {
        self.settings.demo_mode
    }

    pub fn auto_progress(&self) -> bool {
        self.settings.auto_progress
    }

    pub fn navigation(&self) -> NavigationMode {
        self.settings.navigation
    }

    pub fn set_navigation_mode(&mut self, mode: NavigationMode) {
        self.settings.navigation = mode;
    }

    /// Time of the latest tick, in milliseconds.
    pub fn now(&self) -> f64 {
        self.now
    }

    pub fn drain_events(&mut self) -> std::vec::Drain<'_, OrchestratorEvent> {
        self.events.drain(..)
    }

    /// One host tick: camera, then auto-progress, then every act.
    pub fn update(&mut self, time: f64, audio: &AudioFeatureSnapshot) {
        let dt = self
            .last_time
            .map_or(0.0, |last| ((time - last) / 1_000.0).max(0.0) as f32);
        self.last_time = Some(time);
        self.now = time;
        if self.auto_baseline.is_none() {
            self.auto_baseline = Some(time);
        }

        self.camera.update(time);
        let camera_events: Vec<CameraEvent> = self.camera.drain_events().collect();
        for event in camera_events {
            self.on_camera_event(event);
        }

        if self.settings.auto_progress {
            self.update_auto_progress(time);
        }

        let mut ticks = Vec::with_capacity(self.acts.len());
        for act in &mut self.acts {
            ticks.push((act.id(), act.update(audio, dt)));
        }
        for (id, tick) in ticks {
            if let Some(fault) = tick.fault {
                log::warn!("{id} update failed: {fault}");
                self.events.push(OrchestratorEvent::ActFault {
                    act: id,
                    message: fault.to_string(),
                });
            }
            match tick.event {
                Some(ActEvent::Entered(act)) => self.events.push(OrchestratorEvent::ActEntered(act)),
                Some(ActEvent::Exited(act)) => {
                    self.events.push(OrchestratorEvent::ActExited(act));
                    self.on_act_exited(act);
                }
                None => {}
            }
        }

        if let Some(tr) = self.transition.as_mut() {
            if tr.phase == TransitionPhase::ContentTransitioning {
                let fade = self
                    .acts
                    .get(tr.source.0.saturating_sub(1) as usize)
                    .map_or(0.0, Act::fade);
                tr.progress = 1.0 - fade;
            }
        }
    }

    fn on_camera_event(&mut self, event: CameraEvent) {
        match event {
            CameraEvent::Progress { eased, act } => {
                if let Some(tr) = self.transition.as_mut() {
                    if tr.phase == TransitionPhase::CameraMoving && tr.dest == act {
                        tr.progress = eased;
                        self.events.push(OrchestratorEvent::TransitionProgress {
                            to: act,
                            progress: eased,
                        });
                    }
                }
            }
            CameraEvent::Completed { act } => {
                let awaiting = self
                    .transition
                    .is_some_and(|tr| tr.phase == TransitionPhase::CameraMoving && tr.dest == act);
                if act.is_overview() {
                    self.events.push(OrchestratorEvent::OverviewReached);
                } else if awaiting {
                    self.complete_act_transition();
                } else {
                    log::debug!("camera settled on {act}");
                }
                if let Some(dest) = self.pending_camera.take() {
                    log::debug!("camera free, cutting to {dest}");
                    self.camera.jump_to_act(dest);
                }
            }
        }
    }

    /// Cuts the camera to `dest`, or queues the cut until the running flight completes.
    fn park_camera(&mut self, dest: ActId) {
        if self.camera.jump_to_act(dest) {
            self.pending_camera = None;
        } else {
            self.pending_camera = Some(dest);
        }
    }

    fn on_act_exited(&mut self, act: ActId) {
        let Some(tr) = self.transition else {
            return;
        };
        if tr.phase == TransitionPhase::ContentTransitioning && tr.source == act {
            self.park_camera(tr.dest);
            self.complete_act_transition();
        }
    }

    /// Starts a transition from the current act to `target` (1-based). Returns `false` and
    /// leaves all state untouched when the request is rejected.
    pub fn transition_to_act(&mut self, target: u32) -> bool {
        if self.transition.is_some() {
            log::warn!("transition to act {target} ignored: a transition is in flight");
            return false;
        }
        if target == 0 || target as usize > self.acts.len() {
            log::warn!("transition to act {target} ignored: out of range 1..={}", self.acts.len());
            return false;
        }
        let dest = ActId(target);
        let source = self.current;
        let duration = self
            .settings
            .timing
            .transition_duration_for(self.settings.demo_mode);

        if dest == source {
            log::warn!("transition to {dest} ignored: already current");
            return false;
        }

        let background = self.settings.simulate_background_acts;
        let Some(dest_act) = self.act_mut(dest) else {
            return false;
        };
        if let Err(err) = dest_act.prepare_entry() {
            log::warn!("transition to {dest} ignored: {err}");
            return false;
        }
        if !background {
            dest_act.set_simulating(true);
        }

        log::info!("transition {source} -> {dest} ({} navigation)", self.settings.navigation.label());
        self.events.push(OrchestratorEvent::TransitionStarted {
            from: source,
            to: dest,
        });
        self.transition = Some(Transition {
            source,
            dest,
            phase: TransitionPhase::Preparing,
            start_time: self.now,
            duration,
            progress: 0.0,
        });

        match self.settings.navigation {
            NavigationMode::Camera => {
                if self.settings.exit_source_on_transition {
                    self.exit_act(source);
                }
                self.set_phase(TransitionPhase::CameraMoving);
                if !self.camera.transition_to_act(dest, duration, self.now) {
                    log::warn!("camera rejected the move to {dest}; completing immediately");
                    self.complete_act_transition();
                    self.park_camera(dest);
                }
            }
            NavigationMode::Fade => {
                if self.exit_act(source) {
                    self.set_phase(TransitionPhase::ContentTransitioning);
                } else {
                    self.park_camera(dest);
                    self.complete_act_transition();
                }
            }
        }
        true
    }

    fn set_phase(&mut self, phase: TransitionPhase) {
        if let Some(tr) = self.transition.as_mut() {
            tr.phase = phase;
        }
    }

    fn exit_act(&mut self, id: ActId) -> bool {
        let Some(act) = self.act_mut(id) else {
            return false;
        };
        match act.exit() {
            Ok(()) => true,
            Err(err) => {
                log::debug!("{err}");
                false
            }
        }
    }

    /// Finishes the in-flight transition: the destination enters and becomes current.
    pub fn complete_act_transition(&mut self) {
        let Some(mut tr) = self.transition.take() else {
            log::debug!("complete_act_transition with nothing in flight");
            return;
        };
        if let Some(act) = self.act_mut(tr.dest) {
            if let Err(err) = act.enter() {
                log::warn!("{err}");
            }
        }
        if !self.settings.simulate_background_acts && tr.source != tr.dest {
            if let Some(act) = self.act_mut(tr.source) {
                act.set_simulating(false);
            }
        }
        tr.phase = TransitionPhase::Complete;
        tr.progress = 1.0;
        self.current = tr.dest;
        self.auto_baseline = Some(self.now);
        self.apply_pending();
        log::info!("now at {}", tr.dest);
        self.events.push(OrchestratorEvent::TransitionCompleted {
            from: tr.source,
            to: tr.dest,
        });
    }

    /// Advances to the next act (wrapping to 1) once the current one has been on stage for
    /// the act duration.
    pub fn update_auto_progress(&mut self, time: f64) {
        if self.transition.is_some() {
            return;
        }
        self.now = self.now.max(time);
        let baseline = *self.auto_baseline.get_or_insert(time);
        let act_duration = self.settings.timing.act_duration_for(self.settings.demo_mode);
        if time - baseline < act_duration {
            return;
        }
        let next = self.current.0 % self.acts.len() as u32 + 1;
        if !self.transition_to_act(next) {
            self.auto_baseline = Some(time);
        }
    }

    /// Hard cut to `target` with no camera move or fade from the source.
    pub fn set_act(&mut self, target: u32) -> bool {
        if self.transition.is_some() {
            log::warn!("set_act({target}) ignored: a transition is in flight");
            return false;
        }
        if target == 0 || target as usize > self.acts.len() {
            log::warn!("set_act({target}) ignored: out of range");
            return false;
        }
        let dest = ActId(target);
        let source = self.current;
        if dest == source {
            self.park_camera(dest);
            return false;
        }
        let background = self.settings.simulate_background_acts;
        let Some(act) = self.act_mut(dest) else {
            return false;
        };
        if let Err(err) = act.prepare_entry().and_then(|_| act.enter()) {
            log::warn!("set_act({target}) ignored: {err}");
            return false;
        }
        act.set_simulating(true);
        if self.settings.exit_source_on_transition {
            self.exit_act(source);
        }
        if !background {
            if let Some(prev) = self.act_mut(source) {
                prev.set_simulating(false);
            }
        }
        self.park_camera(dest);
        self.current = dest;
        self.auto_baseline = Some(self.now);
        self.apply_pending();
        log::info!("cut {source} -> {dest}");
        self.events.push(OrchestratorEvent::Cut {
            from: source,
            to: dest,
        });
        true
    }

    /// Pulls the camera back to frame every act. The current act is unchanged.
    pub fn show_overview(&mut self) -> bool {
        if self.transition.is_some() {
            log::warn!("overview ignored: a transition is in flight");
            return false;
        }
        let duration = self
            .settings
            .timing
            .transition_duration_for(self.settings.demo_mode);
        let started = self.camera.transition_to_overview(duration, self.now);
        if !started {
            log::warn!("overview ignored: camera busy or layout empty");
        }
        started
    }

    /// Flies the camera back to the current act after an overview. The act itself is already
    /// on stage, so only the camera moves.
    pub fn return_to_current(&mut self) -> bool {
        if self.transition.is_some() {
            log::warn!("return ignored: a transition is in flight");
            return false;
        }
        let current = self.current;
        if self.camera.focused_act() == current && !self.camera.is_transitioning() {
            return false;
        }
        let duration = self
            .settings
            .timing
            .transition_duration_for(self.settings.demo_mode);
        if self.camera.transition_to_act(current, duration, self.now) {
            return true;
        }
        log::debug!("camera busy; cutting back to {current} when it lands");
        self.pending_camera = Some(current);
        true
    }

    /// Takes effect immediately when idle, otherwise when the in-flight transition completes.
    pub fn enable_demo_mode(&mut self, on: bool) {
        if self.transition.is_some() {
            self.pending_demo = Some(on);
        } else {
            self.settings.demo_mode = on;
        }
    }

    pub fn set_auto_progress(&mut self, on: bool) {
        self.settings.auto_progress = on;
        if on {
            self.auto_baseline = Some(self.now);
        }
    }

    /// Takes effect immediately when idle, otherwise when the in-flight transition completes.
    pub fn set_timing_config(&mut self, timing: TimingProfile) {
        if self.transition.is_some() {
            self.pending_timing = Some(timing);
        } else {
            self.settings.timing = timing;
        }
    }

    fn apply_pending(&mut self) {
        if let Some(timing) = self.pending_timing.take() {
            self.settings.timing = timing;
        }
        if let Some(on) = self.pending_demo.take() {
            self.settings.demo_mode = on;
        }
    }

    /// Disposes every act. Further updates leave act content untouched.
    pub fn shutdown(&mut self) {
        for act in &mut self.acts {
            act.dispose();
        }
        self.transition = None;
        log::info!("orchestrator shut down");
    }
}
