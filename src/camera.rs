use crate::easing::Easing;
use crate::layout::{ActId, LayoutProvider};
use glam::Vec3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookAtMode {
    /// Look-at target is interpolated alongside the position.
    Smooth,
    /// Look-at target jumps to the destination once eased progress passes one half.
    Snap,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraSettings {
    pub easing: Easing,
    pub look_at_mode: LookAtMode,
    pub fov_degrees: f32,
    pub framing_padding: f32,
    pub min_distance: f32,
    pub overview_offset: Vec3,
    pub overview_duration_scale: f64,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            easing: Easing::EaseInOutCubic,
            look_at_mode: LookAtMode::Smooth,
            fov_degrees: 60.0,
            framing_padding: 1.2,
            min_distance: 8.0,
            overview_offset: Vec3::new(0.0, 30.0, 50.0),
            overview_duration_scale: 1.5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CameraEvent {
    Progress { eased: f32, act: ActId },
    Completed { act: ActId },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraTransition {
    pub start_position: Vec3,
    pub target_position: Vec3,
    pub start_look_at: Vec3,
    pub target_look_at: Vec3,
    pub duration: f64,
    pub start_time: f64,
    pub easing: Easing,
    pub act: ActId,
}

impl CameraTransition {
    pub fn raw_progress(&self, time: f64) -> f32 {
        if self.duration <= 0.0 {
            return 1.0;
        }
        ((time - self.start_time) / self.duration).clamp(0.0, 1.0) as f32
    }
}

/// Owns the single viewpoint. At most one transition is in flight; requests made while one is
/// running are rejected.
pub struct CameraNavigator {
    layout: Box<dyn LayoutProvider>,
    settings: CameraSettings,
    position: Vec3,
    look_at: Vec3,
    focused: ActId,
    transition: Option<CameraTransition>,
    events: Vec<CameraEvent>,
}

impl CameraNavigator {
    pub fn new(layout: Box<dyn LayoutProvider>, settings: CameraSettings) -> Self {
        Self {
            layout,
            settings,
            position: Vec3::ZERO,
            look_at: Vec3::NEG_Z,
            focused: ActId::OVERVIEW,
            transition: None,
            events: Vec::new(),
        }
    }

    pub fn layout(&self) -> &dyn LayoutProvider {
        &*self.layout
    }

    pub fn settings(&self) -> &CameraSettings {
        &self.settings
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn look_at(&self) -> Vec3 {
        self.look_at
    }

    pub fn focused_act(&self) -> ActId {
        self.focused
    }

    pub fn is_transitioning(&self) -> bool {
        self.transition.is_some()
    }

    pub fn transition(&self) -> Option<&CameraTransition> {
        self.transition.as_ref()
    }

    /// Resolves `name` against the camera registry; unknown names select `easeInOutCubic`.
    pub fn set_easing_by_name(&mut self, name: &str) {
        let easing = Easing::camera_by_name(name);
        if easing.as_str() != name.trim() {
            log::debug!("unknown easing '{name}', using {}", easing.as_str());
        }
        self.settings.easing = easing;
    }

    pub fn set_look_at_mode(&mut self, mode: LookAtMode) {
        self.settings.look_at_mode = mode;
    }

    /// Starts a move to `act`'s layout stop. Returns `false` when a transition is already in
    /// flight or the layout does not know `act`.
    pub fn transition_to_act(&mut self, act: ActId, duration: f64, time: f64) -> bool {
        if self.transition.is_some() {
            log::debug!("camera busy, rejecting move to {act}");
            return false;
        }
        let (Some(target_position), Some(target_look_at)) =
            (self.layout.act_position(act), self.layout.act_look_at(act))
        else {
            log::warn!("layout has no placement for {act}");
            return false;
        };
        self.begin(act, target_position, target_look_at, duration, time);
        true
    }

    /// Pulls back above the centroid of every act's focus point. Runs
    /// `overview_duration_scale` times longer than `duration`.
    pub fn transition_to_overview(&mut self, duration: f64, time: f64) -> bool {
        if self.transition.is_some() {
            return false;
        }
        let Some(centroid) = self.anchor_centroid() else {
            return false;
        };
        let target = centroid + self.settings.overview_offset;
        let duration = duration * self.settings.overview_duration_scale;
        self.begin(ActId::OVERVIEW, target, centroid, duration, time);
        true
    }

    /// Places the camera at `act`'s stop without animating.
    pub fn jump_to_act(&mut self, act: ActId) -> bool {
        if self.transition.is_some() {
            return false;
        }
        let (Some(position), Some(look_at)) =
            (self.layout.act_position(act), self.layout.act_look_at(act))
        else {
            return false;
        };
        self.position = position;
        self.look_at = look_at;
        self.focused = act;
        true
    }

    pub fn overview_pose(&self) -> Option<(Vec3, Vec3)> {
        let centroid = self.anchor_centroid()?;
        Some((centroid + self.settings.overview_offset, centroid))
    }

    fn anchor_centroid(&self) -> Option<Vec3> {
        let positions = self
            .layout
            .act_ids()
            .into_iter()
            .filter_map(|id| self.layout.act_look_at(id))
            .collect::<Vec<_>>();
        if positions.is_empty() {
            return None;
        }
        let sum = positions.iter().fold(Vec3::ZERO, |acc, p| acc + *p);
        Some(sum / positions.len() as f32)
    }

    fn begin(&mut self, act: ActId, target_position: Vec3, target_look_at: Vec3, duration: f64, time: f64) {
        log::info!("camera -> {act} over {duration:.0} ms");
        self.transition = Some(CameraTransition {
            start_position: self.position,
            target_position,
            start_look_at: self.look_at,
            target_look_at,
            duration,
            start_time: time,
            easing: self.settings.easing,
            act,
        });
    }

    /// Advances the in-flight transition to `time`, queueing a progress event and, on the final
    /// tick, exactly one completion event.
    pub fn update(&mut self, time: f64) {
        let Some(tr) = self.transition else {
            return;
        };
        let raw = tr.raw_progress(time);
        let eased = tr.easing.apply(raw);

        self.position = tr.start_position.lerp(tr.target_position, eased);
        self.look_at = match self.settings.look_at_mode {
            LookAtMode::Smooth => tr.start_look_at.lerp(tr.target_look_at, eased),
            LookAtMode::Snap if eased > 0.5 => tr.target_look_at,
            LookAtMode::Snap => tr.start_look_at,
        };
        self.events.push(CameraEvent::Progress { eased, act: tr.act });

        if raw >= 1.0 {
            self.position = tr.target_position;
            self.look_at = tr.target_look_at;
            self.focused = tr.act;
            self.transition = None;
            self.events.push(CameraEvent::Completed { act: tr.act });
        }
    }

    pub fn drain_events(&mut self) -> std::vec::Drain<'_, CameraEvent> {
        self.events.drain(..)
    }

    /// Distance at which `act`'s bounds fill the field of view with padding.
    pub fn calculate_optimal_distance(&self, act: ActId) -> Option<f32> {
        let bounds = self.layout.act_bounds(act)?;
        let half_fov = (self.settings.fov_degrees.to_radians() * 0.5).tan();
        let distance = bounds.max_dimension() / (2.0 * half_fov) * self.settings.framing_padding;
        Some(distance.max(self.settings.min_distance))
    }
}
