/// Overshoot constant shared by the "back" easings.
const BACK_C1: f32 = 1.70158;
const BACK_C3: f32 = BACK_C1 + 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Easing {
    Linear,
    EaseInQuad,
    EaseOutQuad,
    EaseInOut,
    EaseInCubic,
    EaseOutCubic,
    EaseInOutCubic,
    EaseInOutQuart,
    EaseOutBack,
}

impl Easing {
    pub const fn all() -> [Self; 9] {
        [
            Self::Linear,
            Self::EaseInQuad,
            Self::EaseOutQuad,
            Self::EaseInOut,
            Self::EaseInCubic,
            Self::EaseOutCubic,
            Self::EaseInOutCubic,
            Self::EaseInOutQuart,
            Self::EaseOutBack,
        ]
    }

    /// The fixed set the camera navigator resolves names against.
    pub const fn camera_registry() -> [Self; 5] {
        [
            Self::Linear,
            Self::EaseInOut,
            Self::EaseInOutCubic,
            Self::EaseInOutQuart,
            Self::EaseOutBack,
        ]
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::all().into_iter().find(|e| e.as_str() == s.trim())
    }

    /// Whether `s` names one of the camera easings.
    pub fn is_camera_name(s: &str) -> bool {
        let want = s.trim();
        Self::camera_registry().into_iter().any(|e| e.as_str() == want)
    }

    /// Camera lookup: unknown names fall back to `EaseInOutCubic`.
    pub fn camera_by_name(s: &str) -> Self {
        let want = s.trim();
        Self::camera_registry()
            .into_iter()
            .find(|e| e.as_str() == want)
            .unwrap_or(Self::EaseInOutCubic)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Linear => "linear",
            Self::EaseInQuad => "easeInQuad",
            Self::EaseOutQuad => "easeOutQuad",
            Self::EaseInOut => "easeInOut",
            Self::EaseInCubic => "easeInCubic",
            Self::EaseOutCubic => "easeOutCubic",
            Self::EaseInOutCubic => "easeInOutCubic",
            Self::EaseInOutQuart => "easeInOutQuart",
            Self::EaseOutBack => "easeOutBack",
        }
    }

    /// Maps progress in `[0, 1]` to eased progress. Input is clamped; `EaseOutBack` may leave
    /// `[0, 1]` strictly between the endpoints.
    pub fn apply(self, t: f32) -> f32 {
        // Endpoints are pinned so overshoot curves cannot drift by an ulp.
        if t.is_nan() || t <= 0.0 {
            return 0.0;
        }
        if t >= 1.0 {
            return 1.0;
        }
        match self {
            Self::Linear => t,
            Self::EaseInQuad => t * t,
            Self::EaseOutQuad => 1.0 - (1.0 - t) * (1.0 - t),
            Self::EaseInOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
                }
            }
            Self::EaseInCubic => t * t * t,
            Self::EaseOutCubic => 1.0 - (1.0 - t).powi(3),
            Self::EaseInOutCubic => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
                }
            }
            Self::EaseInOutQuart => {
                if t < 0.5 {
                    8.0 * t * t * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(4) / 2.0
                }
            }
            Self::EaseOutBack => {
                let u = t - 1.0;
                1.0 + BACK_C3 * u * u * u + BACK_C1 * u * u
            }
        }
    }
}

impl Default for Easing {
    fn default() -> Self {
        Self::EaseInOutCubic
    }
}

pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ease_in_out_is_symmetric_around_half() {
        for e in [Easing::EaseInOut, Easing::EaseInOutCubic, Easing::EaseInOutQuart] {
            let v = e.apply(0.5);
            assert!((v - 0.5).abs() < 1e-6, "{} at 0.5 = {v}", e.as_str());
            let a = e.apply(0.25);
            let b = e.apply(0.75);
            assert!((a + b - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn input_outside_unit_range_is_clamped() {
        assert_eq!(Easing::EaseOutCubic.apply(-3.0), 0.0);
        assert_eq!(Easing::EaseOutCubic.apply(7.0), 1.0);
    }
}
