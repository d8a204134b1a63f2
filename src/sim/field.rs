use glam::Vec3;

/// An implicit surface `C(p, scale, pulse) = 0`. Negative values are inside.
pub trait ImplicitShape {
    fn name(&self) -> &'static str;

    fn value(&self, p: Vec3, scale: f32, pulse: f32) -> f32;

    /// Central-difference gradient; points from inside to outside.
    fn gradient(&self, p: Vec3, scale: f32, pulse: f32) -> Vec3 {
        let h = 1e-3;
        let dx = Vec3::new(h, 0.0, 0.0);
        let dy = Vec3::new(0.0, h, 0.0);
        let dz = Vec3::new(0.0, 0.0, h);
        Vec3::new(
            self.value(p + dx, scale, pulse) - self.value(p - dx, scale, pulse),
            self.value(p + dy, scale, pulse) - self.value(p - dy, scale, pulse),
            self.value(p + dz, scale, pulse) - self.value(p - dz, scale, pulse),
        ) / (2.0 * h)
    }

    /// Half-extent of a box that contains the surface at scale 1.
    fn extent(&self) -> f32;

    /// Newton-projects `p` toward the zero level-set.
    fn project(&self, mut p: Vec3, iterations: usize) -> Vec3 {
        for _ in 0..iterations {
            let c = self.value(p, 1.0, 0.0);
            let g = self.gradient(p, 1.0, 0.0);
            let g2 = g.length_squared();
            if g2 < 1e-8 || !c.is_finite() {
                break;
            }
            let step = g * (c / g2);
            p -= step.clamp_length_max(self.extent() * 0.25);
        }
        p
    }
}

/// Taubin's heart surface, y up, sized so `radius` is roughly its half-height.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeartShape {
    pub radius: f32,
}

impl ImplicitShape for HeartShape {
    fn name(&self) -> &'static str {
        "heart"
    }

    fn value(&self, p: Vec3, scale: f32, pulse: f32) -> f32 {
        let s = (self.radius * scale * (1.0 + 0.04 * pulse)).max(1e-3);
        let q = p / s;
        let (x, y, z) = (q.x, q.y, q.z);
        let a = x * x + 2.25 * z * z + y * y - 1.0;
        a * a * a - x * x * y * y * y - 0.1125 * z * z * y * y * y
    }

    fn extent(&self) -> f32 {
        self.radius * 1.5
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TorusShape {
    pub major: f32,
    pub minor: f32,
}

impl ImplicitShape for TorusShape {
    fn name(&self) -> &'static str {
        "torus"
    }

    fn value(&self, p: Vec3, scale: f32, pulse: f32) -> f32 {
        let major = self.major * scale;
        let minor = (self.minor * scale * (1.0 + 0.15 * pulse)).max(1e-3);
        let ring = (p.x * p.x + p.z * p.z).sqrt() - major;
        (ring * ring + p.y * p.y) / (minor * minor) - 1.0
    }

    fn extent(&self) -> f32 {
        self.major + self.minor * 1.5
    }
}

/// Sphere whose radius ripples with latitude bands; `lobes == 0` is a plain sphere.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BloomShape {
    pub radius: f32,
    pub lobes: u32,
    pub lobe_depth: f32,
}

impl ImplicitShape for BloomShape {
    fn name(&self) -> &'static str {
        if self.lobes == 0 { "sphere" } else { "bloom" }
    }

    fn value(&self, p: Vec3, scale: f32, pulse: f32) -> f32 {
        let len = p.length();
        let ripple = if self.lobes == 0 || len < 1e-6 {
            0.0
        } else {
            let theta = p.z.atan2(p.x);
            (theta * self.lobes as f32).sin() * (1.0 - (p.y / len).abs())
        };
        let r = (self.radius * scale * (1.0 + self.lobe_depth * ripple * (1.0 + pulse))).max(1e-3);
        len * len / (r * r) - 1.0
    }

    fn extent(&self) -> f32 {
        self.radius * (1.0 + self.lobe_depth * 2.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRegion {
    Inside,
    Outside,
    Boundary,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldSettings {
    pub base_tolerance: f32,
    /// Extra tolerance per unit of bass energy; lets the boundary band breathe.
    pub bass_tolerance: f32,
    pub inside_strength: f32,
    pub outside_strength: f32,
    pub outside_falloff: f32,
    pub tangent_strength: f32,
    pub boundary_bias: f32,
    pub flow_axis: Vec3,
}

impl Default for FieldSettings {
    fn default() -> Self {
        Self {
            base_tolerance: 0.08,
            bass_tolerance: 0.25,
            inside_strength: 2.4,
            outside_strength: 1.1,
            outside_falloff: 0.9,
            tangent_strength: 1.0,
            boundary_bias: 0.12,
            flow_axis: Vec3::Y,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldSample {
    pub region: FieldRegion,
    pub value: f32,
    pub normal: Vec3,
    pub force: Vec3,
}

impl FieldSettings {
    pub fn tolerance(&self, bass: f32) -> f32 {
        self.base_tolerance + bass.max(0.0) * self.bass_tolerance
    }

    pub fn classify(&self, value: f32, bass: f32) -> FieldRegion {
        let tol = self.tolerance(bass);
        if value < -tol {
            FieldRegion::Inside
        } else if value > tol {
            FieldRegion::Outside
        } else {
            FieldRegion::Boundary
        }
    }

    /// Force on a particle at `p`: pushed out when inside, pulled in (fading with distance)
    /// when outside, and swept along the surface when on the boundary band.
    pub fn sample(&self, shape: &dyn ImplicitShape, p: Vec3, scale: f32, pulse: f32, bass: f32) -> FieldSample {
        let value = shape.value(p, scale, pulse);
        let normal = shape.gradient(p, scale, pulse).normalize_or_zero();
        let region = self.classify(value, bass);
        let force = match region {
            FieldRegion::Inside => normal * self.inside_strength,
            FieldRegion::Outside => {
                -normal * self.outside_strength * (-value.abs() * self.outside_falloff).exp()
            }
            FieldRegion::Boundary => {
                self.tangent(normal) * self.tangent_strength + normal * self.boundary_bias
            }
        };
        FieldSample {
            region,
            value,
            normal,
            force,
        }
    }

    /// Unit vector perpendicular to `normal`, circulating around `flow_axis`.
    pub fn tangent(&self, normal: Vec3) -> Vec3 {
        let t = normal.cross(self.flow_axis);
        if t.length_squared() > 1e-6 {
            return t.normalize();
        }
        let fallback = if normal.x.abs() < 0.9 { Vec3::X } else { Vec3::Z };
        normal.cross(fallback).normalize_or_zero()
    }
}
