use glam::Vec3;
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

/// Stable act identity. `ActId::OVERVIEW` (0) means no act is focused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ActId(pub u32);

impl ActId {
    pub const OVERVIEW: Self = Self(0);

    pub fn is_overview(self) -> bool {
        self == Self::OVERVIEW
    }
}

impl std::fmt::Display for ActId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_overview() {
            write!(f, "overview")
        } else {
            write!(f, "act {}", self.0)
        }
    }
}

/// Axis-aligned extent of an act's content, centred on its anchor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub size: Vec3,
}

impl Bounds {
    pub fn new(width: f32, height: f32, depth: f32) -> Self {
        Self {
            size: Vec3::new(width, height, depth),
        }
    }

    pub fn max_dimension(&self) -> f32 {
        self.size.max_element()
    }
}

/// Where each act sits in the world and where the camera should look when it visits.
pub trait LayoutProvider {
    fn act_ids(&self) -> Vec<ActId>;
    fn act_position(&self, id: ActId) -> Option<Vec3>;
    fn act_look_at(&self, id: ActId) -> Option<Vec3>;
    fn act_bounds(&self, id: ActId) -> Option<Bounds>;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActPlacement {
    pub position: Vec3,
    pub look_at: Vec3,
    pub bounds: Bounds,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum LayoutError {
    #[error("I/O error: {0}")]
    Io(String),
    #[error("parse error at line {line}: {message}")]
    Parse { line: usize, message: String },
    #[error("layout must place at least one act")]
    Empty,
    #[error("act id 0 is reserved for the overview")]
    ReservedId,
    #[error("duplicate placement for act {0}")]
    Duplicate(u32),
    #[error("act ids must be contiguous from 1, missing act {0}")]
    Gap(u32),
}

/// Fixed placements keyed by act id.
#[derive(Debug, Clone, PartialEq)]
pub struct StaticLayout {
    placements: BTreeMap<ActId, ActPlacement>,
}

impl Default for StaticLayout {
    /// Four acts on the corners of a 10x10 square in the XZ plane; each camera stop hovers
    /// above and in front of its act.
    fn default() -> Self {
        let corners = [
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(10.0, 0.0, 0.0),
            Vec3::new(10.0, 0.0, 10.0),
            Vec3::new(0.0, 0.0, 10.0),
        ];
        let placements = corners
            .iter()
            .enumerate()
            .map(|(i, &look_at)| {
                (
                    ActId(i as u32 + 1),
                    ActPlacement {
                        position: look_at + Vec3::new(0.0, 2.0, 12.0),
                        look_at,
                        bounds: Bounds::new(6.0, 6.0, 6.0),
                    },
                )
            })
            .collect();
        Self { placements }
    }
}

impl StaticLayout {
    pub fn new(placements: impl IntoIterator<Item = (ActId, ActPlacement)>) -> Result<Self, LayoutError> {
        let mut map = BTreeMap::new();
        for (id, p) in placements {
            if id.is_overview() {
                return Err(LayoutError::ReservedId);
            }
            if map.insert(id, p).is_some() {
                return Err(LayoutError::Duplicate(id.0));
            }
        }
        let layout = Self { placements: map };
        layout.validate()?;
        Ok(layout)
    }

    /// Parses lines of `act <id> <px> <py> <pz> <lx> <ly> <lz> <bw> <bh> <bd>`.
    pub fn parse(text: &str) -> Result<Self, LayoutError> {
        let mut placements = Vec::new();
        for (line_idx, raw) in text.lines().enumerate() {
            let line_no = line_idx + 1;
            let trimmed = raw.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let tokens: Vec<&str> = trimmed.split_whitespace().collect();
            if tokens.first().copied() != Some("act") {
                return Err(LayoutError::Parse {
                    line: line_no,
                    message: "expected 'act'".to_string(),
                });
            }
            if tokens.len() != 11 {
                return Err(LayoutError::Parse {
                    line: line_no,
                    message: "act expects: act <id> <px> <py> <pz> <lx> <ly> <lz> <bw> <bh> <bd>"
                        .to_string(),
                });
            }
            let id = tokens[1].parse::<u32>().map_err(|_| LayoutError::Parse {
                line: line_no,
                message: format!("invalid act id '{}'", tokens[1]),
            })?;
            let mut nums = [0.0f32; 9];
            for (slot, tok) in nums.iter_mut().zip(&tokens[2..]) {
                *slot = parse_f32(tok, line_no)?;
            }
            if nums[6..].iter().any(|d| *d <= 0.0) {
                return Err(LayoutError::Parse {
                    line: line_no,
                    message: "bounds must be positive".to_string(),
                });
            }
            placements.push((
                ActId(id),
                ActPlacement {
                    position: Vec3::new(nums[0], nums[1], nums[2]),
                    look_at: Vec3::new(nums[3], nums[4], nums[5]),
                    bounds: Bounds::new(nums[6], nums[7], nums[8]),
                },
            ));
        }
        Self::new(placements)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, LayoutError> {
        let text = std::fs::read_to_string(path.as_ref()).map_err(|e| LayoutError::Io(e.to_string()))?;
        Self::parse(&text)
    }

    pub fn to_text(&self) -> String {
        self.placements
            .iter()
            .map(|(id, p)| {
                format!(
                    "act {} {} {} {} {} {} {} {} {} {}",
                    id.0,
                    p.position.x,
                    p.position.y,
                    p.position.z,
                    p.look_at.x,
                    p.look_at.y,
                    p.look_at.z,
                    p.bounds.size.x,
                    p.bounds.size.y,
                    p.bounds.size.z
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn placement(&self, id: ActId) -> Option<&ActPlacement> {
        self.placements.get(&id)
    }

    fn validate(&self) -> Result<(), LayoutError> {
        if self.placements.is_empty() {
            return Err(LayoutError::Empty);
        }
        for (expected, id) in (1u32..).zip(self.placements.keys()) {
            if id.0 != expected {
                return Err(LayoutError::Gap(expected));
            }
        }
        Ok(())
    }
}

impl LayoutProvider for StaticLayout {
    fn act_ids(&self) -> Vec<ActId> {
        self.placements.keys().copied().collect()
    }

    fn act_position(&self, id: ActId) -> Option<Vec3> {
        self.placement(id).map(|p| p.position)
    }

    fn act_look_at(&self, id: ActId) -> Option<Vec3> {
        self.placement(id).map(|p| p.look_at)
    }

    fn act_bounds(&self, id: ActId) -> Option<Bounds> {
        self.placement(id).map(|p| p.bounds)
    }
}

fn parse_f32(s: &str, line: usize) -> Result<f32, LayoutError> {
    match s.parse::<f32>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(LayoutError::Parse {
            line,
            message: format!("invalid number '{s}'"),
        }),
    }
}
