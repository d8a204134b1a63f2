use crate::layout::ActId;
use std::collections::BTreeSet;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    Geometry,
    Texture,
    Font,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetRequest {
    pub act: ActId,
    pub name: &'static str,
    pub kind: AssetKind,
    /// Optional assets only decorate an act; failing to load one never fails the act.
    pub optional: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    pub name: String,
    pub kind: AssetKind,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ContentError {
    #[error("asset '{name}' is not available")]
    Missing { name: String },
    #[error("asset '{name}' failed to load: {reason}")]
    Failed { name: String, reason: String },
}

/// Produces renderable resources for acts while they create their content.
pub trait ContentFactory {
    fn load(&mut self, request: &AssetRequest) -> Result<Asset, ContentError>;
}

/// Loads an optional asset, logging and swallowing failures.
pub fn load_optional(factory: &mut dyn ContentFactory, request: &AssetRequest) -> Option<Asset> {
    match factory.load(request) {
        Ok(asset) => Some(asset),
        Err(err) => {
            log::warn!("{}: continuing without '{}': {err}", request.act, request.name);
            None
        }
    }
}

/// Generates every asset in-process; names listed as unavailable fail to load.
#[derive(Debug, Clone, Default)]
pub struct ProceduralContent {
    unavailable: BTreeSet<String>,
    loaded: Vec<String>,
}

impl ProceduralContent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_unavailable(mut self, name: impl Into<String>) -> Self {
        self.unavailable.insert(name.into());
        self
    }

    pub fn loaded(&self) -> &[String] {
        &self.loaded
    }
}

impl ContentFactory for ProceduralContent {
    fn load(&mut self, request: &AssetRequest) -> Result<Asset, ContentError> {
        if self.unavailable.contains(request.name) {
            return Err(ContentError::Missing {
                name: request.name.to_string(),
            });
        }
        self.loaded.push(format!("{}/{}", request.act.0, request.name));
        Ok(Asset {
            name: request.name.to_string(),
            kind: request.kind,
        })
    }
}
