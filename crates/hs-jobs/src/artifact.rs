//! Typed job outputs.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{JobError, JobResult};

/// Declared type of a job output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArtifactKind {
    /// Feature collection (`{geometryType, fields, features}`).
    Geometry,
    /// Arbitrary JSON document, possibly delivered as a string.
    Json,
}

/// Feature collection output, consumed by the map layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeometryArtifact {
    #[serde(default, rename = "geometryType")]
    pub geometry_type: Option<String>,
    #[serde(default)]
    pub fields: Vec<Value>,
    pub features: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Artifact {
    Geometry(GeometryArtifact),
    Json(Value),
}

impl Artifact {
    pub fn decode(name: &str, kind: ArtifactKind, value: Value) -> JobResult<Self> {
        match kind {
            ArtifactKind::Geometry => serde_json::from_value(value)
                .map(Artifact::Geometry)
                .map_err(|e| JobError::ArtifactFormat {
                    name: name.to_string(),
                    reason: format!("not a feature collection: {e}"),
                }),
            // Null included; the consumer checks the document's shape.
            ArtifactKind::Json => Ok(Artifact::Json(value)),
        }
    }

    pub fn kind(&self) -> ArtifactKind {
        match self {
            Artifact::Geometry(_) => ArtifactKind::Geometry,
            Artifact::Json(_) => ArtifactKind::Json,
        }
    }

    pub fn into_geometry(self) -> Option<GeometryArtifact> {
        match self {
            Artifact::Geometry(g) => Some(g),
            Artifact::Json(_) => None,
        }
    }

    pub fn into_json(self) -> Option<Value> {
        match self {
            Artifact::Json(v) => Some(v),
            Artifact::Geometry(_) => None,
        }
    }
}
