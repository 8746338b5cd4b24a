//! Versioned JSON envelope shared by all pipeline artifacts.
//!
//! Every artifact file looks like
//!
//! ```json
//! { "format_version": 1, "kind": "pca_reducer", "model": { ... } }
//! ```
//!
//! The header is decoded and checked before the payload so a newer or
//! mismatched file fails with a precise error instead of a serde message
//! about some missing field.

use crate::error::ArtifactLoadError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;
use std::path::Path;
use tracing::debug;

/// Highest artifact format version this build understands
pub const FORMAT_VERSION: u32 = 1;

/// Kind of artifact stored in a file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    FeatureSelector,
    PcaReducer,
    RandomForestClassifier,
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ArtifactKind::FeatureSelector => "feature_selector",
            ArtifactKind::PcaReducer => "pca_reducer",
            ArtifactKind::RandomForestClassifier => "random_forest_classifier",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Deserialize)]
struct ArtifactHeader {
    format_version: u32,
    kind: String,
}

#[derive(Debug, Deserialize, Serialize)]
struct ArtifactEnvelope<T> {
    format_version: u32,
    kind: ArtifactKind,
    model: T,
}

/// Payload types that can be stored in an artifact file
pub trait ArtifactPayload: DeserializeOwned + Serialize {
    const KIND: ArtifactKind;

    /// Check internal consistency after decoding
    fn validate(&self) -> Result<(), String>;
}

/// Read and validate an artifact of type `T` from `path`
pub fn read_artifact<T: ArtifactPayload>(path: &Path) -> Result<T, ArtifactLoadError> {
    let raw = std::fs::read_to_string(path).map_err(|source| match source.kind() {
        io::ErrorKind::NotFound => ArtifactLoadError::Missing {
            path: path.to_path_buf(),
        },
        _ => ArtifactLoadError::Io {
            path: path.to_path_buf(),
            source,
        },
    })?;

    parse_artifact(&raw, path)
}

/// Decode an artifact from its JSON text; `path` is only used in errors
pub fn parse_artifact<T: ArtifactPayload>(raw: &str, path: &Path) -> Result<T, ArtifactLoadError> {
    let corrupt = |source| ArtifactLoadError::Corrupt {
        path: path.to_path_buf(),
        source,
    };

    let header: ArtifactHeader = serde_json::from_str(raw).map_err(corrupt)?;

    if header.format_version > FORMAT_VERSION || header.format_version == 0 {
        return Err(ArtifactLoadError::UnsupportedVersion {
            path: path.to_path_buf(),
            found: header.format_version,
            supported: FORMAT_VERSION,
        });
    }

    let expected = T::KIND.to_string();
    if header.kind != expected {
        return Err(ArtifactLoadError::WrongKind {
            path: path.to_path_buf(),
            expected,
            found: header.kind,
        });
    }

    let envelope: ArtifactEnvelope<T> = serde_json::from_str(raw).map_err(corrupt)?;

    envelope
        .model
        .validate()
        .map_err(|reason| ArtifactLoadError::Invalid {
            path: path.to_path_buf(),
            reason,
        })?;

    debug!(
        path = %path.display(),
        kind = %T::KIND,
        version = envelope.format_version,
        "Artifact decoded"
    );

    Ok(envelope.model)
}

/// Serialize a payload into the current artifact format
pub fn to_artifact_json<T: ArtifactPayload>(model: &T) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&ArtifactEnvelope {
        format_version: FORMAT_VERSION,
        kind: T::KIND,
        model,
    })
}
