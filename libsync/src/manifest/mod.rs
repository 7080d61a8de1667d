//! Manifest parsing and the blob references a manifest describes.
//!
//! The registry wire format recognizes two manifest media types (Docker
//! distribution schema 1 and schema 2); an `application/json` response is
//! a heuristic alias for schema 1. See [`Manifest::parse`].

use crate::error::{Result, SyncError};
use oci_spec::image::ImageManifest;
use serde::Deserialize;


/// Recognized manifest media types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaType {
    /// `application/vnd.docker.distribution.manifest.v1+json`
    Schema1,
    /// `application/vnd.docker.distribution.manifest.v2+json`
    Schema2,
}

impl MediaType {
    /// Normalizes a wire media type string, applying the `application/json`
    /// → schema 1 heuristic the reference design relies on.
    pub fn normalize(wire: &str) -> Result<Self> {
        if wire.contains("application/vnd.docker.distribution.manifest.v2+json")
            || wire.contains("application/vnd.oci.image.manifest.v1+json")
        {
            Ok(Self::Schema2)
        } else if wire.contains("application/vnd.docker.distribution.manifest.v1+json")
            || wire.contains("application/json")
        {
            Ok(Self::Schema1)
        } else {
            Err(SyncError::validation(format!(
                "unrecognized manifest media type: {wire}"
            )))
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Schema1 => "application/vnd.docker.distribution.manifest.v1+json",
            Self::Schema2 => "application/vnd.docker.distribution.manifest.v2+json",
        }
    }
}

/// A blob descriptor: a content digest plus its size in bytes.
///
/// Schema 1 manifests don't carry layer sizes; descriptors parsed from a
/// schema 1 manifest report `size: 0` (see `MediaType::Schema1` branch of
/// [`Manifest::references`]).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Descriptor {
    pub digest: String,
    pub size: u64,
}

/// A manifest pulled from (or destined for) a registry: its raw payload,
/// computed/declared digest, and media type.
#[derive(Debug, Clone)]
pub struct Manifest {
    pub digest: String,
    pub media_type: MediaType,
    pub payload: Vec<u8>,
}

#[derive(Debug, Deserialize)]
struct Schema1Manifest {
    #[serde(default, rename = "fsLayers")]
    fs_layers: Vec<Schema1FsLayer>,
}

#[derive(Debug, Deserialize)]
struct Schema1FsLayer {
    #[serde(rename = "blobSum")]
    blob_sum: String,
}

impl Manifest {
    /// Parses a manifest from raw bytes, using the already-normalized wire
    /// digest and media type (typically taken from the registry response).
    pub fn parse(digest: String, wire_media_type: &str, payload: Vec<u8>) -> Result<Self> {
        let media_type = MediaType::normalize(wire_media_type)?;
        // Validate the payload parses under its media type up front so a
        // malformed manifest fails at pull time, not later when references()
        // is called mid-transfer.
        match media_type {
            MediaType::Schema1 => {
                serde_json::from_slice::<Schema1Manifest>(&payload)
                    .map_err(|e| SyncError::validation_with_source("invalid schema1 manifest", e))?;
            }
            MediaType::Schema2 => {
                serde_json::from_slice::<ImageManifest>(&payload)
                    .map_err(|e| SyncError::validation_with_source("invalid schema2 manifest", e))?;
            }
        }
        Ok(Self {
            digest,
            media_type,
            payload,
        })
    }

    /// Returns `(media_type, payload)`, mirroring the adapter's `Payload()`.
    pub fn as_payload(&self) -> (&'static str, &[u8]) {
        (self.media_type.as_str(), &self.payload)
    }

    /// The ordered list of blobs (config + layers) this manifest references.
    pub fn references(&self) -> Result<Vec<Descriptor>> {
        match self.media_type {
            MediaType::Schema1 => {
                let parsed: Schema1Manifest = serde_json::from_slice(&self.payload)
                    .map_err(|e| SyncError::validation_with_source("invalid schema1 manifest", e))?;
                Ok(parsed
                    .fs_layers
                    .into_iter()
                    .map(|l| Descriptor {
                        digest: l.blob_sum,
                        size: 0,
                    })
                    .collect())
            }
            MediaType::Schema2 => {
                let parsed: ImageManifest = serde_json::from_slice(&self.payload)
                    .map_err(|e| SyncError::validation_with_source("invalid schema2 manifest", e))?;
                let mut refs = Vec::with_capacity(parsed.layers().len() + 1);
                refs.push(Descriptor {
                    digest: parsed.config().digest().to_string(),
                    size: *parsed.config().size() as u64,
                });
                for layer in parsed.layers() {
                    refs.push(Descriptor {
                        digest: layer.digest().to_string(),
                        size: *layer.size() as u64,
                    });
                }
                Ok(refs)
            }
        }
    }
}
