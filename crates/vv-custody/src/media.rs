//! # Media Pipeline Seam
//!
//! After a mint confirms, the collectible gets its presentation assets: a
//! card image and the NFT metadata document describing it. The custody
//! service treats the whole step as one all-or-nothing
//! [`MediaPipeline::generate_and_upload`] call — either both assets exist
//! and both pointers come back, or the record keeps its placeholder pointer
//! and stays fully claimable (media failure is never fatal to custody).
//!
//! [`FsMediaPipeline`] renders an SVG card and writes both files under a
//! media root this service serves itself; swapping in a CDN or permanent
//! storage later means swapping this one implementation.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::record::CustodyRecord;

// ─── Errors ──────────────────────────────────────────────────────────

/// Errors from media generation and upload.
#[derive(Debug, Error)]
pub enum MediaError {
    /// Filesystem failure preparing or writing a media asset.
    #[error("media i/o failure at {path}: {source}")]
    Io {
        /// The path being written.
        path: String,
        /// The underlying filesystem error.
        #[source]
        source: std::io::Error,
    },

    /// The metadata document could not be serialized.
    #[error("metadata serialization failed: {detail}")]
    Serialize {
        /// What went wrong.
        detail: String,
    },
}

// ─── Metadata Document ───────────────────────────────────────────────

/// One `trait_type`/`value` pair in the NFT metadata document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataAttribute {
    pub trait_type: String,
    pub value: String,
}

/// The NFT metadata document for a collectible, in the shape wallets and
/// marketplaces render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VibeMetadata {
    pub name: String,
    pub description: String,
    pub image: String,
    pub external_url: String,
    pub attributes: Vec<MetadataAttribute>,
}

impl VibeMetadata {
    /// Compose the metadata document for `record`.
    ///
    /// `image` and `external_url` are passed in because the caller decides
    /// where the assets live: the placeholder endpoint composes with
    /// whatever the record currently points at, the upload pipeline with
    /// the final asset URL.
    pub fn compose(record: &CustodyRecord, image: String, external_url: String) -> Self {
        let handle = record.recipient_handle.display_with_at();
        Self {
            name: format!("Vibe for {handle}"),
            description: format!(
                "A vibe sent to {handle}. Verified by wallet {}.",
                record.masked_sender
            ),
            image,
            external_url,
            attributes: vec![
                MetadataAttribute {
                    trait_type: "Recipient".to_string(),
                    value: handle,
                },
                MetadataAttribute {
                    trait_type: "Sender Wallet".to_string(),
                    value: record.masked_sender.clone(),
                },
                MetadataAttribute {
                    trait_type: "Mint".to_string(),
                    value: record.asset_address.clone().unwrap_or_default(),
                },
                MetadataAttribute {
                    trait_type: "Created".to_string(),
                    value: record.created_at.to_rfc3339(),
                },
                MetadataAttribute {
                    trait_type: "Status".to_string(),
                    value: record.status.to_string(),
                },
            ],
        }
    }
}

// ─── Pipeline Seam ───────────────────────────────────────────────────

/// Where the uploaded assets ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaAssets {
    /// Public URL of the collectible image.
    pub image_pointer: String,
    /// Public URL of the metadata document.
    pub metadata_pointer: String,
}

/// Generates and stores a collectible's presentation assets.
#[async_trait]
pub trait MediaPipeline: Send + Sync {
    /// Render and store the card image and metadata document for `record`,
    /// returning the public pointers. All-or-nothing.
    async fn generate_and_upload(&self, record: &CustodyRecord) -> Result<MediaAssets, MediaError>;
}

// ─── Filesystem Implementation ───────────────────────────────────────

/// Renders media into a directory this service serves under `/media`.
#[derive(Debug, Clone)]
pub struct FsMediaPipeline {
    media_dir: PathBuf,
    base_url: String,
}

impl FsMediaPipeline {
    pub fn new(media_dir: impl Into<PathBuf>, base_url: &str) -> Self {
        Self {
            media_dir: media_dir.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Filesystem path of the stored card image for `record_id`.
    pub fn image_path(&self, record_id: &str) -> PathBuf {
        self.media_dir.join("vibes").join(format!("{record_id}.svg"))
    }

    /// Filesystem path of the stored metadata document for `record_id`.
    pub fn metadata_path(&self, record_id: &str) -> PathBuf {
        self.media_dir
            .join("metadata")
            .join(format!("{record_id}.json"))
    }

    fn image_url(&self, record_id: &str) -> String {
        format!("{}/media/vibes/{record_id}.svg", self.base_url)
    }

    fn metadata_url(&self, record_id: &str) -> String {
        format!("{}/media/metadata/{record_id}.json", self.base_url)
    }

    fn vibe_url(&self, record_id: &str) -> String {
        format!("{}/v/{record_id}", self.base_url)
    }

    async fn write_asset(&self, path: &Path, bytes: &[u8]) -> Result<(), MediaError> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|source| {
                MediaError::Io {
                    path: parent.display().to_string(),
                    source,
                }
            })?;
        }
        tokio::fs::write(path, bytes)
            .await
            .map_err(|source| MediaError::Io {
                path: path.display().to_string(),
                source,
            })
    }
}

/// Render the collectible card.
///
/// The interpolated values need no XML escaping: handles are restricted to
/// `[A-Za-z0-9_.]` at parse time and the masked sender is base58 plus the
/// ellipsis character.
fn render_card(record: &CustodyRecord) -> String {
    let handle = record.recipient_handle.display_with_at();
    let ordinal = record
        .sequence_number
        .map(|n| format!("#{n}"))
        .unwrap_or_default();
    format!(
        r##"<svg xmlns="http://www.w3.org/2000/svg" width="600" height="600" viewBox="0 0 600 600">
  <rect width="600" height="600" fill="#0b0e13"/>
  <rect x="24" y="24" width="552" height="552" rx="24" fill="none" stroke="#14f195" stroke-width="2"/>
  <text x="300" y="210" text-anchor="middle" font-family="monospace" font-size="56" fill="#14f195">VIBE</text>
  <text x="300" y="290" text-anchor="middle" font-family="monospace" font-size="30" fill="#e6f2ec">{handle}</text>
  <text x="300" y="336" text-anchor="middle" font-family="monospace" font-size="20" fill="#8e99a3">{ordinal}</text>
  <text x="52" y="500" font-family="monospace" font-size="16" fill="#00ff00">&gt; received a vibe</text>
  <text x="52" y="524" font-family="monospace" font-size="16" fill="#00ff00">&gt; verified by wallet {masked}</text>
</svg>
"##,
        handle = handle,
        ordinal = ordinal,
        masked = record.masked_sender,
    )
}

#[async_trait]
impl MediaPipeline for FsMediaPipeline {
    async fn generate_and_upload(&self, record: &CustodyRecord) -> Result<MediaAssets, MediaError> {
        let id = record.id.as_str();

        let card = render_card(record);
        self.write_asset(&self.image_path(id), card.as_bytes())
            .await?;

        let image_pointer = self.image_url(id);
        let document = VibeMetadata::compose(record, image_pointer.clone(), self.vibe_url(id));
        let json =
            serde_json::to_vec_pretty(&document).map_err(|e| MediaError::Serialize {
                detail: e.to_string(),
            })?;
        self.write_asset(&self.metadata_path(id), &json).await?;

        let assets = MediaAssets {
            image_pointer,
            metadata_pointer: self.metadata_url(id),
        };
        tracing::info!(
            vibe = %record.id,
            image = %assets.image_pointer,
            metadata = %assets.metadata_pointer,
            "media assets uploaded"
        );
        Ok(assets)
    }
}

// ─── Tests ───────────────────────────────────────────────────────────
