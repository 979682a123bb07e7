//! Serializable form of an [`EditorState`].
//!
//! Pixels are not embedded: image layers keep a `source_ref` key that a [`PixelSource`]
//! resolves on restore, and text layers re-rasterize from their style.

use std::collections::HashMap;
use std::sync::Arc;

use image::RgbaImage;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::canvas::CanvasFormat;
use crate::color::{Adjustment, ImageFilter};
use crate::editor::EditorState;
use crate::geometry::{CanvasSize, Transform};
use crate::layer::{ImageLayer, Layer, LayerCommon, LayerId, TextLayer};
use crate::text::{GlyphRasterizer, TextStyle};

pub const SNAPSHOT_VERSION: u32 = 1;

pub type SnapshotResult<T> = std::result::Result<T, SnapshotError>;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot JSON error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("unsupported snapshot version {found}")]
    UnsupportedVersion { found: u32 },
}

/// Reloads an image layer's pixels from its storage key.
pub trait PixelSource {
    fn load(&self, source_ref: &str) -> Option<Arc<RgbaImage>>;
}

impl PixelSource for HashMap<String, Arc<RgbaImage>> {
    fn load(&self, source_ref: &str) -> Option<Arc<RgbaImage>> {
        self.get(source_ref).cloned()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditorSnapshot {
    pub version: u32,
    pub file_name: String,
    pub canvas_format: CanvasFormat,
    pub canvas_size: CanvasSize,
    pub layers: Vec<LayerRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LayerRecord {
    Image(ImageRecord),
    Text(TextRecord),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageRecord {
    pub id: LayerId,
    pub display_name: String,
    pub transform: Transform,
    pub z_index: i32,
    pub visible: bool,
    #[serde(default)]
    pub filter: ImageFilter,
    #[serde(default)]
    pub adjustment: Adjustment,
    pub native_width: u32,
    pub native_height: u32,
    #[serde(default)]
    pub source_ref: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextRecord {
    pub id: LayerId,
    pub display_name: String,
    pub transform: Transform,
    pub z_index: i32,
    pub visible: bool,
    pub style: TextStyle,
}

impl EditorSnapshot {
    pub fn capture(state: &EditorState) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            file_name: state.file_name.clone(),
            canvas_format: state.canvas_format,
            canvas_size: state.canvas_size,
            layers: state.layers().iter().map(LayerRecord::capture).collect(),
        }
    }

    pub fn to_json(&self) -> SnapshotResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(raw: &str) -> SnapshotResult<Self> {
        let snapshot: Self = serde_json::from_str(raw)?;
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(SnapshotError::UnsupportedVersion {
                found: snapshot.version,
            });
        }
        Ok(snapshot)
    }

    /// Highest layer id in the document, for seeding an id allocator.
    pub fn max_layer_id(&self) -> Option<LayerId> {
        self.layers.iter().map(LayerRecord::id).max()
    }

    /// Rebuilds the state. Layers whose pixels cannot be loaded stay in place, unrenderable.
    pub fn restore<P, R>(&self, pixels: &P, rasterizer: &R) -> EditorState
    where
        P: PixelSource + ?Sized,
        R: GlyphRasterizer + ?Sized,
    {
        let layers = self
            .layers
            .iter()
            .map(|record| record.restore(pixels, rasterizer))
            .collect();
        EditorState::new(self.canvas_format)
            .with_canvas_size(self.canvas_size)
            .with_file_name(&self.file_name)
            .with_layers(layers)
    }
}

impl LayerRecord {
    fn capture(layer: &Layer) -> Self {
        match layer {
            Layer::Image(image) => {
                let (native_width, native_height) = image.native_size();
                Self::Image(ImageRecord {
                    id: image.id(),
                    display_name: image.display_name().to_string(),
                    transform: image.transform(),
                    z_index: image.z_index(),
                    visible: image.visible(),
                    filter: image.filter(),
                    adjustment: image.adjustment(),
                    native_width,
                    native_height,
                    source_ref: image.source_ref().map(str::to_string),
                })
            }
            Layer::Text(text) => Self::Text(TextRecord {
                id: text.id(),
                display_name: text.display_name().to_string(),
                transform: text.transform(),
                z_index: text.z_index(),
                visible: text.visible(),
                style: text.style().clone(),
            }),
        }
    }

    pub fn id(&self) -> LayerId {
        match self {
            Self::Image(record) => record.id,
            Self::Text(record) => record.id,
        }
    }

    fn restore<P, R>(&self, pixels: &P, rasterizer: &R) -> Layer
    where
        P: PixelSource + ?Sized,
        R: GlyphRasterizer + ?Sized,
    {
        match self {
            Self::Image(record) => Layer::Image(record.restore(pixels)),
            Self::Text(record) => Layer::Text(
                TextLayer::new(
                    record.id,
                    record.display_name.clone(),
                    record.style.clone(),
                    record.transform,
                    record.z_index,
                    rasterizer,
                )
                .with_visible(record.visible),
            ),
        }
    }
}

impl ImageRecord {
    fn restore<P: PixelSource + ?Sized>(&self, pixels: &P) -> ImageLayer {
        let layer = ImageLayer::detached(
            self.id,
            self.display_name.clone(),
            (self.native_width, self.native_height),
            self.transform,
            self.z_index,
        )
        .with_visible(self.visible)
        .with_source_ref(self.source_ref.clone());
        let layer = if self.adjustment.is_neutral() {
            layer.with_filter(self.filter)
        } else {
            layer.with_adjustment(self.adjustment)
        };

        let loaded = self
            .source_ref
            .as_deref()
            .and_then(|source_ref| pixels.load(source_ref));
        match loaded {
            Some(buffer) => layer.with_pixels(buffer),
            None => {
                tracing::warn!(
                    layer = %self.id,
                    source_ref = ?self.source_ref,
                    "image pixels unavailable; layer restored without pixels"
                );
                layer
            }
        }
    }
}
