use crate::canvas::CanvasFormat;
use crate::geometry::CanvasSize;
use crate::layer::{top_most_id, ImageLayer, Layer, LayerCommon, LayerId, TextLayer};

pub const DEFAULT_FILE_NAME: &str = "Draft";
pub const MAX_FILE_NAME_CHARS: usize = 20;
const FORBIDDEN_FILE_NAME_CHARS: &[char] = &['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// Whole editing document. Every transition consumes the old value and returns the new one.
///
/// `selected_layer_id`, when set, always names a layer present in `layers`.
#[derive(Debug, Clone, PartialEq)]
pub struct EditorState {
    layers: Vec<Layer>,
    selected_layer_id: Option<LayerId>,
    pub canvas_size: CanvasSize,
    pub canvas_format: CanvasFormat,
    pub file_name: String,
}

impl Default for EditorState {
    fn default() -> Self {
        Self::new(CanvasFormat::default())
    }
}

impl EditorState {
    pub fn new(canvas_format: CanvasFormat) -> Self {
        Self {
            layers: Vec::new(),
            selected_layer_id: None,
            canvas_size: CanvasSize::ZERO,
            canvas_format,
            file_name: DEFAULT_FILE_NAME.to_string(),
        }
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub const fn selected_layer_id(&self) -> Option<LayerId> {
        self.selected_layer_id
    }

    pub fn layer(&self, id: LayerId) -> Option<&Layer> {
        self.layers.iter().find(|layer| layer.id() == id)
    }

    fn position(&self, id: LayerId) -> Option<usize> {
        self.layers.iter().position(|layer| layer.id() == id)
    }

    pub fn selected_layer(&self) -> Option<&Layer> {
        self.layer(self.selected_layer_id?)
    }

    pub fn selected_image_layer(&self) -> Option<&ImageLayer> {
        self.selected_layer()?.as_image()
    }

    pub fn selected_text_layer(&self) -> Option<&TextLayer> {
        self.selected_layer()?.as_text()
    }

    /// Installs a whole layer list (undo, redo, restore) and selects its top-most layer.
    pub fn with_layers(self, layers: Vec<Layer>) -> Self {
        let selected_layer_id = top_most_id(&layers);
        Self {
            layers,
            selected_layer_id,
            ..self
        }
    }

    pub fn with_canvas_size(self, canvas_size: CanvasSize) -> Self {
        Self {
            canvas_size,
            ..self
        }
    }

    pub fn with_file_name(self, raw: &str) -> Self {
        Self {
            file_name: sanitize_file_name(raw),
            ..self
        }
    }

    /// Appends a layer and selects it.
    pub fn add_layer(mut self, layer: Layer) -> Self {
        self.selected_layer_id = Some(layer.id());
        self.layers.push(layer);
        self
    }

    /// Replaces the layer with the same id; unknown ids leave the state untouched.
    pub fn update_layer(mut self, updated: Layer) -> Self {
        match self.position(updated.id()) {
            Some(index) => self.layers[index] = updated,
            None => tracing::debug!(layer = %updated.id(), "update ignored; layer not found"),
        }
        self
    }

    /// Removes a layer and selects the new top-most one.
    pub fn remove_layer(mut self, id: LayerId) -> Self {
        if self.position(id).is_none() {
            return self;
        }
        let mut layers = std::mem::take(&mut self.layers);
        layers.retain(|layer| layer.id() != id);
        self.with_layers(layers)
    }

    /// Selects a layer, or clears the selection with `None`. Unknown ids are ignored.
    pub fn select(self, id: Option<LayerId>) -> Self {
        match id {
            Some(id) if self.position(id).is_none() => self,
            selected_layer_id => Self {
                selected_layer_id,
                ..self
            },
        }
    }

    /// Moves a layer one step toward the front. No-op for the front-most layer.
    pub fn move_up(self, id: LayerId) -> Self {
        match self.position(id) {
            Some(index) if index + 1 < self.layers.len() => {
                self.reorder(|layers| layers.swap(index, index + 1))
            }
            _ => self,
        }
    }

    /// Moves a layer one step toward the back. No-op for the back-most layer.
    pub fn move_down(self, id: LayerId) -> Self {
        match self.position(id) {
            Some(index) if index > 0 => self.reorder(|layers| layers.swap(index, index - 1)),
            _ => self,
        }
    }

    pub fn move_to_top(self, id: LayerId) -> Self {
        match self.position(id) {
            Some(index) if index + 1 < self.layers.len() => self.reorder(|layers| {
                let layer = layers.remove(index);
                layers.push(layer);
            }),
            _ => self,
        }
    }

    fn reorder(mut self, change: impl FnOnce(&mut Vec<Layer>)) -> Self {
        let mut layers = std::mem::take(&mut self.layers);
        change(&mut layers);
        self.with_layers(reassign_z_index(layers))
    }

    /// Whether a transition from `self` to `next` changed the versioned layer list.
    pub fn layers_differ(&self, next: &Self) -> bool {
        self.layers != next.layers
    }
}

/// Rewrites each layer's z-index to its list position, back (0) to front (N-1).
pub fn reassign_z_index(layers: Vec<Layer>) -> Vec<Layer> {
    layers
        .into_iter()
        .enumerate()
        .map(|(index, layer)| layer.with_z_index(i32::try_from(index).unwrap_or(i32::MAX)))
        .collect()
}

/// Strips path-hostile characters, trims and truncates; empty names fall back to "Draft".
pub fn sanitize_file_name(raw: &str) -> String {
    let stripped: String = raw
        .chars()
        .filter(|ch| !FORBIDDEN_FILE_NAME_CHARS.contains(ch))
        .collect();
    let truncated: String = stripped.trim().chars().take(MAX_FILE_NAME_CHARS).collect();
    if truncated.is_empty() {
        DEFAULT_FILE_NAME.to_string()
    } else {
        truncated
    }
}
