use std::fmt;
use std::sync::Arc;

use image::RgbaImage;

use super::state::EditorState;
use crate::canvas::CanvasFormat;
use crate::color::{Adjustment, ImageFilter};
use crate::config::EditorConfig;
use crate::error::EngineResult;
use crate::geometry::{clamp_scale, CanvasSize, Color, Transform};
use crate::gesture::TransformGesture;
use crate::history::{History, HistoryDirection};
use crate::hit::hit_test_padded;
use crate::layer::{next_z_index, ImageLayer, Layer, LayerCommon, LayerId, TextLayer};
use crate::render::{Compositor, RenderResult, SelectionStyle};
use crate::snapshot::{EditorSnapshot, PixelSource};
use crate::text::{GlyphRasterizer, TextStyle};

pub type ChangeListener = Box<dyn FnMut(&EditorState) + Send>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Interaction {
    Idle,
    Active { recorded: bool },
}

/// Unsnapped center of the layer being dragged. Valid only while the layer still holds
/// the transform the last gesture step produced.
#[derive(Debug, Clone, Copy, PartialEq)]
struct DragAnchor {
    layer: LayerId,
    emitted: Transform,
    raw_center: (f32, f32),
}

/// Owns one editing session: the current [`EditorState`], its undo history and the
/// collaborators needed to build layers.
///
/// Every layer-changing call records the pre-change layer list first. Between
/// [`EditorSession::begin_interaction`] and [`EditorSession::end_interaction`] only the first
/// change is recorded, so a drag or slider sweep undoes as one step.
pub struct EditorSession<R: GlyphRasterizer> {
    state: EditorState,
    history: History,
    config: EditorConfig,
    compositor: Compositor,
    rasterizer: R,
    next_id: u64,
    image_count: u32,
    text_count: u32,
    interaction: Interaction,
    drag_anchor: Option<DragAnchor>,
    listener: Option<ChangeListener>,
}

impl<R: GlyphRasterizer> fmt::Debug for EditorSession<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EditorSession")
            .field("state", &self.state)
            .field("can_undo", &self.history.can_undo())
            .field("can_redo", &self.history.can_redo())
            .field("next_id", &self.next_id)
            .field("interaction", &self.interaction)
            .finish_non_exhaustive()
    }
}

impl<R: GlyphRasterizer> EditorSession<R> {
    pub fn new(rasterizer: R, config: EditorConfig) -> Self {
        let compositor = Compositor::new(SelectionStyle {
            color: config.selection_color,
            stroke_px: config.selection_stroke_px,
            padding_px: config.selection_padding_px,
        });
        Self {
            state: EditorState::default(),
            history: History::new(config.history_depth),
            config,
            compositor,
            rasterizer,
            next_id: 1,
            image_count: 0,
            text_count: 0,
            interaction: Interaction::Idle,
            drag_anchor: None,
            listener: None,
        }
    }

    /// Registers the callback invoked with the new state after every applied change.
    pub fn on_change(&mut self, listener: impl FnMut(&EditorState) + Send + 'static) {
        self.listener = Some(Box::new(listener));
    }

    pub fn state(&self) -> &EditorState {
        &self.state
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn rasterizer(&self) -> &R {
        &self.rasterizer
    }

    fn allocate_id(&mut self) -> LayerId {
        let id = self.next_id;
        self.next_id = self.next_id.saturating_add(1);
        LayerId::new(id)
    }

    fn notify(&mut self) {
        if let Some(listener) = self.listener.as_mut() {
            listener(&self.state);
        }
    }

    /// Runs a state transition, recording history only when the layer list changes.
    fn apply(&mut self, operation: &'static str, transition: impl FnOnce(EditorState) -> EditorState) {
        let next = transition(self.state.clone());
        if next == self.state {
            tracing::debug!(operation, "no-op");
            return;
        }
        if self.state.layers_differ(&next) {
            self.record_snapshot();
        }
        self.state = next;
        tracing::debug!(
            operation,
            layers = self.state.layers().len(),
            selected = ?self.state.selected_layer_id(),
            "editor state updated"
        );
        self.notify();
    }

    fn record_snapshot(&mut self) {
        match self.interaction {
            Interaction::Active { recorded: true } => {}
            Interaction::Active { recorded: false } => {
                self.history.snapshot(self.state.layers());
                self.interaction = Interaction::Active { recorded: true };
            }
            Interaction::Idle => self.history.snapshot(self.state.layers()),
        }
    }

    pub fn begin_interaction(&mut self) {
        self.interaction = Interaction::Active { recorded: false };
        self.drag_anchor = None;
    }

    pub fn end_interaction(&mut self) {
        self.interaction = Interaction::Idle;
        self.drag_anchor = None;
    }

    /// Host-measured canvas size in preview pixels. Not versioned.
    pub fn set_canvas_size(&mut self, canvas_size: CanvasSize) {
        self.apply("set_canvas_size", |state| state.with_canvas_size(canvas_size));
    }

    /// Adds a decoded image centered on the canvas, scaled to fit inside it.
    pub fn add_image_layer(&mut self, pixels: Arc<RgbaImage>, source_ref: Option<String>) -> LayerId {
        let id = self.allocate_id();
        self.image_count = self.image_count.saturating_add(1);
        let (width, height) = pixels.dimensions();
        let canvas = self.state.canvas_size;

        let fit = if canvas.is_measured() && width > 0 && height > 0 {
            (canvas.width / width as f32)
                .min(canvas.height / height as f32)
                .min(1.0)
        } else {
            1.0
        };
        let scale = clamp_scale(
            fit * self.config.import_fit_ratio,
            self.config.min_scale,
            self.config.max_scale,
        );
        let (x, y) = canvas.center();
        let layer = ImageLayer::new(
            id,
            format!("Image {}", self.image_count),
            pixels,
            Transform::new(x, y, scale, 0.0),
            next_z_index(self.state.layers()),
        )
        .with_source_ref(source_ref);

        tracing::debug!(layer = %id, width, height, scale, "adding image layer");
        self.apply("add_image_layer", |state| state.add_layer(layer.into()));
        id
    }

    pub fn add_text_layer(&mut self, style: TextStyle) -> LayerId {
        let id = self.allocate_id();
        self.text_count = self.text_count.saturating_add(1);
        let style = self.normalized_style(style);
        let (x, y) = self.state.canvas_size.center();
        let layer = TextLayer::new(
            id,
            format!("Text {}", self.text_count),
            style,
            Transform::at(x, y),
            next_z_index(self.state.layers()),
            &self.rasterizer,
        );

        tracing::debug!(layer = %id, "adding text layer");
        self.apply("add_text_layer", |state| state.add_layer(layer.into()));
        id
    }

    fn normalized_style(&self, mut style: TextStyle) -> TextStyle {
        style.font_size_px = if style.font_size_px.is_finite() && style.font_size_px > 0.0 {
            style.font_size_px.min(self.config.max_font_size_px)
        } else {
            self.config.default_font_size_px
        };
        style
    }

    /// Text style for a new layer using the configured default size.
    pub fn default_text_style(&self, text: impl Into<String>) -> TextStyle {
        TextStyle::new(text, Color::BLACK, self.config.default_font_size_px)
    }

    pub fn update_layer(&mut self, layer: Layer) {
        let layer = self.clamp_layer_scale(layer);
        self.apply("update_layer", |state| state.update_layer(layer));
    }

    fn clamp_layer_scale(&self, layer: Layer) -> Layer {
        let transform = layer.transform();
        layer.with_transform(transform.with_scale_clamped(
            transform.scale,
            self.config.min_scale,
            self.config.max_scale,
        ))
    }

    pub fn remove_layer(&mut self, id: LayerId) {
        self.apply("remove_layer", |state| state.remove_layer(id));
    }

    pub fn remove_selected(&mut self) {
        if let Some(id) = self.state.selected_layer_id() {
            self.remove_layer(id);
        }
    }

    pub fn move_layer_up(&mut self, id: LayerId) {
        self.apply("move_layer_up", |state| state.move_up(id));
    }

    pub fn move_layer_down(&mut self, id: LayerId) {
        self.apply("move_layer_down", |state| state.move_down(id));
    }

    pub fn move_layer_to_top(&mut self, id: LayerId) {
        self.apply("move_layer_to_top", |state| state.move_to_top(id));
    }

    pub fn select_layer(&mut self, id: Option<LayerId>) {
        self.apply("select_layer", |state| state.select(id));
    }

    /// Selects the top-most layer under a canvas point; a miss clears the selection.
    pub fn tap(&mut self, x: f32, y: f32) -> Option<LayerId> {
        let hit = hit_test_padded(self.state.layers(), x, y, self.config.text_hit_padding_px)
            .map(LayerCommon::id);
        self.select_layer(hit);
        hit
    }

    pub fn set_layer_visibility(&mut self, id: LayerId, visible: bool) {
        let Some(layer) = self.state.layer(id).cloned() else {
            return;
        };
        self.apply("set_layer_visibility", |state| {
            state.update_layer(layer.with_visible(visible))
        });
    }

    /// Applies a pinch/pan/rotate step to the selected layer, snapping to canvas guides.
    ///
    /// Consecutive steps on the same layer accumulate pan from the unsnapped center, so a
    /// slow drag can leave a snap zone.
    pub fn apply_gesture(&mut self, gesture: TransformGesture) {
        let Some(layer) = self.state.selected_layer().cloned() else {
            return;
        };
        let id = layer.id();
        let current = layer.transform();
        let raw_center = match self.drag_anchor {
            Some(anchor) if anchor.layer == id && anchor.emitted == current => anchor.raw_center,
            _ => (current.x, current.y),
        };
        let step = gesture.apply(
            current,
            raw_center,
            layer.content_size(),
            self.state.canvas_size,
            &self.config.gesture_limits(),
        );
        self.drag_anchor = Some(DragAnchor {
            layer: id,
            emitted: step.transform,
            raw_center: step.raw_center,
        });
        self.apply("apply_gesture", |state| {
            state.update_layer(layer.with_transform(step.transform))
        });
    }

    pub fn update_selected_adjustment(&mut self, adjustment: Adjustment) {
        self.update_selected_image("update_selected_adjustment", |image| {
            image.with_adjustment(adjustment)
        });
    }

    pub fn update_selected_filter(&mut self, filter: ImageFilter) {
        self.update_selected_image("update_selected_filter", |image| image.with_filter(filter));
    }

    /// Swaps the selected image's pixels, e.g. for a crop result.
    pub fn replace_selected_bitmap(&mut self, pixels: Arc<RgbaImage>) {
        self.update_selected_image("replace_selected_bitmap", |image| image.with_pixels(pixels));
    }

    fn update_selected_image(
        &mut self,
        operation: &'static str,
        change: impl FnOnce(ImageLayer) -> ImageLayer,
    ) {
        let Some(image) = self.state.selected_image_layer().cloned() else {
            tracing::debug!(operation, "no image layer selected");
            return;
        };
        self.apply(operation, |state| state.update_layer(Layer::Image(change(image))));
    }

    /// Re-styles the selected text layer and re-measures it.
    pub fn update_selected_text(&mut self, style: TextStyle) {
        let Some(text) = self.state.selected_text_layer().cloned() else {
            tracing::debug!("no text layer selected");
            return;
        };
        let style = self.normalized_style(style);
        let restyled = text.restyled(style, &self.rasterizer);
        self.apply("update_selected_text", |state| {
            state.update_layer(Layer::Text(restyled))
        });
    }

    /// Delivers pixels reloaded in the background. Not an undoable edit: stored history
    /// copies of the layer receive the buffer as well.
    pub fn attach_layer_pixels(&mut self, id: LayerId, pixels: Arc<RgbaImage>) {
        let Some(image) = self.state.layer(id).and_then(Layer::as_image).cloned() else {
            tracing::warn!(layer = %id, "reloaded pixels for unknown image layer dropped");
            return;
        };
        let attach = |image: &ImageLayer| Layer::Image(image.clone().with_pixels(Arc::clone(&pixels)));
        self.history
            .patch_layer(id, |layer| layer.as_image().map(|image| attach(image)));
        self.state = self.state.clone().update_layer(attach(&image));
        tracing::debug!(layer = %id, "attached reloaded pixels");
        self.notify();
    }

    pub fn rename_file(&mut self, name: &str) {
        self.apply("rename_file", |state| state.with_file_name(name));
    }

    pub fn undo(&mut self) -> bool {
        self.step_history(HistoryDirection::Undo)
    }

    pub fn redo(&mut self) -> bool {
        self.step_history(HistoryDirection::Redo)
    }

    fn step_history(&mut self, direction: HistoryDirection) -> bool {
        self.interaction = Interaction::Idle;
        self.drag_anchor = None;
        let Some(layers) = self.history.step(direction, self.state.layers()) else {
            tracing::debug!("{}", direction.empty_message());
            return false;
        };
        self.state = self.state.clone().with_layers(layers);
        tracing::debug!(
            selected = ?self.state.selected_layer_id(),
            "{}",
            direction.applied_message()
        );
        self.notify();
        true
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Empties the canvas and forgets history; format, size and file name are kept.
    pub fn reset(&mut self) {
        self.history.clear();
        self.interaction = Interaction::Idle;
        self.image_count = 0;
        self.text_count = 0;
        self.state = self.state.clone().with_layers(Vec::new());
        tracing::debug!("session reset");
        self.notify();
    }

    /// Starts a fresh document for `format`. The host must report the new canvas size.
    pub fn new_session(&mut self, format: CanvasFormat) {
        self.history.clear();
        self.interaction = Interaction::Idle;
        self.image_count = 0;
        self.text_count = 0;
        self.state = EditorState::new(format);
        tracing::debug!(format = format.title(), "new session");
        self.notify();
    }

    pub fn capture(&self) -> EditorSnapshot {
        EditorSnapshot::capture(&self.state)
    }

    /// Serializes the current document for the host's draft store.
    pub fn save_json(&self) -> EngineResult<String> {
        Ok(self.capture().to_json()?)
    }

    /// Parses a persisted document and restores it. A rejected document leaves the session
    /// untouched.
    pub fn restore_json<P: PixelSource + ?Sized>(&mut self, raw: &str, pixels: &P) -> EngineResult<()> {
        let snapshot = EditorSnapshot::from_json(raw)?;
        self.restore(&snapshot, pixels);
        Ok(())
    }

    /// Replaces the session with a persisted document. History starts empty.
    pub fn restore<P: PixelSource + ?Sized>(&mut self, snapshot: &EditorSnapshot, pixels: &P) {
        let canvas_size = self.state.canvas_size;
        let mut state = snapshot.restore(pixels, &self.rasterizer);
        if canvas_size.is_measured() && !state.canvas_size.is_measured() {
            state = state.with_canvas_size(canvas_size);
        }
        let layers = state
            .layers()
            .iter()
            .cloned()
            .map(|layer| self.clamp_layer_scale(layer))
            .collect();
        let state = state.with_layers(layers);
        if let Some(max_id) = snapshot.max_layer_id() {
            self.next_id = self.next_id.max(max_id.get().saturating_add(1));
        }
        let images = state.layers().iter().filter(|layer| layer.as_image().is_some()).count();
        let texts = state.layers().len() - images;
        self.image_count = u32::try_from(images).unwrap_or(u32::MAX);
        self.text_count = u32::try_from(texts).unwrap_or(u32::MAX);
        self.history.clear();
        self.interaction = Interaction::Idle;
        self.drag_anchor = None;
        self.state = state;
        tracing::info!(
            layers = self.state.layers().len(),
            file_name = %self.state.file_name,
            "session restored"
        );
        self.notify();
    }

    pub fn selected_layer(&self) -> Option<&Layer> {
        self.state.selected_layer()
    }

    pub fn selected_image_layer(&self) -> Option<&ImageLayer> {
        self.state.selected_image_layer()
    }

    pub fn selected_text_layer(&self) -> Option<&TextLayer> {
        self.state.selected_text_layer()
    }

    pub fn render_preview(&self) -> RenderResult<RgbaImage> {
        self.compositor
            .render_preview(&self.state, self.config.export_background)
    }

    /// Renders at the canvas format's export size.
    pub fn export(&self) -> RenderResult<RgbaImage> {
        self.export_at(self.state.canvas_format.export_size())
    }

    pub fn export_at(&self, export_size: (u32, u32)) -> RenderResult<RgbaImage> {
        self.compositor
            .export(&self.state, export_size, self.config.export_background)
    }
}
