pub mod align;
pub mod canvas;
pub mod color;
pub mod config;
pub mod editor;
pub mod error;
pub mod geometry;
pub mod gesture;
pub mod history;
pub mod hit;
pub mod layer;
pub mod logging;
pub mod render;
pub mod snapshot;
pub mod text;

pub use canvas::CanvasFormat;
pub use config::{load_editor_config, EditorConfig};
pub use editor::{EditorSession, EditorState};
pub use error::{EngineError, EngineResult};
pub use geometry::{CanvasSize, Color, Transform};
pub use layer::{ImageLayer, Layer, LayerCommon, LayerId, TextLayer};
pub use render::Compositor;
pub use snapshot::EditorSnapshot;
pub use text::{FontRasterizer, GlyphRasterizer, TextStyle};

/// Builds a session with logging installed and `editor.json` applied.
pub fn start_session<R: GlyphRasterizer>(rasterizer: R) -> EditorSession<R> {
    logging::init();
    let config = load_editor_config();
    tracing::info!(history_depth = config.history_depth, "starting layercraft session");
    EditorSession::new(rasterizer, config)
}
