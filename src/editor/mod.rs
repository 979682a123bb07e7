//! Editing document and the session that versions it.

mod session;
mod state;

pub use session::{ChangeListener, EditorSession};
pub use state::{
    reassign_z_index, sanitize_file_name, EditorState, DEFAULT_FILE_NAME, MAX_FILE_NAME_CHARS,
};
