//! 编辑器层：行（View）、文件信息（FileInfo）、布局与会话

mod editor;
pub mod file_info;
pub mod layout;
pub mod registry;
pub mod session;
pub mod toolbar;
pub mod view;

pub use editor::{Editor, EditorError, EditorHandle, DEFAULT_TOOLBAR_SUFFIX};
pub use file_info::{content_hash, is_special_name, ContentHash, FileInfo, InfoKind};
pub use layout::{Column, Layout, RowSlot};
pub use registry::{normalize_name, FileRegistry};
pub use session::{Session, SessionColumn, SessionError, SessionRow, Sessions, SESSIONS_ROW};
pub use toolbar::{escape_arg, HomeVars, ToolbarData};
pub use view::{RowState, View, ViewId, Views};
