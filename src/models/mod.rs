//! 数据模型层：文本缓冲、光标、编辑历史与可编辑文本控件

pub mod cursor;
pub mod decorations;
pub mod edit_history;
pub mod edit_op;
pub mod flash;
pub mod text_buffer;
pub mod text_edit;
pub mod viewport;

pub use cursor::{Cursor, CursorState};
pub use decorations::{DecorationOptions, Decorations, Segment};
pub use edit_history::{Edit, EditHistory, DEFAULT_MAX_ENTRIES};
pub use edit_op::EditOp;
pub use flash::{Flash, FLASH_DURATION};
pub use text_buffer::{slice_to_cow, BufferError, TextBuffer};
pub use text_edit::{SharedHistory, TextEdit};
pub use viewport::{Viewport, DEFAULT_VISIBLE_LINES};
