use super::text_buffer::{BufferError, TextBuffer};

/// 可逆的原子操作；删除操作保存被删文本，逆操作可逐字节还原
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EditOp {
    Insert { offset: usize, text: String },
    Delete { offset: usize, text: String },
}

impl EditOp {
    pub fn insert(offset: usize, text: impl Into<String>) -> Self {
        EditOp::Insert {
            offset,
            text: text.into(),
        }
    }

    pub fn delete(offset: usize, text: impl Into<String>) -> Self {
        EditOp::Delete {
            offset,
            text: text.into(),
        }
    }

    pub fn offset(&self) -> usize {
        match self {
            EditOp::Insert { offset, .. } | EditOp::Delete { offset, .. } => *offset,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            EditOp::Insert { text, .. } | EditOp::Delete { text, .. } => text.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn inverse(&self) -> EditOp {
        match self {
            EditOp::Insert { offset, text } => EditOp::Delete {
                offset: *offset,
                text: text.clone(),
            },
            EditOp::Delete { offset, text } => EditOp::Insert {
                offset: *offset,
                text: text.clone(),
            },
        }
    }

    pub fn apply(&self, buffer: &mut TextBuffer) -> Result<(), BufferError> {
        match self {
            EditOp::Insert { offset, text } => buffer.insert(*offset, text),
            EditOp::Delete { offset, text } => {
                let removed = buffer.delete(*offset, text.len())?;
                debug_assert_eq!(&removed, text);
                Ok(())
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/models/edit_op.rs"]
mod tests;
