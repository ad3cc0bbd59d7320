//! 编辑历史管理
//!
//! - Edit：一次原子事务，包含若干 EditOp 以及事务前后的光标状态
//! - EditHistory：有界环形队列 + 当前位置指针
//! - Undo 后追加新 Edit 会丢弃尚未 Redo 的条目，不产生分支
//! - 超出容量时淘汰最旧的条目

use super::cursor::CursorState;
use super::edit_op::EditOp;
use super::text_buffer::{BufferError, TextBuffer};
use std::collections::VecDeque;

/// 默认保留的 Edit 数量
pub const DEFAULT_MAX_ENTRIES: usize = 128;

#[derive(Clone, Debug)]
pub struct Edit {
    ops: Vec<EditOp>,
    pre_state: CursorState,
    post_state: CursorState,
}

impl Edit {
    pub fn new(pre_state: CursorState) -> Self {
        Self {
            ops: Vec::new(),
            pre_state,
            post_state: pre_state,
        }
    }

    pub fn push(&mut self, op: EditOp) {
        self.ops.push(op);
    }

    pub fn ops(&self) -> &[EditOp] {
        &self.ops
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn pre_state(&self) -> CursorState {
        self.pre_state
    }

    pub fn post_state(&self) -> CursorState {
        self.post_state
    }

    pub fn set_post_state(&mut self, state: CursorState) {
        self.post_state = state;
    }

    /// 整体应用（redo）或整体撤销（undo），返回需要恢复的光标状态。
    ///
    /// 先在副本上执行（Rope 克隆为 O(1)），全部成功后再替换，
    /// 失败时原缓冲区保持不变。
    pub fn apply_undo_redo(
        &self,
        buffer: &mut TextBuffer,
        redo: bool,
    ) -> Result<CursorState, BufferError> {
        let mut scratch = buffer.clone();
        if redo {
            for op in &self.ops {
                op.apply(&mut scratch)?;
            }
        } else {
            for op in self.ops.iter().rev() {
                op.inverse().apply(&mut scratch)?;
            }
        }
        *buffer = scratch;
        Ok(if redo { self.post_state } else { self.pre_state })
    }
}

pub struct EditHistory {
    edits: VecDeque<Edit>,
    /// edits[..pos] 可撤销，edits[pos..] 可重做
    pos: usize,
    max_entries: usize,
}

impl EditHistory {
    pub fn new(max_entries: usize) -> Self {
        let max_entries = max_entries.max(1);
        Self {
            edits: VecDeque::with_capacity(max_entries.min(DEFAULT_MAX_ENTRIES)),
            pos: 0,
            max_entries,
        }
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    pub fn len(&self) -> usize {
        self.edits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    /// 追加已提交的 Edit，空 Edit 不记录
    pub fn append(&mut self, edit: Edit) {
        if edit.is_empty() {
            return;
        }
        self.clear_forward();
        self.edits.push_back(edit);
        while self.edits.len() > self.max_entries {
            self.edits.pop_front();
        }
        self.pos = self.edits.len();
    }

    pub fn undo_redo(&mut self, redo: bool) -> Option<&Edit> {
        if redo {
            if self.pos >= self.edits.len() {
                return None;
            }
            self.pos += 1;
            self.edits.get(self.pos - 1)
        } else {
            if self.pos == 0 {
                return None;
            }
            self.pos -= 1;
            self.edits.get(self.pos)
        }
    }

    pub fn undo(&mut self) -> Option<&Edit> {
        self.undo_redo(false)
    }

    pub fn redo(&mut self) -> Option<&Edit> {
        self.undo_redo(true)
    }

    pub fn can_undo(&self) -> bool {
        self.pos > 0
    }

    pub fn can_redo(&self) -> bool {
        self.pos < self.edits.len()
    }

    pub fn clear(&mut self) {
        self.edits.clear();
        self.pos = 0;
    }

    pub fn clear_forward(&mut self) {
        self.edits.truncate(self.pos);
    }
}

impl Default for EditHistory {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ENTRIES)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/models/edit_history.rs"]
mod tests;
