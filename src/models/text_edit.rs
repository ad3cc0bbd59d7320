//! 可编辑文本控件模型
//!
//! 组合 TextBuffer + Cursor + EditHistory + Viewport：
//! - 事务：begin_edit / end_edit 之间的原子操作归为一个 Edit
//! - Undo/Redo 后恢复光标并滚动到可见
//! - 行列、高亮等派生数据在变更时只做失效标记，读取时再计算

use super::cursor::{Cursor, CursorState};
use super::decorations::{self, DecorationOptions, Decorations, Segment};
use super::edit_history::{Edit, EditHistory, DEFAULT_MAX_ENTRIES};
use super::edit_op::EditOp;
use super::flash::Flash;
use super::text_buffer::{BufferError, TextBuffer};
use super::viewport::{Viewport, DEFAULT_VISIBLE_LINES};
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Instant;

/// 重复视图之间共享同一份历史
pub type SharedHistory = Rc<RefCell<EditHistory>>;

pub struct TextEdit {
    buffer: TextBuffer,
    cursor: Cursor,
    history: SharedHistory,
    edit: Option<Edit>,
    viewport: Viewport,
    deco_opts: DecorationOptions,
    cached_line_column: Option<(usize, usize)>,
    cached_decorations: Option<Decorations>,
    flash: Flash,
    needs_paint: bool,
    changed: bool,
}

impl TextEdit {
    pub fn new() -> Self {
        Self::with_limits(DEFAULT_MAX_ENTRIES, DEFAULT_VISIBLE_LINES)
    }

    pub fn with_limits(history_entries: usize, visible_lines: usize) -> Self {
        Self {
            buffer: TextBuffer::new(),
            cursor: Cursor::new(),
            history: Rc::new(RefCell::new(EditHistory::new(history_entries))),
            edit: None,
            viewport: Viewport::new(visible_lines),
            deco_opts: DecorationOptions::default(),
            cached_line_column: None,
            cached_decorations: None,
            flash: Flash::new(),
            needs_paint: true,
            changed: false,
        }
    }

    pub fn from_text(text: &str) -> Self {
        let mut te = Self::new();
        te.buffer.set_text(text);
        te
    }

    // ==================== 读取 ====================

    pub fn buffer(&self) -> &TextBuffer {
        &self.buffer
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn text(&self) -> String {
        self.buffer.text()
    }

    pub fn bytes(&self) -> Vec<u8> {
        self.buffer.bytes()
    }

    pub fn read(&self, offset: usize, len: usize) -> Result<String, BufferError> {
        self.buffer.read(offset, len)
    }

    // ==================== 光标 ====================

    pub fn cursor(&self) -> &Cursor {
        &self.cursor
    }

    pub fn set_cursor_index(&mut self, index: usize) {
        let index = self.buffer.floor_char_boundary(index);
        self.cursor.set_index(index);
        self.on_cursor_changed();
    }

    pub fn set_selection(&mut self, anchor: usize, index: usize) {
        let anchor = self.buffer.floor_char_boundary(anchor);
        let index = self.buffer.floor_char_boundary(index);
        self.cursor.set_selection(anchor, index);
        self.on_cursor_changed();
    }

    pub fn set_selection_off(&mut self) {
        self.cursor.set_selection_off();
        self.on_cursor_changed();
    }

    /// 光标所在 (行, 列)，按需计算并缓存
    pub fn cursor_line_column(&mut self) -> (usize, usize) {
        let (buffer, index) = (&self.buffer, self.cursor.index());
        *self
            .cached_line_column
            .get_or_insert_with(|| buffer.line_column(index))
    }

    fn restore_cursor_state(&mut self, state: CursorState) {
        let index = self.buffer.floor_char_boundary(state.index);
        match state.selection {
            Some(anchor) => {
                let anchor = self.buffer.floor_char_boundary(anchor);
                self.cursor.set_selection(anchor, index);
            }
            None => {
                self.cursor.set_selection_off();
                self.cursor.set_index(index);
            }
        }
        self.on_cursor_changed();

        if self.cursor.selection_on() {
            let (a, b) = self.cursor.selection_indexes();
            self.make_range_visible(a, b - a);
        } else {
            self.make_index_visible(self.cursor.index());
        }
    }

    fn clamp_cursor(&mut self) {
        let state = self.cursor.state();
        let index = self.buffer.floor_char_boundary(state.index);
        let selection = state
            .selection
            .map(|anchor| self.buffer.floor_char_boundary(anchor))
            .filter(|&anchor| anchor != index);
        self.cursor.restore(CursorState { index, selection });
    }

    // ==================== 事务 ====================

    pub fn is_editing(&self) -> bool {
        self.edit.is_some()
    }

    pub fn begin_edit(&mut self) {
        if self.edit.is_some() {
            panic!("begin_edit: already editing");
        }
        self.edit = Some(Edit::new(self.cursor.state()));
    }

    pub fn end_edit(&mut self) {
        let Some(mut edit) = self.edit.take() else {
            panic!("end_edit: not editing");
        };
        edit.set_post_state(self.cursor.state());
        self.history.borrow_mut().append(edit);
    }

    /// 没有显式事务时把单个操作包成一个事务
    fn with_transaction<R>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<R, BufferError>,
    ) -> Result<R, BufferError> {
        let auto = self.edit.is_none();
        if auto {
            self.begin_edit();
        }
        let result = f(self);
        if auto {
            self.end_edit();
        }
        result
    }

    fn record(&mut self, op: EditOp) {
        if let Some(edit) = self.edit.as_mut() {
            edit.push(op);
        }
        self.on_content_changed();
    }

    // ==================== 编辑 ====================

    pub fn insert(&mut self, offset: usize, text: &str) -> Result<(), BufferError> {
        if text.is_empty() {
            return self.buffer.insert(offset, text);
        }
        self.with_transaction(|te| {
            te.buffer.insert(offset, text)?;
            te.cursor.adjust_insert(offset, text.len());
            te.record(EditOp::insert(offset, text));
            Ok(())
        })
    }

    pub fn delete(&mut self, offset: usize, len: usize) -> Result<String, BufferError> {
        if len == 0 {
            return self.buffer.read(offset, 0);
        }
        self.with_transaction(|te| {
            let removed = te.buffer.delete(offset, len)?;
            te.cursor.adjust_delete(offset, len);
            te.record(EditOp::delete(offset, removed.clone()));
            Ok(removed)
        })
    }

    pub fn replace(&mut self, offset: usize, len: usize, text: &str) -> Result<(), BufferError> {
        self.with_transaction(|te| {
            te.delete(offset, len)?;
            te.insert(offset, text)
        })
    }

    /// 在光标处输入：先删除选区，再插入，光标移到插入文本之后
    pub fn insert_at_cursor(&mut self, text: &str) -> Result<(), BufferError> {
        self.with_transaction(|te| {
            te.delete_selection()?;
            let index = te.cursor.index();
            te.insert(index, text)?;
            te.cursor.set_index(index + text.len());
            te.on_cursor_changed();
            Ok(())
        })
    }

    pub fn delete_selection(&mut self) -> Result<bool, BufferError> {
        if !self.cursor.selection_on() {
            return Ok(false);
        }
        let (a, b) = self.cursor.selection_indexes();
        self.with_transaction(|te| {
            te.delete(a, b - a)?;
            te.cursor.set_selection_off();
            te.cursor.set_index(a);
            te.on_cursor_changed();
            Ok(true)
        })
    }

    /// 以一个可撤销的 Edit 替换全部内容，只改动首尾不同的部分；内容相同时不做任何事
    pub fn set_text(&mut self, text: &str) -> Result<bool, BufferError> {
        let current = self.buffer.text();
        if current == text {
            return Ok(false);
        }
        let prefix = common_prefix_len(&current, text);
        let suffix = common_suffix_len(&current[prefix..], &text[prefix..]);
        let delete_len = current.len() - prefix - suffix;
        let insert = &text[prefix..text.len() - suffix];

        self.with_transaction(|te| {
            te.delete(prefix, delete_len)?;
            te.insert(prefix, insert)
        })?;
        Ok(true)
    }

    /// 加载场景：替换内容并清空历史，光标回到开头
    pub fn set_text_clear_history(&mut self, text: &str) {
        if self.edit.is_some() {
            panic!("set_text_clear_history: editing");
        }
        self.buffer.set_text(text);
        self.history.borrow_mut().clear();
        self.cursor.restore(CursorState::default());
        self.viewport.set_offset_index(&self.buffer, 0);
        self.on_content_changed();
    }

    // ==================== Undo / Redo ====================

    pub fn undo(&mut self) -> Result<bool, BufferError> {
        self.undo_redo(false)
    }

    pub fn redo(&mut self) -> Result<bool, BufferError> {
        self.undo_redo(true)
    }

    fn undo_redo(&mut self, redo: bool) -> Result<bool, BufferError> {
        if self.edit.is_some() {
            panic!("undo/redo while editing");
        }

        let history = Rc::clone(&self.history);
        let mut history = history.borrow_mut();
        let result = match history.undo_redo(redo) {
            None => return Ok(false),
            Some(edit) => edit.apply_undo_redo(&mut self.buffer, redo),
        };
        let state = match result {
            Ok(state) => state,
            Err(e) => {
                history.undo_redo(!redo);
                return Err(e);
            }
        };
        drop(history);

        self.on_content_changed();
        self.restore_cursor_state(state);
        Ok(true)
    }

    // ==================== 历史 ====================

    pub fn history(&self) -> SharedHistory {
        Rc::clone(&self.history)
    }

    pub fn use_history(&mut self, history: SharedHistory) {
        self.history = history;
    }

    pub fn clear_history(&mut self) {
        self.history.borrow_mut().clear();
    }

    pub fn can_undo(&self) -> bool {
        self.history.borrow().can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.borrow().can_redo()
    }

    /// 把内容复制到重复视图并共享历史；光标保留在重复视图原位置（必要时截断）
    pub fn update_duplicate(&self, dup: &mut TextEdit) {
        dup.mirror(self.buffer.clone(), self.history());
    }

    /// 接收来自同一文件另一视图的内容（Rope 克隆为 O(1)）
    pub fn mirror(&mut self, buffer: TextBuffer, history: SharedHistory) {
        self.buffer = buffer;
        self.history = history;
        self.clamp_cursor();
        self.viewport.clamp(&self.buffer);
        self.on_content_changed();
    }

    // ==================== 视口 ====================

    pub fn offset_index(&self) -> usize {
        self.viewport.offset_index()
    }

    pub fn set_offset_index(&mut self, index: usize) {
        self.viewport.set_offset_index(&self.buffer, index);
        self.cached_decorations = None;
        self.needs_paint = true;
    }

    pub fn set_visible_lines(&mut self, lines: usize) {
        self.viewport.set_visible_lines(lines);
        self.cached_decorations = None;
        self.needs_paint = true;
    }

    pub fn visible_range(&self) -> (usize, usize) {
        self.viewport.visible_range(&self.buffer)
    }

    pub fn is_index_visible(&self, index: usize) -> bool {
        self.viewport.is_index_visible(&self.buffer, index)
    }

    pub fn make_index_visible(&mut self, index: usize) {
        let before = self.viewport.offset_index();
        self.viewport.make_index_visible(&self.buffer, index);
        if before != self.viewport.offset_index() {
            self.cached_decorations = None;
        }
        self.needs_paint = true;
    }

    pub fn make_range_visible(&mut self, index: usize, len: usize) {
        let before = self.viewport.offset_index();
        self.viewport.make_range_visible(&self.buffer, index, len);
        if before != self.viewport.offset_index() {
            self.cached_decorations = None;
        }
        self.needs_paint = true;
    }

    // ==================== 高亮 ====================

    pub fn enable_highlight_cursor_word(&mut self, on: bool) {
        self.deco_opts.highlight_word = on;
        self.cached_decorations = None;
    }

    pub fn enable_parenthesis_match(&mut self, on: bool) {
        self.deco_opts.parenthesis_match = on;
        self.cached_decorations = None;
    }

    pub fn decorations(&mut self) -> &Decorations {
        let (buffer, cursor, viewport, opts) =
            (&self.buffer, &self.cursor, &self.viewport, self.deco_opts);
        self.cached_decorations.get_or_insert_with(|| {
            decorations::compute(buffer, cursor, viewport.visible_range(buffer), opts)
        })
    }

    pub fn has_cached_decorations(&self) -> bool {
        self.cached_decorations.is_some()
    }

    // ==================== 闪烁 ====================

    pub fn flash(&self) -> &Flash {
        &self.flash
    }

    pub fn flash_line(&mut self, index: usize) {
        self.flash_index_len(index, 0);
    }

    /// len 为 0 时闪烁整行（不含换行符）
    pub fn flash_index_len(&mut self, index: usize, len: usize) {
        let index = self.buffer.floor_char_boundary(index);
        let (segment, line) = if len == 0 {
            let start = self.buffer.line_start_index(index);
            let end = self.buffer.line_content_end(index);
            (Segment::new(start, end), true)
        } else {
            let end = self.buffer.floor_char_boundary(index.saturating_add(len));
            (Segment::new(index, end), false)
        };
        self.flash.start(segment, line, Instant::now());
        self.needs_paint = true;
    }

    /// 推进闪烁动画；仍在进行时请求重绘
    pub fn iterate_flash(&mut self, now: Instant) -> bool {
        let was_on = self.flash.is_on();
        let on = self.flash.iterate(now);
        if on || was_on {
            self.needs_paint = true;
        }
        on
    }

    // ==================== 变更通知 ====================

    pub fn needs_paint(&self) -> bool {
        self.needs_paint
    }

    pub fn mark_needs_paint(&mut self) {
        self.needs_paint = true;
    }

    pub fn take_needs_paint(&mut self) -> bool {
        std::mem::take(&mut self.needs_paint)
    }

    pub fn is_changed(&self) -> bool {
        self.changed
    }

    /// 读取并清除"内容已变化"标记
    pub fn take_changed(&mut self) -> bool {
        std::mem::take(&mut self.changed)
    }

    fn on_cursor_changed(&mut self) {
        self.cached_line_column = None;
        self.cached_decorations = None;
        self.needs_paint = true;
    }

    fn on_content_changed(&mut self) {
        self.cached_line_column = None;
        self.cached_decorations = None;
        self.needs_paint = true;
        self.changed = true;
    }
}

impl Default for TextEdit {
    fn default() -> Self {
        Self::new()
    }
}

fn common_prefix_len(a: &str, b: &str) -> usize {
    a.char_indices()
        .zip(b.chars())
        .find(|((_, ca), cb)| ca != cb)
        .map(|((i, _), _)| i)
        .unwrap_or(a.len().min(b.len()))
}

fn common_suffix_len(a: &str, b: &str) -> usize {
    a.chars()
        .rev()
        .zip(b.chars().rev())
        .take_while(|(ca, cb)| ca == cb)
        .map(|(c, _)| c.len_utf8())
        .sum()
}

#[cfg(test)]
#[path = "../../tests/unit/models/text_edit.rs"]
mod tests;
