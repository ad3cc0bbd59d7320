//! 视口：记录首个可见行的字节偏移与可见行数
//!
//! 不关心像素，只负责"让某个索引/区间可见"的行级滚动。

use super::text_buffer::TextBuffer;

pub const DEFAULT_VISIBLE_LINES: usize = 40;

#[derive(Debug, Clone)]
pub struct Viewport {
    offset_index: usize,
    visible_lines: usize,
}

impl Viewport {
    pub fn new(visible_lines: usize) -> Self {
        Self {
            offset_index: 0,
            visible_lines: visible_lines.max(1),
        }
    }

    pub fn offset_index(&self) -> usize {
        self.offset_index
    }

    pub fn visible_lines(&self) -> usize {
        self.visible_lines
    }

    pub fn set_visible_lines(&mut self, lines: usize) {
        self.visible_lines = lines.max(1);
    }

    /// 偏移总是对齐到行首
    pub fn set_offset_index(&mut self, buffer: &TextBuffer, index: usize) {
        self.offset_index = buffer.line_start_index(index.min(buffer.len()));
    }

    fn top_line(&self, buffer: &TextBuffer) -> usize {
        buffer.line_of(self.offset_index)
    }

    /// 可见区间 [top, bottom)
    pub fn visible_range(&self, buffer: &TextBuffer) -> (usize, usize) {
        let top_line = self.top_line(buffer);
        let top = buffer.line_start(top_line);
        let bottom = buffer.line_start(top_line + self.visible_lines);
        (top, bottom.max(top))
    }

    pub fn is_index_visible(&self, buffer: &TextBuffer, index: usize) -> bool {
        let line = buffer.line_of(index);
        let top_line = self.top_line(buffer);
        line >= top_line && line < top_line + self.visible_lines
    }

    pub fn make_index_visible(&mut self, buffer: &TextBuffer, index: usize) {
        let index = index.min(buffer.len());
        let line = buffer.line_of(index);
        let top_line = self.top_line(buffer);
        if line < top_line {
            self.offset_index = buffer.line_start(line);
        } else if line >= top_line + self.visible_lines {
            self.offset_index = buffer.line_start(line + 1 - self.visible_lines);
        }
    }

    /// 区间过长放不下时优先保证起点可见
    pub fn make_range_visible(&mut self, buffer: &TextBuffer, index: usize, len: usize) {
        let end = index.saturating_add(len).min(buffer.len());
        self.make_index_visible(buffer, end);
        self.make_index_visible(buffer, index);
    }

    /// 内容变化后把偏移拉回合法位置
    pub fn clamp(&mut self, buffer: &TextBuffer) {
        self.offset_index = buffer.line_start_index(self.offset_index.min(buffer.len()));
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(DEFAULT_VISIBLE_LINES)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/models/viewport.rs"]
mod tests;
