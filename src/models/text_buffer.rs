//! 文本缓冲区模型
//!
//! 职责：
//! - 文本存储（Rope）
//! - 以 UTF-8 字节偏移寻址的读 / 插入 / 删除
//! - 行起止位置查询

use ropey::{Rope, RopeSlice};
use std::borrow::Cow;
use std::fmt;
use std::io::{self, Write};

/// 从 RopeSlice 获取字符串，优先零拷贝
pub fn slice_to_cow(slice: RopeSlice<'_>) -> Cow<'_, str> {
    match slice.as_str() {
        Some(s) => Cow::Borrowed(s),
        None => Cow::Owned(slice.to_string()),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BufferError {
    OutOfRange {
        offset: usize,
        len: usize,
        buffer_len: usize,
    },
    NotCharBoundary(usize),
}

impl fmt::Display for BufferError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BufferError::OutOfRange {
                offset,
                len,
                buffer_len,
            } => write!(
                f,
                "out of range: offset={} len={} buffer_len={}",
                offset, len, buffer_len
            ),
            BufferError::NotCharBoundary(index) => {
                write!(f, "index {} is not on a char boundary", index)
            }
        }
    }
}

impl std::error::Error for BufferError {}

#[derive(Clone, Default)]
pub struct TextBuffer {
    rope: Rope,
}

impl TextBuffer {
    pub fn new() -> Self {
        Self { rope: Rope::new() }
    }

    pub fn from_text(text: &str) -> Self {
        Self {
            rope: Rope::from_str(text),
        }
    }

    pub fn rope(&self) -> &Rope {
        &self.rope
    }

    /// 字节长度
    pub fn len(&self) -> usize {
        self.rope.len_bytes()
    }

    pub fn is_empty(&self) -> bool {
        self.rope.len_bytes() == 0
    }

    pub fn len_lines(&self) -> usize {
        self.rope.len_lines()
    }

    /// 流式写入到 Writer，避免大文件整块拷贝
    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        for chunk in self.rope.chunks() {
            writer.write_all(chunk.as_bytes())?;
        }
        Ok(())
    }

    pub fn text(&self) -> String {
        self.rope.to_string()
    }

    pub fn bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.len());
        for chunk in self.rope.chunks() {
            out.extend_from_slice(chunk.as_bytes());
        }
        out
    }

    pub fn chunks(&self) -> impl Iterator<Item = &str> {
        self.rope.chunks()
    }

    pub fn set_text(&mut self, text: &str) {
        self.rope = Rope::from_str(text);
    }

    pub fn is_char_boundary(&self, index: usize) -> bool {
        if index > self.len() {
            return false;
        }
        let c = self.rope.byte_to_char(index);
        self.rope.char_to_byte(c) == index
    }

    /// 不超过 index 的最近字符边界
    pub fn floor_char_boundary(&self, index: usize) -> usize {
        let index = index.min(self.len());
        self.rope.char_to_byte(self.rope.byte_to_char(index))
    }

    fn check_index(&self, index: usize) -> Result<(), BufferError> {
        if index > self.len() {
            return Err(BufferError::OutOfRange {
                offset: index,
                len: 0,
                buffer_len: self.len(),
            });
        }
        if !self.is_char_boundary(index) {
            return Err(BufferError::NotCharBoundary(index));
        }
        Ok(())
    }

    fn check_range(&self, offset: usize, len: usize) -> Result<usize, BufferError> {
        let out_of_range = || BufferError::OutOfRange {
            offset,
            len,
            buffer_len: self.len(),
        };
        let end = offset.checked_add(len).ok_or_else(out_of_range)?;
        if end > self.len() {
            return Err(out_of_range());
        }
        self.check_index(offset)?;
        self.check_index(end)?;
        Ok(end)
    }

    fn byte_slice(&self, start: usize, end: usize) -> RopeSlice<'_> {
        let cs = self.rope.byte_to_char(start);
        let ce = self.rope.byte_to_char(end);
        self.rope.slice(cs..ce)
    }

    pub fn read(&self, offset: usize, len: usize) -> Result<String, BufferError> {
        let end = self.check_range(offset, len)?;
        Ok(self.byte_slice(offset, end).to_string())
    }

    pub fn insert(&mut self, offset: usize, text: &str) -> Result<(), BufferError> {
        self.check_index(offset)?;
        if text.is_empty() {
            return Ok(());
        }
        let c = self.rope.byte_to_char(offset);
        self.rope.insert(c, text);
        Ok(())
    }

    /// 删除区间，返回被删除的文本
    pub fn delete(&mut self, offset: usize, len: usize) -> Result<String, BufferError> {
        let end = self.check_range(offset, len)?;
        let cs = self.rope.byte_to_char(offset);
        let ce = self.rope.byte_to_char(end);
        let removed = self.rope.slice(cs..ce).to_string();
        self.rope.remove(cs..ce);
        Ok(removed)
    }

    pub fn char_at(&self, index: usize) -> Option<char> {
        if index >= self.len() || !self.is_char_boundary(index) {
            return None;
        }
        self.rope.get_char(self.rope.byte_to_char(index))
    }

    pub fn char_before(&self, index: usize) -> Option<char> {
        if index == 0 || !self.is_char_boundary(index) {
            return None;
        }
        let c = self.rope.byte_to_char(index);
        self.rope.get_char(c - 1)
    }

    // ==================== 行查询 ====================

    pub fn line_of(&self, index: usize) -> usize {
        self.rope.byte_to_line(index.min(self.len()))
    }

    pub fn line_start(&self, line: usize) -> usize {
        self.rope.line_to_byte(line.min(self.rope.len_lines()))
    }

    pub fn line_start_index(&self, index: usize) -> usize {
        self.line_start(self.line_of(index))
    }

    /// 返回 (下一行起点, 是否存在换行符)
    pub fn line_end_index(&self, index: usize) -> (usize, bool) {
        let line = self.line_of(index);
        if line + 1 < self.rope.len_lines() {
            (self.line_start(line + 1), true)
        } else {
            (self.len(), false)
        }
    }

    /// 去掉换行符后的行尾
    pub fn line_content_end(&self, index: usize) -> usize {
        let line = self.line_of(index);
        let start = self.line_start(line);
        let slice = self.rope.line(line);
        let text = slice_to_cow(slice);
        let trimmed = text
            .strip_suffix("\r\n")
            .or_else(|| text.strip_suffix(is_line_break))
            .unwrap_or(&text);
        start + trimmed.len()
    }

    /// 行号 + 行内字符列（均从 0 开始）
    pub fn line_column(&self, index: usize) -> (usize, usize) {
        let index = self.floor_char_boundary(index);
        let line = self.line_of(index);
        let line_char = self.rope.line_to_char(line);
        (line, self.rope.byte_to_char(index) - line_char)
    }
}

fn is_line_break(c: char) -> bool {
    matches!(
        c,
        '\n' | '\r' | '\u{0B}' | '\u{0C}' | '\u{85}' | '\u{2028}' | '\u{2029}'
    )
}

impl fmt::Debug for TextBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextBuffer")
            .field("len", &self.len())
            .finish()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/models/text_buffer.rs"]
mod tests;
