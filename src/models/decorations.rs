//! 绘制前按需计算的高亮区段：选区、光标所在单词、括号匹配、闪烁
//!
//! 所有搜索都限制在可见区间内，编辑本身不触发计算。

use super::cursor::Cursor;
use super::text_buffer::TextBuffer;
use unicode_xid::UnicodeXID;

/// 单词最长扫描字节数
const WORD_MAX_LEN: usize = 100;

const PARENTHESES: [(char, char); 3] = [('{', '}'), ('(', ')'), ('[', ']')];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    pub start: usize,
    pub end: usize,
}

impl Segment {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Decorations {
    pub selection: Option<Segment>,
    pub words: Vec<Segment>,
    pub parenthesis: Vec<Segment>,
}

#[derive(Debug, Clone, Copy)]
pub struct DecorationOptions {
    pub highlight_word: bool,
    pub parenthesis_match: bool,
}

impl Default for DecorationOptions {
    fn default() -> Self {
        Self {
            highlight_word: true,
            parenthesis_match: true,
        }
    }
}

pub fn is_word_char(c: char) -> bool {
    c.is_xid_continue() || c == '_'
}

pub fn compute(
    buffer: &TextBuffer,
    cursor: &Cursor,
    visible: (usize, usize),
    opts: DecorationOptions,
) -> Decorations {
    let mut deco = Decorations::default();

    if cursor.selection_on() {
        let (s, e) = cursor.selection_indexes();
        deco.selection = Some(Segment::new(s, e));
    }
    if opts.highlight_word && !cursor.selection_on() {
        deco.words = highlight_word_segments(buffer, cursor.index(), visible);
    }
    if opts.parenthesis_match {
        deco.parenthesis = parenthesis_segments(buffer, cursor.index(), visible);
    }
    deco
}

/// 光标处的单词，返回 (单词, 起点)；光标右侧不是单词字符时视为没有单词
pub fn word_at_index(buffer: &TextBuffer, index: usize) -> Option<(String, usize)> {
    if !buffer.is_char_boundary(index) {
        return None;
    }

    let limit = index.saturating_add(WORD_MAX_LEN).min(buffer.len());
    let mut end = index;
    while end < limit {
        match buffer.char_at(end) {
            Some(c) if is_word_char(c) => end += c.len_utf8(),
            _ => break,
        }
    }
    if end == index {
        return None;
    }

    let limit = index.saturating_sub(WORD_MAX_LEN);
    let mut start = index;
    while start > limit {
        match buffer.char_before(start) {
            Some(c) if is_word_char(c) => start -= c.len_utf8(),
            _ => break,
        }
    }

    let word = buffer.read(start, end - start).ok()?;
    Some((word, start))
}

/// 区间两侧都不是单词字符
pub fn word_isolated(buffer: &TextBuffer, index: usize, len: usize) -> bool {
    if buffer.char_before(index).is_some_and(is_word_char) {
        return false;
    }
    !buffer.char_at(index + len).is_some_and(is_word_char)
}

fn highlight_word_segments(
    buffer: &TextBuffer,
    index: usize,
    (top, bottom): (usize, usize),
) -> Vec<Segment> {
    let Some((word, _)) = word_at_index(buffer, index) else {
        return Vec::new();
    };

    let a = buffer.floor_char_boundary(top.saturating_sub(word.len()));
    let b = buffer.floor_char_boundary(bottom.saturating_add(word.len()));
    let Ok(region) = buffer.read(a, b - a) else {
        return Vec::new();
    };

    region
        .match_indices(word.as_str())
        .map(|(i, _)| a + i)
        .filter(|&i| word_isolated(buffer, i, word.len()))
        .map(|i| Segment::new(i, i + word.len()))
        .collect()
}

fn parenthesis_segments(
    buffer: &TextBuffer,
    index: usize,
    (top, bottom): (usize, usize),
) -> Vec<Segment> {
    let Some(c) = buffer.char_at(index) else {
        return Vec::new();
    };

    for (open, close) in PARENTHESES {
        if c == open {
            let mut segs = vec![Segment::new(index, index + open.len_utf8())];
            if let Some(i) = find_close(buffer, index + open.len_utf8(), open, close, bottom) {
                segs.push(Segment::new(i, i + close.len_utf8()));
            }
            return segs;
        }
        if c == close {
            let mut segs = vec![Segment::new(index, index + close.len_utf8())];
            if let Some(i) = find_open(buffer, index, open, close, top) {
                segs.insert(0, Segment::new(i, i + open.len_utf8()));
            }
            return segs;
        }
    }
    Vec::new()
}

fn find_close(
    buffer: &TextBuffer,
    mut i: usize,
    open: char,
    close: char,
    early_exit: usize,
) -> Option<usize> {
    let mut depth = 0usize;
    while i < early_exit {
        let c = buffer.char_at(i)?;
        if c == open {
            depth += 1;
        } else if c == close {
            if depth == 0 {
                return Some(i);
            }
            depth -= 1;
        }
        i += c.len_utf8();
    }
    None
}

fn find_open(
    buffer: &TextBuffer,
    mut i: usize,
    open: char,
    close: char,
    early_exit: usize,
) -> Option<usize> {
    let mut depth = 0usize;
    while i > early_exit {
        let c = buffer.char_before(i)?;
        i -= c.len_utf8();
        if c == close {
            depth += 1;
        } else if c == open {
            if depth == 0 {
                return Some(i);
            }
            depth -= 1;
        }
    }
    None
}

#[cfg(test)]
#[path = "../../tests/unit/models/decorations.rs"]
mod tests;
