//! 光标模型：索引 + 可选的选区锚点
//!
//! 选区开启时锚点与索引的先后顺序任意，取区间时用 `selection_indexes` 归一化。

/// 光标快照，Undo/Redo 时整体保存与恢复
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CursorState {
    pub index: usize,
    pub selection: Option<usize>,
}

#[derive(Debug, Clone, Default)]
pub struct Cursor {
    state: CursorState,
}

impl Cursor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn index(&self) -> usize {
        self.state.index
    }

    pub fn set_index(&mut self, index: usize) {
        self.state.index = index;
    }

    pub fn selection_on(&self) -> bool {
        self.state.selection.is_some()
    }

    pub fn selection_index(&self) -> Option<usize> {
        self.state.selection
    }

    /// 锚点与索引相同视为无选区
    pub fn set_selection(&mut self, anchor: usize, index: usize) {
        self.state.index = index;
        self.state.selection = if anchor == index { None } else { Some(anchor) };
    }

    pub fn set_selection_off(&mut self) {
        self.state.selection = None;
    }

    /// (min, max)；无选区时两者均为 index
    pub fn selection_indexes(&self) -> (usize, usize) {
        let index = self.state.index;
        match self.state.selection {
            Some(anchor) if anchor <= index => (anchor, index),
            Some(anchor) => (index, anchor),
            None => (index, index),
        }
    }

    pub fn state(&self) -> CursorState {
        self.state
    }

    pub fn restore(&mut self, state: CursorState) {
        self.state = state;
    }

    /// 在 offset 处插入 len 字节后平移
    pub fn adjust_insert(&mut self, offset: usize, len: usize) {
        let shift = |i: usize| if i >= offset { i + len } else { i };
        self.state.index = shift(self.state.index);
        self.state.selection = self.state.selection.map(shift);
    }

    /// 删除 [offset, offset+len) 后平移
    pub fn adjust_delete(&mut self, offset: usize, len: usize) {
        let end = offset + len;
        let shift = |i: usize| {
            if i >= end {
                i - len
            } else if i > offset {
                offset
            } else {
                i
            }
        };
        self.state.index = shift(self.state.index);
        self.state.selection = self.state.selection.map(shift);
        if self.state.selection == Some(self.state.index) {
            self.state.selection = None;
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/models/cursor.rs"]
mod tests;
