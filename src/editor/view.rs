//! 行视图（ERow）：地址栏 + 内容区 + 行状态

use super::toolbar;
use crate::models::TextEdit;
use crate::services::Settings;
use slotmap::{new_key_type, SlotMap};

new_key_type! {
    pub struct ViewId;
}

pub type Views = SlotMap<ViewId, View>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RowState {
    /// 内容与最近一次保存不同
    Edited,
    /// 磁盘内容与最近一次保存不同
    FsDiffer,
    /// 同一文件有多个视图
    Duplicate,
    NotExist,
    DuplicateHighlight,
}

impl RowState {
    pub const ALL: [RowState; 5] = [
        RowState::Edited,
        RowState::FsDiffer,
        RowState::Duplicate,
        RowState::NotExist,
        RowState::DuplicateHighlight,
    ];

    fn bit(self) -> u8 {
        1 << self as u8
    }

    pub fn label(self) -> &'static str {
        match self {
            RowState::Edited => "edited",
            RowState::FsDiffer => "fs-differ",
            RowState::Duplicate => "duplicate",
            RowState::NotExist => "not-exist",
            RowState::DuplicateHighlight => "duplicate-highlight",
        }
    }
}

pub struct View {
    name: String,
    pub toolbar: TextEdit,
    pub text_area: TextEdit,
    states: u8,
    highlight_duplicates: bool,
}

impl View {
    pub fn new(name: &str, toolbar_text: &str, settings: &Settings) -> Self {
        let mut toolbar = TextEdit::with_limits(settings.history_max_entries, 1);
        toolbar.set_text_clear_history(toolbar_text);
        Self {
            name: name.to_string(),
            toolbar,
            text_area: TextEdit::with_limits(settings.history_max_entries, settings.visible_lines),
            states: 0,
            highlight_duplicates: false,
        }
    }

    /// 所属 FileInfo 的名字
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn has_state(&self, state: RowState) -> bool {
        self.states & state.bit() != 0
    }

    pub fn states(&self) -> Vec<RowState> {
        RowState::ALL
            .into_iter()
            .filter(|s| self.has_state(*s))
            .collect()
    }

    /// 状态真正变化时请求重绘
    pub fn set_state(&mut self, state: RowState, on: bool) {
        let before = self.states;
        if on {
            self.states |= state.bit();
        } else {
            self.states &= !state.bit();
        }
        if before != self.states {
            self.toolbar.mark_needs_paint();
        }
    }

    pub fn highlight_duplicates(&self) -> bool {
        self.highlight_duplicates
    }

    pub fn set_highlight_duplicates(&mut self, on: bool) {
        self.highlight_duplicates = on;
    }

    /// 保留地址栏中的名字，其后的文本替换为 rest，清空地址栏历史
    pub fn set_toolbar_after_name(&mut self, rest: &str) {
        let text = self.toolbar.text();
        let data = toolbar::parse(&text);
        let name = data.part0_arg0().map_or("", |arg| &text[..arg.end]);
        self.toolbar
            .set_text_clear_history(&format!("{}{}", name, rest));
    }

    /// 闪烁地址栏，提示该行被打开或刷新
    pub fn flash(&mut self) {
        self.toolbar.flash_line(0);
    }

    pub fn needs_paint(&self) -> bool {
        self.toolbar.needs_paint() || self.text_area.needs_paint()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/editor/view.rs"]
mod tests;
