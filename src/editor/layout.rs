//! 列/行布局
//!
//! 每列、每行只记录起始百分比（0.0 ~ 1.0），结束位置由下一项的起点决定。

use super::view::ViewId;
use crate::models::TextEdit;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RowSlot {
    pub view: ViewId,
    pub start_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Column {
    pub start_percent: f64,
    rows: Vec<RowSlot>,
}

impl Column {
    pub fn rows(&self) -> &[RowSlot] {
        &self.rows
    }
}

pub struct Layout {
    pub root_toolbar: TextEdit,
    columns: Vec<Column>,
}

impl Layout {
    pub fn new() -> Self {
        Self {
            root_toolbar: TextEdit::with_limits(crate::models::DEFAULT_MAX_ENTRIES, 1),
            columns: Vec::new(),
        }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, i: usize) -> Option<&Column> {
        self.columns.get(i)
    }

    /// 追加一列，占据最后一列右半边
    pub fn new_column(&mut self) -> usize {
        let start = match self.columns.last() {
            Some(last) => midpoint(last.start_percent, 1.0),
            None => 0.0,
        };
        self.columns.push(Column {
            start_percent: start,
            rows: Vec::new(),
        });
        self.columns.len() - 1
    }

    pub fn set_column_start_percent(&mut self, i: usize, percent: f64) {
        if let Some(col) = self.columns.get_mut(i) {
            col.start_percent = percent.clamp(0.0, 1.0);
        }
    }

    /// 关闭整列，返回其中的视图
    pub fn close_column(&mut self, i: usize) -> Vec<ViewId> {
        if i >= self.columns.len() {
            return Vec::new();
        }
        let col = self.columns.remove(i);
        if i == 0 {
            if let Some(first) = self.columns.first_mut() {
                first.start_percent = 0.0;
            }
        }
        col.rows.into_iter().map(|r| r.view).collect()
    }

    /// 清空所有列，返回被移除的视图（按界面顺序）
    pub fn clear(&mut self) -> Vec<ViewId> {
        let views = self.views_in_order();
        self.columns.clear();
        views
    }

    /// 在 col 中插入行；before 为 None 时追加到末尾
    pub fn insert_row(&mut self, col: usize, before: Option<ViewId>, view: ViewId) {
        let Some(column) = self.columns.get_mut(col) else {
            return;
        };
        let at = before
            .and_then(|b| column.rows.iter().position(|r| r.view == b))
            .unwrap_or(column.rows.len());

        let start = if column.rows.is_empty() {
            0.0
        } else if at == column.rows.len() {
            midpoint(column.rows[at - 1].start_percent, 1.0)
        } else if at == 0 {
            column.rows[0].start_percent
        } else {
            midpoint(column.rows[at - 1].start_percent, column.rows[at].start_percent)
        };
        if at == 0 && !column.rows.is_empty() {
            // 新行顶替第一行的位置，原第一行下移到中点
            let next_end = column.rows.get(1).map_or(1.0, |r| r.start_percent);
            column.rows[0].start_percent = midpoint(start, next_end);
        }
        column.rows.insert(
            at,
            RowSlot {
                view,
                start_percent: start,
            },
        );
    }

    pub fn remove_row(&mut self, view: ViewId) -> bool {
        let Some((c, r)) = self.position_of(view) else {
            return false;
        };
        let rows = &mut self.columns[c].rows;
        rows.remove(r);
        if r == 0 {
            if let Some(first) = rows.first_mut() {
                first.start_percent = 0.0;
            }
        }
        true
    }

    pub fn set_row_start_percent(&mut self, view: ViewId, percent: f64) {
        if let Some((c, r)) = self.position_of(view) {
            self.columns[c].rows[r].start_percent = percent.clamp(0.0, 1.0);
        }
    }

    pub fn row_start_percent(&self, view: ViewId) -> Option<f64> {
        let (c, r) = self.position_of(view)?;
        Some(self.columns[c].rows[r].start_percent)
    }

    /// (列号, 行号)
    pub fn position_of(&self, view: ViewId) -> Option<(usize, usize)> {
        self.columns.iter().enumerate().find_map(|(c, col)| {
            col.rows
                .iter()
                .position(|r| r.view == view)
                .map(|r| (c, r))
        })
    }

    /// 所有视图，按列从左到右、行从上到下
    pub fn views_in_order(&self) -> Vec<ViewId> {
        self.columns
            .iter()
            .flat_map(|c| c.rows.iter().map(|r| r.view))
            .collect()
    }
}

impl Default for Layout {
    fn default() -> Self {
        Self::new()
    }
}

fn midpoint(a: f64, b: f64) -> f64 {
    a + (b - a) / 2.0
}

#[cfg(test)]
#[path = "../../tests/unit/editor/layout.rs"]
mod tests;
