//! 会话：布局快照的保存、列出、恢复与删除
//!
//! 会话文件是 JSON（4 空格缩进），字段名为 PascalCase。文件不存在时视为空列表。

use super::editor::{Editor, EditorError};
use super::toolbar;
use super::view::ViewId;
use crate::services::{FileError, FileProvider};
use serde::{Deserialize, Deserializer, Serialize};
use std::path::Path;

/// ListSessions 写入的特殊行
pub const SESSIONS_ROW: &str = "+Sessions";

#[derive(Debug)]
pub enum SessionError {
    File(FileError),
    Json(serde_json::Error),
    NotFound(String),
    NoSessionsFile,
    MissingRowName(String),
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionError::File(e) => write!(f, "sessions file: {}", e),
            SessionError::Json(e) => write!(f, "sessions file: {}", e),
            SessionError::NotFound(name) => write!(f, "session not found: {}", name),
            SessionError::NoSessionsFile => write!(f, "cannot determine sessions file"),
            SessionError::MissingRowName(tb) => write!(f, "missing toolbar arg 0: {}", tb),
        }
    }
}

impl std::error::Error for SessionError {}

impl From<FileError> for SessionError {
    fn from(e: FileError) -> Self {
        SessionError::File(e)
    }
}

impl From<serde_json::Error> for SessionError {
    fn from(e: serde_json::Error) -> Self {
        SessionError::Json(e)
    }
}

/// 兼容 `null` 形式的空数组
fn nullable_vec<'de, D, T>(d: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<Vec<T>>::deserialize(d).map(Option::unwrap_or_default)
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Sessions {
    #[serde(default, deserialize_with = "nullable_vec")]
    pub sessions: Vec<Session>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Session {
    pub name: String,
    #[serde(default)]
    pub root_tb_str: String,
    #[serde(default, deserialize_with = "nullable_vec")]
    pub columns: Vec<SessionColumn>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SessionColumn {
    #[serde(default)]
    pub start_percent: f64,
    #[serde(default, deserialize_with = "nullable_vec")]
    pub rows: Vec<SessionRow>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SessionRow {
    pub tb_str: String,
    #[serde(default)]
    pub tb_cursor_index: usize,
    #[serde(default)]
    pub ta_cursor_index: usize,
    #[serde(default)]
    pub ta_offset_index: usize,
    #[serde(default)]
    pub start_percent: f64,
}

impl Sessions {
    pub fn load(provider: &dyn FileProvider, path: &Path) -> Result<Self, SessionError> {
        match provider.read_file_bytes(path) {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.is_not_found() => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn save(&self, provider: &dyn FileProvider, path: &Path) -> Result<(), SessionError> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.serialize(&mut ser)?;
        buf.push(b'\n');
        provider.save_file_bytes(path, &buf)?;
        Ok(())
    }

    pub fn find(&self, name: &str) -> Option<&Session> {
        self.sessions.iter().find(|s| s.name == name)
    }

    /// 同名会话原位替换，否则追加
    pub fn replace_or_append(&mut self, session: Session) {
        match self.sessions.iter_mut().find(|s| s.name == session.name) {
            Some(existing) => *existing = session,
            None => self.sessions.push(session),
        }
    }

    pub fn remove(&mut self, name: &str) -> bool {
        let Some(i) = self.sessions.iter().position(|s| s.name == name) else {
            return false;
        };
        self.sessions.remove(i);
        true
    }

    pub fn sorted_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.sessions.iter().map(|s| s.name.as_str()).collect();
        names.sort_unstable();
        names
    }
}

impl Session {
    pub fn from_editor(ed: &Editor, name: &str) -> Self {
        let layout = ed.layout();
        let columns = layout
            .columns()
            .iter()
            .map(|col| SessionColumn {
                start_percent: col.start_percent,
                rows: col
                    .rows()
                    .iter()
                    .filter_map(|slot| {
                        let view = ed.view(slot.view)?;
                        Some(SessionRow {
                            tb_str: view.toolbar.text(),
                            tb_cursor_index: view.toolbar.cursor().index(),
                            ta_cursor_index: view.text_area.cursor().index(),
                            ta_offset_index: view.text_area.offset_index(),
                            start_percent: slot.start_percent,
                        })
                    })
                    .collect(),
            })
            .collect();

        Self {
            name: name.to_string(),
            root_tb_str: layout.root_toolbar.text(),
            columns,
        }
    }

    /// 清空布局后按快照重建；单行打开失败只报告，继续恢复其它行。
    /// 光标与滚动位置在所有行创建完成后再恢复。
    pub fn restore(&self, ed: &mut Editor) {
        ed.layout_mut()
            .root_toolbar
            .set_text_clear_history(&self.root_tb_str);
        ed.clear_layout();

        for col in &self.columns {
            let i = ed.new_column();
            ed.layout_mut().set_column_start_percent(i, col.start_percent);
        }

        let mut opened: Vec<(&SessionRow, ViewId)> = Vec::new();
        for (i, col) in self.columns.iter().enumerate() {
            for row in &col.rows {
                match row.open(ed, i) {
                    Ok(id) => opened.push((row, id)),
                    Err(e) => ed.error(e),
                }
            }
        }

        for (row, id) in opened {
            row.restore_pos(ed, id);
        }
    }
}

impl SessionRow {
    /// 按地址栏名字打开行（出错也创建空行），返回行 id；错误已报告
    fn open(&self, ed: &mut Editor, col: usize) -> Result<ViewId, EditorError> {
        let data = toolbar::parse(&self.tb_str);
        let Some(arg0) = data.part0_arg0() else {
            return Err(SessionError::MissingRowName(self.tb_str.clone()).into());
        };

        let (id, err) = ed.open_row_create_on_err(&arg0.value(), Some(col));
        if let Some(e) = err {
            ed.error(e);
        }

        let rest = data.after_name();
        if let Some(view) = ed.view_mut(id) {
            if !rest.trim().is_empty() {
                view.set_toolbar_after_name(rest);
            }
        }
        ed.layout_mut().set_row_start_percent(id, self.start_percent);
        Ok(id)
    }

    fn restore_pos(&self, ed: &mut Editor, id: ViewId) {
        let Some(view) = ed.view_mut(id) else {
            return;
        };
        view.toolbar.set_cursor_index(self.tb_cursor_index);
        view.text_area.set_cursor_index(self.ta_cursor_index);
        view.text_area.set_offset_index(self.ta_offset_index);
    }
}

impl Editor {
    pub fn save_session(&mut self, name: &str) -> Result<(), EditorError> {
        let path = self.sessions_path()?;
        let session = Session::from_editor(self, name);
        let mut sessions = Sessions::load(self.provider(), &path)?;
        sessions.replace_or_append(session);
        sessions.save(self.provider(), &path)?;
        tracing::info!(session = %name, path = %path.display(), "session saved");
        Ok(())
    }

    /// 在 `+Sessions` 行中列出所有会话，每行一条 `OpenSession <name>`
    pub fn list_sessions(&mut self) -> Result<(), EditorError> {
        let path = self.sessions_path()?;
        let sessions = Sessions::load(self.provider(), &path)?;
        let text: String = sessions
            .sorted_names()
            .iter()
            .map(|name| format!("OpenSession {}\n", name))
            .collect();

        let id = self.existing_or_new_row(SESSIONS_ROW)?;
        if let Some(view) = self.view_mut(id) {
            view.text_area.set_text_clear_history(&text);
            view.flash();
        }
        Ok(())
    }

    pub fn open_session(&mut self, name: &str) -> Result<(), EditorError> {
        let path = self.sessions_path()?;
        let sessions = Sessions::load(self.provider(), &path)?;
        let Some(session) = sessions.find(name) else {
            return Err(SessionError::NotFound(name.to_string()).into());
        };
        session.restore(self);
        tracing::info!(session = %name, "session restored");
        Ok(())
    }

    /// 不存在时返回错误，文件保持不变
    pub fn delete_session(&mut self, name: &str) -> Result<(), EditorError> {
        let path = self.sessions_path()?;
        let mut sessions = Sessions::load(self.provider(), &path)?;
        if !sessions.remove(name) {
            return Err(SessionError::NotFound(name.to_string()).into());
        }
        sessions.save(self.provider(), &path)?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/editor/session.rs"]
mod tests;
