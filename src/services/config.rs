//! 配置服务：加载 `<cache>/.coledit/setting.json`
//!
//! 所有字段都有默认值，缺失或解析失败时退回默认配置

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

const SETTINGS_DIR: &str = ".coledit";
const SETTINGS_FILE: &str = "setting.json";
const LOG_DIR: &str = "logs";
const SESSIONS_FILE: &str = ".editor_sessions.json";

/// 保存前按扩展名执行的外部格式化命令：stdin 输入，stdout 输出
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformRule {
    pub extension: String,
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
}

impl TransformRule {
    pub fn new(extension: &str, command: &str, args: &[&str]) -> Self {
        Self {
            extension: extension.to_string(),
            command: command.to_string(),
            args: args.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub history_max_entries: usize,
    pub transform_timeout_ms: u64,
    pub visible_lines: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sessions_file: Option<PathBuf>,
    pub transforms: Vec<TransformRule>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            history_max_entries: crate::models::DEFAULT_MAX_ENTRIES,
            transform_timeout_ms: 5000,
            visible_lines: crate::models::DEFAULT_VISIBLE_LINES,
            sessions_file: None,
            transforms: vec![
                TransformRule::new("go", "goimports", &[]),
                TransformRule::new("rs", "rustfmt", &["--emit", "stdout", "--edition", "2021"]),
            ],
        }
    }
}

impl Settings {
    pub fn transform_for(&self, path: &Path) -> Option<&TransformRule> {
        let ext = path.extension()?.to_str()?;
        self.transforms.iter().find(|rule| rule.extension == ext)
    }

    pub fn transform_timeout(&self) -> Duration {
        Duration::from_millis(self.transform_timeout_ms)
    }
}

pub fn parse_settings(data: &str) -> Result<Settings, serde_json::Error> {
    serde_json::from_str(data)
}

pub fn get_settings_path() -> Option<PathBuf> {
    get_cache_dir().map(|dir| dir.join(SETTINGS_DIR).join(SETTINGS_FILE))
}

pub fn get_log_dir() -> Option<PathBuf> {
    get_cache_dir().map(|dir| dir.join(SETTINGS_DIR).join(LOG_DIR))
}

pub fn ensure_log_dir() -> std::io::Result<PathBuf> {
    let dir = get_log_dir().ok_or_else(|| {
        std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "Cannot determine log directory",
        )
    })?;
    if !dir.exists() {
        std::fs::create_dir_all(&dir)?;
    }
    Ok(dir)
}

pub fn ensure_settings_file() -> std::io::Result<PathBuf> {
    let path = get_settings_path().ok_or_else(|| {
        std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "Cannot determine settings directory",
        )
    })?;
    if let Some(parent) = path.parent() {
        if !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    if !path.exists() {
        let content =
            serde_json::to_string_pretty(&Settings::default()).unwrap_or_else(|_| "{}".to_string());
        std::fs::write(&path, content)?;
    }
    Ok(path)
}

pub fn load_settings() -> Option<Settings> {
    let path = get_settings_path()?;
    let data = std::fs::read_to_string(&path).ok()?;
    match parse_settings(&data) {
        Ok(settings) => Some(settings),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "invalid settings file");
            None
        }
    }
}

pub fn home_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        return std::env::var("USERPROFILE").ok().map(PathBuf::from);
    }

    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME").ok().map(PathBuf::from)
    }
}

pub fn default_sessions_path() -> Option<PathBuf> {
    home_dir().map(|home| home.join(SESSIONS_FILE))
}

fn get_cache_dir() -> Option<PathBuf> {
    #[cfg(target_os = "macos")]
    {
        return home_dir().map(|home| home.join("Library/Caches"));
    }

    #[cfg(target_os = "linux")]
    {
        if let Ok(xdg) = std::env::var("XDG_CACHE_HOME") {
            return Some(PathBuf::from(xdg));
        }
        return home_dir().map(|home| home.join(".cache"));
    }

    #[cfg(target_os = "windows")]
    {
        if let Ok(local) = std::env::var("LOCALAPPDATA") {
            return Some(PathBuf::from(local));
        }
        return std::env::var("APPDATA").ok().map(PathBuf::from);
    }

    #[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
    {
        None
    }
}

pub struct ConfigService {
    settings: Settings,
}

impl ConfigService {
    pub fn new() -> Self {
        Self {
            settings: Settings::default(),
        }
    }

    pub fn with_settings(settings: Settings) -> Self {
        Self { settings }
    }

    /// 从磁盘加载，失败时使用默认配置
    pub fn load() -> Self {
        Self::with_settings(load_settings().unwrap_or_default())
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    pub fn sessions_path(&self) -> Option<PathBuf> {
        self.settings
            .sessions_file
            .clone()
            .or_else(default_sessions_path)
    }
}

impl Default for ConfigService {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/services/config.rs"]
mod tests;
