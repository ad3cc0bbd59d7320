//! 本地文件系统 Provider
//!
//! 实现 FileProvider trait，操作本地文件系统

use super::provider::{DirEntry, FileError, FileMetadata, FileProvider, Result};
use std::fs;
use std::io::Write;
use std::path::Path;

pub struct LocalFileProvider;

impl LocalFileProvider {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LocalFileProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl FileProvider for LocalFileProvider {
    fn scheme(&self) -> &'static str {
        "file"
    }

    fn read_file_bytes(&self, path: &Path) -> Result<Vec<u8>> {
        let meta = fs::metadata(path).map_err(|e| FileError::from_io(path, e))?;
        if !meta.is_file() {
            return Err(FileError::NotAFile(path.to_path_buf()));
        }
        fs::read(path).map_err(|e| FileError::from_io(path, e))
    }

    fn save_file_bytes(&self, path: &Path, content: &[u8]) -> Result<()> {
        let mut options = fs::OpenOptions::new();
        options.write(true).truncate(true).create(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o644);
        }

        let mut file = options.open(path).map_err(|e| FileError::from_io(path, e))?;
        file.write_all(content)?;
        file.sync_all()?;
        Ok(())
    }

    fn metadata(&self, path: &Path) -> Result<FileMetadata> {
        let meta = fs::metadata(path).map_err(|e| FileError::from_io(path, e))?;
        Ok(FileMetadata::from_std(&meta))
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<DirEntry>> {
        let meta = fs::metadata(path).map_err(|e| FileError::from_io(path, e))?;
        if !meta.is_dir() {
            return Err(FileError::NotADirectory(path.to_path_buf()));
        }

        let mut entries = Vec::new();
        for entry in fs::read_dir(path).map_err(|e| FileError::from_io(path, e))? {
            let entry = entry?;
            // 跟随符号链接判断是否目录；断链按文件处理
            let is_dir = fs::metadata(entry.path())
                .map(|m| m.is_dir())
                .unwrap_or(false);
            entries.push(DirEntry::new(entry.path(), is_dir));
        }

        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }
}
