use super::*;
use crate::editor::view::View;
use crate::services::{LocalFileProvider, Settings};

fn add_view(info: &mut FileInfo, views: &mut Views) -> ViewId {
    let id = views.insert(View::new(info.name(), info.name(), &Settings::default()));
    info.add_view(id);
    id
}

fn temp_file(content: &str) -> (tempfile::TempDir, String) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("f.txt");
    std::fs::write(&path, content).unwrap();
    let name = path.to_string_lossy().to_string();
    (dir, name)
}

#[test]
fn test_content_hash() {
    assert_eq!(content_hash(b"abc"), content_hash(b"abc"));
    assert_ne!(content_hash(b"abc"), content_hash(b"abd"));
}

#[test]
fn test_mirror_guard_blocks_reentry() {
    let flag = Cell::new(false);
    let guard = MirrorGuard::acquire(&flag);
    assert!(guard.is_some());
    assert!(MirrorGuard::acquire(&flag).is_none());
    drop(guard);
    assert!(!flag.get());
    assert!(MirrorGuard::acquire(&flag).is_some());
}

#[test]
fn test_kinds() {
    let provider = LocalFileProvider::new();
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("a.txt");
    std::fs::write(&file, "x").unwrap();

    let special = FileInfo::new("+Sessions", &provider);
    assert_eq!(special.kind(), Some(InfoKind::Special));
    assert_eq!(special.dir(), None);

    let d = FileInfo::new(&dir.path().to_string_lossy(), &provider);
    assert_eq!(d.kind(), Some(InfoKind::Directory));

    let f = FileInfo::new(&file.to_string_lossy(), &provider);
    assert_eq!(f.kind(), Some(InfoKind::File));
    assert_eq!(f.dir().as_deref(), Some(dir.path()));

    let missing = FileInfo::new(&dir.path().join("nope").to_string_lossy(), &provider);
    assert_eq!(missing.kind(), None);
    assert!(missing.is_not_exist());
    assert!(matches!(missing.stat_error(), Some(FileError::NotFound(_))));
}

#[test]
#[should_panic(expected = "adding same view twice")]
fn test_add_view_twice_panics() {
    let provider = LocalFileProvider::new();
    let mut views = Views::with_key();
    let mut info = FileInfo::new("+x", &provider);
    let id = add_view(&mut info, &mut views);
    info.add_view(id);
}

#[test]
#[should_panic(expected = "view not found")]
fn test_remove_unknown_view_panics() {
    let provider = LocalFileProvider::new();
    let mut views = Views::with_key();
    let mut info = FileInfo::new("+x", &provider);
    let id = views.insert(View::new("+x", "+x", &Settings::default()));
    info.remove_view(id);
}

#[test]
fn test_load_file_view_clean_state() {
    let (_dir, name) = temp_file("hello\n");
    let provider = LocalFileProvider::new();
    let mut views = Views::with_key();
    let mut info = FileInfo::new(&name, &provider);

    let id = add_view(&mut info, &mut views);
    info.load_view(id, &provider, &mut views).unwrap();

    let view = &views[id];
    assert_eq!(view.text_area.text(), "hello\n");
    assert!(!view.has_state(RowState::Edited));
    assert!(!view.has_state(RowState::FsDiffer));
    assert!(!view.text_area.can_undo());
}

#[test]
fn test_edited_tracks_saved_content() {
    let (_dir, name) = temp_file("abc");
    let provider = LocalFileProvider::new();
    let mut views = Views::with_key();
    let mut info = FileInfo::new(&name, &provider);
    let id = add_view(&mut info, &mut views);
    info.load_view(id, &provider, &mut views).unwrap();

    // 同长度不同内容
    views[id].text_area.replace(0, 1, "x").unwrap();
    info.on_view_changed(id, &mut views);
    assert!(views[id].has_state(RowState::Edited));

    views[id].text_area.undo().unwrap();
    info.on_view_changed(id, &mut views);
    assert!(!views[id].has_state(RowState::Edited));
}

#[test]
fn test_second_view_copies_first_and_shares_history() {
    let (_dir, name) = temp_file("one");
    let provider = LocalFileProvider::new();
    let mut views = Views::with_key();
    let mut info = FileInfo::new(&name, &provider);

    let a = add_view(&mut info, &mut views);
    info.load_view(a, &provider, &mut views).unwrap();
    views[a].text_area.insert(3, " two").unwrap();
    info.on_view_changed(a, &mut views);

    // 磁盘内容变化不影响第二个视图：内容来自第一个视图
    std::fs::write(&name, "disk").unwrap();
    let b = add_view(&mut info, &mut views);
    info.load_view(b, &provider, &mut views).unwrap();

    assert_eq!(views[b].text_area.text(), "one two");
    assert!(std::rc::Rc::ptr_eq(
        &views[a].text_area.history(),
        &views[b].text_area.history()
    ));
    assert!(views[b].has_state(RowState::Edited));
}

#[test]
fn test_on_view_changed_ignored_while_mirroring() {
    let (_dir, name) = temp_file("abc");
    let provider = LocalFileProvider::new();
    let mut views = Views::with_key();
    let mut info = FileInfo::new(&name, &provider);
    let a = add_view(&mut info, &mut views);
    info.load_view(a, &provider, &mut views).unwrap();
    let b = add_view(&mut info, &mut views);
    info.load_view(b, &provider, &mut views).unwrap();

    views[a].text_area.insert(0, "X").unwrap();
    let guard = MirrorGuard::acquire(&info.mirroring);
    info.on_view_changed(a, &mut views);
    assert_eq!(views[b].text_area.text(), "abc");
    drop(guard);

    info.on_view_changed(a, &mut views);
    assert_eq!(views[b].text_area.text(), "Xabc");
    assert!(!views[b].text_area.is_changed());
}

#[test]
fn test_reload_dir_lists_entries() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir(dir.path().join("sub")).unwrap();
    std::fs::write(dir.path().join("a.txt"), "").unwrap();

    let provider = LocalFileProvider::new();
    let mut views = Views::with_key();
    let mut info = FileInfo::new(&dir.path().to_string_lossy(), &provider);
    let id = add_view(&mut info, &mut views);
    info.load_view(id, &provider, &mut views).unwrap();

    assert_eq!(views[id].text_area.text(), "a.txt\nsub/\n");
}

#[test]
fn test_save_on_directory_is_not_a_file() {
    let dir = tempfile::tempdir().unwrap();
    let provider = LocalFileProvider::new();
    let mut views = Views::with_key();
    let mut info = FileInfo::new(&dir.path().to_string_lossy(), &provider);
    add_view(&mut info, &mut views);

    let result = info.save_file(&provider, &mut views, |_, _| None);
    assert!(matches!(result, Err(FileError::NotAFile(_))));
}

#[test]
fn test_save_with_zero_views_is_noop() {
    let (_dir, name) = temp_file("keep");
    let provider = LocalFileProvider::new();
    let mut views = Views::with_key();
    let mut info = FileInfo::new(&name, &provider);

    info.save_file(&provider, &mut views, |_, _| Some(b"changed".to_vec()))
        .unwrap();
    assert_eq!(std::fs::read_to_string(&name).unwrap(), "keep");
}

#[test]
fn test_save_applies_transform_to_all_views() {
    let (_dir, name) = temp_file("a");
    let provider = LocalFileProvider::new();
    let mut views = Views::with_key();
    let mut info = FileInfo::new(&name, &provider);
    let a = add_view(&mut info, &mut views);
    info.load_view(a, &provider, &mut views).unwrap();
    let b = add_view(&mut info, &mut views);
    info.load_view(b, &provider, &mut views).unwrap();

    info.save_file(&provider, &mut views, |_, bytes| {
        Some(bytes.to_ascii_uppercase())
    })
    .unwrap();

    assert_eq!(std::fs::read_to_string(&name).unwrap(), "A");
    for id in [a, b] {
        assert_eq!(views[id].text_area.text(), "A");
        assert!(!views[id].has_state(RowState::Edited));
    }
}

#[test]
fn test_disk_event_without_mtime_change_keeps_hash() {
    let (_dir, name) = temp_file("same");
    let provider = LocalFileProvider::new();
    let mut views = Views::with_key();
    let mut info = FileInfo::new(&name, &provider);
    let id = add_view(&mut info, &mut views);
    info.load_view(id, &provider, &mut views).unwrap();

    let mtime = std::fs::metadata(&name).unwrap().modified().unwrap();
    std::fs::write(&name, "diff").unwrap();
    let file = std::fs::File::options().write(true).open(&name).unwrap();
    file.set_modified(mtime).unwrap();
    drop(file);

    // mtime 未变，不重新计算磁盘哈希
    info.update_disk_event(&provider, &mut views);
    assert!(!views[id].has_state(RowState::FsDiffer));
}

fn temp_bytes(content: &[u8]) -> (tempfile::TempDir, String) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bin.txt");
    std::fs::write(&path, content).unwrap();
    let name = path.to_string_lossy().to_string();
    (dir, name)
}

#[test]
fn test_non_utf8_file_is_not_loaded_or_overwritten() {
    let raw = [b'c', b'a', b'f', 0xE9, b'\n'];
    let (_dir, name) = temp_bytes(&raw);
    let provider = LocalFileProvider::new();
    let mut views = Views::with_key();
    let mut info = FileInfo::new(&name, &provider);
    let id = add_view(&mut info, &mut views);

    let result = info.load_view(id, &provider, &mut views);
    assert!(matches!(result, Err(FileError::InvalidUtf8(_))));
    assert!(info.is_undecodable());
    assert_eq!(views[id].text_area.text(), "");

    let result = info.save_file(&provider, &mut views, |_, _| None);
    assert!(matches!(result, Err(FileError::InvalidUtf8(_))));
    assert_eq!(std::fs::read(&name).unwrap(), raw);
}

#[test]
fn test_utf8_content_round_trips_byte_exact() {
    let raw = "café ünïcødé\n".as_bytes();
    let (_dir, name) = temp_bytes(raw);
    let provider = LocalFileProvider::new();
    let mut views = Views::with_key();
    let mut info = FileInfo::new(&name, &provider);
    let id = add_view(&mut info, &mut views);
    info.load_view(id, &provider, &mut views).unwrap();

    assert!(!views[id].has_state(RowState::Edited));
    info.save_file(&provider, &mut views, |_, _| None).unwrap();
    assert_eq!(std::fs::read(&name).unwrap(), raw);
    assert!(!views[id].has_state(RowState::Edited));
}

#[test]
fn test_reload_of_non_utf8_keeps_rows_until_fixed() {
    let (_dir, name) = temp_file("good");
    let provider = LocalFileProvider::new();
    let mut views = Views::with_key();
    let mut info = FileInfo::new(&name, &provider);
    let id = add_view(&mut info, &mut views);
    info.load_view(id, &provider, &mut views).unwrap();

    std::fs::write(&name, [0xFF, 0xFE]).unwrap();
    let result = info.reload_file(&provider, &mut views);
    assert!(matches!(result, Err(FileError::InvalidUtf8(_))));
    assert_eq!(views[id].text_area.text(), "good");
    assert!(views[id].has_state(RowState::FsDiffer));

    std::fs::write(&name, "fixed").unwrap();
    info.reload_file(&provider, &mut views).unwrap();
    assert!(!info.is_undecodable());
    assert_eq!(views[id].text_area.text(), "fixed");
    assert!(!views[id].has_state(RowState::FsDiffer));
}

#[test]
fn test_non_utf8_transform_output_is_ignored() {
    let (_dir, name) = temp_file("text");
    let provider = LocalFileProvider::new();
    let mut views = Views::with_key();
    let mut info = FileInfo::new(&name, &provider);
    let id = add_view(&mut info, &mut views);
    info.load_view(id, &provider, &mut views).unwrap();

    info.save_file(&provider, &mut views, |_, _| Some(vec![0xC0, 0x80]))
        .unwrap();
    assert_eq!(std::fs::read(&name).unwrap(), b"text");
    assert_eq!(views[id].text_area.text(), "text");
}

/// 读盘正常、写盘总是失败的 provider
struct ReadOnlyProvider(LocalFileProvider);

impl FileProvider for ReadOnlyProvider {
    fn scheme(&self) -> &'static str {
        "read-only"
    }

    fn read_file_bytes(&self, path: &Path) -> Result<Vec<u8>, FileError> {
        self.0.read_file_bytes(path)
    }

    fn save_file_bytes(&self, path: &Path, _content: &[u8]) -> Result<(), FileError> {
        Err(FileError::PermissionDenied(path.to_path_buf()))
    }

    fn metadata(&self, path: &Path) -> Result<FileMetadata, FileError> {
        self.0.metadata(path)
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<crate::services::DirEntry>, FileError> {
        self.0.read_dir(path)
    }
}

#[test]
fn test_failed_save_leaves_memory_untouched() {
    let (_dir, name) = temp_file("base");
    let provider = ReadOnlyProvider(LocalFileProvider::new());
    let mut views = Views::with_key();
    let mut info = FileInfo::new(&name, &provider);
    let a = add_view(&mut info, &mut views);
    info.load_view(a, &provider, &mut views).unwrap();
    let b = add_view(&mut info, &mut views);
    info.load_view(b, &provider, &mut views).unwrap();

    views[a].text_area.insert(4, " edit").unwrap();
    info.on_view_changed(a, &mut views);
    let history_len = views[a].text_area.history().borrow().len();

    let result = info.save_file(&provider, &mut views, |_, bytes| {
        Some(bytes.to_ascii_uppercase())
    });
    assert!(matches!(result, Err(FileError::PermissionDenied(_))));

    assert_eq!(std::fs::read_to_string(&name).unwrap(), "base");
    for id in [a, b] {
        assert_eq!(views[id].text_area.text(), "base edit");
        assert!(views[id].has_state(RowState::Edited));
        assert!(!views[id].has_state(RowState::FsDiffer));
    }
    assert_eq!(views[a].text_area.history().borrow().len(), history_len);
    assert!(views[a].text_area.can_undo());
    assert!(!views[a].text_area.can_redo());

    // 已保存哈希仍是原内容：撤销后不再是 Edited
    views[a].text_area.undo().unwrap();
    info.on_view_changed(a, &mut views);
    assert_eq!(views[b].text_area.text(), "base");
    assert!(!views[b].has_state(RowState::Edited));
}
