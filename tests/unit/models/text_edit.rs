use super::*;

#[test]
fn test_insert_outside_transaction_is_one_edit() {
    let mut te = TextEdit::new();
    te.insert(0, "hello").unwrap();
    te.insert(5, " world").unwrap();

    assert_eq!(te.text(), "hello world");
    assert_eq!(te.history().borrow().len(), 2);

    assert!(te.undo().unwrap());
    assert_eq!(te.text(), "hello");
    assert!(te.undo().unwrap());
    assert_eq!(te.text(), "");
    assert!(!te.undo().unwrap());
}

#[test]
fn test_transaction_undoes_as_a_whole() {
    let mut te = TextEdit::from_text("abc");
    te.begin_edit();
    te.insert(3, "def").unwrap();
    te.delete(0, 1).unwrap();
    te.insert(0, "X").unwrap();
    te.end_edit();

    assert_eq!(te.text(), "Xbcdef");
    assert!(te.undo().unwrap());
    assert_eq!(te.text(), "abc");
    assert!(te.redo().unwrap());
    assert_eq!(te.text(), "Xbcdef");
}

#[test]
fn test_empty_transaction_not_recorded() {
    let mut te = TextEdit::new();
    te.begin_edit();
    te.end_edit();
    assert!(te.history().borrow().is_empty());
}

#[test]
#[should_panic(expected = "already editing")]
fn test_nested_begin_edit_panics() {
    let mut te = TextEdit::new();
    te.begin_edit();
    te.begin_edit();
}

#[test]
#[should_panic(expected = "not editing")]
fn test_end_edit_without_begin_panics() {
    let mut te = TextEdit::new();
    te.end_edit();
}

#[test]
#[should_panic(expected = "while editing")]
fn test_undo_while_editing_panics() {
    let mut te = TextEdit::new();
    te.begin_edit();
    let _ = te.undo();
}

#[test]
fn test_undo_restores_cursor_and_selection() {
    let mut te = TextEdit::from_text("hello world");
    te.set_selection(0, 5);
    te.insert_at_cursor("bye").unwrap();

    assert_eq!(te.text(), "bye world");
    assert_eq!(te.cursor().index(), 3);
    assert!(!te.cursor().selection_on());

    te.undo().unwrap();
    assert_eq!(te.text(), "hello world");
    assert_eq!(te.cursor().selection_indexes(), (0, 5));

    te.redo().unwrap();
    assert_eq!(te.cursor().index(), 3);
    assert!(!te.cursor().selection_on());
}

#[test]
fn test_new_edit_drops_redo_branch() {
    let mut te = TextEdit::new();
    te.insert(0, "a").unwrap();
    te.insert(1, "b").unwrap();
    te.undo().unwrap();
    assert!(te.can_redo());

    te.insert(1, "c").unwrap();
    assert!(!te.can_redo());
    assert!(!te.redo().unwrap());
    assert_eq!(te.text(), "ac");
}

#[test]
fn test_undo_scrolls_cursor_into_view() {
    let text: String = (0..200).map(|i| format!("{}\n", i)).collect();
    let mut te = TextEdit::with_limits(16, 10);
    te.set_text_clear_history(&text);

    let far = te.buffer().line_start(150);
    te.set_cursor_index(far);
    te.insert_at_cursor("x").unwrap();
    te.set_offset_index(0);
    assert!(!te.is_index_visible(far));

    te.undo().unwrap();
    assert_eq!(te.cursor().index(), far);
    assert!(te.is_index_visible(far));
}

#[test]
fn test_set_text_minimal_and_undoable() {
    let mut te = TextEdit::from_text("fn main() {}\n");
    te.set_cursor_index(3);

    assert!(te.set_text("fn main() { x }\n").unwrap());
    assert_eq!(te.text(), "fn main() { x }\n");
    // 光标在改动区域之前，不受影响
    assert_eq!(te.cursor().index(), 3);
    assert_eq!(te.history().borrow().len(), 1);

    assert!(!te.set_text("fn main() { x }\n").unwrap());
    assert_eq!(te.history().borrow().len(), 1);

    te.undo().unwrap();
    assert_eq!(te.text(), "fn main() {}\n");
}

#[test]
fn test_set_text_clear_history() {
    let mut te = TextEdit::new();
    te.insert(0, "abc").unwrap();
    te.set_text_clear_history("xyz");

    assert_eq!(te.text(), "xyz");
    assert_eq!(te.cursor().index(), 0);
    assert!(!te.can_undo());
}

#[test]
fn test_common_prefix_suffix_multibyte() {
    assert_eq!(common_prefix_len("héllo", "hélp"), 4);
    assert_eq!(common_suffix_len("aé", "bé"), 2);
    assert_eq!(common_prefix_len("ab", "abc"), 2);
}

#[test]
fn test_update_duplicate_shares_history() {
    let mut a = TextEdit::new();
    let mut b = TextEdit::new();
    a.insert(0, "shared").unwrap();
    a.update_duplicate(&mut b);

    assert_eq!(b.text(), "shared");
    assert!(Rc::ptr_eq(&a.history(), &b.history()));

    // 在 b 上撤销，等同于撤销 a 的编辑
    b.undo().unwrap();
    assert_eq!(b.text(), "");
    assert!(a.can_redo());
}

#[test]
fn test_update_duplicate_clamps_cursor() {
    let mut a = TextEdit::from_text("ab");
    let mut b = TextEdit::from_text("abcdef");
    b.set_cursor_index(6);

    a.update_duplicate(&mut b);
    assert_eq!(b.cursor().index(), 2);
}

#[test]
fn test_changed_flag() {
    let mut te = TextEdit::new();
    assert!(!te.take_changed());

    te.insert(0, "a").unwrap();
    assert!(te.take_changed());
    assert!(!te.take_changed());

    te.set_cursor_index(0);
    assert!(!te.is_changed());
}

#[test]
fn test_cursor_line_column_cached() {
    let mut te = TextEdit::from_text("ab\ncd");
    te.set_cursor_index(4);
    assert_eq!(te.cursor_line_column(), (1, 1));

    te.insert(0, "\n").unwrap();
    assert_eq!(te.cursor_line_column(), (2, 1));
}

#[test]
fn test_decorations_lazy_and_invalidated() {
    let mut te = TextEdit::from_text("(a)");
    assert!(!te.has_cached_decorations());

    te.set_cursor_index(0);
    assert_eq!(te.decorations().parenthesis.len(), 2);
    assert!(te.has_cached_decorations());

    te.insert(3, " ").unwrap();
    assert!(!te.has_cached_decorations());
}

#[test]
fn test_flash_line_segment() {
    let mut te = TextEdit::from_text("first\nsecond\n");
    te.flash_line(8);

    assert!(te.flash().is_line());
    assert_eq!(te.flash().segment(), Some(Segment::new(6, 12)));

    let later = Instant::now() + FLASH_DURATION_FOR_TEST;
    assert!(!te.iterate_flash(later));
    assert!(!te.flash().is_on());
}

const FLASH_DURATION_FOR_TEST: std::time::Duration = std::time::Duration::from_secs(1);
