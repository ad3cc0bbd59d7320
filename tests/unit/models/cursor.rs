use super::*;

#[test]
fn test_selection_indexes_normalized() {
    let mut cursor = Cursor::new();

    cursor.set_selection(8, 3);
    assert!(cursor.selection_on());
    assert_eq!(cursor.selection_indexes(), (3, 8));

    cursor.set_selection(3, 8);
    assert_eq!(cursor.selection_indexes(), (3, 8));
    assert_eq!(cursor.index(), 8);
}

#[test]
fn test_selection_off() {
    let mut cursor = Cursor::new();
    cursor.set_selection(1, 4);
    cursor.set_selection_off();

    assert!(!cursor.selection_on());
    assert_eq!(cursor.selection_indexes(), (4, 4));
}

#[test]
fn test_empty_selection_is_off() {
    let mut cursor = Cursor::new();
    cursor.set_selection(5, 5);
    assert!(!cursor.selection_on());
}

#[test]
fn test_adjust_insert_before_cursor() {
    let mut cursor = Cursor::new();
    cursor.set_selection(2, 6);

    cursor.adjust_insert(0, 3);
    assert_eq!(cursor.selection_indexes(), (5, 9));

    cursor.adjust_insert(20, 3);
    assert_eq!(cursor.selection_indexes(), (5, 9));
}

#[test]
fn test_adjust_delete_collapses_inside_range() {
    let mut cursor = Cursor::new();
    cursor.set_index(5);

    cursor.adjust_delete(2, 6);
    assert_eq!(cursor.index(), 2);

    cursor.set_index(10);
    cursor.adjust_delete(2, 3);
    assert_eq!(cursor.index(), 7);
}

#[test]
fn test_state_restore() {
    let mut cursor = Cursor::new();
    cursor.set_selection(4, 1);
    let state = cursor.state();

    cursor.set_selection_off();
    cursor.set_index(0);
    cursor.restore(state);

    assert_eq!(cursor.selection_index(), Some(4));
    assert_eq!(cursor.index(), 1);
}
