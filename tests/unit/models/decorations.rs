use super::*;

fn cursor_at(index: usize) -> Cursor {
    let mut cursor = Cursor::new();
    cursor.set_index(index);
    cursor
}

#[test]
fn test_word_at_index() {
    let buffer = TextBuffer::from_text("let foo_bar = 1;");

    assert_eq!(word_at_index(&buffer, 6), Some(("foo_bar".to_string(), 4)));
    assert_eq!(word_at_index(&buffer, 4), Some(("foo_bar".to_string(), 4)));
    // 光标右侧是空格
    assert_eq!(word_at_index(&buffer, 11), None);
}

#[test]
fn test_word_isolated() {
    let buffer = TextBuffer::from_text("foo foobar foo");

    assert!(word_isolated(&buffer, 0, 3));
    assert!(!word_isolated(&buffer, 4, 3));
    assert!(word_isolated(&buffer, 11, 3));
}

#[test]
fn test_highlight_word_only_isolated() {
    let buffer = TextBuffer::from_text("foo foobar foo\nfoo");
    let deco = compute(
        &buffer,
        &cursor_at(0),
        (0, buffer.len()),
        DecorationOptions::default(),
    );

    assert_eq!(
        deco.words,
        vec![
            Segment::new(0, 3),
            Segment::new(11, 14),
            Segment::new(15, 18)
        ]
    );
}

#[test]
fn test_no_word_highlight_with_selection() {
    let buffer = TextBuffer::from_text("foo foo");
    let mut cursor = cursor_at(0);
    cursor.set_selection(0, 3);

    let deco = compute(&buffer, &cursor, (0, buffer.len()), DecorationOptions::default());
    assert!(deco.words.is_empty());
    assert_eq!(deco.selection, Some(Segment::new(0, 3)));
}

#[test]
fn test_parenthesis_forward_match() {
    let buffer = TextBuffer::from_text("f(a, (b), c)");
    let deco = compute(&buffer, &cursor_at(1), (0, buffer.len()), DecorationOptions::default());

    assert_eq!(deco.parenthesis, vec![Segment::new(1, 2), Segment::new(11, 12)]);
}

#[test]
fn test_parenthesis_backward_match() {
    let buffer = TextBuffer::from_text("{ [x] }");
    let deco = compute(&buffer, &cursor_at(6), (0, buffer.len()), DecorationOptions::default());

    assert_eq!(deco.parenthesis, vec![Segment::new(0, 1), Segment::new(6, 7)]);
}

#[test]
fn test_parenthesis_unmatched_keeps_cursor_segment() {
    let buffer = TextBuffer::from_text("(abc");
    let deco = compute(&buffer, &cursor_at(0), (0, buffer.len()), DecorationOptions::default());

    assert_eq!(deco.parenthesis, vec![Segment::new(0, 1)]);
}

#[test]
fn test_options_disable_everything() {
    let buffer = TextBuffer::from_text("(foo)");
    let opts = DecorationOptions {
        highlight_word: false,
        parenthesis_match: false,
    };
    let deco = compute(&buffer, &cursor_at(0), (0, buffer.len()), opts);
    assert_eq!(deco, Decorations::default());
}
