use super::*;

fn numbered_lines(n: usize) -> TextBuffer {
    let text: String = (0..n).map(|i| format!("line{}\n", i)).collect();
    TextBuffer::from_text(&text)
}

#[test]
fn test_scrolls_down_to_index() {
    let buffer = numbered_lines(100);
    let mut viewport = Viewport::new(10);

    let target = buffer.line_start(50);
    viewport.make_index_visible(&buffer, target);

    assert!(viewport.is_index_visible(&buffer, target));
    assert_eq!(viewport.offset_index(), buffer.line_start(41));
}

#[test]
fn test_scrolls_up_to_index() {
    let buffer = numbered_lines(100);
    let mut viewport = Viewport::new(10);
    viewport.set_offset_index(&buffer, buffer.line_start(60));

    viewport.make_index_visible(&buffer, buffer.line_start(5) + 2);
    assert_eq!(viewport.offset_index(), buffer.line_start(5));
}

#[test]
fn test_visible_index_does_not_scroll() {
    let buffer = numbered_lines(100);
    let mut viewport = Viewport::new(10);
    viewport.make_index_visible(&buffer, buffer.line_start(3));
    assert_eq!(viewport.offset_index(), 0);
}

#[test]
fn test_range_prefers_start() {
    let buffer = numbered_lines(100);
    let mut viewport = Viewport::new(10);

    let start = buffer.line_start(20);
    let end = buffer.line_start(70);
    viewport.make_range_visible(&buffer, start, end - start);

    assert!(viewport.is_index_visible(&buffer, start));
}

#[test]
fn test_set_offset_aligns_to_line_start() {
    let buffer = numbered_lines(10);
    let mut viewport = Viewport::new(4);
    viewport.set_offset_index(&buffer, buffer.line_start(3) + 2);

    assert_eq!(viewport.offset_index(), buffer.line_start(3));
    let (top, bottom) = viewport.visible_range(&buffer);
    assert_eq!(top, buffer.line_start(3));
    assert_eq!(bottom, buffer.line_start(7));
}
