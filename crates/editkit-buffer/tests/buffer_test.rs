use editkit_buffer::{read_into, write_stream, LineBreaks, TextBuffer, PAGE_SIZE};
use std::io::Cursor;

#[test]
fn test_create_empty() {
    let buf = TextBuffer::new();
    assert_eq!(buf.size(), 0);
    assert!(buf.is_empty());
    assert_eq!(buf.lines(), 0);
}

#[test]
fn test_split_invariant_under_edits() {
    let mut buf = TextBuffer::new();
    for &b in b"hello\nworld" {
        buf.insert(b);
    }
    buf.move_cursor(-6);
    buf.insert(b'!');
    buf.insert_ahead(b'?');
    buf.delete();
    buf.backspace();
    assert_eq!(buf.curs1() + buf.curs2(), buf.size());
    assert_eq!(buf.slice(0, buf.size()), b"hello\nworld");
}

#[test]
fn test_line_counters_match_content() {
    let mut buf = TextBuffer::new();
    for &b in b"a\nb\nc" {
        buf.insert(b);
    }
    buf.move_cursor(-3);
    let mut newlines = 0;
    for i in 0..buf.size() {
        if buf.byte_at(i) == b'\n' {
            newlines += 1;
        }
    }
    assert_eq!(buf.lines(), newlines);
    assert_eq!(buf.curs_line(), buf.count_lines(0, buf.curs1()));
}

#[test]
fn test_round_trip_through_streams() {
    let data: Vec<u8> = (0..PAGE_SIZE * 2 + 333)
        .map(|i| if i % 71 == 0 { b'\n' } else { (i % 26) as u8 + b'a' })
        .collect();

    let mut buf = TextBuffer::new();
    let n = read_into(
        &mut buf,
        &mut Cursor::new(&data[..]),
        data.len() as u64,
        &mut |_| true,
    )
    .unwrap();
    assert_eq!(n, data.len() as u64);

    let mut out = Vec::new();
    write_stream(&buf, &mut out, LineBreaks::Asis).unwrap();
    assert_eq!(out, data);
}
