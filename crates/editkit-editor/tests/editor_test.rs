//! Property tests over random command sequences.
//!
//! A deterministic generator drives the executor through long mixed
//! sequences of inserts, deletions and motion, checking the structural
//! invariants after every command and the undo/redo round trip at the end.

use editkit_editor::{Command, Editor};
use editkit_settings::EditOptions;

/// Small deterministic generator so failures reproduce.
struct Rng(u64);

impl Rng {
    fn next(&mut self) -> u64 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.0 >> 33
    }
}

fn random_command(rng: &mut Rng) -> Command {
    match rng.next() % 12 {
        0 | 1 | 2 | 3 => {
            let c = (b'a' + (rng.next() % 26) as u8) as char;
            Command::InsertChar(c)
        }
        4 => Command::InsertChar(' '),
        5 => Command::Enter,
        6 => Command::BackSpace,
        7 => Command::Delete,
        8 => Command::Left,
        9 => Command::Right,
        10 => Command::Up,
        _ => Command::Down,
    }
}

fn check_invariants(editor: &mut Editor) {
    let buf = editor.buffer();
    let size = buf.size();
    assert_eq!(buf.curs1() + buf.curs2(), size);
    assert!(buf.curs1() >= 0 && buf.curs1() <= size);
    assert_eq!(buf.curs_line(), buf.count_lines(0, buf.curs1()));
    assert_eq!(buf.lines(), buf.count_lines(0, size));

    let (m1, m2) = editor.markers();
    assert!(m1 >= 0 && m1 <= size, "mark1 {m1} out of [0, {size}]");
    assert!(
        m2 == -1 || (m2 >= 0 && m2 <= size),
        "mark2 {m2} out of [0, {size}]"
    );

    // the line cache agrees with a fresh scan
    assert_eq!(editor.find_line(0), 0);
    let lines = editor.buffer().lines();
    let expected = editor.buffer().bol(editor.buffer().size());
    assert_eq!(editor.find_line(lines), expected);
}

#[test]
fn test_random_edits_keep_invariants() {
    let opts = EditOptions::default();
    let mut rng = Rng(0xBAD5EED);
    let mut editor = Editor::from_bytes(b"seed text\nwith a couple\nof lines\n");

    for _ in 0..500 {
        let cmd = random_command(&mut rng);
        editor.execute_key(&opts, cmd);
        check_invariants(&mut editor);
    }
}

#[test]
fn test_undo_everything_restores_original() {
    let opts = EditOptions::default();
    let mut rng = Rng(42);
    let original = b"alpha\nbeta\ngamma\n".to_vec();
    let mut editor = Editor::from_bytes(&original);

    for _ in 0..120 {
        let cmd = random_command(&mut rng);
        editor.execute_key(&opts, cmd);
    }

    let mut guard = 0;
    while editor.can_undo() {
        editor.execute_key(&opts, Command::Undo);
        guard += 1;
        assert!(guard < 1000, "undo did not terminate");
    }
    assert_eq!(editor.text(), original);
}

#[test]
fn test_undo_then_redo_round_trip() {
    let opts = EditOptions::default();
    let mut rng = Rng(7);
    let mut editor = Editor::from_bytes(b"one\ntwo\nthree\n");

    for _ in 0..60 {
        let cmd = random_command(&mut rng);
        editor.execute_key(&opts, cmd);
    }
    let edited = editor.text();

    let mut guard = 0;
    while editor.can_undo() {
        editor.execute_key(&opts, Command::Undo);
        guard += 1;
        assert!(guard < 1000, "undo did not terminate");
    }

    // redo replays one primitive per step; drive it until it stops
    // changing the buffer
    let mut previous = editor.text();
    for _ in 0..10_000 {
        editor.execute_key(&opts, Command::Redo);
        let now = editor.text();
        if now == previous && now == edited {
            break;
        }
        previous = now;
    }
    assert_eq!(editor.text(), edited);
}

#[test]
fn test_marker_stays_beyond_insert_point() {
    let opts = EditOptions::default();
    let mut editor = Editor::from_bytes(b"abcdef");
    editor.set_markers(3, 5, 0, 0);
    // inserts at the cursor (offset 0); both markers strictly greater stay
    // strictly greater
    for _ in 0..10 {
        editor.execute_key(&opts, Command::InsertChar('x'));
    }
    assert_eq!(editor.markers(), (13, 15));
}

#[test]
fn test_bounded_undo_survives_heavy_typing() {
    let opts = EditOptions::default();
    let mut editor = Editor::with_max_undo(512);
    // far more key presses than the bounded ring can hold
    for i in 0..2_000u32 {
        let c = (b'a' + (i % 26) as u8) as char;
        editor.execute_key(&opts, Command::InsertChar(c));
        if i % 40 == 0 {
            editor.execute_key(&opts, Command::Enter);
        }
    }
    // undo drains without corruption and leaves a valid buffer
    let mut guard = 0;
    while editor.can_undo() && guard < 10_000 {
        editor.execute_key(&opts, Command::Undo);
        guard += 1;
    }
    let buf = editor.buffer();
    assert_eq!(buf.curs1() + buf.curs2(), buf.size());
    assert_eq!(buf.lines(), buf.count_lines(0, buf.size()));
}
