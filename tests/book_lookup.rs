use std::fs;
use std::path::PathBuf;

use tabiya::board::cozy::Position;
use tabiya::book::{
    lookup_book_move, BookEntry, BookError, BookSource, DeclaredOrder, OpenBook, OpeningBook, PolyglotBook,
    PolyglotPosition, ShuffledOrder, SourceOrder,
};
use tabiya::rules::GamePosition;

fn book_dir(test: &str) -> PathBuf {
    let dir = PathBuf::from(env!("CARGO_TARGET_TMPDIR")).join("book_lookup").join(test);
    fs::create_dir_all(&dir).unwrap();
    dir
}

// Polyglot move code for a plain UCI move like "e2e4".
fn encode(uci: &str) -> u16 {
    let b = uci.as_bytes();
    let file = |c: u8| (c - b'a') as u16;
    let rank = |c: u8| (c - b'1') as u16;
    (rank(b[1]) << 9) | (file(b[0]) << 6) | (rank(b[3]) << 3) | file(b[2])
}

fn write_book(dir: &PathBuf, name: &str, mut entries: Vec<(u64, &str, u16)>) -> PathBuf {
    entries.sort_by_key(|e| e.0);
    let mut bytes = Vec::new();
    for (key, mv, weight) in entries {
        bytes.extend_from_slice(&key.to_be_bytes());
        bytes.extend_from_slice(&encode(mv).to_be_bytes());
        bytes.extend_from_slice(&weight.to_be_bytes());
        bytes.extend_from_slice(&0u32.to_be_bytes());
    }
    let path = dir.join(name);
    fs::write(&path, bytes).unwrap();
    path
}

fn key(pos: &Position) -> u64 { pos.polyglot_key().unwrap() }

#[test]
fn polyglot_keys_match_reference_values() {
    let mut pos = Position::startpos();
    assert_eq!(key(&pos), 0x463b_9618_1691_fc9c);
    pos.make_move_uci("e2e4").unwrap();
    assert_eq!(key(&pos), 0x823c_9b50_fd11_4196);
}

#[test]
fn single_hit_is_found_under_any_order() {
    let dir = book_dir("single_hit");
    let start = Position::startpos();
    let missing = dir.join("missing.bin");
    let corrupt = dir.join("corrupt.bin");
    fs::write(&corrupt, [0u8; 15]).unwrap();
    let other = write_book(&dir, "other.bin", vec![(0x1234, "a2a3", 1)]);
    let hit = write_book(&dir, "hit.bin", vec![(key(&start), "e2e4", 10)]);
    let paths = vec![missing, corrupt, other, hit.clone()];

    let mut declared = OpeningBook::<Position>::polyglot(paths.clone()).with_order(DeclaredOrder);
    let mut shuffled = OpeningBook::<Position>::polyglot(paths.clone());
    let mut seeded = OpeningBook::<Position>::polyglot(paths).with_order(ShuffledOrder::seeded(99));
    for book in [&mut declared, &mut shuffled, &mut seeded] {
        for _ in 0..25 {
            let entry = book.lookup(&start).expect("hit book must answer");
            assert_eq!(start.to_uci(entry.mv), "e2e4");
            assert_eq!(entry.weight, 10);
            assert_eq!(entry.source, hit.display().to_string());
        }
    }
}

#[test]
fn total_miss_and_unreadable_books_yield_none() {
    let dir = book_dir("miss");
    let start = Position::startpos();
    let other = write_book(&dir, "other.bin", vec![(key(&start) ^ 1, "e2e4", 3)]);
    let unsorted = dir.join("unsorted.bin");
    let mut bytes = Vec::new();
    for k in [5u64, 4] {
        bytes.extend_from_slice(&k.to_be_bytes());
        bytes.extend_from_slice(&[0u8; 8]);
    }
    fs::write(&unsorted, bytes).unwrap();

    let mut book = OpeningBook::<Position>::polyglot(vec![dir.join("nope.bin"), unsorted, other]);
    assert_eq!(book.lookup(&start), None);
    assert_eq!(OpeningBook::<Position>::empty().lookup(&start), None);
}

struct Reversed;

impl SourceOrder for Reversed {
    fn order(&mut self, len: usize) -> Vec<usize> { (0..len).rev().collect() }
}

#[test]
fn first_source_in_order_wins() {
    let dir = book_dir("first_wins");
    let start = Position::startpos();
    let a = write_book(&dir, "a.bin", vec![(key(&start), "d2d4", 1)]);
    let b = write_book(&dir, "b.bin", vec![(key(&start), "e2e4", 50)]);

    let mut forward = OpeningBook::<Position>::polyglot(vec![a.clone(), b.clone()]).with_order(DeclaredOrder);
    let mut backward = OpeningBook::<Position>::polyglot(vec![a, b]).with_order(Reversed);
    assert_eq!(start.to_uci(forward.lookup(&start).unwrap().mv), "d2d4");
    assert_eq!(start.to_uci(backward.lookup(&start).unwrap().mv), "e2e4");
}

#[test]
fn heaviest_entry_wins_within_a_file() {
    let dir = book_dir("heaviest");
    let start = Position::startpos();
    let k = key(&start);
    let path = write_book(&dir, "w.bin", vec![(k, "e2e4", 5), (k, "d2d4", 9), (k, "g1f3", 9), (k, "c2c4", 0)]);
    let mut book = OpeningBook::<Position>::polyglot(vec![path]).with_order(DeclaredOrder);
    let entry = book.lookup(&start).unwrap();
    assert_eq!(start.to_uci(entry.mv), "d2d4");
    assert_eq!(entry.weight, 9);
}

#[test]
fn castling_entry_maps_to_the_legal_castle() {
    let dir = book_dir("castle");
    let pos = Position::from_fen("r3k2r/pppppppp/8/8/8/8/PPPPPPPP/R3K2R w KQkq - 0 1").unwrap();
    let path = write_book(&dir, "c.bin", vec![(key(&pos), "e1h1", 1)]);
    let mut book = OpeningBook::<Position>::polyglot(vec![path]).with_order(DeclaredOrder);
    let entry = book.lookup(&pos).unwrap();
    assert!(pos.is_legal(entry.mv));
    assert_eq!(pos.to_uci(entry.mv), "e1g1");
}

#[test]
fn polyglot_reader_reports_malformed_files() {
    let dir = book_dir("malformed");
    let path = dir.join("short.bin");
    fs::write(&path, [1u8; 17]).unwrap();
    let err = PolyglotBook::new(&path).read().unwrap_err();
    assert!(matches!(err, BookError::Malformed { .. }), "{err}");
    let err = PolyglotBook::new(dir.join("absent.bin")).read().unwrap_err();
    assert!(matches!(err, BookError::Io { .. }), "{err}");
}

// Sources need not be files.
struct Broken;

impl BookSource<Position> for Broken {
    fn name(&self) -> &str { "broken" }

    fn open(&self) -> Result<Box<dyn OpenBook<Position> + '_>, BookError> {
        Err(BookError::Malformed { path: PathBuf::from("broken"), reason: "always fails".into() })
    }
}

struct Fixed(&'static str);

impl OpenBook<Position> for Fixed {
    fn find_best_entry(&self, pos: &Position) -> Result<Option<BookEntry<<Position as GamePosition>::Move>>, BookError> {
        Ok(Some(BookEntry { source: "fixed".into(), mv: pos.parse_uci(self.0).unwrap(), weight: 1 }))
    }
}

impl BookSource<Position> for Fixed {
    fn name(&self) -> &str { "fixed" }

    fn open(&self) -> Result<Box<dyn OpenBook<Position> + '_>, BookError> { Ok(Box::new(Fixed(self.0))) }
}

#[test]
fn failing_sources_are_skipped() {
    let start = Position::startpos();
    let sources: Vec<Box<dyn BookSource<Position>>> = vec![Box::new(Broken), Box::new(Fixed("b1c3")), Box::new(Broken)];
    for seed in 0..10 {
        let entry = lookup_book_move(&start, &sources, &mut ShuffledOrder::seeded(seed)).unwrap();
        assert_eq!(entry.source, "fixed");
        assert_eq!(start.to_uci(entry.mv), "b1c3");
    }
    let broken_only: Vec<Box<dyn BookSource<Position>>> = vec![Box::new(Broken)];
    assert_eq!(lookup_book_move(&start, &broken_only, &mut DeclaredOrder), None);
}

#[test]
fn opened_books_are_kept_in_memory() {
    let dir = book_dir("cached");
    let start = Position::startpos();
    let path = write_book(&dir, "kept.bin", vec![(key(&start), "c2c4", 4)]);
    let mut book = OpeningBook::<Position>::polyglot(vec![path.clone()]).with_order(DeclaredOrder);
    assert_eq!(start.to_uci(book.lookup(&start).unwrap().mv), "c2c4");
    fs::remove_file(&path).unwrap();
    // Served from the loaded copy even though the file is gone.
    assert_eq!(start.to_uci(book.lookup(&start).unwrap().mv), "c2c4");
}

#[test]
fn failed_reads_are_retried() {
    let dir = book_dir("retry");
    let start = Position::startpos();
    let path = dir.join("late.bin");
    let _ = fs::remove_file(&path);
    let source = PolyglotBook::new(&path);
    assert!(source.reader().is_err());
    assert!(!source.is_loaded());
    write_book(&dir, "late.bin", vec![(key(&start), "g1f3", 2)]);
    assert_eq!(source.reader().unwrap().len(), 1);
    assert!(source.is_loaded());

    let mut book = OpeningBook::<Position>::polyglot(vec![dir.join("later.bin")]).with_order(DeclaredOrder);
    let _ = fs::remove_file(dir.join("later.bin"));
    assert_eq!(book.lookup(&start), None);
    write_book(&dir, "later.bin", vec![(key(&start), "g1f3", 2)]);
    assert_eq!(start.to_uci(book.lookup(&start).unwrap().mv), "g1f3");
}
