use php_symbols_scanner::{scan_reader, scan_str, ScanOptions, Scanner};
use proptest::prelude::*;

/// Fragments that exercise every lexical state when concatenated.
const FRAGMENTS: &[&str] = &[
    "<?php ",
    "?>",
    "<?= ",
    "<",
    "class ",
    "CLASS ",
    "interface ",
    "trait ",
    "function ",
    "Foo",
    "bar",
    "Größe",
    " extends ",
    " implements ",
    "&",
    "$",
    "::",
    "->",
    "(",
    ")",
    "{",
    "}",
    ";",
    ",",
    "\"",
    "'",
    "//",
    "/*",
    "*/",
    "#",
    "#[",
    "\n",
    "\r\n",
    " ",
    "\t",
    "= ",
    "?",
    "1",
];

fn php_like() -> impl Strategy<Value = String> {
    prop::collection::vec(prop::sample::select(FRAGMENTS), 0..80).prop_map(|parts| parts.concat())
}

fn scan_split(source: &str, cuts: &[usize]) -> Vec<php_symbols_types::SymbolRecord> {
    let chars: Vec<char> = source.chars().collect();
    let mut points: Vec<usize> = cuts.iter().map(|c| c % (chars.len() + 1)).collect();
    points.sort_unstable();
    points.dedup();

    let mut scanner = Scanner::new();
    let mut start = 0;
    for point in points.into_iter().chain(std::iter::once(chars.len())) {
        let chunk: String = chars[start..point].iter().collect();
        scanner.feed(&chunk);
        start = point;
    }
    scanner.finish()
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        .. ProptestConfig::default()
    })]

    #[test]
    fn single_char_chunks_match_whole(source in php_like()) {
        let whole = scan_str(&source);

        let mut scanner = Scanner::new();
        let mut buf = [0u8; 4];
        for ch in source.chars() {
            scanner.feed(ch.encode_utf8(&mut buf));
        }
        prop_assert_eq!(scanner.finish(), whole);
    }

    #[test]
    fn arbitrary_splits_match_whole(source in php_like(), cuts in prop::collection::vec(any::<usize>(), 0..12)) {
        prop_assert_eq!(scan_split(&source, &cuts), scan_str(&source));
    }

    #[test]
    fn byte_reader_matches_string_scan(source in php_like(), chunk_size in 1usize..16) {
        let options = ScanOptions { chunk_size, ..ScanOptions::default() };
        let report = scan_reader(source.as_bytes(), &options).unwrap();
        prop_assert_eq!(report.symbols, scan_str(&source));
    }

    #[test]
    fn never_panics_and_spans_are_sane(source in ".*") {
        let mut scanner = Scanner::new();
        scanner.feed(&source);
        let report = scanner.finish_report();

        let line_count = source.matches('\n').count() as u32 + 1;
        prop_assert_eq!(report.lines, line_count);
        for sym in &report.symbols {
            prop_assert!(sym.line >= 1 && sym.line <= line_count, "line out of range: {:?}", sym);
            prop_assert!(sym.start_column < sym.end_column, "empty span: {:?}", sym);
            prop_assert_eq!(
                (sym.end_column - sym.start_column) as usize,
                sym.name.chars().count()
            );
        }
    }
}

#[test]
fn quoted_declarations_are_ignored() {
    assert!(scan_str("<?php $s = \"function fake() {}\"; ?>").is_empty());
}

#[test]
fn psr_style_file() {
    let source = r#"<?php

declare(strict_types=1);

namespace App\Http\Controllers;

use App\Models\User;
use function array_map;

/**
 * Lists users.
 */
final class UserController extends Controller implements HasMiddleware
{
    public function __construct(
        private readonly UserRepository $users,
    ) {
    }

    public function index(Request $request): array
    {
        return array_map(fn (User $u) => $u->name, $this->users->all());
    }
}

function route_name(string $name = 'users.index'): string
{
    return "{$name}";
}
"#;
    let symbols = scan_str(source);
    let names: Vec<&str> = symbols.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(
        names,
        vec!["UserController", "__construct", "index", "route_name"]
    );
    assert_eq!(symbols[0].line, 13);
    assert_eq!(symbols[0].start_column, 12);
    assert_eq!(symbols[1].brace_depth, 1);
    assert_eq!(symbols[3].brace_depth, 0);
}
