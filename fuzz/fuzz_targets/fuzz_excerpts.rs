#![no_main]

use libfuzzer_sys::fuzz_target;
use mandex::query::{MatchCursor, extract_excerpts, find_matching_lines};

fuzz_target!(|data: (&str, &str)| {
    let (content, query) = data;

    let excerpts = extract_excerpts(content, query);
    assert!(excerpts.len() <= 3);

    let lines = find_matching_lines(content, query);
    assert!(lines.windows(2).all(|w| w[0] < w[1]));

    let mut cursor = MatchCursor::new(lines);
    for _ in 0..4 {
        let _ = cursor.next();
    }
    let _ = cursor.prev();
});
