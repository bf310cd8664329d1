#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use mandex::pages::PageEntry;
use mandex::query::{edit_distance, suggest};

#[derive(Arbitrary, Debug)]
struct Input {
    query: String,
    names: Vec<String>,
}

fuzz_target!(|input: Input| {
    let catalog: Vec<PageEntry> = input
        .names
        .iter()
        .map(|n| PageEntry::new(n.as_str(), "1"))
        .collect();

    let suggestions = suggest(&input.query, &catalog);
    assert!(suggestions.len() <= 10);
    assert!(suggestions.windows(2).all(|w| w[0].distance <= w[1].distance));

    for name in &input.names {
        assert_eq!(edit_distance(&input.query, name), edit_distance(name, &input.query));
    }
});
