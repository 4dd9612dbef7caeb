#![no_main]

use libfuzzer_sys::fuzz_target;
use tabfilter_core::CellValue;
use tabfilter_options::OptionsList;

fuzz_target!(|input: (Vec<String>, String, bool, bool)| {
    let (words, hint, ignore_case, exact) = input;
    let mut list = OptionsList::new().with_ignore_case(ignore_case);
    list.add_values(words.into_iter().take(64).map(CellValue::from));

    if let Some(found) = list.closest_match(&hint, exact) {
        assert!(found.index < list.len());
        assert!(found.len <= hint.chars().count());
    } else {
        assert!(list.is_empty() || exact);
    }
});
