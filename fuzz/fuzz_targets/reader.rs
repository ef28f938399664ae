#![no_main]

use libfuzzer_sys::fuzz_target;

// Reading arbitrary text must never panic, and whatever reads successfully
// must read back identically from its printed form.
fuzz_target!(|source: &str| {
    if let Ok(tree) = yuso::read(source) {
        let printed = tree.to_string();
        let reread = yuso::read(&printed).expect("printed form reads back");
        assert_eq!(reread, tree, "{} printed as {}", source, printed);
    }
});
