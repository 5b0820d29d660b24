//! Fuzz target for script file name parsing.
//!
//! Run with:
//! ```bash
//! cargo +nightly fuzz run fuzz_version_extraction
//! ```

#![no_main]

use libfuzzer_sys::fuzz_target;
use tally_migrate::extract_version;

fuzz_target!(|name: &str| {
    if let Some(version) = extract_version(name) {
        assert!(version >= 0);
        assert!(name.chars().any(|c| c.is_ascii_digit()));
    }
});
