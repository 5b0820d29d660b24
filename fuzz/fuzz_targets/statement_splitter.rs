//! Fuzz target for the SQL statement splitter.
//!
//! Run with:
//! ```bash
//! cargo +nightly fuzz run fuzz_statement_splitter
//! ```

#![no_main]

use libfuzzer_sys::fuzz_target;
use tally_migrate::{checksum, split_statements};

fuzz_target!(|data: &[u8]| {
    let Ok(input) = std::str::from_utf8(data) else {
        return;
    };

    // Errors are fine, panics are not.
    let Ok(statements) = split_statements(input) else {
        return;
    };

    for stmt in &statements {
        assert!(!stmt.is_empty());
        assert!(!stmt.contains(';'));
        assert!(!stmt.contains("  "));
        assert_eq!(stmt.trim(), stmt);
    }

    assert_eq!(checksum(&statements).len(), 64);
});
