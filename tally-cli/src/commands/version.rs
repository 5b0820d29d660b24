//! `tally version` command - Display version information.

use crate::error::CliResult;
use crate::output::{self, kv};

/// Package version
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Binary name
const NAME: &str = "tally";

/// Run the version command
pub async fn run() -> CliResult<()> {
    output::header("Tally");

    kv("Version", VERSION);
    kv("Binary", NAME);

    #[cfg(debug_assertions)]
    let build_mode = "debug";
    #[cfg(not(debug_assertions))]
    let build_mode = "release";

    kv("Build", build_mode);
    kv("Databases", "postgresql, mysql, mariadb");

    output::newline();
    output::section("Components");
    kv("tally-migrate", VERSION);
    kv("tally-postgres", VERSION);
    kv("tally-mysql", VERSION);

    Ok(())
}
