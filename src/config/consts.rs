// src/config/consts.rs

// Net config
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const USER_AGENT: &str = concat!("tabscrape/", env!("CARGO_PKG_VERSION"));

// Local state (GUI log lives here)
pub const STORE_DIR: &str = ".store";
pub const LOG_FILE: &str = "debug.log";

// Extract
pub const MISSING_TEXT: &str = "NA";
pub const UNNAMED_FIELD_PREFIX: &str = "X";

// Export
pub const DEFAULT_OUT_DIR: &str = "out";
pub const DEFAULT_FILE: &str = "table";

// Concurrency (fetch only)
pub const WORKERS: usize = 4;
