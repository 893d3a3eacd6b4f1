/// Application-level constants
pub const APP_NAME: &str = "VNEXSUS";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Revision of the built-in pattern and lexicon tables.
/// Recorded in every case bundle so downstream tooling can tell which
/// tables produced a given extraction.
pub const LEXICON_VERSION: &str = "2025.12-kcd8";

/// Default tracing filter when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    "vnexsus_lib=info"
}
