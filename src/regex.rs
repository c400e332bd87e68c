//! Regex backend selected by the `regex` and `lite` features.

#[cfg(all(feature = "regex", not(feature = "lite")))]
pub use regex::Regex;

#[cfg(feature = "lite")]
pub use regex_lite::Regex;

#[cfg(not(any(feature = "regex", feature = "lite")))]
compile_error!("either the `regex` or the `lite` feature must be enabled");
