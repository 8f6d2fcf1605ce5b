//! # lateness
//!
//! Parser for human-readable elapsed-time expressions of the form
//! `"<quantity> <unit> [<quantity> <unit> ...] late"`, as they appear in
//! "last seen" columns of course-management pages (`"2 days 3 hours late"`,
//! `"10 mins late"`).
//!
//! Parsing is a pure function of its input: no system clock access, no
//! shared state. When an expression cannot be parsed unambiguously, an error
//! is returned rather than a guess. The caller provides the "now" anchor if
//! an absolute instant is needed, keeping everything testable.
//!
//! ## Modules
//!
//! - [`unit`] — canonical time units and their fixed seconds-per-unit table
//! - [`relative`] — the expression grammar, tokenizer, and evaluator
//! - [`error`] — error types
//!
//! ## Example
//!
//! ```
//! let parsed = lateness::parse("2 days 3 hours late").unwrap();
//! assert_eq!(parsed.total_seconds, 183_600.0);
//! assert_eq!(parsed.original, "2 days 3 hours late");
//! ```

pub mod error;
pub mod relative;
pub mod unit;

pub use error::ParseError;
pub use relative::{parse, RelativeTime, Term};
pub use unit::TimeUnit;
