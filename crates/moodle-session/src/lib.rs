//! # moodle-session
//!
//! Drive a Moodle course through the endpoints its own web UI uses, with
//! the cookies of a browser that is already signed in. No credentials are
//! handled anywhere: the session is lifted from Firefox's session-recovery
//! archive and reused as-is.
//!
//! The "last access" column of the participants table is parsed by the
//! [`lateness`] crate; the `"Never"` sentinel for accounts that never
//! signed in maps to [`f64::INFINITY`].
//!
//! ## Modules
//!
//! - [`firefox`] — locate and decode `recovery.jsonlz4`, seed a cookie jar
//! - [`participants`] — parse the participants table HTML fragment
//! - [`course`] — session key, participant fetch, group updates, exports
//! - [`error`] — error types
//!
//! ## Example
//!
//! ```no_run
//! use moodle_session::connect_via_firefox;
//!
//! # fn main() -> Result<(), moodle_session::SessionError> {
//! let mut course = connect_via_firefox("https://moodle.example.edu", 1234)?;
//! course.fetch_participants()?;
//! for p in course.participants() {
//!     println!("{}: last seen {}", p.email, p.last_access);
//! }
//! course.set_participant_groups("alice@example.edu", &["Blue team"])?;
//! # Ok(())
//! # }
//! ```

pub mod course;
pub mod error;
pub mod firefox;
pub mod participants;

pub use course::{
    connect_via_firefox, connect_via_firefox_with_options, CourseOptions, FeedbackPlugin,
    MoodleCourse,
};
pub use error::SessionError;
pub use firefox::{
    client_for_host, cookies_for_host, find_session_file, load_session_cookies, SessionCookie,
};
pub use participants::{
    parse_last_access, parse_participants_table, GroupOption, Participant, NEVER_SENTINEL,
};
