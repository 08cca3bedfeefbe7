//! Core of ctxp: turns a loosely tagged STATE PATCH into a change-set and
//! applies that change-set to a thread-state markdown document.
//!
//! Nothing in this crate touches the filesystem, the clipboard or git.

pub mod changeset;
pub mod clock;
pub mod fragment;
pub mod mutate;
pub mod parse;
pub mod region;
pub mod sanitize;

pub use changeset::PatchChangeSet;
pub use clock::{Clock, FixedClock, SystemClock};
pub use mutate::{apply, Mutation, Mutator};
pub use parse::{parse, parse_report, ParseOutcome, ParseReport};
