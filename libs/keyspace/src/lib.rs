//! # placement-keyspace
//!
//! Typed identifiers and key ranges shared by the placement scheduler crates.
//!
//! ## Design Principles
//!
//! - Store, region and peer IDs are distinct numeric types that cannot be mixed
//! - IDs have a canonical decimal representation with strict parsing
//! - IDs serialize as JSON numbers, and as quoted strings when used as map keys
//! - Key ranges are immutable half-open intervals `[start, end)` over raw keys;
//!   an empty bound is open
//!
//! ## Argument Form
//!
//! Operators hand key ranges to schedulers as URL-escaped argument pairs:
//!
//! ```text
//! <store_id> [start1 end1 [start2 end2 ...]]
//! ```
//!
//! [`KeyRange::from_escaped_pairs`] decodes the pairs; zero pairs yields the
//! whole keyspace.

mod error;
mod macros;
mod range;
mod types;

pub use error::{IdError, KeyError};
pub use range::KeyRange;
pub use types::*;
