//! Story clock monotonicity.
//!
//! Models forget to advance in-story time, or move it backwards. After each
//! turn, [`ensure_progressive_world_time`] compares the clock in the state
//! payload against the previous tick and synthesizes the smallest forward
//! step when the model did not provide one.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod guarantor;
mod world_time;

pub use guarantor::{
    TIMESTAMP_KEYS, WORLD_TIME_KEY, check_temporal_violation, ensure_progressive_world_time,
    extract_world_time, is_think_request, minimal_advance,
};
pub use world_time::{WorldTime, month_from_name, parse_timestamp};
