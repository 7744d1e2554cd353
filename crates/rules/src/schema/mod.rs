//! Rule schema types with serde deserialization.
//!
//! Defines the type hierarchy for compliance notification rules:
//! - `NotificationRule`: one declarative compliance policy
//! - `TimeWindow`: a wall-clock start/end pair during which an event is expected
//! - `RecurrenceDescriptor`: the resolver's output — a cyclical or one-off
//!   firing specification, carrying its timezone explicitly

mod recurrence;
mod rule;
mod window;

pub use recurrence::*;
pub use rule::*;
pub use window::*;
