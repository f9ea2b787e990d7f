//! Domain rules for watering schedules and reminders.
//!
//! Everything here is pure: no database access and no I/O. Services feed it
//! rows loaded through the [`Store`](crate::db::Store) and persist the results.

pub mod reminder;
pub mod schedule;

pub use reminder::{ReminderKind, ReminderPayload, group_by_owner};
pub use schedule::{next_watering, next_watering_in, recompute_due};
