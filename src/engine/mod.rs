pub mod schedule;
pub mod time;
