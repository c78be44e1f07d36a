pub mod animation;
pub mod schedule;
pub mod scheduler;
