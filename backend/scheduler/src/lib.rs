pub mod update;

pub use update::{is_update_due, UpdateScheduler, UpdateTask};
