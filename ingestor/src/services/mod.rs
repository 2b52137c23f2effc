pub mod alarm;
pub mod publisher;
pub mod scheduler;
pub mod store;
