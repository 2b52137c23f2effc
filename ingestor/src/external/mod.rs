//! External service integrations

pub mod sms;
pub mod weather;
