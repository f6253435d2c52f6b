//! Assessment scoring and view-as identity resolution for the Giftwise platform.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
