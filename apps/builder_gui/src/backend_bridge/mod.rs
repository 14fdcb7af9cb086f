//! Background worker that runs portfolio-service calls off the UI thread.

pub mod commands;
pub mod runtime;
