//! Controller layer: UI events, user actions, and command orchestration.

pub mod events;
pub mod orchestration;
