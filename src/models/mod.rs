//! Data models for the CollabHub backend.
//!
//! These models match the frontend TypeScript interfaces exactly for seamless
//! interoperability.

mod application;
mod message;
mod project;
mod rating;

pub use application::*;
pub use message::*;
pub use project::*;
pub use rating::*;
