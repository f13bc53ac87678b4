//! Domain layer types and invariants.

pub mod activities;
pub mod todos;
