//! Application services layer.

pub mod activities;
pub mod error;
pub mod repos;
pub mod todos;
mod validation;
