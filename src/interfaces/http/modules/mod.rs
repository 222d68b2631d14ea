//! HTTP modules, one per resource

pub mod articles;
pub mod health;
