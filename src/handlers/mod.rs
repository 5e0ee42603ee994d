//! HTTP handlers for the four routing groups.

pub mod api;
pub mod auth;
pub mod prediction;
pub mod site;
