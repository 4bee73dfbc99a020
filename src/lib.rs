pub mod config;
pub mod error;
pub mod features;
pub mod handlers;
pub mod inference;
pub mod models;
pub mod validation;
