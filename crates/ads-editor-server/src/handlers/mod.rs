pub mod auth;
pub mod dataset;
pub mod health;
