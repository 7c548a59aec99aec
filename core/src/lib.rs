pub mod api;
pub mod diet;
pub mod models;
pub mod progress;
pub mod service;
pub mod session;
