pub mod api;
pub mod config;
pub mod corpus;
pub mod error;
pub mod middleware;
pub mod models;
pub mod services;
