pub mod auth;
pub mod catalog;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod log_sink;
pub mod message_broker;
pub mod offer;
pub mod order;
