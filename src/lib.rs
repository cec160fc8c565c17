pub mod app;
pub mod auth;
pub mod config;
pub mod entities;
pub mod error;
pub mod forms;
pub mod handlers;
pub mod migration;
pub mod pagination;
pub mod queries;
pub mod templates;
