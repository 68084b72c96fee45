//! Agent Studio: site core for the AI agent marketing site.

pub mod auth;
pub mod backend;
pub mod catalog;
pub mod config;
pub mod error;
pub mod leads;
pub mod server;
pub mod wizard;
