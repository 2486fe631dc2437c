// Newsdesk - API Core
//
// This crate provides the backend for the chat-driven article pipeline:
// Telegram submissions are enqueued into a Postgres-backed job queue and
// processed by stateless workers (extract -> rewrite -> translate -> images
// -> publish -> notify).

pub mod common;
pub mod config;
pub mod domains;
pub mod kernel;
pub mod server;

pub use config::*;
