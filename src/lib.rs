//! vhostd - static file server with name-based virtual hosting
//!
//! Core library for the HTTP engine and the acceptor.

pub mod config;
pub mod http;
pub mod server;
