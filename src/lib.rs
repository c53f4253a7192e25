//! Advent Server Library
//!
//! Splits an advent calendar PDF into one document per day, hands out an
//! unguessable download token per day and prints those links as QR codes.
//! The HTTP binary lives in `main.rs`.
//!
//! # Modules
//!
//! - `schedule`: CSV day schedule parsing
//! - `pdf`: splitting, QR sheet and backup documents via `lopdf`
//! - `tokens`: per-model token files and lookup
//! - `models`: model lifecycle on the filesystem
//! - `routes`: axum handlers

pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod pdf;
pub mod routes;
pub mod schedule;
pub mod state;
pub mod tokens;

pub use config::Config;
pub use error::{AppError, Result};
pub use routes::app;
pub use state::AppState;
