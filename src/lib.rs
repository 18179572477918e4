// ABOUTME: Public library API for nbsync notebook synchronization
// ABOUTME: Re-exports core modules for external use

pub mod api;
pub mod auth;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;
pub mod sync;

pub use error::{Error, Result};
pub use model::{BatchEntry, DriveFile, StoredToken};
