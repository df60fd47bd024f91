//! Client for the remote Grasshopper evaluation endpoint.

pub mod client;
pub mod config;
pub mod error;
pub mod transport;

pub use client::*;
pub use config::*;
pub use error::*;
pub use transport::*;
