//! Port definitions (hexagonal architecture interfaces)
//!
//! This module defines the port traits that form the boundaries of the
//! hexagonal architecture. Ports are interfaces that the domain core
//! depends on, but whose implementations live in adapter crates.
//!
//! ## Ports Overview
//!
//! - [`ITransportBackend`] - Opens sessions against one configured remote store
//! - [`ITransportSession`] - File operations inside one open session (SFTP, local share, in-memory)

pub mod transport_backend;

pub use transport_backend::{BackendError, ITransportBackend, ITransportSession, RemoteEntry};
