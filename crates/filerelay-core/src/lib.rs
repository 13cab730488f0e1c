//! filerelay Core - Domain logic for document transfer against remote file stores
//!
//! This crate contains the hexagonal architecture core with:
//! - **Domain types** - `FileDescriptor`, `PayloadEnvelope`, `NameFilter`, `UploadRequest`, `PollOutcome`
//! - **Use cases** - `UploadFileUseCase`, `PollFolderUseCase`, `TransportOrchestrator`
//! - **Port definitions** - Traits for adapters: `ITransportBackend`, `ITransportSession`
//! - **Local resources** - per-call scratch directories and the per-folder poll gate
//!
//! # Architecture
//!
//! The domain module contains pure logic with no I/O: content encoding,
//! mask compilation and remote path handling. Ports define the transport
//! interface that adapter crates implement (SFTP, local folders, in-memory).
//! Use cases orchestrate uploads and polls through those ports and map
//! backend failures to the [`TransferError`](usecases::TransferError) taxonomy.

pub mod config;
pub mod domain;
pub mod poll_gate;
pub mod ports;
pub mod scratch;
pub mod usecases;
