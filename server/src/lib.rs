//! # Session Server Library
//!
//! Authoritative server for networked dots-and-boxes. It hosts any number
//! of independent sessions, each identified by a five character code that
//! players share out of band. All rule decisions happen here: clients
//! submit requests, the server validates them against the session's state
//! machine, and every accepted mutation is followed by a full-state
//! broadcast to the session's participants.
//!
//! ## Architecture
//!
//! The server is a single event loop fed by async tasks:
//! - **Network Receiver**: listens on the UDP socket and decodes packets
//! - **Network Sender**: drains the outgoing queue of replies and
//!   snapshot broadcasts
//! - **Timeout Checker**: detaches addresses that have gone silent
//! - **Main Loop**: owns all session state and processes one request at
//!   a time, so two packets racing for the same session are simply
//!   handled in arrival order
//!
//! ## Module Organization
//!
//! - [`sessions`]: session lifecycle and the mapping from codes to games
//! - [`connections`]: which remote address sits where, plus liveness
//! - [`network`]: UDP plumbing, packet dispatch, and the main loop

pub mod connections;
pub mod network;
pub mod sessions;
