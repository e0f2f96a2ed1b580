//! # Game Client Library
//!
//! Terminal client for networked dots-and-boxes. The client holds no
//! authority: it sends requests, and whenever the server broadcasts a
//! snapshot it throws its local state away and rebuilds it by replaying
//! the snapshot's turn log. Rendering is plain ASCII on stdout, with moves
//! typed as `h x y` / `v x y` on stdin.
//!
//! ## Module Organization
//!
//! - [`replica`]: the rebuilt-from-log mirror of the session and its
//!   board renderer
//! - [`network`]: UDP socket handling, input parsing, and the
//!   select-driven interactive loop

pub mod network;
pub mod replica;
