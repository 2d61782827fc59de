//! # Bot Client Library
//!
//! This library provides a headless test client for the grid bomb game
//! server. It speaks the full line protocol (handshake, per-turn status
//! updates, one move per turn) and plays random legal moves, which makes
//! it useful for exercising a server by hand or generating load in tests.
//!
//! Player strategy is deliberately minimal: the client validates nothing
//! the server is authoritative over, it only avoids submitting directions
//! that are obviously blocked by terrain.
//!
//! ## Module Organization
//!
//! ### Network Module (`network`)
//! Connection management and protocol I/O: the handshake that yields the
//! player id and settings, the sized status-update read, and move writes.
//!
//! ### Strategy Module (`strategy`)
//! Move selection: a seedable random choice among `pass`, `bomb` and the
//! currently walkable directions.

pub mod network;
pub mod strategy;
