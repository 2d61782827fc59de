//! # Game Server Library
//!
//! This library provides the authoritative server implementation for the
//! turn-synchronous grid bomb game. It ingests a textual scenario (settings
//! plus map), binds one line channel per player, and runs the lockstep
//! simulation loop that resolves every turn before broadcasting the new
//! state to all players.
//!
//! ## Core Responsibilities
//!
//! ### Authoritative Simulation
//! The server runs the definitive version of the game rules. All movement
//! legality, bomb fuse and explosion decisions are made here; players only
//! ever see the server's view of the world.
//!
//! ### Lockstep Turn Loop
//! Every turn the server broadcasts a status update to each live player,
//! collects exactly one move per live player (with a bounded wait), resolves
//! the turn in a fixed phase order, and checks the termination conditions.
//! No partial-turn resolution ever happens: move collection is a
//! synchronization barrier.
//!
//! ### Fault Containment
//! Nothing a player does during a running game is fatal. Late, missing or
//! malformed moves degrade to `pass` for that turn only; illegal actions are
//! rejected and recorded as events. Only boot-time configuration problems
//! terminate the process.
//!
//! ## Module Organization
//!
//! ### Config Module (`config`)
//! Boot-time scenario ingestion: the four settings lines and the raw map
//! lines, with the fatal error taxonomy for malformed input.
//!
//! ### Map Module (`map`)
//! Grid geometry and tile classification: parsing with spawn-marker
//! extraction, walkability checks, force-field destruction and the
//! canonical terrain dump used in every status update.
//!
//! ### Game Module (`game`)
//! The entity registry: authoritative player and bomb collections with the
//! spawn, placement, fuse-tick, elimination and standings operations.
//!
//! ### Resolver Module (`resolver`)
//! The per-turn resolution algorithm: movement with deterministic
//! ascending-id tie-breaks, bomb placement, fuse ticking and explosion
//! propagation, reported as an ordered event list.
//!
//! ### Session Module (`session`)
//! The per-player CRLF line channel: initial info, status updates and the
//! bounded-wait move read that degrades to `pass` on every failure mode.
//!
//! ### Network Module (`network`)
//! The orchestrator: accepts player connections, runs the turn loop and
//! reports the final standings.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::config::Scenario;
//! use server::network::Server;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//!     let scenario = Scenario::from_reader("2\n10\n5\n5\nA....\n.....\n.....\n.....\n....B\n".as_bytes())?;
//!
//!     // Bind, wait for both players, then run the game to completion.
//!     let mut server = Server::new(
//!         "127.0.0.1:8080",
//!         scenario,
//!         Duration::from_millis(1000),
//!     ).await?;
//!
//!     let standings = server.run().await?;
//!     println!("winner: player {}", standings[0].player_id);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod game;
pub mod map;
pub mod network;
pub mod resolver;
pub mod session;
