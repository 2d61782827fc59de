//! Integration tests for the lockstep game server over real TCP.
//!
//! Each test boots a `Server` on an ephemeral port, drives it with real
//! `Connection` clients and checks the protocol traffic plus the final
//! standings returned by `run`.

use client::network::Connection;
use server::config::Scenario;
use server::network::Server;
use shared::{Move, Standing, StatusUpdate};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_test::assert_ok;

/// HANDSHAKE TESTS
mod handshake_tests {
    use super::*;

    /// Player ids are assigned in connection order and the initial info
    /// carries the scenario settings verbatim.
    #[tokio::test]
    async fn connection_order_assigns_player_ids() {
        let (addr, handle) = start_server("2\n3\n5\n3\nA....\n.....\n....B\n", 100).await;

        let first = Connection::connect(&addr.to_string()).await.unwrap();
        let second = Connection::connect(&addr.to_string()).await.unwrap();

        assert_eq!(first.info.player_id, 0);
        assert_eq!(second.info.player_id, 1);
        assert_eq!(first.info.settings.number_of_players, 2);
        assert_eq!(first.info.settings.max_number_of_turns, 3);
        assert_eq!(first.info.settings.width, 5);
        assert_eq!(first.info.settings.height, 3);
        assert_eq!(second.info.settings, first.info.settings);

        // Hanging up makes every later read an instant pass, so the game
        // still runs to its turn limit.
        drop(first);
        drop(second);
        let standings = handle.await.unwrap().unwrap();
        assert_eq!(standings.len(), 2);
    }
}

/// TURN LOOP TESTS
mod turn_tests {
    use super::*;

    /// First status shows the spawn positions; after one turn of
    /// `right`/`pass` the update reflects the moved player and both
    /// submitted moves.
    #[tokio::test]
    async fn status_reflects_moves_after_one_turn() {
        let scenario = "2\n10\n5\n5\nA....\n.....\n.....\n.....\n....B\n";
        let (addr, handle) = start_server(scenario, 2000).await;

        let mut first = Connection::connect(&addr.to_string()).await.unwrap();
        let mut second = Connection::connect(&addr.to_string()).await.unwrap();

        let status = play_turn(&mut first, Move::Right).await;
        play_turn(&mut second, Move::Pass).await;

        assert_eq!(status.terrain.len(), 5);
        assert_eq!(position_of(&status, 0), (0, 0));
        assert_eq!(position_of(&status, 1), (4, 4));
        assert!(status.bombs.is_empty());

        let status = play_turn(&mut first, Move::Pass).await;
        play_turn(&mut second, Move::Pass).await;

        assert_eq!(position_of(&status, 0), (1, 0));
        assert_eq!(position_of(&status, 1), (4, 4));
        assert_eq!(status.last_moves[0].action, Some(Move::Right));
        assert_eq!(status.last_moves[1].action, Some(Move::Pass));

        drop(first);
        drop(second);
        handle.await.unwrap().unwrap();
    }

    /// A player that never submits a move is treated as passing once the
    /// deadline expires; the game is not held up and nobody is kicked.
    #[tokio::test]
    async fn silence_defaults_to_pass() {
        let (addr, handle) = start_server("2\n3\n5\n1\nA...B\n", 500).await;

        let mut mover = Connection::connect(&addr.to_string()).await.unwrap();
        let mut silent = Connection::connect(&addr.to_string()).await.unwrap();

        play_turn(&mut mover, Move::Right).await;
        silent.read_status().await.unwrap(); // reads but never answers

        let status = play_turn(&mut mover, Move::Pass).await;
        assert_eq!(position_of(&status, 0), (1, 0));
        assert_eq!(position_of(&status, 1), (4, 0));
        assert_eq!(status.last_moves[1].action, Some(Move::Pass));

        drop(mover);
        drop(silent);
        handle.await.unwrap().unwrap();
    }
}

/// TERMINATION TESTS
mod termination_tests {
    use super::*;

    /// The game stops at the turn limit with every survivor ranked by id,
    /// and the server closes all channels afterwards.
    #[tokio::test]
    async fn game_ends_at_max_turns() {
        let (addr, handle) = start_server("2\n2\n3\n1\nA.B\n", 2000).await;

        let mut first = Connection::connect(&addr.to_string()).await.unwrap();
        let mut second = Connection::connect(&addr.to_string()).await.unwrap();

        for _ in 0..2 {
            play_turn(&mut first, Move::Pass).await;
            play_turn(&mut second, Move::Pass).await;
        }

        let standings = tokio_test::assert_ok!(handle.await.unwrap());
        assert_eq!(standings.len(), 2);
        assert_eq!((standings[0].rank, standings[0].player_id), (1, 0));
        assert_eq!((standings[1].rank, standings[1].player_id), (2, 1));
        assert!(standings.iter().all(|s| s.eliminated_turn.is_none()));

        // Game over: the server hangs up on everyone.
        assert!(first.read_status().await.is_err());
        assert!(second.read_status().await.is_err());
    }

    /// Full bomb cycle over the wire: place, retreat, detonate. The
    /// neighbour is eliminated, the game ends early and the standings
    /// record the elimination turn.
    #[tokio::test]
    async fn bomb_elimination_ends_game_early() {
        let (addr, handle) = start_server("2\n20\n5\n2\nAB...\n.....\n", 2000).await;

        let mut bomber = Connection::connect(&addr.to_string()).await.unwrap();
        let mut victim = Connection::connect(&addr.to_string()).await.unwrap();

        play_turn(&mut bomber, Move::Bomb).await;
        play_turn(&mut victim, Move::Pass).await;

        let status = play_turn(&mut bomber, Move::Down).await;
        play_turn(&mut victim, Move::Pass).await;
        assert_eq!(status.bombs.len(), 1);
        assert_eq!(status.bombs[0].owner, 0);
        assert_eq!((status.bombs[0].x, status.bombs[0].y), (0, 0));
        assert_eq!(status.bombs[0].fuse, 2); // ticked once on the placement turn

        // Moving to (1, 1) leaves the blast cross before the fuse runs out.
        play_turn(&mut bomber, Move::Right).await;
        play_turn(&mut victim, Move::Pass).await;

        let standings = handle.await.unwrap().unwrap();
        assert_eq!(standings.len(), 2);
        assert_eq!(standings[0].player_id, 0);
        assert_eq!(standings[0].eliminated_turn, None);
        assert_eq!(standings[1].player_id, 1);
        assert_eq!(standings[1].eliminated_turn, Some(3));
    }
}

type ServerResult = Result<Vec<Standing>, Box<dyn std::error::Error + Send + Sync>>;

/// Boots a server for the scenario on an ephemeral port and runs it to
/// completion in the background.
async fn start_server(scenario: &str, timeout_ms: u64) -> (SocketAddr, JoinHandle<ServerResult>) {
    let scenario = Scenario::from_reader(scenario.as_bytes()).unwrap();
    let mut server = Server::new(
        "127.0.0.1:0",
        scenario,
        Duration::from_millis(timeout_ms),
    )
    .await
    .unwrap();
    let addr = server.local_addr().unwrap();
    let handle = tokio::spawn(async move { server.run().await });
    (addr, handle)
}

/// One client turn: read the status update, then answer with `mv`.
async fn play_turn(connection: &mut Connection, mv: Move) -> StatusUpdate {
    let status = connection.read_status().await.unwrap();
    connection.send_move(mv).await.unwrap();
    status
}

fn position_of(status: &StatusUpdate, player_id: u32) -> (i32, i32) {
    let player = status
        .players
        .iter()
        .find(|p| p.id == player_id)
        .unwrap_or_else(|| panic!("player {} not in status", player_id));
    (player.x, player.y)
}
