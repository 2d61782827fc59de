//! Server network layer: player binding and lockstep turn loop coordination.

use crate::config::Scenario;
use crate::game::GameState;
use crate::map::Map;
use crate::resolver::{resolve_turn, TurnEvent};
use crate::session::TcpSession;
use futures::future::join_all;
use log::{debug, info, warn};
use shared::{
    GameSettings, InitialInfo, LastMoveStatus, Move, PlayerStatus, Standing, StatusUpdate,
    BombStatus,
};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;

/// Authoritative game server: owns the map, the entity registry, the player
/// sessions and the turn counter. The only component allowed to decide that
/// the game is over.
pub struct Server {
    listener: TcpListener,
    settings: GameSettings,
    map: Map,
    state: GameState,
    sessions: Vec<TcpSession>,
    turn: u32,
    move_deadline: Duration,
}

impl Server {
    /// Parses the scenario's map (boot-fatal on dimension or spawn-marker
    /// problems), spawns the players and binds the listener.
    pub async fn new(
        addr: &str,
        scenario: Scenario,
        move_deadline: Duration,
    ) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let (map, spawns, warnings) = Map::parse(&scenario.map_lines, &scenario.settings)?;
        for warning in &warnings {
            warn!("Map: {}", warning);
        }

        let mut state = GameState::new();
        state.spawn_players(&spawns);

        let listener = TcpListener::bind(addr).await?;
        info!("Server listening on {}", listener.local_addr()?);

        Ok(Server {
            listener,
            settings: scenario.settings,
            map,
            state,
            sessions: Vec::new(),
            turn: 0,
            move_deadline,
        })
    }

    /// Address the listener actually bound; lets callers use port 0.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn turn(&self) -> u32 {
        self.turn
    }

    /// Accepts exactly `number_of_players` connections; player id is the
    /// arrival order. Each player gets its initial info as soon as it is
    /// accepted. Boot phase, so accept errors are fatal.
    async fn accept_players(&mut self) -> std::io::Result<()> {
        while self.sessions.len() < self.settings.number_of_players {
            let (stream, addr) = self.listener.accept().await?;
            let player_id = self.sessions.len() as u32;
            info!("Player {} connected from {}", player_id, addr);

            let mut session = TcpSession::from_stream(player_id, stream);
            let info = InitialInfo {
                player_id,
                settings: self.settings,
            };
            session.send_initial_info(&info).await;
            self.sessions.push(session);
        }
        Ok(())
    }

    /// Snapshot of the current state in protocol form.
    fn status_update(&self) -> StatusUpdate {
        StatusUpdate {
            terrain: self.map.serialize(),
            players: self
                .state
                .alive_players()
                .map(|p| PlayerStatus {
                    id: p.id,
                    x: p.x,
                    y: p.y,
                })
                .collect(),
            last_moves: self
                .state
                .players
                .iter()
                .map(|p| LastMoveStatus {
                    id: p.id,
                    action: if p.alive { Some(p.last_move) } else { None },
                })
                .collect(),
            bombs: self
                .state
                .bombs
                .iter()
                .map(|b| BombStatus {
                    owner: b.owner,
                    x: b.x,
                    y: b.y,
                    fuse: b.fuse,
                })
                .collect(),
        }
    }

    /// Sends the per-turn status to every live player's session.
    async fn broadcast_status(&mut self) {
        let status = self.status_update();
        let alive: Vec<bool> = self.state.players.iter().map(|p| p.alive).collect();
        for (session, alive) in self.sessions.iter_mut().zip(alive) {
            if alive {
                session.send_status(&status).await;
            }
        }
    }

    /// Collects one move per live player, indexed by player id.
    ///
    /// All channel reads run concurrently and are joined before returning:
    /// this is the per-turn synchronization barrier. Eliminated players are
    /// not read and contribute `Pass` placeholders.
    async fn collect_moves(&mut self) -> Vec<Move> {
        let deadline = self.move_deadline;
        let alive: Vec<bool> = self.state.players.iter().map(|p| p.alive).collect();

        let reads = self
            .sessions
            .iter_mut()
            .zip(alive)
            .map(|(session, alive)| async move {
                if alive {
                    session.read_move(deadline).await
                } else {
                    Move::Pass
                }
            });

        join_all(reads).await
    }

    fn log_events(&self, events: &[TurnEvent]) {
        for event in events {
            match event {
                TurnEvent::Eliminated { player_id, turn } => {
                    info!("Turn {}: player {} eliminated", turn, player_id);
                }
                TurnEvent::Detonated { owner, x, y } => {
                    info!(
                        "Turn {}: bomb by player {} detonated at ({}, {})",
                        self.turn, owner, x, y
                    );
                }
                other => debug!("Turn {}: {:?}", self.turn, other),
            }
        }
    }

    fn game_over(&self) -> bool {
        self.turn >= self.settings.max_number_of_turns || self.state.alive_count() <= 1
    }

    /// Runs the game to completion and returns the final standings.
    ///
    /// Each turn: broadcast status, collect moves (barrier), resolve, check
    /// termination. Between turns the loop is at an await point, so the
    /// caller can abort it cleanly; no resolution phase is ever interrupted.
    pub async fn run(
        &mut self,
    ) -> Result<Vec<Standing>, Box<dyn std::error::Error + Send + Sync>> {
        self.accept_players().await?;
        info!(
            "Game started: {} players, {} max turns, {}x{} map",
            self.settings.number_of_players,
            self.settings.max_number_of_turns,
            self.settings.width,
            self.settings.height
        );

        while !self.game_over() {
            self.broadcast_status().await;
            let moves = self.collect_moves().await;

            let events = resolve_turn(&mut self.map, &mut self.state, &moves, self.turn + 1);
            self.turn += 1;
            self.log_events(&events);
        }

        let standings = self.state.standings();
        self.report_standings(&standings);
        Ok(standings)
    }

    fn report_standings(&self, standings: &[Standing]) {
        info!("Game over after {} turns", self.turn);
        for standing in standings {
            match standing.eliminated_turn {
                None => info!("  #{} player {} (survived)", standing.rank, standing.player_id),
                Some(turn) => info!(
                    "  #{} player {} (eliminated turn {})",
                    standing.rank, standing.player_id, turn
                ),
            }
        }
        match serde_json::to_string(standings) {
            Ok(json) => info!("Standings: {}", json),
            Err(e) => warn!("Failed to serialize standings: {}", e),
        }
    }
}
