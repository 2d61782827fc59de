use crate::map::SpawnPoint;
use log::info;
use shared::{Move, Standing, MAX_BOMB_FUSE};

/// Mutable per-turn state of one player.
#[derive(Debug, Clone)]
pub struct Player {
    pub id: u32,
    pub x: i32,
    pub y: i32,
    pub alive: bool,
    pub last_move: Move,
    pub eliminated_turn: Option<u32>,
}

impl Player {
    pub fn new(id: u32, x: i32, y: i32) -> Self {
        Self {
            id,
            x,
            y,
            alive: true,
            last_move: Move::Pass,
            eliminated_turn: None,
        }
    }
}

/// An armed bomb. Removed from the registry the turn its fuse reaches zero.
#[derive(Debug, Clone)]
pub struct Bomb {
    pub owner: u32,
    pub x: i32,
    pub y: i32,
    pub fuse: u8,
}

/// Authoritative collections of players and bombs.
///
/// Players are indexed by id (spawn order); bombs keep placement order so
/// simultaneous detonations resolve deterministically.
#[derive(Debug, Clone, Default)]
pub struct GameState {
    pub players: Vec<Player>,
    pub bombs: Vec<Bomb>,
}

impl GameState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consumes the spawn points exactly once at boot. Spawns arrive in id
    /// order from map parsing, so player id doubles as the vector index.
    pub fn spawn_players(&mut self, spawns: &[SpawnPoint]) {
        debug_assert!(self.players.is_empty());
        for spawn in spawns {
            info!(
                "Spawned player {} at ({}, {})",
                spawn.player_id, spawn.x, spawn.y
            );
            self.players
                .push(Player::new(spawn.player_id, spawn.x, spawn.y));
        }
    }

    pub fn player(&self, id: u32) -> Option<&Player> {
        self.players.get(id as usize)
    }

    pub fn alive_count(&self) -> usize {
        self.players.iter().filter(|p| p.alive).count()
    }

    pub fn alive_players(&self) -> impl Iterator<Item = &Player> {
        self.players.iter().filter(|p| p.alive)
    }

    pub fn has_bomb(&self, owner: u32) -> bool {
        self.bombs.iter().any(|b| b.owner == owner)
    }

    /// Places a bomb at the owner's current cell. Rejected (returns false)
    /// while the owner already has one outstanding, or when another bomb
    /// already sits on that cell.
    pub fn place_bomb(&mut self, owner: u32, fuse: u8) -> bool {
        if self.has_bomb(owner) {
            return false;
        }
        let Some(player) = self.player(owner) else {
            return false;
        };
        if self.bombs.iter().any(|b| (b.x, b.y) == (player.x, player.y)) {
            return false;
        }
        self.bombs.push(Bomb {
            owner,
            x: player.x,
            y: player.y,
            fuse: fuse.min(MAX_BOMB_FUSE),
        });
        true
    }

    /// Decrements every fuse by one and removes the bombs that reached zero,
    /// returning them in placement order for detonation processing.
    pub fn tick_bombs(&mut self) -> Vec<Bomb> {
        for bomb in &mut self.bombs {
            bomb.fuse = bomb.fuse.saturating_sub(1);
        }
        let (detonated, armed) = self.bombs.drain(..).partition(|b| b.fuse == 0);
        self.bombs = armed;
        detonated
    }

    /// Marks a player dead and records the turn. Idempotent: a player caught
    /// in two blasts the same turn is eliminated once.
    pub fn eliminate(&mut self, id: u32, turn: u32) {
        if let Some(player) = self.players.get_mut(id as usize) {
            if player.alive {
                info!("Player {} eliminated on turn {}", id, turn);
                player.alive = false;
                player.eliminated_turn = Some(turn);
            }
        }
    }

    /// Final standings: survivors first (by id), then eliminated players by
    /// elimination turn descending (later deaths rank higher).
    pub fn standings(&self) -> Vec<Standing> {
        let mut order: Vec<&Player> = self.players.iter().collect();
        order.sort_by(|a, b| match (a.eliminated_turn, b.eliminated_turn) {
            (None, None) => a.id.cmp(&b.id),
            (None, Some(_)) => std::cmp::Ordering::Less,
            (Some(_), None) => std::cmp::Ordering::Greater,
            (Some(ta), Some(tb)) => tb.cmp(&ta).then(a.id.cmp(&b.id)),
        });

        order
            .into_iter()
            .enumerate()
            .map(|(i, p)| Standing {
                rank: i as u32 + 1,
                player_id: p.id,
                eliminated_turn: p.eliminated_turn,
            })
            .collect()
    }
}
