//! Move selection for the bot: uniformly random among the legal options.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use shared::{Move, StatusUpdate};

/// Picks a random move each turn, restricted to directions whose target
/// cell is currently walkable terrain. `pass` and `bomb` are always
/// candidates; the server enforces the one-outstanding-bomb policy.
pub struct RandomStrategy {
    rng: StdRng,
}

impl RandomStrategy {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { rng }
    }

    pub fn choose(&mut self, status: &StatusUpdate, player_id: u32) -> Move {
        let me = match status.players.iter().find(|p| p.id == player_id) {
            Some(p) => p,
            None => return Move::Pass, // eliminated; nothing sensible left
        };

        let mut candidates = vec![Move::Pass, Move::Bomb];
        for mv in [Move::Left, Move::Right, Move::Up, Move::Down] {
            let (dx, dy) = mv.delta();
            if status.terrain_at(me.x + dx, me.y + dy) == Some('.') {
                candidates.push(mv);
            }
        }

        *candidates.choose(&mut self.rng).unwrap_or(&Move::Pass)
    }
}
