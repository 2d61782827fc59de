//! Per-turn resolution: movement, bomb placement, fuses and explosions.
//!
//! The phase order and the ascending-id processing inside each phase are the
//! contract: given the same move set, resolution is deterministic and
//! reproducible, which is what makes contested-cell tie-breaks fair and
//! turn outcomes testable.

use crate::game::{Bomb, GameState};
use crate::map::Map;
use shared::{Move, BLAST_RADIUS, BOMB_FUSE};

/// Ordered record of everything that happened during one turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnEvent {
    Moved {
        player_id: u32,
        from: (i32, i32),
        to: (i32, i32),
    },
    Blocked {
        player_id: u32,
        attempted: Move,
    },
    BombPlaced {
        owner: u32,
        x: i32,
        y: i32,
        fuse: u8,
    },
    BombRejected {
        owner: u32,
    },
    Detonated {
        owner: u32,
        x: i32,
        y: i32,
    },
    FieldDestroyed {
        x: i32,
        y: i32,
    },
    Eliminated {
        player_id: u32,
        turn: u32,
    },
}

/// Applies one round of submitted moves. `moves` is indexed by player id;
/// the server substitutes `Pass` for missing or late submissions before
/// calling in, so every player has exactly one entry.
pub fn resolve_turn(
    map: &mut Map,
    state: &mut GameState,
    moves: &[Move],
    turn: u32,
) -> Vec<TurnEvent> {
    let mut events = Vec::new();

    resolve_movement(map, state, moves, &mut events);
    resolve_placement(state, moves, &mut events);
    resolve_fuses(map, state, turn, &mut events);

    events
}

/// Movement phase, ascending player id.
///
/// The occupancy check sees effective positions: players already processed
/// this turn at their new cell, the rest at their current cell. Two live
/// players therefore never share a cell, position swaps are refused, and a
/// contested cell goes to the lower id.
fn resolve_movement(map: &Map, state: &mut GameState, moves: &[Move], events: &mut Vec<TurnEvent>) {
    for id in 0..state.players.len() {
        if !state.players[id].alive {
            continue;
        }

        let mv = moves.get(id).copied().unwrap_or(Move::Pass);
        state.players[id].last_move = mv;

        let (dx, dy) = mv.delta();
        if (dx, dy) == (0, 0) {
            continue;
        }

        let from = (state.players[id].x, state.players[id].y);
        let target = (from.0 + dx, from.1 + dy);

        let occupied = state
            .players
            .iter()
            .any(|p| p.alive && p.id as usize != id && (p.x, p.y) == target);

        if map.is_walkable(target.0, target.1) && !occupied {
            state.players[id].x = target.0;
            state.players[id].y = target.1;
            events.push(TurnEvent::Moved {
                player_id: id as u32,
                from,
                to: target,
            });
        } else {
            events.push(TurnEvent::Blocked {
                player_id: id as u32,
                attempted: mv,
            });
        }
    }
}

/// Bomb placement phase, ascending player id. One outstanding bomb per
/// player and one bomb per cell; excess placements are rejected, never
/// fatal.
fn resolve_placement(state: &mut GameState, moves: &[Move], events: &mut Vec<TurnEvent>) {
    for id in 0..state.players.len() {
        if !state.players[id].alive || moves.get(id).copied() != Some(Move::Bomb) {
            continue;
        }

        let owner = id as u32;
        if state.place_bomb(owner, BOMB_FUSE) {
            let bomb = state.bombs.last().expect("bomb just placed");
            events.push(TurnEvent::BombPlaced {
                owner,
                x: bomb.x,
                y: bomb.y,
                fuse: bomb.fuse,
            });
        } else {
            events.push(TurnEvent::BombRejected { owner });
        }
    }
}

/// Fuse phase: tick every bomb, then propagate each detonation.
fn resolve_fuses(map: &mut Map, state: &mut GameState, turn: u32, events: &mut Vec<TurnEvent>) {
    for bomb in state.tick_bombs() {
        detonate(map, state, &bomb, turn, events);
    }
}

/// Explosion propagation for one bomb: the bomb's own cell, then up to
/// `BLAST_RADIUS` cells in each orthogonal direction. A wall stops the ray
/// untouched; the first force field hit is destroyed and stops the ray
/// beyond it. Bombs caught in a blast do not chain.
fn detonate(map: &mut Map, state: &mut GameState, bomb: &Bomb, turn: u32, events: &mut Vec<TurnEvent>) {
    events.push(TurnEvent::Detonated {
        owner: bomb.owner,
        x: bomb.x,
        y: bomb.y,
    });

    let mut affected = vec![(bomb.x, bomb.y)];
    for (dx, dy) in [(-1, 0), (1, 0), (0, -1), (0, 1)] {
        for step in 1..=BLAST_RADIUS {
            let x = bomb.x + dx * step;
            let y = bomb.y + dy * step;

            match map.tile(x, y) {
                None | Some(crate::map::Tile::Wall) => break,
                Some(crate::map::Tile::ForceField) => {
                    map.destroy(x, y);
                    events.push(TurnEvent::FieldDestroyed { x, y });
                    affected.push((x, y));
                    break;
                }
                Some(crate::map::Tile::Empty) => affected.push((x, y)),
            }
        }
    }

    for (x, y) in affected {
        let hit: Vec<u32> = state
            .alive_players()
            .filter(|p| (p.x, p.y) == (x, y))
            .map(|p| p.id)
            .collect();
        for id in hit {
            state.eliminate(id, turn);
            events.push(TurnEvent::Eliminated {
                player_id: id,
                turn,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::SpawnPoint;
    use shared::GameSettings;

    fn build(players: usize, rows: &[&str]) -> (Map, GameState) {
        let settings = GameSettings {
            number_of_players: players,
            max_number_of_turns: 100,
            width: rows[0].len() as i32,
            height: rows.len() as i32,
        };
        let lines: Vec<String> = rows.iter().map(|s| s.to_string()).collect();
        let (map, spawns, warnings) = Map::parse(&lines, &settings).unwrap();
        assert!(warnings.is_empty());

        let mut state = GameState::new();
        state.spawn_players(&spawns);
        (map, state)
    }

    fn pos(state: &GameState, id: u32) -> (i32, i32) {
        let p = state.player(id).unwrap();
        (p.x, p.y)
    }

    #[test]
    fn test_basic_movement() {
        let (mut map, mut state) = build(2, &["A....", ".....", "....B"]);

        let events = resolve_turn(&mut map, &mut state, &[Move::Right, Move::Pass], 1);

        assert_eq!(pos(&state, 0), (1, 0));
        assert_eq!(pos(&state, 1), (4, 2));
        assert_eq!(
            events,
            vec![TurnEvent::Moved {
                player_id: 0,
                from: (0, 0),
                to: (1, 0),
            }]
        );
    }

    #[test]
    fn test_wall_blocks_movement() {
        let (mut map, mut state) = build(2, &["A#B"]);

        let events = resolve_turn(&mut map, &mut state, &[Move::Right, Move::Pass], 1);

        assert_eq!(pos(&state, 0), (0, 0));
        assert!(events.contains(&TurnEvent::Blocked {
            player_id: 0,
            attempted: Move::Right,
        }));
    }

    #[test]
    fn test_force_field_blocks_movement() {
        let (mut map, mut state) = build(2, &["A+B"]);

        resolve_turn(&mut map, &mut state, &[Move::Right, Move::Pass], 1);
        assert_eq!(pos(&state, 0), (0, 0));
    }

    #[test]
    fn test_map_edge_blocks_movement() {
        let (mut map, mut state) = build(2, &["A.B"]);

        resolve_turn(&mut map, &mut state, &[Move::Up, Move::Down], 1);
        assert_eq!(pos(&state, 0), (0, 0));
        assert_eq!(pos(&state, 1), (2, 0));
    }

    #[test]
    fn test_contested_cell_goes_to_lower_id() {
        // Both players target (1, 0).
        let (mut map, mut state) = build(2, &["A.B"]);

        let events = resolve_turn(&mut map, &mut state, &[Move::Right, Move::Left], 1);

        assert_eq!(pos(&state, 0), (1, 0));
        assert_eq!(pos(&state, 1), (2, 0));
        assert!(events.contains(&TurnEvent::Moved {
            player_id: 0,
            from: (0, 0),
            to: (1, 0),
        }));
        assert!(events.contains(&TurnEvent::Blocked {
            player_id: 1,
            attempted: Move::Left,
        }));
    }

    #[test]
    fn test_position_swap_is_refused() {
        let (mut map, mut state) = build(2, &["AB"]);

        resolve_turn(&mut map, &mut state, &[Move::Right, Move::Left], 1);

        assert_eq!(pos(&state, 0), (0, 0));
        assert_eq!(pos(&state, 1), (1, 0));
    }

    #[test]
    fn test_follow_into_vacated_cell() {
        // Lower id vacates first, higher id may enter the freed cell.
        let (mut map, mut state) = build(2, &["AB", ".."]);

        resolve_turn(&mut map, &mut state, &[Move::Down, Move::Left], 1);

        assert_eq!(pos(&state, 0), (0, 1));
        assert_eq!(pos(&state, 1), (0, 0));
    }

    #[test]
    fn test_bomb_placement_and_rejection() {
        let (mut map, mut state) = build(2, &["A...B"]);

        let events = resolve_turn(&mut map, &mut state, &[Move::Bomb, Move::Pass], 1);
        assert!(events.contains(&TurnEvent::BombPlaced {
            owner: 0,
            x: 0,
            y: 0,
            fuse: BOMB_FUSE,
        }));
        assert_eq!(state.bombs.len(), 1);
        // The placement turn's fuse phase has already ticked it once.
        assert_eq!(state.bombs[0].fuse, BOMB_FUSE - 1);

        let events = resolve_turn(&mut map, &mut state, &[Move::Bomb, Move::Pass], 2);
        assert!(events.contains(&TurnEvent::BombRejected { owner: 0 }));
        assert_eq!(state.bombs.len(), 1);
    }

    #[test]
    fn test_bomb_detonates_exactly_after_fuse_ticks() {
        let (mut map, mut state) = build(2, &["A....", ".....", "....B"]);

        resolve_turn(&mut map, &mut state, &[Move::Bomb, Move::Pass], 1);

        // Fuse 3: ticks on turns 1, 2 and 3; detonation happens on turn 3.
        let events = resolve_turn(&mut map, &mut state, &[Move::Down, Move::Pass], 2);
        assert!(!events
            .iter()
            .any(|e| matches!(e, TurnEvent::Detonated { .. })));

        let events = resolve_turn(&mut map, &mut state, &[Move::Down, Move::Pass], 3);
        assert!(events.contains(&TurnEvent::Detonated {
            owner: 0,
            x: 0,
            y: 0,
        }));
        assert!(state.bombs.is_empty());
    }

    #[test]
    fn test_blast_eliminates_adjacent_player() {
        let (mut map, mut state) = build(2, &["AB...", ".....", "....."]);

        resolve_turn(&mut map, &mut state, &[Move::Bomb, Move::Pass], 1);
        resolve_turn(&mut map, &mut state, &[Move::Down, Move::Pass], 2);
        let events = resolve_turn(&mut map, &mut state, &[Move::Down, Move::Pass], 3);

        // Blast covers (0,0) and (1,0); player 0 escaped to (0,2).
        assert!(events.contains(&TurnEvent::Eliminated { player_id: 1, turn: 3 }));
        assert!(state.player(0).unwrap().alive);
        assert!(!state.player(1).unwrap().alive);
        assert_eq!(state.alive_count(), 1);
    }

    #[test]
    fn test_bomb_owner_can_be_caught_in_own_blast() {
        let (mut map, mut state) = build(2, &["A....", ".....", "....B"]);

        resolve_turn(&mut map, &mut state, &[Move::Bomb, Move::Pass], 1);
        resolve_turn(&mut map, &mut state, &[Move::Pass, Move::Pass], 2);
        let events = resolve_turn(&mut map, &mut state, &[Move::Pass, Move::Pass], 3);

        assert!(events.contains(&TurnEvent::Eliminated { player_id: 0, turn: 3 }));
        assert!(!state.player(0).unwrap().alive);
    }

    #[test]
    fn test_wall_stops_blast() {
        // Player 1 hides behind a wall one cell from the bomb.
        let (mut map, mut state) = build(2, &["A#B"]);

        resolve_turn(&mut map, &mut state, &[Move::Bomb, Move::Pass], 1);
        resolve_turn(&mut map, &mut state, &[Move::Pass, Move::Pass], 2);
        let events = resolve_turn(&mut map, &mut state, &[Move::Pass, Move::Pass], 3);

        assert!(events.contains(&TurnEvent::Detonated {
            owner: 0,
            x: 0,
            y: 0,
        }));
        assert!(state.player(1).unwrap().alive);
        assert_eq!(map.tile(1, 0), Some(crate::map::Tile::Wall));
    }

    #[test]
    fn test_blast_destroys_first_force_field_and_stops() {
        let (mut map, mut state) = build(2, &["A+..B"]);

        resolve_turn(&mut map, &mut state, &[Move::Bomb, Move::Pass], 1);
        resolve_turn(&mut map, &mut state, &[Move::Pass, Move::Pass], 2);
        let events = resolve_turn(&mut map, &mut state, &[Move::Pass, Move::Pass], 3);

        assert!(events.contains(&TurnEvent::FieldDestroyed { x: 1, y: 0 }));
        assert!(map.is_walkable(1, 0));
        // Owner stood on the bomb, so the blast got them; the far player is safe.
        assert!(state.player(1).unwrap().alive);
    }

    #[test]
    fn test_cleared_force_field_is_walkable_next_turn() {
        let (mut map, mut state) = build(2, &["A+.B"]);

        resolve_turn(&mut map, &mut state, &[Move::Bomb, Move::Pass], 1);
        resolve_turn(&mut map, &mut state, &[Move::Pass, Move::Pass], 2);
        resolve_turn(&mut map, &mut state, &[Move::Pass, Move::Pass], 3);
        resolve_turn(&mut map, &mut state, &[Move::Pass, Move::Left], 4);

        // Player 1 walks onto the cell the explosion cleared.
        assert_eq!(pos(&state, 1), (2, 0));
        resolve_turn(&mut map, &mut state, &[Move::Pass, Move::Left], 5);
        assert_eq!(pos(&state, 1), (1, 0));
    }

    #[test]
    fn test_no_chained_detonation() {
        let (mut map, mut state) = build(2, &["AB..."]);

        // Player 0 places on turn 1, player 1 on turn 2: fuses stay offset.
        resolve_turn(&mut map, &mut state, &[Move::Bomb, Move::Pass], 1);
        resolve_turn(&mut map, &mut state, &[Move::Pass, Move::Bomb], 2);
        let events = resolve_turn(&mut map, &mut state, &[Move::Pass, Move::Pass], 3);

        // Only player 0's bomb goes off; player 1's keeps its own fuse.
        let detonations: Vec<_> = events
            .iter()
            .filter(|e| matches!(e, TurnEvent::Detonated { .. }))
            .collect();
        assert_eq!(detonations.len(), 1);
        assert_eq!(state.bombs.len(), 1);
        assert_eq!(state.bombs[0].owner, 1);
    }

    #[test]
    fn test_missing_moves_default_to_pass() {
        let (mut map, mut state) = build(2, &["A.B"]);

        let events = resolve_turn(&mut map, &mut state, &[Move::Right], 1);

        assert_eq!(pos(&state, 1), (2, 0));
        assert_eq!(state.player(1).unwrap().last_move, Move::Pass);
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn test_dead_players_do_not_move_or_place() {
        let (mut map, mut state) = build(2, &["A.B"]);
        state.eliminate(1, 1);

        let events = resolve_turn(&mut map, &mut state, &[Move::Pass, Move::Bomb], 2);

        assert!(events.is_empty());
        assert!(state.bombs.is_empty());
    }
}
