use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Highest player count the map alphabet (`A`..`Z`) can express.
pub const MAX_PLAYERS: usize = 26;
/// Fuse value assigned to a freshly placed bomb, in turns.
pub const BOMB_FUSE: u8 = 3;
/// Upper bound on any bomb fuse accepted by the registry.
pub const MAX_BOMB_FUSE: u8 = 25;
/// How many cells an explosion reaches in each orthogonal direction.
pub const BLAST_RADIUS: i32 = 1;
/// Every protocol record is terminated by CRLF.
pub const LINE_TERMINATOR: &str = "\r\n";

/// Errors raised while decoding protocol lines or validating settings.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("expected {expected} lines, got {got}")]
    MissingLines { expected: usize, got: usize },
    #[error("malformed integer in line {line:?}")]
    BadInteger { line: String },
    #[error("number of players must be between 1 and 26, got {0}")]
    BadPlayerCount(usize),
    #[error("{field} must be positive, got {got}")]
    NonPositive { field: &'static str, got: i64 },
    #[error("malformed status line {line:?}")]
    BadStatusLine { line: String },
}

/// One move token submitted per player per turn.
///
/// `Bomb` is the reserved placement action: the player stays in place and a
/// bomb is dropped at their cell. Unknown tokens decode to `Pass`, so the
/// mapping is total and a garbled line can never crash a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Move {
    Pass,
    Left,
    Right,
    Up,
    Down,
    Bomb,
}

impl Move {
    pub const ALL: [Move; 6] = [
        Move::Pass,
        Move::Left,
        Move::Right,
        Move::Up,
        Move::Down,
        Move::Bomb,
    ];

    /// Decodes a protocol token. Total: anything unrecognized is `Pass`.
    pub fn from_token(token: &str) -> Move {
        match token.trim() {
            "left" => Move::Left,
            "right" => Move::Right,
            "up" => Move::Up,
            "down" => Move::Down,
            "bomb" => Move::Bomb,
            _ => Move::Pass,
        }
    }

    pub fn as_token(self) -> &'static str {
        match self {
            Move::Pass => "pass",
            Move::Left => "left",
            Move::Right => "right",
            Move::Up => "up",
            Move::Down => "down",
            Move::Bomb => "bomb",
        }
    }

    /// Cell offset the move asks for. `Pass` and `Bomb` stay in place.
    pub fn delta(self) -> (i32, i32) {
        match self {
            Move::Left => (-1, 0),
            Move::Right => (1, 0),
            Move::Up => (0, -1),
            Move::Down => (0, 1),
            Move::Pass | Move::Bomb => (0, 0),
        }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_token())
    }
}

/// Boot-time game parameters, immutable once parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameSettings {
    pub number_of_players: usize,
    pub max_number_of_turns: u32,
    pub width: i32,
    pub height: i32,
}

impl GameSettings {
    /// Parses the four settings lines in their fixed order:
    /// players, max turns, width, height.
    pub fn from_lines(lines: &[String]) -> Result<Self, ProtocolError> {
        if lines.len() < 4 {
            return Err(ProtocolError::MissingLines {
                expected: 4,
                got: lines.len(),
            });
        }

        let number_of_players = parse_int::<usize>(&lines[0])?;
        let max_number_of_turns = parse_int::<u32>(&lines[1])?;
        let width = parse_int::<i32>(&lines[2])?;
        let height = parse_int::<i32>(&lines[3])?;

        if number_of_players == 0 || number_of_players > MAX_PLAYERS {
            return Err(ProtocolError::BadPlayerCount(number_of_players));
        }
        if max_number_of_turns == 0 {
            return Err(ProtocolError::NonPositive {
                field: "max_number_of_turns",
                got: 0,
            });
        }
        if width <= 0 {
            return Err(ProtocolError::NonPositive {
                field: "width",
                got: width as i64,
            });
        }
        if height <= 0 {
            return Err(ProtocolError::NonPositive {
                field: "height",
                got: height as i64,
            });
        }

        Ok(Self {
            number_of_players,
            max_number_of_turns,
            width,
            height,
        })
    }

    pub fn to_lines(&self) -> Vec<String> {
        vec![
            self.number_of_players.to_string(),
            self.max_number_of_turns.to_string(),
            self.width.to_string(),
            self.height.to_string(),
        ]
    }
}

/// Handshake message sent to each player exactly once: their own id,
/// then the four settings values, one integer per line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InitialInfo {
    pub player_id: u32,
    pub settings: GameSettings,
}

impl InitialInfo {
    pub fn to_lines(&self) -> Vec<String> {
        let mut lines = vec![self.player_id.to_string()];
        lines.extend(self.settings.to_lines());
        lines
    }

    pub fn from_lines(lines: &[String]) -> Result<Self, ProtocolError> {
        if lines.len() < 5 {
            return Err(ProtocolError::MissingLines {
                expected: 5,
                got: lines.len(),
            });
        }
        let player_id = parse_int::<u32>(&lines[0])?;
        let settings = GameSettings::from_lines(&lines[1..5])?;
        Ok(Self {
            player_id,
            settings,
        })
    }
}

/// Position line for one alive player: `"<id> <x> <y>"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerStatus {
    pub id: u32,
    pub x: i32,
    pub y: i32,
}

/// Last-move line for one player: `"<id> <token>"`, or `"<id> out"` once
/// the player has been eliminated (`action == None`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LastMoveStatus {
    pub id: u32,
    pub action: Option<Move>,
}

/// Bomb line: `"<owner_id> <x> <y> <fuse>"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BombStatus {
    pub owner: u32,
    pub x: i32,
    pub y: i32,
    pub fuse: u8,
}

/// Per-turn broadcast: terrain dump, alive count, alive positions,
/// last moves for every player, bomb count, active bombs.
///
/// The terrain dump reflects tiles only; players and bombs are reported in
/// the structured lines that follow, never overlaid on the grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusUpdate {
    pub terrain: Vec<String>,
    pub players: Vec<PlayerStatus>,
    pub last_moves: Vec<LastMoveStatus>,
    pub bombs: Vec<BombStatus>,
}

impl StatusUpdate {
    pub fn to_lines(&self) -> Vec<String> {
        let mut lines = self.terrain.clone();
        lines.push(self.players.len().to_string());
        for p in &self.players {
            lines.push(format!("{} {} {}", p.id, p.x, p.y));
        }
        for m in &self.last_moves {
            match m.action {
                Some(mv) => lines.push(format!("{} {}", m.id, mv.as_token())),
                None => lines.push(format!("{} out", m.id)),
            }
        }
        lines.push(self.bombs.len().to_string());
        for b in &self.bombs {
            lines.push(format!("{} {} {} {}", b.owner, b.x, b.y, b.fuse));
        }
        lines
    }

    /// Decodes a status update from its lines. `height` and `player_count`
    /// come from the settings exchanged during the handshake.
    pub fn from_lines(
        lines: &[String],
        height: usize,
        player_count: usize,
    ) -> Result<Self, ProtocolError> {
        let mut cursor = Cursor { lines, pos: 0 };

        let mut terrain = Vec::with_capacity(height);
        for _ in 0..height {
            terrain.push(cursor.next()?.to_string());
        }

        let alive = parse_int::<usize>(cursor.next()?)?;
        let mut players = Vec::with_capacity(alive);
        for _ in 0..alive {
            let line = cursor.next()?;
            let fields = split_fields(line, 3)?;
            players.push(PlayerStatus {
                id: parse_int(fields[0])?,
                x: parse_int(fields[1])?,
                y: parse_int(fields[2])?,
            });
        }

        let mut last_moves = Vec::with_capacity(player_count);
        for _ in 0..player_count {
            let line = cursor.next()?;
            let fields = split_fields(line, 2)?;
            let id = parse_int(fields[0])?;
            let action = if fields[1] == "out" {
                None
            } else {
                Some(Move::from_token(fields[1]))
            };
            last_moves.push(LastMoveStatus { id, action });
        }

        let bomb_count = parse_int::<usize>(cursor.next()?)?;
        let mut bombs = Vec::with_capacity(bomb_count);
        for _ in 0..bomb_count {
            let line = cursor.next()?;
            let fields = split_fields(line, 4)?;
            bombs.push(BombStatus {
                owner: parse_int(fields[0])?,
                x: parse_int(fields[1])?,
                y: parse_int(fields[2])?,
                fuse: parse_int(fields[3])?,
            });
        }

        Ok(Self {
            terrain,
            players,
            last_moves,
            bombs,
        })
    }

    /// Terrain character at (x, y), or None when out of bounds.
    pub fn terrain_at(&self, x: i32, y: i32) -> Option<char> {
        if x < 0 || y < 0 {
            return None;
        }
        self.terrain
            .get(y as usize)
            .and_then(|row| row.chars().nth(x as usize))
    }
}

/// One entry of the final standings report: survivors first, then later
/// eliminations before earlier ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Standing {
    pub rank: u32,
    pub player_id: u32,
    pub eliminated_turn: Option<u32>,
}

struct Cursor<'a> {
    lines: &'a [String],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn next(&mut self) -> Result<&'a str, ProtocolError> {
        let line = self
            .lines
            .get(self.pos)
            .ok_or(ProtocolError::MissingLines {
                expected: self.pos + 1,
                got: self.lines.len(),
            })?;
        self.pos += 1;
        Ok(line.as_str())
    }
}

fn parse_int<T: std::str::FromStr>(line: &str) -> Result<T, ProtocolError> {
    line.trim().parse().map_err(|_| ProtocolError::BadInteger {
        line: line.to_string(),
    })
}

fn split_fields(line: &str, expected: usize) -> Result<Vec<&str>, ProtocolError> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() != expected {
        return Err(ProtocolError::BadStatusLine {
            line: line.to_string(),
        });
    }
    Ok(fields)
}
