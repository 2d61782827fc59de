//! Grid geometry and per-cell tile classification.
//!
//! The map owns the immutable grid shape and the mutable tile contents:
//! walls are permanent, force fields can be cleared by explosions. Parsing
//! also extracts the spawn markers that seed the entity registry; markers
//! are rewritten as empty terrain so the dump never leaks spawn points.

use shared::GameSettings;
use std::fmt;
use thiserror::Error;

/// Static terrain classification of one grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tile {
    Empty,
    Wall,
    ForceField,
}

impl Tile {
    pub fn to_char(self) -> char {
        match self {
            Tile::Empty => '.',
            Tile::Wall => '#',
            Tile::ForceField => '+',
        }
    }
}

/// Initial cell for one player, recovered from a letter marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpawnPoint {
    pub player_id: u32,
    pub x: i32,
    pub y: i32,
}

/// Non-fatal findings from map parsing; the caller decides how to log them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MapWarning {
    UnknownTile { ch: char, x: i32, y: i32 },
    UnusedSpawnMarker { ch: char, x: i32, y: i32 },
}

impl fmt::Display for MapWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MapWarning::UnknownTile { ch, x, y } => {
                write!(f, "unknown tile {:?} at ({}, {}), treated as empty", ch, x, y)
            }
            MapWarning::UnusedSpawnMarker { ch, x, y } => {
                write!(f, "spawn marker {:?} at ({}, {}) has no player, ignored", ch, x, y)
            }
        }
    }
}

/// Fatal map problems: the server cannot start a game it cannot size.
#[derive(Debug, Error)]
pub enum MapError {
    #[error("expected {expected} map rows, got {got}")]
    WrongRowCount { expected: usize, got: usize },
    #[error("map row {row} has {got} columns, expected {expected}")]
    WrongRowWidth {
        row: usize,
        got: usize,
        expected: usize,
    },
    #[error("duplicate spawn marker for player {player_id} at ({x}, {y})")]
    DuplicateSpawn { player_id: u32, x: i32, y: i32 },
    #[error("no spawn marker for player {player_id}")]
    MissingSpawn { player_id: u32 },
}

/// Fixed `height x width` grid of tiles, row-major.
#[derive(Debug, Clone)]
pub struct Map {
    width: i32,
    height: i32,
    tiles: Vec<Tile>,
}

impl Map {
    /// Parses `height` rows of `width` characters, extracting spawn markers.
    ///
    /// Returns the map, the spawn points for ids `0..number_of_players` in id
    /// order, and any non-fatal warnings encountered. Dimension mismatches
    /// and marker problems are fatal.
    pub fn parse(
        lines: &[String],
        settings: &GameSettings,
    ) -> Result<(Map, Vec<SpawnPoint>, Vec<MapWarning>), MapError> {
        let width = settings.width as usize;
        let height = settings.height as usize;

        if lines.len() != height {
            return Err(MapError::WrongRowCount {
                expected: height,
                got: lines.len(),
            });
        }

        let mut tiles = Vec::with_capacity(width * height);
        let mut spawns: Vec<Option<SpawnPoint>> = vec![None; settings.number_of_players];
        let mut warnings = Vec::new();

        for (row, line) in lines.iter().enumerate() {
            let chars: Vec<char> = line.chars().collect();
            if chars.len() != width {
                return Err(MapError::WrongRowWidth {
                    row,
                    got: chars.len(),
                    expected: width,
                });
            }

            for (col, ch) in chars.into_iter().enumerate() {
                let x = col as i32;
                let y = row as i32;

                let tile = match ch {
                    '.' => Tile::Empty,
                    '#' => Tile::Wall,
                    '+' => Tile::ForceField,
                    'A'..='Z' => {
                        let player_id = (ch as u32) - ('A' as u32);
                        if (player_id as usize) < settings.number_of_players {
                            let spawn = SpawnPoint { player_id, x, y };
                            if spawns[player_id as usize].replace(spawn).is_some() {
                                return Err(MapError::DuplicateSpawn { player_id, x, y });
                            }
                        } else {
                            warnings.push(MapWarning::UnusedSpawnMarker { ch, x, y });
                        }
                        Tile::Empty
                    }
                    other => {
                        warnings.push(MapWarning::UnknownTile { ch: other, x, y });
                        Tile::Empty
                    }
                };
                tiles.push(tile);
            }
        }

        let mut spawn_points = Vec::with_capacity(settings.number_of_players);
        for (id, spawn) in spawns.into_iter().enumerate() {
            match spawn {
                Some(spawn) => spawn_points.push(spawn),
                None => {
                    return Err(MapError::MissingSpawn {
                        player_id: id as u32,
                    })
                }
            }
        }

        let map = Map {
            width: settings.width,
            height: settings.height,
            tiles,
        };
        Ok((map, spawn_points, warnings))
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && x < self.width && y >= 0 && y < self.height
    }

    pub fn tile(&self, x: i32, y: i32) -> Option<Tile> {
        if self.in_bounds(x, y) {
            Some(self.tiles[(y * self.width + x) as usize])
        } else {
            None
        }
    }

    /// A cell can be entered iff it is in-bounds and empty. Walls and intact
    /// force fields both refuse entry; a force field only opens up once an
    /// explosion clears it.
    pub fn is_walkable(&self, x: i32, y: i32) -> bool {
        self.tile(x, y) == Some(Tile::Empty)
    }

    /// Clears a force field. Returns true iff a field was destroyed;
    /// no-op on every other tile.
    pub fn destroy(&mut self, x: i32, y: i32) -> bool {
        if self.tile(x, y) == Some(Tile::ForceField) {
            self.tiles[(y * self.width + x) as usize] = Tile::Empty;
            true
        } else {
            false
        }
    }

    /// Canonical textual dump of the current tile state, one row per line.
    pub fn serialize(&self) -> Vec<String> {
        (0..self.height)
            .map(|y| {
                (0..self.width)
                    .map(|x| self.tiles[(y * self.width + x) as usize].to_char())
                    .collect()
            })
            .collect()
    }
}
