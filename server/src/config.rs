//! Boot-time scenario ingestion: four settings lines, then the map.
//!
//! Anything wrong at this stage is fatal, since the server cannot start a
//! game it cannot size, and surfaces as a non-zero exit from the binary.

use shared::{GameSettings, ProtocolError};
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("failed to read scenario: {0}")]
    Io(#[from] io::Error),
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
    #[error("expected {expected} map lines, got {got}")]
    TruncatedMap { expected: usize, got: usize },
}

/// Raw boot input: validated settings plus the unparsed map lines.
/// Map content is validated later by `Map::parse`.
#[derive(Debug, Clone)]
pub struct Scenario {
    pub settings: GameSettings,
    pub map_lines: Vec<String>,
}

impl Scenario {
    pub fn load(path: &Path) -> Result<Self, ScenarioError> {
        Self::from_reader(BufReader::new(File::open(path)?))
    }

    /// Fixed-order parse: `number_of_players`, `max_number_of_turns`,
    /// `width`, `height`, then exactly `height` map lines.
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self, ScenarioError> {
        let mut lines = reader.lines();

        let mut settings_lines = Vec::with_capacity(4);
        for _ in 0..4 {
            match lines.next() {
                Some(line) => settings_lines.push(line?),
                None => break,
            }
        }
        let settings = GameSettings::from_lines(&settings_lines)?;

        let height = settings.height as usize;
        let mut map_lines = Vec::with_capacity(height);
        for line in lines.take(height) {
            map_lines.push(line?.trim_end_matches(['\r', '\n']).to_string());
        }
        if map_lines.len() != height {
            return Err(ScenarioError::TruncatedMap {
                expected: height,
                got: map_lines.len(),
            });
        }

        Ok(Self {
            settings,
            map_lines,
        })
    }
}
