//! Client-side protocol plumbing: handshake, status reads and move writes.

use log::{debug, info};
use shared::{InitialInfo, Move, ProtocolError, StatusUpdate, LINE_TERMINATOR};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;

/// One player's connection to the game server. Holds the identity and
/// settings received during the handshake, which size all later reads.
pub struct Connection {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
    pub info: InitialInfo,
}

impl Connection {
    /// Connects and performs the handshake: five integer lines carrying our
    /// player id and the four game settings.
    pub async fn connect(server_addr: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let stream = TcpStream::connect(server_addr).await?;
        info!("Connected to server at {}", server_addr);

        let (read, write) = stream.into_split();
        let mut reader = BufReader::new(read);

        let mut lines = Vec::with_capacity(5);
        for _ in 0..5 {
            lines.push(read_line(&mut reader).await?);
        }
        let info = InitialInfo::from_lines(&lines)?;
        info!(
            "Joined as player {} ({} players, {} turns max, {}x{} map)",
            info.player_id,
            info.settings.number_of_players,
            info.settings.max_number_of_turns,
            info.settings.width,
            info.settings.height
        );

        Ok(Self {
            reader,
            writer: write,
            info,
        })
    }

    /// Reads one full status update. The line counts come from the settings
    /// and from the count lines embedded in the update itself.
    pub async fn read_status(&mut self) -> Result<StatusUpdate, Box<dyn std::error::Error>> {
        let height = self.info.settings.height as usize;
        let players = self.info.settings.number_of_players;

        let mut lines = Vec::new();
        for _ in 0..height {
            lines.push(read_line(&mut self.reader).await?);
        }

        let alive_line = read_line(&mut self.reader).await?;
        let alive: usize = alive_line
            .trim()
            .parse()
            .map_err(|_| ProtocolError::BadInteger {
                line: alive_line.clone(),
            })?;
        lines.push(alive_line);
        for _ in 0..alive + players {
            lines.push(read_line(&mut self.reader).await?);
        }

        let bomb_line = read_line(&mut self.reader).await?;
        let bombs: usize = bomb_line
            .trim()
            .parse()
            .map_err(|_| ProtocolError::BadInteger {
                line: bomb_line.clone(),
            })?;
        lines.push(bomb_line);
        for _ in 0..bombs {
            lines.push(read_line(&mut self.reader).await?);
        }

        let status = StatusUpdate::from_lines(&lines, height, players)?;
        debug!(
            "Turn status: {} alive, {} bombs",
            status.players.len(),
            status.bombs.len()
        );
        Ok(status)
    }

    pub async fn send_move(&mut self, mv: Move) -> std::io::Result<()> {
        debug!("Submitting move: {}", mv);
        self.writer
            .write_all(format!("{}{}", mv.as_token(), LINE_TERMINATOR).as_bytes())
            .await?;
        self.writer.flush().await
    }
}

async fn read_line(
    reader: &mut BufReader<OwnedReadHalf>,
) -> Result<String, Box<dyn std::error::Error>> {
    let mut line = String::new();
    let n = reader.read_line(&mut line).await?;
    if n == 0 {
        return Err("server closed the connection".into());
    }
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}
