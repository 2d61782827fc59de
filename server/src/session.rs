//! Per-player synchronization channel carrying the line protocol.
//!
//! Each connected player gets one `Session`: a bidirectional CRLF line
//! channel over any buffered reader/writer pair. Outbound traffic is the
//! one-time initial info and the per-turn status update; inbound traffic is
//! one move token per turn, read with a bounded wait.
//!
//! Nothing a session does is ever fatal to the game. A player that misses
//! the collection deadline degrades to `pass` for that turn and the channel
//! is retried next turn; a channel that errors or reaches end-of-stream is
//! marked closed and yields `pass` immediately from then on.

use log::warn;
use shared::{InitialInfo, Move, StatusUpdate, LINE_TERMINATOR};
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::time::timeout;

/// Session over a split TCP stream, the production configuration.
pub type TcpSession = Session<BufReader<OwnedReadHalf>, OwnedWriteHalf>;

/// One player's line channel plus its liveness flag.
#[derive(Debug)]
pub struct Session<R, W> {
    player_id: u32,
    reader: R,
    writer: W,
    open: bool,
}

impl TcpSession {
    pub fn from_stream(player_id: u32, stream: TcpStream) -> TcpSession {
        let (read, write) = stream.into_split();
        Session::new(player_id, BufReader::new(read), write)
    }
}

impl<R, W> Session<R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(player_id: u32, reader: R, writer: W) -> Self {
        Self {
            player_id,
            reader,
            writer,
            open: true,
        }
    }

    pub fn player_id(&self) -> u32 {
        self.player_id
    }

    /// False once the channel errored or reached end-of-stream.
    pub fn is_open(&self) -> bool {
        self.open
    }

    pub async fn send_initial_info(&mut self, info: &InitialInfo) {
        self.send_lines(&info.to_lines()).await;
    }

    pub async fn send_status(&mut self, status: &StatusUpdate) {
        self.send_lines(&status.to_lines()).await;
    }

    async fn send_lines(&mut self, lines: &[String]) {
        if !self.open {
            return;
        }

        // One write per message keeps a slow peer from interleaving turns.
        let mut payload = String::new();
        for line in lines {
            payload.push_str(line);
            payload.push_str(LINE_TERMINATOR);
        }

        if let Err(e) = self.writer.write_all(payload.as_bytes()).await {
            warn!("Player {}: send failed ({}), closing channel", self.player_id, e);
            self.open = false;
            return;
        }
        if let Err(e) = self.writer.flush().await {
            warn!("Player {}: flush failed ({}), closing channel", self.player_id, e);
            self.open = false;
        }
    }

    /// Reads this turn's move with a bounded wait. Every failure mode
    /// (deadline missed, channel closed, read error, unknown token) degrades
    /// to `Pass`; only end-of-stream and I/O errors close the channel.
    pub async fn read_move(&mut self, deadline: Duration) -> Move {
        if !self.open {
            return Move::Pass;
        }

        let mut line = String::new();
        match timeout(deadline, self.reader.read_line(&mut line)).await {
            Err(_) => {
                warn!(
                    "Player {}: no move within {:?}, defaulting to pass",
                    self.player_id, deadline
                );
                Move::Pass
            }
            Ok(Ok(0)) => {
                warn!(
                    "Player {}: channel closed, defaulting to pass",
                    self.player_id
                );
                self.open = false;
                Move::Pass
            }
            Ok(Ok(_)) => Move::from_token(&line),
            Ok(Err(e)) => {
                warn!(
                    "Player {}: read failed ({}), defaulting to pass",
                    self.player_id, e
                );
                self.open = false;
                Move::Pass
            }
        }
    }
}
