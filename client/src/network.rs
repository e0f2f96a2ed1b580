//! Client network layer: UDP plumbing and the interactive loop

use crate::replica::Replica;
use bincode::{deserialize, serialize};
use log::{error, info, warn};
use shared::{LineId, Packet, MAX_DATAGRAM_LEN};
use std::net::SocketAddr;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::UdpSocket;

/// How a session is entered: host a new one or join by code.
pub enum Mode {
    Create,
    Join(String),
}

/// A parsed line of player input.
#[derive(Debug, PartialEq, Eq)]
pub enum Command {
    Line(LineId),
    Start,
    Quit,
    Help,
}

/// Parses one line of terminal input. Moves are written as
/// `h x y` or `v x y`, matching the coordinates drawn on the board.
pub fn parse_command(input: &str) -> Result<Command, String> {
    let mut parts = input.split_whitespace();
    let Some(keyword) = parts.next() else {
        return Err("empty input".to_string());
    };

    match keyword {
        "start" => Ok(Command::Start),
        "quit" | "exit" => Ok(Command::Quit),
        "help" => Ok(Command::Help),
        "h" | "v" => {
            let coords: Vec<u8> = parts
                .map(|p| p.parse())
                .collect::<Result<_, _>>()
                .map_err(|_| format!("usage: {} <x> <y> with small whole numbers", keyword))?;
            let [x, y] = coords.as_slice() else {
                return Err(format!("usage: {} <x> <y>", keyword));
            };
            let line = if keyword == "h" {
                LineId::horizontal(*x, *y)
            } else {
                LineId::vertical(*x, *y)
            };
            Ok(Command::Line(line))
        }
        other => Err(format!("unknown command '{}', try 'help'", other)),
    }
}

const HELP: &str = "\
Commands:
  h <x> <y>   claim the horizontal line at (x, y)
  v <x> <y>   claim the vertical line at (x, y)
  start       start the game (needs at least 2 players)
  quit        leave the session
";

pub struct Client {
    socket: UdpSocket,
    server_addr: SocketAddr,
    replica: Option<Replica>,
}

impl Client {
    pub async fn new(server_addr: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let socket = UdpSocket::bind("0.0.0.0:0").await?;
        let server_addr = server_addr.parse()?;

        Ok(Client {
            socket,
            server_addr,
            replica: None,
        })
    }

    async fn connect(&mut self, mode: Mode) -> Result<(), Box<dyn std::error::Error>> {
        let packet = match mode {
            Mode::Create => {
                info!("Creating a new session...");
                Packet::Create
            }
            Mode::Join(session_id) => {
                info!("Joining session {}...", session_id);
                Packet::Join { session_id }
            }
        };
        self.send_packet(&packet).await
    }

    async fn send_packet(&self, packet: &Packet) -> Result<(), Box<dyn std::error::Error>> {
        let data = serialize(packet)?;
        self.socket.send_to(&data, self.server_addr).await?;
        Ok(())
    }

    fn handle_packet(&mut self, packet: Packet) {
        match packet {
            Packet::Welcome {
                session_id,
                player_id,
                snapshot,
            } => {
                println!("Entered session {} as player {}", session_id, player_id);
                println!("Share the code {} with the other players", session_id);
                print!("{}", HELP);

                let mut replica = Replica::new(session_id, player_id);
                match replica.apply_snapshot(&snapshot) {
                    Ok(()) => {
                        print!("{}", replica.render());
                        self.replica = Some(replica);
                    }
                    Err(e) => error!("Snapshot replay failed: {}", e),
                }
            }

            Packet::State { snapshot } => {
                let Some(replica) = &mut self.replica else {
                    warn!("State update before welcome, ignoring");
                    return;
                };
                match replica.apply_snapshot(&snapshot) {
                    Ok(()) => print!("{}", replica.render()),
                    Err(e) => error!("Snapshot replay failed: {}", e),
                }
            }

            Packet::Accepted => {}

            Packet::Rejected { error } => {
                println!("Rejected by server: {}", error);
            }

            _ => {
                warn!("Unexpected packet type from server");
            }
        }
    }

    /// Sends a parsed command to the server; returns false on quit.
    async fn handle_command(&mut self, command: Command) -> bool {
        match command {
            Command::Help => print!("{}", HELP),
            Command::Start => {
                if let Err(e) = self.send_packet(&Packet::Start).await {
                    error!("Error sending start request: {}", e);
                }
            }
            Command::Line(line) => {
                if let Err(e) = self.send_packet(&Packet::Turn { line }).await {
                    error!("Error sending move: {}", e);
                }
            }
            Command::Quit => return false,
        }
        true
    }

    /// Interactive loop: server snapshots on one side, typed commands on
    /// the other.
    pub async fn run(&mut self, mode: Mode) -> Result<(), Box<dyn std::error::Error>> {
        self.connect(mode).await?;

        let mut buffer = vec![0u8; MAX_DATAGRAM_LEN];
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        loop {
            tokio::select! {
                result = self.socket.recv_from(&mut buffer) => {
                    match result {
                        // The socket is unconnected, so anything that can
                        // reach our ephemeral port lands here; only the
                        // server gets to drive the replica.
                        Ok((_, from)) if from != self.server_addr => {
                            warn!("Dropping packet from unexpected source {}", from);
                        },
                        Ok((len, _)) => {
                            if let Ok(packet) = deserialize::<Packet>(&buffer[0..len]) {
                                self.handle_packet(packet);
                            } else {
                                warn!("Failed to deserialize packet from server");
                            }
                        },
                        Err(e) => error!("Error receiving packet: {}", e),
                    }
                },

                line = lines.next_line() => {
                    match line? {
                        Some(line) if line.trim().is_empty() => {},
                        Some(line) => {
                            match parse_command(&line) {
                                Ok(command) => {
                                    if !self.handle_command(command).await {
                                        break;
                                    }
                                }
                                Err(message) => println!("{}", message),
                            }
                        },
                        // stdin closed
                        None => break,
                    }
                },
            }
        }

        if self.replica.is_some() {
            let _ = self.send_packet(&Packet::Leave).await;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_moves() {
        assert_eq!(
            parse_command("h 0 1").unwrap(),
            Command::Line(LineId::horizontal(0, 1))
        );
        assert_eq!(
            parse_command("v 2 0").unwrap(),
            Command::Line(LineId::vertical(2, 0))
        );
        assert_eq!(
            parse_command("  h  1  1  ").unwrap(),
            Command::Line(LineId::horizontal(1, 1))
        );
    }

    #[test]
    fn test_parse_keywords() {
        assert_eq!(parse_command("start").unwrap(), Command::Start);
        assert_eq!(parse_command("quit").unwrap(), Command::Quit);
        assert_eq!(parse_command("exit").unwrap(), Command::Quit);
        assert_eq!(parse_command("help").unwrap(), Command::Help);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_command("").is_err());
        assert!(parse_command("banana").is_err());
        assert!(parse_command("h one two").is_err());
        assert!(parse_command("h 0").is_err());
        assert!(parse_command("v 0 1 2").is_err());
        assert!(parse_command("h 300 0").is_err());
    }
}
