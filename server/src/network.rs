//! Server network layer handling UDP communications and session coordination

use crate::connections::ConnectionRegistry;
use crate::sessions::SessionManager;
use bincode::{deserialize, serialize};
use log::{debug, error, info, warn};
use shared::{GameError, Grid, Packet, MAX_DATAGRAM_LEN};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::sync::{mpsc, RwLock};

/// Messages sent from network tasks to the main server loop
#[derive(Debug)]
pub enum ServerMessage {
    PacketReceived {
        packet: Packet,
        addr: SocketAddr,
    },
    ParticipantTimeout {
        addr: SocketAddr,
        session_id: String,
    },
    #[allow(dead_code)]
    Shutdown,
}

/// Messages sent from the main loop to the network sender task
#[derive(Debug)]
pub enum Outbound {
    Send {
        packet: Packet,
        addr: SocketAddr,
    },
    Broadcast {
        packet: Packet,
        addrs: Vec<SocketAddr>,
    },
}

/// Main server coordinating networking and session state.
///
/// The session manager is owned directly and only touched from the main
/// loop; serializing every mutation through one task is what makes
/// concurrent requests against the same session safe. Only the connection
/// registry is shared, because the timeout checker task polls it.
pub struct Server {
    socket: Arc<UdpSocket>,
    registry: Arc<RwLock<ConnectionRegistry>>,
    sessions: SessionManager,

    // Communication channels
    server_tx: mpsc::UnboundedSender<ServerMessage>,
    server_rx: mpsc::UnboundedReceiver<ServerMessage>,
    outbound_tx: mpsc::UnboundedSender<Outbound>,
    outbound_rx: mpsc::UnboundedReceiver<Outbound>,
}

impl Server {
    pub async fn new(addr: &str, grid: Grid) -> Result<Self, Box<dyn std::error::Error>> {
        let socket = Arc::new(UdpSocket::bind(addr).await?);
        info!("Server listening on {}", socket.local_addr()?);

        let (server_tx, server_rx) = mpsc::unbounded_channel();
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();

        Ok(Server {
            socket,
            registry: Arc::new(RwLock::new(ConnectionRegistry::new())),
            sessions: SessionManager::new(grid),
            server_tx,
            server_rx,
            outbound_tx,
            outbound_rx,
        })
    }

    /// The bound address, useful when the server was started on port 0.
    pub fn local_addr(&self) -> Result<SocketAddr, std::io::Error> {
        self.socket.local_addr()
    }

    /// Spawns task that continuously listens for incoming packets
    fn spawn_network_receiver(&self) {
        let socket = Arc::clone(&self.socket);
        let server_tx = self.server_tx.clone();

        tokio::spawn(async move {
            let mut buffer = vec![0u8; MAX_DATAGRAM_LEN];

            loop {
                match socket.recv_from(&mut buffer).await {
                    Ok((len, addr)) => {
                        if let Ok(packet) = deserialize::<Packet>(&buffer[0..len]) {
                            if let Err(e) =
                                server_tx.send(ServerMessage::PacketReceived { packet, addr })
                            {
                                error!("Failed to send packet to main loop: {}", e);
                                break;
                            }
                        } else {
                            warn!("Failed to deserialize packet from {}", addr);
                        }
                    }
                    Err(e) => {
                        error!("Error receiving packet: {}", e);
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    }
                }
            }
        });
    }

    /// Spawns task that drains the outgoing packet queue
    fn spawn_network_sender(&mut self) {
        let socket = Arc::clone(&self.socket);
        let mut outbound_rx = std::mem::replace(&mut self.outbound_rx, mpsc::unbounded_channel().1);

        tokio::spawn(async move {
            while let Some(message) = outbound_rx.recv().await {
                match message {
                    Outbound::Send { packet, addr } => {
                        if let Err(e) = Self::send_packet_impl(&socket, &packet, addr).await {
                            error!("Failed to send packet to {}: {}", addr, e);
                        }
                    }
                    Outbound::Broadcast { packet, addrs } => {
                        for addr in addrs {
                            if let Err(e) = Self::send_packet_impl(&socket, &packet, addr).await {
                                error!("Failed to send to participant {}: {}", addr, e);
                            }
                        }
                    }
                }
            }
        });
    }

    /// Spawns task that monitors participant timeouts
    fn spawn_timeout_checker(&self) {
        let registry = Arc::clone(&self.registry);
        let server_tx = self.server_tx.clone();

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(1));

            loop {
                interval.tick().await;

                let timed_out = {
                    let mut registry_guard = registry.write().await;
                    registry_guard.check_timeouts()
                };

                for participant in timed_out {
                    if let Err(e) = server_tx.send(ServerMessage::ParticipantTimeout {
                        addr: participant.addr,
                        session_id: participant.session_id,
                    }) {
                        error!("Failed to send timeout message: {}", e);
                        break;
                    }
                }
            }
        });
    }

    async fn send_packet_impl(
        socket: &UdpSocket,
        packet: &Packet,
        addr: SocketAddr,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let data = serialize(packet)?;
        socket.send_to(&data, addr).await?;
        Ok(())
    }

    fn send_packet(&self, packet: Packet, addr: SocketAddr) {
        if let Err(e) = self.outbound_tx.send(Outbound::Send { packet, addr }) {
            error!("Failed to queue packet for sending: {}", e);
        }
    }

    /// Queues the session's current snapshot for every participant.
    /// Called after each successful mutation.
    fn broadcast_state(&self, session_id: &str) {
        let Some(snapshot) = self.sessions.snapshot(session_id) else {
            return;
        };
        let addrs = self.sessions.participants(session_id);
        if addrs.is_empty() {
            return;
        }

        if let Err(e) = self.outbound_tx.send(Outbound::Broadcast {
            packet: Packet::State { snapshot },
            addrs,
        }) {
            error!("Failed to queue broadcast packet: {}", e);
        }
    }

    /// Detaches an address from the registry and its session.
    async fn detach(&mut self, addr: SocketAddr) {
        let removed = {
            let mut registry = self.registry.write().await;
            registry.remove(addr)
        };
        if let Some(participant) = removed {
            self.sessions
                .remove_participant(&participant.session_id, addr);
        }
    }

    /// Processes one request and updates session state
    async fn handle_packet(&mut self, packet: Packet, addr: SocketAddr) {
        {
            let mut registry = self.registry.write().await;
            registry.refresh(addr);
        }

        match packet {
            Packet::Create => {
                // An address re-creating abandons its previous membership.
                self.detach(addr).await;

                let (session_id, player_id) = self.sessions.create_session(addr);
                {
                    let mut registry = self.registry.write().await;
                    registry.register(addr, &session_id, player_id);
                }

                if let Some(snapshot) = self.sessions.snapshot(&session_id) {
                    self.send_packet(
                        Packet::Welcome {
                            session_id,
                            player_id,
                            snapshot,
                        },
                        addr,
                    );
                }
            }

            Packet::Join { session_id } => {
                self.detach(addr).await;

                match self.sessions.join_session(&session_id, addr) {
                    Ok(player_id) => {
                        {
                            let mut registry = self.registry.write().await;
                            registry.register(addr, &session_id, player_id);
                        }

                        if let Some(snapshot) = self.sessions.snapshot(&session_id) {
                            self.send_packet(
                                Packet::Welcome {
                                    session_id: session_id.clone(),
                                    player_id,
                                    snapshot,
                                },
                                addr,
                            );
                        }
                        self.broadcast_state(&session_id);
                    }
                    Err(error) => {
                        debug!("Join from {} rejected: {}", addr, error);
                        self.send_packet(Packet::Rejected { error }, addr);
                    }
                }
            }

            Packet::Start => {
                let session_id = {
                    let registry = self.registry.read().await;
                    registry.get(addr).map(|p| p.session_id.clone())
                };
                let Some(session_id) = session_id else {
                    self.send_packet(
                        Packet::Rejected {
                            error: GameError::SessionNotFound,
                        },
                        addr,
                    );
                    return;
                };

                match self.sessions.start_session(&session_id) {
                    Ok(()) => {
                        self.send_packet(Packet::Accepted, addr);
                        self.broadcast_state(&session_id);
                    }
                    Err(error) => {
                        debug!("Start from {} rejected: {}", addr, error);
                        self.send_packet(Packet::Rejected { error }, addr);
                    }
                }
            }

            Packet::Turn { line } => {
                let membership = {
                    let registry = self.registry.read().await;
                    registry
                        .get(addr)
                        .map(|p| (p.session_id.clone(), p.player_id))
                };
                let Some((session_id, player_id)) = membership else {
                    self.send_packet(
                        Packet::Rejected {
                            error: GameError::SessionNotFound,
                        },
                        addr,
                    );
                    return;
                };

                // Coordinates outside the board never reach the state
                // machine; a conforming client cannot produce them.
                match self.sessions.grid_of(&session_id) {
                    Some(grid) if grid.contains_line(line) => {}
                    Some(_) => {
                        warn!(
                            "Dropping out-of-range line {:?} from {} in session {}",
                            line, addr, session_id
                        );
                        return;
                    }
                    None => return,
                }

                match self.sessions.submit_turn(&session_id, player_id, line) {
                    Ok(outcome) => {
                        debug!(
                            "Player {} claimed {:?} in session {} (closed {} boxes)",
                            player_id,
                            line,
                            session_id,
                            outcome.boxes_closed.len()
                        );
                        self.send_packet(Packet::Accepted, addr);
                        self.broadcast_state(&session_id);
                    }
                    Err(error) => {
                        debug!("Turn from {} rejected: {}", addr, error);
                        self.send_packet(Packet::Rejected { error }, addr);
                    }
                }
            }

            Packet::Leave => {
                self.detach(addr).await;
            }

            _ => {
                warn!("Unexpected packet type from {}", addr);
            }
        }
    }

    /// Main server loop coordinating all operations
    pub async fn run(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.spawn_network_receiver();
        self.spawn_network_sender();
        self.spawn_timeout_checker();

        info!("Server started successfully");

        while let Some(message) = self.server_rx.recv().await {
            match message {
                ServerMessage::PacketReceived { packet, addr } => {
                    self.handle_packet(packet, addr).await;
                }
                ServerMessage::ParticipantTimeout { addr, session_id } => {
                    info!("Participant {} timed out", addr);
                    self.sessions.remove_participant(&session_id, addr);
                }
                ServerMessage::Shutdown => {
                    info!("Server shutting down");
                    break;
                }
            }
        }

        Ok(())
    }
}
