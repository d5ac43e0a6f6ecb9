//! WebSocket server and connection handling.

use crate::lobby::{Lobby, LobbyError, Update};
use crate::protocol::{ClientMessage, ServerMessage};
use dashmap::DashMap;
use futures_util::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::Arc;
use tictactoe_core::{Game, PlayerId};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::{accept_async, tungstenite::Message};
use tracing::{error, info, warn};
use uuid::Uuid;

/// Server state shared across all connections.
pub struct ServerState {
    /// Games and stats
    pub lobby: Lobby,
    /// Mapping from player ID to their message sender
    pub player_senders: DashMap<PlayerId, mpsc::UnboundedSender<ServerMessage>>,
}

impl ServerState {
    pub fn new() -> Self {
        Self {
            lobby: Lobby::new(),
            player_senders: DashMap::new(),
        }
    }

    /// Send a message to a specific player.
    pub fn send_to_player(&self, player_id: PlayerId, msg: ServerMessage) {
        if let Some(sender) = self.player_senders.get(&player_id) {
            let _ = sender.send(msg);
        }
    }

    /// Send a message to both seats of a game.
    pub fn broadcast_to_game(&self, game: &Game, msg: ServerMessage) {
        self.send_to_player(game.player_one, msg.clone());
        if let Some(two) = game.player_two {
            self.send_to_player(two, msg);
        }
    }

    /// Push current stats to both players of a finished game.
    fn send_final_stats(&self, game: &Game) {
        for player in std::iter::once(game.player_one).chain(game.player_two) {
            if let Some(stats) = self.lobby.stats(player) {
                self.send_to_player(player, ServerMessage::Stats { stats });
            }
        }
    }

    fn send_error(&self, player_id: PlayerId, err: LobbyError) {
        let msg = match err {
            LobbyError::Rejected(e) => ServerMessage::Rejected {
                code: e.code().to_string(),
                message: e.to_string(),
            },
            LobbyError::GameNotFound => ServerMessage::Error {
                message: "Game not found".to_string(),
            },
            LobbyError::StatsMissing(missing) => {
                error!("Stats record missing for {}", missing);
                ServerMessage::Error {
                    message: "Internal error".to_string(),
                }
            }
        };
        self.send_to_player(player_id, msg);
    }
}

impl Default for ServerState {
    fn default() -> Self {
        Self::new()
    }
}

/// Run the WebSocket server.
pub async fn run_server(addr: SocketAddr, state: Arc<ServerState>) -> anyhow::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!("Tic-tac-toe server listening on {}", addr);

    while let Ok((stream, peer_addr)) = listener.accept().await {
        let state = Arc::clone(&state);
        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream, peer_addr, state).await {
                error!("Connection error from {}: {}", peer_addr, e);
            }
        });
    }

    Ok(())
}

/// Handle a single WebSocket connection.
async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    state: Arc<ServerState>,
) -> anyhow::Result<()> {
    let ws_stream = accept_async(stream).await?;
    info!("New WebSocket connection from {}", addr);

    let (mut ws_sender, mut ws_receiver) = ws_stream.split();

    // The connection is the authenticated identity until it resumes an earlier one;
    // registering it creates its stats
    let mut player_id = Uuid::new_v4();
    state.lobby.register(player_id);

    // Create channel for outgoing messages
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();
    state.player_senders.insert(player_id, tx.clone());

    let own_sender = tx.clone();

    // Send welcome message
    let welcome = ServerMessage::Welcome { player_id };
    let msg_text = serde_json::to_string(&welcome)?;
    ws_sender.send(Message::Text(msg_text)).await?;

    // Spawn task to forward messages from channel to WebSocket
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if let Ok(text) = serde_json::to_string(&msg) {
                if ws_sender.send(Message::Text(text)).await.is_err() {
                    break;
                }
            }
        }
    });

    // Handle incoming messages
    while let Some(msg) = ws_receiver.next().await {
        match msg {
            Ok(Message::Text(text)) => match serde_json::from_str::<ClientMessage>(&text) {
                Ok(client_msg) => handle_message(&mut player_id, client_msg, &state),
                Err(e) => {
                    warn!("Invalid message from {}: {}", player_id, e);
                    state.send_to_player(
                        player_id,
                        ServerMessage::Error {
                            message: format!("Invalid message: {}", e),
                        },
                    );
                }
            },
            Ok(Message::Close(_)) => {
                info!("Client {} closing connection", player_id);
                break;
            }
            Ok(Message::Ping(_)) => {
                state.send_to_player(player_id, ServerMessage::Pong);
            }
            Err(e) => {
                error!("WebSocket error from {}: {}", player_id, e);
                break;
            }
            _ => {}
        }
    }

    // Games and stats outlive the connection; a newer connection may own the identity now
    state
        .player_senders
        .remove_if(&player_id, |_, sender| sender.same_channel(&own_sender));
    send_task.abort();

    info!("Connection closed for {}", player_id);
    Ok(())
}

/// Move this connection's sender over to a registered identity.
fn resume(state: &ServerState, player_id: &mut PlayerId, requested: PlayerId) {
    if !state.lobby.is_registered(requested) {
        state.send_to_player(
            *player_id,
            ServerMessage::Error {
                message: "Player not found".to_string(),
            },
        );
        return;
    }

    if requested != *player_id {
        if let Some((_, sender)) = state.player_senders.remove(player_id) {
            state.player_senders.insert(requested, sender);
        }
        info!("Connection for {} resumed as {}", player_id, requested);
        *player_id = requested;
    }

    state.send_to_player(requested, ServerMessage::Welcome { player_id: requested });
}

/// Handle a client message.
fn handle_message(identity: &mut PlayerId, msg: ClientMessage, state: &ServerState) {
    let player_id = *identity;
    match msg {
        ClientMessage::Resume {
            player_id: requested,
        } => resume(state, identity, requested),

        ClientMessage::CreateGame => match state.lobby.create_game(player_id) {
            Ok(game) => state.send_to_player(player_id, ServerMessage::GameCreated { game }),
            Err(e) => state.send_error(player_id, e),
        },

        ClientMessage::JoinGame { game_id } => {
            match state
                .lobby
                .join_game(game_id, player_id, &mut rand::thread_rng())
            {
                Ok(update) => publish_update(state, update),
                Err(e) => {
                    warn!("Join of {} by {} refused: {}", game_id, player_id, e);
                    state.send_error(player_id, e);
                }
            }
        }

        ClientMessage::Move { game_id, square } => {
            match state.lobby.submit_move(game_id, player_id, &square) {
                Ok(update) => {
                    let finished = update.game.is_finished();
                    let game = update.game.clone();
                    publish_update(state, update);
                    if finished {
                        state.send_final_stats(&game);
                    }
                }
                Err(e) => state.send_error(player_id, e),
            }
        }

        ClientMessage::ListGames => {
            let games = state.lobby.joinable_games(player_id);
            state.send_to_player(player_id, ServerMessage::GameList { games });
        }

        ClientMessage::MyGames => {
            let games = state.lobby.games_of(player_id);
            state.send_to_player(player_id, ServerMessage::GameList { games });
        }

        ClientMessage::GetGame { game_id } => match state.lobby.game(game_id) {
            Some(game) => state.send_to_player(player_id, ServerMessage::GameState { game }),
            None => state.send_error(player_id, LobbyError::GameNotFound),
        },

        ClientMessage::GetStats { player_id: target } => {
            let target = target.unwrap_or(player_id);
            match state.lobby.stats(target) {
                Some(stats) => state.send_to_player(player_id, ServerMessage::Stats { stats }),
                None => state.send_to_player(
                    player_id,
                    ServerMessage::Error {
                        message: "Player not found".to_string(),
                    },
                ),
            }
        }

        ClientMessage::ListStats => {
            let stats = state.lobby.all_stats();
            state.send_to_player(player_id, ServerMessage::StatsList { stats });
        }

        ClientMessage::Ping => {
            state.send_to_player(player_id, ServerMessage::Pong);
        }
    }
}

/// Tell both players about an accepted join or move.
fn publish_update(state: &ServerState, update: Update) {
    let Update { game, events } = update;
    let msg = ServerMessage::GameUpdated {
        game: game.clone(),
        events,
    };
    state.broadcast_to_game(&game, msg);
}
