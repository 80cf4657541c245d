//! Room actor implementation with async message handling.

use rand::{SeedableRng, rngs::StdRng};
use std::{collections::HashMap, sync::Arc, time::Duration};
use tokio::sync::{RwLock, mpsc, oneshot};

use super::{
    config::RoomConfig,
    messages::{RoomMessage, RoomResponse, RoomSummary},
};
use crate::{
    bot::BotDecisionMaker,
    game::{
        ConnectionId, GameError, GameResult, Outbound, Player, PlayerId, Recipient, Room,
        ServerEvent,
    },
    store::RoomRepository,
};

/// Room code to live actor handle.
pub type RoomRegistry = Arc<RwLock<HashMap<String, RoomHandle>>>;

/// Room actor handle for sending messages
#[derive(Clone, Debug)]
pub struct RoomHandle {
    sender: mpsc::Sender<RoomMessage>,
    code: String,
    instance: u64,
}

impl RoomHandle {
    /// Create a new room handle
    pub fn new(sender: mpsc::Sender<RoomMessage>, code: String, instance: u64) -> Self {
        Self {
            sender,
            code,
            instance,
        }
    }

    /// Get room code
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Identifies the actor behind this handle; a code can be reused by a
    /// later actor once the previous one has closed.
    pub fn instance(&self) -> u64 {
        self.instance
    }

    /// Whether the actor has stopped
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    /// Send a message to the room
    pub async fn send(&self, message: RoomMessage) -> GameResult<()> {
        self.sender
            .send(message)
            .await
            .map_err(|_| GameError::RoomNotFound)
    }

    /// Send a message carrying a response channel and wait for the reply
    pub async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> RoomMessage,
    ) -> GameResult<T> {
        let (tx, rx) = oneshot::channel();
        self.send(build(tx)).await?;
        rx.await.map_err(|_| GameError::RoomNotFound)
    }
}

/// Room actor owning a single room
pub struct RoomActor {
    /// Room code
    code: String,

    /// Distinguishes this actor from earlier ones for the same code
    instance: u64,

    /// Room configuration
    config: RoomConfig,

    /// Game state; `None` until the first join (or a restored snapshot)
    room: Option<Room>,

    /// Message inbox
    inbox: mpsc::Receiver<RoomMessage>,

    /// Used to schedule bot turns and expiry without keeping the actor alive
    self_sender: mpsc::WeakSender<RoomMessage>,

    /// Snapshot store
    store: Arc<dyn RoomRepository>,

    /// Registry to remove ourselves from on close
    registry: RoomRegistry,

    /// Bot brain
    bots: BotDecisionMaker,

    /// Shuffling randomness
    rng: StdRng,

    /// Event channels of connected players
    subscribers: HashMap<ConnectionId, mpsc::Sender<ServerEvent>>,

    /// Whether the post-match expiry has been scheduled
    expiry_scheduled: bool,

    /// Is room closed
    is_closed: bool,
}

impl RoomActor {
    /// Create a new room actor
    ///
    /// # Arguments
    ///
    /// * `code` - Room code
    /// * `instance` - Unique actor instance number
    /// * `config` - Room configuration
    /// * `store` - Snapshot store
    /// * `registry` - Registry the actor unregisters from when it closes
    ///
    /// # Returns
    ///
    /// * `(RoomActor, RoomHandle)` - Actor and handle for sending messages
    pub fn new(
        code: String,
        instance: u64,
        config: RoomConfig,
        store: Arc<dyn RoomRepository>,
        registry: RoomRegistry,
    ) -> (Self, RoomHandle) {
        let (sender, inbox) = mpsc::channel(config.inbox_capacity);

        let (bots, rng) = match config.seed {
            Some(seed) => (
                BotDecisionMaker::with_seed(seed, config.bot.clone()),
                StdRng::seed_from_u64(seed),
            ),
            None => (
                BotDecisionMaker::with_config(config.bot.clone()),
                StdRng::from_os_rng(),
            ),
        };

        let actor = Self {
            code: code.clone(),
            instance,
            config,
            room: None,
            inbox,
            self_sender: sender.downgrade(),
            store,
            registry,
            bots,
            rng,
            subscribers: HashMap::new(),
            expiry_scheduled: false,
            is_closed: false,
        };

        let handle = RoomHandle::new(sender, code, instance);

        (actor, handle)
    }

    /// Run the room actor event loop
    pub async fn run(mut self) {
        log::info!("Room {} starting", self.code);
        metrics::gauge!("bluffmaster_active_rooms").increment(1.0);

        self.restore().await;

        while let Some(message) = self.inbox.recv().await {
            self.handle_message(message).await;

            // Nobody left to play for. A room with seats still waiting for
            // their owners stays in the store and comes back on rejoin.
            if !self.is_closed && !self.has_connected_humans() {
                if self.room.is_some() {
                    log::info!(
                        "Room {}: no connected players, parking snapshot",
                        self.code
                    );
                }
                self.is_closed = true;
            }

            if self.is_closed {
                break;
            }
        }

        self.unregister().await;
        metrics::gauge!("bluffmaster_active_rooms").decrement(1.0);
        log::info!("Room {} closed", self.code);
    }

    /// Handle a room message
    async fn handle_message(&mut self, message: RoomMessage) {
        match message {
            RoomMessage::Join {
                player_name,
                connection,
                sender,
                response,
            } => {
                let result = self.handle_join(&player_name, connection, sender).await;
                let _ = response.send(result);
            }

            RoomMessage::Rejoin {
                player_id,
                rejoin_token,
                connection,
                sender,
                response,
            } => {
                let result = self
                    .handle_rejoin(player_id, &rejoin_token, connection, sender)
                    .await;
                let _ = response.send(result);
            }

            RoomMessage::AddBot {
                connection,
                response,
            } => {
                let result = self
                    .apply_as(connection, |room, actor, _| {
                        room.add_bot(actor).map(|(_, events)| events)
                    })
                    .await;
                let _ = response.send(result.into());
            }

            RoomMessage::StartGame {
                connection,
                response,
            } => {
                let result = self
                    .apply_as(connection, |room, actor, rng| room.start(actor, rng))
                    .await;
                let _ = response.send(result.into());
            }

            RoomMessage::PlayCards {
                connection,
                cards,
                claimed_rank,
                response,
            } => {
                let result = self
                    .apply_as(connection, |room, actor, _| {
                        room.play(actor, &cards, claimed_rank.as_deref())
                    })
                    .await;
                let _ = response.send(result.into());
            }

            RoomMessage::CallBluff {
                connection,
                response,
            } => {
                let result = self
                    .apply_as(connection, |room, actor, _| room.call_bluff(actor))
                    .await;
                let _ = response.send(result.into());
            }

            RoomMessage::Pass {
                connection,
                response,
            } => {
                let result = self
                    .apply_as(connection, |room, actor, _| room.pass(actor))
                    .await;
                let _ = response.send(result.into());
            }

            RoomMessage::Disconnect {
                connection,
                response,
            } => {
                let result = self.handle_disconnect(connection).await;
                let _ = response.send(result.into());
            }

            RoomMessage::GetState { response } => {
                let _ = response.send(self.room.as_ref().map(Room::view));
            }

            RoomMessage::GetSummary { response } => {
                let _ = response.send(self.summary());
            }

            RoomMessage::BotTurn { version } => {
                self.handle_bot_turn(version).await;
            }

            RoomMessage::Expire => {
                if self.room.as_ref().is_some_and(Room::is_ended) {
                    log::info!("Room {}: grace period over, removing room", self.code);
                    self.destroy().await;
                }
            }

            RoomMessage::Shutdown { response } => {
                self.is_closed = true;
                let _ = response.send(RoomResponse::Success);
            }
        }
    }

    /// Load a snapshot left by an earlier process, if any
    async fn restore(&mut self) {
        match self.store.load(&self.code).await {
            Ok(Some(room)) => {
                log::info!(
                    "Room {} restored from snapshot (version {}, {} players)",
                    self.code,
                    room.version,
                    room.players.len()
                );
                self.room = Some(room);
                self.schedule_follow_up();
            }
            Ok(None) => {}
            Err(e) => {
                log::error!("Room {}: failed to load snapshot: {}", self.code, e);
                metrics::counter!("bluffmaster_store_failures_total", "op" => "load")
                    .increment(1);
            }
        }
    }

    async fn handle_join(
        &mut self,
        player_name: &str,
        connection: ConnectionId,
        sender: mpsc::Sender<ServerEvent>,
    ) -> RoomResponse {
        let room = self
            .room
            .get_or_insert_with(|| Room::new(self.code.clone(), self.config.max_players));

        match room.join(connection, player_name) {
            Ok((player_id, events)) => {
                self.subscribers.insert(connection, sender);
                self.after_transition(events).await;
                RoomResponse::Joined { player_id }
            }
            Err(e) => {
                if room.players.is_empty() {
                    self.room = None;
                }
                RoomResponse::Error(e)
            }
        }
    }

    async fn handle_rejoin(
        &mut self,
        player_id: PlayerId,
        rejoin_token: &str,
        connection: ConnectionId,
        sender: mpsc::Sender<ServerEvent>,
    ) -> RoomResponse {
        let Some(room) = self.room.as_mut() else {
            return RoomResponse::Error(GameError::RoomNotFound);
        };
        if let Err(e) = room.authorize_rejoin(&player_id, rejoin_token) {
            return RoomResponse::Error(e);
        }

        let previous = room.player(&player_id).and_then(Player::connection);
        let still_connected = previous
            .filter(|prev| *prev != connection)
            .and_then(|prev| self.subscribers.get(&prev))
            .is_some_and(|sender| !sender.is_closed());
        if still_connected {
            return RoomResponse::Error(GameError::DuplicateJoin);
        }

        match room.rejoin(&player_id, rejoin_token, connection) {
            Ok(events) => {
                if let Some(prev) = previous {
                    self.subscribers.remove(&prev);
                }
                self.subscribers.insert(connection, sender);
                self.after_transition(events).await;
                RoomResponse::Joined { player_id }
            }
            Err(e) => RoomResponse::Error(e),
        }
    }

    async fn handle_disconnect(&mut self, connection: ConnectionId) -> GameResult<()> {
        self.subscribers.remove(&connection);
        let room = self.room.as_mut().ok_or(GameError::RoomNotFound)?;
        let events = room.disconnect(connection)?;
        self.after_transition(events).await;
        Ok(())
    }

    /// Run a transition on behalf of the player seated at `connection`
    async fn apply_as<F>(&mut self, connection: ConnectionId, transition: F) -> GameResult<()>
    where
        F: FnOnce(&mut Room, &PlayerId, &mut StdRng) -> GameResult<Vec<Outbound>>,
    {
        let room = self.room.as_mut().ok_or(GameError::RoomNotFound)?;
        let actor = room
            .player_by_connection(connection)
            .map(|p| p.id.clone())
            .ok_or(GameError::NotInRoom)?;
        let events = transition(room, &actor, &mut self.rng)?;
        self.after_transition(events).await;
        Ok(())
    }

    async fn handle_bot_turn(&mut self, version: u64) {
        let Some(room) = self.room.as_mut() else {
            return;
        };
        if room.version != version {
            log::debug!(
                "Room {}: dropping stale bot turn (scheduled at {}, now {})",
                self.code,
                version,
                room.version
            );
            return;
        }
        let Some(bot_id) = room.bot_to_act() else {
            return;
        };

        let chosen = self.bots.decide(room, &bot_id);
        log::debug!("Room {}: {} chose {:?}", self.code, bot_id, chosen);

        match room.apply_bot_move(&bot_id, chosen) {
            Ok(events) => self.after_transition(events).await,
            Err(e) => log::error!("Room {}: {} could not move: {}", self.code, bot_id, e),
        }
    }

    /// Deliver events, persist, and schedule whatever comes next
    async fn after_transition(&mut self, events: Vec<Outbound>) {
        record_metrics(&events);
        self.dispatch(events);

        let Some(room) = self.room.as_ref() else {
            return;
        };
        if room.human_count() == 0 {
            log::info!("Room {}: no human players left", self.code);
            self.destroy().await;
            return;
        }

        if let Err(e) = self.store.save(room).await {
            log::error!("Room {}: failed to save snapshot: {}", self.code, e);
            metrics::counter!("bluffmaster_store_failures_total", "op" => "save").increment(1);
        }

        self.schedule_follow_up();
    }

    /// Queue the next bot turn, or the expiry of an ended match
    fn schedule_follow_up(&mut self) {
        let Some(room) = self.room.as_ref() else {
            return;
        };
        if room.is_ended() {
            if !self.expiry_scheduled {
                self.expiry_scheduled = true;
                self.schedule(RoomMessage::Expire, self.config.end_grace);
            }
        } else if room.bot_to_act().is_some() {
            self.schedule(
                RoomMessage::BotTurn {
                    version: room.version,
                },
                self.config.bot_delay,
            );
        }
    }

    fn schedule(&self, message: RoomMessage, delay: Duration) {
        let sender = self.self_sender.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(sender) = sender.upgrade() {
                let _ = sender.send(message).await;
            }
        });
    }

    /// Send events to their recipients
    fn dispatch(&mut self, events: Vec<Outbound>) {
        for outbound in events {
            match outbound.recipient {
                Recipient::Room => self.broadcast(outbound.event),
                Recipient::Player(player_id) => {
                    let connection = self
                        .room
                        .as_ref()
                        .and_then(|room| room.player(&player_id))
                        .and_then(Player::connection);
                    if let Some(connection) = connection {
                        self.send_to(connection, outbound.event);
                    }
                }
            }
        }
    }

    fn broadcast(&mut self, event: ServerEvent) {
        self.subscribers
            .retain(|connection, sender| match sender.try_send(event.clone()) {
                Ok(_) => true,
                Err(mpsc::error::TrySendError::Full(_)) => {
                    log::warn!(
                        "Subscriber {} channel full, dropping {}",
                        connection,
                        event.name()
                    );
                    true
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    log::debug!("Subscriber {} disconnected, removing", connection);
                    false
                }
            });
    }

    fn send_to(&mut self, connection: ConnectionId, event: ServerEvent) {
        let Some(sender) = self.subscribers.get(&connection) else {
            return;
        };
        match sender.try_send(event) {
            Ok(_) => {}
            Err(mpsc::error::TrySendError::Full(event)) => {
                log::warn!(
                    "Subscriber {} channel full, dropping {}",
                    connection,
                    event.name()
                );
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                self.subscribers.remove(&connection);
            }
        }
    }

    /// Whether some human seat is bound to a live subscriber
    fn has_connected_humans(&self) -> bool {
        let Some(room) = self.room.as_ref() else {
            return false;
        };
        room.players
            .iter()
            .filter_map(Player::connection)
            .any(|connection| {
                self.subscribers
                    .get(&connection)
                    .is_some_and(|sender| !sender.is_closed())
            })
    }

    fn summary(&self) -> Option<RoomSummary> {
        self.room.as_ref().map(|room| RoomSummary {
            code: room.code.clone(),
            player_count: room.players.len(),
            max_players: room.max_players,
            phase: room.phase,
            updated_at: room.updated_at,
        })
    }

    /// Drop the snapshot and stop
    async fn destroy(&mut self) {
        if let Err(e) = self.store.delete(&self.code).await {
            log::error!("Room {}: failed to delete snapshot: {}", self.code, e);
            metrics::counter!("bluffmaster_store_failures_total", "op" => "delete").increment(1);
        }
        self.is_closed = true;
    }

    async fn unregister(&self) {
        let mut rooms = self.registry.write().await;
        if rooms
            .get(&self.code)
            .is_some_and(|handle| handle.instance() == self.instance)
        {
            rooms.remove(&self.code);
        }
    }
}

fn record_metrics(events: &[Outbound]) {
    for outbound in events {
        match &outbound.event {
            ServerEvent::GameStarted => {
                metrics::counter!("bluffmaster_games_started_total").increment(1);
            }
            ServerEvent::GameOver { .. } => {
                metrics::counter!("bluffmaster_games_finished_total").increment(1);
            }
            ServerEvent::BluffCalled { was_bluff, .. } => {
                let outcome = if *was_bluff { "bluff" } else { "truthful" };
                metrics::counter!("bluffmaster_bluff_calls_total", "outcome" => outcome)
                    .increment(1);
            }
            _ => {}
        }
    }
}
