use anyhow::{Result, anyhow, bail};
use sketch_types::{
    ChannelKind, ClientError, DrawClientMessage, DrawPrimitive, DrawServerMessage, GamePhase,
    GameSettings, PhaseClientMessage, PhaseServerMessage, RoomSnapshot,
};
use tracing::{debug, info, warn};

use crate::canvas::{CanvasReplicator, RasterSurface};
use crate::input::{BrushSettings, InputCapture};
use crate::phase::{PhaseEffect, RoundPhase, RoundStateMachine};
use crate::scores::ScoreLedger;
use crate::timer::{GRACE_SECS, GraceCountdown, RoundTimer, now_ms};
use crate::transport::{DrawTransport, EventHub, PhaseTransport, SubscriptionId};

/// Notifications to the embedding UI. Everything the session derives is
/// readable through accessors; these just say what changed.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    RoomUpdated,
    PhaseChanged(GamePhase),
    CanvasInvalidated,
    TimerTick { remaining_secs: Option<u64> },
    TimeUp,
    GraceTick { remaining_secs: u32 },
    ConnectionChanged { channel: ChannelKind, connected: bool },
    Error(ClientError),
}

/// One member's view of a room: wires the replicator, state machine, timers,
/// ledger and input capture to the two transport channels. All handlers run
/// on the caller's (single) thread; nothing here blocks.
pub struct RoomSession<P: PhaseTransport, D: DrawTransport, R: RasterSurface> {
    room_code: String,
    user_id: String,
    username: String,
    room: Option<RoomSnapshot>,
    machine: RoundStateMachine,
    replicator: CanvasReplicator<R>,
    input: InputCapture,
    timer: RoundTimer,
    grace: GraceCountdown,
    phase_transport: P,
    draw_transport: D,
    events: EventHub<SessionEvent>,
    drawing_joined: bool,
    starting_game: bool,
    last_error: Option<String>,
    torn_down: bool,
}

impl<P: PhaseTransport, D: DrawTransport, R: RasterSurface> RoomSession<P, D, R> {
    pub fn new(
        room_code: &str,
        user_id: &str,
        username: &str,
        phase_transport: P,
        draw_transport: D,
        raster: R,
    ) -> Self {
        Self {
            room_code: room_code.to_string(),
            user_id: user_id.to_string(),
            username: username.to_string(),
            room: None,
            machine: RoundStateMachine::new(),
            replicator: CanvasReplicator::new(raster),
            input: InputCapture::new(),
            timer: RoundTimer::new(),
            grace: GraceCountdown::new(),
            phase_transport,
            draw_transport,
            events: EventHub::new(),
            drawing_joined: false,
            starting_game: false,
            last_error: None,
            torn_down: false,
        }
    }

    // --- subscriptions -----------------------------------------------------

    pub fn subscribe(&mut self, handler: impl FnMut(&SessionEvent) + 'static) -> SubscriptionId {
        self.events.subscribe(handler)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.events.unsubscribe(id)
    }

    fn emit(&mut self, event: SessionEvent) {
        self.events.emit(&event);
    }

    // --- connectivity ------------------------------------------------------

    /// Phase channel came up: announce ourselves to the room.
    pub fn on_phase_connected(&mut self) {
        if self.torn_down {
            return;
        }
        self.emit(SessionEvent::ConnectionChanged {
            channel: ChannelKind::Phase,
            connected: true,
        });
        let join = PhaseClientMessage::JoinRoom {
            room_code: self.room_code.clone(),
            user_id: self.user_id.clone(),
        };
        self.send_phase(join);
    }

    pub fn on_phase_disconnected(&mut self) {
        if self.torn_down {
            return;
        }
        self.emit(SessionEvent::ConnectionChanged {
            channel: ChannelKind::Phase,
            connected: false,
        });
        self.emit(SessionEvent::Error(ClientError::ConnectionLost {
            channel: ChannelKind::Phase,
        }));
    }

    /// Drawing channel came up; it is only joined once a game is running.
    pub fn on_draw_connected(&mut self) {
        if self.torn_down {
            return;
        }
        self.emit(SessionEvent::ConnectionChanged {
            channel: ChannelKind::Drawing,
            connected: true,
        });
        self.ensure_drawing_joined();
    }

    pub fn on_draw_disconnected(&mut self) {
        if self.torn_down {
            return;
        }
        self.drawing_joined = false;
        self.emit(SessionEvent::ConnectionChanged {
            channel: ChannelKind::Drawing,
            connected: false,
        });
        self.emit(SessionEvent::Error(ClientError::ConnectionLost {
            channel: ChannelKind::Drawing,
        }));
    }

    fn ensure_drawing_joined(&mut self) {
        let game_started = self.room.as_ref().is_some_and(|r| r.game_started);
        if self.drawing_joined || !game_started || !self.draw_transport.is_connected() {
            return;
        }
        let username = self
            .room
            .as_ref()
            .and_then(|r| r.member(&self.user_id))
            .map(|m| m.nickname.clone())
            .unwrap_or_else(|| self.username.clone());
        let join = DrawClientMessage::JoinDrawingRoom {
            room_code: self.room_code.clone(),
            user_id: self.user_id.clone(),
            username,
        };
        if self.try_send_draw(join) {
            self.drawing_joined = true;
        }
    }

    // --- inbound: phase channel --------------------------------------------

    pub fn handle_phase_event(&mut self, msg: &PhaseServerMessage) {
        if self.torn_down {
            return;
        }

        let mut room_touched = false;
        match msg {
            PhaseServerMessage::RoomJoined { room }
            | PhaseServerMessage::GameStarted { room }
            | PhaseServerMessage::WordSelected { room, .. }
            | PhaseServerMessage::NewRound { room }
            | PhaseServerMessage::GameEnded { room, .. }
            | PhaseServerMessage::GameRestarted { room } => {
                // Snapshots replace the derived view wholesale; merging is
                // what produces divergent replicas.
                self.room = Some(room.clone());
                room_touched = true;
            }
            PhaseServerMessage::UserJoined { users } | PhaseServerMessage::UserLeft { users } => {
                if let Some(room) = self.room.as_mut() {
                    room.users = users.clone();
                    room_touched = true;
                }
            }
            PhaseServerMessage::CorrectGuess {
                user_id,
                total_score,
                drawer_score,
                ..
            } => {
                if let Some(room) = self.room.as_mut() {
                    ScoreLedger::apply_correct_guess(room, user_id, *total_score, *drawer_score);
                    room_touched = true;
                }
            }
            PhaseServerMessage::Error { message } => {
                warn!(detail = %message, "phase channel error");
                self.last_error = Some(message.clone());
                self.starting_game = false;
                self.emit(SessionEvent::Error(ClientError::Protocol {
                    message: message.clone(),
                }));
            }
            PhaseServerMessage::WordOptions { .. } | PhaseServerMessage::DrawerWord { .. } => {}
        }

        match msg {
            PhaseServerMessage::GameStarted { .. } => {
                self.starting_game = false;
            }
            PhaseServerMessage::GameRestarted { .. } => {
                self.last_error = None;
            }
            _ => {}
        }
        // Covers both the start broadcast and a join into a running game.
        self.ensure_drawing_joined();

        let before = self.machine.wire_phase();
        let effects = self.machine.apply(msg);
        self.execute_effects(effects);
        let after = self.machine.wire_phase();
        if before != after {
            self.emit(SessionEvent::PhaseChanged(after));
        }
        if room_touched {
            self.emit(SessionEvent::RoomUpdated);
        }
    }

    fn execute_effects(&mut self, effects: Vec<PhaseEffect>) {
        for effect in effects {
            match effect {
                PhaseEffect::ResetCanvas => {
                    self.replicator.reset();
                    self.emit(SessionEvent::CanvasInvalidated);
                }
                PhaseEffect::ArmRoundTimer {
                    round_end_time,
                    round_duration,
                } => self.timer.arm(round_end_time, round_duration),
                PhaseEffect::DisarmRoundTimer => self.timer.disarm(),
                PhaseEffect::StartGrace => self.grace.arm(GRACE_SECS),
                PhaseEffect::CancelGrace => self.grace.cancel(),
            }
        }
    }

    // --- inbound: drawing channel ------------------------------------------

    pub fn handle_draw_event(&mut self, msg: &DrawServerMessage) {
        if self.torn_down {
            return;
        }

        match msg {
            DrawServerMessage::CanvasState { drawings } => {
                self.replicator.load_snapshot(drawings.clone());
                self.emit(SessionEvent::CanvasInvalidated);
            }
            DrawServerMessage::CanvasCleared => {
                self.replicator.reset();
                self.emit(SessionEvent::CanvasInvalidated);
            }
            DrawServerMessage::DrawStart {
                x,
                y,
                color,
                pen_size,
                user_id,
            } => {
                if self.accept_remote(user_id) {
                    self.replicator
                        .apply(DrawPrimitive::start(*x, *y, color, *pen_size, user_id));
                    self.emit(SessionEvent::CanvasInvalidated);
                }
            }
            DrawServerMessage::DrawMove {
                x,
                y,
                color,
                pen_size,
                user_id,
            } => {
                if self.accept_remote(user_id) {
                    self.replicator
                        .apply(DrawPrimitive::move_to(*x, *y, color, *pen_size, user_id));
                    self.emit(SessionEvent::CanvasInvalidated);
                }
            }
            DrawServerMessage::DrawEnd { user_id } => {
                if self.accept_remote(user_id) {
                    self.replicator.apply(DrawPrimitive::end(user_id));
                    self.emit(SessionEvent::CanvasInvalidated);
                }
            }
            DrawServerMessage::Error { message } => {
                warn!(detail = %message, "drawing channel error");
                self.emit(SessionEvent::Error(ClientError::Protocol {
                    message: message.clone(),
                }));
            }
        }
    }

    /// The server excludes the sender from broadcasts, but own echoes are
    /// dropped again here; primitives from anyone but the round's drawer
    /// are ignored.
    fn accept_remote(&self, author: &str) -> bool {
        if author == self.user_id {
            return false;
        }
        let is_drawer = self.room.as_ref().is_some_and(|r| r.is_drawer(author));
        if !is_drawer {
            debug!(author, "draw event from non-drawer; ignoring");
        }
        is_drawer
    }

    // --- pointer input (local echo + emission) ------------------------------

    pub fn can_draw(&self) -> bool {
        !self.torn_down
            && self.draw_transport.is_connected()
            && self.machine.can_draw(self.room.as_ref(), &self.user_id)
    }

    pub fn pointer_down(&mut self, x: f64, y: f64) {
        let can_draw = self.can_draw();
        if let Some(p) = self.input.pointer_down(can_draw, x, y, &self.user_id) {
            let msg = DrawClientMessage::DrawStart {
                x: p.x,
                y: p.y,
                color: p.color.clone(),
                pen_size: p.pen_size,
            };
            self.replicator.apply(p);
            self.try_send_draw(msg);
            self.emit(SessionEvent::CanvasInvalidated);
        }
    }

    pub fn pointer_move(&mut self, x: f64, y: f64) {
        let can_draw = self.can_draw();
        if let Some(p) = self.input.pointer_move(can_draw, x, y, &self.user_id) {
            let msg = DrawClientMessage::DrawMove {
                x: p.x,
                y: p.y,
                color: p.color.clone(),
                pen_size: p.pen_size,
            };
            self.replicator.apply(p);
            self.try_send_draw(msg);
            self.emit(SessionEvent::CanvasInvalidated);
        }
    }

    pub fn pointer_up(&mut self) {
        if let Some(p) = self.input.pointer_up(&self.user_id) {
            self.replicator.apply(p);
            self.try_send_draw(DrawClientMessage::DrawEnd);
            self.emit(SessionEvent::CanvasInvalidated);
        }
    }

    /// Pointer leaving the canvas is an implicit release, so remote
    /// replicas are never left with an open stroke.
    pub fn pointer_leave(&mut self) {
        self.pointer_up();
    }

    pub fn set_display_size(&mut self, width: f64, height: f64) {
        self.input.set_display_size(width, height);
    }

    pub fn set_color(&mut self, color: &str) {
        self.input.set_color(color);
        let color = color.to_string();
        self.try_send_draw(DrawClientMessage::ChangeColor { color });
    }

    pub fn set_pen_size(&mut self, size: f64) {
        self.input.set_pen_size(size);
        let size = self.input.brush().pen_size;
        self.try_send_draw(DrawClientMessage::ChangePenSize { size });
    }

    /// Drawer-only wipe request; applied when the authoritative
    /// `canvas-cleared` comes back rather than optimistically.
    pub fn request_clear(&mut self) {
        if self.can_draw() {
            self.try_send_draw(DrawClientMessage::ClearCanvas);
        }
    }

    // --- outbound game operations ------------------------------------------

    pub fn start_game(&mut self, settings: GameSettings) -> Result<()> {
        let room = self.room.as_ref().ok_or_else(|| anyhow!("not in a room"))?;
        if !room.is_host(&self.user_id) {
            bail!("only the host can start the game");
        }
        if room.game_started {
            bail!("game already started");
        }
        let problems = settings.validate(room.users.len());
        if !problems.is_empty() {
            bail!("{}", problems.join("; "));
        }

        self.starting_game = true;
        if let Err(e) = self.phase_transport.send(&PhaseClientMessage::StartGame(settings)) {
            self.starting_game = false;
            return Err(e.into());
        }
        Ok(())
    }

    pub fn select_word(&mut self, word: &str) -> Result<()> {
        let is_choosing = matches!(self.machine.phase(), RoundPhase::WordSelection { .. });
        let is_drawer = self
            .room
            .as_ref()
            .is_some_and(|r| r.is_drawer(&self.user_id));
        if !is_choosing || !is_drawer {
            bail!("not choosing a word right now");
        }
        self.phase_transport
            .send(&PhaseClientMessage::SelectWord {
                selected_word: word.to_string(),
            })
            .map_err(Into::into)
    }

    pub fn restart_game(&mut self) -> Result<()> {
        let room = self.room.as_ref().ok_or_else(|| anyhow!("not in a room"))?;
        if !room.is_host(&self.user_id) {
            bail!("only the host can restart the game");
        }
        if !matches!(self.machine.phase(), RoundPhase::GameEnd { .. }) {
            bail!("game is still running");
        }
        self.phase_transport
            .send(&PhaseClientMessage::RestartGame)
            .map_err(Into::into)
    }

    // --- clock --------------------------------------------------------------

    /// 1 Hz tick driving both countdowns. Time-up is advisory: the round
    /// only actually ends on the authoritative event.
    pub fn tick(&mut self, now_ms: i64) {
        if self.torn_down {
            return;
        }

        if self.timer.is_armed() {
            let update = self.timer.tick(now_ms);
            self.emit(SessionEvent::TimerTick {
                remaining_secs: update.remaining_secs,
            });
            if update.time_up {
                self.emit(SessionEvent::TimeUp);
                self.send_phase(PhaseClientMessage::EndRound {
                    reason: "time-up".to_string(),
                });
            }
        }

        if let Some(remaining_secs) = self.grace.tick() {
            self.emit(SessionEvent::GraceTick { remaining_secs });
        }
    }

    pub fn tick_now(&mut self) {
        self.tick(now_ms());
    }

    // --- lifecycle ----------------------------------------------------------

    /// Leave the room and tear the session down.
    pub fn leave(&mut self) {
        if self.torn_down {
            return;
        }
        self.send_phase(PhaseClientMessage::LeaveRoom);
        self.teardown();
    }

    /// Exactly-once teardown: closes both channels, cancels both countdowns
    /// and detaches every subscription. Nothing fires afterwards.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;
        self.phase_transport.close();
        self.draw_transport.close();
        self.timer.disarm();
        self.grace.cancel();
        self.events.teardown();
        info!(room_code = %self.room_code, "session torn down");
    }

    // --- accessors ----------------------------------------------------------

    pub fn room(&self) -> Option<&RoomSnapshot> {
        self.room.as_ref()
    }

    pub fn phase(&self) -> &RoundPhase {
        self.machine.phase()
    }

    pub fn wire_phase(&self) -> GamePhase {
        self.machine.wire_phase()
    }

    pub fn machine(&self) -> &RoundStateMachine {
        &self.machine
    }

    pub fn replicator(&self) -> &CanvasReplicator<R> {
        &self.replicator
    }

    pub fn brush(&self) -> &BrushSettings {
        self.input.brush()
    }

    pub fn round_timer(&self) -> &RoundTimer {
        &self.timer
    }

    pub fn grace_remaining(&self) -> Option<u32> {
        self.grace.remaining()
    }

    pub fn is_starting_game(&self) -> bool {
        self.starting_game
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn dismiss_error(&mut self) {
        self.last_error = None;
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    // --- internals ----------------------------------------------------------

    fn send_phase(&mut self, msg: PhaseClientMessage) {
        if let Err(e) = self.phase_transport.send(&msg) {
            warn!(error = %e, "phase channel send failed");
        }
    }

    fn try_send_draw(&mut self, msg: DrawClientMessage) -> bool {
        match self.draw_transport.send(&msg) {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "drawing channel send failed");
                false
            }
        }
    }
}
