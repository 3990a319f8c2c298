use std::cell::RefCell;
use std::rc::Rc;

use sketch_client::{DrawTransport, PhaseTransport, Pixmap, RoomSession, SessionEvent, TransportError};
use sketch_types::{
    DrawClientMessage, DrawServerMessage, GamePhase, Member, PhaseClientMessage,
    PhaseServerMessage, RoomSnapshot,
};

/// Route log output through the test harness.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// Shared state behind a mock channel: everything the session sent, plus
/// connectivity toggles the test can flip.
pub struct ChannelState<M> {
    pub sent: Vec<M>,
    pub connected: bool,
    pub close_count: u32,
}

pub type ChannelHandle<M> = Rc<RefCell<ChannelState<M>>>;

/// Transport double recording outbound messages in memory.
pub struct MockChannel<M> {
    state: ChannelHandle<M>,
}

pub fn mock_channel<M>() -> (MockChannel<M>, ChannelHandle<M>) {
    let state = Rc::new(RefCell::new(ChannelState {
        sent: Vec::new(),
        connected: true,
        close_count: 0,
    }));
    (
        MockChannel {
            state: state.clone(),
        },
        state,
    )
}

impl PhaseTransport for MockChannel<PhaseClientMessage> {
    fn send(&mut self, msg: &PhaseClientMessage) -> Result<(), TransportError> {
        let mut state = self.state.borrow_mut();
        if !state.connected {
            return Err(TransportError::NotConnected);
        }
        state.sent.push(msg.clone());
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.state.borrow().connected
    }

    fn close(&mut self) {
        let mut state = self.state.borrow_mut();
        state.connected = false;
        state.close_count += 1;
    }
}

impl DrawTransport for MockChannel<DrawClientMessage> {
    fn send(&mut self, msg: &DrawClientMessage) -> Result<(), TransportError> {
        let mut state = self.state.borrow_mut();
        if !state.connected {
            return Err(TransportError::NotConnected);
        }
        state.sent.push(msg.clone());
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.state.borrow().connected
    }

    fn close(&mut self) {
        let mut state = self.state.borrow_mut();
        state.connected = false;
        state.close_count += 1;
    }
}

pub type TestSession =
    RoomSession<MockChannel<PhaseClientMessage>, MockChannel<DrawClientMessage>, Pixmap>;

/// A session wired to mock channels and an event collector.
pub struct Harness {
    pub session: TestSession,
    pub phase: ChannelHandle<PhaseClientMessage>,
    pub draw: ChannelHandle<DrawClientMessage>,
    pub events: Rc<RefCell<Vec<SessionEvent>>>,
}

impl Harness {
    pub fn new(user_id: &str, nickname: &str) -> Self {
        init_tracing();
        let (phase_transport, phase) = mock_channel();
        let (draw_transport, draw) = mock_channel();
        let mut session = RoomSession::new(
            "AB12",
            user_id,
            nickname,
            phase_transport,
            draw_transport,
            Pixmap::canvas_sized(),
        );
        let events: Rc<RefCell<Vec<SessionEvent>>> = Rc::new(RefCell::new(Vec::new()));
        let sink = events.clone();
        session.subscribe(move |event: &SessionEvent| sink.borrow_mut().push(event.clone()));
        Self {
            session,
            phase,
            draw,
            events,
        }
    }

    /// Connect both channels and adopt the given room snapshot, then drain
    /// the buffers so tests only see what they trigger themselves.
    pub fn joined(user_id: &str, nickname: &str, room: RoomSnapshot) -> Self {
        let mut harness = Self::new(user_id, nickname);
        harness.session.on_phase_connected();
        harness.session.on_draw_connected();
        harness
            .session
            .handle_phase_event(&PhaseServerMessage::RoomJoined { room });
        harness.drain();
        harness
    }

    pub fn phase_sent(&self) -> Vec<PhaseClientMessage> {
        self.phase.borrow().sent.clone()
    }

    pub fn draw_sent(&self) -> Vec<DrawClientMessage> {
        self.draw.borrow().sent.clone()
    }

    pub fn collected(&self) -> Vec<SessionEvent> {
        self.events.borrow().clone()
    }

    pub fn has_event(&self, check_fn: impl Fn(&SessionEvent) -> bool) -> bool {
        self.events.borrow().iter().any(check_fn)
    }

    /// Clear sent-message and event buffers.
    pub fn drain(&mut self) {
        self.phase.borrow_mut().sent.clear();
        self.draw.borrow_mut().sent.clear();
        self.events.borrow_mut().clear();
    }
}

pub fn fresh_user_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

pub fn test_member(id: &str, nickname: &str, is_host: bool) -> Member {
    Member {
        id: id.to_string(),
        nickname: nickname.to_string(),
        is_host,
        score: 0,
        joined_at: 0,
    }
}

/// Two-member room (host "alice", guest "bea") in the given phase.
pub fn test_room(phase: Option<GamePhase>, drawer: Option<&str>) -> RoomSnapshot {
    RoomSnapshot {
        users: vec![
            test_member("alice", "Alice", true),
            test_member("bea", "Bea", false),
        ],
        created_at: 0,
        game_started: phase.is_some_and(|p| p != GamePhase::Waiting),
        rounds: 3,
        current_round: 1,
        current_drawer: drawer.map(str::to_string),
        max_players: Some(8),
        round_duration: Some(60),
        game_phase: phase,
        round_start_time: None,
        round_end_time: None,
    }
}

pub fn word_selected(room: RoomSnapshot, round_end_time: Option<i64>) -> PhaseServerMessage {
    PhaseServerMessage::WordSelected {
        room,
        word_display: "____".to_string(),
        round_duration: 60,
        round_end_time,
    }
}

/// Replay one session's outbound draw traffic as the broadcast another
/// session would receive, stamped with the author's id.
pub fn relay_draw(sent: &[DrawClientMessage], author: &str) -> Vec<DrawServerMessage> {
    sent.iter()
        .filter_map(|msg| match msg {
            DrawClientMessage::DrawStart {
                x,
                y,
                color,
                pen_size,
            } => Some(DrawServerMessage::DrawStart {
                x: *x,
                y: *y,
                color: color.clone(),
                pen_size: *pen_size,
                user_id: author.to_string(),
            }),
            DrawClientMessage::DrawMove {
                x,
                y,
                color,
                pen_size,
            } => Some(DrawServerMessage::DrawMove {
                x: *x,
                y: *y,
                color: color.clone(),
                pen_size: *pen_size,
                user_id: author.to_string(),
            }),
            DrawClientMessage::DrawEnd => Some(DrawServerMessage::DrawEnd {
                user_id: author.to_string(),
            }),
            DrawClientMessage::ClearCanvas => Some(DrawServerMessage::CanvasCleared),
            _ => None,
        })
        .collect()
}
