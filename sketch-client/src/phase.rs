use sketch_types::{FinalScore, GamePhase, PhaseServerMessage, RoomSnapshot, WinnerEntry};
use tracing::{debug, info};

/// Local round state with phase-specific data. The drawer's plain word is
/// kept outside the variant: it arrives on its own `drawer-word` event and
/// must survive whatever ordering the channel delivers it in.
#[derive(Debug, Clone, PartialEq)]
pub enum RoundPhase {
    Waiting,
    /// The drawer sees candidate words; everyone else an empty list.
    WordSelection { word_options: Vec<String> },
    Drawing {
        /// Masked word shown to guessers; absent for the drawer and for
        /// mid-round joiners (the backend never re-sends it).
        word_display: Option<String>,
        round_end_time: Option<i64>,
        round_duration: u64,
    },
    RoundEnd,
    GameEnd {
        winners: Vec<WinnerEntry>,
        final_scores: Vec<FinalScore>,
    },
}

impl RoundPhase {
    pub fn wire(&self) -> GamePhase {
        match self {
            RoundPhase::Waiting => GamePhase::Waiting,
            RoundPhase::WordSelection { .. } => GamePhase::WordSelection,
            RoundPhase::Drawing { .. } => GamePhase::Drawing,
            RoundPhase::RoundEnd => GamePhase::RoundEnd,
            RoundPhase::GameEnd { .. } => GamePhase::GameEnd,
        }
    }
}

/// Side effects a transition asks the session to carry out.
#[derive(Debug, Clone, PartialEq)]
pub enum PhaseEffect {
    ResetCanvas,
    ArmRoundTimer {
        round_end_time: i64,
        round_duration: u64,
    },
    DisarmRoundTimer,
    StartGrace,
    CancelGrace,
}

/// Single source of truth for what the UI is permitted to do. Every
/// transition is driven by an authoritative inbound event and applied as a
/// full replacement of the derived state, which makes transitions idempotent
/// and immune to client clock or delivery skew.
pub struct RoundStateMachine {
    phase: RoundPhase,
    drawer_word: Option<String>,
}

impl Default for RoundStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl RoundStateMachine {
    pub fn new() -> Self {
        Self {
            phase: RoundPhase::Waiting,
            drawer_word: None,
        }
    }

    pub fn phase(&self) -> &RoundPhase {
        &self.phase
    }

    pub fn wire_phase(&self) -> GamePhase {
        self.phase.wire()
    }

    pub fn drawer_word(&self) -> Option<&str> {
        self.drawer_word.as_deref()
    }

    pub fn word_display(&self) -> Option<&str> {
        match &self.phase {
            RoundPhase::Drawing { word_display, .. } => word_display.as_deref(),
            _ => None,
        }
    }

    /// `can_draw` holds iff the phase is drawing and the local member is the
    /// round's drawer.
    pub fn can_draw(&self, room: Option<&RoomSnapshot>, local_id: &str) -> bool {
        matches!(self.phase, RoundPhase::Drawing { .. })
            && room.is_some_and(|r| r.game_started && r.is_drawer(local_id))
    }

    fn transition(&mut self, next: RoundPhase) {
        if self.phase != next {
            info!(from = ?self.phase.wire(), to = ?next.wire(), "phase transition");
        }
        self.phase = next;
    }

    /// The single transition function. Returns the effects the session must
    /// execute; events that do not transition return no effects.
    pub fn apply(&mut self, event: &PhaseServerMessage) -> Vec<PhaseEffect> {
        match event {
            PhaseServerMessage::RoomJoined { room } => self.sync_from_room(room),
            PhaseServerMessage::UserJoined { .. } | PhaseServerMessage::UserLeft { .. } => {
                Vec::new()
            }
            PhaseServerMessage::GameStarted { .. } => {
                self.drawer_word = None;
                self.transition(RoundPhase::WordSelection {
                    word_options: Vec::new(),
                });
                vec![PhaseEffect::DisarmRoundTimer, PhaseEffect::CancelGrace]
            }
            PhaseServerMessage::WordOptions { words } => {
                self.transition(RoundPhase::WordSelection {
                    word_options: words.clone(),
                });
                vec![PhaseEffect::DisarmRoundTimer]
            }
            PhaseServerMessage::WordSelected {
                word_display,
                round_duration,
                round_end_time,
                ..
            } => {
                self.transition(RoundPhase::Drawing {
                    word_display: Some(word_display.clone()),
                    round_end_time: *round_end_time,
                    round_duration: *round_duration,
                });
                let timer = match round_end_time {
                    Some(end) => PhaseEffect::ArmRoundTimer {
                        round_end_time: *end,
                        round_duration: *round_duration,
                    },
                    None => PhaseEffect::DisarmRoundTimer,
                };
                vec![timer, PhaseEffect::CancelGrace]
            }
            PhaseServerMessage::DrawerWord { word } => {
                self.drawer_word = Some(word.clone());
                Vec::new()
            }
            PhaseServerMessage::CorrectGuess { .. } => {
                self.transition(RoundPhase::RoundEnd);
                vec![PhaseEffect::DisarmRoundTimer, PhaseEffect::StartGrace]
            }
            PhaseServerMessage::NewRound { .. } => {
                self.drawer_word = None;
                self.transition(RoundPhase::WordSelection {
                    word_options: Vec::new(),
                });
                vec![
                    PhaseEffect::ResetCanvas,
                    PhaseEffect::DisarmRoundTimer,
                    PhaseEffect::CancelGrace,
                ]
            }
            PhaseServerMessage::GameEnded {
                winner,
                winners,
                final_scores,
                ..
            } => {
                self.drawer_word = None;
                let winners = winners
                    .clone()
                    .unwrap_or_else(|| vec![winner.clone()]);
                self.transition(RoundPhase::GameEnd {
                    winners,
                    final_scores: final_scores.clone(),
                });
                vec![
                    PhaseEffect::ResetCanvas,
                    PhaseEffect::DisarmRoundTimer,
                    PhaseEffect::CancelGrace,
                ]
            }
            PhaseServerMessage::GameRestarted { .. } => {
                self.drawer_word = None;
                self.transition(RoundPhase::Waiting);
                vec![
                    PhaseEffect::ResetCanvas,
                    PhaseEffect::DisarmRoundTimer,
                    PhaseEffect::CancelGrace,
                ]
            }
            PhaseServerMessage::Error { .. } => Vec::new(),
        }
    }

    /// Adopt the wire phase carried by a room snapshot. Used on join, so a
    /// client arriving mid-round lands in the right phase; the snapshot is
    /// always trusted over whatever we derived before.
    pub fn sync_from_room(&mut self, room: &RoomSnapshot) -> Vec<PhaseEffect> {
        let Some(wire) = room.game_phase else {
            debug!("room snapshot carries no phase; keeping current");
            return Vec::new();
        };

        match wire {
            GamePhase::Waiting => {
                self.transition(RoundPhase::Waiting);
                vec![PhaseEffect::DisarmRoundTimer, PhaseEffect::CancelGrace]
            }
            GamePhase::WordSelection => {
                self.transition(RoundPhase::WordSelection {
                    word_options: Vec::new(),
                });
                vec![PhaseEffect::DisarmRoundTimer, PhaseEffect::CancelGrace]
            }
            GamePhase::Drawing => {
                let round_duration = room.round_duration.unwrap_or(60);
                let round_end_time = room.round_end_time;
                self.transition(RoundPhase::Drawing {
                    word_display: None,
                    round_end_time,
                    round_duration,
                });
                let timer = match round_end_time {
                    Some(end) => PhaseEffect::ArmRoundTimer {
                        round_end_time: end,
                        round_duration,
                    },
                    None => PhaseEffect::DisarmRoundTimer,
                };
                vec![timer, PhaseEffect::CancelGrace]
            }
            GamePhase::RoundEnd => {
                self.transition(RoundPhase::RoundEnd);
                vec![PhaseEffect::DisarmRoundTimer]
            }
            GamePhase::GameEnd => {
                // The scoreboard event may have been missed entirely; build
                // the ranking view from the authoritative member scores.
                let mut final_scores: Vec<FinalScore> = room
                    .users
                    .iter()
                    .map(|u| FinalScore {
                        id: u.id.clone(),
                        nickname: u.nickname.clone(),
                        score: u.score,
                    })
                    .collect();
                final_scores.sort_by(|a, b| b.score.cmp(&a.score));
                let top = final_scores.first().map(|f| f.score);
                let winners = final_scores
                    .iter()
                    .filter(|f| Some(f.score) == top)
                    .map(|f| WinnerEntry {
                        nickname: f.nickname.clone(),
                        score: f.score,
                    })
                    .collect();
                self.transition(RoundPhase::GameEnd {
                    winners,
                    final_scores,
                });
                vec![PhaseEffect::DisarmRoundTimer, PhaseEffect::CancelGrace]
            }
        }
    }
}
