use sketch_types::{FinalScore, RoomSnapshot};
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
pub struct RankedScore {
    pub rank: u32,
    pub id: String,
    pub nickname: String,
    pub score: i32,
}

/// View over authoritative score deltas. Scores are only ever set to the
/// totals the backend computed; nothing is recomputed locally, which keeps
/// asymmetric reward schemes (drawer vs guesser) working unchanged.
pub struct ScoreLedger;

impl ScoreLedger {
    /// Apply a `correct-guess` result: the guesser's new total, and the
    /// drawer's when the event carries one.
    pub fn apply_correct_guess(
        room: &mut RoomSnapshot,
        guesser_id: &str,
        total_score: i32,
        drawer_score: Option<i32>,
    ) {
        let drawer_id = room.current_drawer.clone();
        let mut guesser_seen = false;

        for user in &mut room.users {
            if user.id == guesser_id {
                user.score = total_score;
                guesser_seen = true;
            } else if let Some(score) = drawer_score {
                if drawer_id.as_deref() == Some(user.id.as_str()) {
                    user.score = score;
                }
            }
        }

        if !guesser_seen {
            debug!(guesser_id, "correct-guess for unknown member; ignoring");
        }
    }

    /// Standard competition ranking: sorted by score descending, the rank
    /// number only increments when the score strictly drops, so ties share
    /// a rank ([50, 50, 30] ranks as [1, 1, 3]).
    pub fn rank(final_scores: &[FinalScore]) -> Vec<RankedScore> {
        let mut sorted: Vec<&FinalScore> = final_scores.iter().collect();
        sorted.sort_by(|a, b| b.score.cmp(&a.score));

        let mut ranked: Vec<RankedScore> = Vec::with_capacity(sorted.len());
        for (index, entry) in sorted.iter().enumerate() {
            let rank = match ranked.last() {
                Some(prev) if prev.score == entry.score => prev.rank,
                _ => index as u32 + 1,
            };
            ranked.push(RankedScore {
                rank,
                id: entry.id.clone(),
                nickname: entry.nickname.clone(),
                score: entry.score,
            });
        }

        ranked
    }
}
