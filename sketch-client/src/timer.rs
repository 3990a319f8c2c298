/// Current wall clock in milliseconds, the unit used for round deadlines.
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerUpdate {
    /// `None` while no deadline is set (display suspended).
    pub remaining_secs: Option<u64>,
    /// True exactly once per armed deadline.
    pub time_up: bool,
}

/// Derives the countdown from an authoritative absolute deadline, never
/// from locally elapsed time. Time-up is advisory: the authoritative round
/// end is server-driven and arrives independently.
pub struct RoundTimer {
    deadline_ms: Option<i64>,
    duration_secs: u64,
    fired: bool,
}

impl Default for RoundTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl RoundTimer {
    pub fn new() -> Self {
        Self {
            deadline_ms: None,
            duration_secs: 0,
            fired: false,
        }
    }

    pub fn arm(&mut self, deadline_ms: i64, duration_secs: u64) {
        self.deadline_ms = Some(deadline_ms);
        self.duration_secs = duration_secs;
        self.fired = false;
    }

    pub fn disarm(&mut self) {
        self.deadline_ms = None;
        self.fired = false;
    }

    pub fn is_armed(&self) -> bool {
        self.deadline_ms.is_some()
    }

    /// Round duration in seconds, for proportional displays.
    pub fn duration_secs(&self) -> u64 {
        self.duration_secs
    }

    /// One-second tick: `remaining = max(0, ceil((deadline - now) / 1000))`.
    pub fn tick(&mut self, now_ms: i64) -> TimerUpdate {
        let Some(deadline) = self.deadline_ms else {
            return TimerUpdate {
                remaining_secs: None,
                time_up: false,
            };
        };

        let delta = deadline - now_ms;
        let remaining = if delta <= 0 {
            0
        } else {
            (delta as u64).div_ceil(1000)
        };

        let time_up = remaining == 0 && !self.fired;
        if time_up {
            self.fired = true;
        }

        TimerUpdate {
            remaining_secs: Some(remaining),
            time_up,
        }
    }
}

pub const GRACE_SECS: u32 = 5;

/// Cancellable scheduled countdown for the post-guess grace period. Purely
/// cosmetic: it never drives a phase transition, and cancelling guarantees
/// no further tick is observed after an authoritative event or teardown.
pub struct GraceCountdown {
    remaining: Option<u32>,
}

impl Default for GraceCountdown {
    fn default() -> Self {
        Self::new()
    }
}

impl GraceCountdown {
    pub fn new() -> Self {
        Self { remaining: None }
    }

    pub fn arm(&mut self, secs: u32) {
        self.remaining = Some(secs);
    }

    pub fn cancel(&mut self) {
        self.remaining = None;
    }

    pub fn is_armed(&self) -> bool {
        self.remaining.is_some()
    }

    pub fn remaining(&self) -> Option<u32> {
        self.remaining
    }

    /// One-second tick; returns the new remaining value, disarming itself
    /// on reaching zero.
    pub fn tick(&mut self) -> Option<u32> {
        let remaining = self.remaining?;
        let next = remaining.saturating_sub(1);
        if next == 0 {
            self.remaining = None;
        } else {
            self.remaining = Some(next);
        }
        Some(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unarmed_timer_suspends_display() {
        let mut timer = RoundTimer::new();
        let update = timer.tick(1_000_000);
        assert_eq!(update.remaining_secs, None);
        assert!(!update.time_up);
    }

    #[test]
    fn test_countdown_reaches_zero_and_fires_once() {
        let mut timer = RoundTimer::new();
        let start = 1_000_000;
        timer.arm(start + 5_000, 60);

        let mut fired = 0;
        for i in 1..=7 {
            let update = timer.tick(start + i * 1_000);
            if update.time_up {
                fired += 1;
            }
            if i < 5 {
                assert_eq!(update.remaining_secs, Some(5 - i as u64));
            } else {
                assert_eq!(update.remaining_secs, Some(0));
            }
        }
        assert_eq!(fired, 1);
    }

    #[test]
    fn test_remaining_rounds_up() {
        let mut timer = RoundTimer::new();
        timer.arm(10_500, 60);
        assert_eq!(timer.tick(10_000).remaining_secs, Some(1));
        assert_eq!(timer.tick(9_001).remaining_secs, Some(2));
    }

    #[test]
    fn test_rearming_resets_fired_state() {
        let mut timer = RoundTimer::new();
        timer.arm(1_000, 60);
        assert!(timer.tick(2_000).time_up);
        timer.arm(10_000, 60);
        assert!(!timer.tick(5_000).time_up);
        assert!(timer.tick(10_000).time_up);
    }

    #[test]
    fn test_disarm_silences_timer() {
        let mut timer = RoundTimer::new();
        timer.arm(1_000, 60);
        timer.disarm();
        assert!(!timer.is_armed());
        let update = timer.tick(5_000);
        assert_eq!(update.remaining_secs, None);
        assert!(!update.time_up);
    }

    #[test]
    fn test_grace_counts_down_and_disarms() {
        let mut grace = GraceCountdown::new();
        grace.arm(GRACE_SECS);
        assert_eq!(grace.remaining(), Some(5));
        assert_eq!(grace.tick(), Some(4));
        assert_eq!(grace.tick(), Some(3));
        assert_eq!(grace.tick(), Some(2));
        assert_eq!(grace.tick(), Some(1));
        assert_eq!(grace.tick(), Some(0));
        assert!(!grace.is_armed());
        assert_eq!(grace.tick(), None);
    }

    #[test]
    fn test_grace_cancel_stops_ticks() {
        let mut grace = GraceCountdown::new();
        grace.arm(GRACE_SECS);
        grace.tick();
        grace.cancel();
        assert_eq!(grace.tick(), None);
        assert!(!grace.is_armed());
    }
}
