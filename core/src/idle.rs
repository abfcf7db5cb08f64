//! Unsolicited nudges after the user goes quiet.
//!
//! The scheduler only tracks deadlines; the session loop sleeps until
//! [`IdleScheduler::deadline`] and then calls [`IdleScheduler::fire`].

use std::time::Duration;
use tokio::time::Instant;

use crate::bundle::{IdleNudge, LocalResponse};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdleState {
    /// Not started yet, or nothing to schedule.
    Disarmed,
    Armed { deadline: Instant },
    /// A reply is in flight; the current index is kept.
    Suspended,
}

#[derive(Debug, Clone)]
pub struct IdleScheduler {
    nudges: Vec<IdleNudge>,
    index: usize,
    state: IdleState,
}

impl IdleScheduler {
    /// `nudges` must be sorted by offset, as returned by `LocalBundle::idle_schedule`.
    pub fn new(nudges: Vec<IdleNudge>) -> Self {
        Self {
            nudges,
            index: 0,
            state: IdleState::Disarmed,
        }
    }

    pub fn state(&self) -> IdleState {
        self.state
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn deadline(&self) -> Option<Instant> {
        match self.state {
            IdleState::Armed { deadline } => Some(deadline),
            _ => None,
        }
    }

    /// Wait before nudge `index`, measured from the previous firing.
    pub fn delay_for(&self, index: usize) -> Option<Duration> {
        let nudge = self.nudges.get(index)?;
        let previous = match index {
            0 => Duration::ZERO,
            _ => self.nudges[index - 1].offset,
        };
        Some(nudge.offset.saturating_sub(previous))
    }

    fn arm_current(&mut self, now: Instant) {
        self.state = match self.delay_for(self.index) {
            Some(delay) => IdleState::Armed {
                deadline: now + delay,
            },
            None => IdleState::Disarmed,
        };
    }

    /// Start counting from the first nudge.
    pub fn start(&mut self, now: Instant) {
        self.index = 0;
        self.arm_current(now);
    }

    /// Any user activity restarts the sequence. Stays suspended while loading.
    pub fn user_activity(&mut self, now: Instant) {
        self.index = 0;
        match self.state {
            IdleState::Suspended => {}
            _ => self.arm_current(now),
        }
    }

    pub fn suspend(&mut self) {
        self.state = IdleState::Suspended;
    }

    /// Re-arm after loading ends, recomputing the wait from `now`.
    pub fn resume(&mut self, now: Instant) {
        if self.state == IdleState::Suspended {
            self.arm_current(now);
        }
    }

    /// Fire the due nudge, advance (wrapping) and re-arm from `now`.
    pub fn fire(&mut self, now: Instant) -> Option<LocalResponse> {
        let deadline = self.deadline()?;
        if now < deadline {
            return None;
        }
        let response = self.nudges.get(self.index)?.response.clone();
        self.index = (self.index + 1) % self.nudges.len();
        self.arm_current(now);
        Some(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emotion::EmotionState;

    fn nudges(offsets: &[u64]) -> Vec<IdleNudge> {
        offsets
            .iter()
            .map(|secs| IdleNudge {
                offset: Duration::from_secs(*secs),
                response: LocalResponse {
                    message: format!("nudge {}", secs),
                    emotion: EmotionState::neutral(),
                },
            })
            .collect()
    }

    /// Step simulated time forward one second at a time, firing whatever is due.
    fn run_for(scheduler: &mut IdleScheduler, start: Instant, secs: u64) -> Vec<(u64, String)> {
        let mut fired = Vec::new();
        for s in 1..=secs {
            let now = start + Duration::from_secs(s);
            if let Some(response) = scheduler.fire(now) {
                fired.push((s, response.message));
            }
        }
        fired
    }

    #[test]
    fn test_fires_in_order_with_deltas() {
        let mut scheduler = IdleScheduler::new(nudges(&[20, 40, 60]));
        assert_eq!(scheduler.delay_for(0), Some(Duration::from_secs(20)));
        assert_eq!(scheduler.delay_for(1), Some(Duration::from_secs(20)));
        assert_eq!(scheduler.delay_for(2), Some(Duration::from_secs(20)));

        let start = Instant::now();
        scheduler.start(start);
        let fired = run_for(&mut scheduler, start, 60);
        assert_eq!(
            fired,
            vec![
                (20, "nudge 20".to_string()),
                (40, "nudge 40".to_string()),
                (60, "nudge 60".to_string()),
            ]
        );
    }

    #[test]
    fn test_wraps_to_first_entry() {
        let mut scheduler = IdleScheduler::new(nudges(&[10, 30]));
        let start = Instant::now();
        scheduler.start(start);
        let fired = run_for(&mut scheduler, start, 50);
        let at: Vec<u64> = fired.iter().map(|(s, _)| *s).collect();
        // 10, then +20, then wrap: +10
        assert_eq!(at, vec![10, 30, 40]);
        assert_eq!(fired[2].1, "nudge 10");
    }

    #[test]
    fn test_activity_resets_to_first() {
        let mut scheduler = IdleScheduler::new(nudges(&[20, 40, 60]));
        let start = Instant::now();
        scheduler.start(start);
        assert!(scheduler.fire(start + Duration::from_secs(20)).is_some());
        assert_eq!(scheduler.index(), 1);

        let later = start + Duration::from_secs(25);
        scheduler.user_activity(later);
        assert_eq!(scheduler.index(), 0);
        assert_eq!(scheduler.deadline(), Some(later + Duration::from_secs(20)));
        assert!(scheduler.fire(later + Duration::from_secs(19)).is_none());
        assert_eq!(
            scheduler.fire(later + Duration::from_secs(20)).map(|r| r.message),
            Some("nudge 20".to_string())
        );
    }

    #[test]
    fn test_suspended_nudge_is_rescheduled_not_dropped() {
        let mut scheduler = IdleScheduler::new(nudges(&[20, 40]));
        let start = Instant::now();
        scheduler.start(start);
        assert!(scheduler.fire(start + Duration::from_secs(20)).is_some());

        scheduler.suspend();
        assert_eq!(scheduler.deadline(), None);
        assert!(scheduler.fire(start + Duration::from_secs(45)).is_none());

        // activity while loading keeps it suspended but rewinds the index
        scheduler.user_activity(start + Duration::from_secs(46));
        assert_eq!(scheduler.state(), IdleState::Suspended);

        let resumed = start + Duration::from_secs(50);
        scheduler.resume(resumed);
        assert_eq!(scheduler.deadline(), Some(resumed + Duration::from_secs(20)));
    }

    #[test]
    fn test_resume_keeps_index() {
        let mut scheduler = IdleScheduler::new(nudges(&[20, 50]));
        let start = Instant::now();
        scheduler.start(start);
        scheduler.fire(start + Duration::from_secs(20));
        scheduler.suspend();
        let resumed = start + Duration::from_secs(100);
        scheduler.resume(resumed);
        assert_eq!(scheduler.index(), 1);
        assert_eq!(scheduler.deadline(), Some(resumed + Duration::from_secs(30)));
    }

    #[test]
    fn test_empty_table_never_arms() {
        let mut scheduler = IdleScheduler::new(Vec::new());
        let now = Instant::now();
        scheduler.start(now);
        assert_eq!(scheduler.state(), IdleState::Disarmed);
        assert!(scheduler.fire(now + Duration::from_secs(1000)).is_none());
        scheduler.user_activity(now);
        assert_eq!(scheduler.deadline(), None);
    }
}
