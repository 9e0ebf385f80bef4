//! Frame-driven readiness polling
//!
//! The rendering backend populates entities and documents out-of-band, so the
//! engine repeatedly checks for readiness at frame boundaries. [`FramePoll`] is
//! the single bounded primitive for that: every poll has an attempt cap and an
//! optional time budget measured in accumulated frame time, so every loop is
//! guaranteed to terminate.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Limits applied to a [`FramePoll`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollPolicy {
    /// Maximum number of readiness checks before giving up
    pub max_attempts: u32,

    /// Frames between two readiness checks (1 = every frame)
    pub interval_frames: u32,

    /// Optional budget of accumulated frame time
    pub timeout: Option<Duration>,
}

impl PollPolicy {
    /// Policy that checks every frame, bounded by attempts only
    pub const fn every_frame(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            interval_frames: 1,
            timeout: None,
        }
    }

    /// Add a time budget to this policy
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Check only every `frames` frames
    pub const fn with_interval(mut self, frames: u32) -> Self {
        self.interval_frames = frames;
        self
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self::every_frame(200)
    }
}

/// Why a poll stopped without becoming ready
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollExhausted {
    /// Checks that were performed
    pub attempts: u32,

    /// Accumulated frame time when the poll gave up
    pub elapsed: Duration,

    /// True when the time budget (not the attempt cap) ended the poll
    pub timed_out: bool,
}

/// Result of advancing a poll by one frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollState<T> {
    /// The readiness check succeeded
    Ready(T),

    /// Not ready yet; try again next frame
    Pending,

    /// The poll ran out of attempts or time
    Exhausted(PollExhausted),
}

impl<T> PollState<T> {
    /// True when the poll is still waiting
    pub const fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }
}

/// Bounded poll-until-ready-or-timeout state
#[derive(Debug, Clone)]
pub struct FramePoll {
    policy: PollPolicy,
    attempts: u32,
    frames_waited: u32,
    elapsed: Duration,
}

impl FramePoll {
    /// Create a poll with the given limits
    pub fn new(policy: PollPolicy) -> Self {
        Self {
            policy,
            attempts: 0,
            frames_waited: 0,
            elapsed: Duration::ZERO,
        }
    }

    /// Number of readiness checks performed so far
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Accumulated frame time since the poll started
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Policy this poll runs under
    pub fn policy(&self) -> &PollPolicy {
        &self.policy
    }

    /// Advance one frame and run `check` if an attempt is due
    ///
    /// `delta_time` is the frame time in seconds. Negative or non-finite
    /// deltas, and deltas too large for a [`Duration`], count as zero.
    pub fn tick<T>(&mut self, delta_time: f32, check: impl FnOnce() -> Option<T>) -> PollState<T> {
        if let Ok(delta) = Duration::try_from_secs_f32(delta_time) {
            self.elapsed = self.elapsed.saturating_add(delta);
        }

        if let Some(exhausted) = self.exhausted() {
            return PollState::Exhausted(exhausted);
        }

        self.frames_waited += 1;
        if self.frames_waited < self.policy.interval_frames.max(1) {
            return PollState::Pending;
        }
        self.frames_waited = 0;
        self.attempts += 1;

        match check() {
            Some(value) => PollState::Ready(value),
            None => match self.exhausted() {
                Some(exhausted) => PollState::Exhausted(exhausted),
                None => PollState::Pending,
            },
        }
    }

    fn exhausted(&self) -> Option<PollExhausted> {
        let timed_out = self
            .policy
            .timeout
            .map_or(false, |timeout| self.elapsed >= timeout);

        if timed_out || self.attempts >= self.policy.max_attempts {
            Some(PollExhausted {
                attempts: self.attempts,
                elapsed: self.elapsed,
                timed_out,
            })
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRAME: f32 = 1.0 / 60.0;

    #[test]
    fn test_ready_on_first_attempt() {
        let mut poll = FramePoll::new(PollPolicy::every_frame(5));
        assert_eq!(poll.tick(FRAME, || Some(7)), PollState::Ready(7));
        assert_eq!(poll.attempts(), 1);
    }

    #[test]
    fn test_exhausts_after_max_attempts() {
        let mut poll = FramePoll::new(PollPolicy::every_frame(3));

        assert!(poll.tick::<()>(FRAME, || None).is_pending());
        assert!(poll.tick::<()>(FRAME, || None).is_pending());

        match poll.tick::<()>(FRAME, || None) {
            PollState::Exhausted(info) => {
                assert_eq!(info.attempts, 3);
                assert!(!info.timed_out);
            }
            other => panic!("expected exhaustion, got {:?}", other),
        }

        // Stays exhausted and never runs the check again
        let mut ran = false;
        let state = poll.tick::<()>(FRAME, || {
            ran = true;
            None
        });
        assert!(matches!(state, PollState::Exhausted(_)));
        assert!(!ran);
    }

    #[test]
    fn test_timeout_uses_accumulated_frame_time() {
        let policy = PollPolicy::every_frame(1000).with_timeout(Duration::from_millis(100));
        let mut poll = FramePoll::new(policy);

        // 0.05s per frame: attempt at 0.05, then time budget is reached at 0.10
        assert!(poll.tick::<()>(0.05, || None).is_pending());
        match poll.tick::<()>(0.05, || None) {
            PollState::Exhausted(info) => {
                assert!(info.timed_out);
                assert_eq!(info.attempts, 1);
            }
            other => panic!("expected timeout, got {:?}", other),
        }
    }

    #[test]
    fn test_interval_skips_frames() {
        let mut poll = FramePoll::new(PollPolicy::every_frame(10).with_interval(3));
        let mut checks = 0;

        for _ in 0..6 {
            let _ = poll.tick::<()>(FRAME, || {
                checks += 1;
                None
            });
        }

        assert_eq!(checks, 2);
        assert_eq!(poll.attempts(), 2);
    }

    #[test]
    fn test_negative_delta_is_ignored() {
        let mut poll = FramePoll::new(PollPolicy::every_frame(4));
        let _ = poll.tick::<()>(-1.0, || None);
        let _ = poll.tick::<()>(f32::NAN, || None);
        assert_eq!(poll.elapsed(), Duration::ZERO);
    }

    #[test]
    fn test_oversized_delta_is_ignored() {
        let mut poll = FramePoll::new(PollPolicy::every_frame(4));
        assert!(poll.tick::<()>(1.0e30, || None).is_pending());
        assert_eq!(poll.elapsed(), Duration::ZERO);
        assert_eq!(poll.attempts(), 1);
    }
}
