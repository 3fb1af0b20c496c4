//! Announcement policy.
//!
//! This module is the decision core of the crate: given the detections for
//! one frame and the state carried from earlier frames, it decides whether a
//! spoken announcement is due, what text to speak, and what the next state
//! is. It has no opinion on where the frame came from; a still image and a
//! live camera run through the same `decide` call.
//!
//! The policy announces the *dominant* class of a batch (the label with the
//! highest occurrence count) and suppresses repeats: the same class is not
//! re-announced until the cooldown window has elapsed, while a change of
//! dominant class is announced immediately.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use crate::detect::DetectionBatch;

/// Minimum elapsed time before the same dominant class is announced again.
pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(3);

/// The only state carried across frames within a session.
///
/// Owned by exactly one `Session`, mutated only through `decide`, and
/// discarded when the session ends. `last_spoken_at` is monotonically
/// non-decreasing because it is only ever set to the caller-supplied `now`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AnnouncementState {
    /// Label of the most recently announced class, if any.
    pub last_spoken: Option<String>,
    /// When that announcement was made.
    pub last_spoken_at: Option<Instant>,
}

impl AnnouncementState {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Decides whether a detection batch warrants a spoken announcement.
#[derive(Clone, Debug)]
pub struct AnnouncementPolicy {
    cooldown: Duration,
}

impl AnnouncementPolicy {
    pub fn new(cooldown: Duration) -> Self {
        Self { cooldown }
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    /// Evaluate one detection batch against the carried state.
    ///
    /// Returns the text to announce (if any) together with the state the
    /// session should carry forward. The state is returned unchanged unless
    /// an announcement is produced.
    ///
    /// An announcement is produced when the batch is non-empty and either
    /// the dominant class differs from `state.last_spoken`, or more than the
    /// cooldown has elapsed since the last announcement. The latter allows a
    /// persistent object to be re-announced periodically rather than only
    /// on change.
    pub fn decide(
        &self,
        batch: &DetectionBatch,
        state: &AnnouncementState,
        now: Instant,
    ) -> (Option<String>, AnnouncementState) {
        let Some(dominant) = dominant_class(batch) else {
            return (None, state.clone());
        };

        let changed = state.last_spoken.as_deref() != Some(dominant);
        let cooled = match state.last_spoken_at {
            Some(at) => now.saturating_duration_since(at) > self.cooldown,
            None => true,
        };

        if changed || cooled {
            let next = AnnouncementState {
                last_spoken: Some(dominant.to_string()),
                last_spoken_at: Some(now),
            };
            (Some(dominant.to_string()), next)
        } else {
            (None, state.clone())
        }
    }
}

impl Default for AnnouncementPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_COOLDOWN)
    }
}

/// The label with the highest occurrence count in the batch.
///
/// Ties resolve to the lexicographically smallest label. Counting goes
/// through a `BTreeMap` and a strictly-greater comparison, so the result
/// never depends on detector enumeration order.
pub fn dominant_class(batch: &DetectionBatch) -> Option<&str> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for detection in &batch.detections {
        *counts.entry(detection.label.as_str()).or_insert(0) += 1;
    }

    let mut best: Option<(&str, usize)> = None;
    for (label, count) in counts {
        match best {
            Some((_, best_count)) if count <= best_count => {}
            _ => best = Some((label, count)),
        }
    }
    best.map(|(label, _)| label)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::{BoundingBox, Detection};

    fn batch(labels: &[(&str, f32)]) -> DetectionBatch {
        DetectionBatch {
            detections: labels
                .iter()
                .map(|(label, confidence)| Detection {
                    label: label.to_string(),
                    confidence: *confidence,
                    bounds: BoundingBox::default(),
                })
                .collect(),
        }
    }

    #[test]
    fn announces_first_sighting() {
        let policy = AnnouncementPolicy::new(Duration::from_secs(3));
        let t0 = Instant::now();
        let state = AnnouncementState::new();

        let (announce, next) =
            policy.decide(&batch(&[("dog", 0.9)]), &state, t0 + Duration::from_secs(1));

        assert_eq!(announce.as_deref(), Some("dog"));
        assert_eq!(next.last_spoken.as_deref(), Some("dog"));
        assert_eq!(next.last_spoken_at, Some(t0 + Duration::from_secs(1)));
    }

    #[test]
    fn suppresses_repeat_within_cooldown() {
        let policy = AnnouncementPolicy::new(Duration::from_secs(3));
        let t0 = Instant::now();
        let state = AnnouncementState {
            last_spoken: Some("dog".to_string()),
            last_spoken_at: Some(t0 + Duration::from_secs(1)),
        };

        let b = batch(&[("dog", 0.9), ("dog", 0.8), ("cat", 0.99)]);
        let (announce, next) = policy.decide(&b, &state, t0 + Duration::from_secs(2));

        assert_eq!(announce, None);
        assert_eq!(next, state);
    }

    #[test]
    fn re_announces_after_cooldown() {
        let policy = AnnouncementPolicy::new(Duration::from_secs(3));
        let t0 = Instant::now();
        let state = AnnouncementState {
            last_spoken: Some("dog".to_string()),
            last_spoken_at: Some(t0 + Duration::from_secs(1)),
        };

        let b = batch(&[("dog", 0.9), ("dog", 0.8), ("cat", 0.99)]);
        let (announce, next) = policy.decide(&b, &state, t0 + Duration::from_secs(5));

        assert_eq!(announce.as_deref(), Some("dog"));
        assert_eq!(next.last_spoken_at, Some(t0 + Duration::from_secs(5)));
    }

    #[test]
    fn announces_class_change_immediately() {
        let policy = AnnouncementPolicy::new(Duration::from_secs(3));
        let t0 = Instant::now();
        let state = AnnouncementState {
            last_spoken: Some("dog".to_string()),
            last_spoken_at: Some(t0),
        };

        let (announce, _) = policy.decide(
            &batch(&[("cat", 0.7)]),
            &state,
            t0 + Duration::from_millis(100),
        );

        assert_eq!(announce.as_deref(), Some("cat"));
    }

    #[test]
    fn empty_batch_is_silent_and_leaves_state_alone() {
        let policy = AnnouncementPolicy::new(Duration::from_secs(3));
        let t0 = Instant::now();
        let state = AnnouncementState {
            last_spoken: Some("dog".to_string()),
            last_spoken_at: Some(t0),
        };

        let (announce, next) =
            policy.decide(&DetectionBatch::default(), &state, t0 + Duration::from_secs(60));

        assert_eq!(announce, None);
        assert_eq!(next, state);
    }

    #[test]
    fn dominant_class_counts_occurrences() {
        let b = batch(&[("cat", 0.9), ("dog", 0.5), ("dog", 0.4)]);
        assert_eq!(dominant_class(&b), Some("dog"));
    }

    #[test]
    fn dominant_class_tie_breaks_lexicographically() {
        let b = batch(&[("cat", 0.9), ("bird", 0.3)]);
        assert_eq!(dominant_class(&b), Some("bird"));
    }

    #[test]
    fn dominant_class_ignores_confidence() {
        // Occurrence count decides, not the confidence of individual boxes.
        let b = batch(&[("cat", 0.99), ("dog", 0.1), ("dog", 0.1)]);
        assert_eq!(dominant_class(&b), Some("dog"));
    }

    #[test]
    fn single_detection_is_dominant() {
        let b = batch(&[("person", 0.6)]);
        let policy = AnnouncementPolicy::default();
        let (announce, _) = policy.decide(&b, &AnnouncementState::new(), Instant::now());
        assert_eq!(announce.as_deref(), Some("person"));
    }
}
