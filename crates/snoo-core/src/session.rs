//! Session reconstruction from raw levels.
//!
//! A session is every level sharing a `sessionId`. Levels for one session
//! may arrive spread across several daily aggregates, so reconstruction is a
//! fold over all fetched levels followed by a single materialization step.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::level::{Level, LevelType};

/// A reconstructed sleep session.
///
/// Durations are in seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    pub id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub asleep_duration: u64,
    pub soothing_duration: u64,
}

impl Session {
    /// Time spent asleep or soothing.
    pub const fn total_duration(&self) -> u64 {
        self.asleep_duration + self.soothing_duration
    }
}

/// Running totals for one session id.
#[derive(Debug)]
struct Accumulator {
    id: String,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    asleep_duration: u64,
    soothing_duration: u64,
    level_count: usize,
}

impl Accumulator {
    fn new(level: &Level) -> Self {
        Self {
            id: level.session_id.clone(),
            start_time: level.start_time,
            end_time: level.end_time(),
            asleep_duration: 0,
            soothing_duration: 0,
            level_count: 0,
        }
    }

    fn add(&mut self, level: &Level) {
        self.start_time = self.start_time.min(level.start_time);
        self.end_time = self.end_time.max(level.end_time());
        let duration = u64::from(level.state_duration);
        match level.kind {
            LevelType::Asleep => self.asleep_duration += duration,
            LevelType::Soothing => self.soothing_duration += duration,
            LevelType::Other => {}
        }
        self.level_count += 1;
    }

    fn finish(self) -> Session {
        Session {
            id: self.id,
            start_time: self.start_time,
            end_time: self.end_time,
            asleep_duration: self.asleep_duration,
            soothing_duration: self.soothing_duration,
        }
    }
}

/// Folds levels into sessions.
///
/// Sessions keep the order their ids were first seen until [`finish`]
/// sorts them by start time, so ties stay in arrival order.
///
/// [`finish`]: SessionBuilder::finish
#[derive(Debug, Default)]
pub struct SessionBuilder {
    index: HashMap<String, usize>,
    sessions: Vec<Accumulator>,
}

impl SessionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, level: &Level) {
        let slot = match self.index.get(&level.session_id) {
            Some(&slot) => slot,
            None => {
                let slot = self.sessions.len();
                self.index.insert(level.session_id.clone(), slot);
                self.sessions.push(Accumulator::new(level));
                slot
            }
        };
        self.sessions[slot].add(level);
    }

    /// Number of distinct sessions seen so far.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Materializes the sessions, ordered by start time.
    pub fn finish(self) -> Vec<Session> {
        let level_count: usize = self.sessions.iter().map(|acc| acc.level_count).sum();
        let mut sessions: Vec<Session> = self.sessions.into_iter().map(Accumulator::finish).collect();
        // Stable: equal start times keep first-seen order.
        sessions.sort_by_key(|session| session.start_time);
        tracing::debug!(
            sessions = sessions.len(),
            levels = level_count,
            "reconstructed sessions"
        );
        sessions
    }
}

impl<'a> Extend<&'a Level> for SessionBuilder {
    fn extend<I: IntoIterator<Item = &'a Level>>(&mut self, levels: I) {
        for level in levels {
            self.push(level);
        }
    }
}

/// Groups levels by session id and returns the sessions ordered by start time.
pub fn reconstruct_sessions<'a, I>(levels: I) -> Vec<Session>
where
    I: IntoIterator<Item = &'a Level>,
{
    let mut builder = SessionBuilder::new();
    builder.extend(levels);
    builder.finish()
}
