use serde::{Deserialize, Serialize};

use crate::{PosePlayerError, PoseRecord, Result};

/// Clock-to-real-time multiplier. Always finite and non-negative; zero
/// pauses playback.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct PlaybackSpeed(f64);

impl PlaybackSpeed {
    pub const NORMAL: Self = Self(1.0);

    pub fn new(speed: f64) -> Result<Self> {
        if speed.is_finite() && speed >= 0.0 {
            Ok(Self(speed))
        } else {
            Err(PosePlayerError::InvalidSpeed { speed })
        }
    }

    pub fn get(self) -> f64 {
        self.0
    }
}

impl Default for PlaybackSpeed {
    fn default() -> Self {
        Self::NORMAL
    }
}

impl TryFrom<f64> for PlaybackSpeed {
    type Error = PosePlayerError;

    fn try_from(value: f64) -> Result<Self> {
        Self::new(value)
    }
}

impl From<PlaybackSpeed> for f64 {
    fn from(value: PlaybackSpeed) -> Self {
        value.0
    }
}

/// Observable playback state. None of these are errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    /// Nothing loaded; advancing does nothing.
    Empty,
    /// Records present and the clock is moving.
    Playing,
    /// Non-looping playback ran past the last record and holds it.
    ClampedAtEnd,
}

/// Ordered pose records plus a playback cursor driven by elapsed time.
///
/// The cursor always points at the latest record whose time is not after
/// the clock. Ties resolve to the last record sharing a timestamp.
#[derive(Debug, Clone)]
pub struct PlaybackTimeline {
    records: Vec<PoseRecord>,
    cursor: usize,
    clock: f64,
    looping: bool,
    speed: PlaybackSpeed,
    clamped: bool,
}

impl Default for PlaybackTimeline {
    fn default() -> Self {
        Self::new()
    }
}

impl PlaybackTimeline {
    /// Creates an empty, looping timeline at normal speed.
    pub fn new() -> Self {
        Self::with_settings(true, PlaybackSpeed::NORMAL)
    }

    pub fn with_settings(looping: bool, speed: PlaybackSpeed) -> Self {
        Self {
            records: Vec::new(),
            cursor: 0,
            clock: 0.0,
            looping,
            speed,
            clamped: false,
        }
    }

    /// Replaces all records and rewinds to the first one.
    ///
    /// An empty sequence leaves the timeline [`PlaybackState::Empty`] and
    /// reports [`PosePlayerError::EmptyTable`].
    pub fn load(&mut self, records: Vec<PoseRecord>) -> Result<()> {
        self.records = records;
        self.cursor = 0;
        self.clamped = false;
        match self.records.first() {
            Some(first) => {
                self.clock = first.time;
                self.settle();
                Ok(())
            }
            None => {
                self.clock = 0.0;
                Err(PosePlayerError::EmptyTable)
            }
        }
    }

    /// Drops all records.
    pub fn clear(&mut self) {
        self.records.clear();
        self.cursor = 0;
        self.clock = 0.0;
        self.clamped = false;
    }

    /// Moves the clock forward by `delta` seconds scaled by the configured
    /// speed.
    pub fn advance(&mut self, delta: f64) -> PlaybackState {
        self.advance_with_speed(delta, None)
    }

    /// Like [`advance`](Self::advance), optionally overriding the speed for
    /// this step only. Negative or non-finite deltas count as zero.
    pub fn advance_with_speed(&mut self, delta: f64, speed: Option<PlaybackSpeed>) -> PlaybackState {
        let (first, last) = match (self.records.first(), self.records.last()) {
            (Some(first), Some(last)) => (first.time, last.time),
            _ => return PlaybackState::Empty,
        };

        let delta = if delta.is_finite() { delta.max(0.0) } else { 0.0 };
        self.clock += delta * speed.unwrap_or(self.speed).get();

        if self.clock > last {
            if self.looping {
                let span = last - first;
                self.clock = if span > 0.0 {
                    first + (self.clock - first) % span
                } else {
                    first
                };
                self.cursor = 0;
                self.clamped = false;
                tracing::debug!(clock = self.clock, "pose timeline wrapped");
            } else {
                if !self.clamped {
                    tracing::debug!(clock = last, "pose timeline reached the end");
                }
                self.clock = last;
                self.cursor = self.records.len() - 1;
                self.clamped = true;
            }
        }

        self.settle();
        tracing::trace!(cursor = self.cursor, clock = self.clock, "pose timeline advanced");
        self.state()
    }

    /// Jumps to record `index` and resumes from its timestamp.
    pub fn seek_to_index(&mut self, index: usize) -> Result<()> {
        let time = self
            .records
            .get(index)
            .map(|record| record.time)
            .ok_or(PosePlayerError::FrameOutOfRange {
                index,
                len: self.records.len(),
            })?;
        self.cursor = index;
        self.clock = time;
        self.clamped = false;
        self.settle();
        Ok(())
    }

    /// Jumps to `time`, clamped to the recorded range.
    pub fn seek_to_time(&mut self, time: f64) -> Result<()> {
        let (first, last) = match (self.records.first(), self.records.last()) {
            (Some(first), Some(last)) => (first.time, last.time),
            _ => return Err(PosePlayerError::EmptyTable),
        };
        if !time.is_finite() {
            return Err(PosePlayerError::msg(format!("cannot seek to time {time}")));
        }
        self.clock = time.max(first).min(last);
        self.cursor = 0;
        self.clamped = false;
        self.settle();
        Ok(())
    }

    /// Record under the cursor, or `None` while empty.
    pub fn current_pose(&self) -> Option<&PoseRecord> {
        self.records.get(self.cursor)
    }

    pub fn state(&self) -> PlaybackState {
        if self.records.is_empty() {
            PlaybackState::Empty
        } else if self.clamped {
            PlaybackState::ClampedAtEnd
        } else {
            PlaybackState::Playing
        }
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn clock(&self) -> f64 {
        self.clock
    }

    pub fn records(&self) -> &[PoseRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Time between the first and last record.
    pub fn duration(&self) -> f64 {
        match (self.records.first(), self.records.last()) {
            (Some(first), Some(last)) => last.time - first.time,
            _ => 0.0,
        }
    }

    pub fn looping(&self) -> bool {
        self.looping
    }

    pub fn set_looping(&mut self, looping: bool) {
        self.looping = looping;
    }

    pub fn speed(&self) -> PlaybackSpeed {
        self.speed
    }

    pub fn set_speed(&mut self, speed: PlaybackSpeed) {
        self.speed = speed;
    }

    // Forward-only scan; the clock never moves backwards between wraps so the
    // cursor only has to catch up.
    fn settle(&mut self) {
        while self.cursor + 1 < self.records.len() && self.records[self.cursor + 1].time <= self.clock {
            self.cursor += 1;
        }
    }
}
