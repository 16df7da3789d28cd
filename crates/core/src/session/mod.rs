//! Per-rig playback session tying the parser, timeline and joint binding
//! together behind a single tick call.

use std::{fmt, hash::Hash};

use crate::{
    AppConfig, JointBinding, JointTable, LineDiagnostic, PlaybackConfig, PlaybackState,
    PlaybackTimeline, PoseRecord, Result, Skeleton, TableParser,
};

/// Single-threaded playback session. Owns the parsed records and the
/// binding; the skeleton is borrowed on every call and never owned.
#[derive(Debug)]
pub struct PlaybackSession<H> {
    table: JointTable,
    config: PlaybackConfig,
    timeline: PlaybackTimeline,
    binding: Option<JointBinding<H>>,
    diagnostics: Vec<LineDiagnostic>,
}

impl<H> PlaybackSession<H>
where
    H: Copy + Eq + Hash + fmt::Debug,
{
    pub fn new(table: JointTable, config: PlaybackConfig) -> Self {
        let timeline = PlaybackTimeline::with_settings(config.looping, config.speed);
        Self {
            table,
            config,
            timeline,
            binding: None,
            diagnostics: Vec::new(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.joint_table.clone(), config.playback.clone())
    }

    /// Parses `text` and replaces the loaded records, returning how many
    /// were kept.
    ///
    /// Line problems are kept in [`diagnostics`](Self::diagnostics). A table
    /// without usable records leaves the session empty and reports
    /// [`EmptyTable`](crate::PosePlayerError::EmptyTable). Under the strict
    /// numeric policy a bad value fails the load before any records are
    /// replaced and clears the diagnostics of the previous load.
    pub fn load_text(&mut self, text: &str) -> Result<usize> {
        let parsed = match TableParser::new(&self.table)
            .with_policy(self.config.numeric_policy)
            .parse(text)
        {
            Ok(parsed) => parsed,
            Err(err) => {
                self.diagnostics.clear();
                return Err(err);
            }
        };

        self.diagnostics = parsed.diagnostics;
        if let Err(err) = self.timeline.load(parsed.records) {
            tracing::error!(diagnostics = self.diagnostics.len(), "no usable pose records");
            return Err(err);
        }

        if let Some(requested) = self.config.start_frame_index {
            let last = self.timeline.len() - 1;
            if requested > last {
                tracing::warn!(requested, last, "start frame beyond table, clamping");
            }
            self.timeline.seek_to_index(requested.min(last))?;
        }

        tracing::info!(
            records = self.timeline.len(),
            skipped = self.diagnostics.iter().filter(|d| d.kind.skips_line()).count(),
            duration = self.timeline.duration(),
            "loaded pose table"
        );
        Ok(self.timeline.len())
    }

    /// Resolves the joint table against `skeleton`, replacing any earlier
    /// binding.
    pub fn bind<S>(&mut self, skeleton: &S) -> &JointBinding<H>
    where
        S: Skeleton<Handle = H>,
    {
        self.binding.insert(JointBinding::resolve(skeleton, &self.table))
    }

    /// Advances the clock by `elapsed` seconds and writes the selected pose
    /// onto the bound joints. Does nothing to the skeleton while the session
    /// is empty or unbound.
    pub fn tick<S>(&mut self, elapsed: f64, skeleton: &mut S) -> PlaybackState
    where
        S: Skeleton<Handle = H>,
    {
        let state = self.timeline.advance(elapsed);
        if let (Some(binding), Some(pose)) = (&self.binding, self.timeline.current_pose()) {
            binding.apply(skeleton, pose);
        }
        state
    }

    pub fn current_pose(&self) -> Option<&PoseRecord> {
        self.timeline.current_pose()
    }

    /// Index of the record currently applied.
    pub fn current_frame(&self) -> usize {
        self.timeline.cursor()
    }

    pub fn state(&self) -> PlaybackState {
        self.timeline.state()
    }

    pub fn timeline(&self) -> &PlaybackTimeline {
        &self.timeline
    }

    pub fn timeline_mut(&mut self) -> &mut PlaybackTimeline {
        &mut self.timeline
    }

    pub fn binding(&self) -> Option<&JointBinding<H>> {
        self.binding.as_ref()
    }

    pub fn table(&self) -> &JointTable {
        &self.table
    }

    /// Diagnostics from the most recently parsed table.
    pub fn diagnostics(&self) -> &[LineDiagnostic] {
        &self.diagnostics
    }

    /// Drops loaded records and the binding.
    pub fn reset(&mut self) {
        self.timeline.clear();
        self.binding = None;
        self.diagnostics.clear();
    }
}
