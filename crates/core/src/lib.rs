//! Core library for replaying recorded skeletal pose tables.
//!
//! A table of per-joint rotations and positions is parsed into timestamped
//! [`PoseRecord`]s, a [`PlaybackTimeline`] picks the current record as its
//! clock advances, and a [`JointBinding`] writes that record onto the joints
//! of a host [`Skeleton`]. [`PlaybackSession`] drives the whole pipeline from
//! a single per-frame tick.
//!
//! Everything runs synchronously on the caller's thread; embedders needing
//! shared access must serialize calls themselves.

pub mod config;
pub mod error;
pub mod joints;
pub mod parser;
pub mod record;
pub mod rig;
pub mod session;
pub mod timeline;

pub use config::{AppConfig, PlaybackConfig};
pub use error::{PosePlayerError, Result};
pub use joints::{JointId, JointTable};
pub use parser::{DiagnosticKind, LineDiagnostic, NumericPolicy, ParsedTable, TableParser};
pub use record::{LocalTransform, PoseRecord};
pub use rig::{BoundJoint, InMemoryRig, JointBinding, JointNotFound, Skeleton};
pub use session::PlaybackSession;
pub use timeline::{PlaybackSpeed, PlaybackState, PlaybackTimeline};
