use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{PosePlayerError, Result};

/// Columns preceding the joint values in every data line: an ignored index
/// followed by the sample time.
pub const LEADING_COLUMNS: usize = 2;

/// Values stored per joint: quaternion `x, y, z, w` then position `x, y, z`.
pub const VALUES_PER_JOINT: usize = 7;

macro_rules! joint_ids {
    ($($variant:ident),+ $(,)?) => {
        /// Canonical humanoid joint, independent of any particular rig.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum JointId {
            $($variant),+
        }

        impl JointId {
            /// Every canonical joint in declaration order.
            pub const ALL: &'static [JointId] = &[$(JointId::$variant),+];

            /// Canonical name, identical to the serialized form.
            pub fn name(self) -> &'static str {
                match self {
                    $(JointId::$variant => stringify!($variant)),+
                }
            }
        }
    };
}

joint_ids! {
    Hips,
    LeftUpperLeg,
    RightUpperLeg,
    LeftLowerLeg,
    RightLowerLeg,
    LeftFoot,
    RightFoot,
    Spine,
    Chest,
    UpperChest,
    Neck,
    Head,
    LeftShoulder,
    RightShoulder,
    LeftUpperArm,
    RightUpperArm,
    LeftLowerArm,
    RightLowerArm,
    LeftHand,
    RightHand,
    LeftToes,
    RightToes,
    LeftEye,
    RightEye,
    Jaw,
    LeftThumbProximal,
    LeftThumbIntermediate,
    LeftThumbDistal,
    LeftIndexProximal,
    LeftIndexIntermediate,
    LeftIndexDistal,
    LeftMiddleProximal,
    LeftMiddleIntermediate,
    LeftMiddleDistal,
    LeftRingProximal,
    LeftRingIntermediate,
    LeftRingDistal,
    LeftLittleProximal,
    LeftLittleIntermediate,
    LeftLittleDistal,
    RightThumbProximal,
    RightThumbIntermediate,
    RightThumbDistal,
    RightIndexProximal,
    RightIndexIntermediate,
    RightIndexDistal,
    RightMiddleProximal,
    RightMiddleIntermediate,
    RightMiddleDistal,
    RightRingProximal,
    RightRingIntermediate,
    RightRingDistal,
    RightLittleProximal,
    RightLittleIntermediate,
    RightLittleDistal,
}

impl fmt::Display for JointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for JointId {
    type Err = PosePlayerError;

    /// Matches canonical names case-insensitively.
    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        JointId::ALL
            .iter()
            .copied()
            .find(|joint| joint.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| PosePlayerError::UnknownJoint {
                name: wanted.to_string(),
            })
    }
}

const HUMANOID_V1: [JointId; 49] = [
    // upper body
    JointId::Hips,
    JointId::Spine,
    JointId::Chest,
    JointId::Neck,
    JointId::Head,
    JointId::LeftShoulder,
    JointId::LeftUpperArm,
    JointId::LeftLowerArm,
    JointId::LeftHand,
    JointId::LeftThumbProximal,
    JointId::LeftThumbIntermediate,
    JointId::LeftThumbDistal,
    JointId::LeftIndexProximal,
    JointId::LeftIndexIntermediate,
    JointId::LeftIndexDistal,
    JointId::LeftMiddleProximal,
    JointId::LeftMiddleIntermediate,
    JointId::LeftMiddleDistal,
    JointId::LeftRingProximal,
    JointId::LeftRingIntermediate,
    JointId::LeftRingDistal,
    JointId::LeftLittleProximal,
    JointId::LeftLittleIntermediate,
    JointId::LeftLittleDistal,
    JointId::RightShoulder,
    JointId::RightUpperArm,
    JointId::RightLowerArm,
    JointId::RightHand,
    JointId::RightThumbProximal,
    JointId::RightThumbIntermediate,
    JointId::RightThumbDistal,
    JointId::RightIndexProximal,
    JointId::RightIndexIntermediate,
    JointId::RightIndexDistal,
    JointId::RightMiddleProximal,
    JointId::RightMiddleIntermediate,
    JointId::RightMiddleDistal,
    JointId::RightRingProximal,
    JointId::RightRingIntermediate,
    JointId::RightRingDistal,
    JointId::RightLittleProximal,
    JointId::RightLittleIntermediate,
    JointId::RightLittleDistal,
    // lower body
    JointId::LeftUpperLeg,
    JointId::LeftLowerLeg,
    JointId::LeftFoot,
    JointId::RightUpperLeg,
    JointId::RightLowerLeg,
    JointId::RightFoot,
];

/// Versioned column layout shared by the table parser and the pose applier.
///
/// The order of `joints` is the order in which per-joint values appear in
/// each data line, so writer and reader must agree on the same table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JointTable {
    pub name: String,
    pub version: u32,
    pub joints: Vec<JointId>,
}

impl Default for JointTable {
    fn default() -> Self {
        Self::humanoid_v1()
    }
}

impl JointTable {
    pub fn new(name: impl Into<String>, version: u32, joints: Vec<JointId>) -> Self {
        Self {
            name: name.into(),
            version,
            joints,
        }
    }

    /// The 49-joint humanoid layout: torso and head, both arms with all
    /// finger segments, then both legs.
    pub fn humanoid_v1() -> Self {
        Self::new("humanoid", 1, HUMANOID_V1.to_vec())
    }

    pub fn len(&self) -> usize {
        self.joints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.joints.is_empty()
    }

    pub fn joints(&self) -> &[JointId] {
        &self.joints
    }

    /// Number of delimited fields a data line must carry.
    pub fn column_count(&self) -> usize {
        LEADING_COLUMNS + self.joints.len() * VALUES_PER_JOINT
    }

    /// Position of `joint` in the column layout, if recorded.
    pub fn index_of(&self, joint: JointId) -> Option<usize> {
        self.joints.iter().position(|candidate| *candidate == joint)
    }
}
