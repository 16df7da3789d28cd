use std::{collections::HashMap, fmt, hash::Hash};

use nalgebra::{Quaternion, Vector3};

use crate::{JointId, JointTable, LocalTransform, PoseRecord};

/// Host rig abstraction. The player never creates or destroys joints, it
/// only looks them up once and writes local transforms afterwards.
pub trait Skeleton {
    /// Cheap reference to a live joint owned by the rig.
    type Handle: Copy + Eq + Hash + fmt::Debug;

    fn lookup_joint(&self, joint: JointId) -> Option<Self::Handle>;

    fn write_local_rotation(&mut self, handle: Self::Handle, rotation: Quaternion<f32>);

    fn write_local_position(&mut self, handle: Self::Handle, position: Vector3<f32>);
}

/// A joint from the table that the rig could not provide.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JointNotFound {
    pub joint: JointId,
}

impl fmt::Display for JointNotFound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "joint {} not found on skeleton", self.joint)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundJoint<H> {
    pub joint: JointId,
    /// Position of the joint in the [`JointTable`] layout.
    pub column: usize,
    pub handle: H,
}

/// Resolved mapping from table joints to live rig handles, built once per
/// rig. Joints the rig lacks are simply absent.
#[derive(Debug, Clone)]
pub struct JointBinding<H> {
    joints: Vec<BoundJoint<H>>,
    by_handle: HashMap<H, JointId>,
    missing: Vec<JointNotFound>,
}

impl<H> JointBinding<H>
where
    H: Copy + Eq + Hash + fmt::Debug,
{
    /// Looks every joint of `table` up on `skeleton`.
    pub fn resolve<S>(skeleton: &S, table: &JointTable) -> Self
    where
        S: Skeleton<Handle = H>,
    {
        let mut joints = Vec::with_capacity(table.len());
        let mut missing = Vec::new();

        for (column, joint) in table.joints().iter().copied().enumerate() {
            match skeleton.lookup_joint(joint) {
                Some(handle) => {
                    joints.push(BoundJoint {
                        joint,
                        column,
                        handle,
                    });
                }
                None => {
                    tracing::warn!(%joint, "skeleton has no such joint, leaving it unbound");
                    missing.push(JointNotFound { joint });
                }
            }
        }

        // Identification covers every canonical joint the rig has, not only
        // the ones recorded in the table.
        let by_handle: HashMap<H, JointId> = JointId::ALL
            .iter()
            .filter_map(|&joint| skeleton.lookup_joint(joint).map(|handle| (handle, joint)))
            .collect();

        tracing::debug!(
            bound = joints.len(),
            identifiable = by_handle.len(),
            missing = missing.len(),
            "resolved joint binding"
        );
        Self {
            joints,
            by_handle,
            missing,
        }
    }

    /// Writes the rotation and position of every bound joint from `pose`.
    /// Unbound joints are left untouched.
    pub fn apply<S>(&self, skeleton: &mut S, pose: &PoseRecord)
    where
        S: Skeleton<Handle = H>,
    {
        for bound in &self.joints {
            if let Some(LocalTransform { rotation, position }) = pose.transform(bound.column) {
                skeleton.write_local_rotation(bound.handle, rotation);
                skeleton.write_local_position(bound.handle, position);
            }
        }
    }

    /// Canonical joint behind a rig handle, for any joint the rig exposes.
    pub fn identify(&self, handle: H) -> Option<JointId> {
        self.by_handle.get(&handle).copied()
    }

    pub fn handle(&self, joint: JointId) -> Option<H> {
        self.joints
            .iter()
            .find(|bound| bound.joint == joint)
            .map(|bound| bound.handle)
    }

    pub fn bound(&self) -> &[BoundJoint<H>] {
        &self.joints
    }

    pub fn missing(&self) -> &[JointNotFound] {
        &self.missing
    }

    pub fn len(&self) -> usize {
        self.joints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.joints.is_empty()
    }
}

/// Skeleton that keeps local transforms in memory. Handles are indices.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRig {
    joints: Vec<(JointId, LocalTransform)>,
    index: HashMap<JointId, usize>,
}

impl InMemoryRig {
    pub fn new(joints: impl IntoIterator<Item = JointId>) -> Self {
        let mut rig = Self::default();
        for joint in joints {
            if !rig.index.contains_key(&joint) {
                rig.index.insert(joint, rig.joints.len());
                rig.joints.push((joint, LocalTransform::default()));
            }
        }
        rig
    }

    /// Rig exposing every canonical joint.
    pub fn humanoid() -> Self {
        Self::new(JointId::ALL.iter().copied())
    }

    pub fn transform(&self, joint: JointId) -> Option<LocalTransform> {
        self.index.get(&joint).map(|&slot| self.joints[slot].1)
    }

    pub fn joints(&self) -> impl Iterator<Item = JointId> + '_ {
        self.joints.iter().map(|(joint, _)| *joint)
    }
}

impl Skeleton for InMemoryRig {
    type Handle = usize;

    fn lookup_joint(&self, joint: JointId) -> Option<usize> {
        self.index.get(&joint).copied()
    }

    fn write_local_rotation(&mut self, handle: usize, rotation: Quaternion<f32>) {
        if let Some((_, transform)) = self.joints.get_mut(handle) {
            transform.rotation = rotation;
        }
    }

    fn write_local_position(&mut self, handle: usize, position: Vector3<f32>) {
        if let Some((_, transform)) = self.joints.get_mut(handle) {
            transform.position = position;
        }
    }
}
