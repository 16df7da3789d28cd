use nalgebra::{Quaternion, Vector3};

/// Local rotation and position of a single joint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalTransform {
    pub rotation: Quaternion<f32>,
    pub position: Vector3<f32>,
}

impl Default for LocalTransform {
    fn default() -> Self {
        Self {
            rotation: Quaternion::identity(),
            position: Vector3::zeros(),
        }
    }
}

/// One timestamped pose sample.
///
/// `rotations` and `positions` hold one entry per joint, in the order of the
/// [`JointTable`](crate::JointTable) the record was parsed with.
#[derive(Debug, Clone, PartialEq)]
pub struct PoseRecord {
    pub time: f64,
    pub rotations: Vec<Quaternion<f32>>,
    pub positions: Vec<Vector3<f32>>,
}

impl PoseRecord {
    pub fn new(time: f64, rotations: Vec<Quaternion<f32>>, positions: Vec<Vector3<f32>>) -> Self {
        debug_assert_eq!(rotations.len(), positions.len());
        Self {
            time,
            rotations,
            positions,
        }
    }

    /// Record with every joint at the identity rotation and origin.
    pub fn rest(time: f64, joint_count: usize) -> Self {
        Self::new(
            time,
            vec![Quaternion::identity(); joint_count],
            vec![Vector3::zeros(); joint_count],
        )
    }

    pub fn joint_count(&self) -> usize {
        self.rotations.len()
    }

    pub fn transform(&self, index: usize) -> Option<LocalTransform> {
        let rotation = *self.rotations.get(index)?;
        let position = *self.positions.get(index)?;
        Some(LocalTransform { rotation, position })
    }
}
