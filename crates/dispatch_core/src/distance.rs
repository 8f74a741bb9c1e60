use bevy_ecs::prelude::Resource;

use crate::error::ConfigError;
use crate::hospital::HospitalId;

/// Inter-hospital distances, read-only after load. Symmetry is not required.
#[derive(Debug, Clone, PartialEq, Eq, Resource)]
pub struct DistanceModel {
    matrix: Vec<Vec<u64>>,
}

impl DistanceModel {
    pub fn new(matrix: Vec<Vec<u64>>) -> Result<Self, ConfigError> {
        let size = matrix.len();
        if size == 0 {
            return Err(ConfigError::EmptyNetwork);
        }
        if let Some((row, entries)) = matrix.iter().enumerate().find(|(_, r)| r.len() != size) {
            return Err(ConfigError::DistanceMatrixShape {
                row: row + 1,
                expected: size,
                found: entries.len(),
            });
        }
        Ok(Self { matrix })
    }

    pub fn hospital_count(&self) -> usize {
        self.matrix.len()
    }

    /// Distance from `from` to `to`, or `None` if either id is outside the network.
    pub fn distance(&self, from: HospitalId, to: HospitalId) -> Option<u64> {
        let row = self.matrix.get(from.index()?)?;
        row.get(to.index()?).copied()
    }

    pub fn rows(&self) -> &[Vec<u64>] {
        &self.matrix
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_square_matrix() {
        let err = DistanceModel::new(vec![vec![0, 4], vec![4]]).expect_err("ragged");
        assert_eq!(
            err,
            ConfigError::DistanceMatrixShape {
                row: 2,
                expected: 2,
                found: 1
            }
        );
        assert_eq!(
            DistanceModel::new(Vec::new()),
            Err(ConfigError::EmptyNetwork)
        );
    }

    #[test]
    fn lookups_are_one_based_and_directional() {
        let model = DistanceModel::new(vec![vec![0, 7], vec![3, 0]]).expect("model");
        assert_eq!(model.distance(HospitalId(1), HospitalId(2)), Some(7));
        assert_eq!(model.distance(HospitalId(2), HospitalId(1)), Some(3));
        assert_eq!(model.distance(HospitalId(0), HospitalId(1)), None);
        assert_eq!(model.distance(HospitalId(1), HospitalId(3)), None);
    }
}
