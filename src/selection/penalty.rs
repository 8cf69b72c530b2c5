//! selection::penalty — weighted group-lasso penalty and its dual ball.
//!
//! Purpose
//! -------
//! Represent `P(β) = Σ_g w_g ‖β_g‖₂` over a partition of the coordinates,
//! with the proximal map used by the penalized solver and the dual-ball
//! projection used by the conditional sampler.
//!
//! Key behaviors
//! -------------
//! - [`GroupLasso::prox`] is block soft-thresholding; zero-weight groups
//!   are left untouched and play the role of unpenalized coordinates.
//! - [`GroupLasso::dual`] restricts the dual ball `{u : ‖u_g‖ ≤ c·w_g}` to a
//!   set of (inactive) coordinates, returning a [`GroupLassoDual`] whose
//!   [`GroupLassoDual::bound_prox`] projects onto it.
//!
//! Invariants & assumptions
//! ------------------------
//! - Group labels are `0..weights.len()`; every label owns at least one
//!   coordinate and every weight is finite and nonnegative. Checked in
//!   [`GroupLasso::new`].
//! - The plain lasso is the special case with one group per coordinate.
use ndarray::{Array1, ArrayView1};

use crate::selection::errors::{SelectionError, SelectionResult};

/// Weighted group lasso.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupLasso {
    groups: Vec<usize>,
    weights: Vec<f64>,
    members: Vec<Vec<usize>>,
}

impl GroupLasso {
    /// Build a group lasso from per-coordinate labels and per-group weights.
    ///
    /// # Errors
    /// - [`SelectionError::InvalidGroup`] if a label is `≥ weights.len()`.
    /// - [`SelectionError::EmptyGroup`] if a label owns no coordinate.
    /// - [`SelectionError::InvalidWeight`] for a negative or non-finite weight.
    pub fn new(groups: Vec<usize>, weights: Vec<f64>) -> SelectionResult<Self> {
        let num_groups = weights.len();
        for (group, &weight) in weights.iter().enumerate() {
            if !weight.is_finite() || weight < 0.0 {
                return Err(SelectionError::InvalidWeight { group, weight });
            }
        }
        let mut members = vec![Vec::new(); num_groups];
        for (index, &group) in groups.iter().enumerate() {
            if group >= num_groups {
                return Err(SelectionError::InvalidGroup { index, group, num_groups });
            }
            members[group].push(index);
        }
        if let Some(group) = members.iter().position(Vec::is_empty) {
            return Err(SelectionError::EmptyGroup { group });
        }
        Ok(Self { groups, weights, members })
    }

    /// One group per coordinate.
    pub fn lasso(weights: Vec<f64>) -> SelectionResult<Self> {
        Self::new((0..weights.len()).collect(), weights)
    }

    pub fn dim(&self) -> usize {
        self.groups.len()
    }

    pub fn num_groups(&self) -> usize {
        self.weights.len()
    }

    /// Group label of every coordinate.
    pub fn groups(&self) -> &[usize] {
        &self.groups
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Coordinates owned by `group`, in increasing order.
    pub fn members(&self, group: usize) -> &[usize] {
        &self.members[group]
    }

    fn group_norm(&self, group: usize, v: &ArrayView1<f64>) -> f64 {
        self.members[group].iter().map(|&j| v[j] * v[j]).sum::<f64>().sqrt()
    }

    /// `Σ_g w_g ‖β_g‖₂`.
    pub fn value(&self, beta: &ArrayView1<f64>) -> f64 {
        (0..self.num_groups()).map(|g| self.weights[g] * self.group_norm(g, beta)).sum()
    }

    /// Proximal map of `step · P` at `v`: each group shrinks toward zero by
    /// `step · w_g` in Euclidean norm.
    pub fn prox(&self, v: &ArrayView1<f64>, step: f64) -> Array1<f64> {
        let mut out = v.to_owned();
        for group in 0..self.num_groups() {
            let weight = self.weights[group];
            if weight == 0.0 {
                continue;
            }
            let norm = self.group_norm(group, v);
            let factor = if norm > step * weight { 1.0 - step * weight / norm } else { 0.0 };
            for &j in &self.members[group] {
                out[j] *= factor;
            }
        }
        out
    }

    /// dual — dual ball restricted to `coords`, scaled by `scale`.
    ///
    /// Parameters
    /// ----------
    /// - `coords`: coordinates that make up the dual vector, in the order
    ///   they appear in it. Each group present should be wholly included.
    /// - `scale`: multiplier applied to every group radius.
    ///
    /// Returns
    /// -------
    /// A [`GroupLassoDual`] over a vector of length `coords.len()` whose
    /// blocks are the groups of `coords` with radius `scale · w_g`.
    pub fn dual(&self, coords: &[usize], scale: f64) -> GroupLassoDual {
        let mut blocks: Vec<DualBlock> = Vec::new();
        let mut block_of_group: Vec<Option<usize>> = vec![None; self.num_groups()];
        for (position, &coord) in coords.iter().enumerate() {
            let group = self.groups[coord];
            match block_of_group[group] {
                Some(b) => blocks[b].positions.push(position),
                None => {
                    block_of_group[group] = Some(blocks.len());
                    blocks.push(DualBlock {
                        positions: vec![position],
                        radius: scale * self.weights[group],
                    });
                }
            }
        }
        GroupLassoDual { blocks, dim: coords.len() }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct DualBlock {
    positions: Vec<usize>,
    radius: f64,
}

/// Product of Euclidean balls `{u : ‖u_b‖₂ ≤ r_b}` over disjoint blocks.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupLassoDual {
    blocks: Vec<DualBlock>,
    dim: usize,
}

impl GroupLassoDual {
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Euclidean projection onto the ball product.
    pub fn bound_prox(&self, u: &ArrayView1<f64>) -> Array1<f64> {
        let mut out = u.to_owned();
        for block in &self.blocks {
            let norm = block.positions.iter().map(|&i| u[i] * u[i]).sum::<f64>().sqrt();
            if norm > block.radius {
                let factor = if norm > 0.0 { block.radius / norm } else { 0.0 };
                for &i in &block.positions {
                    out[i] *= factor;
                }
            }
        }
        out
    }

    /// Whether every block satisfies `‖u_b‖ ≤ r_b + tol`.
    pub fn contains(&self, u: &ArrayView1<f64>, tol: f64) -> bool {
        self.blocks.iter().all(|block| {
            let norm = block.positions.iter().map(|&i| u[i] * u[i]).sum::<f64>().sqrt();
            norm <= block.radius + tol
        })
    }

    /// `(position, radius)` for every single-coordinate block; these are the
    /// dual constraints expressible as box rows `|u_i| ≤ r`.
    pub fn singleton_bounds(&self) -> Vec<(usize, f64)> {
        self.blocks
            .iter()
            .filter(|block| block.positions.len() == 1)
            .map(|block| (block.positions[0], block.radius))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    // Purpose
    // -------
    // Block soft-thresholding shrinks the group norm by `step · w_g` and
    // zeroes groups below the threshold; weight-zero groups pass through.
    //
    // Given
    // -----
    // - groups [0, 0, 1, 2], weights [1, 2, 0], v = (3, 4, 5, -7), step 1.
    //
    // Expect
    // ------
    // - Group 0 (norm 5) scaled by 4/5; group 1 (norm 5) shrunk to norm 3;
    //   group 2 untouched; a group with norm below its weight is zeroed.
    fn prox_shrinks_groups_and_skips_unpenalized() {
        // Arrange
        let pen = GroupLasso::new(vec![0, 0, 1, 2], vec![1.0, 2.0, 0.0]).unwrap();
        let v = array![3.0, 4.0, 5.0, -7.0];

        // Act
        let out = pen.prox(&v.view(), 1.0);

        // Assert
        assert!((out[0] - 2.4).abs() < 1e-12);
        assert!((out[1] - 3.2).abs() < 1e-12);
        assert!((out[2] - 3.0).abs() < 1e-12);
        assert_eq!(out[3], -7.0);

        let zeroed = pen.prox(&array![0.3, 0.4, 1.0, 0.0].view(), 1.0);
        assert_eq!(zeroed.slice(ndarray::s![0..3]), array![0.0, 0.0, 0.0]);
    }

    #[test]
    // Purpose
    // -------
    // The dual projection keeps points inside each ball and maps points
    // outside to the boundary.
    fn dual_projection_lands_on_ball() {
        // Arrange
        let pen = GroupLasso::new(vec![0, 1, 1, 2], vec![1.0, 2.0, 0.5]).unwrap();
        let dual = pen.dual(&[1, 2, 3], 0.5);

        // Act
        let projected = dual.bound_prox(&array![3.0, 4.0, 0.1].view());

        // Assert
        let norm = (projected[0].powi(2) + projected[1].powi(2)).sqrt();
        assert!((norm - 1.0).abs() < 1e-12);
        assert!((projected[2] - 0.1).abs() < 1e-12);
        assert!(dual.contains(&projected.view(), 1e-12));
        assert_eq!(dual.singleton_bounds(), vec![(2, 0.25)]);
    }

    #[test]
    // Purpose
    // -------
    // Malformed group structures are rejected at construction.
    fn constructor_validates_groups_and_weights() {
        assert!(matches!(
            GroupLasso::new(vec![0, 2], vec![1.0, 1.0]),
            Err(SelectionError::InvalidGroup { index: 1, group: 2, num_groups: 2 })
        ));
        assert!(matches!(
            GroupLasso::new(vec![0, 0], vec![1.0, 1.0]),
            Err(SelectionError::EmptyGroup { group: 1 })
        ));
        assert!(matches!(
            GroupLasso::lasso(vec![1.0, -0.5]),
            Err(SelectionError::InvalidWeight { group: 1, .. })
        ));
    }

    #[test]
    fn value_sums_weighted_group_norms() {
        let pen = GroupLasso::new(vec![0, 0, 1], vec![2.0, 1.0]).unwrap();
        assert!((pen.value(&array![3.0, 4.0, -1.0].view()) - 11.0).abs() < 1e-12);
    }
}
