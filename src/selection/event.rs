//! selection::event — tagged record of what a selection procedure chose.
//!
//! A [`SelectionEvent`] is produced once per fit and never mutated. It
//! records, per coordinate, whether the coordinate is active (penalized and
//! selected), unpenalized, or inactive, the sign of active coordinates, the
//! group structure, and the unit direction of each active group.
//!
//! Invariants
//! ----------
//! - `signs[j] == 0` whenever coordinate `j` is not active.
//! - `selected` and `unpenalized` are disjoint masks of length `p`.
//! - `directions` is `p × active_groups.len()`; column `k` is supported on
//!   the coordinates of `active_groups[k]` and has unit Euclidean norm.
use ndarray::{Array1, Array2, ArrayView1};

use crate::selection::penalty::GroupLasso;

/// Active groups need `‖β_g‖ > ACTIVE_TOL · w_g`.
pub const ACTIVE_TOL: f64 = 1e-6;

#[derive(Debug, Clone, PartialEq)]
pub struct SelectionEvent {
    signs: Array1<f64>,
    selected: Vec<bool>,
    unpenalized: Vec<bool>,
    groups: Vec<usize>,
    active_groups: Vec<usize>,
    unpenalized_groups: Vec<usize>,
    directions: Array2<f64>,
}

impl SelectionEvent {
    /// Event of a coordinate-wise rule: nonzero entries of `signs` are the
    /// selected coordinates, each its own group with direction `±e_j`.
    pub fn from_signs(signs: Array1<f64>) -> Self {
        let p = signs.len();
        let signs = signs.mapv(sign);
        let selected: Vec<bool> = signs.iter().map(|&s| s != 0.0).collect();
        let active_groups: Vec<usize> = (0..p).filter(|&j| selected[j]).collect();
        let mut directions = Array2::zeros((p, active_groups.len()));
        for (k, &j) in active_groups.iter().enumerate() {
            directions[[j, k]] = signs[j];
        }
        Self {
            signs,
            selected,
            unpenalized: vec![false; p],
            groups: (0..p).collect(),
            active_groups,
            unpenalized_groups: Vec::new(),
            directions,
        }
    }

    /// from_solution — classify the groups of a penalized solution.
    ///
    /// A group is active when its weight is positive and
    /// `‖β_g‖ > ACTIVE_TOL · w_g`; unpenalized when its weight is zero;
    /// inactive otherwise. Active directions are `β_g / ‖β_g‖`.
    pub fn from_solution(beta: &ArrayView1<f64>, penalty: &GroupLasso) -> Self {
        let p = beta.len();
        let mut selected = vec![false; p];
        let mut unpenalized = vec![false; p];
        let mut active_groups = Vec::new();
        let mut unpenalized_groups = Vec::new();

        for group in 0..penalty.num_groups() {
            let weight = penalty.weights()[group];
            let members = penalty.members(group);
            if weight == 0.0 {
                unpenalized_groups.push(group);
                members.iter().for_each(|&j| unpenalized[j] = true);
                continue;
            }
            let norm = members.iter().map(|&j| beta[j] * beta[j]).sum::<f64>().sqrt();
            if norm > ACTIVE_TOL * weight {
                active_groups.push(group);
                members.iter().for_each(|&j| selected[j] = true);
            }
        }

        let mut directions = Array2::zeros((p, active_groups.len()));
        for (k, &group) in active_groups.iter().enumerate() {
            let members = penalty.members(group);
            let norm = members.iter().map(|&j| beta[j] * beta[j]).sum::<f64>().sqrt();
            for &j in members {
                directions[[j, k]] = beta[j] / norm;
            }
        }

        let signs = Array1::from_shape_fn(p, |j| {
            if selected[j] { sign(beta[j]) } else { 0.0 }
        });

        Self {
            signs,
            selected,
            unpenalized,
            groups: penalty.groups().to_vec(),
            active_groups,
            unpenalized_groups,
            directions,
        }
    }

    pub fn dim(&self) -> usize {
        self.signs.len()
    }

    pub fn signs(&self) -> &Array1<f64> {
        &self.signs
    }

    /// Active penalized coordinates.
    pub fn selected(&self) -> &[bool] {
        &self.selected
    }

    pub fn unpenalized(&self) -> &[bool] {
        &self.unpenalized
    }

    pub fn groups(&self) -> &[usize] {
        &self.groups
    }

    pub fn active_groups(&self) -> &[usize] {
        &self.active_groups
    }

    pub fn unpenalized_groups(&self) -> &[usize] {
        &self.unpenalized_groups
    }

    /// Unit direction of each active group, one column per group.
    pub fn directions(&self) -> &Array2<f64> {
        &self.directions
    }

    /// Active ∪ unpenalized.
    pub fn overall(&self) -> Vec<bool> {
        self.selected.iter().zip(&self.unpenalized).map(|(&a, &u)| a || u).collect()
    }

    /// Complement of [`overall`](Self::overall).
    pub fn inactive(&self) -> Vec<bool> {
        self.overall().into_iter().map(|o| !o).collect()
    }

    pub fn selected_indices(&self) -> Vec<usize> {
        (0..self.dim()).filter(|&j| self.selected[j]).collect()
    }

    pub fn num_selected(&self) -> usize {
        self.selected.iter().filter(|&&s| s).count()
    }

    /// Nothing was selected and nothing is unpenalized: there is no
    /// selected model to do inference on.
    pub fn is_empty(&self) -> bool {
        self.overall().iter().all(|&o| !o)
    }
}

/// Sign with `sign(0) = 0`; `f64::signum` maps 0.0 to 1.0.
pub(crate) fn sign(x: f64) -> f64 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}
