//! Hand-written models with known behavior for tests

use ndarray::{Array1, ArrayView2};

use crate::model::ProbabilityModel;

/// Always answers the same probability
#[derive(Clone, Copy, Debug)]
pub struct ConstantModel(pub f32);

impl ProbabilityModel for ConstantModel {
    fn input_dim(&self) -> usize {
        match_logic::STATE_DIM
    }

    fn predict(&self, inputs: ArrayView2<'_, f32>) -> Array1<f32> {
        Array1::from_elem(inputs.nrows(), self.0)
    }
}

/// Defects exactly when the opponent just defected, i.e. Tit-for-Tat
#[derive(Clone, Copy, Debug)]
pub struct MirrorModel;

impl ProbabilityModel for MirrorModel {
    fn input_dim(&self) -> usize {
        match_logic::STATE_DIM
    }

    fn predict(&self, inputs: ArrayView2<'_, f32>) -> Array1<f32> {
        // Opponent's previous move sits in column 0; the round-0 sentinel maps to 0
        inputs.column(0).mapv(|v| v.max(0.0))
    }
}
