//! What evaluation needs from a model
//!
//! Both the generator and the discriminator map a row of features to a
//! single probability. Replaying a generator only needs [`ProbabilityModel`],
//! which reads parameters and never touches them.

use std::fmt;

use ndarray::{aview1, Array1, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

/// Which half of the adversarial pair a model plays
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModelRole {
    Generator,
    Discriminator,
}

impl fmt::Display for ModelRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelRole::Generator => f.write_str("generator"),
            ModelRole::Discriminator => f.write_str("discriminator"),
        }
    }
}

/// Forward evaluation only
pub trait ProbabilityModel {
    /// Number of features expected per row
    fn input_dim(&self) -> usize;

    /// One probability in [0, 1] per input row
    fn predict(&self, inputs: ArrayView2<'_, f32>) -> Array1<f32>;

    fn probability(&self, input: &[f32]) -> f32 {
        let row = aview1(input).insert_axis(Axis(0));
        self.predict(row)[0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::ConstantModel;

    #[test]
    fn test_role_display() {
        assert_eq!(ModelRole::Generator.to_string(), "generator");
        assert_eq!(ModelRole::Discriminator.to_string(), "discriminator");
    }

    #[test]
    fn test_probability_reads_single_row() {
        assert_eq!(ConstantModel(0.25).probability(&[0.0, 1.0]), 0.25);
    }
}
