//! Binary cross-entropy against a constant label

use burn::nn::loss::BinaryCrossEntropyLossConfig;
use burn::prelude::*;

/// Which side of the real / fake split every row of a batch belongs to
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Label {
    Fake = 0,
    Real = 1,
}

/// Mean binary cross-entropy of `logits` (shape `[rows, 1]`) against `label`
///
/// Works on pre-sigmoid values so saturated outputs still give finite losses.
pub fn binary_cross_entropy<B: Backend>(logits: Tensor<B, 2>, label: Label) -> Tensor<B, 1> {
    let device = logits.device();
    let targets = match label {
        Label::Real => Tensor::<B, 2, Int>::ones(logits.dims(), &device),
        Label::Fake => Tensor::<B, 2, Int>::zeros(logits.dims(), &device),
    };
    BinaryCrossEntropyLossConfig::new()
        .with_logits(true)
        .init(&device)
        .forward(logits, targets)
}
