//! A small fully-connected network: tanh hidden layers, sigmoid output

use burn::module::Param;
use burn::nn::Linear;
use burn::prelude::*;
use burn::tensor::activation;
use burn::tensor::backend::AutodiffBackend;
use burn::tensor::{ElementConversion, TensorData};
use ndarray::{Array1, Array2, ArrayView2};
use rand::Rng;

use crate::error::{GanError, Result};
use crate::model::ProbabilityModel;

#[derive(Module, Debug)]
pub struct Mlp<B: Backend> {
    hidden: Vec<Linear<B>>,
    output: Linear<B>,
}

impl<B: Backend> Mlp<B> {
    /// Glorot-uniform weights, zero biases, one output unit
    ///
    /// Weights come from `rng` rather than the backend's global generator, so
    /// the same seed always builds the same network.
    pub fn new<R: Rng + ?Sized>(
        input_dim: usize,
        hidden: &[usize],
        rng: &mut R,
        device: &B::Device,
    ) -> Result<Self> {
        if input_dim == 0 {
            return Err(GanError::Configuration(
                "input_dim must be greater than 0".to_string(),
            ));
        }
        if hidden.contains(&0) {
            return Err(GanError::Configuration(
                "hidden layer widths must be greater than 0".to_string(),
            ));
        }

        let mut sizes = Vec::with_capacity(hidden.len() + 2);
        sizes.push(input_dim);
        sizes.extend_from_slice(hidden);
        sizes.push(1);

        let mut weights = Vec::with_capacity(sizes.len() - 1);
        let mut biases = Vec::with_capacity(sizes.len() - 1);
        for pair in sizes.windows(2) {
            let (fan_in, fan_out) = (pair[0], pair[1]);
            let limit = (6.0 / (fan_in + fan_out) as f32).sqrt();
            weights.push(Array2::from_shape_fn((fan_in, fan_out), |_| {
                rng.random_range(-limit..limit)
            }));
            biases.push(Array1::zeros(fan_out));
        }

        Self::from_parameters(weights, biases, device)
    }

    /// Build from explicit parameters, checking that the layers chain up
    pub fn from_parameters(
        weights: Vec<Array2<f32>>,
        biases: Vec<Array1<f32>>,
        device: &B::Device,
    ) -> Result<Self> {
        if weights.is_empty() || weights.len() != biases.len() {
            return Err(GanError::Configuration(format!(
                "expected matching non-empty layer lists, got {} weights and {} biases",
                weights.len(),
                biases.len()
            )));
        }
        for (i, (w, b)) in weights.iter().zip(&biases).enumerate() {
            if w.ncols() != b.len() {
                return Err(GanError::Configuration(format!(
                    "layer {i}: {} outputs but {} biases",
                    w.ncols(),
                    b.len()
                )));
            }
            if let Some(next) = weights.get(i + 1) {
                if next.nrows() != w.ncols() {
                    return Err(GanError::Configuration(format!(
                        "layer {} expects {} inputs but layer {i} produces {}",
                        i + 1,
                        next.nrows(),
                        w.ncols()
                    )));
                }
            }
        }
        if weights.last().map(|w| w.ncols()) != Some(1) {
            return Err(GanError::Configuration(
                "the last layer must have a single output".to_string(),
            ));
        }

        let mut layers: Vec<Linear<B>> = weights
            .iter()
            .zip(&biases)
            .map(|(w, b)| linear(w, b, device))
            .collect();
        match layers.pop() {
            Some(output) => Ok(Self {
                hidden: layers,
                output,
            }),
            None => Err(GanError::Configuration(
                "a network needs at least one layer".to_string(),
            )),
        }
    }

    pub fn layer_count(&self) -> usize {
        self.hidden.len() + 1
    }

    pub fn device(&self) -> B::Device {
        self.output.weight.device()
    }

    /// Pre-sigmoid outputs, shaped `[rows, 1]`
    pub fn logits(&self, inputs: Tensor<B, 2>) -> Tensor<B, 2> {
        let features = self
            .hidden
            .iter()
            .fold(inputs, |x, layer| activation::tanh(layer.forward(x)));
        self.output.forward(features)
    }

    /// Probabilities, shaped `[rows, 1]`
    pub fn forward(&self, inputs: Tensor<B, 2>) -> Tensor<B, 2> {
        activation::sigmoid(self.logits(inputs))
    }

    fn layers(&self) -> impl Iterator<Item = &Linear<B>> {
        self.hidden.iter().chain(std::iter::once(&self.output))
    }

    /// Every weight and bias, layer by layer
    #[cfg(test)]
    pub(crate) fn flat_parameters(&self) -> Vec<f32> {
        let mut values = Vec::new();
        for layer in self.layers() {
            values.extend(layer.weight.val().into_data().iter::<f32>());
            if let Some(bias) = &layer.bias {
                values.extend(bias.val().into_data().iter::<f32>());
            }
        }
        values
    }
}

impl<B: AutodiffBackend> Mlp<B> {
    /// L2 norm over every parameter gradient this network has in `grads`
    pub fn gradient_norm(&self, grads: &B::Gradients) -> f32 {
        let mut squares = 0.0;
        for layer in self.layers() {
            if let Some(grad) = layer.weight.grad(grads) {
                squares += sum_of_squares(grad);
            }
            if let Some(grad) = layer.bias.as_ref().and_then(|bias| bias.grad(grads)) {
                squares += sum_of_squares(grad);
            }
        }
        squares.sqrt()
    }
}

impl<B: Backend> ProbabilityModel for Mlp<B> {
    fn input_dim(&self) -> usize {
        self.layers().next().map_or(0, |layer| layer.weight.dims()[0])
    }

    fn predict(&self, inputs: ArrayView2<'_, f32>) -> Array1<f32> {
        if inputs.nrows() == 0 {
            return Array1::zeros(0);
        }
        let inputs = tensor_from_rows(inputs, &self.device());
        self.forward(inputs).into_data().iter::<f32>().collect()
    }
}

/// Copy a row-major feature matrix onto `device`
pub(crate) fn tensor_from_rows<B: Backend>(
    rows: ArrayView2<'_, f32>,
    device: &B::Device,
) -> Tensor<B, 2> {
    let shape = [rows.nrows(), rows.ncols()];
    let values: Vec<f32> = rows.iter().copied().collect();
    Tensor::from_data(TensorData::new(values, shape), device)
}

fn linear<B: Backend>(weight: &Array2<f32>, bias: &Array1<f32>, device: &B::Device) -> Linear<B> {
    let weight = tensor_from_rows(weight.view(), device);
    let bias = Tensor::from_data(TensorData::new(bias.to_vec(), [bias.len()]), device);
    Linear {
        weight: Param::from_tensor(weight),
        bias: Some(Param::from_tensor(bias)),
    }
}

fn sum_of_squares<B: Backend, const D: usize>(tensor: Tensor<B, D>) -> f32 {
    (tensor.clone() * tensor).sum().into_scalar().elem()
}
