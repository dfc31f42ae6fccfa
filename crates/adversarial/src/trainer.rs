//! Alternating discriminator / generator optimisation
//!
//! Every step runs the same fixed sequence:
//!
//! 1. Play `batch_size` expert-vs-expert games and collect the "real"
//!    (state, action) pairs.
//! 2. Run the generator forward on those states and turn its probabilities
//!    into moves with the configured [`ActionPolicy`](crate::ActionPolicy), exactly as a
//!    [`GeneratorAgent`](crate::GeneratorAgent) would at the table.
//! 3. Label real pairs 1 and fake pairs 0.
//! 4. Update the discriminator once on the mean of the real and fake
//!    cross-entropies.
//! 5. Update the generator once so the discriminator scores its moves as
//!    real. Only generator parameters are stepped; the discriminator's
//!    gradients from this pass are dropped.
//!
//! The discriminator only ever sees discrete 0/1 actions. The generator
//! still receives a gradient through them via a straight-through estimate:
//! the forward pass uses the chosen move, the backward pass treats it as the
//! underlying probability.
//!
//! Both Adam optimisers clip gradient norms to `max_gradient_norm` before
//! applying an update. A non-finite loss or gradient ends the run with
//! [`GanError::NumericDivergence`] before the offending update is applied.

use burn::backend::{Autodiff, NdArray};
use burn::grad_clipping::GradientClippingConfig;
use burn::optim::adaptor::OptimizerAdaptor;
use burn::optim::{Adam, AdamConfig, GradientsParams, Optimizer};
use burn::prelude::*;
use burn::tensor::activation;
use burn::tensor::backend::AutodiffBackend;
use burn::tensor::{ElementConversion, TensorData};
use match_logic::{Move, SeededRng, STATE_DIM};
use ndarray::Axis;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument};

use crate::config::TrainerConfig;
use crate::dataset::sample_expert_batch;
use crate::error::{GanError, Result};
use crate::loss::{binary_cross_entropy, Label};
use crate::mlp::{tensor_from_rows, Mlp};
use crate::model::{ModelRole, ProbabilityModel};

/// Discriminator rows are a state followed by an action
pub const DISCRIMINATOR_INPUT_DIM: usize = STATE_DIM + 1;

/// CPU backend with reverse-mode autodiff
pub type TrainingBackend = Autodiff<NdArray>;

type MlpOptimizer<B> = OptimizerAdaptor<Adam, Mlp<B>, B>;

/// Scalars recorded for one training step
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StepLosses {
    pub epoch: usize,
    pub step: usize,
    /// Mean of the real and fake terms below
    pub discriminator_loss: f32,
    pub discriminator_real_loss: f32,
    pub discriminator_fake_loss: f32,
    pub generator_loss: f32,
    /// Global gradient norms before clipping
    pub discriminator_grad_norm: f32,
    pub generator_grad_norm: f32,
    /// Mean discriminator output on real and fake pairs, before its update
    pub real_score: f32,
    pub fake_score: f32,
    /// Share of generator moves in the batch that were DEFECT
    pub fake_defection_rate: f32,
}

/// Mean losses over one epoch
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EpochLosses {
    pub epoch: usize,
    pub discriminator_loss: f32,
    pub generator_loss: f32,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingHistory {
    pub steps: Vec<StepLosses>,
}

impl TrainingHistory {
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn last(&self) -> Option<&StepLosses> {
        self.steps.last()
    }

    pub fn epoch(&self, epoch: usize) -> Option<EpochLosses> {
        let steps: Vec<_> = self.steps.iter().filter(|s| s.epoch == epoch).collect();
        if steps.is_empty() {
            return None;
        }
        let n = steps.len() as f32;
        Some(EpochLosses {
            epoch,
            discriminator_loss: steps.iter().map(|s| s.discriminator_loss).sum::<f32>() / n,
            generator_loss: steps.iter().map(|s| s.generator_loss).sum::<f32>() / n,
        })
    }

    /// Per-epoch means, in epoch order
    pub fn epochs(&self) -> Vec<EpochLosses> {
        let count = self.steps.last().map_or(0, |s| s.epoch + 1);
        (0..count).filter_map(|epoch| self.epoch(epoch)).collect()
    }
}

/// Generator moves for one batch
struct FakeActions<B: Backend> {
    moves: Vec<Move>,
    /// `moves` as 0/1, shaped `[rows, 1]`, outside any autodiff graph
    actions: Tensor<B, 2>,
}

impl<B: Backend> FakeActions<B> {
    fn defection_rate(&self) -> f32 {
        if self.moves.is_empty() {
            return 0.0;
        }
        let defections = self.moves.iter().filter(|m| **m == Move::Defect).count();
        defections as f32 / self.moves.len() as f32
    }
}

struct DiscriminatorUpdate {
    loss: f32,
    real_loss: f32,
    fake_loss: f32,
    grad_norm: f32,
    real_score: f32,
    fake_score: f32,
}

struct GeneratorUpdate {
    loss: f32,
    grad_norm: f32,
}

/// Owns both networks and their optimisers for the duration of training
pub struct AdversarialTrainer<B: AutodiffBackend> {
    config: TrainerConfig,
    generator: Mlp<B>,
    discriminator: Mlp<B>,
    generator_optimizer: MlpOptimizer<B>,
    discriminator_optimizer: MlpOptimizer<B>,
    device: B::Device,
    rng: SeededRng,
    history: TrainingHistory,
}

impl AdversarialTrainer<TrainingBackend> {
    /// Fresh networks on the CPU backend
    pub fn from_config(config: TrainerConfig) -> Result<Self> {
        Self::from_config_on(config, &Default::default())
    }
}

impl<B: AutodiffBackend> AdversarialTrainer<B> {
    /// Fresh networks with `config.hidden_layers`, seeded from `config.seed`
    pub fn from_config_on(config: TrainerConfig, device: &B::Device) -> Result<Self> {
        config.validate()?;
        let root = SeededRng::new(config.seed, 0);
        let generator = Mlp::new(
            STATE_DIM,
            &config.hidden_layers,
            &mut root.for_stream(1),
            device,
        )?;
        let discriminator = Mlp::new(
            DISCRIMINATOR_INPUT_DIM,
            &config.hidden_layers,
            &mut root.for_stream(2),
            device,
        )?;
        Self::new(config, generator, discriminator)
    }

    pub fn new(config: TrainerConfig, generator: Mlp<B>, discriminator: Mlp<B>) -> Result<Self> {
        config.validate()?;
        if generator.input_dim() != STATE_DIM {
            return Err(GanError::Configuration(format!(
                "generator takes {} inputs, expected {STATE_DIM}",
                generator.input_dim()
            )));
        }
        if discriminator.input_dim() != DISCRIMINATOR_INPUT_DIM {
            return Err(GanError::Configuration(format!(
                "discriminator takes {} inputs, expected {DISCRIMINATOR_INPUT_DIM}",
                discriminator.input_dim()
            )));
        }

        let optimizer = AdamConfig::new()
            .with_grad_clipping(Some(GradientClippingConfig::Norm(config.max_gradient_norm)));
        Ok(Self {
            generator_optimizer: optimizer.init(),
            discriminator_optimizer: optimizer.init(),
            device: generator.device(),
            rng: SeededRng::new(config.seed, 0).for_stream(3),
            history: TrainingHistory::default(),
            config,
            generator,
            discriminator,
        })
    }

    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    pub fn generator(&self) -> &Mlp<B> {
        &self.generator
    }

    pub fn discriminator(&self) -> &Mlp<B> {
        &self.discriminator
    }

    pub fn history(&self) -> &TrainingHistory {
        &self.history
    }

    pub fn into_parts(self) -> (Mlp<B>, Mlp<B>, TrainingHistory) {
        (self.generator, self.discriminator, self.history)
    }

    /// Run every remaining step of every epoch
    #[instrument(level = "info", skip_all)]
    pub fn train(&mut self) -> Result<&TrainingHistory> {
        info!(
            epochs = self.config.epochs,
            steps_per_epoch = self.config.steps_per_epoch,
            batch_size = self.config.batch_size,
            rounds_per_game = self.config.rounds_per_game,
            policy = ?self.config.policy,
            "starting adversarial training"
        );

        while self.history.len() < self.config.total_steps() {
            let losses = self.step()?;
            if losses.step + 1 == self.config.steps_per_epoch {
                if let Some(summary) = self.history.epoch(losses.epoch) {
                    info!(
                        epoch = summary.epoch,
                        discriminator_loss = summary.discriminator_loss,
                        generator_loss = summary.generator_loss,
                        "epoch complete"
                    );
                }
            }
        }

        Ok(&self.history)
    }

    /// One training step; its losses are appended to the history
    pub fn step(&mut self) -> Result<StepLosses> {
        let index = self.history.len();
        let epoch = index / self.config.steps_per_epoch;
        let step = index % self.config.steps_per_epoch;

        let batch = sample_expert_batch(
            &mut self.rng,
            self.config.batch_size,
            self.config.rounds_per_game,
        )?;
        let states = tensor_from_rows(batch.states.view(), &self.device);
        let real_actions =
            tensor_from_rows(batch.actions.view().insert_axis(Axis(1)), &self.device);

        let fake = self.fake_actions(&states, epoch, step)?;
        let discriminator =
            self.update_discriminator(&states, real_actions, fake.actions.clone(), epoch, step)?;
        let generator = self.update_generator(&states, &fake, epoch, step)?;

        let losses = StepLosses {
            epoch,
            step,
            discriminator_loss: discriminator.loss,
            discriminator_real_loss: discriminator.real_loss,
            discriminator_fake_loss: discriminator.fake_loss,
            generator_loss: generator.loss,
            discriminator_grad_norm: discriminator.grad_norm,
            generator_grad_norm: generator.grad_norm,
            real_score: discriminator.real_score,
            fake_score: discriminator.fake_score,
            fake_defection_rate: fake.defection_rate(),
        };
        debug!(
            epoch,
            step,
            discriminator_loss = losses.discriminator_loss,
            generator_loss = losses.generator_loss,
            discriminator_grad_norm = losses.discriminator_grad_norm,
            generator_grad_norm = losses.generator_grad_norm,
            "training step"
        );
        self.history.steps.push(losses.clone());
        Ok(losses)
    }

    /// Generator forward pass plus the policy's discrete choice, no update
    fn fake_actions(
        &mut self,
        states: &Tensor<B, 2>,
        epoch: usize,
        step: usize,
    ) -> Result<FakeActions<B>> {
        let probabilities: Vec<f32> = self
            .generator
            .forward(states.clone())
            .into_data()
            .iter::<f32>()
            .collect();
        if let Some(bad) = probabilities.iter().copied().find(|p| !p.is_finite()) {
            return Err(self.diverged(ModelRole::Generator, bad, epoch, step));
        }

        let moves = probabilities
            .iter()
            .map(|p| self.config.policy.decide(*p, &mut self.rng))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let values: Vec<f32> = moves.iter().map(|m| m.as_f32()).collect();
        let actions = Tensor::from_data(TensorData::new(values, [moves.len(), 1]), &self.device);
        Ok(FakeActions { moves, actions })
    }

    fn update_discriminator(
        &mut self,
        states: &Tensor<B, 2>,
        real_actions: Tensor<B, 2>,
        fake_actions: Tensor<B, 2>,
        epoch: usize,
        step: usize,
    ) -> Result<DiscriminatorUpdate> {
        let real_logits = self
            .discriminator
            .logits(Tensor::cat(vec![states.clone(), real_actions], 1));
        let fake_logits = self
            .discriminator
            .logits(Tensor::cat(vec![states.clone(), fake_actions], 1));
        let real_score = scalar(activation::sigmoid(real_logits.clone()).mean());
        let fake_score = scalar(activation::sigmoid(fake_logits.clone()).mean());

        let real_loss = binary_cross_entropy(real_logits, Label::Real);
        let fake_loss = binary_cross_entropy(fake_logits, Label::Fake);
        let real_value = scalar(real_loss.clone());
        let fake_value = scalar(fake_loss.clone());
        let loss = (real_loss + fake_loss).div_scalar(2.0);
        let value = scalar(loss.clone());
        self.check_finite(ModelRole::Discriminator, value, value, epoch, step)?;

        let grads = loss.backward();
        let grad_norm = self.discriminator.gradient_norm(&grads);
        self.check_finite(ModelRole::Discriminator, grad_norm, value, epoch, step)?;

        let grads = GradientsParams::from_grads(grads, &self.discriminator);
        self.discriminator = self.discriminator_optimizer.step(
            f64::from(self.config.discriminator_learning_rate),
            self.discriminator.clone(),
            grads,
        );

        Ok(DiscriminatorUpdate {
            loss: value,
            real_loss: real_value,
            fake_loss: fake_value,
            grad_norm,
            real_score,
            fake_score,
        })
    }

    fn update_generator(
        &mut self,
        states: &Tensor<B, 2>,
        fake: &FakeActions<B>,
        epoch: usize,
        step: usize,
    ) -> Result<GeneratorUpdate> {
        // Straight-through: the chosen move going forward, d(move)/dp = 1 going back
        let probabilities = self.generator.forward(states.clone());
        let actions =
            probabilities.clone() - probabilities.detach() + fake.actions.clone();

        let logits = self
            .discriminator
            .logits(Tensor::cat(vec![states.clone(), actions], 1));
        let loss = binary_cross_entropy(logits, Label::Real);
        let value = scalar(loss.clone());
        self.check_finite(ModelRole::Generator, value, value, epoch, step)?;

        let grads = loss.backward();
        let grad_norm = self.generator.gradient_norm(&grads);
        self.check_finite(ModelRole::Generator, grad_norm, value, epoch, step)?;

        let grads = GradientsParams::from_grads(grads, &self.generator);
        self.generator = self.generator_optimizer.step(
            f64::from(self.config.generator_learning_rate),
            self.generator.clone(),
            grads,
        );

        Ok(GeneratorUpdate {
            loss: value,
            grad_norm,
        })
    }

    fn check_finite(
        &self,
        model: ModelRole,
        value: f32,
        loss: f32,
        epoch: usize,
        step: usize,
    ) -> Result<()> {
        if value.is_finite() {
            return Ok(());
        }
        Err(self.diverged(model, loss, epoch, step))
    }

    fn diverged(&self, model: ModelRole, loss: f32, epoch: usize, step: usize) -> GanError {
        error!(%model, loss, epoch, step, "numeric divergence, aborting training");
        GanError::NumericDivergence {
            model,
            epoch,
            step,
            loss,
        }
    }
}

fn scalar<B: Backend>(tensor: Tensor<B, 1>) -> f32 {
    tensor.into_scalar().elem()
}
