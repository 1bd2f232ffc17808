use std::path::Path;

use burn::backend::{Autodiff, NdArray};
use burn::module::AutodiffModule;
use burn::optim::adaptor::OptimizerAdaptor;
use burn::optim::{Adam, AdamConfig, GradientsParams, Optimizer};
use burn::prelude::*;
use burn::record::DefaultRecorder;
use burn::tensor::TensorData;
use log::debug;

use crate::ai::networks::{QNetwork, QNetworkConfig};
use crate::ai::state_encoding::{decode_rows, encode_state, encode_states_batch};
use crate::ai::Transition;
use crate::error::{CheckpointError, TrainingError};
use crate::game::{Observation, NUM_CELLS};

pub(crate) type InferBackend = NdArray<f32>;
pub(crate) type TrainBackend = Autodiff<InferBackend>;

/// Index of the largest value; the first one wins ties.
pub fn argmax(values: &[f32]) -> usize {
    let mut best = 0;
    for (i, &v) in values.iter().enumerate() {
        if v > values[best] {
            best = i;
        }
    }
    best
}

/// Training target for one transition.
///
/// Starts from the online estimator's values for the state and overwrites
/// the taken action's entry: with the raw reward for terminal transitions,
/// otherwise with `reward + gamma * target_next[argmax(online_next)]`. The
/// online estimator picks the next action and the target estimator
/// evaluates it.
pub fn double_dqn_target(
    current: &[f32; NUM_CELLS],
    online_next: &[f32; NUM_CELLS],
    target_next: &[f32; NUM_CELLS],
    action: usize,
    reward: f32,
    done: bool,
    gamma: f32,
) -> [f32; NUM_CELLS] {
    let mut target = *current;
    target[action] = if done {
        reward
    } else {
        reward + gamma * target_next[argmax(online_next)]
    };
    target
}

/// Hyperparameters the learner needs.
#[derive(Debug, Clone)]
pub struct LearnerConfig {
    pub learning_rate: f64,
    pub gamma: f32,
    pub update_target_steps: usize,
    pub hidden_size: usize,
}

/// Online + target estimators and the Adam optimizer driving the online one.
///
/// The target estimator is never updated by gradient descent; every
/// `update_target_steps` training steps it is replaced by a copy of the
/// online estimator.
pub struct DoubleDqnLearner {
    online: QNetwork<TrainBackend>,
    target: QNetwork<InferBackend>,
    optimizer: OptimizerAdaptor<Adam, QNetwork<TrainBackend>, TrainBackend>,
    net_config: QNetworkConfig,
    config: LearnerConfig,
    device: <TrainBackend as Backend>::Device,
    step_count: usize,
}

impl DoubleDqnLearner {
    pub fn new(config: LearnerConfig) -> Self {
        let device = Default::default();
        let net_config = QNetworkConfig::new().with_hidden_size(config.hidden_size);
        let online: QNetwork<TrainBackend> = net_config.init(&device);
        let target = online.valid();

        DoubleDqnLearner {
            online,
            target,
            optimizer: AdamConfig::new().init(),
            net_config,
            config,
            device,
            step_count: 0,
        }
    }

    pub fn step_count(&self) -> usize {
        self.step_count
    }

    pub fn set_step_count(&mut self, steps: usize) {
        self.step_count = steps;
    }

    pub fn config(&self) -> &LearnerConfig {
        &self.config
    }

    /// Online estimator's values for every cell of `state`.
    pub fn predict(&self, state: &Observation) -> [f32; NUM_CELLS] {
        let input = encode_state::<InferBackend>(state, &self.device);
        decode_rows(self.online.valid().forward(input))[0]
    }

    /// Target estimator's values for every cell of `state`.
    pub fn predict_target(&self, state: &Observation) -> [f32; NUM_CELLS] {
        let input = encode_state::<InferBackend>(state, &self.device);
        decode_rows(self.target.forward(input))[0]
    }

    /// Overwrite the target estimator with the online estimator's parameters.
    pub fn sync_target(&mut self) {
        self.target = self.online.valid();
    }

    /// One gradient step on a batch. Returns the mean squared error.
    pub fn train_step(&mut self, batch: &[Transition]) -> Result<f32, TrainingError> {
        let batch_size = batch.len();
        let online = self.online.valid();

        let states = encode_states_batch::<InferBackend>(batch.iter().map(|t| &t.state), &self.device);
        let next_states =
            encode_states_batch::<InferBackend>(batch.iter().map(|t| &t.next_state), &self.device);

        let current_q = decode_rows(online.forward(states));
        let online_next = decode_rows(online.forward(next_states.clone()));
        let target_next = decode_rows(self.target.forward(next_states));

        let mut target_data = Vec::with_capacity(batch_size * NUM_CELLS);
        for (i, t) in batch.iter().enumerate() {
            target_data.extend_from_slice(&double_dqn_target(
                &current_q[i],
                &online_next[i],
                &target_next[i],
                t.action.index(),
                t.reward,
                t.done,
                self.config.gamma,
            ));
        }
        let targets = Tensor::<TrainBackend, 1>::from_data(
            TensorData::from(target_data.as_slice()),
            &self.device,
        )
        .reshape([batch_size, NUM_CELLS]);

        // Forward pass with gradients tracked: [B, 9]
        let predictions = self.online.forward(encode_states_batch::<TrainBackend>(
            batch.iter().map(|t| &t.state),
            &self.device,
        ));

        // MSE loss
        let diff = predictions - targets;
        let loss = (diff.clone() * diff).mean();

        let loss_val: f32 = loss
            .clone()
            .into_data()
            .to_vec::<f32>()
            .expect("f32 loss tensor extraction")[0];
        if !loss_val.is_finite() {
            return Err(TrainingError::Divergence {
                step: self.step_count,
                loss: loss_val,
            });
        }

        let grads = loss.backward();
        let grads = GradientsParams::from_grads(grads, &self.online);
        self.online = self
            .optimizer
            .step(self.config.learning_rate, self.online.clone(), grads);

        self.step_count += 1;
        if self.step_count % self.config.update_target_steps == 0 {
            self.sync_target();
            debug!("target network synced at step {}", self.step_count);
        }

        Ok(loss_val)
    }

    /// Save the online estimator's parameters.
    pub fn save_online(&self, path: &Path) -> Result<(), CheckpointError> {
        let recorder = DefaultRecorder::default();
        self.online
            .valid()
            .save_file(path, &recorder)
            .map_err(|e| CheckpointError::ModelSave(e.to_string()))
    }

    /// Load the online estimator's parameters and copy them into the target.
    pub fn load_online(&mut self, path: &Path) -> Result<(), CheckpointError> {
        let recorder = DefaultRecorder::default();
        let online: QNetwork<TrainBackend> = self
            .net_config
            .init(&self.device)
            .load_file(path, &recorder, &self.device)
            .map_err(|e| CheckpointError::ModelLoad(e.to_string()))?;
        self.online = online;
        self.optimizer = AdamConfig::new().init();
        self.sync_target();
        Ok(())
    }
}
