use burn::nn::{Linear, LinearConfig, Relu};
use burn::prelude::*;

use crate::game::NUM_CELLS;

/// Action-value estimator for the 3x3 grid.
///
/// ```text
/// Input:  [batch, 9]   flattened actor-relative board
/// FC1:    9 -> hidden, ReLU
/// FC2:    hidden -> hidden, ReLU
/// FC3:    hidden -> 9  (one value per cell, legal or not)
/// ```
#[derive(Module, Debug)]
pub struct QNetwork<B: Backend> {
    fc1: Linear<B>,
    fc2: Linear<B>,
    fc3: Linear<B>,
    relu: Relu,
}

#[derive(Config, Debug)]
pub struct QNetworkConfig {
    #[config(default = 64)]
    pub hidden_size: usize,
}

impl QNetworkConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> QNetwork<B> {
        QNetwork {
            fc1: LinearConfig::new(NUM_CELLS, self.hidden_size).init(device),
            fc2: LinearConfig::new(self.hidden_size, self.hidden_size).init(device),
            fc3: LinearConfig::new(self.hidden_size, NUM_CELLS).init(device),
            relu: Relu::new(),
        }
    }
}

impl<B: Backend> QNetwork<B> {
    /// Forward pass: input [batch, 9] -> output [batch, 9] action values.
    pub fn forward(&self, input: Tensor<B, 2>) -> Tensor<B, 2> {
        let x = self.relu.forward(self.fc1.forward(input));
        let x = self.relu.forward(self.fc2.forward(x));
        self.fc3.forward(x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    #[test]
    fn test_network_output_shape() {
        let device = Default::default();
        let network = QNetworkConfig::new().init::<TestBackend>(&device);

        let input = Tensor::zeros([4, 9], &device);
        let output = network.forward(input);
        assert_eq!(output.shape().dims, [4, 9]);
    }

    #[test]
    fn test_network_custom_hidden_size() {
        let device = Default::default();
        let network = QNetworkConfig::new()
            .with_hidden_size(16)
            .init::<TestBackend>(&device);

        let input = Tensor::zeros([1, 9], &device);
        let output = network.forward(input);
        assert_eq!(output.shape().dims, [1, 9]);
    }
}
