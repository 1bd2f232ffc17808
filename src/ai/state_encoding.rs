use burn::prelude::*;
use burn::tensor::TensorData;

use crate::game::{Observation, NUM_CELLS};

/// Encode one observation as a tensor of shape [1, 9]
/// (+1 own mark, -1 opponent mark, 0 empty; row-major).
pub fn encode_state<B: Backend>(state: &Observation, device: &B::Device) -> Tensor<B, 2> {
    let data = state.flatten();
    Tensor::<B, 1>::from_data(TensorData::from(data.as_slice()), device).reshape([1, NUM_CELLS])
}

/// Encode multiple observations as a batched tensor of shape [batch, 9].
pub fn encode_states_batch<'a, B: Backend>(
    states: impl IntoIterator<Item = &'a Observation>,
    device: &B::Device,
) -> Tensor<B, 2> {
    let mut flat = Vec::new();
    for state in states {
        flat.extend_from_slice(&state.flatten());
    }
    let batch_size = flat.len() / NUM_CELLS;
    Tensor::<B, 1>::from_data(TensorData::from(flat.as_slice()), device)
        .reshape([batch_size, NUM_CELLS])
}

/// Decode a [batch, 9] tensor into one row of action values per state.
pub fn decode_rows<B: Backend>(values: Tensor<B, 2>) -> Vec<[f32; NUM_CELLS]> {
    let flat: Vec<f32> = values
        .into_data()
        .to_vec()
        .expect("f32 tensor data extraction");
    flat.chunks_exact(NUM_CELLS)
        .map(|chunk| {
            let mut row = [0.0f32; NUM_CELLS];
            row.copy_from_slice(chunk);
            row
        })
        .collect()
}
