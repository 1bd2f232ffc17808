mod double_dqn;
mod dqn;

pub use double_dqn::{argmax, double_dqn_target, DoubleDqnLearner, LearnerConfig};
pub use dqn::{DqnConfig, DqnPolicy};
