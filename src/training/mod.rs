//! Training infrastructure: replay buffer, self-play training session,
//! greedy evaluation, head-to-head matches and metrics collection.

pub mod evaluation;
pub mod metrics;
pub mod replay_buffer;
pub mod trainer;
pub mod versus;

pub use evaluation::{evaluate, evaluate_vs_random, EvalReport};
pub use metrics::TrainingMetrics;
pub use replay_buffer::ReplayBuffer;
pub use trainer::{TrainerConfig, TrainingSession};
pub use versus::{run_versus, MatchTally, VersusReport};
