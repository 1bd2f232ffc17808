pub mod algorithms;
mod exploration;
pub mod networks;
mod policy;
mod random;
mod registry;
pub mod state_encoding;

pub use algorithms::{DqnConfig, DqnPolicy};
pub use exploration::ExplorationSchedule;
pub use networks::{QNetwork, QNetworkConfig};
pub use policy::{EvalModeGuard, EvalState, Policy, TrainablePolicy, Transition};
pub use random::RandomPolicy;
pub use registry::{DqnParams, PolicyConstructor, PolicyRegistry, RandomParams};
