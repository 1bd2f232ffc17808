//! Turn dispatch: drives a [`GridGame`](crate::game::GridGame) with one
//! [`Policy`](crate::ai::Policy) per actor and records what happened.

mod dispatch;
mod replay;

pub use dispatch::{Engine, EngineStatus, EpisodeResult};
pub use replay::{GameReplay, TurnRecord};
