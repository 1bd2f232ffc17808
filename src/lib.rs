//! # Tic-Tac-Toe RL
//!
//! A turn-based tic-tac-toe environment with pluggable policies and a
//! Double-DQN learner trained by self-play, built on the Burn ML framework.
//!
//! ## Modules
//!
//! - [`game`] — Core game logic: board, observations, reward shaping, state machine
//! - [`engine`] — Turn dispatch between policies and replay records
//! - [`ai`] — Policy traits, random and DQN policies, Q-network, policy registry
//! - [`training`] — Replay buffer, self-play session, evaluation, head-to-head matches
//! - [`checkpoint`] — Model persistence and versioning
//! - [`config`] — TOML configuration loading and validation
//! - [`error`] — Structured error types

#![recursion_limit = "256"]

pub mod ai;
pub mod checkpoint;
pub mod config;
pub mod engine;
pub mod error;
pub mod game;
pub mod training;
