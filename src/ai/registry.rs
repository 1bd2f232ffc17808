use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::ConfigError;

use super::algorithms::{DqnConfig, DqnPolicy};
use super::policy::Policy;
use super::random::RandomPolicy;

/// Builds a participant from its display name and free-form parameters.
pub type PolicyConstructor = fn(&str, &toml::Table) -> Result<Box<dyn Policy>, ConfigError>;

/// Parameters accepted by the `random` policy.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RandomParams {
    pub seed: Option<u64>,
}

/// Parameters accepted by the `dqn` policy. Anything left out keeps the
/// [`DqnConfig`] default.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DqnParams {
    pub learning_rate: Option<f64>,
    pub gamma: Option<f32>,
    pub epsilon: Option<f64>,
    pub epsilon_min: Option<f64>,
    pub epsilon_decay: Option<f64>,
    pub hidden_size: Option<usize>,
    pub seed: Option<u64>,
    /// Weights file (with or without `.mpk`) or a checkpoint directory.
    pub model_path: Option<PathBuf>,
    /// Keep learning while playing. Defaults to `true` unless a model is loaded.
    pub learning: Option<bool>,
}

/// Name-to-constructor table for every policy a configuration may name.
pub struct PolicyRegistry {
    constructors: BTreeMap<String, PolicyConstructor>,
}

impl PolicyRegistry {
    /// A registry with no entries.
    pub fn empty() -> Self {
        PolicyRegistry {
            constructors: BTreeMap::new(),
        }
    }

    pub fn register(&mut self, policy: impl Into<String>, constructor: PolicyConstructor) {
        self.constructors.insert(policy.into(), constructor);
    }

    pub fn contains(&self, policy: &str) -> bool {
        self.constructors.contains_key(policy)
    }

    /// Registered policy names in sorted order.
    pub fn names(&self) -> Vec<String> {
        self.constructors.keys().cloned().collect()
    }

    /// Construct the `policy` participant called `name`.
    pub fn build(
        &self,
        policy: &str,
        name: &str,
        params: &toml::Table,
    ) -> Result<Box<dyn Policy>, ConfigError> {
        let constructor =
            self.constructors
                .get(policy)
                .ok_or_else(|| ConfigError::UnknownPolicy {
                    name: policy.to_string(),
                    known: self.names(),
                })?;
        constructor(name, params)
    }
}

impl Default for PolicyRegistry {
    /// The built-in `random` and `dqn` policies.
    fn default() -> Self {
        let mut registry = PolicyRegistry::empty();
        registry.register("random", build_random);
        registry.register("dqn", build_dqn);
        registry
    }
}

fn parse_params<T: for<'de> Deserialize<'de>>(
    policy: &str,
    params: &toml::Table,
) -> Result<T, ConfigError> {
    toml::Value::Table(params.clone())
        .try_into()
        .map_err(|source| ConfigError::InvalidParams {
            policy: policy.to_string(),
            source,
        })
}

fn build_random(name: &str, params: &toml::Table) -> Result<Box<dyn Policy>, ConfigError> {
    let params: RandomParams = parse_params("random", params)?;
    Ok(Box::new(match params.seed {
        Some(seed) => RandomPolicy::with_seed(name, seed),
        None => RandomPolicy::new(name),
    }))
}

fn build_dqn(name: &str, params: &toml::Table) -> Result<Box<dyn Policy>, ConfigError> {
    let params: DqnParams = parse_params("dqn", params)?;
    let defaults = DqnConfig::default();
    let config = DqnConfig {
        learning_rate: params.learning_rate.unwrap_or(defaults.learning_rate),
        gamma: params.gamma.unwrap_or(defaults.gamma),
        epsilon_start: params.epsilon.unwrap_or(defaults.epsilon_start),
        epsilon_min: params.epsilon_min.unwrap_or(defaults.epsilon_min),
        epsilon_decay: params.epsilon_decay.unwrap_or(defaults.epsilon_decay),
        hidden_size: params.hidden_size.unwrap_or(defaults.hidden_size),
        seed: params.seed,
        ..defaults
    };
    let mut policy = DqnPolicy::new(name, config);

    if let Some(model_path) = &params.model_path {
        let weights = resolve_model_path(model_path).ok_or_else(|| {
            ConfigError::Validation(format!(
                "model_path '{}' for '{}' does not exist",
                model_path.display(),
                name
            ))
        })?;
        policy
            .load_model(&weights)
            .map_err(|source| ConfigError::ModelLoad {
                name: name.to_string(),
                source,
            })?;
        policy.set_epsilon(params.epsilon.unwrap_or(0.0));
    }
    policy.set_learning(params.learning.unwrap_or(params.model_path.is_none()));

    Ok(Box::new(policy))
}

/// Weights file for a configured path: a checkpoint directory's
/// `q_network.mpk`, or the path itself with the recorder's extension.
fn resolve_model_path(path: &Path) -> Option<PathBuf> {
    let candidate = if path.is_dir() {
        path.join("q_network")
    } else {
        path.to_path_buf()
    };
    candidate
        .with_extension("mpk")
        .exists()
        .then_some(candidate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::GridGame;

    fn table(src: &str) -> toml::Table {
        src.parse().unwrap()
    }

    #[test]
    fn test_builtin_names() {
        let registry = PolicyRegistry::default();
        assert_eq!(registry.names(), vec!["dqn".to_string(), "random".to_string()]);
        assert!(registry.contains("random"));
        assert!(!registry.contains("heuristic"));
    }

    #[test]
    fn test_build_random_with_seed() {
        let registry = PolicyRegistry::default();
        let mut a = registry
            .build("random", "R1", &table("seed = 5"))
            .unwrap();
        let mut b = registry
            .build("random", "R2", &table("seed = 5"))
            .unwrap();
        assert_eq!(a.name(), "R1");

        let game = GridGame::new(2);
        let legal = game.valid_actions(0);
        for _ in 0..10 {
            let state = game.observation(0);
            assert_eq!(a.act(&state, &legal), b.act(&state, &legal));
        }
    }

    #[test]
    fn test_unknown_policy() {
        let registry = PolicyRegistry::default();
        let err = registry
            .build("minimax", "M", &toml::Table::new())
            .err()
            .unwrap();
        match err {
            ConfigError::UnknownPolicy { name, known } => {
                assert_eq!(name, "minimax");
                assert_eq!(known.len(), 2);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_unknown_param_rejected() {
        let registry = PolicyRegistry::default();
        let err = registry
            .build("dqn", "D", &table("learning_rat = 0.1"))
            .err()
            .unwrap();
        assert!(matches!(err, ConfigError::InvalidParams { .. }));

        let err = registry
            .build("random", "R", &table("seed = \"abc\""))
            .err()
            .unwrap();
        assert!(matches!(err, ConfigError::InvalidParams { .. }));
    }

    #[test]
    fn test_missing_model_path_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.mpk");
        let mut params = toml::Table::new();
        params.insert(
            "model_path".into(),
            toml::Value::String(missing.display().to_string()),
        );
        let err = PolicyRegistry::default()
            .build("dqn", "D", &params)
            .err()
            .unwrap();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn test_model_path_loads_greedy_policy() {
        let dir = tempfile::tempdir().unwrap();
        let trained = DqnPolicy::new(
            "src",
            DqnConfig {
                hidden_size: 8,
                ..Default::default()
            },
        );
        trained.save_model(&dir.path().join("q_network")).unwrap();

        let mut params = toml::Table::new();
        params.insert(
            "model_path".into(),
            toml::Value::String(dir.path().display().to_string()),
        );
        params.insert("hidden_size".into(), toml::Value::Integer(8));
        let mut loaded = PolicyRegistry::default()
            .build("dqn", "D", &params)
            .unwrap();

        let game = GridGame::new(2);
        let state = game.observation(0);
        let legal = game.valid_actions(0);
        let expected = trained.greedy_action(&state, &legal);
        for _ in 0..5 {
            assert_eq!(loaded.act(&state, &legal), expected);
        }
    }
}
