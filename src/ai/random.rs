use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;

use crate::game::{Action, Observation};

use super::policy::Policy;

/// A policy that selects uniformly at random from legal actions.
pub struct RandomPolicy {
    name: String,
    rng: StdRng,
}

impl RandomPolicy {
    pub fn new(name: impl Into<String>) -> Self {
        RandomPolicy {
            name: name.into(),
            rng: StdRng::from_os_rng(),
        }
    }

    pub fn with_seed(name: impl Into<String>, seed: u64) -> Self {
        RandomPolicy {
            name: name.into(),
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomPolicy {
    fn default() -> Self {
        Self::new("Random")
    }
}

impl Policy for RandomPolicy {
    fn name(&self) -> &str {
        &self.name
    }

    fn act(&mut self, _state: &Observation, legal_actions: &[Action]) -> Action {
        assert!(!legal_actions.is_empty(), "No legal actions available");
        let idx = self.rng.random_range(0..legal_actions.len());
        legal_actions[idx]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::GridGame;

    #[test]
    fn test_random_policy_selects_legal_action() {
        let mut policy = RandomPolicy::default();
        let game = GridGame::new(2);
        let state = game.observation(0);
        let legal = game.valid_actions(0);

        for _ in 0..100 {
            let action = policy.act(&state, &legal);
            assert!(legal.contains(&action), "Action {} is not legal", action);
        }
    }

    #[test]
    fn test_random_policy_covers_all_actions() {
        let mut policy = RandomPolicy::with_seed("r", 7);
        let game = GridGame::new(2);
        let legal = game.valid_actions(0);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..500 {
            seen.insert(policy.act(&game.observation(0), &legal));
        }
        assert_eq!(seen.len(), legal.len());
    }

    #[test]
    fn test_random_policy_plays_full_game() {
        let mut policies = [RandomPolicy::new("a"), RandomPolicy::new("b")];
        let mut game = GridGame::new(2);

        while let Some(&actor) = game.current_players().first() {
            let legal = game.valid_actions(actor);
            let action = policies[actor].act(&game.observation(actor), &legal);
            game.step(&[(actor, action)]).unwrap();
        }

        assert!(game.is_terminal());
        assert!(game.history().len() >= 5);
    }

    #[test]
    fn test_random_policy_name() {
        assert_eq!(RandomPolicy::default().name(), "Random");
        assert_eq!(RandomPolicy::new("Rival").name(), "Rival");
    }
}
