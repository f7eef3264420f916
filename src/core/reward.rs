use serde::{Deserialize, Serialize};

/// Reward paid on a successful delivery, reduced by earlier failed attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardPolicy {
    pub base_reward: u32,
    pub penalty_per_failure: u32,
}

impl RewardPolicy {
    pub fn new(base_reward: u32, penalty_per_failure: u32) -> Self {
        Self {
            base_reward,
            penalty_per_failure,
        }
    }

    /// `max(0, base - penalty * failures)`
    pub fn reward_for(&self, failures: u32) -> u32 {
        self.base_reward
            .saturating_sub(self.penalty_per_failure.saturating_mul(failures))
    }
}

impl Default for RewardPolicy {
    fn default() -> Self {
        Self {
            base_reward: 20,
            penalty_per_failure: 5,
        }
    }
}
