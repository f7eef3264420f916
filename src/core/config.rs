//! Configuration for the potion shop core
//!
//! Everything here is plain data: serde-loadable, with defaults matching the
//! shipped game and `with_*` builders for tests and tooling.

use super::errors::ShopError;
use super::reward::RewardPolicy;
use super::types::Position;
use serde::{Deserialize, Serialize};

/// Per-visit clocks, in seconds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisitTiming {
    /// How long a customer at the window waits for someone to attend them
    pub attention_secs: f32,
    /// How long a customer waits for their order once it is placed
    pub fulfillment_secs: f32,
    /// Display time of transient feedback before the order text returns
    pub message_display_secs: f32,
    /// Time the final message stays up before the customer walks away
    pub leave_grace_secs: f32,
}

impl Default for VisitTiming {
    fn default() -> Self {
        Self {
            attention_secs: 10.0,
            fulfillment_secs: 30.0,
            message_display_secs: 2.5,
            leave_grace_secs: 2.0,
        }
    }
}

/// Lines customers say. `{potion}` in `order_request` is replaced with the
/// ordered potion's name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedbackMessages {
    pub order_request: String,
    pub no_staff: String,
    pub order_timeout: String,
    pub success: String,
    pub wrong_item: String,
    pub wrong_item_final: String,
    pub no_orders: String,
    pub shop_closed: String,
}

impl FeedbackMessages {
    pub fn order_text(&self, potion: &str) -> String {
        self.order_request.replace("{potion}", potion)
    }
}

impl Default for FeedbackMessages {
    fn default() -> Self {
        Self {
            order_request: "I'd like a {potion}, please.".to_string(),
            no_staff: "Are there no employees here? I'm leaving!".to_string(),
            order_timeout: "This is taking forever. I'll go somewhere else.".to_string(),
            success: "Thank you! Just what I needed.".to_string(),
            wrong_item: "Hmm, that's not what I asked for...".to_string(),
            wrong_item_final: "Wrong again! I'm leaving.".to_string(),
            no_orders: "I... forgot what I came here for.".to_string(),
            shop_closed: "Closing already? I'll come back tomorrow.".to_string(),
        }
    }
}

/// A kind of customer the shop can spawn, with its own order pools
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CustomerArchetype {
    pub name: String,
    /// Fixed orders; when non-empty the customer only ever asks for these
    pub specific_orders: Vec<String>,
    /// Orders this kind of customer usually asks for
    pub possible_orders: Vec<String>,
}

impl CustomerArchetype {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_specific_orders(mut self, ids: &[&str]) -> Self {
        self.specific_orders = ids.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_possible_orders(mut self, ids: &[&str]) -> Self {
        self.possible_orders = ids.iter().map(|s| s.to_string()).collect();
        self
    }
}

/// Where customers appear, get served and leave
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShopLayout {
    /// Where new customers appear before walking to the line
    pub spawn: Position,
    pub window: Position,
    pub exit: Option<Position>,
    /// Spacing between queue slots, measured back from the window
    pub queue_offset: Position,
}

impl ShopLayout {
    /// Slot `index` in the line (0 is the front)
    pub fn queue_slot(&self, index: usize) -> Position {
        self.window.offset_by(self.queue_offset, (index + 1) as f32)
    }
}

impl Default for ShopLayout {
    fn default() -> Self {
        Self {
            spawn: Position::new(0.0, 0.0, -12.0),
            window: Position::new(0.0, 0.0, 0.0),
            exit: Some(Position::new(8.0, 0.0, -12.0)),
            queue_offset: Position::new(0.0, 0.0, -1.5),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShopConfig {
    pub timing: VisitTiming,
    pub messages: FeedbackMessages,
    pub reward: RewardPolicy,
    pub layout: ShopLayout,
    pub archetypes: Vec<CustomerArchetype>,
    /// Recipe ids any customer may order; None means the whole catalog
    pub master_orders: Option<Vec<String>>,
    pub spawn_interval_secs: f32,
    /// Max customers queued plus at the window
    pub concurrency_cap: usize,
    /// Wrong deliveries after which the customer walks out
    pub max_failed_deliveries: u32,
    pub spawning_enabled: bool,
    /// Close the shop automatically when night falls
    pub close_at_night: bool,
    pub random_seed: Option<u64>,
}

impl Default for ShopConfig {
    fn default() -> Self {
        Self {
            timing: VisitTiming::default(),
            messages: FeedbackMessages::default(),
            reward: RewardPolicy::default(),
            layout: ShopLayout::default(),
            archetypes: vec![CustomerArchetype::new("villager")],
            master_orders: None,
            spawn_interval_secs: 6.0,
            concurrency_cap: 3,
            max_failed_deliveries: 2,
            spawning_enabled: true,
            close_at_night: true,
            random_seed: None,
        }
    }
}

impl ShopConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json_str(json: &str) -> Result<Self, ShopError> {
        let config: ShopConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_concurrency_cap(mut self, cap: usize) -> Self {
        self.concurrency_cap = cap;
        self
    }

    pub fn with_spawn_interval(mut self, secs: f32) -> Self {
        self.spawn_interval_secs = secs;
        self
    }

    pub fn with_timing(mut self, timing: VisitTiming) -> Self {
        self.timing = timing;
        self
    }

    pub fn with_attention_secs(mut self, secs: f32) -> Self {
        self.timing.attention_secs = secs;
        self
    }

    pub fn with_fulfillment_secs(mut self, secs: f32) -> Self {
        self.timing.fulfillment_secs = secs;
        self
    }

    pub fn with_reward(mut self, reward: RewardPolicy) -> Self {
        self.reward = reward;
        self
    }

    pub fn with_layout(mut self, layout: ShopLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn with_exit(mut self, exit: Option<Position>) -> Self {
        self.layout.exit = exit;
        self
    }

    pub fn with_archetypes(mut self, archetypes: Vec<CustomerArchetype>) -> Self {
        self.archetypes = archetypes;
        self
    }

    pub fn with_master_orders(mut self, ids: Option<Vec<String>>) -> Self {
        self.master_orders = ids;
        self
    }

    pub fn with_close_at_night(mut self, enabled: bool) -> Self {
        self.close_at_night = enabled;
        self
    }

    pub fn with_random_seed(mut self, seed: Option<u64>) -> Self {
        self.random_seed = seed;
        self
    }

    pub fn validate(&self) -> Result<(), ShopError> {
        if self.concurrency_cap == 0 {
            return Err(ShopError::InvalidConfig(
                "Concurrency cap must be greater than 0".to_string(),
            ));
        }

        if !(self.spawn_interval_secs > 0.0) {
            return Err(ShopError::InvalidConfig(
                "Spawn interval must be greater than 0".to_string(),
            ));
        }

        if !(self.timing.attention_secs > 0.0) || !(self.timing.fulfillment_secs > 0.0) {
            return Err(ShopError::InvalidConfig(
                "Attention and fulfillment timers must be greater than 0".to_string(),
            ));
        }

        if self.timing.message_display_secs < 0.0 || self.timing.leave_grace_secs < 0.0 {
            return Err(ShopError::InvalidConfig(
                "Display delays cannot be negative".to_string(),
            ));
        }

        if self.max_failed_deliveries == 0 {
            return Err(ShopError::InvalidConfig(
                "Customers must allow at least one delivery attempt".to_string(),
            ));
        }

        if self.archetypes.is_empty() {
            return Err(ShopError::ConfigurationMissing(
                "No customer archetypes configured".to_string(),
            ));
        }

        Ok(())
    }
}
