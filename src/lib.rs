pub mod core;

// Re-export commonly used types
pub use crate::core::collaborators::{
    DayNightProvider, EconomyProvider, FeedbackProvider, MovementProvider, ShopServices, SoundCue,
};
pub use crate::core::config::{CustomerArchetype, ShopConfig};
pub use crate::core::customer::{CustomerState, DeliveryOutcome, VisitOutcome};
pub use crate::core::errors::ShopError;
pub use crate::core::queue_manager::CustomerQueueManager;
pub use crate::core::recipes::{Brew, Recipe, RecipeCatalog};
pub use crate::core::reward::RewardPolicy;
pub use crate::core::stats::{ShopObserver, ShopStats, VisitSummary};
pub use crate::core::types::{CustomerId, Position};
