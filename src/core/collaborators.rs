//! Services the shop core calls into.
//!
//! Movement, presentation, economy and time of day belong to the host game.
//! Each has a no-op implementation so a manager can run headless.

use super::types::{CustomerId, Position};
use serde::{Deserialize, Serialize};

/// Sounds the core asks the host to play
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SoundCue {
    OrderPlaced,
    DeliverySuccess,
    DeliveryFailure,
    Timeout,
    Leaving,
    Error,
}

/// Walks customers around. Arrival is reported back through
/// `CustomerQueueManager::arrived_at_window` / `arrived_at_exit`.
pub trait MovementProvider {
    /// A new customer appears at the shop's spawn point
    fn spawn_at(&mut self, _customer: CustomerId, _position: Position) {}

    fn move_to(&mut self, customer: CustomerId, position: Position);
}

/// Speech bubbles and sound
pub trait FeedbackProvider {
    /// Show `text` over the customer; `auto_hide_after` in seconds
    fn show_message(&mut self, customer: CustomerId, text: &str, auto_hide_after: Option<f32>);
    fn hide_message(&mut self, customer: CustomerId);
    fn play_sound(&mut self, customer: CustomerId, cue: SoundCue);
}

pub trait EconomyProvider {
    fn grant_reward(&mut self, amount: u32);
}

pub trait DayNightProvider {
    fn is_night(&self) -> bool;
}

#[derive(Debug, Default)]
pub struct NullMovement;

impl MovementProvider for NullMovement {
    fn move_to(&mut self, _customer: CustomerId, _position: Position) {}
}

#[derive(Debug, Default)]
pub struct NullFeedback;

impl FeedbackProvider for NullFeedback {
    fn show_message(&mut self, _customer: CustomerId, _text: &str, _auto_hide_after: Option<f32>) {}
    fn hide_message(&mut self, _customer: CustomerId) {}
    fn play_sound(&mut self, _customer: CustomerId, _cue: SoundCue) {}
}

#[derive(Debug, Default)]
pub struct NullEconomy;

impl EconomyProvider for NullEconomy {
    fn grant_reward(&mut self, _amount: u32) {}
}

/// Day/night provider that never reports night
#[derive(Debug, Default)]
pub struct AlwaysDay;

impl DayNightProvider for AlwaysDay {
    fn is_night(&self) -> bool {
        false
    }
}

/// Collaborators injected into the queue manager at construction
pub struct ShopServices {
    pub movement: Box<dyn MovementProvider>,
    pub feedback: Box<dyn FeedbackProvider>,
    pub economy: Box<dyn EconomyProvider>,
    pub day_night: Box<dyn DayNightProvider>,
}

impl ShopServices {
    pub fn new() -> Self {
        Self {
            movement: Box::new(NullMovement),
            feedback: Box::new(NullFeedback),
            economy: Box::new(NullEconomy),
            day_night: Box::new(AlwaysDay),
        }
    }

    pub fn with_movement(mut self, movement: impl MovementProvider + 'static) -> Self {
        self.movement = Box::new(movement);
        self
    }

    pub fn with_feedback(mut self, feedback: impl FeedbackProvider + 'static) -> Self {
        self.feedback = Box::new(feedback);
        self
    }

    pub fn with_economy(mut self, economy: impl EconomyProvider + 'static) -> Self {
        self.economy = Box::new(economy);
        self
    }

    pub fn with_day_night(mut self, day_night: impl DayNightProvider + 'static) -> Self {
        self.day_night = Box::new(day_night);
        self
    }
}

impl Default for ShopServices {
    fn default() -> Self {
        Self::new()
    }
}
