//! Per-customer visit state machine.
//!
//! A customer waits in line, walks to the window, waits to be attended,
//! places an order, waits for it, and leaves. Two clocks can end the visit
//! early: the attention timer (nobody came to the window) and the
//! fulfillment timer (the order took too long). Every way out of the visit
//! goes through `WaitingToLeave`, where the final message stays up for a
//! grace period before the customer walks to the exit.

use super::collaborators::{ShopServices, SoundCue};
use super::config::ShopConfig;
use super::errors::ShopError;
use super::event_scheduler::DelayScheduler;
use super::recipes::{names_match, Recipe};
use super::types::{CustomerId, Position};
use log::{debug, error, info, warn};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CustomerState {
    /// Waiting in line, not yet promoted to the window
    Queued,
    MovingToWindow,
    WaitingForAttention,
    AtWindowWaiting,
    ProcessingDelivery,
    WaitingToLeave,
    MovingToExit,
    /// Terminal; the customer is about to be destroyed
    Inactive,
}

impl CustomerState {
    /// States in which a leave request has already been honoured
    pub fn is_leaving(&self) -> bool {
        matches!(
            self,
            CustomerState::WaitingToLeave | CustomerState::MovingToExit | CustomerState::Inactive
        )
    }
}

/// How a visit ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisitOutcome {
    Served { reward: u32 },
    /// Nobody attended the window before the attention timer ran out
    NoStaff,
    OrderTimedOut,
    /// Too many wrong deliveries
    WalkedOut,
    /// No order pool had anything to ask for
    NoOrderAvailable,
    /// Sent away because the shop closed
    SentAway,
}

/// Result of presenting an item to a customer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Accepted { reward: u32 },
    Rejected { failures: u32, customer_left: bool },
}

/// A recipe a customer is currently asking for
#[derive(Debug, Clone)]
pub struct Order {
    pub id: Uuid,
    pub recipe: Arc<Recipe>,
}

impl Order {
    pub fn new(recipe: Arc<Recipe>) -> Self {
        Self {
            id: Uuid::new_v4(),
            recipe,
        }
    }

    /// Name the delivered potion must carry
    pub fn expected_name(&self) -> &str {
        &self.recipe.name
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Continuation {
    ShowOrderAgain { order_id: Uuid },
    TurnToLeave,
}

/// What a customer may touch while it runs: the injected services, the
/// shop RNG, the master order list and the configuration.
pub struct VisitContext<'a> {
    pub services: &'a mut ShopServices,
    pub rng: &'a mut StdRng,
    pub master_orders: &'a [Arc<Recipe>],
    pub config: &'a ShopConfig,
}

#[derive(Debug)]
pub struct Customer {
    id: CustomerId,
    archetype: String,
    specific_orders: Vec<Arc<Recipe>>,
    possible_orders: Vec<Arc<Recipe>>,
    state: CustomerState,
    order: Option<Order>,
    failures: u32,
    attention_remaining: f32,
    fulfillment_remaining: f32,
    delays: DelayScheduler<Continuation>,
    holds_window: bool,
    outcome: Option<VisitOutcome>,
    spawned_tick: u64,
}

impl Customer {
    pub fn new(
        id: CustomerId,
        archetype: impl Into<String>,
        specific_orders: Vec<Arc<Recipe>>,
        possible_orders: Vec<Arc<Recipe>>,
        spawned_tick: u64,
    ) -> Self {
        Self {
            id,
            archetype: archetype.into(),
            specific_orders,
            possible_orders,
            state: CustomerState::Queued,
            order: None,
            failures: 0,
            attention_remaining: 0.0,
            fulfillment_remaining: 0.0,
            delays: DelayScheduler::new(),
            holds_window: false,
            outcome: None,
            spawned_tick,
        }
    }

    pub fn id(&self) -> CustomerId {
        self.id
    }

    pub fn archetype(&self) -> &str {
        &self.archetype
    }

    pub fn state(&self) -> CustomerState {
        self.state
    }

    pub fn order(&self) -> Option<&Order> {
        self.order.as_ref()
    }

    pub fn failures(&self) -> u32 {
        self.failures
    }

    pub fn outcome(&self) -> Option<VisitOutcome> {
        self.outcome
    }

    pub fn attention_remaining(&self) -> f32 {
        self.attention_remaining
    }

    pub fn fulfillment_remaining(&self) -> f32 {
        self.fulfillment_remaining
    }

    pub fn spawned_tick(&self) -> u64 {
        self.spawned_tick
    }

    pub fn holds_window(&self) -> bool {
        self.holds_window
    }

    pub fn is_finished(&self) -> bool {
        self.state == CustomerState::Inactive
    }

    fn invalid(&self, action: &'static str) -> ShopError {
        debug!(
            "[Customer {}] Ignoring '{}' while {:?}",
            self.id.short(),
            action,
            self.state
        );
        ShopError::InvalidStateTransition {
            customer: self.id,
            state: self.state,
            action,
        }
    }

    /// Step forward to a new slot in the line
    pub fn move_in_line(&mut self, slot: Position, services: &mut ShopServices) {
        if self.state == CustomerState::Queued {
            services.movement.move_to(self.id, slot);
        }
    }

    /// Promoted from the head of the queue to the window slot
    pub fn promote_to_window(&mut self, ctx: &mut VisitContext<'_>) -> Result<(), ShopError> {
        if self.state != CustomerState::Queued {
            return Err(self.invalid("walk to the window"));
        }
        self.state = CustomerState::MovingToWindow;
        self.holds_window = true;
        ctx.services
            .movement
            .move_to(self.id, ctx.config.layout.window);
        info!("[Customer {}] Walking to the window", self.id.short());
        Ok(())
    }

    /// The manager took the window back (shop closing); a later exit must
    /// not report a release.
    pub fn detach_from_window(&mut self) {
        self.holds_window = false;
    }

    pub fn arrived_at_window(&mut self, ctx: &mut VisitContext<'_>) -> Result<(), ShopError> {
        if self.state != CustomerState::MovingToWindow {
            return Err(self.invalid("arrive at the window"));
        }
        self.state = CustomerState::WaitingForAttention;
        self.attention_remaining = ctx.config.timing.attention_secs;
        info!(
            "[Customer {}] At the window, waiting up to {:.1}s for attention",
            self.id.short(),
            self.attention_remaining
        );
        Ok(())
    }

    /// Pool precedence: fixed orders, then the archetype's usual orders,
    /// then the shop-wide master list.
    fn order_pool<'p>(&'p self, master_orders: &'p [Arc<Recipe>]) -> &'p [Arc<Recipe>] {
        if !self.specific_orders.is_empty() {
            &self.specific_orders
        } else if !self.possible_orders.is_empty() {
            &self.possible_orders
        } else {
            master_orders
        }
    }

    /// The player attends this customer, who immediately places an order
    pub fn begin_service(&mut self, ctx: &mut VisitContext<'_>) -> Result<(), ShopError> {
        if self.state != CustomerState::WaitingForAttention {
            return Err(self.invalid("begin service"));
        }

        let picked = self
            .order_pool(ctx.master_orders)
            .choose(&mut *ctx.rng)
            .cloned();

        let recipe = match picked {
            Some(recipe) => recipe,
            None => {
                error!(
                    "[Customer {}] No order pool available for archetype '{}'",
                    self.id.short(),
                    self.archetype
                );
                let text = ctx.config.messages.no_orders.clone();
                self.leave(VisitOutcome::NoOrderAvailable, &text, SoundCue::Error, ctx);
                return Err(ShopError::ConfigurationMissing(format!(
                    "no order pool for customer {}",
                    self.id
                )));
            }
        };

        let order = Order::new(recipe);
        let text = ctx.config.messages.order_text(order.expected_name());
        info!(
            "[Customer {}] Ordered '{}'",
            self.id.short(),
            order.expected_name()
        );

        self.order = Some(order);
        self.state = CustomerState::AtWindowWaiting;
        self.fulfillment_remaining = ctx.config.timing.fulfillment_secs;
        ctx.services.feedback.show_message(self.id, &text, None);
        ctx.services.feedback.play_sound(self.id, SoundCue::OrderPlaced);
        Ok(())
    }

    /// The player presents an item by name
    pub fn attempt_delivery(
        &mut self,
        item_name: &str,
        ctx: &mut VisitContext<'_>,
    ) -> Result<DeliveryOutcome, ShopError> {
        if self.state != CustomerState::AtWindowWaiting {
            return Err(self.invalid("accept a delivery"));
        }

        let (order_id, expected) = match &self.order {
            Some(order) => (order.id, order.expected_name().to_string()),
            None => {
                error!(
                    "[Customer {}] Waiting at the window without an order",
                    self.id.short()
                );
                let text = ctx.config.messages.no_orders.clone();
                self.leave(VisitOutcome::NoOrderAvailable, &text, SoundCue::Error, ctx);
                return Err(ShopError::ConfigurationMissing(format!(
                    "customer {} has no order",
                    self.id
                )));
            }
        };

        self.state = CustomerState::ProcessingDelivery;

        if names_match(item_name, &expected) {
            let reward = ctx.config.reward.reward_for(self.failures);
            info!(
                "[Customer {}] Received '{}' after {} failed attempt(s), paying {}",
                self.id.short(),
                expected,
                self.failures,
                reward
            );
            ctx.services.economy.grant_reward(reward);
            let text = ctx.config.messages.success.clone();
            self.leave(
                VisitOutcome::Served { reward },
                &text,
                SoundCue::DeliverySuccess,
                ctx,
            );
            return Ok(DeliveryOutcome::Accepted { reward });
        }

        self.failures += 1;
        warn!(
            "[Customer {}] Expected '{}' but got '{}' (failure {})",
            self.id.short(),
            expected,
            item_name,
            self.failures
        );

        if self.failures >= ctx.config.max_failed_deliveries {
            let text = ctx.config.messages.wrong_item_final.clone();
            self.leave(VisitOutcome::WalkedOut, &text, SoundCue::Leaving, ctx);
            return Ok(DeliveryOutcome::Rejected {
                failures: self.failures,
                customer_left: true,
            });
        }

        // Order persists and the fulfillment clock keeps running
        self.state = CustomerState::AtWindowWaiting;
        let display = ctx.config.timing.message_display_secs;
        ctx.services
            .feedback
            .show_message(self.id, &ctx.config.messages.wrong_item, Some(display));
        ctx.services
            .feedback
            .play_sound(self.id, SoundCue::DeliveryFailure);
        self.delays
            .schedule(Continuation::ShowOrderAgain { order_id }, display);

        Ok(DeliveryOutcome::Rejected {
            failures: self.failures,
            customer_left: false,
        })
    }

    /// Shop is closing. Returns true if this call started the departure.
    pub fn force_leave(&mut self, ctx: &mut VisitContext<'_>) -> bool {
        let text = ctx.config.messages.shop_closed.clone();
        self.leave(VisitOutcome::SentAway, &text, SoundCue::Leaving, ctx)
    }

    /// Enter `WaitingToLeave`. No-op once the customer is already leaving.
    fn leave(
        &mut self,
        outcome: VisitOutcome,
        text: &str,
        cue: SoundCue,
        ctx: &mut VisitContext<'_>,
    ) -> bool {
        if self.state.is_leaving() {
            debug!(
                "[Customer {}] Already leaving ({:?}), ignoring {:?}",
                self.id.short(),
                self.state,
                outcome
            );
            return false;
        }

        info!("[Customer {}] Leaving: {:?}", self.id.short(), outcome);
        self.state = CustomerState::WaitingToLeave;
        self.outcome = Some(outcome);
        self.order = None;
        self.delays.clear();
        ctx.services.feedback.show_message(self.id, text, None);
        ctx.services.feedback.play_sound(self.id, cue);
        self.delays
            .schedule(Continuation::TurnToLeave, ctx.config.timing.leave_grace_secs);
        true
    }

    /// Walk to the exit. Returns true if the window was released.
    fn begin_exit(&mut self, ctx: &mut VisitContext<'_>) -> bool {
        self.state = CustomerState::MovingToExit;
        ctx.services.feedback.hide_message(self.id);
        let released = std::mem::replace(&mut self.holds_window, false);

        match ctx.config.layout.exit {
            Some(exit) => {
                ctx.services.movement.move_to(self.id, exit);
                debug!("[Customer {}] Walking to the exit", self.id.short());
            }
            None => {
                error!(
                    "[Customer {}] {}",
                    self.id.short(),
                    ShopError::ConfigurationMissing("no exit point configured".to_string())
                );
                self.state = CustomerState::Inactive;
            }
        }

        released
    }

    pub fn arrived_at_exit(&mut self) -> Result<(), ShopError> {
        if self.state != CustomerState::MovingToExit {
            return Err(self.invalid("arrive at the exit"));
        }
        self.state = CustomerState::Inactive;
        debug!("[Customer {}] Reached the exit", self.id.short());
        Ok(())
    }

    /// Advance clocks and pending delays by `dt` seconds.
    /// Returns true when this customer released the window during the tick.
    pub fn tick(&mut self, dt: f32, ctx: &mut VisitContext<'_>) -> bool {
        if self.state == CustomerState::Inactive {
            return false;
        }

        let mut released = false;
        self.delays.advance(dt);
        for continuation in self.delays.drain_due() {
            match continuation {
                Continuation::TurnToLeave => {
                    if self.state == CustomerState::WaitingToLeave {
                        released |= self.begin_exit(ctx);
                    }
                }
                Continuation::ShowOrderAgain { order_id } => {
                    if self.state != CustomerState::AtWindowWaiting {
                        continue;
                    }
                    if let Some(order) = self.order.as_ref().filter(|o| o.id == order_id) {
                        let text = ctx.config.messages.order_text(order.expected_name());
                        ctx.services.feedback.show_message(self.id, &text, None);
                    }
                }
            }
        }

        match self.state {
            CustomerState::WaitingForAttention => {
                self.attention_remaining -= dt;
                if self.attention_remaining <= 0.0 {
                    let text = ctx.config.messages.no_staff.clone();
                    self.leave(VisitOutcome::NoStaff, &text, SoundCue::Timeout, ctx);
                }
            }
            CustomerState::AtWindowWaiting => {
                self.fulfillment_remaining -= dt;
                if self.fulfillment_remaining <= 0.0 {
                    let text = ctx.config.messages.order_timeout.clone();
                    self.leave(VisitOutcome::OrderTimedOut, &text, SoundCue::Timeout, ctx);
                }
            }
            _ => {}
        }

        released
    }
}
