//! Customer admission, the waiting line and the service window.
//!
//! The manager owns every customer. Queued customers live in a FIFO line,
//! at most one customer holds the window, and customers on their way out
//! sit in a departing list until they reach the exit. Customers never
//! touch each other or the line; the only thing they report back is that
//! they released the window.

use super::collaborators::ShopServices;
use super::config::ShopConfig;
use super::customer::{Customer, CustomerState, DeliveryOutcome, VisitContext, VisitOutcome};
use super::errors::ShopError;
use super::recipes::{Brew, Recipe, RecipeCatalog};
use super::stats::{ShopObserver, ShopStats, VisitSummary};
use super::types::CustomerId;
use log::{debug, error, info, warn};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::collections::VecDeque;
use std::sync::Arc;

/// An archetype with its order pools resolved against the catalog
#[derive(Debug, Clone)]
struct ResolvedArchetype {
    name: String,
    specific_orders: Vec<Arc<Recipe>>,
    possible_orders: Vec<Arc<Recipe>>,
}

/// Find a customer wherever the manager is holding it
fn locate<'c>(
    window: &'c mut Option<Customer>,
    queue: &'c mut VecDeque<Customer>,
    departing: &'c mut Vec<Customer>,
    id: CustomerId,
) -> Option<&'c mut Customer> {
    if let Some(customer) = window.as_mut().filter(|c| c.id() == id) {
        return Some(customer);
    }
    if let Some(customer) = queue.iter_mut().find(|c| c.id() == id) {
        return Some(customer);
    }
    departing.iter_mut().find(|c| c.id() == id)
}

pub struct CustomerQueueManager {
    config: ShopConfig,
    catalog: RecipeCatalog,
    services: ShopServices,
    rng: StdRng,
    master_orders: Vec<Arc<Recipe>>,
    archetypes: Vec<ResolvedArchetype>,
    queue: VecDeque<Customer>,
    window: Option<Customer>,
    departing: Vec<Customer>,
    is_open: bool,
    spawning_enabled: bool,
    spawn_elapsed: f32,
    current_tick: u64,
    stats: ShopStats,
    observers: Vec<Box<dyn ShopObserver>>,
}

impl CustomerQueueManager {
    /// Build a manager. Every configured order pool is resolved against the
    /// catalog here; an unknown recipe id is an error. The shop starts closed.
    pub fn new(
        config: ShopConfig,
        catalog: RecipeCatalog,
        services: ShopServices,
    ) -> Result<Self, ShopError> {
        config.validate()?;

        let master_orders = match &config.master_orders {
            Some(ids) => catalog.resolve_ids(ids)?,
            None => catalog.iter().cloned().collect(),
        };
        if master_orders.is_empty() {
            warn!("[Shop] Master order list is empty; customers without their own pools will leave");
        }

        let archetypes = config
            .archetypes
            .iter()
            .map(|archetype| {
                Ok(ResolvedArchetype {
                    name: archetype.name.clone(),
                    specific_orders: catalog.resolve_ids(&archetype.specific_orders)?,
                    possible_orders: catalog.resolve_ids(&archetype.possible_orders)?,
                })
            })
            .collect::<Result<Vec<_>, ShopError>>()?;

        let rng = match config.random_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Ok(Self {
            spawning_enabled: config.spawning_enabled,
            config,
            catalog,
            services,
            rng,
            master_orders,
            archetypes,
            queue: VecDeque::new(),
            window: None,
            departing: Vec::new(),
            is_open: false,
            spawn_elapsed: 0.0,
            current_tick: 0,
            stats: ShopStats::default(),
            observers: Vec::new(),
        })
    }

    /// Add an observer to the shop
    pub fn add_observer(&mut self, observer: Box<dyn ShopObserver>) {
        self.observers.push(observer);
    }

    /// Open the shop. Fails at night; opening an open shop is a no-op.
    pub fn open(&mut self) -> Result<(), ShopError> {
        if self.services.day_night.is_night() {
            warn!("[Shop] Refusing to open at night");
            return Err(ShopError::ClosedForNight);
        }
        if !self.is_open {
            self.is_open = true;
            self.spawn_elapsed = 0.0;
            info!("[Shop] Open for business");
        }
        Ok(())
    }

    /// Close the shop and send every queued and windowed customer away.
    /// Returns how many customers this call sent away.
    pub fn close(&mut self) -> usize {
        let was_open = std::mem::replace(&mut self.is_open, false);
        let mut ctx = VisitContext {
            services: &mut self.services,
            rng: &mut self.rng,
            master_orders: &self.master_orders,
            config: &self.config,
        };

        let mut sent_away = 0;
        let mut leaving: Vec<Customer> = self.queue.drain(..).collect();
        if let Some(mut customer) = self.window.take() {
            customer.detach_from_window();
            leaving.push(customer);
        }
        for mut customer in leaving {
            if customer.force_leave(&mut ctx) {
                sent_away += 1;
            }
            self.departing.push(customer);
        }

        if was_open || sent_away > 0 {
            info!("[Shop] Closed, sent {} customer(s) away", sent_away);
        }
        self.sweep_finished();
        sent_away
    }

    /// Advance the shop by one frame of `dt` seconds
    pub fn tick(&mut self, dt: f32) {
        self.current_tick += 1;

        if self.is_open && self.config.close_at_night && self.services.day_night.is_night() {
            info!("[Shop] Night has fallen");
            self.close();
        }

        self.admit(dt);
        self.assign_window();
        self.tick_customers(dt);
        self.sweep_finished();
    }

    /// Spawn one customer once the interval has passed and there is room
    fn admit(&mut self, dt: f32) {
        if !self.is_open || !self.spawning_enabled {
            return;
        }

        // Spawn only once the interval has been exceeded
        self.spawn_elapsed += dt;
        if self.spawn_elapsed <= self.config.spawn_interval_secs {
            return;
        }
        if self.active_customers() >= self.config.concurrency_cap {
            debug!(
                "[Shop] At capacity ({}/{}), holding spawn",
                self.active_customers(),
                self.config.concurrency_cap
            );
            return;
        }

        let archetype = match self.archetypes.choose(&mut self.rng) {
            Some(archetype) => archetype.clone(),
            None => {
                error!(
                    "[Shop] {}",
                    ShopError::ConfigurationMissing("no customer archetypes".to_string())
                );
                return;
            }
        };

        let customer = Customer::new(
            CustomerId::new(),
            archetype.name.clone(),
            archetype.specific_orders,
            archetype.possible_orders,
            self.current_tick,
        );
        let id = customer.id();
        let slot = self.config.layout.queue_slot(self.queue.len());
        self.services.movement.spawn_at(id, self.config.layout.spawn);
        self.services.movement.move_to(id, slot);
        self.queue.push_back(customer);
        self.spawn_elapsed = 0.0;
        self.stats.spawned += 1;

        info!(
            "[Shop] Customer {} ({}) joined the line at position {}",
            id.short(),
            archetype.name,
            self.queue.len()
        );
        for observer in &mut self.observers {
            observer.on_customer_spawned(id, &archetype.name);
        }
    }

    /// Promote the head of the line when the window is free. A customer
    /// spawned this tick waits for the next one.
    fn assign_window(&mut self) {
        if self.window.is_some() {
            return;
        }
        match self.queue.front() {
            Some(front) if front.spawned_tick() < self.current_tick => {}
            _ => return,
        }

        if let Some(mut customer) = self.queue.pop_front() {
            let mut ctx = VisitContext {
                services: &mut self.services,
                rng: &mut self.rng,
                master_orders: &self.master_orders,
                config: &self.config,
            };
            if let Err(err) = customer.promote_to_window(&mut ctx) {
                warn!("[Shop] {}", err);
            }
            self.window = Some(customer);

            for (index, queued) in self.queue.iter_mut().enumerate() {
                queued.move_in_line(self.config.layout.queue_slot(index), &mut self.services);
            }
        }
    }

    fn tick_customers(&mut self, dt: f32) {
        let mut ctx = VisitContext {
            services: &mut self.services,
            rng: &mut self.rng,
            master_orders: &self.master_orders,
            config: &self.config,
        };

        let released = match self.window.as_mut() {
            Some(customer) => customer.tick(dt, &mut ctx).then(|| customer.id()),
            None => None,
        };
        for customer in &mut self.departing {
            customer.tick(dt, &mut ctx);
        }

        if let Some(id) = released {
            if let Err(err) = self.notify_window_free(id) {
                warn!("[Shop] {}", err);
            }
        }
    }

    /// A customer reports it no longer needs the window. Only the current
    /// window customer may release it, and only once it has started to walk
    /// out; anything else is logged and ignored.
    pub fn notify_window_free(&mut self, id: CustomerId) -> Result<(), ShopError> {
        match self.window.take() {
            Some(customer) if customer.id() == id && !customer.holds_window() => {
                debug!("[Shop] Window released by {}", id.short());
                self.departing.push(customer);
                Ok(())
            }
            Some(customer) if customer.id() == id => {
                let state = customer.state();
                self.window = Some(customer);
                warn!(
                    "[Shop] Customer {} is still being served ({:?}), keeping the window",
                    id.short(),
                    state
                );
                Err(ShopError::InvalidStateTransition {
                    customer: id,
                    state,
                    action: "release the window",
                })
            }
            other => {
                self.window = other;
                warn!("[Shop] Ignoring stale window release from {}", id.short());
                Err(ShopError::StaleNotification(id))
            }
        }
    }

    /// Destroy customers whose visit is over and report them
    fn sweep_finished(&mut self) {
        let (finished, remaining): (Vec<Customer>, Vec<Customer>) = std::mem::take(&mut self.departing)
            .into_iter()
            .partition(|c| c.is_finished());
        self.departing = remaining;

        for customer in finished {
            let summary = VisitSummary {
                customer: customer.id(),
                archetype: customer.archetype().to_string(),
                outcome: customer.outcome().unwrap_or(VisitOutcome::SentAway),
                failed_attempts: customer.failures(),
            };
            debug!("[Shop] Customer {} gone: {:?}", customer.id().short(), summary.outcome);
            self.stats.record(&summary);
            for observer in &mut self.observers {
                observer.on_visit_ended(&summary);
            }
        }
    }

    /// Movement callback: the customer reached the window
    pub fn arrived_at_window(&mut self, id: CustomerId) -> Result<(), ShopError> {
        let customer = locate(&mut self.window, &mut self.queue, &mut self.departing, id)
            .ok_or(ShopError::UnknownCustomer(id))?;
        let mut ctx = VisitContext {
            services: &mut self.services,
            rng: &mut self.rng,
            master_orders: &self.master_orders,
            config: &self.config,
        };
        customer.arrived_at_window(&mut ctx)
    }

    /// Movement callback: the customer reached the exit and is destroyed
    pub fn arrived_at_exit(&mut self, id: CustomerId) -> Result<(), ShopError> {
        let customer = locate(&mut self.window, &mut self.queue, &mut self.departing, id)
            .ok_or(ShopError::UnknownCustomer(id))?;
        customer.arrived_at_exit()?;
        self.sweep_finished();
        Ok(())
    }

    /// Player attends the customer at the window
    pub fn begin_service(&mut self, id: CustomerId) -> Result<(), ShopError> {
        let customer = locate(&mut self.window, &mut self.queue, &mut self.departing, id)
            .ok_or(ShopError::UnknownCustomer(id))?;
        let mut ctx = VisitContext {
            services: &mut self.services,
            rng: &mut self.rng,
            master_orders: &self.master_orders,
            config: &self.config,
        };
        customer.begin_service(&mut ctx)
    }

    /// Player presents an item to the customer
    pub fn attempt_delivery(
        &mut self,
        id: CustomerId,
        item_name: &str,
    ) -> Result<DeliveryOutcome, ShopError> {
        let customer = locate(&mut self.window, &mut self.queue, &mut self.departing, id)
            .ok_or(ShopError::UnknownCustomer(id))?;
        let mut ctx = VisitContext {
            services: &mut self.services,
            rng: &mut self.rng,
            master_orders: &self.master_orders,
            config: &self.config,
        };
        customer.attempt_delivery(item_name, &mut ctx)
    }

    /// Brew in the cauldron; a miss yields the catalog's failed potion
    pub fn brew<S: AsRef<str>>(&self, ingredients: &[S]) -> Brew {
        self.catalog.brew(ingredients)
    }

    pub fn set_spawning_enabled(&mut self, enabled: bool) {
        self.spawning_enabled = enabled;
    }

    pub fn is_spawning_enabled(&self) -> bool {
        self.spawning_enabled
    }

    pub fn is_open(&self) -> bool {
        self.is_open
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// Queued customers, front of the line first
    pub fn queued_customers(&self) -> Vec<CustomerId> {
        self.queue.iter().map(|c| c.id()).collect()
    }

    pub fn window_customer(&self) -> Option<CustomerId> {
        self.window.as_ref().map(|c| c.id())
    }

    pub fn departing_len(&self) -> usize {
        self.departing.len()
    }

    /// Customers counted against the concurrency cap
    pub fn active_customers(&self) -> usize {
        self.queue.len() + usize::from(self.window.is_some())
    }

    pub fn customer(&self, id: CustomerId) -> Option<&Customer> {
        self.window
            .iter()
            .chain(self.queue.iter())
            .chain(self.departing.iter())
            .find(|c| c.id() == id)
    }

    pub fn customer_state(&self, id: CustomerId) -> Option<CustomerState> {
        self.customer(id).map(|c| c.state())
    }

    pub fn stats(&self) -> &ShopStats {
        &self.stats
    }

    pub fn config(&self) -> &ShopConfig {
        &self.config
    }

    pub fn catalog(&self) -> &RecipeCatalog {
        &self.catalog
    }

    pub fn current_tick(&self) -> u64 {
        self.current_tick
    }
}
