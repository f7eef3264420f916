mod queue_manager_tests;

use crate::core::collaborators::{
    DayNightProvider, EconomyProvider, FeedbackProvider, MovementProvider, ShopServices, SoundCue,
};
use crate::core::config::ShopConfig;
use crate::core::queue_manager::CustomerQueueManager;
use crate::core::recipes::{Recipe, RecipeCatalog};
use crate::core::stats::{ShopObserver, VisitSummary};
use crate::core::types::{CustomerId, Position};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    SpawnAt(CustomerId, Position),
    MoveTo(CustomerId, Position),
    Show(CustomerId, String, Option<f32>),
    Hide(CustomerId),
    Sound(CustomerId, SoundCue),
    Reward(u32),
}

/// Records every call the core makes into its collaborators
#[derive(Clone, Default)]
pub(crate) struct Recorder {
    calls: Rc<RefCell<Vec<Call>>>,
    night: Rc<Cell<bool>>,
}

impl Recorder {
    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub fn set_night(&self, night: bool) {
        self.night.set(night);
    }

    pub fn messages_for(&self, id: CustomerId) -> Vec<String> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|call| match call {
                Call::Show(who, text, _) if *who == id => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn last_message_for(&self, id: CustomerId) -> Option<(String, Option<f32>)> {
        self.calls.borrow().iter().rev().find_map(|call| match call {
            Call::Show(who, text, hide) if *who == id => Some((text.clone(), *hide)),
            _ => None,
        })
    }

    pub fn moves_for(&self, id: CustomerId) -> Vec<Position> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|call| match call {
                Call::MoveTo(who, position) if *who == id => Some(*position),
                _ => None,
            })
            .collect()
    }

    pub fn sounds_for(&self, id: CustomerId) -> Vec<SoundCue> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|call| match call {
                Call::Sound(who, cue) if *who == id => Some(*cue),
                _ => None,
            })
            .collect()
    }

    pub fn rewards(&self) -> Vec<u32> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|call| match call {
                Call::Reward(amount) => Some(*amount),
                _ => None,
            })
            .collect()
    }

    pub fn services(&self) -> ShopServices {
        ShopServices::new()
            .with_movement(self.clone())
            .with_feedback(self.clone())
            .with_economy(self.clone())
            .with_day_night(self.clone())
    }
}

impl MovementProvider for Recorder {
    fn spawn_at(&mut self, customer: CustomerId, position: Position) {
        self.calls.borrow_mut().push(Call::SpawnAt(customer, position));
    }

    fn move_to(&mut self, customer: CustomerId, position: Position) {
        self.calls.borrow_mut().push(Call::MoveTo(customer, position));
    }
}

impl FeedbackProvider for Recorder {
    fn show_message(&mut self, customer: CustomerId, text: &str, auto_hide_after: Option<f32>) {
        self.calls
            .borrow_mut()
            .push(Call::Show(customer, text.to_string(), auto_hide_after));
    }

    fn hide_message(&mut self, customer: CustomerId) {
        self.calls.borrow_mut().push(Call::Hide(customer));
    }

    fn play_sound(&mut self, customer: CustomerId, cue: SoundCue) {
        self.calls.borrow_mut().push(Call::Sound(customer, cue));
    }
}

impl EconomyProvider for Recorder {
    fn grant_reward(&mut self, amount: u32) {
        self.calls.borrow_mut().push(Call::Reward(amount));
    }
}

impl DayNightProvider for Recorder {
    fn is_night(&self) -> bool {
        self.night.get()
    }
}

/// Observer that keeps every summary it sees
#[derive(Clone, Default)]
pub(crate) struct VisitLog {
    pub spawned: Rc<RefCell<Vec<CustomerId>>>,
    pub ended: Rc<RefCell<Vec<VisitSummary>>>,
}

impl ShopObserver for VisitLog {
    fn on_customer_spawned(&mut self, customer: CustomerId, _archetype: &str) {
        self.spawned.borrow_mut().push(customer);
    }

    fn on_visit_ended(&mut self, summary: &VisitSummary) {
        self.ended.borrow_mut().push(summary.clone());
    }
}

pub(crate) fn test_catalog() -> RecipeCatalog {
    let recipe = |id: &str, name: &str, ingredients: &[&str]| {
        Recipe::new(
            id,
            name,
            "",
            ingredients.iter().map(|s| s.to_string()).collect(),
            id,
        )
        .unwrap()
    };
    RecipeCatalog::new(vec![
        recipe("healing", "Healing Potion", &["Flor", "Flor", "Miel"]),
        recipe("sleep", "Sleep Draught", &["Lavanda", "Miel"]),
        recipe("strength", "Strength Tonic", &["Raiz", "Hongo", "Raiz"]),
    ])
    .unwrap()
}

/// One-second spawn interval, deterministic RNG, three customers max.
/// A spawn needs a tick that takes the accumulator past the interval.
pub(crate) fn test_config() -> ShopConfig {
    ShopConfig::default()
        .with_spawn_interval(1.0)
        .with_concurrency_cap(3)
        .with_random_seed(Some(42))
}

pub(crate) fn build_manager(config: ShopConfig) -> (CustomerQueueManager, Recorder) {
    let recorder = Recorder::default();
    let manager = CustomerQueueManager::new(config, test_catalog(), recorder.services()).unwrap();
    (manager, recorder)
}

/// Open the shop, spawn a single customer and walk it up to the window.
/// Spawning is switched off afterwards so the customer is alone.
pub(crate) fn customer_at_window(
    config: ShopConfig,
) -> (CustomerQueueManager, Recorder, CustomerId) {
    let interval = config.spawn_interval_secs;
    let (mut manager, recorder) = build_manager(config);
    manager.open().unwrap();
    manager.tick(interval + 0.1);
    manager.set_spawning_enabled(false);
    manager.tick(0.01);
    let id = manager.window_customer().unwrap();
    manager.arrived_at_window(id).unwrap();
    (manager, recorder, id)
}

/// Same as `customer_at_window`, then attend the customer so it orders
pub(crate) fn customer_with_order(
    config: ShopConfig,
) -> (CustomerQueueManager, Recorder, CustomerId) {
    let (mut manager, recorder, id) = customer_at_window(config);
    manager.begin_service(id).unwrap();
    (manager, recorder, id)
}

pub(crate) fn ordered_potion(manager: &CustomerQueueManager, id: CustomerId) -> String {
    manager
        .customer(id)
        .and_then(|c| c.order())
        .map(|o| o.expected_name().to_string())
        .unwrap()
}
