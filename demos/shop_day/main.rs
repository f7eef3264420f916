use log::warn;
use potion_shop::{
    CustomerId, CustomerQueueManager, CustomerState, DayNightProvider, DeliveryOutcome,
    EconomyProvider, FeedbackProvider, MovementProvider, Position, RecipeCatalog, ShopConfig,
    ShopError, ShopObserver, ShopServices, SoundCue, VisitSummary,
};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

const RECIPES_JSON: &str = include_str!("../../data/recipes.json");
const SHOP_JSON: &str = include_str!("../../data/shop.json");

/// Frame length in seconds
const FRAME_SECS: f32 = 0.1;
/// Night falls this many seconds into the day
const NIGHTFALL_SECS: f32 = 150.0;
/// Hard stop so a misconfigured run cannot spin forever
const MAX_FRAMES: u32 = 5_000;

/// Customers teleport: every move request arrives on the next frame
#[derive(Clone, Default)]
struct InstantMovement {
    pending: Rc<RefCell<Vec<(CustomerId, Position)>>>,
}

impl MovementProvider for InstantMovement {
    fn move_to(&mut self, customer: CustomerId, position: Position) {
        self.pending.borrow_mut().push((customer, position));
    }
}

struct ConsoleFeedback;

impl FeedbackProvider for ConsoleFeedback {
    fn show_message(&mut self, customer: CustomerId, text: &str, _auto_hide_after: Option<f32>) {
        println!("  [{}] \"{}\"", customer.short(), text);
    }

    fn hide_message(&mut self, _customer: CustomerId) {}

    fn play_sound(&mut self, customer: CustomerId, cue: SoundCue) {
        if cue == SoundCue::Error {
            warn!("[Demo] Error cue for {}", customer.short());
        }
    }
}

#[derive(Clone, Default)]
struct Till {
    coins: Rc<Cell<u64>>,
}

impl EconomyProvider for Till {
    fn grant_reward(&mut self, amount: u32) {
        self.coins.set(self.coins.get() + u64::from(amount));
    }
}

#[derive(Clone, Default)]
struct SunDial {
    elapsed: Rc<Cell<f32>>,
}

impl DayNightProvider for SunDial {
    fn is_night(&self) -> bool {
        self.elapsed.get() >= NIGHTFALL_SECS
    }
}

struct Ledger;

impl ShopObserver for Ledger {
    fn on_visit_ended(&mut self, summary: &VisitSummary) {
        println!(
            "  <- {} ({}) left: {:?}, {} failed attempt(s)",
            summary.customer.short(),
            summary.archetype,
            summary.outcome,
            summary.failed_attempts
        );
    }
}

/// Scripted player: attends whoever is at the window, takes a moment to
/// brew, and sometimes forgets an ingredient.
struct Apprentice {
    rng: StdRng,
    accuracy: f64,
    brew_secs: f32,
    busy_for: f32,
}

impl Apprentice {
    fn act(&mut self, manager: &mut CustomerQueueManager, dt: f32) -> Result<(), ShopError> {
        let id = match manager.window_customer() {
            Some(id) => id,
            None => return Ok(()),
        };

        match manager.customer_state(id) {
            Some(CustomerState::WaitingForAttention) => {
                manager.begin_service(id)?;
                self.busy_for = self.brew_secs;
            }
            Some(CustomerState::AtWindowWaiting) => {
                self.busy_for -= dt;
                if self.busy_for > 0.0 {
                    return Ok(());
                }

                let mut ingredients = manager
                    .customer(id)
                    .and_then(|c| c.order())
                    .map(|order| order.recipe.ingredients.clone())
                    .unwrap_or_default();
                ingredients.shuffle(&mut self.rng);
                if !self.rng.gen_bool(self.accuracy) {
                    ingredients.pop();
                }

                let potion = manager.brew(ingredients.as_slice());
                println!(
                    "  -> brewed {} from [{}]",
                    potion.name,
                    ingredients.join(", ")
                );
                match manager.attempt_delivery(id, &potion.name)? {
                    DeliveryOutcome::Accepted { reward } => println!("  $ +{}", reward),
                    DeliveryOutcome::Rejected { .. } => {}
                }
                self.busy_for = self.brew_secs;
            }
            _ => {}
        }
        Ok(())
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .format_timestamp(None)
        .init();

    println!("Opening the potion shop");

    let catalog = RecipeCatalog::from_json_str(RECIPES_JSON)?;
    let config = ShopConfig::from_json_str(SHOP_JSON)?;
    let window = config.layout.window;
    let exit = config.layout.exit;

    println!("Configuration:");
    println!("  Recipes: {}", catalog.len());
    println!(
        "  Spawn interval: {:.1}s, concurrency cap: {}",
        config.spawn_interval_secs, config.concurrency_cap
    );
    println!(
        "  Attention: {:.1}s, fulfillment: {:.1}s",
        config.timing.attention_secs, config.timing.fulfillment_secs
    );
    println!("  Nightfall at {:.0}s", NIGHTFALL_SECS);
    println!();

    let movement = InstantMovement::default();
    let till = Till::default();
    let sun = SunDial::default();
    let services = ShopServices::new()
        .with_movement(movement.clone())
        .with_feedback(ConsoleFeedback)
        .with_economy(till.clone())
        .with_day_night(sun.clone());

    let seed = config.random_seed.unwrap_or(0);
    let mut manager = CustomerQueueManager::new(config, catalog, services)?;
    manager.add_observer(Box::new(Ledger));
    manager.open()?;

    let mut apprentice = Apprentice {
        rng: StdRng::seed_from_u64(seed.wrapping_add(1)),
        accuracy: 0.75,
        brew_secs: 3.0,
        busy_for: 0.0,
    };

    let mut frames = 0;
    while frames < MAX_FRAMES {
        frames += 1;
        sun.elapsed.set(sun.elapsed.get() + FRAME_SECS);
        manager.tick(FRAME_SECS);

        let arrivals: Vec<_> = movement.pending.borrow_mut().drain(..).collect();
        for (id, position) in arrivals {
            let result = if position == window {
                manager.arrived_at_window(id)
            } else if Some(position) == exit {
                manager.arrived_at_exit(id)
            } else {
                Ok(())
            };
            if let Err(err) = result {
                warn!("[Demo] {}", err);
            }
        }

        if let Err(err) = apprentice.act(&mut manager, FRAME_SECS) {
            warn!("[Demo] {}", err);
        }

        if !manager.is_open() && manager.active_customers() == 0 && manager.departing_len() == 0 {
            break;
        }
    }

    let stats = manager.stats();
    println!();
    println!("Day over after {:.1}s", frames as f32 * FRAME_SECS);
    println!("  Customers: {}", stats.spawned);
    println!("  Served: {}", stats.served);
    println!("  Walked out: {}", stats.walked_out);
    println!("  No staff: {}", stats.no_staff);
    println!("  Timed out: {}", stats.timed_out);
    println!("  Sent away at closing: {}", stats.sent_away);
    println!("  Failed deliveries: {}", stats.failed_deliveries);
    println!("  Coins earned: {}", till.coins.get());

    Ok(())
}
