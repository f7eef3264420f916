use super::*;
use crate::core::config::{CustomerArchetype, FeedbackMessages, ShopLayout};
use crate::core::customer::{CustomerState, VisitOutcome};
use crate::core::errors::ShopError;

fn slot(index: usize) -> Position {
    ShopConfig::default().layout.queue_slot(index)
}

#[test]
fn test_no_spawn_while_closed() {
    let (mut manager, recorder) = build_manager(test_config());
    assert!(!manager.is_open());

    for _ in 0..10 {
        manager.tick(1.0);
    }
    assert_eq!(manager.active_customers(), 0);
    assert_eq!(manager.stats().spawned, 0);
    assert!(recorder.calls().is_empty());
}

#[test]
fn test_spawn_interval() {
    let (mut manager, _recorder) = build_manager(test_config());
    manager.open().unwrap();

    manager.tick(0.5);
    assert_eq!(manager.stats().spawned, 0);
    // Reaching the interval is not enough, it has to be exceeded
    manager.tick(0.5);
    assert_eq!(manager.stats().spawned, 0);
    manager.tick(0.1);
    assert_eq!(manager.stats().spawned, 1);

    manager.tick(0.5);
    manager.tick(0.5);
    assert_eq!(manager.stats().spawned, 1);
    manager.tick(0.1);
    assert_eq!(manager.stats().spawned, 2);
}

#[test]
fn test_spawned_customer_waits_one_tick_for_window() {
    let (mut manager, recorder) = build_manager(test_config());
    manager.open().unwrap();

    manager.tick(1.1);
    let id = manager.queued_customers()[0];
    assert_eq!(manager.window_customer(), None);
    assert_eq!(manager.customer_state(id), Some(CustomerState::Queued));

    manager.set_spawning_enabled(false);
    manager.tick(0.01);
    assert_eq!(manager.window_customer(), Some(id));
    assert_eq!(manager.queue_len(), 0);
    assert_eq!(manager.customer_state(id), Some(CustomerState::MovingToWindow));
    assert_eq!(
        recorder.moves_for(id),
        vec![slot(0), manager.config().layout.window]
    );
}

#[test]
fn test_concurrency_cap() {
    let (mut manager, _recorder) = build_manager(test_config());
    manager.open().unwrap();

    // Nobody ever reaches the window, so nobody ever leaves
    for _ in 0..50 {
        manager.tick(1.0);
        assert!(manager.active_customers() <= 3);
    }
    assert_eq!(manager.active_customers(), 3);
    assert_eq!(manager.stats().spawned, 3);
}

#[test]
fn test_held_spawn_fires_when_room_frees() {
    let config = test_config().with_concurrency_cap(1);
    let (mut manager, _recorder) = build_manager(config);
    manager.open().unwrap();

    manager.tick(1.1);
    manager.tick(0.01);
    let first = manager.window_customer().unwrap();
    assert_eq!(manager.stats().spawned, 1);

    manager.arrived_at_window(first).unwrap();
    manager.tick(10.0);
    manager.tick(2.0);
    assert_eq!(manager.window_customer(), None);
    assert_eq!(manager.active_customers(), 0);

    manager.tick(0.01);
    assert_eq!(manager.stats().spawned, 2);
}

#[test]
fn test_line_is_fifo_and_advances() {
    let (mut manager, recorder) = build_manager(test_config());
    let log = VisitLog::default();
    manager.add_observer(Box::new(log.clone()));
    manager.open().unwrap();

    manager.tick(1.1);
    manager.tick(1.1);
    manager.tick(1.1);
    manager.set_spawning_enabled(false);

    let spawned = log.spawned.borrow().clone();
    assert_eq!(spawned.len(), 3);
    let (a, b, c) = (spawned[0], spawned[1], spawned[2]);
    assert_eq!(manager.window_customer(), Some(a));
    assert_eq!(manager.queued_customers(), vec![b, c]);

    // b joined behind a, then stepped up when a took the window
    assert_eq!(recorder.moves_for(b), vec![slot(1), slot(0)]);
    assert_eq!(recorder.moves_for(c), vec![slot(1)]);

    manager.arrived_at_window(a).unwrap();
    manager.begin_service(a).unwrap();
    let potion = ordered_potion(&manager, a);
    manager.attempt_delivery(a, &potion).unwrap();
    manager.tick(2.0);
    assert_eq!(manager.window_customer(), None);

    manager.tick(0.01);
    assert_eq!(manager.window_customer(), Some(b));
    assert_eq!(manager.queued_customers(), vec![c]);
    assert_eq!(recorder.moves_for(c), vec![slot(1), slot(0)]);
}

#[test]
fn test_close_sends_everyone_away_once() {
    let config = test_config().with_concurrency_cap(4);
    let (mut manager, recorder) = build_manager(config);
    manager.open().unwrap();
    for _ in 0..4 {
        manager.tick(1.1);
    }
    let at_window = manager.window_customer().unwrap();
    manager.arrived_at_window(at_window).unwrap();
    assert_eq!(manager.queue_len(), 3);

    let mut everyone = manager.queued_customers();
    everyone.push(at_window);

    assert_eq!(manager.close(), 4);
    assert!(!manager.is_open());
    assert_eq!(manager.active_customers(), 0);
    assert_eq!(manager.close(), 0);

    let farewell = FeedbackMessages::default().shop_closed;
    for id in &everyone {
        assert_eq!(recorder.messages_for(*id), vec![farewell.clone()]);
        assert_eq!(manager.customer_state(*id), Some(CustomerState::WaitingToLeave));
    }

    manager.tick(2.0);
    manager.tick(2.0);
    let exit = manager.config().layout.exit.unwrap();
    for id in &everyone {
        let exits = recorder
            .moves_for(*id)
            .into_iter()
            .filter(|p| *p == exit)
            .count();
        assert_eq!(exits, 1);
        manager.arrived_at_exit(*id).unwrap();
    }

    assert_eq!(manager.departing_len(), 0);
    assert_eq!(manager.stats().sent_away, 4);
    assert_eq!(manager.stats().spawned, 4);
}

#[test]
fn test_close_leaves_customers_already_leaving_alone() {
    let (mut manager, recorder, id) = customer_with_order(test_config());
    let potion = ordered_potion(&manager, id);
    manager.attempt_delivery(id, &potion).unwrap();

    assert_eq!(manager.close(), 0);
    assert_eq!(
        recorder.last_message_for(id).map(|(text, _)| text),
        Some(FeedbackMessages::default().success)
    );

    manager.tick(2.0);
    manager.arrived_at_exit(id).unwrap();
    assert_eq!(manager.stats().served, 1);
    assert_eq!(manager.stats().sent_away, 0);
}

#[test]
fn test_reopen_resumes_spawning() {
    let (mut manager, _recorder) = build_manager(test_config());
    manager.open().unwrap();
    manager.open().unwrap();
    manager.tick(0.5);
    manager.close();

    manager.open().unwrap();
    manager.tick(0.6);
    assert_eq!(manager.stats().spawned, 0);
    manager.tick(0.5);
    assert_eq!(manager.stats().spawned, 1);
}

#[test]
fn test_night_blocks_opening() {
    let (mut manager, recorder) = build_manager(test_config());
    recorder.set_night(true);
    assert_eq!(manager.open(), Err(ShopError::ClosedForNight));
    assert!(!manager.is_open());

    recorder.set_night(false);
    assert!(manager.open().is_ok());
}

#[test]
fn test_nightfall_closes_shop() {
    let (mut manager, recorder) = build_manager(test_config());
    manager.open().unwrap();
    manager.tick(1.1);
    let id = manager.queued_customers()[0];

    recorder.set_night(true);
    manager.tick(0.01);
    assert!(!manager.is_open());
    assert_eq!(manager.customer_state(id), Some(CustomerState::WaitingToLeave));
    assert_eq!(
        manager.customer(id).and_then(|c| c.outcome()),
        Some(VisitOutcome::SentAway)
    );
}

#[test]
fn test_nightfall_ignored_when_disabled() {
    let config = test_config().with_close_at_night(false);
    let (mut manager, recorder) = build_manager(config);
    manager.open().unwrap();

    recorder.set_night(true);
    manager.tick(1.1);
    assert!(manager.is_open());
    assert_eq!(manager.stats().spawned, 1);
}

#[test]
fn test_stale_window_release() {
    let (mut manager, _recorder, id) = customer_at_window(test_config());

    let stranger = CustomerId::new();
    assert_eq!(
        manager.notify_window_free(stranger),
        Err(ShopError::StaleNotification(stranger))
    );
    assert_eq!(manager.window_customer(), Some(id));

    manager.close();
    assert_eq!(
        manager.notify_window_free(id),
        Err(ShopError::StaleNotification(id))
    );
}

#[test]
fn test_window_kept_while_customer_is_served() {
    let (mut manager, _recorder, first) = customer_with_order(test_config());

    assert_eq!(
        manager.notify_window_free(first),
        Err(ShopError::InvalidStateTransition {
            customer: first,
            state: CustomerState::AtWindowWaiting,
            action: "release the window",
        })
    );
    assert_eq!(manager.window_customer(), Some(first));
    assert_eq!(manager.customer_state(first), Some(CustomerState::AtWindowWaiting));

    // The next customer stays in line while the first is still at the window
    manager.set_spawning_enabled(true);
    manager.tick(1.1);
    manager.tick(0.01);
    assert_eq!(manager.window_customer(), Some(first));
    assert_eq!(manager.queue_len(), 1);
    let second = manager.queued_customers()[0];

    let potion = ordered_potion(&manager, first);
    manager.attempt_delivery(first, &potion).unwrap();
    assert!(manager.notify_window_free(first).is_err());
    assert_eq!(manager.window_customer(), Some(first));

    manager.tick(2.0);
    assert_eq!(manager.window_customer(), None);
    manager.tick(0.01);
    assert_eq!(manager.window_customer(), Some(second));
}

#[test]
fn test_new_customer_appears_at_spawn_point() {
    let layout = ShopLayout {
        spawn: Position::new(3.0, 0.0, -20.0),
        ..ShopLayout::default()
    };
    let (mut manager, recorder) = build_manager(test_config().with_layout(layout));
    manager.open().unwrap();
    manager.tick(1.1);

    let id = manager.queued_customers()[0];
    assert_eq!(
        recorder.calls()[..2],
        [
            Call::SpawnAt(id, Position::new(3.0, 0.0, -20.0)),
            Call::MoveTo(id, slot(0)),
        ]
    );
}

#[test]
fn test_unknown_recipe_in_config() {
    let recorder = Recorder::default();
    let config = test_config().with_master_orders(Some(vec!["elixir".to_string()]));
    let result = CustomerQueueManager::new(config, test_catalog(), recorder.services());
    assert!(matches!(result, Err(ShopError::UnknownRecipe(id)) if id == "elixir"));

    let config = test_config().with_archetypes(vec![
        CustomerArchetype::new("knight").with_possible_orders(&["strength", "valor"])
    ]);
    let result = CustomerQueueManager::new(config, test_catalog(), recorder.services());
    assert!(matches!(result, Err(ShopError::UnknownRecipe(id)) if id == "valor"));
}

#[test]
fn test_invalid_config_rejected() {
    let recorder = Recorder::default();
    let config = test_config().with_concurrency_cap(0);
    let result = CustomerQueueManager::new(config, test_catalog(), recorder.services());
    assert!(matches!(result, Err(ShopError::InvalidConfig(_))));
}

#[test]
fn test_unknown_customer() {
    let (mut manager, _recorder) = build_manager(test_config());
    let ghost = CustomerId::new();
    assert_eq!(
        manager.arrived_at_window(ghost),
        Err(ShopError::UnknownCustomer(ghost))
    );
    assert_eq!(
        manager.attempt_delivery(ghost, "Healing Potion"),
        Err(ShopError::UnknownCustomer(ghost))
    );
}

#[test]
fn test_observer_sees_whole_visit() {
    let (mut manager, _recorder) = build_manager(test_config());
    let log = VisitLog::default();
    manager.add_observer(Box::new(log.clone()));
    manager.open().unwrap();
    manager.tick(1.1);
    manager.set_spawning_enabled(false);
    manager.tick(0.01);

    let id = manager.window_customer().unwrap();
    manager.arrived_at_window(id).unwrap();
    manager.begin_service(id).unwrap();
    manager.attempt_delivery(id, "Mud").unwrap();
    let potion = ordered_potion(&manager, id);
    manager.attempt_delivery(id, &potion).unwrap();
    manager.tick(2.0);
    manager.arrived_at_exit(id).unwrap();

    assert_eq!(*log.spawned.borrow(), vec![id]);
    let ended = log.ended.borrow();
    assert_eq!(ended.len(), 1);
    assert_eq!(ended[0].customer, id);
    assert_eq!(ended[0].archetype, "villager");
    assert_eq!(ended[0].outcome, VisitOutcome::Served { reward: 15 });
    assert_eq!(ended[0].failed_attempts, 1);
    assert_eq!(manager.stats().failed_deliveries, 1);
}

#[test]
fn test_brew_through_manager() {
    let (manager, _recorder) = build_manager(test_config());
    let brew = manager.brew(&["Miel", "Flor", "Flor"]);
    assert_eq!(brew.name, "Healing Potion");
    assert!(!brew.is_failure());

    let brew = manager.brew(&["Flor", "Miel"]);
    assert!(brew.is_failure());
}
