//! End-to-end test: user file on disk, controller, departure outbox

use chrono::{Days, Local};
use shop_check_in::domain::types::{Event, EventKind, Slot, UserId};
use shop_check_in::domain::user::ShopUser;
use shop_check_in::infra::{Config, Metrics};
use shop_check_in::io::notifier::Notifier;
use shop_check_in::io::{
    create_event_channel, create_outbound_channels, JsonUserDirectory, OutboundReceivers,
    UserDirectory,
};
use shop_check_in::services::{State, StateMachine};
use std::sync::Arc;
use tempfile::tempdir;

fn users() -> Vec<ShopUser> {
    let tested = Local::now().date_naive().checked_sub_days(Days::new(20)).unwrap();
    vec![
        ShopUser::new("100", "Morgan").with_safety_test(tested).as_proctor(),
        ShopUser::new("200", "Riley").with_safety_test(tested).with_email("riley@example.com"),
    ]
}

#[tokio::test]
async fn test_visit_is_charged_persisted_and_notified() {
    let dir = tempdir().unwrap();
    let users_path = dir.path().join("users.json");
    let outbox_path = dir.path().join("outbox").join("departures.jsonl");
    std::fs::write(&users_path, serde_json::to_string(&users()).unwrap()).unwrap();

    let config = Config::default().with_slots(8);
    let metrics = Arc::new(Metrics::new());
    let directory = Arc::new(JsonUserDirectory::load(&users_path).unwrap());
    let (tx, queue) = create_event_channel(32);
    let (outbound, receivers) = create_outbound_channels(128, metrics.clone());
    let OutboundReceivers { departure_rx, .. } = receivers;

    let notifier = Notifier::new(outbox_path.to_str().unwrap());
    let notifier_task = tokio::spawn(notifier.run(departure_rx));

    let mut machine = StateMachine::new(&config, queue, outbound, directory.clone(), metrics);

    let script = vec![
        // Open the shop and seat Riley in slot 2
        Event::card_swipe("100"),
        Event::new(EventKind::SwitchFlipOff),
        Event::card_swipe("100"),
        Event::card_swipe("200"),
        Event::card_insert(2),
        // Riley leaves: pull the card and charge the visit
        Event::card_swipe("100"),
        Event::card_remove(2),
        Event::new(EventKind::ButtonMoney),
        // Morgan takes slot 5, then leaves without putting the card back
        Event::card_swipe("100"),
        Event::card_swipe("100"),
        Event::card_insert(5),
        Event::card_remove(5),
        Event::new(EventKind::ButtonConfirm),
        Event::terminate(),
    ];
    for event in script {
        tx.send(event).await.unwrap();
    }

    assert_eq!(machine.run().await, State::Standby);
    assert!(machine.shop().is_empty());
    assert!(machine.shop().occupants(Slot(5)).is_empty());

    // Debt was written back to the user file
    let reloaded = JsonUserDirectory::load(&users_path).unwrap();
    assert_eq!(reloaded.lookup(&UserId::new("200")).unwrap().debt_cents, 500);
    assert_eq!(directory.lookup(&UserId::new("200")).unwrap().debt_cents, 500);

    // Closing the queue stops the controller, which stops the notifier
    drop(tx);
    assert_eq!(machine.run().await, State::Standby);
    assert!(machine.input_closed());
    drop(machine);
    notifier_task.await.unwrap();

    let outbox = std::fs::read_to_string(&outbox_path).unwrap();
    let lines: Vec<serde_json::Value> =
        outbox.lines().map(|line| serde_json::from_str(line).unwrap()).collect();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["user_id"], "100");
}
