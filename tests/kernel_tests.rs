use std::time::Duration;

use agripulse::kernel::commands::{Command, Switch};
use agripulse::kernel::event::SideEffect;
use agripulse::kernel::log::{Alert, AlertSlot, LogBook, LogEntry, LogSource};
use agripulse::kernel::scheduler::EventQueue;
use agripulse::kernel::state::{Actuator, ClusterState, Fertilization, NodeId, Nutrient, StateDelta};
use agripulse::kernel::time::{format_uptime, on_minute_boundary, within_window, SimClock, SimTime};
use chrono::{TimeZone, Utc};
use serde_json::json;

#[test]
fn test_uptime_and_boundaries() {
    assert_eq!(format_uptime(SimTime::ZERO), "0d 0h 0m 0s");
    assert_eq!(format_uptime(SimTime::from_secs(90_061)), "1d 1h 1m 1s");
    assert_eq!(format_uptime(SimTime::from_millis(2_999)), "0d 0h 0m 2s");

    assert!(within_window(60, 30, 3));
    assert!(within_window(62, 30, 3));
    assert!(!within_window(63, 30, 3));
    assert!(!within_window(5, 0, 3));

    assert!(!on_minute_boundary(SimTime::ZERO, 5));
    assert!(!on_minute_boundary(SimTime::from_secs(240), 5));
    assert!(on_minute_boundary(SimTime::from_secs(300), 5));
    assert!(on_minute_boundary(SimTime::from_millis(302_500), 5));
    assert!(!on_minute_boundary(SimTime::from_secs(303), 5));
}

#[test]
fn test_clock_maps_sim_time_to_wall() {
    let origin = Utc.with_ymd_and_hms(2025, 6, 1, 6, 0, 0).unwrap();
    let clock = SimClock::new(origin);

    assert_eq!(clock.wall(SimTime::ZERO), origin);
    assert_eq!(clock.wall(SimTime::from_millis(2_500)), origin + chrono::Duration::milliseconds(2_500));
    assert_eq!(SimTime::ZERO + Duration::from_secs(3), SimTime::from_secs(3));
}

#[test]
fn test_log_book_is_newest_first_and_bounded() {
    let origin = Utc.with_ymd_and_hms(2025, 6, 1, 6, 0, 0).unwrap();
    let mut book = LogBook::with_capacity(3);

    for i in 0..10 {
        book.push(LogEntry::new(origin, LogSource::System, format!("entry {}", i)));
    }
    let messages: Vec<&str> = book.iter().map(|e| e.message.as_str()).collect();
    assert_eq!(messages, vec!["entry 9", "entry 8", "entry 7", "entry 6"]);
    assert_eq!(book.recorded(), 10);
    assert_eq!(book.latest().unwrap().to_string(), "[06:00:00] SYSTEM: entry 9");
}

#[test]
fn test_stale_ticket_does_not_clear_replacement() {
    let mut slot = AlertSlot::new();

    let first = slot.raise(Alert::warning("Soil moisture is critically low!"));
    let second = slot.raise(Alert::warning("Sentry Node Alert: Leaf Rust detected!"));
    assert!(!slot.expire(first));
    assert_eq!(slot.current().unwrap().message, "Sentry Node Alert: Leaf Rust detected!");

    assert!(slot.expire(second));
    assert!(slot.current().is_none());
    assert!(slot.dismiss().is_none());
}

#[test]
fn test_nodes_are_tagged_by_kind() {
    let state = ClusterState::new();
    let json = serde_json::to_value(state.nodes()).unwrap();

    assert_eq!(json[0]["id"], "master");
    assert_eq!(json[1]["id"], "sentry");
    assert_eq!(json[1]["camera_active"], false);
    assert_eq!(json[2]["id"], "telemetry");
    assert_eq!(json[2]["last_tx_id"], "...");
    assert_eq!(state.node(NodeId::Sentry).name(), "SENTRY NODE (HAILO AI)");
}

#[test]
fn test_fertilization_overwrites() {
    let mut state = ClusterState::new();
    let at = Utc.with_ymd_and_hms(2025, 6, 1, 6, 0, 0).unwrap();

    state.reduce(StateDelta::Fertilized(Fertilization { nutrient: Nutrient::N, amount_ml: 50.0, timestamp: at }));
    state.reduce(StateDelta::Fertilized(Fertilization { nutrient: Nutrient::K, amount_ml: 10.0, timestamp: at }));
    let last = state.actuators().last_fertilization.as_ref().unwrap();
    assert_eq!(last.nutrient, Nutrient::K);
    assert_eq!(last.amount_ml, 10.0);

    state.reduce(StateDelta::Actuator { actuator: Actuator::Fans, on: true });
    assert!(state.actuators().is_on(Actuator::Fans));
    assert!(!state.actuators().is_on(Actuator::Pump));
}

#[test]
fn test_queue_pops_in_deadline_order_and_skips_cancelled() {
    let mut queue = EventQueue::new();
    queue.schedule(SimTime::from_secs(5), "late");
    let cancelled = queue.schedule(SimTime::from_secs(1), "cancelled");
    queue.schedule(SimTime::from_secs(2), "first");
    queue.schedule(SimTime::from_secs(2), "second");

    assert!(queue.cancel(cancelled));
    assert!(!queue.cancel(cancelled));
    assert_eq!(queue.len(), 3);
    assert_eq!(queue.next_deadline(), Some(SimTime::from_secs(2)));

    let due: Vec<&str> = std::iter::from_fn(|| queue.pop_due(SimTime::from_secs(4)).map(|(_, _, p)| p)).collect();
    assert_eq!(due, vec!["first", "second"]);
    assert_eq!(queue.pending(), vec![(SimTime::from_secs(5), &"late")]);

    queue.clear();
    assert!(queue.is_empty());
    assert!(queue.pop_due(SimTime::from_secs(10)).is_none());
}

#[test]
fn test_cancelled_timers_do_not_pile_up() {
    let mut queue = EventQueue::new();
    queue.schedule(SimTime::from_secs(1), 0u32);

    for i in 0..1_000 {
        let id = queue.schedule(SimTime::from_secs(86_400 + i), 1);
        queue.cancel(id);
        assert!(queue.backlog() <= 2 * queue.len(), "backlog {} after {} cancels", queue.backlog(), i + 1);
    }
    assert_eq!(queue.len(), 1);
    assert_eq!(queue.pop_due(SimTime::from_secs(1)).map(|(_, _, p)| p), Some(0));
}

#[test]
fn test_tool_calls_decode_into_commands() {
    assert_eq!(
        Command::from_tool_call("control_pump", &json!({"state": "on", "duration_minutes": 5})).unwrap(),
        Command::ControlPump { state: Switch::On, duration: 5.0 }
    );
    assert_eq!(
        Command::from_tool_call("control_misters", &json!({"state": "off"})).unwrap(),
        Command::ControlMisters { state: Switch::Off, duration: 0.0 }
    );
    assert_eq!(
        Command::from_tool_call("toggle_permaculture_mode", &json!({"state": true})).unwrap(),
        Command::SetPermacultureMode { enabled: true }
    );
    assert_eq!(
        Command::from_tool_call("control_fertilizer_line", &json!({"nutrient": "P", "amount_ml": 40})).unwrap(),
        Command::ControlFertilizer { nutrient: Nutrient::P, amount_ml: 40.0 }
    );

    assert!(Command::from_tool_call("control_lights", &json!({"state": "dim"})).is_err());
    assert!(Command::from_tool_call("control_pump", &json!({"state": "on", "duration_minutes": -1})).is_err());
    assert!(Command::from_tool_call("control_fertilizer_line", &json!({"nutrient": "Z", "amount_ml": 1})).is_err());
    assert!(Command::from_tool_call("self_destruct", &json!({})).is_err());
}

#[test]
fn test_plan_is_pure_projection() {
    let state = ClusterState::new();
    let now = Utc.with_ymd_and_hms(2025, 6, 1, 6, 0, 0).unwrap();

    let execution = Command::ControlMisters { state: Switch::On, duration: 2.0 }.plan(&state, now);
    assert_eq!(execution.deltas, vec![StateDelta::Actuator { actuator: Actuator::Misters, on: true }]);
    assert_eq!(execution.reversal.as_ref().map(|r| r.after), Some(Duration::from_secs(2)));
    match &execution.effects[..] {
        [SideEffect::Log(entry)] => assert_eq!(entry.message, "Mister system turned ON for 2 minutes."),
        other => panic!("unexpected effects {:?}", other),
    }
    assert_eq!(execution.detail, "Mister command executed.");
    assert!(!state.actuators().misters);

    // Off never schedules a reversal, even with a duration.
    let execution = Command::ControlMisters { state: Switch::Off, duration: 2.0 }.plan(&state, now);
    assert!(execution.reversal.is_none());

    // Camera already off: no delta, no log.
    let execution = Command::ToggleCamera { state: Some(false) }.plan(&state, now);
    assert!(execution.deltas.is_empty() && execution.effects.is_empty());
    assert_eq!(execution.detail, "Camera has been turned off.");
}
