mod common;

use agripulse::config::Config;
use agripulse::console::{parse_line, ConsoleInput};
use agripulse::error::ConsoleError;
use agripulse::kernel::state::Nutrient;
use agripulse::kernel::commands::{Command, Switch};
use agripulse::kernel::time::SimTime;
use common::{quiet_config, session, ScriptedModel};
use serde_json::json;

#[test]
fn test_snapshot_serializes_dashboard() {
    let mut session = session(&quiet_config());
    session.execute(Command::ControlLights { state: Switch::On });
    session.advance_to(SimTime::from_secs(5));

    let snapshot = serde_json::to_value(session.snapshot()).unwrap();

    assert_eq!(snapshot["elapsed_secs"], 5);
    assert_eq!(snapshot["loading"], false);
    assert_eq!(snapshot["alert"], json!(null));

    let nodes = snapshot["nodes"].as_array().unwrap();
    assert_eq!(nodes.len(), 3);
    assert_eq!(nodes[0]["id"], "master");
    assert_eq!(nodes[0]["actuators"]["lights"], true);
    assert_eq!(nodes[0]["uptime"], "0d 0h 0m 5s");
    assert_eq!(nodes[1]["id"], "sentry");
    assert_eq!(nodes[2]["id"], "telemetry");
    assert_eq!(nodes[2]["joystick"], "idle");

    let logs = snapshot["logs"].as_array().unwrap();
    assert_eq!(logs.len(), 5);
    assert_eq!(logs[0]["source"], "SYSTEM");
    assert_eq!(logs[0]["message"], "LED Grow Lights turned ON.");

    let transcript = snapshot["transcript"].as_array().unwrap();
    assert_eq!(transcript.len(), 1);
    assert_eq!(transcript[0]["role"], "assistant");
}

#[tokio::test]
async fn test_snapshot_hides_tool_records() {
    let mut session = session(&quiet_config());
    let model = ScriptedModel::new(vec![
        Ok(agripulse::assistant::protocol::ModelReply::ToolCalls(vec![
            agripulse::assistant::transcript::ToolCall::new("load_ai_model", json!({"model_name": "YOLOv8"})),
        ])),
        Ok(agripulse::assistant::protocol::ModelReply::Text("YOLOv8 is on the NPU.".into())),
    ]);
    session.run_turn(&model, "Load YOLOv8").await.unwrap();

    assert_eq!(session.transcript().len(), 5);
    let snapshot = serde_json::to_value(session.snapshot()).unwrap();
    let transcript = snapshot["transcript"].as_array().unwrap();
    assert_eq!(transcript.len(), 3);
    assert_eq!(transcript[2]["text"], "YOLOv8 is on the NPU.");
}

#[test]
fn test_console_lines_drive_handlers() {
    let mut session = session(&quiet_config());

    for line in ["/lights on", "/fertilize p 40", "/pump on 3"] {
        match parse_line(line).unwrap() {
            Some(ConsoleInput::Command(command)) => {
                session.execute(command);
            }
            other => panic!("{} parsed as {:?}", line, other),
        }
    }
    let actuators = session.state().actuators();
    assert!(actuators.lights && actuators.pump);
    assert_eq!(actuators.last_fertilization.as_ref().map(|f| f.amount_ml), Some(40.0));

    session.advance_to(SimTime::from_secs(3));
    assert!(!session.state().actuators().pump);
}

#[test]
fn test_console_parses_commands_and_rejects_bad_input() {
    assert_eq!(parse_line("   ").unwrap(), None);
    assert_eq!(
        parse_line("how do I wire the ADC?").unwrap(),
        Some(ConsoleInput::Chat("how do I wire the ADC?".to_string()))
    );
    assert_eq!(
        parse_line("/camera").unwrap(),
        Some(ConsoleInput::Command(Command::ToggleCamera { state: None }))
    );
    assert_eq!(
        parse_line("/misters ON 2.5").unwrap(),
        Some(ConsoleInput::Command(Command::ControlMisters { state: Switch::On, duration: 2.5 }))
    );
    assert_eq!(
        parse_line("/fertilize k 12").unwrap(),
        Some(ConsoleInput::Command(Command::ControlFertilizer { nutrient: Nutrient::K, amount_ml: 12.0 }))
    );
    assert_eq!(
        parse_line("/model YOLOv8 nano").unwrap(),
        Some(ConsoleInput::Command(Command::LoadAiModel { model_name: "YOLOv8 nano".to_string() }))
    );
    assert_eq!(parse_line("/quit").unwrap(), Some(ConsoleInput::Quit));

    assert_eq!(parse_line("/warp 9"), Err(ConsoleError::UnknownCommand("warp".to_string())));
    assert_eq!(parse_line("/pump maybe"), Err(ConsoleError::Usage("/pump on|off [secs]")));
    assert_eq!(parse_line("/pump on -3"), Err(ConsoleError::Usage("/pump on|off [secs]")));
    assert_eq!(parse_line("/pump on 1e30"), Err(ConsoleError::Usage("/pump on|off [secs]")));
    assert_eq!(parse_line("/misters on 1e30"), Err(ConsoleError::Usage("/misters on|off [secs]")));
    assert_eq!(parse_line("/fertilize X 10"), Err(ConsoleError::Usage("/fertilize N|P|K <ml>")));
}

#[test]
fn test_config_file_and_env_overrides() {
    let mut config = Config::from_toml_str(
        r#"
        [simulation]
        tick_ms = 1000
        seed = 7

        [model]
        model = "gemini-2.5-flash"
        "#,
    )
    .unwrap();
    assert_eq!(config.simulation.tick_ms, 1000);
    assert_eq!(config.simulation.log_capacity, 100);
    assert_eq!(config.model.timeout_secs, 60);

    config.apply_env(|key| match key {
        "API_KEY" => Some("secret".to_string()),
        "AGRIPULSE_MODEL" => Some("gemini-3-pro-preview".to_string()),
        _ => None,
    });
    assert_eq!(config.model.api_key.as_deref(), Some("secret"));
    assert_eq!(config.model.model, "gemini-3-pro-preview");

    let mut session = session(&config);
    assert_eq!(session.advance_to(SimTime::from_secs(3)), 3);
}

#[test]
fn test_invalid_config_is_rejected() {
    assert!(Config::from_toml_str("[simulation]\ntick_ms = 0\n").is_err());
    assert!(Config::from_toml_str("[simulation]\ndetection_probability = 1.5\n").is_err());
    assert!(Config::from_toml_str("[simulation]\ntick_ms = \"fast\"\n").is_err());
}
