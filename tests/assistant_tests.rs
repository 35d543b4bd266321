use agripulse::assistant::dispatch::{Dispatcher, Phase, ToolExecutor, NO_RESPONSE_REPLY};
use agripulse::assistant::protocol::{ModelReply, ModelRequest, TurnPart};
use agripulse::assistant::tools::{tool_schemas, SYSTEM_INSTRUCTION};
use agripulse::assistant::transcript::{Role, ToolCall, ToolResponse, ToolResult, Transcript, GREETING};
use agripulse::config::ModelConfig;
use agripulse::error::ModelError;
use agripulse::services::llm::client::{parse_reply, request_body};
use agripulse::services::llm::GeminiClient;
use serde_json::json;

/// Answers every call and remembers the names it saw.
#[derive(Default)]
struct Recorder {
    calls: Vec<String>,
}

impl ToolExecutor for Recorder {
    fn invoke(&mut self, call: &ToolCall) -> ToolResponse {
        self.calls.push(call.name.clone());
        ToolResponse::ok("done")
    }
}

fn exchange() -> Transcript {
    let mut transcript = Transcript::new();
    transcript.push_user("water the beds");
    transcript.push_exchange(
        ToolCall::new("control_pump", json!({"state": "on"})),
        ToolResult { name: "control_pump".into(), response: ToolResponse::ok("Pump command executed.") },
    );
    transcript
}

#[test]
fn test_transcript_pairs_calls_with_results() {
    let transcript = exchange();

    assert_eq!(transcript.len(), 4);
    assert_eq!(transcript.messages()[0].text, GREETING);
    let call = &transcript.messages()[2];
    let result = &transcript.messages()[3];
    assert_eq!(call.role, Role::Assistant);
    assert_eq!(call.tool_call.as_ref().map(|c| c.name.as_str()), Some("control_pump"));
    assert_eq!(result.role, Role::User);
    assert_eq!(result.tool_result.as_ref().map(|r| r.name.as_str()), Some("control_pump"));

    let visible: Vec<&str> = transcript.visible().map(|m| m.text.as_str()).collect();
    assert_eq!(visible, vec![GREETING, "water the beds"]);
}

#[test]
fn test_request_replays_transcript_with_tools() {
    let request = ModelRequest::from_transcript(&exchange());

    assert_eq!(request.system_instruction, SYSTEM_INSTRUCTION);
    assert_eq!(request.turns.len(), 4);
    assert_eq!(request.turns[1].part, TurnPart::Text("water the beds".into()));
    assert!(matches!(request.turns[2].part, TurnPart::ToolCall(_)));
    assert!(matches!(request.turns[3].part, TurnPart::ToolResult(_)));

    let names: Vec<&str> = request.tools.iter().map(|t| t.name).collect();
    assert_eq!(
        names,
        vec![
            "toggle_sentry_camera",
            "load_ai_model",
            "control_pump",
            "control_misters",
            "control_fertilizer_line",
            "toggle_permaculture_mode",
            "control_lights",
            "control_fans",
        ]
    );
}

#[test]
fn test_tool_schemas_declare_required_arguments() {
    for schema in tool_schemas() {
        assert_eq!(schema.parameters["type"], "OBJECT", "{}", schema.name);
        let required = schema.parameters["required"].as_array().unwrap();
        for field in required {
            let field = field.as_str().unwrap();
            assert!(schema.parameters["properties"].get(field).is_some(), "{} lacks {}", schema.name, field);
        }
    }
    let fertilizer = tool_schemas().into_iter().find(|s| s.name == "control_fertilizer_line").unwrap();
    assert_eq!(fertilizer.parameters["properties"]["nutrient"]["enum"], json!(["N", "P", "K"]));
}

#[test]
fn test_dispatcher_without_session() {
    let mut dispatcher = Dispatcher::new();
    let mut transcript = Transcript::new();
    let mut recorder = Recorder::default();

    dispatcher.submit(&mut transcript, "lights on").unwrap();
    let follow_up = dispatcher.complete(
        &mut transcript,
        &mut recorder,
        Ok(ModelReply::ToolCalls(vec![ToolCall::new("control_lights", json!({"state": "on"}))])),
    );
    assert!(follow_up.is_some());
    assert_eq!(recorder.calls, vec!["control_lights"]);

    dispatcher.complete(&mut transcript, &mut recorder, Ok(ModelReply::Text("Lights are on.".into())));
    assert_eq!(dispatcher.phase(), Phase::Idle);
    assert_eq!(transcript.last().unwrap().text, "Lights are on.");

    // A stray reply with no turn open is dropped.
    let len = transcript.len();
    assert!(dispatcher.complete(&mut transcript, &mut recorder, Ok(ModelReply::Text("late".into()))).is_none());
    assert_eq!(transcript.len(), len);
}

#[test]
fn test_request_body_uses_gemini_wire_names() {
    let body = request_body(&ModelRequest::from_transcript(&exchange()));

    assert_eq!(body["systemInstruction"]["parts"][0]["text"], SYSTEM_INSTRUCTION);
    let contents = body["contents"].as_array().unwrap();
    assert_eq!(contents[0]["role"], "model");
    assert_eq!(contents[1]["role"], "user");
    assert_eq!(contents[2]["parts"][0]["functionCall"]["name"], "control_pump");
    assert_eq!(contents[3]["parts"][0]["functionResponse"]["response"]["status"], "ok");
    assert_eq!(body["tools"][0]["functionDeclarations"].as_array().unwrap().len(), 8);
}

#[test]
fn test_parse_reply_prefers_function_calls() {
    let reply = parse_reply(json!({
        "candidates": [{ "content": { "parts": [
            { "text": "Sure." },
            { "functionCall": { "name": "control_fans", "args": { "state": "on" } } }
        ]}}]
    }))
    .unwrap();
    assert_eq!(reply, ModelReply::ToolCalls(vec![ToolCall::new("control_fans", json!({"state": "on"}))]));

    let reply = parse_reply(json!({
        "candidates": [{ "content": { "parts": [{ "text": "Use " }, { "text": "PiNet." }] } }]
    }))
    .unwrap();
    assert_eq!(reply, ModelReply::Text("Use PiNet.".into()));

    assert_eq!(parse_reply(json!({})).unwrap(), ModelReply::Text(NO_RESPONSE_REPLY.into()));
    assert!(matches!(parse_reply(json!({"candidates": "nope"})), Err(ModelError::Malformed(_))));
}

#[test]
fn test_client_requires_api_key() {
    let config = ModelConfig { api_key: Some("   ".into()), ..ModelConfig::default() };
    assert!(matches!(GeminiClient::new(&config), Err(ModelError::MissingApiKey)));

    let config = ModelConfig { api_key: Some("key".into()), ..ModelConfig::default() };
    let client = GeminiClient::new(&config).unwrap();
    assert_eq!(client.model(), "gemini-3-pro-preview");
}
