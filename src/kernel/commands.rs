//! Actuator commands.
//!
//! Tool-call payloads are decoded exactly once, here, into a closed set of
//! typed commands. Planning a command is a pure projection:
//! `(Command, ClusterState) -> (StateDelta, SideEffect, Reversal)`.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

use super::event::SideEffect;
use super::log::{LogEntry, LogSource};
use super::state::{Actuator, ClusterState, Fertilization, Nutrient, StateDelta};
use crate::error::CommandError;

pub const TOGGLE_SENTRY_CAMERA: &str = "toggle_sentry_camera";
pub const LOAD_AI_MODEL: &str = "load_ai_model";
pub const CONTROL_PUMP: &str = "control_pump";
pub const CONTROL_MISTERS: &str = "control_misters";
pub const CONTROL_FERTILIZER_LINE: &str = "control_fertilizer_line";
pub const TOGGLE_PERMACULTURE_MODE: &str = "toggle_permaculture_mode";
pub const CONTROL_LIGHTS: &str = "control_lights";
pub const CONTROL_FANS: &str = "control_fans";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Switch {
    On,
    Off,
}

impl Switch {
    pub fn is_on(self) -> bool {
        self == Switch::On
    }

    pub fn label(self) -> &'static str {
        match self {
            Switch::On => "on",
            Switch::Off => "off",
        }
    }
}

impl From<bool> for Switch {
    fn from(on: bool) -> Self {
        if on { Switch::On } else { Switch::Off }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// `None` inverts the current camera state.
    ToggleCamera { state: Option<bool> },
    LoadAiModel { model_name: String },
    /// `duration` is applied as seconds although the model is told minutes.
    ControlPump { state: Switch, duration: f64 },
    ControlMisters { state: Switch, duration: f64 },
    ControlFertilizer { nutrient: Nutrient, amount_ml: f64 },
    SetPermacultureMode { enabled: bool },
    ControlLights { state: Switch },
    ControlFans { state: Switch },
}

#[derive(Deserialize)]
struct SwitchArgs {
    state: Switch,
}

#[derive(Deserialize)]
struct TimedSwitchArgs {
    state: Switch,
    #[serde(default)]
    duration_minutes: Option<f64>,
}

#[derive(Deserialize)]
struct ModelArgs {
    model_name: String,
}

#[derive(Deserialize)]
struct FertilizerArgs {
    nutrient: Nutrient,
    amount_ml: f64,
}

#[derive(Deserialize)]
struct PermacultureArgs {
    state: bool,
}

fn decode<T: DeserializeOwned>(tool: &str, args: &Value) -> Result<T, CommandError> {
    serde_json::from_value(args.clone()).map_err(|e| CommandError::InvalidArguments {
        tool: tool.to_string(),
        reason: e.to_string(),
    })
}

fn non_negative(tool: &str, field: &str, value: f64) -> Result<f64, CommandError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(CommandError::InvalidArguments {
            tool: tool.to_string(),
            reason: format!("`{}` must be a non-negative number, got {}", field, value),
        })
    }
}

/// Auto-off delay for a timed run; `None` when the value does not fit a
/// `Duration`.
pub fn run_length(duration: f64) -> Option<Duration> {
    Duration::try_from_secs_f64(duration).ok()
}

fn representable(tool: &str, duration: f64) -> Result<f64, CommandError> {
    match run_length(duration) {
        Some(_) => Ok(duration),
        None => Err(CommandError::InvalidArguments {
            tool: tool.to_string(),
            reason: "`duration_minutes` is too large".to_string(),
        }),
    }
}

impl Command {
    /// Decodes a model tool call. Unknown names and malformed arguments are
    /// reported, never guessed.
    pub fn from_tool_call(name: &str, args: &Value) -> Result<Self, CommandError> {
        match name {
            TOGGLE_SENTRY_CAMERA => {
                let a: SwitchArgs = decode(name, args)?;
                Ok(Command::ToggleCamera { state: Some(a.state.is_on()) })
            }
            LOAD_AI_MODEL => {
                let a: ModelArgs = decode(name, args)?;
                let model_name = a.model_name.trim().to_string();
                if model_name.is_empty() {
                    return Err(CommandError::InvalidArguments {
                        tool: name.to_string(),
                        reason: "`model_name` must not be empty".to_string(),
                    });
                }
                Ok(Command::LoadAiModel { model_name })
            }
            CONTROL_PUMP | CONTROL_MISTERS => {
                let a: TimedSwitchArgs = decode(name, args)?;
                let duration = non_negative(name, "duration_minutes", a.duration_minutes.unwrap_or(0.0))?;
                let duration = representable(name, duration)?;
                Ok(if name == CONTROL_PUMP {
                    Command::ControlPump { state: a.state, duration }
                } else {
                    Command::ControlMisters { state: a.state, duration }
                })
            }
            CONTROL_FERTILIZER_LINE => {
                let a: FertilizerArgs = decode(name, args)?;
                let amount_ml = non_negative(name, "amount_ml", a.amount_ml)?;
                Ok(Command::ControlFertilizer { nutrient: a.nutrient, amount_ml })
            }
            TOGGLE_PERMACULTURE_MODE => {
                let a: PermacultureArgs = decode(name, args)?;
                Ok(Command::SetPermacultureMode { enabled: a.state })
            }
            CONTROL_LIGHTS => {
                let a: SwitchArgs = decode(name, args)?;
                Ok(Command::ControlLights { state: a.state })
            }
            CONTROL_FANS => {
                let a: SwitchArgs = decode(name, args)?;
                Ok(Command::ControlFans { state: a.state })
            }
            other => Err(CommandError::UnknownTool(other.to_string())),
        }
    }

    pub fn tool_name(&self) -> &'static str {
        match self {
            Command::ToggleCamera { .. } => TOGGLE_SENTRY_CAMERA,
            Command::LoadAiModel { .. } => LOAD_AI_MODEL,
            Command::ControlPump { .. } => CONTROL_PUMP,
            Command::ControlMisters { .. } => CONTROL_MISTERS,
            Command::ControlFertilizer { .. } => CONTROL_FERTILIZER_LINE,
            Command::SetPermacultureMode { .. } => TOGGLE_PERMACULTURE_MODE,
            Command::ControlLights { .. } => CONTROL_LIGHTS,
            Command::ControlFans { .. } => CONTROL_FANS,
        }
    }

    /// The actuator whose pending reversal this command supersedes.
    pub fn actuator(&self) -> Option<Actuator> {
        match self {
            Command::ControlPump { .. } => Some(Actuator::Pump),
            Command::ControlMisters { .. } => Some(Actuator::Misters),
            Command::ControlLights { .. } => Some(Actuator::Lights),
            Command::ControlFans { .. } => Some(Actuator::Fans),
            _ => None,
        }
    }

    pub fn plan(&self, state: &ClusterState, now: DateTime<Utc>) -> Execution {
        let log = |source, message: String| SideEffect::Log(LogEntry::new(now, source, message));

        match self {
            Command::ToggleCamera { state: requested } => {
                let current = state.sentry.camera_active;
                let active = requested.unwrap_or(!current);
                let detail = format!("Camera has been turned {}.", Switch::from(active).label());
                if active == current {
                    return Execution { detail, ..Execution::default() };
                }
                Execution {
                    deltas: vec![StateDelta::CameraActive(active)],
                    effects: vec![log(
                        LogSource::System,
                        format!("Sentry node camera feed {}.", if active { "activated" } else { "deactivated" }),
                    )],
                    reversal: None,
                    detail,
                }
            }
            Command::LoadAiModel { model_name } => Execution {
                deltas: Vec::new(),
                effects: vec![log(LogSource::Sentry, format!("AI command received: Load model '{}'.", model_name))],
                reversal: None,
                detail: format!("Model {} has been loaded.", model_name),
            },
            Command::ControlPump { state: switch, duration } => {
                timed(Actuator::Pump, "Water pump", *switch, *duration, "Pump command executed.", now)
            }
            Command::ControlMisters { state: switch, duration } => {
                timed(Actuator::Misters, "Mister system", *switch, *duration, "Mister command executed.", now)
            }
            Command::ControlFertilizer { nutrient, amount_ml } => Execution {
                deltas: vec![StateDelta::Fertilized(Fertilization {
                    nutrient: *nutrient,
                    amount_ml: *amount_ml,
                    timestamp: now,
                })],
                effects: vec![log(
                    LogSource::System,
                    format!("Fertilizer line activated. Dispensing {}ml of {}.", amount_ml, nutrient),
                )],
                reversal: None,
                detail: "Fertilizer command executed.".to_string(),
            },
            Command::SetPermacultureMode { enabled } => Execution {
                deltas: vec![StateDelta::PermacultureMode(*enabled)],
                effects: vec![log(
                    LogSource::Telemetry,
                    format!(
                        "Permaculture Enforcement mode has been {}.",
                        if *enabled { "ACTIVATED" } else { "DEACTIVATED" }
                    ),
                )],
                reversal: None,
                detail: format!("Permaculture mode set to {}.", enabled),
            },
            Command::ControlLights { state: switch } => Execution {
                deltas: vec![StateDelta::Actuator { actuator: Actuator::Lights, on: switch.is_on() }],
                effects: vec![log(LogSource::System, format!("LED Grow Lights turned {}.", upper(*switch)))],
                reversal: None,
                detail: "Lights command executed.".to_string(),
            },
            Command::ControlFans { state: switch } => Execution {
                deltas: vec![StateDelta::Actuator { actuator: Actuator::Fans, on: switch.is_on() }],
                effects: vec![log(LogSource::System, format!("Ventilation Fans turned {}.", upper(*switch)))],
                reversal: None,
                detail: "Fans command executed.".to_string(),
            },
        }
    }
}

/// Delayed off-transition requested by a timed command.
#[derive(Debug, Clone, PartialEq)]
pub struct Reversal {
    pub actuator: Actuator,
    pub after: Duration,
}

/// Result of planning a command against a snapshot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Execution {
    pub deltas: Vec<StateDelta>,
    pub effects: Vec<SideEffect>,
    pub reversal: Option<Reversal>,
    /// Human-readable outcome, returned to the model as the tool result.
    pub detail: String,
}

fn timed(actuator: Actuator, label: &str, switch: Switch, duration: f64, detail: &str, now: DateTime<Utc>) -> Execution {
    let suffix = if duration > 0.0 { format!(" for {} minutes", duration) } else { String::new() };
    let reversal = if switch.is_on() && duration > 0.0 {
        run_length(duration).map(|after| Reversal { actuator, after })
    } else {
        None
    };
    Execution {
        deltas: vec![StateDelta::Actuator { actuator, on: switch.is_on() }],
        effects: vec![SideEffect::Log(LogEntry::new(
            now,
            LogSource::System,
            format!("{} turned {}{}.", label, upper(switch), suffix),
        ))],
        reversal,
        detail: detail.to_string(),
    }
}

/// Log line written when a timed run ends.
pub fn reversal_message(actuator: Actuator) -> &'static str {
    match actuator {
        Actuator::Pump => "Water pump cycle finished.",
        Actuator::Misters => "Mister cycle finished.",
        Actuator::Lights => "LED Grow Lights cycle finished.",
        Actuator::Fans => "Ventilation Fans cycle finished.",
    }
}

fn upper(switch: Switch) -> &'static str {
    match switch {
        Switch::On => "ON",
        Switch::Off => "OFF",
    }
}
