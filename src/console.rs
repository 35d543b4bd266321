//! Operator console: plain lines go to the assistant, slash commands drive the
//! handlers directly.

use crate::error::ConsoleError;
use crate::kernel::commands::{run_length, Command, Switch};
use crate::kernel::state::Nutrient;

pub const HELP: &str = "\
/camera [on|off]          toggle or set the sentry camera
/model <name>             load an AI model on the sentry NPU
/pump on|off [secs]       water pump, optional auto-off
/misters on|off [secs]    mister system, optional auto-off
/lights on|off            LED grow lights
/fans on|off              ventilation fans
/fertilize N|P|K <ml>     dispense a nutrient
/permaculture on|off      permaculture enforcement mode
/status                   node summary
/dismiss                  dismiss the current alert
/quit                     exit
anything else             ask the architect";

#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleInput {
    Chat(String),
    Command(Command),
    Status,
    Dismiss,
    Help,
    Quit,
}

/// `Ok(None)` for blank lines.
pub fn parse_line(line: &str) -> Result<Option<ConsoleInput>, ConsoleError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let Some(rest) = line.strip_prefix('/') else {
        return Ok(Some(ConsoleInput::Chat(line.to_string())));
    };

    let mut words = rest.split_whitespace();
    let verb = words.next().unwrap_or_default().to_ascii_lowercase();
    let args: Vec<&str> = words.collect();

    let input = match verb.as_str() {
        "camera" => {
            let state = match args.as_slice() {
                [] => None,
                [s] => Some(switch(s, "/camera [on|off]")?.is_on()),
                _ => return Err(ConsoleError::Usage("/camera [on|off]")),
            };
            ConsoleInput::Command(Command::ToggleCamera { state })
        }
        "model" => {
            if args.is_empty() {
                return Err(ConsoleError::Usage("/model <name>"));
            }
            ConsoleInput::Command(Command::LoadAiModel { model_name: args.join(" ") })
        }
        "pump" | "misters" => {
            let usage = if verb == "pump" { "/pump on|off [secs]" } else { "/misters on|off [secs]" };
            let (state, duration) = match args.as_slice() {
                [s] => (switch(s, usage)?, 0.0),
                [s, d] => (switch(s, usage)?, seconds(d, usage)?),
                _ => return Err(ConsoleError::Usage(usage)),
            };
            ConsoleInput::Command(if verb == "pump" {
                Command::ControlPump { state, duration }
            } else {
                Command::ControlMisters { state, duration }
            })
        }
        "lights" => match args.as_slice() {
            [s] => ConsoleInput::Command(Command::ControlLights { state: switch(s, "/lights on|off")? }),
            _ => return Err(ConsoleError::Usage("/lights on|off")),
        },
        "fans" => match args.as_slice() {
            [s] => ConsoleInput::Command(Command::ControlFans { state: switch(s, "/fans on|off")? }),
            _ => return Err(ConsoleError::Usage("/fans on|off")),
        },
        "fertilize" => {
            let usage = "/fertilize N|P|K <ml>";
            let [n, ml] = args.as_slice() else {
                return Err(ConsoleError::Usage(usage));
            };
            let nutrient = match n.to_ascii_uppercase().as_str() {
                "N" => Nutrient::N,
                "P" => Nutrient::P,
                "K" => Nutrient::K,
                _ => return Err(ConsoleError::Usage(usage)),
            };
            ConsoleInput::Command(Command::ControlFertilizer { nutrient, amount_ml: amount(ml, usage)? })
        }
        "permaculture" => match args.as_slice() {
            [s] => ConsoleInput::Command(Command::SetPermacultureMode {
                enabled: switch(s, "/permaculture on|off")?.is_on(),
            }),
            _ => return Err(ConsoleError::Usage("/permaculture on|off")),
        },
        "status" => ConsoleInput::Status,
        "dismiss" => ConsoleInput::Dismiss,
        "help" => ConsoleInput::Help,
        "quit" | "exit" => ConsoleInput::Quit,
        other => return Err(ConsoleError::UnknownCommand(other.to_string())),
    };
    Ok(Some(input))
}

fn switch(word: &str, usage: &'static str) -> Result<Switch, ConsoleError> {
    match word.to_ascii_lowercase().as_str() {
        "on" | "true" => Ok(Switch::On),
        "off" | "false" => Ok(Switch::Off),
        _ => Err(ConsoleError::Usage(usage)),
    }
}

fn amount(word: &str, usage: &'static str) -> Result<f64, ConsoleError> {
    match word.parse::<f64>() {
        Ok(v) if v.is_finite() && v >= 0.0 => Ok(v),
        _ => Err(ConsoleError::Usage(usage)),
    }
}

fn seconds(word: &str, usage: &'static str) -> Result<f64, ConsoleError> {
    let secs = amount(word, usage)?;
    run_length(secs).map(|_| secs).ok_or(ConsoleError::Usage(usage))
}
