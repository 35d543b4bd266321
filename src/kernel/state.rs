use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::log::{LogBook, LogEntry};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeStatus {
    Online,
    Warning,
    Offline,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Detection {
    Healthy,
    #[serde(rename = "Leaf Rust")]
    LeafRust,
}

impl fmt::Display for Detection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Detection::Healthy => f.write_str("Healthy"),
            Detection::LeafRust => f.write_str("Leaf Rust"),
        }
    }
}

/// Sense HAT joystick. Non-idle values last exactly one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Joystick {
    Idle,
    Up,
    Down,
    Left,
    Right,
    Click,
}

impl Joystick {
    pub const EVENTS: [Joystick; 5] = [Joystick::Up, Joystick::Down, Joystick::Left, Joystick::Right, Joystick::Click];

    pub fn label(&self) -> &'static str {
        match self {
            Joystick::Idle => "IDLE",
            Joystick::Up => "UP",
            Joystick::Down => "DOWN",
            Joystick::Left => "LEFT",
            Joystick::Right => "RIGHT",
            Joystick::Click => "CLICK",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Nutrient {
    N,
    P,
    K,
}

impl fmt::Display for Nutrient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Nutrient::N => f.write_str("N"),
            Nutrient::P => f.write_str("P"),
            Nutrient::K => f.write_str("K"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fertilization {
    pub nutrient: Nutrient,
    pub amount_ml: f64,
    pub timestamp: DateTime<Utc>,
}

/// Switchable outputs wired to the Master node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Actuator {
    Pump,
    Misters,
    Lights,
    Fans,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActuatorState {
    pub pump: bool,
    pub misters: bool,
    pub lights: bool,
    pub fans: bool,
    pub last_fertilization: Option<Fertilization>,
}

impl ActuatorState {
    pub fn is_on(&self, actuator: Actuator) -> bool {
        match actuator {
            Actuator::Pump => self.pump,
            Actuator::Misters => self.misters,
            Actuator::Lights => self.lights,
            Actuator::Fans => self.fans,
        }
    }

    pub fn set(&mut self, actuator: Actuator, on: bool) {
        match actuator {
            Actuator::Pump => self.pump = on,
            Actuator::Misters => self.misters = on,
            Actuator::Lights => self.lights = on,
            Actuator::Fans => self.fans = on,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MasterNode {
    pub name: String,
    pub status: NodeStatus,
    pub uptime: String,
    pub pinet_clients: u32,
    pub actuators: ActuatorState,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentryNode {
    pub name: String,
    pub status: NodeStatus,
    pub detection: Detection,
    pub latency_ms: u32,
    pub detections_today: u32,
    pub camera_active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryNode {
    pub name: String,
    pub status: NodeStatus,
    pub temperature: f64,
    pub humidity: f64,
    pub pressure: f64,
    pub moisture: f64,
    pub ph: f64,
    pub nitrogen: f64,
    pub phosphorus: f64,
    pub potassium: f64,
    pub ammonia: f64,
    pub permaculture_mode: bool,
    pub joystick: Joystick,
    pub last_tx_id: String,
    pub last_fingerprint: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeId {
    Master,
    Sentry,
    Telemetry,
}

/// Borrowed view of one node, tagged by kind.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(tag = "id", rename_all = "lowercase")]
pub enum Node<'a> {
    Master(&'a MasterNode),
    Sentry(&'a SentryNode),
    Telemetry(&'a TelemetryNode),
}

impl<'a> Node<'a> {
    pub fn id(&self) -> NodeId {
        match self {
            Node::Master(_) => NodeId::Master,
            Node::Sentry(_) => NodeId::Sentry,
            Node::Telemetry(_) => NodeId::Telemetry,
        }
    }

    pub fn name(&self) -> &'a str {
        match self {
            Node::Master(n) => &n.name,
            Node::Sentry(n) => &n.name,
            Node::Telemetry(n) => &n.name,
        }
    }

    pub fn status(&self) -> NodeStatus {
        match self {
            Node::Master(n) => n.status,
            Node::Sentry(n) => n.status,
            Node::Telemetry(n) => n.status,
        }
    }

    /// One-line summary for consoles.
    pub fn headline(&self) -> String {
        match self {
            Node::Master(n) => format!(
                "{} up {} | pump {} misters {} lights {} fans {}",
                n.name,
                n.uptime,
                on_off(n.actuators.pump),
                on_off(n.actuators.misters),
                on_off(n.actuators.lights),
                on_off(n.actuators.fans),
            ),
            Node::Sentry(n) => format!(
                "{} | {} | {}ms | camera {} | {} today",
                n.name,
                n.detection,
                n.latency_ms,
                on_off(n.camera_active),
                n.detections_today,
            ),
            Node::Telemetry(n) => format!(
                "{} | {:.1}C {:.1}% | moisture {:.1}% | pH {:.2} | N {:.1} P {:.1} K {:.1} | NH3 {:.1}",
                n.name, n.temperature, n.humidity, n.moisture, n.ph, n.nitrogen, n.phosphorus, n.potassium, n.ammonia,
            ),
        }
    }
}

fn on_off(on: bool) -> &'static str {
    if on { "ON" } else { "OFF" }
}

/// Strict state delta. Command handlers and scheduled reversals mutate the
/// cluster only through these.
#[derive(Debug, Clone, PartialEq)]
pub enum StateDelta {
    Actuator { actuator: Actuator, on: bool },
    Fertilized(Fertilization),
    PermacultureMode(bool),
    CameraActive(bool),
    Logged(LogEntry),
}

#[derive(Debug, Clone, Serialize)]
pub struct ClusterState {
    pub master: MasterNode,
    pub sentry: SentryNode,
    pub telemetry: TelemetryNode,
    pub logs: LogBook,
}

impl Default for ClusterState {
    fn default() -> Self {
        Self::with_log_capacity(super::log::DEFAULT_LOG_CAPACITY)
    }
}

impl ClusterState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_log_capacity(capacity: usize) -> Self {
        Self {
            master: MasterNode {
                name: "PI-NET MASTER NODE".to_string(),
                status: NodeStatus::Online,
                uptime: "0d 0h 0m 0s".to_string(),
                pinet_clients: 2,
                actuators: ActuatorState::default(),
            },
            sentry: SentryNode {
                name: "SENTRY NODE (HAILO AI)".to_string(),
                status: NodeStatus::Online,
                detection: Detection::Healthy,
                latency_ms: 42,
                detections_today: 0,
                camera_active: false,
            },
            telemetry: TelemetryNode {
                name: "TELEMETRY NODE (SENSORS)".to_string(),
                status: NodeStatus::Online,
                temperature: 24.1,
                humidity: 68.2,
                pressure: 1012.5,
                moisture: 75.3,
                ph: 6.8,
                nitrogen: 120.0,
                phosphorus: 65.0,
                potassium: 150.0,
                ammonia: 5.2,
                permaculture_mode: false,
                joystick: Joystick::Idle,
                last_tx_id: "...".to_string(),
                last_fingerprint: "...".to_string(),
            },
            logs: LogBook::with_capacity(capacity),
        }
    }

    pub fn nodes(&self) -> [Node<'_>; 3] {
        [Node::Master(&self.master), Node::Sentry(&self.sentry), Node::Telemetry(&self.telemetry)]
    }

    pub fn node(&self, id: NodeId) -> Node<'_> {
        match id {
            NodeId::Master => Node::Master(&self.master),
            NodeId::Sentry => Node::Sentry(&self.sentry),
            NodeId::Telemetry => Node::Telemetry(&self.telemetry),
        }
    }

    pub fn actuators(&self) -> &ActuatorState {
        &self.master.actuators
    }

    /// State + Delta -> mutated state.
    pub fn reduce(&mut self, delta: StateDelta) {
        match delta {
            StateDelta::Actuator { actuator, on } => self.master.actuators.set(actuator, on),
            StateDelta::Fertilized(record) => self.master.actuators.last_fertilization = Some(record),
            StateDelta::PermacultureMode(enabled) => self.telemetry.permaculture_mode = enabled,
            StateDelta::CameraActive(active) => self.sentry.camera_active = active,
            StateDelta::Logged(entry) => self.logs.push(entry),
        }
    }
}
