//! Clock-tick simulator.
//!
//! `advance` is a pure projection of the previous cluster snapshot (plus the
//! simulator's own RNG) onto the next snapshot and a list of side effects. It
//! never touches the reactor, the queue or the camera.

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use super::event::SideEffect;
use super::log::{Alert, LogEntry, LogSource};
use super::state::{ClusterState, Detection, Joystick};
use super::time::{format_uptime, on_minute_boundary, within_window, SimTime, BOUNDARY_WINDOW_SECS};
use crate::config::SimulationConfig;

pub const MOISTURE_ALERT_THRESHOLD: f64 = 30.0;
const MOISTURE_ALERT_PERIOD_SECS: u64 = 30;
const PUMP_MOISTURE_GAIN: f64 = 1.5;
pub const LEDGER_COMMIT_MINUTES: u64 = 5;
const REPLENISH_MINUTES: u64 = 120;

pub const NITROGEN_BASELINE: f64 = 120.0;
pub const PHOSPHORUS_BASELINE: f64 = 65.0;
pub const POTASSIUM_BASELINE: f64 = 150.0;

/// Inputs from outside the state snapshot for one tick.
#[derive(Debug, Clone)]
pub struct TickInput {
    pub elapsed: SimTime,
    pub wall: DateTime<Utc>,
    /// Fingerprint of the latest camera frame, if the feed is live.
    pub frame_fingerprint: Option<String>,
}

#[derive(Debug, Clone)]
pub struct TickOutcome {
    pub next: ClusterState,
    pub effects: Vec<SideEffect>,
}

pub struct Simulator {
    rng: StdRng,
    detection_probability: f64,
    joystick_probability: f64,
}

impl Simulator {
    pub fn new(config: &SimulationConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            rng,
            detection_probability: config.detection_probability,
            joystick_probability: config.joystick_probability,
        }
    }

    pub fn advance(&mut self, prev: &ClusterState, input: &TickInput) -> TickOutcome {
        let mut next = prev.clone();
        let mut effects = Vec::new();
        let secs = input.elapsed.as_secs();
        let log = |source, message: String| SideEffect::Log(LogEntry::new(input.wall, source, message));

        next.master.uptime = format_uptime(input.elapsed);

        // Environment
        let t = &prev.telemetry;
        next.telemetry.temperature = round_to(t.temperature + (self.unit() - 0.5) * 0.2, 1);
        next.telemetry.humidity = round_to(t.humidity + (self.unit() - 0.5) * 0.5, 1);

        let moisture = if prev.master.actuators.pump {
            (t.moisture + PUMP_MOISTURE_GAIN).min(100.0)
        } else {
            round_to(t.moisture - self.unit() * 0.2, 1).max(0.0)
        };
        next.telemetry.moisture = moisture.clamp(0.0, 100.0);
        if next.telemetry.moisture < MOISTURE_ALERT_THRESHOLD
            && within_window(secs, MOISTURE_ALERT_PERIOD_SECS, BOUNDARY_WINDOW_SECS)
        {
            effects.push(SideEffect::Alert(Alert::warning("Soil moisture is critically low!")));
        }

        // Chemistry
        next.telemetry.ph = round_to(t.ph + (self.unit() - 0.5) * 0.02, 2);
        next.telemetry.nitrogen = round_to(t.nitrogen - self.unit() * 0.1, 1).max(0.0);
        next.telemetry.phosphorus = round_to(t.phosphorus - self.unit() * 0.05, 1).max(0.0);
        next.telemetry.potassium = round_to(t.potassium - self.unit() * 0.08, 1).max(0.0);
        next.telemetry.ammonia = round_to(t.ammonia + (self.unit() - 0.55) * 0.3, 1).max(0.0);

        if on_minute_boundary(input.elapsed, REPLENISH_MINUTES) {
            effects.push(log(LogSource::System, "Nutrient replenishment cycle triggered.".to_string()));
            next.telemetry.nitrogen = NITROGEN_BASELINE + self.unit() * 10.0;
            next.telemetry.phosphorus = PHOSPHORUS_BASELINE + self.unit() * 5.0;
            next.telemetry.potassium = POTASSIUM_BASELINE + self.unit() * 8.0;
        }

        // Sentry vision
        let sentry = &prev.sentry;
        if sentry.camera_active && self.unit() < self.detection_probability {
            next.sentry.detection = Detection::LeafRust;
            next.sentry.detections_today += 1;
            effects.push(log(
                LogSource::Sentry,
                format!("Threat detected: {}. Latency: {}ms.", Detection::LeafRust, sentry.latency_ms),
            ));
            effects.push(SideEffect::Alert(Alert::warning(format!(
                "Sentry Node Alert: {} detected!",
                Detection::LeafRust
            ))));
        } else if !sentry.camera_active && sentry.detection == Detection::LeafRust {
            next.sentry.detection = Detection::Healthy;
        }
        next.sentry.latency_ms = 38 + self.rng.gen_range(0..10);

        // Ledger
        if on_minute_boundary(input.elapsed, LEDGER_COMMIT_MINUTES) {
            let tx_id = self.tx_id();
            effects.push(log(
                LogSource::Telemetry,
                format!("Farm Fingerprint committed to Minima. TxID: {}...", &tx_id[..16]),
            ));
            next.telemetry.last_tx_id = tx_id;
            if let Some(fingerprint) = &input.frame_fingerprint {
                next.telemetry.last_fingerprint = fingerprint.clone();
            }
        }

        // Manual override
        next.telemetry.joystick = Joystick::Idle;
        if t.joystick == Joystick::Idle && self.unit() < self.joystick_probability {
            let event = Joystick::EVENTS[self.rng.gen_range(0..Joystick::EVENTS.len())];
            next.telemetry.joystick = event;
            effects.push(log(
                LogSource::Telemetry,
                format!("Joystick Event: {}. Manual override triggered.", event.label()),
            ));
        }

        debug!(elapsed = secs, effects = effects.len(), "simulator tick");
        TickOutcome { next, effects }
    }

    fn unit(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }

    /// `0x` followed by 64 hex digits.
    fn tx_id(&mut self) -> String {
        let mut bytes = [0u8; 32];
        self.rng.fill(&mut bytes);
        format!("0x{}", hex::encode(bytes))
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}
