use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::commands::{reversal_message, Command, Execution};
use super::event::{SideEffect, Timer};
use super::log::{Alert, AlertSlot, LogEntry, LogSource};
use super::scheduler::{EventQueue, TimerId};
use super::simulator::{Simulator, TickInput, LEDGER_COMMIT_MINUTES};
use super::state::{Actuator, ClusterState, StateDelta};
use super::time::{on_minute_boundary, SimClock, SimTime};
use crate::assistant::transcript::{ToolCall, ToolResponse};
use crate::assistant::dispatch::ToolExecutor;
use crate::config::SimulationConfig;
use crate::error::CaptureError;
use crate::vision::camera::{CameraFeed, CaptureDevice};

/// Owns the cluster and everything that mutates it: the simulator, the
/// command handlers, the event queue, the alert slot and the camera feed.
pub struct Reactor {
    pub state: ClusterState,
    alerts: AlertSlot,
    queue: EventQueue<Timer>,
    /// Pending auto-off per actuator; superseded by any later command for it.
    reversals: HashMap<Actuator, TimerId>,
    simulator: Simulator,
    camera: CameraFeed,
    clock: SimClock,
    now: SimTime,
    tick_period: Duration,
    alert_ttl: Duration,
}

impl Reactor {
    pub fn new(config: &SimulationConfig, clock: SimClock, camera: Box<dyn CaptureDevice>) -> Self {
        let mut reactor = Self {
            state: ClusterState::with_log_capacity(config.log_capacity),
            alerts: AlertSlot::new(),
            queue: EventQueue::new(),
            reversals: HashMap::new(),
            simulator: Simulator::new(config),
            camera: CameraFeed::new(camera),
            clock,
            now: SimTime::ZERO,
            tick_period: Duration::from_millis(config.tick_ms),
            alert_ttl: Duration::from_millis(config.alert_ttl_ms),
        };

        reactor.record(LogSource::System, "AgriPulse Viable Product BOM v1.0 configured.");
        reactor.record(LogSource::Master, "PiNet server online. 2 clients connected.");
        reactor.record(LogSource::Sentry, "Hailo-10H NPU initialized. Global Shutter Camera active.");
        reactor.record(LogSource::Telemetry, "Sense Hat, ADS1115 ADC, and Soil Probes online. Minima node synced.");

        let first = reactor.now + reactor.tick_period;
        reactor.queue.schedule(first, Timer::SimulatorTick);
        info!("Reactor online. Tick: {}ms", config.tick_ms);
        reactor
    }

    pub fn now(&self) -> SimTime {
        self.now
    }

    pub fn alert(&self) -> Option<&Alert> {
        self.alerts.current()
    }

    pub fn camera_acquired(&self) -> bool {
        self.camera.is_acquired()
    }

    /// Scheduled work in firing order.
    pub fn pending_timers(&self) -> Vec<(SimTime, Timer)> {
        self.queue.pending().into_iter().map(|(at, t)| (at, t.clone())).collect()
    }

    /// Fires every timer due at or before `now`, in order, each in the context
    /// of its own deadline. Returns how many fired.
    pub fn advance_to(&mut self, now: SimTime) -> usize {
        let mut fired = 0;
        while let Some((at, _, timer)) = self.queue.pop_due(now) {
            self.now = self.now.max(at);
            self.fire(timer);
            fired += 1;
        }
        self.now = self.now.max(now);
        fired
    }

    fn fire(&mut self, timer: Timer) {
        match timer {
            Timer::SimulatorTick => {
                self.tick_step();
                let next = self.now + self.tick_period;
                self.queue.schedule(next, Timer::SimulatorTick);
            }
            Timer::Reversal { actuator } => {
                self.reversals.remove(&actuator);
                self.state.reduce(StateDelta::Actuator { actuator, on: false });
                self.record(LogSource::System, reversal_message(actuator));
            }
            Timer::AlertExpiry { ticket } => {
                if self.alerts.expire(ticket) {
                    debug!("Alert expired");
                }
            }
        }
    }

    /// One simulator step at the current time.
    pub fn tick_step(&mut self) {
        // Frames only feed the ledger, so capture only on commit ticks.
        let frame_fingerprint = if on_minute_boundary(self.now, LEDGER_COMMIT_MINUTES) {
            self.camera.fingerprint()
        } else {
            None
        };
        let input = TickInput { elapsed: self.now, wall: self.clock.wall(self.now), frame_fingerprint };
        let outcome = self.simulator.advance(&self.state, &input);
        self.state = outcome.next;
        for effect in outcome.effects {
            self.emit(effect);
        }
    }

    /// Runs a command handler against the current state. Returns the outcome
    /// detail reported to the assistant.
    pub fn execute(&mut self, command: Command) -> String {
        debug!(tool = command.tool_name(), "Executing command");
        if let Some(actuator) = command.actuator() {
            if let Some(pending) = self.reversals.remove(&actuator) {
                self.queue.cancel(pending);
                debug!(?actuator, backlog = self.queue.backlog(), "Superseded pending reversal");
            }
        }

        let Execution { deltas, effects, reversal, detail } = command.plan(&self.state, self.clock.wall(self.now));
        for delta in deltas {
            let camera = match delta {
                StateDelta::CameraActive(active) => Some(active),
                _ => None,
            };
            self.state.reduce(delta);
            if let Some(active) = camera {
                self.sync_camera(active);
            }
        }
        for effect in effects {
            self.emit(effect);
        }
        if let Some(reversal) = reversal {
            let id = self.queue.schedule(self.now + reversal.after, Timer::Reversal { actuator: reversal.actuator });
            self.reversals.insert(reversal.actuator, id);
        }
        detail
    }

    pub fn dismiss_alert(&mut self) -> Option<Alert> {
        self.alerts.dismiss()
    }

    /// Teardown: no timer fires and no capture is held afterwards.
    pub fn shutdown(&mut self) {
        self.queue.clear();
        self.reversals.clear();
        self.camera.release();
        self.state.reduce(StateDelta::CameraActive(false));
        info!("Reactor shut down");
    }

    fn sync_camera(&mut self, active: bool) {
        if let Err(CaptureError::Unavailable(reason)) = self.camera.set_active(active) {
            warn!(%reason, "Camera acquisition failed; reverting feed");
            self.state.reduce(StateDelta::CameraActive(false));
        }
    }

    fn emit(&mut self, effect: SideEffect) {
        match effect {
            SideEffect::Log(entry) => self.push_log(entry),
            SideEffect::Alert(alert) => {
                info!(severity = ?alert.severity, "Alert: {}", alert.message);
                let ticket = self.alerts.raise(alert);
                self.queue.schedule(self.now + self.alert_ttl, Timer::AlertExpiry { ticket });
            }
        }
    }

    fn record(&mut self, source: LogSource, message: &str) {
        let entry = LogEntry::new(self.clock.wall(self.now), source, message);
        self.push_log(entry);
    }

    fn push_log(&mut self, entry: LogEntry) {
        debug!(source = %entry.source, "{}", entry.message);
        self.state.reduce(StateDelta::Logged(entry));
    }
}

impl ToolExecutor for Reactor {
    fn invoke(&mut self, call: &ToolCall) -> ToolResponse {
        let args = serde_json::to_string(&call.args).unwrap_or_else(|_| "{}".to_string());
        self.record(LogSource::System, &format!("Architect is executing: {}({})", call.name, args));

        match Command::from_tool_call(&call.name, &call.args) {
            Ok(command) => ToolResponse::ok(self.execute(command)),
            Err(e) => {
                warn!(tool = %call.name, error = %e, "Rejected tool call");
                ToolResponse::error(e.tool_detail())
            }
        }
    }
}
