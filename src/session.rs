//! Session context: the one place that owns the cluster, the conversation and
//! the turn state. Everything a driver or UI can do goes through here.

use serde::Serialize;
use std::time::Duration;
use tracing::info;

use crate::assistant::dispatch::Dispatcher;
use crate::assistant::protocol::{ModelBackend, ModelReply, ModelRequest};
use crate::assistant::transcript::{Message, Transcript};
use crate::config::Config;
use crate::error::{DispatchError, ModelError};
use crate::kernel::commands::Command;
use crate::kernel::log::{Alert, LogBook};
use crate::kernel::reactor::Reactor;
use crate::kernel::state::{ClusterState, Node};
use crate::kernel::time::{SimClock, SimTime};
use crate::vision::camera::{CaptureDevice, SyntheticCamera};

pub struct Session {
    reactor: Reactor,
    transcript: Transcript,
    dispatcher: Dispatcher,
}

/// Read-only view for rendering.
#[derive(Debug, Serialize)]
pub struct DashboardSnapshot<'a> {
    pub elapsed_secs: u64,
    pub nodes: [Node<'a>; 3],
    pub logs: &'a LogBook,
    pub alert: Option<&'a Alert>,
    pub transcript: Vec<&'a Message>,
    pub loading: bool,
}

impl Session {
    pub fn new(config: &Config) -> Self {
        let camera = SyntheticCamera::new(config.simulation.seed);
        Self::with_camera(config, SimClock::starting_now(), Box::new(camera))
    }

    pub fn with_camera(config: &Config, clock: SimClock, camera: Box<dyn CaptureDevice>) -> Self {
        Self {
            reactor: Reactor::new(&config.simulation, clock, camera),
            transcript: Transcript::new(),
            dispatcher: Dispatcher::new(),
        }
    }

    pub fn state(&self) -> &ClusterState {
        &self.reactor.state
    }

    pub fn reactor(&self) -> &Reactor {
        &self.reactor
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn now(&self) -> SimTime {
        self.reactor.now()
    }

    pub fn alert(&self) -> Option<&Alert> {
        self.reactor.alert()
    }

    pub fn is_loading(&self) -> bool {
        self.dispatcher.is_loading()
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn advance_to(&mut self, now: SimTime) -> usize {
        self.reactor.advance_to(now)
    }

    pub fn advance_by(&mut self, elapsed: Duration) -> usize {
        let target = self.reactor.now() + elapsed;
        self.reactor.advance_to(target)
    }

    /// Direct handler entry point, bypassing the assistant.
    pub fn execute(&mut self, command: Command) -> String {
        self.reactor.execute(command)
    }

    pub fn dismiss_alert(&mut self) -> Option<Alert> {
        self.reactor.dismiss_alert()
    }

    pub fn submit_message(&mut self, text: &str) -> Result<ModelRequest, DispatchError> {
        self.dispatcher.submit(&mut self.transcript, text)
    }

    pub fn complete_model_call(&mut self, reply: Result<ModelReply, ModelError>) -> Option<ModelRequest> {
        self.dispatcher.complete(&mut self.transcript, &mut self.reactor, reply)
    }

    /// Runs a whole turn to completion. The simulator does not advance while
    /// this is awaited; drivers that need it to use the split API.
    pub async fn run_turn<M: ModelBackend>(&mut self, model: &M, text: &str) -> Result<(), DispatchError> {
        let mut request = self.submit_message(text)?;
        loop {
            let reply = model.generate(request).await;
            match self.complete_model_call(reply) {
                Some(next) => request = next,
                None => return Ok(()),
            }
        }
    }

    pub fn snapshot(&self) -> DashboardSnapshot<'_> {
        let state = &self.reactor.state;
        DashboardSnapshot {
            elapsed_secs: self.reactor.now().as_secs(),
            nodes: state.nodes(),
            logs: &state.logs,
            alert: self.reactor.alert(),
            transcript: self.transcript.visible().collect(),
            loading: self.dispatcher.is_loading(),
        }
    }

    pub fn shutdown(&mut self) {
        self.reactor.shutdown();
        info!("Session closed");
    }
}
