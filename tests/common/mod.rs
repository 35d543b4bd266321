#![allow(dead_code)]

use std::collections::VecDeque;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use agripulse::assistant::protocol::{ModelBackend, ModelReply, ModelRequest};
use agripulse::config::{Config, SimulationConfig};
use agripulse::error::{CaptureError, ModelError};
use agripulse::kernel::time::SimClock;
use agripulse::vision::camera::{CaptureDevice, SyntheticCamera};
use agripulse::Session;
use chrono::{TimeZone, Utc};
use image::DynamicImage;

/// Seeded, with every random event switched off.
pub fn quiet_config() -> Config {
    Config {
        simulation: SimulationConfig {
            seed: Some(42),
            detection_probability: 0.0,
            joystick_probability: 0.0,
            ..SimulationConfig::default()
        },
        ..Config::default()
    }
}

pub fn clock() -> SimClock {
    SimClock::new(Utc.with_ymd_and_hms(2025, 6, 1, 6, 0, 0).unwrap())
}

pub fn session(config: &Config) -> Session {
    Session::with_camera(config, clock(), Box::new(SyntheticCamera::new(Some(9))))
}

pub fn session_with(config: &Config, camera: impl CaptureDevice + 'static) -> Session {
    Session::with_camera(config, clock(), Box::new(camera))
}

pub fn log_messages(session: &Session) -> Vec<String> {
    session.state().logs.iter().map(|e| format!("{}: {}", e.source, e.message)).collect()
}

/// Replays canned replies in order and records every request it saw.
#[derive(Default)]
pub struct ScriptedModel {
    replies: Mutex<VecDeque<Result<ModelReply, ModelError>>>,
    pub requests: Mutex<Vec<ModelRequest>>,
}

impl ScriptedModel {
    pub fn new(replies: Vec<Result<ModelReply, ModelError>>) -> Self {
        Self { replies: Mutex::new(replies.into()), requests: Mutex::new(Vec::new()) }
    }

    pub fn requests(&self) -> Vec<ModelRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl ModelBackend for ScriptedModel {
    fn generate(&self, request: ModelRequest) -> impl Future<Output = Result<ModelReply, ModelError>> + Send {
        self.requests.lock().unwrap().push(request);
        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ModelError::Malformed("script exhausted".into())));
        async move { reply }
    }
}

/// Never grants the capture.
pub struct FailingCamera;

impl CaptureDevice for FailingCamera {
    fn acquire(&mut self) -> Result<(), CaptureError> {
        Err(CaptureError::Unavailable("device busy".into()))
    }

    fn release(&mut self) {}

    fn frame(&mut self) -> Option<DynamicImage> {
        None
    }
}

/// Exposes whether the capture is currently held.
pub struct TrackingCamera {
    pub held: Arc<AtomicBool>,
}

impl TrackingCamera {
    pub fn new() -> (Self, Arc<AtomicBool>) {
        let held = Arc::new(AtomicBool::new(false));
        (Self { held: held.clone() }, held)
    }
}

impl CaptureDevice for TrackingCamera {
    fn acquire(&mut self) -> Result<(), CaptureError> {
        self.held.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn release(&mut self) {
        self.held.store(false, Ordering::SeqCst);
    }

    fn frame(&mut self) -> Option<DynamicImage> {
        None
    }
}

/// Always streams a blank frame and counts how many were pulled.
pub struct CountingCamera {
    frames: Arc<AtomicUsize>,
}

impl CountingCamera {
    pub fn new() -> (Self, Arc<AtomicUsize>) {
        let frames = Arc::new(AtomicUsize::new(0));
        (Self { frames: frames.clone() }, frames)
    }
}

impl CaptureDevice for CountingCamera {
    fn acquire(&mut self) -> Result<(), CaptureError> {
        Ok(())
    }

    fn release(&mut self) {}

    fn frame(&mut self) -> Option<DynamicImage> {
        self.frames.fetch_add(1, Ordering::SeqCst);
        Some(DynamicImage::new_rgb8(16, 16))
    }
}
