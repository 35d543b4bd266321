//! Sentry camera feed. The capture is held only while the camera is on.

use image::{DynamicImage, ImageBuffer, Rgb};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use super::fingerprint::frame_fingerprint;
use crate::error::CaptureError;

pub trait CaptureDevice: Send {
    fn acquire(&mut self) -> Result<(), CaptureError>;
    fn release(&mut self);
    /// Latest frame, if the device is streaming.
    fn frame(&mut self) -> Option<DynamicImage>;
}

/// Procedural canopy frames standing in for the global shutter camera.
pub struct SyntheticCamera {
    rng: StdRng,
    width: u32,
    height: u32,
    streaming: bool,
}

impl SyntheticCamera {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { rng, width: 64, height: 48, streaming: false }
    }
}

impl CaptureDevice for SyntheticCamera {
    fn acquire(&mut self) -> Result<(), CaptureError> {
        self.streaming = true;
        Ok(())
    }

    fn release(&mut self) {
        self.streaming = false;
    }

    fn frame(&mut self) -> Option<DynamicImage> {
        if !self.streaming {
            return None;
        }
        let rng = &mut self.rng;
        let shade: u8 = rng.gen_range(90..170);
        let buf = ImageBuffer::from_fn(self.width, self.height, |x, y| {
            let leaf = ((x / 8 + y / 6) % 2) as u8 * 30;
            let noise: u8 = rng.gen_range(0..24);
            Rgb([20 + noise, shade.saturating_add(leaf), 30 + noise / 2])
        });
        Some(DynamicImage::ImageRgb8(buf))
    }
}

pub struct CameraFeed {
    device: Box<dyn CaptureDevice>,
    acquired: bool,
}

impl CameraFeed {
    pub fn new(device: Box<dyn CaptureDevice>) -> Self {
        Self { device, acquired: false }
    }

    /// Follows the camera-active flag. On acquisition failure nothing is held.
    pub fn set_active(&mut self, active: bool) -> Result<(), CaptureError> {
        match (active, self.acquired) {
            (true, false) => {
                self.device.acquire()?;
                self.acquired = true;
                info!("Camera capture acquired");
                Ok(())
            }
            (false, true) => {
                self.release();
                Ok(())
            }
            _ => Ok(()),
        }
    }

    pub fn is_acquired(&self) -> bool {
        self.acquired
    }

    pub fn fingerprint(&mut self) -> Option<String> {
        if !self.acquired {
            return None;
        }
        let frame = self.device.frame()?;
        let fingerprint = frame_fingerprint(&frame);
        debug!(%fingerprint, "Sampled camera frame");
        Some(fingerprint)
    }

    pub fn release(&mut self) {
        if self.acquired {
            self.device.release();
            self.acquired = false;
            info!("Camera capture released");
        }
    }
}

impl Drop for CameraFeed {
    fn drop(&mut self) {
        self.release();
    }
}
