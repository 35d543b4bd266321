pub mod camera;
pub mod fingerprint;
