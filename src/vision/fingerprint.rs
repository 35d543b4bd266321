use image::DynamicImage;
use img_hash::{HashAlg, HasherConfig};

/// Perceptual (gradient, 8x8) hash of a frame, hex encoded. Visually similar
/// frames produce fingerprints with a small Hamming distance.
pub fn frame_fingerprint(frame: &DynamicImage) -> String {
    let hasher = HasherConfig::new().hash_alg(HashAlg::Gradient).hash_size(8, 8).to_hasher();
    let hash = hasher.hash_image(frame);
    hex::encode(hash.as_bytes())
}
