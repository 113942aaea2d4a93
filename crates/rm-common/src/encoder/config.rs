#[derive(Debug, Clone)]
pub struct EncoderConfig {
    /// Embedding dimension (D).
    pub dimension: usize,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self { dimension: 64 }
    }
}

impl EncoderConfig {
    pub fn from_env() -> Self {
        Self {
            dimension: std::env::var("RM_ENCODER_DIMENSION")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|d: &usize| *d > 0)
                .unwrap_or(64),
        }
    }
}
