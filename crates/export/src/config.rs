//! Export configuration.

use std::path::PathBuf;
use std::time::Duration;

use image::Rgb;
use tracing::warn;

use quoteprint_invoicing::PageGeometry;
use quoteprint_render::DEFAULT_JPEG_QUALITY;

pub const ENV_CAPTURE_SCALE: &str = "QUOTEPRINT_CAPTURE_SCALE";
pub const ENV_CAPTURE_TIMEOUT_MS: &str = "QUOTEPRINT_CAPTURE_TIMEOUT_MS";
pub const ENV_JPEG_QUALITY: &str = "QUOTEPRINT_JPEG_QUALITY";
pub const ENV_OUTPUT_DIR: &str = "QUOTEPRINT_OUTPUT_DIR";

/// Largest accepted capture scale.
pub const MAX_CAPTURE_SCALE: u32 = 8;

#[derive(Debug, Clone, PartialEq)]
pub struct ExportConfig {
    /// Uniform capture multiplier (1..=8)
    pub capture_scale: u32,
    /// Upper bound on one rasterization
    pub capture_timeout: Duration,
    /// JPEG quality of the embedded page images (1..=100)
    pub jpeg_quality: u8,
    /// Fill for the staged node and the unused band of the last page
    pub background: Rgb<u8>,
    /// Directory the file sink writes into
    pub output_dir: PathBuf,
    pub geometry: PageGeometry,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            capture_scale: 3,
            capture_timeout: Duration::from_secs(30),
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            background: Rgb([0xff, 0xff, 0xff]),
            output_dir: PathBuf::from("."),
            geometry: PageGeometry::A4,
        }
    }
}

impl ExportConfig {
    /// Defaults overridden by the `QUOTEPRINT_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an explicit variable source.
    ///
    /// Invalid values are logged and the default is kept.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(raw) = lookup(ENV_CAPTURE_SCALE) {
            match raw.trim().parse::<u32>() {
                Ok(scale) if (1..=MAX_CAPTURE_SCALE).contains(&scale) => {
                    config.capture_scale = scale
                }
                _ => warn!(var = ENV_CAPTURE_SCALE, value = %raw, "ignoring invalid capture scale"),
            }
        }

        if let Some(raw) = lookup(ENV_CAPTURE_TIMEOUT_MS) {
            match raw.trim().parse::<u64>() {
                Ok(ms) if ms > 0 => config.capture_timeout = Duration::from_millis(ms),
                _ => warn!(var = ENV_CAPTURE_TIMEOUT_MS, value = %raw, "ignoring invalid capture timeout"),
            }
        }

        if let Some(raw) = lookup(ENV_JPEG_QUALITY) {
            match raw.trim().parse::<u8>() {
                Ok(q) if (1..=100).contains(&q) => config.jpeg_quality = q,
                _ => warn!(var = ENV_JPEG_QUALITY, value = %raw, "ignoring invalid jpeg quality"),
            }
        }

        if let Some(raw) = lookup(ENV_OUTPUT_DIR) {
            if raw.trim().is_empty() {
                warn!(var = ENV_OUTPUT_DIR, "ignoring empty output directory");
            } else {
                config.output_dir = PathBuf::from(raw);
            }
        }

        config
    }

    pub fn with_capture_scale(mut self, scale: u32) -> Self {
        self.capture_scale = scale.clamp(1, MAX_CAPTURE_SCALE);
        self
    }

    pub fn with_capture_timeout(mut self, timeout: Duration) -> Self {
        self.capture_timeout = timeout;
        self
    }

    pub fn with_jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = quality.clamp(1, 100);
        self
    }

    pub fn with_background(mut self, background: Rgb<u8>) -> Self {
        self.background = background;
        self
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults() {
        let config = ExportConfig::default();
        assert_eq!(config.capture_scale, 3);
        assert_eq!(config.capture_timeout, Duration::from_secs(30));
        assert_eq!(config.jpeg_quality, 92);
        assert_eq!(config.output_dir, PathBuf::from("."));
        assert_eq!(config.geometry, PageGeometry::A4);
    }

    #[test]
    fn environment_overrides_defaults() {
        let config = ExportConfig::from_lookup(lookup(&[
            (ENV_CAPTURE_SCALE, "2"),
            (ENV_CAPTURE_TIMEOUT_MS, "1500"),
            (ENV_JPEG_QUALITY, " 75 "),
            (ENV_OUTPUT_DIR, "/tmp/out"),
        ]));
        assert_eq!(config.capture_scale, 2);
        assert_eq!(config.capture_timeout, Duration::from_millis(1500));
        assert_eq!(config.jpeg_quality, 75);
        assert_eq!(config.output_dir, PathBuf::from("/tmp/out"));
    }

    #[test]
    fn invalid_environment_values_keep_defaults() {
        let config = ExportConfig::from_lookup(lookup(&[
            (ENV_CAPTURE_SCALE, "0"),
            (ENV_CAPTURE_TIMEOUT_MS, "soon"),
            (ENV_JPEG_QUALITY, "101"),
            (ENV_OUTPUT_DIR, "  "),
        ]));
        assert_eq!(config, ExportConfig::default());
    }

    #[test]
    fn builders_clamp() {
        let config = ExportConfig::default()
            .with_capture_scale(40)
            .with_jpeg_quality(0);
        assert_eq!(config.capture_scale, MAX_CAPTURE_SCALE);
        assert_eq!(config.jpeg_quality, 1);
    }
}
