use std::env;

use rocket::data::{Limits, ToByteUnit};

const DEFAULT_MAX_UPLOAD_BYTES: u64 = 5 * 1024 * 1024;
// Room for multipart boundaries and part headers around the file itself.
const FORM_OVERHEAD_BYTES: u64 = 64 * 1024;

fn env_u64(key: &str, default: u64) -> u64 {
    env::var(key)
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .unwrap_or(default)
}

fn env_usize(key: &str, default: usize) -> usize {
    env::var(key)
        .ok()
        .and_then(|value| value.parse::<usize>().ok())
        .unwrap_or(default)
}

/// Settings for CSV hotel imports.
#[derive(Debug, Clone)]
pub struct ImportConfig {
    /// Largest accepted upload, in bytes.
    pub max_upload_bytes: u64,
    /// Threads used to validate rows in parallel.
    pub validation_workers: usize,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            validation_workers: num_cpus::get(),
        }
    }
}

impl ImportConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_upload_bytes: env_u64("HOTELS_IMPORT_MAX_BYTES", defaults.max_upload_bytes).max(1),
            validation_workers: env_usize("HOTELS_IMPORT_WORKERS", defaults.validation_workers)
                .max(1),
        }
    }

    /// Rocket body limits that let a maximum-size upload through the
    /// multipart parser so the route can apply its own size check.
    pub fn limits(&self) -> Limits {
        Limits::default()
            .limit("file", (self.max_upload_bytes + 1).bytes())
            .limit(
                "data-form",
                (self.max_upload_bytes + FORM_OVERHEAD_BYTES).bytes(),
            )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_five_mebibytes() {
        let config = ImportConfig::default();
        assert_eq!(config.max_upload_bytes, 5 * 1024 * 1024);
        assert!(config.validation_workers >= 1);
    }

    #[test]
    fn limits_leave_room_for_the_route_check() {
        let config = ImportConfig {
            max_upload_bytes: 1024,
            validation_workers: 1,
        };
        let limits = config.limits();

        assert_eq!(limits.get("file"), Some(1025.bytes()));
        assert_eq!(limits.get("data-form"), Some((1024 + 64 * 1024).bytes()));
    }
}
