use std::env;
use tracing::warn;

pub const DEFAULT_BOARD_SIZE: usize = 8;

/// Runtime configuration read from the environment once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    /// Persistence mirror; when unset the server runs on the in-memory store.
    pub redis_url: Option<String>,
    pub board_size: usize,
}

impl Config {
    pub fn from_env() -> Self {
        Config {
            port: parse_env("PORT", 3000),
            redis_url: env::var("REDIS_URL").ok().filter(|url| !url.is_empty()),
            board_size: parse_env("BOARD_SIZE", DEFAULT_BOARD_SIZE),
        }
    }
}

fn parse_env<T: std::str::FromStr + Copy + std::fmt::Display>(name: &str, default: T) -> T {
    match env::var(name) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            warn!("Invalid {} value {:?}; using {}", name, raw, default);
            default
        }),
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_env_falls_back_on_missing_or_invalid() {
        assert_eq!(parse_env("SOS_SERVER_UNSET_VAR", 42usize), 42);
        env::set_var("SOS_SERVER_BAD_VAR", "not-a-number");
        assert_eq!(parse_env("SOS_SERVER_BAD_VAR", 7u16), 7);
    }
}
