//! Auth middleware configuration.
//!
//! This module provides [`AuthConfig`], the validated configuration shared
//! by the signer and the watcher, plus the duration-string parsers used by
//! the external env/CLI wiring.
//!
//! # The Retention Inequality
//!
//! Tokens must remain verifiable for their whole lifetime, on every
//! replica, across rotations. That holds when the store always retains the
//! signing key of any unexpired token:
//!
//! ```text
//! number_of_keys × rotation_interval ≥ jwt_expiration + 30 min
//! ```
//!
//! The 30-minute headroom absorbs scheduler jitter and watch propagation.
//! [`AuthConfig::validate`] enforces this at process start; a violation is
//! fatal.

use std::time::Duration;

use thiserror::Error;

/// Default lifetime of issued tokens.
pub const DEFAULT_JWT_EXPIRATION: Duration = Duration::from_secs(60 * 60);

/// Default cool-off before a freshly observed key may sign.
pub const DEFAULT_NEW_KEY_USE_DELAY: Duration = Duration::from_secs(30);

/// Default rotator cadence.
pub const DEFAULT_ROTATION_INTERVAL: Duration = Duration::from_secs(30 * 60);

/// Default maximum number of retained keys.
pub const DEFAULT_NUMBER_OF_KEYS: u32 = 6;

/// Headroom added to the token lifetime when checking the retention window.
const RETENTION_HEADROOM: Duration = Duration::from_secs(30 * 60);

/// Error returned when a configuration value fails validation.
///
/// Each variant names the field that was invalid and the constraint it
/// violated, providing actionable feedback for operators.
///
/// # Non-exhaustive
///
/// New variants may be added in future minor releases.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// A duration string failed to parse.
    #[error("invalid {field}: {value:?} ({reason})")]
    InvalidDuration {
        /// The name of the configuration field.
        field: &'static str,
        /// The raw value provided.
        value: String,
        /// Why it failed to parse.
        reason: String,
    },

    /// A field that must be positive was set to zero.
    #[error("invalid {field}: must be positive (got {value})")]
    MustBePositive {
        /// The name of the configuration field.
        field: &'static str,
        /// A human-readable representation of the invalid value.
        value: String,
    },

    /// A minimum-bound constraint was violated.
    #[error("invalid {field}: must be >= {min} (got {value})")]
    BelowMinimum {
        /// The name of the configuration field.
        field: &'static str,
        /// The minimum allowed value (human-readable).
        min: String,
        /// The actual value provided (human-readable).
        value: String,
    },

    /// A relational constraint between two fields was violated.
    #[error("invalid config: {field_a} ({value_a}) must be less than {field_b} ({value_b})")]
    InvalidRelation {
        /// The field that must be the smaller value.
        field_a: &'static str,
        /// The actual value of `field_a` (human-readable).
        value_a: String,
        /// The field that must be the larger value.
        field_b: &'static str,
        /// The actual value of `field_b` (human-readable).
        value_b: String,
    },

    /// The retained keys do not cover the token lifetime.
    #[error(
        "invalid config: retention window {window} (number_of_keys × rotation_interval) \
         must be at least {required} (jwt_expiration + 30m)"
    )]
    RetentionWindowTooShort {
        /// The configured retention window (human-readable).
        window: String,
        /// The minimum required window (human-readable).
        required: String,
    },
}

/// Parses a duration string with an `s`, `m`, or `h` suffix.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidDuration`] on an empty value, unknown
/// suffix, or non-numeric amount.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use keygate_authn::config::parse_duration;
///
/// assert_eq!(parse_duration("jwt_expiration", "90s").unwrap(), Duration::from_secs(90));
/// assert_eq!(parse_duration("jwt_expiration", "2h").unwrap(), Duration::from_secs(7200));
/// assert!(parse_duration("jwt_expiration", "90x").is_err());
/// ```
pub fn parse_duration(field: &'static str, value: &str) -> Result<Duration, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidDuration {
        field,
        value: value.to_owned(),
        reason,
    };

    let Some(unit) = value.chars().last() else {
        return Err(invalid("empty value".to_owned()));
    };

    let seconds_per_unit = match unit {
        's' => 1,
        'm' => 60,
        'h' => 60 * 60,
        _ => return Err(invalid(format!("unknown suffix {unit:?}, expected s, m, or h"))),
    };

    let amount: u64 = value[..value.len() - 1]
        .parse()
        .map_err(|e| invalid(format!("invalid amount: {e}")))?;

    Ok(Duration::from_secs(amount * seconds_per_unit))
}

/// Parses the rotation interval, constrained to the scheduler's cron field
/// limits: minutes in `1..=59` or hours in `1..=23`.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidDuration`] on an out-of-range amount, a
/// seconds suffix, or anything [`parse_duration`] rejects.
pub fn parse_rotation_interval(value: &str) -> Result<Duration, ConfigError> {
    const FIELD: &str = "rotation_interval";

    let invalid = |reason: String| ConfigError::InvalidDuration {
        field: FIELD,
        value: value.to_owned(),
        reason,
    };

    let duration = parse_duration(FIELD, value)?;
    let limit = match value.chars().last() {
        Some('m') => Duration::from_secs(59 * 60),
        Some('h') => Duration::from_secs(23 * 60 * 60),
        _ => return Err(invalid("expected an m or h suffix".to_owned())),
    };

    if duration.is_zero() {
        return Err(invalid("must be positive".to_owned()));
    }
    if duration > limit {
        return Err(invalid(format!("exceeds the schedulable maximum of {limit:?}")));
    }

    Ok(duration)
}

/// Validated configuration for the auth middleware.
///
/// # Example
///
/// ```
/// use keygate_authn::AuthConfig;
///
/// let config = AuthConfig::builder()
///     .issuer("https://auth.example.com")
///     .audience("example-platform")
///     .secret_name("auth-keys")
///     .namespace("platform")
///     .build();
///
/// config.validate().expect("defaults satisfy the retention inequality");
/// ```
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Value used for and required in `iss`.
    pub(crate) issuer: String,

    /// Value used for and required in `aud`.
    pub(crate) audience: String,

    /// Lifetime of issued tokens.
    pub(crate) jwt_expiration: Duration,

    /// Cool-off before a freshly observed key may sign.
    pub(crate) jwt_new_key_use_delay: Duration,

    /// Cadence at which the external scheduler runs the rotator.
    pub(crate) rotation_interval: Duration,

    /// Maximum number of simultaneously retained keys.
    pub(crate) number_of_keys: u32,

    /// Name of the key-store record.
    pub(crate) secret_name: String,

    /// Namespace of the key-store record.
    pub(crate) namespace: String,
}

#[bon::bon]
impl AuthConfig {
    /// Creates a new configuration.
    ///
    /// Call [`validate`](Self::validate) before use; construction itself
    /// does not check cross-field constraints.
    #[builder]
    pub fn new(
        #[builder(into)] issuer: String,
        #[builder(into)] audience: String,
        #[builder(default = DEFAULT_JWT_EXPIRATION)] jwt_expiration: Duration,
        #[builder(default = DEFAULT_NEW_KEY_USE_DELAY)] jwt_new_key_use_delay: Duration,
        #[builder(default = DEFAULT_ROTATION_INTERVAL)] rotation_interval: Duration,
        #[builder(default = DEFAULT_NUMBER_OF_KEYS)] number_of_keys: u32,
        #[builder(into)] secret_name: String,
        #[builder(into)] namespace: String,
    ) -> Self {
        Self {
            issuer,
            audience,
            jwt_expiration,
            jwt_new_key_use_delay,
            rotation_interval,
            number_of_keys,
            secret_name,
            namespace,
        }
    }

    /// Returns the token issuer.
    #[must_use]
    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// Returns the token audience.
    #[must_use]
    pub fn audience(&self) -> &str {
        &self.audience
    }

    /// Returns the token lifetime.
    #[must_use]
    pub fn jwt_expiration(&self) -> Duration {
        self.jwt_expiration
    }

    /// Returns the new-key cool-off.
    #[must_use]
    pub fn jwt_new_key_use_delay(&self) -> Duration {
        self.jwt_new_key_use_delay
    }

    /// Returns the rotator cadence.
    #[must_use]
    pub fn rotation_interval(&self) -> Duration {
        self.rotation_interval
    }

    /// Returns the maximum number of retained keys.
    #[must_use]
    pub fn number_of_keys(&self) -> u32 {
        self.number_of_keys
    }

    /// Returns the key-store record name.
    #[must_use]
    pub fn secret_name(&self) -> &str {
        &self.secret_name
    }

    /// Returns the key-store record namespace.
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Validates cross-field constraints.
    ///
    /// Run at process start; any violation is fatal.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::BelowMinimum`] — fewer than one retained key
    /// - [`ConfigError::MustBePositive`] — zero expiration or rotation interval
    /// - [`ConfigError::InvalidRelation`] — cool-off not below expiration and rotation interval
    /// - [`ConfigError::RetentionWindowTooShort`] — retained keys do not cover the token lifetime
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.number_of_keys < 1 {
            return Err(ConfigError::BelowMinimum {
                field: "number_of_keys",
                min: "1".to_owned(),
                value: self.number_of_keys.to_string(),
            });
        }

        if self.jwt_expiration.is_zero() {
            return Err(ConfigError::MustBePositive {
                field: "jwt_expiration",
                value: format!("{:?}", self.jwt_expiration),
            });
        }

        if self.rotation_interval.is_zero() {
            return Err(ConfigError::MustBePositive {
                field: "rotation_interval",
                value: format!("{:?}", self.rotation_interval),
            });
        }

        if self.jwt_new_key_use_delay >= self.jwt_expiration {
            return Err(ConfigError::InvalidRelation {
                field_a: "jwt_new_key_use_delay",
                value_a: format!("{:?}", self.jwt_new_key_use_delay),
                field_b: "jwt_expiration",
                value_b: format!("{:?}", self.jwt_expiration),
            });
        }

        if self.jwt_new_key_use_delay >= self.rotation_interval {
            return Err(ConfigError::InvalidRelation {
                field_a: "jwt_new_key_use_delay",
                value_a: format!("{:?}", self.jwt_new_key_use_delay),
                field_b: "rotation_interval",
                value_b: format!("{:?}", self.rotation_interval),
            });
        }

        let window = self.rotation_interval * self.number_of_keys;
        let required = self.jwt_expiration + RETENTION_HEADROOM;
        if window < required {
            return Err(ConfigError::RetentionWindowTooShort {
                window: format!("{window:?}"),
                required: format!("{required:?}"),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    fn base_config() -> AuthConfig {
        AuthConfig::builder()
            .issuer("https://auth.example.com")
            .audience("example-platform")
            .secret_name("auth-keys")
            .namespace("platform")
            .build()
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = base_config();

        assert!(config.validate().is_ok());
        assert_eq!(config.jwt_expiration(), DEFAULT_JWT_EXPIRATION);
        assert_eq!(config.jwt_new_key_use_delay(), DEFAULT_NEW_KEY_USE_DELAY);
        assert_eq!(config.rotation_interval(), DEFAULT_ROTATION_INTERVAL);
        assert_eq!(config.number_of_keys(), DEFAULT_NUMBER_OF_KEYS);
    }

    #[test]
    fn test_parse_duration_suffixes() {
        assert_eq!(parse_duration("f", "45s").unwrap(), Duration::from_secs(45));
        assert_eq!(parse_duration("f", "15m").unwrap(), Duration::from_secs(900));
        assert_eq!(parse_duration("f", "2h").unwrap(), Duration::from_secs(7200));
    }

    #[test]
    fn test_parse_duration_rejects_bad_input() {
        assert!(matches!(parse_duration("f", ""), Err(ConfigError::InvalidDuration { .. })));
        assert!(matches!(parse_duration("f", "90"), Err(ConfigError::InvalidDuration { .. })));
        assert!(matches!(parse_duration("f", "90x"), Err(ConfigError::InvalidDuration { .. })));
        assert!(matches!(parse_duration("f", "s"), Err(ConfigError::InvalidDuration { .. })));
        assert!(matches!(parse_duration("f", "-5m"), Err(ConfigError::InvalidDuration { .. })));
    }

    #[test]
    fn test_parse_rotation_interval_bounds() {
        assert_eq!(parse_rotation_interval("59m").unwrap(), Duration::from_secs(59 * 60));
        assert_eq!(parse_rotation_interval("23h").unwrap(), Duration::from_secs(23 * 3600));

        assert!(matches!(
            parse_rotation_interval("60m"),
            Err(ConfigError::InvalidDuration { .. })
        ));
        assert!(matches!(
            parse_rotation_interval("24h"),
            Err(ConfigError::InvalidDuration { .. })
        ));
        assert!(matches!(parse_rotation_interval("0m"), Err(ConfigError::InvalidDuration { .. })));
        // Seconds are below the scheduler's granularity.
        assert!(matches!(
            parse_rotation_interval("90s"),
            Err(ConfigError::InvalidDuration { .. })
        ));
    }

    #[test]
    fn test_zero_keys_rejected() {
        let mut config = base_config();
        config.number_of_keys = 0;

        assert!(matches!(config.validate(), Err(ConfigError::BelowMinimum { .. })));
    }

    #[test]
    fn test_zero_expiration_rejected() {
        let mut config = base_config();
        config.jwt_expiration = Duration::ZERO;

        assert!(matches!(config.validate(), Err(ConfigError::MustBePositive { .. })));
    }

    #[test]
    fn test_cool_off_must_be_below_expiration() {
        let mut config = base_config();
        config.jwt_expiration = Duration::from_secs(60);
        config.jwt_new_key_use_delay = Duration::from_secs(60);
        // Keep the other relations satisfiable.
        config.rotation_interval = Duration::from_secs(3600);

        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidRelation { field_b: "jwt_expiration", .. })
        ));
    }

    #[test]
    fn test_cool_off_must_be_below_rotation_interval() {
        let mut config = base_config();
        config.rotation_interval = Duration::from_secs(30);
        config.jwt_new_key_use_delay = Duration::from_secs(30);

        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidRelation { field_b: "rotation_interval", .. })
        ));
    }

    #[test]
    fn test_retention_window_too_short_rejected() {
        // 2 keys × 30m = 1h, but 1h expiration + 30m headroom needs 1.5h.
        let mut config = base_config();
        config.number_of_keys = 2;

        assert!(matches!(config.validate(), Err(ConfigError::RetentionWindowTooShort { .. })));
    }

    #[test]
    fn test_retention_window_boundary_accepted() {
        // 3 keys × 30m = 1.5h exactly covers 1h + 30m.
        let mut config = base_config();
        config.number_of_keys = 3;

        assert!(config.validate().is_ok());
    }
}
