//! Error types.
//!
//! Only configuration can fail. Effect application, ticking and aggregation
//! have no error path: authority rejection is a silent no-op, resistance is a
//! normal outcome, and out-of-range inputs are clamped.

/// Errors raised while loading or validating a [`StatusConfig`](crate::config::StatusConfig).
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration document is not valid JSON for this schema.
    #[error("failed to parse status config: {0}")]
    Parse(#[from] serde_json::Error),

    /// A field that must be strictly positive was zero, negative or NaN.
    #[error("`{field}` must be positive, got {value}")]
    NotPositive {
        /// Name of the offending field.
        field: &'static str,
        /// The rejected value.
        value: f32,
    },

    /// A field that must be non-negative was negative or NaN.
    #[error("`{field}` must be non-negative, got {value}")]
    Negative {
        /// Name of the offending field.
        field: &'static str,
        /// The rejected value.
        value: f32,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_field() {
        let err = ConfigError::NotPositive {
            field: "dt",
            value: 0.0,
        };
        assert_eq!(err.to_string(), "`dt` must be positive, got 0");

        let err = ConfigError::Negative {
            field: "freeze_speed_multiplier",
            value: -1.0,
        };
        assert!(err.to_string().contains("freeze_speed_multiplier"));
    }

    #[test]
    fn parse_errors_convert() {
        let json_err = serde_json::from_str::<u32>("not json").unwrap_err();
        let err: ConfigError = json_err.into();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
