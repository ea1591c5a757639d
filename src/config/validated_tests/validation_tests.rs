//! Tests for value validation.

use super::*;

fn from_toml(content: &str) -> Result<ValidatedConfig, ConfigError> {
    ValidatedConfig::from_raw(&cli(&[]), Some(&toml(content)))
}

mod retry_validation {
    use super::*;

    #[test]
    fn zero_initial_delay_is_rejected() {
        let result = ValidatedConfig::from_raw(&cli(&["--retry-delay", "0"]), None);

        assert!(matches!(result, Err(ConfigError::InvalidRetry(_))));
    }

    #[test]
    fn max_delay_below_initial_is_rejected() {
        let result = from_toml(
            r"
            [retry]
            initial_delay_ms = 5000
            max_delay_ms = 1000
        ",
        );

        let Err(ConfigError::InvalidRetry(reason)) = result else {
            panic!("Expected InvalidRetry, got {result:?}");
        };
        assert!(reason.contains("max_delay_ms"));
    }

    #[test]
    fn non_positive_multiplier_is_rejected() {
        for multiplier in ["0.0", "-1.5", "nan", "inf"] {
            let result = from_toml(&format!("[retry]\nmultiplier = {multiplier}"));

            assert!(
                matches!(result, Err(ConfigError::InvalidRetry(_))),
                "multiplier {multiplier} accepted"
            );
        }
    }

    #[test]
    fn zero_retries_is_allowed() {
        let config = ValidatedConfig::from_raw(&cli(&["--retry-max", "0"]), None).unwrap();

        assert_eq!(config.retry_policy.max_attempts(), 1);
    }
}

mod other_validation {
    use super::*;

    #[test]
    fn zero_timeout_is_rejected() {
        let result = from_toml("[http]\ntimeout_secs = 0");

        assert!(matches!(
            result,
            Err(ConfigError::InvalidDuration {
                field: "http.timeout_secs",
                ..
            })
        ));
    }

    #[test]
    fn zero_max_events_is_rejected() {
        let result = from_toml("[history]\nmax_events = 0");

        assert!(matches!(result, Err(ConfigError::InvalidHistory(_))));
    }

    #[test]
    fn zero_max_age_is_rejected() {
        let result = from_toml("[history]\nmax_age_days = 0");

        assert!(matches!(
            result,
            Err(ConfigError::InvalidDuration {
                field: "history.max_age_days",
                ..
            })
        ));
    }

    #[test]
    fn unparseable_zapier_url_is_rejected() {
        let result = from_toml("[triggers]\nzapier_url = \"not a url\"");

        assert!(matches!(
            result,
            Err(ConfigError::InvalidUrl {
                field: "triggers.zapier_url",
                ..
            })
        ));
    }

    #[test]
    fn non_http_zapier_url_is_rejected() {
        let result = from_toml("[triggers]\nzapier_url = \"ftp://hooks.example.com/x\"");

        assert!(matches!(result, Err(ConfigError::InvalidUrl { .. })));
    }

    #[test]
    fn zapier_url_whitespace_is_removed() {
        let config = from_toml(
            "[triggers]\nzapier_url = \" https://hooks.zapier.com/hooks/ catch/1/a/ \"",
        )
        .unwrap();

        assert_eq!(
            config.zapier_url.as_deref(),
            Some("https://hooks.zapier.com/hooks/catch/1/a/")
        );
    }

    #[test]
    fn blank_zapier_url_means_none() {
        let config = from_toml("[triggers]\nzapier_url = \"   \"").unwrap();

        assert!(config.zapier_url.is_none());
    }
}
