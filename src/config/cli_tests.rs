//! Tests for CLI argument parsing.

use clap::Parser;
use serde_json::json;

use super::cli::{Cli, Command, TriggerArg};
use crate::history::EventStatus;
use crate::trigger::BusinessEvent;
use crate::webhook::WebhookKind;

mod parsing {
    use super::*;

    #[test]
    fn parse_minimal_send() {
        let cli = Cli::parse_from_iter([
            "hookledger",
            "send",
            "--url",
            "https://example.com/webhook",
        ]);

        match cli.command {
            Command::Send {
                url,
                kind,
                event_type,
                payload,
                payload_file,
                blind,
            } => {
                assert_eq!(url, "https://example.com/webhook");
                assert_eq!(kind, WebhookKind::Custom);
                assert_eq!(event_type, "webhook_call");
                assert!(payload.is_none());
                assert!(payload_file.is_none());
                assert!(!blind);
            }
            other => panic!("Expected Send command, got {other:?}"),
        }
    }

    #[test]
    fn parse_full_send() {
        let cli = Cli::parse_from_iter([
            "hookledger",
            "send",
            "--url",
            "https://hooks.slack.com/services/T/B/X",
            "--kind",
            "Slack",
            "--event-type",
            "deploy",
            "--payload",
            r#"{"text":"hi"}"#,
            "--blind",
        ]);

        let Command::Send {
            kind,
            event_type,
            payload,
            blind,
            ..
        } = cli.command
        else {
            panic!("Expected Send command");
        };
        assert_eq!(kind, WebhookKind::Slack);
        assert_eq!(event_type, "deploy");
        assert_eq!(
            serde_json::from_str::<serde_json::Value>(&payload.unwrap()).unwrap(),
            json!({"text": "hi"})
        );
        assert!(blind);
    }

    #[test]
    fn parse_global_options_after_subcommand() {
        let cli = Cli::parse_from_iter([
            "hookledger",
            "clear",
            "--config",
            "/path/to/config.toml",
            "--history-dir",
            "/tmp/history",
            "--retry-max",
            "2",
            "--retry-delay",
            "250",
            "--no-jitter",
            "--verbose",
        ]);

        assert!(matches!(cli.command, Command::Clear));
        assert_eq!(
            cli.config.as_ref().unwrap().to_str(),
            Some("/path/to/config.toml")
        );
        assert_eq!(cli.history_dir.as_ref().unwrap().to_str(), Some("/tmp/history"));
        assert_eq!(cli.retry_max, Some(2));
        assert_eq!(cli.retry_delay, Some(250));
        assert!(cli.no_jitter);
        assert!(cli.verbose);
        assert!(!cli.ephemeral);
    }

    #[test]
    fn parse_trigger() {
        let cli = Cli::parse_from_iter([
            "hookledger",
            "trigger",
            "lead-converted",
            "--data",
            r#"{"lead_id":"l1"}"#,
        ]);

        let Command::Trigger { event, data } = cli.command else {
            panic!("Expected Trigger command");
        };
        assert_eq!(event, TriggerArg::LeadConverted);
        assert_eq!(BusinessEvent::from(event), BusinessEvent::LeadConverted);
        assert_eq!(data, r#"{"lead_id":"l1"}"#);
    }

    #[test]
    fn trigger_arg_maps_every_event() {
        assert_eq!(
            BusinessEvent::from(TriggerArg::StrategyApproved),
            BusinessEvent::StrategyApproved
        );
        assert_eq!(
            BusinessEvent::from(TriggerArg::CampaignCreated),
            BusinessEvent::CampaignCreated
        );
    }

    #[test]
    fn parse_history_filters() {
        let cli = Cli::parse_from_iter([
            "hookledger",
            "history",
            "--kind",
            "zapier",
            "--kind",
            "stripe",
            "--status",
            "error",
            "--search",
            "lead",
            "--since",
            "2024-05-01",
            "--until",
            "2024-05-02T10:00:00+02:00",
            "--json",
        ]);

        let Command::History {
            kinds,
            status,
            search,
            since,
            until,
            json,
        } = cli.command
        else {
            panic!("Expected History command");
        };
        assert_eq!(kinds, [WebhookKind::Zapier, WebhookKind::Stripe]);
        assert_eq!(status, Some(EventStatus::Failed));
        assert_eq!(search.as_deref(), Some("lead"));
        assert_eq!(since.unwrap().to_rfc3339(), "2024-05-01T00:00:00+00:00");
        assert_eq!(until.unwrap().to_rfc3339(), "2024-05-02T08:00:00+00:00");
        assert!(json);
    }

    #[test]
    fn bare_until_date_covers_whole_day() {
        let cli = Cli::parse_from_iter(["hookledger", "history", "--until", "2024-05-02"]);

        let Command::History { until, .. } = cli.command else {
            panic!("Expected History command");
        };
        assert_eq!(
            until.unwrap().to_rfc3339(),
            "2024-05-02T23:59:59.999+00:00"
        );
    }

    #[test]
    fn parse_init_default_output() {
        let cli = Cli::parse_from_iter(["hookledger", "init"]);

        assert!(cli.is_init());
        match cli.command {
            Command::Init { output } => assert_eq!(output.to_str(), Some("hookledger.toml")),
            other => panic!("Expected Init command, got {other:?}"),
        }
    }

    #[test]
    fn parse_init_custom_output() {
        let cli = Cli::parse_from_iter(["hookledger", "init", "--output", "custom.toml"]);

        match cli.command {
            Command::Init { output } => assert_eq!(output.to_str(), Some("custom.toml")),
            other => panic!("Expected Init command, got {other:?}"),
        }
    }
}

mod rejection {
    use super::*;

    #[test]
    fn unknown_kind_is_rejected() {
        let result = Cli::try_parse_from([
            "hookledger",
            "send",
            "--url",
            "https://example.com",
            "--kind",
            "discord",
        ]);

        assert!(result.is_err());
    }

    #[test]
    fn payload_and_payload_file_conflict() {
        let result = Cli::try_parse_from([
            "hookledger",
            "send",
            "--url",
            "https://example.com",
            "--payload",
            "{}",
            "--payload-file",
            "p.json",
        ]);

        assert!(result.is_err());
    }

    #[test]
    fn malformed_date_is_rejected() {
        let result = Cli::try_parse_from(["hookledger", "history", "--since", "yesterday"]);

        assert!(result.is_err());
    }

    #[test]
    fn subcommand_is_required() {
        assert!(Cli::try_parse_from(["hookledger"]).is_err());
    }
}
