// persona-chat/src/telemetry.rs

use tracing_subscriber::{fmt, EnvFilter};

/// Used when `RUST_LOG` is unset. Keeps the Sheets client's connection
/// chatter out of the request log.
pub const DEFAULT_LOG_FILTER: &str = "info,persona_chat=info,hyper=warn,hyper_util=warn,reqwest=warn";

fn log_filter(rust_log: Option<String>) -> EnvFilter {
    rust_log
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_FILTER))
}

/// Install the global fmt subscriber. Safe to call more than once; later
/// calls are ignored. An unparsable `RUST_LOG` falls back to the default.
pub fn init_tracing() {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(log_filter(std::env::var("RUST_LOG").ok()))
        .with_timer(fmt::time::UtcTime::rfc_3339())
        .with_target(true)
        .with_level(true)
        .compact()
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_quiets_http_client() {
        let filter = log_filter(None).to_string();
        assert!(filter.contains("reqwest=warn"));
        assert!(filter.contains("persona_chat=info"));
    }

    #[test]
    fn test_rust_log_overrides_default() {
        let filter = log_filter(Some("persona_chat=debug".into())).to_string();
        assert_eq!(filter, "persona_chat=debug");
    }

    #[test]
    fn test_bad_rust_log_falls_back() {
        let filter = log_filter(Some("persona_chat=loud".into())).to_string();
        assert!(filter.contains("reqwest=warn"));
    }
}
