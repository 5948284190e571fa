mod app;
mod bindings;
mod cli;
mod selftest;

use std::process::ExitCode;

use tether_bridge::BridgeOptions;
use tether_config::TetherConfig;
use tracing_subscriber::EnvFilter;
use winit::event_loop::EventLoop;

const DEFAULT_DIRECTIVE: &str = "tether=info";

/// Turn a bare level into a directive for this workspace's crates; pass
/// full directives through.
fn log_directive(level: &str) -> String {
    if level.contains('=') || level.contains(',') {
        level.to_string()
    } else {
        format!("tether={level}")
    }
}

/// `--log-level` wins, then `RUST_LOG`, then the configured level.
fn env_filter(cli_level: Option<&str>, config_level: Option<&str>) -> EnvFilter {
    if let Some(filter) = cli_level.and_then(|l| EnvFilter::try_new(log_directive(l)).ok()) {
        return filter;
    }
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }
    config_level
        .and_then(|l| EnvFilter::try_new(log_directive(l)).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_DIRECTIVE))
}

pub(crate) fn bridge_options(config: &TetherConfig) -> BridgeOptions {
    BridgeOptions {
        unknown_binding: config.bridge.unknown_binding,
        log_payloads: config.bridge.log_payloads,
    }
}

fn main() -> ExitCode {
    let args = cli::parse();

    // Config is read before logging so its level can seed the filter.
    let loaded = tether_config::load_config(args.config.as_deref());

    let config_level = loaded.as_ref().ok().map(|c| c.logging.level.as_str());
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(args.log_level.as_deref(), config_level))
        .init();

    tracing::info!("Tether v{} starting...", env!("CARGO_PKG_VERSION"));

    let mut config = match loaded {
        Ok(config) => config,
        Err(e) if args.config.is_some() => {
            tracing::error!("Failed to load config: {e}");
            return ExitCode::from(2);
        }
        Err(e) => {
            tracing::warn!("Config load failed, using defaults: {e}");
            TetherConfig::default()
        }
    };
    args.apply(&mut config);
    if let Err(e) = tether_config::validation::validate(&config) {
        tracing::error!("Invalid settings: {e}");
        return ExitCode::from(2);
    }
    tracing::debug!(config = %tether_config::config_to_json(&config), "effective config");

    if args.self_test {
        return match selftest::run(&config) {
            Ok(()) => {
                tracing::info!("Self-test passed");
                ExitCode::SUCCESS
            }
            Err(e) => {
                tracing::error!("Self-test failed: {e}");
                ExitCode::FAILURE
            }
        };
    }

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            tracing::error!("Failed to start async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    let event_loop = match EventLoop::<app::UserEvent>::with_user_event().build() {
        Ok(event_loop) => event_loop,
        Err(e) => {
            tracing::error!("Failed to create event loop: {e}");
            return ExitCode::FAILURE;
        }
    };

    let mut app = app::TetherApp::new(config, &event_loop, runtime.handle());

    tracing::info!("Entering event loop");
    if let Err(e) = event_loop.run_app(&mut app) {
        tracing::error!("Event loop error: {e}");
        return ExitCode::FAILURE;
    }
    tracing::info!("Shutdown complete");
    ExitCode::SUCCESS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_level_is_scoped_to_workspace() {
        assert_eq!(log_directive("debug"), "tether=debug");
    }

    #[test]
    fn full_directive_passes_through() {
        assert_eq!(log_directive("tether_bridge=trace"), "tether_bridge=trace");
        assert_eq!(log_directive("warn,tether=debug"), "warn,tether=debug");
    }

    #[test]
    fn directives_build_filters() {
        assert!(EnvFilter::try_new(DEFAULT_DIRECTIVE).is_ok());
        assert!(EnvFilter::try_new(log_directive("trace")).is_ok());
    }

    #[test]
    fn bridge_options_follow_config() {
        let mut config = TetherConfig::default();
        config.bridge.unknown_binding = tether_common::UnknownBindingPolicy::Reject;
        config.bridge.log_payloads = true;
        let options = bridge_options(&config);
        assert_eq!(options.unknown_binding, tether_common::UnknownBindingPolicy::Reject);
        assert!(options.log_payloads);
    }
}
