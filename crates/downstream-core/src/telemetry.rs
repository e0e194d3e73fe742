//! Centralised tracing initialisation for the downstream binary.
//!
//! Call [`init_tracing`] once at program start to configure the global
//! subscriber with an `EnvFilter` and optional JSON formatting.

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Targets logged at the plugin level; everything else stays at `warn`.
const PLUGIN_TARGETS: [&str; 2] = ["downstream_core", "vela_downstream"];

/// Filter directive used when `RUST_LOG` is unset, e.g.
/// `warn,downstream_core=debug,vela_downstream=debug`.
pub fn default_directive(level: Level) -> String {
    // Dependencies (reqwest, hyper) never log louder than `warn`.
    let base = level.min(Level::WARN);
    let mut directive = base.as_str().to_ascii_lowercase();
    for target in PLUGIN_TARGETS {
        directive.push_str(&format!(",{target}={}", level.as_str().to_ascii_lowercase()));
    }
    directive
}

/// Initialise the global tracing subscriber.
///
/// * `json`: `true` emits newline-delimited JSON log lines.
/// * `level`: plugin verbosity when `RUST_LOG` is not set; see
///   [`parse_log_level`] for the accepted spellings.
///
/// Safe to call multiple times; only the first call takes effect.
pub fn init_tracing(json: bool, level: Level) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(level)));
    let fmt_layer = fmt::layer().with_target(false);

    let registry = tracing_subscriber::registry().with(env_filter);
    let installed = if json {
        registry.with(fmt_layer.json().flatten_event(true)).try_init()
    } else {
        registry.with(fmt_layer).try_init()
    };
    if installed.is_ok() {
        tracing::debug!(%level, "tracing initialised");
    }
}

/// Map a plugin log level (`t`, `trace`, `Debug`, `WARN`, ...) to a
/// [`Level`]. `fatal` and `panic` map to `ERROR`; anything unknown is `INFO`.
pub fn parse_log_level(raw: &str) -> Level {
    match raw.trim().to_ascii_lowercase().as_str() {
        "t" | "trace" => Level::TRACE,
        "d" | "debug" => Level::DEBUG,
        "w" | "warn" => Level::WARN,
        "e" | "error" | "f" | "fatal" | "p" | "panic" => Level::ERROR,
        _ => Level::INFO,
    }
}
