use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber
///
/// `RUST_LOG` takes precedence, otherwise our crates log at info and everything else at warn.
/// In debug mode everything is logged at debug, with targets and thread ids.
pub fn init(debug: bool) {
    let fallback = if debug {
        "debug"
    } else {
        "chat_relay=info,comms=info,warn"
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(debug)
        .with_thread_ids(debug)
        .init();
}
