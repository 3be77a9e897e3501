use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Default filter directive for a verbosity choice
pub fn default_directive(verbose: bool, quiet: bool) -> &'static str {
    if verbose {
        "rates_conformance=debug,info"
    } else if quiet {
        "rates_conformance=warn"
    } else {
        "rates_conformance=info"
    }
}

/// Install the global subscriber; `RUST_LOG` overrides the verbosity flags
pub fn init_logger(verbose: bool, quiet: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose, quiet)));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .compact(),
        )
        .try_init();
}
