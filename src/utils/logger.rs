use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Console logging for the verification binaries. `RUST_LOG` wins when set;
/// otherwise the crate logs at info (debug with `--verbose`) and
/// dependencies stay at warn so the run summary is readable.
pub fn init_cli_logger(verbose: bool) {
    let default_directives = if verbose {
        "slide_verify=debug,info"
    } else {
        "slide_verify=info,warn"
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives));

    let format_layer = tracing_subscriber::fmt::layer()
        .with_target(verbose)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact();

    tracing_subscriber::registry()
        .with(filter)
        .with(format_layer)
        .init();
}
