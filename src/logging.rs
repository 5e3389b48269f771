use tracing_subscriber::EnvFilter;

/// Install a stderr fmt subscriber for applications embedding the engine.
///
/// `RUST_LOG` wins when set; otherwise `rastercube` logs at `debug` when
/// `verbose` and `info` when not. Calling this more than once is harmless.
pub fn init(verbose: bool) {
    let default = if verbose {
        "rastercube=debug"
    } else {
        "rastercube=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
