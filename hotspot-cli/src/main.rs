//! Entry point for the command-line interface.
#![forbid(unsafe_code)]

use tracing_subscriber::EnvFilter;

#[expect(clippy::print_stderr, reason = "errors are reported on stderr")]
fn main() {
    init_logging();
    if let Err(err) = hotspot_cli::run() {
        eprintln!("hotspots: {}", error_chain(&err));
        std::process::exit(1);
    }
}

/// Log to stderr, filtered by `RUST_LOG` and defaulting to `info`.
///
/// Library crates log through `log`; the subscriber forwards those records.
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let cause_text = cause.to_string();
        if !message.contains(&cause_text) {
            message.push_str(": ");
            message.push_str(&cause_text);
        }
        source = cause.source();
    }
    message
}
