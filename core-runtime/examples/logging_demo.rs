//! Logging system demonstration
//!
//! Shows the output formats and host sink forwarding.
//!
//! Run with:
//! ```bash
//! # Pretty format (default in debug)
//! cargo run -p core-runtime --example logging_demo
//!
//! # JSON format
//! cargo run -p core-runtime --example logging_demo -- json
//!
//! # Compact format with a custom filter
//! cargo run -p core-runtime --example logging_demo -- compact "logging_demo=trace"
//! ```

use core_runtime::logging::{
    init_logging, summarize_bytes, LogEntry, LogFormat, LogLevel, LoggerSink, LoggingConfig,
};
use std::env;
use std::sync::Arc;
use tracing::{debug, info, info_span, instrument, trace, warn};

/// Sink standing in for a host callback.
struct StdoutSink;

impl LoggerSink for StdoutSink {
    fn log(&self, entry: LogEntry) {
        println!(
            "[host] {:?} {} {} {:?}",
            entry.level, entry.target, entry.message, entry.fields
        );
    }

    fn min_level(&self) -> LogLevel {
        LogLevel::Warn
    }
}

fn main() {
    let args: Vec<String> = env::args().collect();

    let format = match args.get(1).map(String::as_str) {
        Some("json") => LogFormat::Json,
        Some("compact") => LogFormat::Compact,
        Some("pretty") => LogFormat::Pretty,
        _ => LogFormat::default(),
    };

    let mut config = LoggingConfig::default()
        .with_format(format)
        .with_level(LogLevel::Trace)
        .with_logger_sink(Arc::new(StdoutSink));
    if let Some(filter) = args.get(2) {
        config = config.with_filter(filter.clone());
    } else {
        config = config.with_filter("logging_demo=trace");
    }

    if let Err(e) = init_logging(config) {
        eprintln!("Failed to initialize logging: {}", e);
        return;
    }

    info!("Logging demo started");

    let headers: [&[u8]; 3] = [b"\x01vorbis\x00\x00", b"\x03vorbis", b"\x05vorbis"];
    for (index, packet) in headers.iter().enumerate() {
        submit_header(index, packet);
    }

    let span = info_span!("decode", packets = 2);
    let _enter = span.enter();
    debug!(frames = 256, "Decoded packet");
    warn!(len = 0, "Skipped empty packet");

    info!("Logging demo finished");
}

#[instrument(skip(packet), fields(len = packet.len()))]
fn submit_header(index: usize, packet: &[u8]) {
    trace!(bytes = %summarize_bytes(packet, 8), "Header packet");
    info!("Header accepted");
}
