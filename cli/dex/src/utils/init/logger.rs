use std::sync::OnceLock;

use tracing::{debug, error};
use tracing_subscriber::prelude::*;
use tracing_subscriber::reload::Handle;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Registry};

use crate::commands::Verbosity;
use crate::utils::TERMINAL_STDERR;

struct LockingTerminalStderr;
impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for LockingTerminalStderr {
    type Writer = LockingTerminalStderr;

    fn make_writer(&'a self) -> Self::Writer {
        LockingTerminalStderr
    }
}

impl std::io::Write for LockingTerminalStderr {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        if let Ok(mut guard) = TERMINAL_STDERR.lock() {
            guard.write_all(buf)?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        if let Ok(mut guard) = TERMINAL_STDERR.lock() {
            guard.flush()?
        }
        Ok(())
    }
}

static LOGGER_HANDLE: OnceLock<Handle<EnvFilter, Registry>> = OnceLock::new();

/// Filter directives for a verbosity level, `RUST_LOG` takes precedence.
fn log_filter(verbosity: Verbosity) -> &'static str {
    match verbosity {
        // Show only errors
        Verbosity::Quiet => "off,dex=error,dex_catalog=error,dex_relay=error",
        // Only show warnings, e.g. entries that failed to enrich
        Verbosity::Verbose(0) => "off,dex=warn,dex_catalog=warn,dex_relay=info",
        // Show our own info logs
        Verbosity::Verbose(1) => "off,dex=info,dex_catalog=info,dex_relay=info,tower_http=info",
        // Also show debug from our libraries and the relay's request traces
        Verbosity::Verbose(2) => {
            "off,dex=debug,dex_catalog=debug,dex_relay=debug,tower_http=debug"
        },
        Verbosity::Verbose(3) => {
            "off,dex=trace,dex_catalog=trace,dex_relay=trace,tower_http=trace"
        },
        // Also show logs of the HTTP stack
        Verbosity::Verbose(4) => "debug,dex=trace,dex_catalog=trace,dex_relay=trace",
        Verbosity::Verbose(_) => "trace",
    }
}

pub fn init_logger(verbosity: Option<Verbosity>) {
    let log_filter = log_filter(verbosity.unwrap_or_default());

    let filter_handle = LOGGER_HANDLE.get_or_init(|| {
        let (subscriber, reload_handle) = create_registry_and_filter_reload_handle();
        subscriber.init();
        reload_handle
    });

    update_filters(filter_handle, log_filter);
}

fn update_filters(filter_handle: &Handle<EnvFilter, Registry>, log_filter: &str) {
    let result = filter_handle.modify(|layer| {
        match EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(log_filter)) {
            Ok(new_filter) => *layer = new_filter,
            Err(err) => {
                error!("Updating logger filter failed: {}", err);
            },
        };
    });
    if let Err(err) = result {
        error!("Updating logger filter failed: {}", err);
    }
}

fn create_registry_and_filter_reload_handle() -> (
    impl SubscriberInitExt,
    Handle<EnvFilter, Registry>,
) {
    debug!("Initializing logger (how are you seeing this?)");
    // Start permissive; the actual level is applied through the reload handle.
    let (filter, filter_reload_handle) =
        tracing_subscriber::reload::Layer::new(EnvFilter::new("trace"));
    let log_layer = tracing_subscriber::fmt::layer()
        .with_writer(LockingTerminalStderr)
        .event_format(tracing_subscriber::fmt::format())
        .with_filter(filter);
    let registry = tracing_subscriber::registry().with(log_layer);

    (registry, filter_reload_handle)
}
