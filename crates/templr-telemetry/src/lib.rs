//! Logging bootstrap for Templr clients.
//!
//! [`init_tracing`] installs the global subscriber: a `fmt` layer filtered by
//! `RUST_LOG`, plus an optional [`NoticeLayer`] that hands warnings and errors
//! to the UI.

pub mod notice_layer;

pub use notice_layer::{ClientNotice, NoticeLayer};

use tokio::sync::mpsc;
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Installs the global tracing subscriber.
///
/// `default_directive` applies when `RUST_LOG` is unset or invalid, e.g.
/// `"info,templr_application=debug"`. Fails if a global subscriber is
/// already installed.
pub fn init_tracing(
    default_directive: &str,
    notices: Option<mpsc::UnboundedSender<ClientNotice>>,
) -> Result<(), TryInitError> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
        .with(notices.map(NoticeLayer::new))
        .try_init()
}
