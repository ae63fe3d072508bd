#![deny(unused_crate_dependencies)]

//! A set of logging macros that print not only timestamp and log level,
//! but also file name, line and column.
//!
//! They behave just like usual tracing::warn, tracing::info, etc.
//! For warn and error macros we are adding file line and column to tracing variables
//!
//! Logs are written to `stderr`: `stdout` of the deployer carries only the
//! deployment result. The format can be `plain` or `json` and is set by the
//! `DEPLOYER_LOG_FORMAT` env variable.
//!
//! Full documentation for the `tracing` crate here <https://docs.rs/tracing/>
//!
//! Integration with sentry for catching errors and react on them immediately
//! <https://docs.sentry.io/platforms/rust/>
//!

use std::{borrow::Cow, str::FromStr};

use sentry::{types::Dsn, ClientInitGuard};
use std::backtrace::Backtrace;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt};

pub use tracing as __tracing;
pub use tracing::{debug, info, trace};

const LOG_FORMAT: &str = "DEPLOYER_LOG_FORMAT";
const SENTRY_URL: &str = "DEPLOYER_SENTRY_URL";
const NETWORK: &str = "DEPLOYER_NETWORK";

/// Logging setup failures.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// `DEPLOYER_LOG_FORMAT` is neither `plain` nor `json`.
    #[error("DEPLOYER_LOG_FORMAT has an unexpected value {0}")]
    UnknownLogFormat(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LogFormat {
    Plain,
    Json,
}

impl FromStr for LogFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "plain" => Ok(Self::Plain),
            "json" => Ok(Self::Json),
            other => Err(Error::UnknownLogFormat(other.to_string())),
        }
    }
}

/// Logs a warning with the file, line and column of the call site attached.
#[macro_export]
macro_rules! warn {
    ($($arg:tt)+) => {
        $crate::__tracing::warn!(
            file = file!(),
            line = line!(),
            column = column!(),
            $($arg)+
        )
    };
}

/// Logs an error with the file, line and column of the call site attached.
#[macro_export]
macro_rules! error {
    ($($arg:tt)+) => {
        $crate::__tracing::error!(
            file = file!(),
            line = line!(),
            column = column!(),
            $($arg)+
        )
    };
}

fn get_sentry_url() -> Option<Dsn> {
    if let Ok(sentry_url) = std::env::var(SENTRY_URL) {
        if let Ok(sentry_url) = Dsn::from_str(sentry_url.as_str()) {
            return Some(sentry_url);
        }
    }
    None
}

/// Initialize logging with tracing and set up log format
///
/// If the sentry URL is provided via an environment variable, this function will also initialize sentry.
/// Returns a sentry client guard. The full description can be found in the official documentation:
/// <https://docs.sentry.io/platforms/rust/#configure>
pub fn init() -> Result<Option<ClientInitGuard>, Error> {
    let log_format = match std::env::var(LOG_FORMAT) {
        Ok(format) => format.parse()?,
        Err(_) => LogFormat::Plain,
    };

    match log_format {
        LogFormat::Plain => {
            tracing_subscriber::registry()
                .with(fmt::Layer::default().with_writer(std::io::stderr))
                .with(tracing_subscriber::EnvFilter::from_default_env())
                .init();
        }
        LogFormat::Json => {
            let timer = tracing_subscriber::fmt::time::UtcTime::rfc_3339();
            // must be set before sentry hook for sentry to function
            install_pretty_panic_hook();

            tracing_subscriber::registry()
                .with(
                    fmt::Layer::default()
                        .with_writer(std::io::stderr)
                        .with_file(true)
                        .with_line_number(true)
                        .with_timer(timer)
                        .json(),
                )
                .with(tracing_subscriber::EnvFilter::from_default_env())
                .init();
        }
    };

    Ok(get_sentry_url().map(|sentry_url| {
        let network = std::env::var(NETWORK).unwrap_or_else(|_| "unknown".to_string());

        let options = sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: Some(Cow::from(network)),
            attach_stacktrace: true,
            ..Default::default()
        };

        sentry::init((sentry_url, options))
    }))
}

/// Format panics like tracing::error
fn install_pretty_panic_hook() {
    // This hook does not use the previous one set because it leads to 2 logs:
    // the first is the default panic log and the second is from this code. To avoid this situation,
    // hook must be installed first
    std::panic::set_hook(Box::new(move |panic_info| {
        let backtrace = Backtrace::capture();
        let timestamp = chrono::Utc::now();
        let panic_message = if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.as_str()
        } else if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s
        } else {
            "Panic occurred without additional info"
        };

        let panic_location = panic_info
            .location()
            .map(|val| val.to_string())
            .unwrap_or_else(|| "Unknown location".to_owned());

        let backtrace_str = format!("{}", backtrace);
        let timestamp_str = format!("{}", timestamp.format("%Y-%m-%dT%H:%M:%S%.fZ"));

        eprintln!(
            "{}",
            serde_json::json!({
                "timestamp": timestamp_str,
                "level": "CRITICAL",
                "fields": {
                    "message": panic_message,
                    "location": panic_location,
                    "backtrace": backtrace_str,
                }
            })
        );
    }));
}
