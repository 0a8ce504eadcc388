//! Certificate expiry report for a fixed list of hosts, delivered to a
//! Telegram chat.
//!
//! A run normalizes the host list, reads the leaf certificate of every host
//! on port 443, classifies its expiry into an [`UrgencyTier`] and sends the
//! resulting [`Report`] through the Bot API.
//!
//! ```no_run
//! use certnotify::{Config, Notifier, Report, TlsChecker};
//!
//! let settings = Config::packaged()?.resolve()?;
//! let checker = TlsChecker::new()?;
//! let report = Report::build(&settings.hosts, chrono::Local::now(), &checker);
//! Notifier::new(&settings.bot, settings.proxy.as_deref())?.send(&report)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod checker;
pub mod config;
pub mod error;
pub mod hosts;
pub mod notifier;
pub mod report;

pub use checker::{CheckResult, ExpirySource, TlsChecker};
pub use config::{BotCredentials, Config, ConfigError, Settings};
pub use error::{CheckError, NotifyError};
pub use hosts::{normalize, split_hosts};
pub use notifier::{Notifier, Route};
pub use report::{Report, ReportEntry, UrgencyTier};
