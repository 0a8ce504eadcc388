//! Builds the text message sent to the chat.
//!
//! The layout is consumed by people reading Telegram, so it is kept
//! byte-for-byte stable:
//!
//! ```text
//! 域名过期时间巡检:2024-05-01
//! ----------------------------------------------
//! a.example.com 2024-09-30✔\r\n
//! b.example.com 获取证书过期时间失败\n
//! ```

use crate::checker::{CheckResult, ExpirySource};
use chrono::{DateTime, Duration, Local};
use log::{info, warn};
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter};

pub const HEADER_LABEL: &str = "域名过期时间巡检:";
pub const SEPARATOR: &str = "----------------------------------------------";
pub const CHECK_FAILED: &str = "获取证书过期时间失败";
pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const EXPIRING_SOON_DAYS: i64 = 15;

/// How close a certificate is to expiry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum UrgencyTier {
    Expired,
    ExpiringSoon,
    Healthy,
    Unknown,
}

impl UrgencyTier {
    /// Classifies an expiry relative to `now`.
    ///
    /// Anything before `now` is expired, anything before `now` plus
    /// fifteen days is expiring soon.
    pub fn classify(expiry: &DateTime<Local>, now: &DateTime<Local>) -> UrgencyTier {
        if expiry < now {
            UrgencyTier::Expired
        } else if *expiry < *now + Duration::days(EXPIRING_SOON_DAYS) {
            UrgencyTier::ExpiringSoon
        } else {
            UrgencyTier::Healthy
        }
    }

    pub fn from_result(result: &CheckResult, now: &DateTime<Local>) -> UrgencyTier {
        match result {
            Ok(expiry) => UrgencyTier::classify(expiry, now),
            Err(_) => UrgencyTier::Unknown,
        }
    }

    /// Glyph appended after the expiry date.
    pub fn marker(&self) -> &'static str {
        match self {
            UrgencyTier::Expired => "\u{fe0f}\u{274c}",
            UrgencyTier::ExpiringSoon => "\u{26a0}\u{fe0f}",
            UrgencyTier::Healthy => "\u{2714}",
            UrgencyTier::Unknown => "",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportEntry {
    pub host: String,
    pub expiry: Option<DateTime<Local>>,
    pub tier: UrgencyTier,
}

/// The finished message, one entry per host in input order.
#[derive(Debug, Clone)]
pub struct Report {
    text: String,
    entries: Vec<ReportEntry>,
}

impl Report {
    /// Checks every host in order and accumulates the message.
    ///
    /// A failed check never stops the loop; the host gets a failure line
    /// and the next host is checked.
    pub fn build<S: ExpirySource + ?Sized>(
        hosts: &[String],
        now: DateTime<Local>,
        source: &S,
    ) -> Report {
        let mut text = format!("{}{}\n", HEADER_LABEL, now.format(DATE_FORMAT));
        text.push_str(SEPARATOR);
        text.push('\n');

        let mut entries = Vec::with_capacity(hosts.len());
        for host in hosts {
            let result = source.expiry(host);
            let tier = UrgencyTier::from_result(&result, &now);
            match &result {
                Ok(expiry) => {
                    text.push_str(&format!(
                        "{} {}{}\r\n",
                        host,
                        expiry.format(DATE_FORMAT),
                        tier.marker()
                    ));
                }
                Err(e) => {
                    warn!("Fail to check host: {} {}", host, e);
                    text.push_str(&format!("{} {}\n", host, CHECK_FAILED));
                }
            }
            entries.push(ReportEntry {
                host: host.clone(),
                expiry: result.ok(),
                tier,
            });
        }

        let report = Report { text, entries };
        report.log_summary();
        report
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn entries(&self) -> &[ReportEntry] {
        &self.entries
    }

    pub fn count(&self, tier: UrgencyTier) -> usize {
        self.entries.iter().filter(|e| e.tier == tier).count()
    }

    fn log_summary(&self) {
        let summary: Vec<String> = UrgencyTier::iter()
            .map(|tier| format!("{}={}", tier, self.count(tier)))
            .collect();
        info!(
            "checked {} hosts: {}",
            self.entries.len(),
            summary.join(" ")
        );
    }
}
