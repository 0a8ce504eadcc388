//! Delivery of the report through the Telegram Bot API `sendMessage` call.

use crate::config::BotCredentials;
use crate::error::NotifyError;
use crate::report::Report;
use log::{info, warn};
use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Proxy, StatusCode};
use serde::Serialize;
use std::time::Duration;
use url::Url;

pub const TELEGRAM_API: &str = "https://api.telegram.org";

static DIRECT_TIMEOUT: u64 = 5;
static PROXY_TIMEOUT: u64 = 10;

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
}

/// Encodes the `sendMessage` request body.
pub fn payload(chat_id: &str, text: &str) -> Result<Vec<u8>, NotifyError> {
    Ok(serde_json::to_vec(&SendMessage { chat_id, text })?)
}

/// How the request reaches Telegram.
#[derive(Debug, Clone, PartialEq)]
pub enum Route {
    Direct,
    Proxy(Url),
}

pub struct Notifier {
    client: Client,
    endpoint: String,
    chat_id: String,
    route: Route,
    timeout: Duration,
}

impl Notifier {
    pub fn new(bot: &BotCredentials, proxy: Option<&str>) -> Result<Notifier, NotifyError> {
        Notifier::with_api_base(TELEGRAM_API, bot, proxy)
    }

    /// Builds a notifier against another Bot API server.
    ///
    /// An empty or missing proxy selects a direct connection with a five
    /// second timeout. Any other value must parse as a URL and selects a
    /// proxied connection with a ten second timeout.
    pub fn with_api_base(
        api_base: &str,
        bot: &BotCredentials,
        proxy: Option<&str>,
    ) -> Result<Notifier, NotifyError> {
        let endpoint = format!(
            "{}/bot{}/sendMessage",
            api_base.trim_end_matches('/'),
            bot.bot_token
        );

        let (client, route, timeout) = match proxy.filter(|p| !p.is_empty()) {
            Some(address) => {
                let url = Url::parse(address).map_err(|e| NotifyError::Proxy {
                    address: address.to_string(),
                    reason: e.to_string(),
                })?;
                let proxy = Proxy::all(url.clone()).map_err(|e| NotifyError::Proxy {
                    address: address.to_string(),
                    reason: e.to_string(),
                })?;
                let timeout = Duration::from_secs(PROXY_TIMEOUT);
                let client = Client::builder()
                    .timeout(timeout)
                    .danger_accept_invalid_certs(false)
                    .proxy(proxy)
                    .build()
                    .map_err(NotifyError::Client)?;
                (client, Route::Proxy(url), timeout)
            }
            None => {
                let timeout = Duration::from_secs(DIRECT_TIMEOUT);
                let client = Client::builder()
                    .timeout(timeout)
                    .no_proxy()
                    .build()
                    .map_err(NotifyError::Client)?;
                (client, Route::Direct, timeout)
            }
        };

        Ok(Notifier {
            client,
            endpoint,
            chat_id: bot.chat_id.clone(),
            route,
            timeout,
        })
    }

    pub fn route(&self) -> &Route {
        &self.route
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Posts the report and returns the HTTP status.
    ///
    /// Any response counts as delivered; the body is never read.
    pub fn send(&self, report: &Report) -> Result<StatusCode, NotifyError> {
        let body = payload(&self.chat_id, report.as_str())?;

        // the endpoint carries the bot token, keep it out of logs
        let response = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .map_err(NotifyError::Transport)?;

        let status = response.status();
        if status.is_success() {
            info!("report sent to chat {} ({})", self.chat_id, status);
        } else {
            warn!("Telegram answered {} for chat {}", status, self.chat_id);
        }
        Ok(status)
    }
}
