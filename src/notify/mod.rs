//! Outbound SMS. Delivery is best effort: callers on business paths use
//! [`notify_best_effort`] so a gateway outage never fails the operation.

use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use crate::config::Config;

const TWILIO_API: &str = "https://api.twilio.com/2010-04-01";

/// Gateway acknowledgement for an accepted message
#[derive(Debug, Clone)]
pub struct SmsReceipt {
    pub sid: String,
}

#[async_trait]
pub trait SmsSender: Send + Sync {
    async fn send(&self, to: &str, body: &str) -> Result<SmsReceipt>;
}

/// Build the sender the configuration allows
pub fn from_config(cfg: &Config) -> Result<Box<dyn SmsSender>> {
    if !cfg.sms_enabled() {
        tracing::warn!("Twilio credentials not set - SMS notifications are disabled");
        return Ok(Box::new(DisabledSms));
    }
    Ok(Box::new(TwilioSms::new(
        cfg.twilio_account_sid.clone(),
        cfg.twilio_auth_token.clone(),
        cfg.twilio_phone_number.clone(),
        cfg.sms_country_code.clone(),
    )?))
}

/// Twilio Messages API client
pub struct TwilioSms {
    account_sid: String,
    auth_token: String,
    from: String,
    country_code: String,
    client: Client,
}

#[derive(Deserialize)]
struct TwilioMessage {
    sid: String,
}

#[derive(Deserialize)]
struct TwilioError {
    message: String,
}

impl TwilioSms {
    pub fn new(account_sid: String, auth_token: String, from: String, country_code: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build HTTP client: {}", e))?;

        Ok(Self {
            account_sid,
            auth_token,
            from,
            country_code,
            client,
        })
    }

    fn messages_url(&self) -> String {
        format!("{}/Accounts/{}/Messages.json", TWILIO_API, self.account_sid)
    }
}

#[async_trait]
impl SmsSender for TwilioSms {
    async fn send(&self, to: &str, body: &str) -> Result<SmsReceipt> {
        let to = format_phone(to, &self.country_code);
        let resp = self
            .client
            .post(self.messages_url())
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&[("To", to.as_str()), ("From", self.from.as_str()), ("Body", body)])
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            let message = serde_json::from_str::<TwilioError>(&text)
                .map(|e| e.message)
                .unwrap_or(text);
            return Err(anyhow::anyhow!("SMS gateway error {}: {}", status, message));
        }

        let msg: TwilioMessage = resp.json().await?;
        Ok(SmsReceipt { sid: msg.sid })
    }
}

/// Stand-in used when no gateway is configured
pub struct DisabledSms;

#[async_trait]
impl SmsSender for DisabledSms {
    async fn send(&self, _to: &str, _body: &str) -> Result<SmsReceipt> {
        Err(anyhow::anyhow!("SMS gateway not configured"))
    }
}

/// Send and log; failures never reach the caller
pub async fn notify_best_effort(sender: &dyn SmsSender, to: Option<&str>, body: &str, purpose: &str) {
    let Some(to) = to.map(str::trim).filter(|t| !t.is_empty()) else {
        tracing::debug!(purpose, "No phone number on record, SMS skipped");
        return;
    };
    match sender.send(to, body).await {
        Ok(receipt) => tracing::info!(purpose, sid = %receipt.sid, "SMS sent"),
        Err(e) => tracing::warn!(purpose, "SMS failed: {}", e),
    }
}

/// Local 10-digit numbers get the country prefix; anything else is sent as given
pub fn format_phone(phone: &str, country_code: &str) -> String {
    let trimmed = phone.trim();
    if trimmed.starts_with('+') {
        return trimmed.to_string();
    }
    let digits: String = trimmed.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() == 10 {
        format!("{}{}", country_code, digits)
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
pub mod testing {
    use super::*;
    use std::sync::Mutex;

    /// Records every message; fails all sends when `fail` is set
    #[derive(Default)]
    pub struct RecordingSms {
        pub sent: Mutex<Vec<(String, String)>>,
        pub fail: bool,
    }

    impl RecordingSms {
        pub fn failing() -> Self {
            Self {
                fail: true,
                ..Default::default()
            }
        }

        pub fn messages(&self) -> Vec<(String, String)> {
            self.sent.lock().map(|m| m.clone()).unwrap_or_default()
        }
    }

    #[async_trait]
    impl SmsSender for RecordingSms {
        async fn send(&self, to: &str, body: &str) -> Result<SmsReceipt> {
            if let Ok(mut sent) = self.sent.lock() {
                sent.push((to.to_string(), body.to_string()));
            }
            if self.fail {
                return Err(anyhow::anyhow!("gateway unavailable"));
            }
            Ok(SmsReceipt {
                sid: format!("SM{:04}", self.messages().len()),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::RecordingSms;
    use super::*;

    #[test]
    fn test_format_phone() {
        assert_eq!(format_phone("9876543210", "+91"), "+919876543210");
        assert_eq!(format_phone(" +14155550100 ", "+91"), "+14155550100");
        assert_eq!(format_phone("98765-43210", "+91"), "+919876543210");
        assert_eq!(format_phone("12345", "+91"), "12345");
    }

    #[tokio::test]
    async fn test_disabled_sender_errors() {
        let err = DisabledSms.send("9876543210", "hi").await.unwrap_err();
        assert_eq!(err.to_string(), "SMS gateway not configured");
    }

    #[tokio::test]
    async fn test_best_effort_swallows_failures() {
        let sms = RecordingSms::failing();
        notify_best_effort(&sms, Some("9876543210"), "Welcome", "test").await;
        notify_best_effort(&sms, None, "Welcome", "test").await;
        assert_eq!(sms.messages().len(), 1);
    }
}
