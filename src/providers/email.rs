use async_trait::async_trait;
use serde_json::json;
use tracing::warn;

use crate::config::EmailConfig;

/// Transactional email capability. Callers pass a template name and its
/// variables; assembly happens provider-side.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(
        &self,
        to: &str,
        template: &str,
        vars: &serde_json::Value,
    ) -> anyhow::Result<()>;
}

pub struct HttpMailer {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    from_address: String,
}

impl HttpMailer {
    pub fn new(cfg: &EmailConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()?;
        Ok(Self {
            http,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            api_key: cfg.api_key.clone(),
            from_address: cfg.from_address.clone(),
        })
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(
        &self,
        to: &str,
        template: &str,
        vars: &serde_json::Value,
    ) -> anyhow::Result<()> {
        let resp = self
            .http
            .post(format!("{}/v1/messages", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&json!({
                "from": self.from_address,
                "to": to,
                "template": template,
                "variables": vars,
            }))
            .send()
            .await?;
        let status = resp.status();
        anyhow::ensure!(status.is_success(), "email provider returned {status}");
        Ok(())
    }
}

/// Records sends instead of delivering; the failure budget lets tests
/// exercise retry paths.
#[derive(Default)]
pub struct RecordingMailer {
    pub sent: std::sync::Mutex<Vec<(String, String)>>,
    pub failures_before_success: std::sync::atomic::AtomicU32,
}

impl RecordingMailer {
    pub fn failing_times(n: u32) -> Self {
        Self {
            sent: std::sync::Mutex::new(Vec::new()),
            failures_before_success: std::sync::atomic::AtomicU32::new(n),
        }
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().map(|v| v.len()).unwrap_or(0)
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(
        &self,
        to: &str,
        template: &str,
        _vars: &serde_json::Value,
    ) -> anyhow::Result<()> {
        use std::sync::atomic::Ordering;
        let remaining = self.failures_before_success.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failures_before_success
                .store(remaining - 1, Ordering::SeqCst);
            warn!(to, template, "recording mailer: simulated failure");
            anyhow::bail!("simulated email failure");
        }
        if let Ok(mut sent) = self.sent.lock() {
            sent.push((to.to_string(), template.to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn recording_mailer_fails_then_succeeds() {
        let mailer = RecordingMailer::failing_times(2);
        assert!(mailer.send("a@b.c", "welcome", &json!({})).await.is_err());
        assert!(mailer.send("a@b.c", "welcome", &json!({})).await.is_err());
        assert!(mailer.send("a@b.c", "welcome", &json!({})).await.is_ok());
        assert_eq!(mailer.sent_count(), 1);
    }
}
