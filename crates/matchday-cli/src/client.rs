use anyhow::{Context, Result};
use matchday_core::PredictionBatch;
use serde_json::Value;

pub struct MatchdayClient {
    http: reqwest::Client,
    base_url: String,
}

impl MatchdayClient {
    pub fn new(base_url: &str) -> Self {
        let base_url = base_url.trim_end_matches('/').to_string();
        Self {
            http: reqwest::Client::new(),
            base_url,
        }
    }

    fn predictions_url(&self) -> String {
        format!("{}/api/v1/predictions", self.base_url)
    }

    /// Returns the server's acknowledgment message.
    pub async fn push(&self, batch: &PredictionBatch) -> Result<String> {
        let resp = self
            .http
            .post(self.predictions_url())
            .json(batch)
            .send()
            .await
            .context("Failed to connect to server")?;
        let body = handle_response(resp).await?;
        Ok(body
            .get("message")
            .and_then(|m| m.as_str())
            .unwrap_or("ok")
            .to_string())
    }

    pub async fn fetch(&self, header: &str, secret: Option<&str>) -> Result<PredictionBatch> {
        let mut req = self.http.get(self.predictions_url());
        if let Some(secret) = secret {
            req = req.header(header, secret);
        }
        let resp = req.send().await.context("Failed to connect to server")?;
        let mut body = handle_response(resp).await?;
        let data = body
            .get_mut("data")
            .map(Value::take)
            .context("Response has no data field")?;
        serde_json::from_value(data).context("Server returned an invalid prediction batch")
    }

    pub async fn health(&self) -> Result<(u16, String)> {
        let url = format!("{}/healthz", self.base_url);
        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .context("Failed to connect to server")?;
        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        Ok((status, body))
    }
}

async fn handle_response(resp: reqwest::Response) -> Result<Value> {
    let status = resp.status();
    let body = resp.text().await.unwrap_or_default();

    if !status.is_success() {
        if let Ok(json) = serde_json::from_str::<Value>(&body)
            && let Some(error) = json.get("error")
        {
            let code = error.get("code").and_then(|v| v.as_str()).unwrap_or("ERROR");
            let message = error.get("message").and_then(|v| v.as_str()).unwrap_or("");
            let details: Vec<&str> = error
                .get("details")
                .and_then(|d| d.as_array())
                .map(|d| d.iter().filter_map(|v| v.as_str()).collect())
                .unwrap_or_default();
            if details.is_empty() {
                anyhow::bail!("HTTP {status}: {code}: {message}");
            }
            anyhow::bail!("HTTP {status}: {code}: {message} ({})", details.join("; "));
        }
        anyhow::bail!("HTTP {status}: {}", body.trim());
    }

    serde_json::from_str(&body).context("Failed to parse response JSON")
}
