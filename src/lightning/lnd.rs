use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::{
    config::LightningConfig,
    error::{MaintenanceError, Result},
    lightning::router::{PaymentRouter, RoutingOutcome},
    storage::models::LightningPayment,
};

/// Extra time given to the HTTP request beyond the payment timeout.
const REQUEST_GRACE_SECONDS: u64 = 10;

/// `PaymentRouter` backed by LND's REST router endpoint.
pub struct LndRouter {
    client: reqwest::Client,
    rest_url: String,
    macaroon_hex: String,
}

impl LndRouter {
    pub fn new(config: &LightningConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()?;

        Ok(Self {
            client,
            rest_url: config.rest_url.trim_end_matches('/').to_string(),
            macaroon_hex: config.macaroon_hex.clone(),
        })
    }
}

#[async_trait]
impl PaymentRouter for LndRouter {
    async fn follow_send_payment(
        &self,
        payment: &LightningPayment,
        fee_limit_sat: u64,
        timeout_seconds: u64,
    ) -> Result<RoutingOutcome> {
        let body = json!({
            "payment_request": payment.invoice,
            "fee_limit_sat": fee_limit_sat.to_string(),
            "timeout_seconds": timeout_seconds,
        });

        let response = self
            .client
            .post(format!("{}/v2/router/send", self.rest_url))
            .header("Grpc-Metadata-macaroon", &self.macaroon_hex)
            .timeout(Duration::from_secs(timeout_seconds + REQUEST_GRACE_SECONDS))
            .json(&body)
            .send()
            .await?
            .error_for_status()?;

        let stream = response.text().await?;
        debug!("Router stream for {}: {} bytes", payment.payment_hash, stream.len());
        parse_payment_stream(&stream)
    }
}

#[derive(Debug, Deserialize)]
struct StreamLine {
    result: Option<PaymentUpdate>,
    error: Option<StreamError>,
}

#[derive(Debug, Deserialize)]
struct PaymentUpdate {
    status: String,
    #[serde(default)]
    fee_sat: Option<serde_json::Value>,
    #[serde(default)]
    payment_preimage: Option<String>,
    #[serde(default)]
    failure_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StreamError {
    #[serde(default)]
    message: String,
}

/// Reads the newline-delimited update stream and keeps the last update.
pub fn parse_payment_stream(stream: &str) -> Result<RoutingOutcome> {
    let last = stream
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .last()
        .ok_or_else(|| MaintenanceError::Routing("empty response from node".to_string()))?;

    let line: StreamLine = serde_json::from_str(last)?;
    if let Some(error) = line.error {
        return Err(MaintenanceError::Routing(error.message));
    }
    let update = line
        .result
        .ok_or_else(|| MaintenanceError::Routing("update without result".to_string()))?;

    let outcome = match update.status.as_str() {
        "SUCCEEDED" => RoutingOutcome::Succeeded {
            fee_paid_sat: update.fee_sat.as_ref().and_then(as_u64).unwrap_or(0),
            preimage: update.payment_preimage.unwrap_or_default(),
        },
        "FAILED" => RoutingOutcome::Failed {
            reason: update
                .failure_reason
                .unwrap_or_else(|| "FAILURE_REASON_NONE".to_string()),
        },
        _ => RoutingOutcome::InFlight,
    };
    Ok(outcome)
}

// LND encodes int64 fields as strings in JSON.
fn as_u64(value: &serde_json::Value) -> Option<u64> {
    match value {
        serde_json::Value::String(s) => s.parse().ok(),
        other => other.as_u64(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_update_wins() {
        let stream = r#"
            {"result":{"status":"IN_FLIGHT","fee_sat":"0"}}
            {"result":{"status":"SUCCEEDED","fee_sat":"3","payment_preimage":"ab12"}}
        "#;

        assert_eq!(
            parse_payment_stream(stream).unwrap(),
            RoutingOutcome::Succeeded {
                fee_paid_sat: 3,
                preimage: "ab12".to_string()
            }
        );
    }

    #[test]
    fn test_failed_update() {
        let stream = r#"{"result":{"status":"FAILED","failure_reason":"FAILURE_REASON_TIMEOUT"}}"#;
        assert_eq!(
            parse_payment_stream(stream).unwrap(),
            RoutingOutcome::Failed {
                reason: "FAILURE_REASON_TIMEOUT".to_string()
            }
        );
    }

    #[test]
    fn test_in_flight_update() {
        let stream = r#"{"result":{"status":"IN_FLIGHT"}}"#;
        assert_eq!(parse_payment_stream(stream).unwrap(), RoutingOutcome::InFlight);
    }

    #[test]
    fn test_stream_error_and_empty_body() {
        let stream = r#"{"error":{"code":2,"message":"invoice is already paid"}}"#;
        assert!(matches!(
            parse_payment_stream(stream),
            Err(MaintenanceError::Routing(msg)) if msg == "invoice is already paid"
        ));
        assert!(parse_payment_stream("  \n").is_err());
    }
}
