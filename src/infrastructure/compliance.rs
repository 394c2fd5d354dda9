// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::domain::error::AppError;
use crate::domain::model::{ComplianceToken, SignedPayload};
use serde::Deserialize;
use std::future::Future;
use std::time::Duration;

/// Machine-readable refusal code meaning the wallet has not completed
/// onboarding and must do so on the provider's dashboard.
const CODE_FORBIDDEN: u16 = 403;

/// Off-chain rule-verification seam. A success returns the opaque
/// authorization blob consumed by the router; refusals are structured so
/// the controller can tell "finish onboarding elsewhere" from plain
/// denials.
pub trait ComplianceGateway: Send + Sync {
    fn verify(
        &self,
        payload: &SignedPayload,
    ) -> impl Future<Output = Result<ComplianceToken, AppError>> + Send;
}

#[derive(Debug, Deserialize)]
struct VerifyResponse {
    data: Option<String>,
    message: Option<String>,
    #[serde(default)]
    code: Option<u16>,
}

/// HTTP client for a hosted KYC/AML rule-verification service.
pub struct HttpComplianceClient {
    client: reqwest::Client,
    verify_url: String,
    dashboard_url: String,
}

impl HttpComplianceClient {
    pub fn new(
        verify_url: impl Into<String>,
        dashboard_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Config(format!("HTTP client build failed: {}", e)))?;

        Ok(Self {
            client,
            verify_url: verify_url.into(),
            dashboard_url: dashboard_url.into(),
        })
    }
}

impl ComplianceGateway for HttpComplianceClient {
    async fn verify(&self, payload: &SignedPayload) -> Result<ComplianceToken, AppError> {
        let body = serde_json::json!({
            "message": payload.message,
            "signature": payload.signature,
            "signatureType": "ECDSA",
        });

        let response = self
            .client
            .post(&self.verify_url)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AppError::TimedOut("Compliance verification".to_string())
                } else {
                    AppError::Rpc(format!("Compliance request failed: {}", e))
                }
            })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| AppError::Rpc(format!("Compliance response read failed: {}", e)))?;
        let parsed: VerifyResponse = serde_json::from_str(&text).unwrap_or(VerifyResponse {
            data: None,
            message: None,
            code: None,
        });

        if status.is_success() {
            return parsed
                .data
                .filter(|data| !data.is_empty())
                .ok_or_else(|| {
                    AppError::ComplianceDenied("Provider returned no verification data".into())
                });
        }

        let message = parsed
            .message
            .unwrap_or_else(|| format!("Verification failed with status {}", status.as_u16()));
        let code = parsed.code.unwrap_or(status.as_u16());

        if code == CODE_FORBIDDEN {
            Err(AppError::ComplianceActionRequired {
                message,
                redirect: self.dashboard_url.clone(),
            })
        } else {
            Err(AppError::ComplianceDenied(message))
        }
    }
}
