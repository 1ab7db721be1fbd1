// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Client for the local Airbyte instance's HTTP API.
//!
//! The credentials flow uses this to read and update the organization email,
//! which lives in the Airbyte application rather than the auth secret.
//! Requests authenticate with the instance-admin client credentials via a
//! short-lived access token.

use crate::constants::DEFAULT_ORG_ID;
use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Failures talking to the Airbyte API. These are operational errors and are
/// never reclassified into sentinel categories.
#[derive(Error, Debug)]
pub enum ApiError {
    /// The request could not be sent or the response body was unreadable.
    #[error("request to {endpoint} failed")]
    Request {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with a non-success status.
    #[error("{endpoint} returned HTTP {status}")]
    Status { endpoint: String, status: u16 },
}

/// Organization email operations required by the credentials flow.
#[async_trait]
pub trait OrgApi: Send + Sync {
    /// Current organization email; empty if none is set.
    async fn get_org_email(&self) -> Result<String>;

    /// Replace the organization email.
    async fn set_org_email(&self, email: &str) -> Result<()>;
}

#[derive(Serialize)]
struct TokenRequest<'a> {
    #[serde(rename = "client_id")]
    client_id: &'a str,
    #[serde(rename = "client_secret")]
    client_secret: &'a str,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Deserialize, Debug)]
struct Organization {
    #[serde(rename = "organizationName")]
    name: String,
    email: Option<String>,
}

/// HTTP client for the Airbyte API at a resolved local endpoint.
pub struct Api {
    client: reqwest::Client,
    base_url: String,
    client_id: String,
    client_secret: String,
}

impl Api {
    #[must_use]
    pub fn new(
        base_url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client: reqwest::Client::new(),
            base_url,
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }

    /// Exchange the client credentials for an access token.
    async fn token(&self) -> Result<String, ApiError> {
        let endpoint = format!("{}/api/v1/applications/token", self.base_url);
        let body = TokenRequest {
            client_id: &self.client_id,
            client_secret: &self.client_secret,
        };
        let response = send(self.client.post(&endpoint).json(&body), &endpoint).await?;
        let token: TokenResponse = decode(response, &endpoint).await?;
        Ok(token.access_token)
    }

    /// Fetch the default organization.
    async fn organization(&self) -> Result<Organization, ApiError> {
        let token = self.token().await?;
        let endpoint = format!("{}/api/v1/organizations/get", self.base_url);
        let body = serde_json::json!({ "organizationId": DEFAULT_ORG_ID });
        let response = send(
            self.client.post(&endpoint).bearer_auth(token).json(&body),
            &endpoint,
        )
        .await?;
        decode(response, &endpoint).await
    }
}

async fn send(
    request: reqwest::RequestBuilder,
    endpoint: &str,
) -> Result<reqwest::Response, ApiError> {
    let response = request.send().await.map_err(|source| ApiError::Request {
        endpoint: endpoint.to_string(),
        source,
    })?;
    let status = response.status();
    if !status.is_success() {
        return Err(ApiError::Status {
            endpoint: endpoint.to_string(),
            status: status.as_u16(),
        });
    }
    Ok(response)
}

async fn decode<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
    endpoint: &str,
) -> Result<T, ApiError> {
    response.json().await.map_err(|source| ApiError::Request {
        endpoint: endpoint.to_string(),
        source,
    })
}

#[async_trait]
impl OrgApi for Api {
    async fn get_org_email(&self) -> Result<String> {
        let organization = self.organization().await?;
        Ok(organization.email.unwrap_or_default())
    }

    async fn set_org_email(&self, email: &str) -> Result<()> {
        // The update endpoint replaces the whole organization record, so the
        // current name has to ride along.
        let organization = self.organization().await?;
        let token = self.token().await?;
        let endpoint = format!("{}/api/v1/organizations/update", self.base_url);
        debug!(endpoint = %endpoint, "updating organization email");
        let body = serde_json::json!({
            "organizationId": DEFAULT_ORG_ID,
            "organizationName": organization.name,
            "email": email,
        });
        send(
            self.client.post(&endpoint).bearer_auth(token).json(&body),
            &endpoint,
        )
        .await?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "airbyte_tests.rs"]
mod airbyte_tests;
