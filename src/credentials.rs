// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Credential rotation flow.
//!
//! Three strictly sequential phases, no phase re-entry:
//!
//! 1. Resolve the target cluster and fetch the authentication secret. A
//!    cluster that cannot be resolved is a normal "nothing installed"
//!    outcome for this command, not an operational error.
//! 2. Conditionally mutate: push a new organization email first (it lives in
//!    the Airbyte application, not the secret), then rotate the password via
//!    a full read-modify-write if the supplied value differs byte-exactly
//!    from the stored one, restart the dependent server workload, and
//!    re-fetch the secret so the displayed state is what the cluster holds.
//! 3. Report the credential bundle from the most recent secret state.
//!
//! The client id and client secret are never rotated here.

use crate::airbyte::{Api, OrgApi};
use crate::constants::{
    AIRBYTE_AUTH_SECRET_NAME, AIRBYTE_NAMESPACE, SECRET_CLIENT_ID_KEY, SECRET_CLIENT_SECRET_KEY,
    SECRET_PASSWORD_KEY, SERVER_DEPLOYMENT_NAME,
};
use crate::docker::RuntimeProbe;
use crate::k8s::{self, DefaultClient};
use crate::provider::Provider;
use crate::reporter::Reporter;
use crate::telemetry::{self, EventType};
use anyhow::Result;
use clap::Args;
use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::ByteString;
use tracing::debug;

#[derive(Args, Clone, Debug, Default)]
pub struct CredentialsArgs {
    /// Specify a new email address to use for authentication.
    #[arg(long)]
    pub email: Option<String>,

    /// Specify a new password to use for authentication.
    #[arg(long)]
    pub password: Option<String>,
}

/// Run the credentials command against the resolved provider.
pub async fn run(
    args: &CredentialsArgs,
    provider: &Provider,
    probe: &dyn RuntimeProbe,
    telemetry: &dyn telemetry::Client,
    reporter: &dyn Reporter,
) -> Result<()> {
    telemetry::wrap(telemetry, EventType::Credentials, async {
        let kube = match provider.kube_client().await {
            Ok(kube) => kube,
            Err(err) => {
                debug!(error = %err, "cluster resolution failed");
                reporter.error("No existing cluster found");
                return Ok(());
            }
        };
        let client = DefaultClient::new(kube);
        let port = provider.resolve_port(probe).await?;
        let base_url = format!("http://localhost:{port}");
        run_flow(
            args,
            &client,
            |client_id, client_secret| Api::new(base_url.clone(), client_id, client_secret),
            reporter,
        )
        .await
    })
    .await
}

/// The flow proper, written against the capability seams.
pub(crate) async fn run_flow<A, F>(
    args: &CredentialsArgs,
    client: &dyn k8s::Client,
    make_api: F,
    reporter: &dyn Reporter,
) -> Result<()>
where
    A: OrgApi,
    F: FnOnce(&str, &str) -> A,
{
    let mut secret = client
        .secret_get(AIRBYTE_NAMESPACE, AIRBYTE_AUTH_SECRET_NAME)
        .await?;
    let client_id = k8s::secret_value(&secret, SECRET_CLIENT_ID_KEY);
    let client_secret = k8s::secret_value(&secret, SECRET_CLIENT_SECRET_KEY);
    let api = make_api(&client_id, &client_secret);

    if let Some(email) = args.email.as_deref().filter(|email| !email.is_empty()) {
        reporter.info("Updating email for authentication");
        if let Err(err) = api.set_org_email(email).await {
            reporter.error("Unable to update the email address");
            return Err(err.context("unable to update the email address"));
        }
        reporter.success("Email updated");
    }

    if let Some(password) = args.password.as_deref().filter(|password| !password.is_empty()) {
        if password.as_bytes() != secret_bytes(&secret, SECRET_PASSWORD_KEY) {
            reporter.info("Updating password for authentication");
            let mut updated = secret.clone();
            updated
                .data
                .get_or_insert_with(Default::default)
                .insert(
                    SECRET_PASSWORD_KEY.to_string(),
                    ByteString(password.as_bytes().to_vec()),
                );
            if let Err(err) = client.secret_create_or_update(updated).await {
                reporter.error("Unable to update the password");
                return Err(err.context("unable to update the password"));
            }
            reporter.success("Password updated");

            reporter.phase("Restarting airbyte-abctl-server");
            if let Err(err) = client
                .deployment_restart(AIRBYTE_NAMESPACE, SERVER_DEPLOYMENT_NAME)
                .await
            {
                reporter.error("Unable to restart airbyte-abctl-server");
                return Err(err.context("unable to restart airbyte-abctl-server"));
            }
            reporter.success("Restarted airbyte-abctl-server");

            // The secret was updated; what we display must be what the
            // cluster holds, so fetch it again.
            secret = client
                .secret_get(AIRBYTE_NAMESPACE, AIRBYTE_AUTH_SECRET_NAME)
                .await?;
        }
    }

    let org_email = match api.get_org_email().await {
        Ok(email) if email.is_empty() => "[not set]".to_string(),
        Ok(email) => email,
        Err(err) => {
            reporter.error("Unable to determine organization email");
            return Err(err.context("unable to determine organization email"));
        }
    };

    reporter.success(&format!(
        "Retrieving your credentials from '{AIRBYTE_AUTH_SECRET_NAME}'"
    ));
    reporter.info(&format!(
        "Credentials:\n  Email: {org_email}\n  Password: {}\n  Client-Id: {client_id}\n  Client-Secret: {client_secret}",
        k8s::secret_value(&secret, SECRET_PASSWORD_KEY),
    ));
    Ok(())
}

fn secret_bytes<'a>(secret: &'a Secret, key: &str) -> &'a [u8] {
    secret
        .data
        .as_ref()
        .and_then(|data| data.get(key))
        .map(|value| value.0.as_slice())
        .unwrap_or_default()
}

#[cfg(test)]
#[path = "credentials_tests.rs"]
mod credentials_tests;
