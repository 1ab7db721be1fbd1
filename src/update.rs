// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Release availability check.
//!
//! Runs in the background of every invocation, racing the main flow with a
//! short timeout so a slow GitHub never delays the command itself.

use serde::Deserialize;
use thiserror::Error;

/// Latest-release endpoint for abctl.
const LATEST_RELEASE_URL: &str = "https://api.github.com/repos/airbytehq/abctl/releases/latest";

#[derive(Error, Debug)]
pub enum UpdateError {
    /// Release checking is disabled for dev builds.
    #[error("release checking is disabled for dev builds")]
    DevVersion,

    #[error("unable to fetch the latest release")]
    Fetch(#[from] reqwest::Error),
}

#[derive(Deserialize)]
struct Release {
    tag_name: String,
}

/// Check whether a newer release than `current` is available.
///
/// Returns the newer version string, or `None` when already up to date.
pub async fn check(
    client: &reqwest::Client,
    current: &str,
) -> Result<Option<String>, UpdateError> {
    check_url(client, LATEST_RELEASE_URL, current).await
}

async fn check_url(
    client: &reqwest::Client,
    url: &str,
    current: &str,
) -> Result<Option<String>, UpdateError> {
    if current == "dev" {
        return Err(UpdateError::DevVersion);
    }

    let release: Release = client
        .get(url)
        .header(reqwest::header::USER_AGENT, "abctl")
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    let latest = release.tag_name.trim_start_matches('v');
    if newer(current.trim_start_matches('v'), latest) {
        Ok(Some(latest.to_string()))
    } else {
        Ok(None)
    }
}

/// Whether `latest` is a strictly newer semantic version than `current`.
///
/// Unparseable segments compare as zero, so a malformed remote tag never
/// reports an update.
fn newer(current: &str, latest: &str) -> bool {
    let parse = |version: &str| -> [u64; 3] {
        let mut parts = version.splitn(3, '.');
        std::array::from_fn(|_| {
            parts
                .next()
                .and_then(|part| part.parse().ok())
                .unwrap_or(0)
        })
    };
    parse(latest) > parse(current)
}

#[cfg(test)]
#[path = "update_tests.rs"]
mod update_tests;
