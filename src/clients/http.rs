//! Small HTTP client builders for the probe stages. Much thinner than the
//! teacher's `HttpClient` (no rate limiting, no conditional requests — the
//! stages here are one-shot fixed-timeout GETs), but grounded on the same
//! builder-pattern and timeout-configuration style.

use std::time::Duration;

use crate::error::Result;

/// A plain client with a fixed request timeout, used by the GitLab/Jenkins
/// fingerprint probes.
pub fn probe_client(timeout: Duration) -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder().timeout(timeout).build()?)
}

/// A client with redirects disabled, used where following a redirect would
/// defeat the fingerprint check (e.g. a reverse proxy bouncing `/api/json`
/// to a login page).
pub fn probe_client_no_redirect(timeout: Duration) -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .timeout(timeout)
        .redirect(reqwest::redirect::Policy::none())
        .build()?)
}
