//! External identity-probe contract: given an access key / secret key pair,
//! confirm it's live and recover the ARN it belongs to. Grounded on the
//! original's use of `sts.GetCallerIdentity`, re-implemented without an SDK.

mod sigv4;

use serde::Deserialize;
use std::time::Duration;

use crate::error::Result;

#[derive(Debug, Deserialize)]
struct GetCallerIdentityResponse {
    #[serde(rename = "GetCallerIdentityResult")]
    result: GetCallerIdentityResult,
}

#[derive(Debug, Deserialize)]
struct GetCallerIdentityResult {
    #[serde(rename = "Arn")]
    arn: String,
}

/// Validates one candidate access/secret key pair against STS. Returns
/// `Ok(Some(arn))` on success, `Ok(None)` if the credentials were rejected
/// (not an error — just not a live key), `Err` only for transport failures.
pub async fn validate(access_key: &str, secret_key: &str) -> Result<Option<String>> {
    let signed = sigv4::sign_get_caller_identity(access_key, secret_key);
    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(5))
        .build()?;

    let mut req = http.post(&signed.url).body(signed.body);
    for (name, value) in signed.headers {
        req = req.header(name, value);
    }

    let resp = req.send().await?;
    if !resp.status().is_success() {
        return Ok(None);
    }
    let body = resp.text().await?;
    match quick_xml::de::from_str::<GetCallerIdentityResponse>(&body) {
        Ok(parsed) => Ok(Some(parsed.result.arn)),
        Err(_) => Ok(None),
    }
}
