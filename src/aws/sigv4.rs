//! A hand-rolled AWS Signature Version 4 signer, just enough to sign a
//! single `sts:GetCallerIdentity` POST request. No AWS SDK dependency —
//! none of the pack's example repos touch one, and the signing algorithm
//! itself is a short, well-specified HMAC chain.

use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

type HmacSha256 = Hmac<Sha256>;

const SERVICE: &str = "sts";
const REGION: &str = "us-east-1";
const HOST: &str = "sts.amazonaws.com";

pub struct SignedRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

fn hmac_sha256(key: &[u8], data: &str) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(key).expect("hmac accepts any key length");
    mac.update(data.as_bytes());
    mac.finalize().into_bytes().to_vec()
}

fn sha256_hex(data: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data.as_bytes());
    hex::encode(hasher.finalize())
}

/// Builds a signed `GetCallerIdentity` request for the given credentials.
pub fn sign_get_caller_identity(access_key: &str, secret_key: &str) -> SignedRequest {
    let now = Utc::now();
    let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();
    let date_stamp = now.format("%Y%m%d").to_string();

    let body = "Action=GetCallerIdentity&Version=2011-06-15".to_string();
    let payload_hash = sha256_hex(&body);

    let canonical_headers = format!(
        "content-type:application/x-www-form-urlencoded\nhost:{}\nx-amz-date:{}\n",
        HOST, amz_date
    );
    let signed_headers = "content-type;host;x-amz-date";

    let canonical_request = format!(
        "POST\n/\n\n{}\n{}\n{}",
        canonical_headers, signed_headers, payload_hash
    );

    let credential_scope = format!("{}/{}/{}/aws4_request", date_stamp, REGION, SERVICE);
    let canonical_request_hash = sha256_hex(&canonical_request);
    let string_to_sign = format!(
        "AWS4-HMAC-SHA256\n{}\n{}\n{}",
        amz_date, credential_scope, canonical_request_hash
    );

    let k_date = hmac_sha256(format!("AWS4{}", secret_key).as_bytes(), &date_stamp);
    let k_region = hmac_sha256(&k_date, REGION);
    let k_service = hmac_sha256(&k_region, SERVICE);
    let k_signing = hmac_sha256(&k_service, "aws4_request");

    let mut mac = HmacSha256::new_from_slice(&k_signing).expect("hmac accepts any key length");
    mac.update(string_to_sign.as_bytes());
    let signature = hex::encode(mac.finalize().into_bytes());

    let authorization = format!(
        "AWS4-HMAC-SHA256 Credential={}/{}, SignedHeaders={}, Signature={}",
        access_key, credential_scope, signed_headers, signature
    );

    SignedRequest {
        url: format!("https://{}/", HOST),
        headers: vec![
            (
                "content-type".to_string(),
                "application/x-www-form-urlencoded".to_string(),
            ),
            ("x-amz-date".to_string(), amz_date),
            ("authorization".to_string(), authorization),
        ],
        body,
    }
}
