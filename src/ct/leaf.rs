//! Binary decoding of a CT `MerkleTreeLeaf` (RFC 6962 §3.4) and extraction
//! of certificate subjects from the embedded DER.
//!
//! No crate in the workspace implements this wire format; it's a handful of
//! fixed-width big-endian fields, so it's read directly off the byte slice
//! rather than pulled in as a dependency.

use crate::error::{Error, Result};
use x509_parser::certificate::TbsCertificate;
use x509_parser::extensions::GeneralName;
use x509_parser::traits::FromDer;

pub struct DecodedLeaf {
    pub subjects: Vec<String>,
}

struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        if self.pos + n > self.buf.len() {
            return Err(Error::Programming("truncated merkle tree leaf".into()));
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    fn u16(&mut self) -> Result<u16> {
        let b = self.take(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    fn u24(&mut self) -> Result<u32> {
        let b = self.take(3)?;
        Ok(u32::from_be_bytes([0, b[0], b[1], b[2]]))
    }

    fn u64(&mut self) -> Result<u64> {
        let b = self.take(8)?;
        Ok(u64::from_be_bytes(b.try_into().unwrap()))
    }
}

/// Decodes a `leaf_input` byte string (already base64-decoded) into its
/// deduplicated certificate subjects (Subject CN plus any SAN dNSNames).
///
/// Fatal (returns `Err`) if the leaf isn't a `TimestampedEntry`, or if an
/// X.509/precertificate entry's embedded DER fails to parse — these
/// indicate the log returned something this follower doesn't understand,
/// the same unconditional-fatal treatment the original gives unexpected
/// entry shapes.
pub fn decode_merkle_leaf(leaf_input: &[u8]) -> Result<DecodedLeaf> {
    let mut r = Reader::new(leaf_input);
    let version = r.u8()?;
    let leaf_type = r.u8()?;
    if version != 0 || leaf_type != 0 {
        return Err(Error::Programming("not a timestamped entry".into()));
    }

    let _timestamp = r.u64()?;
    let entry_type = r.u16()?;

    let subjects = match entry_type {
        0 => {
            // x509_entry: ASN.1Cert (length-24 prefixed DER certificate)
            let len = r.u24()? as usize;
            let cert_der = r.take(len)?;
            let (_, cert) = x509_parser::parse_x509_certificate(cert_der)
                .map_err(|e| Error::Programming(format!("could not parse certificate: {e}")))?;
            subjects_of(&cert)
        }
        1 => {
            // precert_entry: issuer_key_hash(32) + TBSCertificate
            let _issuer_key_hash = r.take(32)?;
            let len = r.u24()? as usize;
            let tbs_der = r.take(len)?;
            let (_, tbs) = TbsCertificate::from_der(tbs_der)
                .map_err(|e| Error::Programming(format!("could not parse precertificate: {e}")))?;
            subjects_of(&tbs)
        }
        other => {
            return Err(Error::Programming(format!("unknown entry type {other}")));
        }
    };

    Ok(DecodedLeaf {
        subjects: unique(subjects),
    })
}

fn subjects_of(tbs: &TbsCertificate) -> Vec<String> {
    let mut subjects = Vec::new();
    if let Some(cn) = tbs
        .subject()
        .iter_common_name()
        .next()
        .and_then(|cn| cn.as_str().ok())
    {
        subjects.push(cn.to_string());
    }
    if let Ok(Some(san)) = tbs.subject_alternative_name() {
        for name in san.value.general_names.iter() {
            if let GeneralName::DNSName(dns) = name {
                subjects.push(dns.to_string());
            }
        }
    }
    subjects
}

fn unique(items: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::with_capacity(items.len());
    for item in items {
        if seen.insert(item.clone()) {
            out.push(item);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_timestamped_entry() {
        let buf = [1u8, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0];
        let err = decode_merkle_leaf(&buf).unwrap_err();
        assert!(err.to_string().contains("not a timestamped entry"));
    }

    #[test]
    fn rejects_truncated_leaf() {
        let buf = [0u8, 0, 0, 0];
        assert!(decode_merkle_leaf(&buf).is_err());
    }

    #[test]
    fn rejects_unknown_entry_type() {
        // version=0, leaf_type=0, timestamp=0 (8 bytes), entry_type=2 (unknown)
        let mut buf = vec![0u8, 0];
        buf.extend_from_slice(&[0u8; 8]);
        buf.extend_from_slice(&2u16.to_be_bytes());
        let err = decode_merkle_leaf(&buf).unwrap_err();
        assert!(err.to_string().contains("unknown entry type"));
    }

    #[test]
    fn rejects_a_precert_entry_with_unparsable_tbs_der() {
        // version=0, leaf_type=0, timestamp=0, entry_type=1 (precert),
        // issuer_key_hash (32 zero bytes), tbs length=0, zero-length DER.
        let mut buf = vec![0u8, 0];
        buf.extend_from_slice(&[0u8; 8]);
        buf.extend_from_slice(&1u16.to_be_bytes());
        buf.extend_from_slice(&[0u8; 32]);
        buf.extend_from_slice(&[0u8, 0, 0]);
        assert!(decode_merkle_leaf(&buf).is_err());
    }
}
