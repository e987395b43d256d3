//! HTTP message signature primitives.
//!
//! A capability invocation arrives as a signed HTTP request: the
//! `authorization` header carries the signature parameters, and the
//! signature covers a canonical string built from pseudo-fields and
//! request headers. The supported proof suite is Ed25519Signature2018;
//! verification keys resolve from `did:key:` identifiers only.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use http::HeaderMap;

/// Header naming the capability an invocation exercises.
pub const CAPABILITY_HEADER: &str = "authorization-capability";
/// Header naming the action (`read` | `write`) an invocation requests.
pub const CAPABILITY_ACTION_HEADER: &str = "authorization-capability-action";

const SIGNATURE_SCHEME: &str = "Signature";

/// Covered fields every signature must include.
const REQUIRED_COVERED: [&str; 5] = [
    "(key-id)",
    "(created)",
    "(expires)",
    "(request-target)",
    "host",
];
/// Additional covered fields required when the request has a body.
const REQUIRED_COVERED_BODY: [&str; 2] = ["content-type", "digest"];

/// Tolerated clock skew for `(created)` / `(expires)`, in seconds.
const CLOCK_SKEW: i64 = 300;

const ED25519_MULTICODEC: [u8; 2] = [0xed, 0x01];

/// Errors that can occur while parsing or verifying a signature
#[derive(Debug, thiserror::Error)]
pub enum SigError {
    #[error("authorization header is not an HTTP signature")]
    NotASignature,
    #[error("malformed signature parameter: {0}")]
    MalformedParam(String),
    #[error("signature parameter missing: {0}")]
    MissingParam(&'static str),
    #[error("signature must cover {0}")]
    MissingCovered(&'static str),
    #[error("covered header absent from request: {0}")]
    MissingHeader(String),
    #[error("signature created timestamp is in the future")]
    CreatedInFuture,
    #[error("signature has expired")]
    Expired,
    #[error("unsupported verification key scheme: {0}")]
    UnsupportedKeyScheme(String),
    #[error("invalid verification key")]
    InvalidKey,
    #[error("signature verification failed")]
    Verification,
}

/// Parsed parameters of an HTTP signature header.
#[derive(Debug, Clone)]
pub struct SignatureInput {
    pub key_id: String,
    pub created: i64,
    pub expires: i64,
    /// Covered field names, in the order they were signed.
    pub covered: Vec<String>,
    pub signature: Vec<u8>,
}

impl SignatureInput {
    /// Parse an `authorization` header value of the form
    /// `Signature keyId="...",created="...",expires="...",headers="...",signature="..."`.
    pub fn parse(header: &str) -> Result<SignatureInput, SigError> {
        let params = header
            .strip_prefix(SIGNATURE_SCHEME)
            .ok_or(SigError::NotASignature)?
            .trim_start();

        let mut key_id = None;
        let mut created = None;
        let mut expires = None;
        let mut covered = None;
        let mut signature = None;

        for part in params.split(',') {
            let (name, value) = part
                .trim()
                .split_once('=')
                .ok_or_else(|| SigError::MalformedParam(part.trim().to_string()))?;
            let value = value.trim_matches('"');
            match name {
                "keyId" => key_id = Some(value.to_string()),
                "created" => {
                    created = Some(
                        value
                            .parse::<i64>()
                            .map_err(|_| SigError::MalformedParam("created".to_string()))?,
                    )
                }
                "expires" => {
                    expires = Some(
                        value
                            .parse::<i64>()
                            .map_err(|_| SigError::MalformedParam("expires".to_string()))?,
                    )
                }
                "headers" => {
                    covered = Some(
                        value
                            .split_ascii_whitespace()
                            .map(|s| s.to_ascii_lowercase())
                            .collect::<Vec<_>>(),
                    )
                }
                "signature" => {
                    signature = Some(
                        STANDARD
                            .decode(value)
                            .map_err(|_| SigError::MalformedParam("signature".to_string()))?,
                    )
                }
                // unknown parameters (e.g. algorithm) are ignored
                _ => {}
            }
        }

        Ok(SignatureInput {
            key_id: key_id.ok_or(SigError::MissingParam("keyId"))?,
            created: created.ok_or(SigError::MissingParam("created"))?,
            expires: expires.ok_or(SigError::MissingParam("expires"))?,
            covered: covered.ok_or(SigError::MissingParam("headers"))?,
            signature: signature.ok_or(SigError::MissingParam("signature"))?,
        })
    }

    /// Ensure the required fields are covered by the signature.
    pub fn check_coverage(&self, has_body: bool) -> Result<(), SigError> {
        for required in REQUIRED_COVERED {
            if !self.covered.iter().any(|c| c == required) {
                return Err(SigError::MissingCovered(required));
            }
        }
        if has_body {
            for required in REQUIRED_COVERED_BODY {
                if !self.covered.iter().any(|c| c == required) {
                    return Err(SigError::MissingCovered(required));
                }
            }
        }
        Ok(())
    }

    /// Ensure the signature is currently valid, allowing bounded skew.
    pub fn check_window(&self, now: i64) -> Result<(), SigError> {
        if self.created > now + CLOCK_SKEW {
            return Err(SigError::CreatedInFuture);
        }
        if self.expires < now - CLOCK_SKEW {
            return Err(SigError::Expired);
        }
        Ok(())
    }

    /// Build the canonical signing string for this signature over the
    /// given request line and headers, in covered-field order.
    pub fn signing_string(
        &self,
        method: &str,
        path_and_query: &str,
        headers: &HeaderMap,
    ) -> Result<String, SigError> {
        let mut lines = Vec::with_capacity(self.covered.len());
        for name in &self.covered {
            let line = match name.as_str() {
                "(key-id)" => format!("(key-id): {}", self.key_id),
                "(created)" => format!("(created): {}", self.created),
                "(expires)" => format!("(expires): {}", self.expires),
                "(request-target)" => format!(
                    "(request-target): {} {}",
                    method.to_ascii_lowercase(),
                    path_and_query
                ),
                header => {
                    let value = headers
                        .get(header)
                        .and_then(|v| v.to_str().ok())
                        .ok_or_else(|| SigError::MissingHeader(header.to_string()))?;
                    format!("{}: {}", header, value.trim())
                }
            };
            lines.push(line);
        }
        Ok(lines.join("\n"))
    }

    /// Render back to an `authorization` header value. Used by clients
    /// composing invocations; the server only parses.
    pub fn to_header_value(&self) -> String {
        format!(
            r#"{} keyId="{}",created="{}",expires="{}",headers="{}",signature="{}""#,
            SIGNATURE_SCHEME,
            self.key_id,
            self.created,
            self.expires,
            self.covered.join(" "),
            STANDARD.encode(&self.signature),
        )
    }
}

/// A resolved verification method.
#[derive(Debug, Clone)]
pub struct VerificationKey {
    /// The key id the signature named.
    pub id: String,
    /// The principal controlling the key (the bare did).
    pub controller: String,
    pub key: ed25519_dalek::VerifyingKey,
}

/// Resolve a `did:key:` identifier (with or without a fragment) to its
/// Ed25519 verification method. Any other scheme is refused.
pub fn resolve_key(key_id: &str) -> Result<VerificationKey, SigError> {
    let did = key_id.split('#').next().unwrap_or(key_id);
    let multibase = did.strip_prefix("did:key:").ok_or_else(|| {
        let scheme = key_id.split(':').take(2).collect::<Vec<_>>().join(":");
        SigError::UnsupportedKeyScheme(scheme)
    })?;
    let encoded = multibase.strip_prefix('z').ok_or(SigError::InvalidKey)?;
    let bytes = bs58::decode(encoded)
        .into_vec()
        .map_err(|_| SigError::InvalidKey)?;
    if bytes.len() != 34 || bytes[..2] != ED25519_MULTICODEC {
        return Err(SigError::InvalidKey);
    }
    let raw: [u8; 32] = bytes[2..].try_into().map_err(|_| SigError::InvalidKey)?;
    let key = ed25519_dalek::VerifyingKey::from_bytes(&raw).map_err(|_| SigError::InvalidKey)?;
    Ok(VerificationKey {
        id: key_id.to_string(),
        controller: did.to_string(),
        key,
    })
}

/// Encode an Ed25519 public key as a `did:key:` identifier.
pub fn did_key(key: &ed25519_dalek::VerifyingKey) -> String {
    let mut bytes = Vec::with_capacity(34);
    bytes.extend_from_slice(&ED25519_MULTICODEC);
    bytes.extend_from_slice(key.as_bytes());
    format!("did:key:z{}", bs58::encode(bytes).into_string())
}

/// Verify an Ed25519 signature over the canonical signing string.
pub fn verify(
    key: &ed25519_dalek::VerifyingKey,
    message: &str,
    signature: &[u8],
) -> Result<(), SigError> {
    let signature =
        ed25519_dalek::Signature::from_slice(signature).map_err(|_| SigError::Verification)?;
    key.verify_strict(message.as_bytes(), &signature)
        .map_err(|_| SigError::Verification)
}

#[cfg(test)]
mod test {
    use super::*;
    use ed25519_dalek::Signer;

    fn signing_key() -> ed25519_dalek::SigningKey {
        ed25519_dalek::SigningKey::from_bytes(&[7u8; 32])
    }

    fn input(covered: &[&str]) -> SignatureInput {
        SignatureInput {
            key_id: did_key(&signing_key().verifying_key()),
            created: 1_700_000_000,
            expires: 1_700_000_600,
            covered: covered.iter().map(|s| s.to_string()).collect(),
            signature: vec![],
        }
    }

    #[test]
    fn test_parse_round_trip() {
        let mut original = input(&[
            "(key-id)",
            "(created)",
            "(expires)",
            "(request-target)",
            "host",
        ]);
        original.signature = vec![1, 2, 3, 4];

        let parsed = SignatureInput::parse(&original.to_header_value()).unwrap();
        assert_eq!(parsed.key_id, original.key_id);
        assert_eq!(parsed.created, original.created);
        assert_eq!(parsed.expires, original.expires);
        assert_eq!(parsed.covered, original.covered);
        assert_eq!(parsed.signature, original.signature);
    }

    #[test]
    fn test_parse_rejects_non_signature() {
        assert!(matches!(
            SignatureInput::parse("Bearer abc123"),
            Err(SigError::NotASignature)
        ));
    }

    #[test]
    fn test_parse_rejects_missing_params() {
        assert!(matches!(
            SignatureInput::parse(r#"Signature keyId="did:key:z6",signature="AA==""#),
            Err(SigError::MissingParam("created"))
        ));
    }

    #[test]
    fn test_coverage_requires_body_fields_only_with_body() {
        let sans_body = input(&[
            "(key-id)",
            "(created)",
            "(expires)",
            "(request-target)",
            "host",
        ]);
        sans_body.check_coverage(false).unwrap();
        assert!(matches!(
            sans_body.check_coverage(true),
            Err(SigError::MissingCovered("content-type"))
        ));

        let with_body = input(&[
            "(key-id)",
            "(created)",
            "(expires)",
            "(request-target)",
            "host",
            "content-type",
            "digest",
        ]);
        with_body.check_coverage(true).unwrap();
    }

    #[test]
    fn test_window() {
        let sig = input(&[]);
        sig.check_window(sig.created + 60).unwrap();
        // skew tolerated around both edges
        sig.check_window(sig.created - CLOCK_SKEW).unwrap();
        sig.check_window(sig.expires + CLOCK_SKEW).unwrap();
        assert!(matches!(
            sig.check_window(sig.created - CLOCK_SKEW - 1),
            Err(SigError::CreatedInFuture)
        ));
        assert!(matches!(
            sig.check_window(sig.expires + CLOCK_SKEW + 1),
            Err(SigError::Expired)
        ));
    }

    #[test]
    fn test_signing_string_layout() {
        let sig = input(&["(key-id)", "(created)", "(request-target)", "host"]);
        let mut headers = HeaderMap::new();
        headers.insert("host", "hub.example.com".parse().unwrap());

        let message = sig
            .signing_string("POST", "/data-hubs/z123/documents", &headers)
            .unwrap();
        assert_eq!(
            message,
            format!(
                "(key-id): {}\n(created): 1700000000\n(request-target): post /data-hubs/z123/documents\nhost: hub.example.com",
                sig.key_id
            )
        );
    }

    #[test]
    fn test_signing_string_missing_header() {
        let sig = input(&["host"]);
        let result = sig.signing_string("GET", "/", &HeaderMap::new());
        assert!(matches!(result, Err(SigError::MissingHeader(_))));
    }

    #[test]
    fn test_did_key_round_trip() {
        let key = signing_key().verifying_key();
        let did = did_key(&key);
        assert!(did.starts_with("did:key:z"));

        let resolved = resolve_key(&did).unwrap();
        assert_eq!(resolved.key, key);
        assert_eq!(resolved.controller, did);

        let with_fragment = format!("{}#{}", did, did.strip_prefix("did:key:").unwrap());
        let resolved = resolve_key(&with_fragment).unwrap();
        assert_eq!(resolved.controller, did);
        assert_eq!(resolved.id, with_fragment);
    }

    #[test]
    fn test_resolve_refuses_other_schemes() {
        assert!(matches!(
            resolve_key("https://example.com/keys/1"),
            Err(SigError::UnsupportedKeyScheme(_))
        ));
        assert!(matches!(
            resolve_key("did:web:example.com"),
            Err(SigError::UnsupportedKeyScheme(_))
        ));
    }

    #[test]
    fn test_verify_signature() {
        let key = signing_key();
        let message = "(created): 1\nhost: hub.example.com";
        let signature = key.sign(message.as_bytes());

        verify(&key.verifying_key(), message, &signature.to_bytes()).unwrap();
        assert!(matches!(
            verify(&key.verifying_key(), "tampered", &signature.to_bytes()),
            Err(SigError::Verification)
        ));
        let other = ed25519_dalek::SigningKey::from_bytes(&[9u8; 32]);
        assert!(matches!(
            verify(&other.verifying_key(), message, &signature.to_bytes()),
            Err(SigError::Verification)
        ));
    }
}
