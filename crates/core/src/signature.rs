//! Request authenticity checks for Slack's signed HTTP callbacks.
//!
//! Slack signs every request as `v0=hex(HMAC-SHA256(signing_secret, "v0:{timestamp}:{body}"))`
//! and sends the result in `X-Slack-Signature`, with the timestamp in
//! `X-Slack-Request-Timestamp`. The body must be hashed exactly as received.

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use thiserror::Error;

pub const TIMESTAMP_HEADER: &str = "x-slack-request-timestamp";
pub const SIGNATURE_HEADER: &str = "x-slack-signature";

const SIGNATURE_VERSION: &str = "v0";

type HmacSha256 = Hmac<Sha256>;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum VerificationError {
    #[error("missing `{0}` header")]
    MissingHeader(&'static str),
    #[error("malformed request timestamp `{0}`")]
    MalformedTimestamp(String),
    #[error("request timestamp is outside the {max_skew_secs}s tolerance window")]
    StaleTimestamp { max_skew_secs: u64 },
    #[error("malformed signature header")]
    MalformedSignature,
    #[error("request signature mismatch")]
    SignatureMismatch,
    #[error("verification token mismatch")]
    TokenMismatch,
}

#[derive(Clone, Debug)]
pub struct SignatureVerifier {
    signing_secret: SecretString,
    max_clock_skew_secs: u64,
}

impl SignatureVerifier {
    pub fn new(signing_secret: SecretString, max_clock_skew_secs: u64) -> Self {
        Self { signing_secret, max_clock_skew_secs }
    }

    /// Validates a signed request. `now_unix` is the current time in seconds since the epoch.
    pub fn verify(
        &self,
        timestamp: Option<&str>,
        signature: Option<&str>,
        body: &[u8],
        now_unix: i64,
    ) -> Result<(), VerificationError> {
        let timestamp =
            non_blank(timestamp).ok_or(VerificationError::MissingHeader(TIMESTAMP_HEADER))?;
        let signature =
            non_blank(signature).ok_or(VerificationError::MissingHeader(SIGNATURE_HEADER))?;

        let issued_at = timestamp
            .parse::<i64>()
            .map_err(|_| VerificationError::MalformedTimestamp(timestamp.to_owned()))?;
        if now_unix.abs_diff(issued_at) > self.max_clock_skew_secs {
            return Err(VerificationError::StaleTimestamp {
                max_skew_secs: self.max_clock_skew_secs,
            });
        }

        let provided = signature
            .strip_prefix(SIGNATURE_VERSION)
            .and_then(|rest| rest.strip_prefix('='))
            .ok_or(VerificationError::MalformedSignature)?;
        let provided = hex::decode(provided).map_err(|_| VerificationError::MalformedSignature)?;

        self.mac(timestamp, body)?
            .verify_slice(&provided)
            .map_err(|_| VerificationError::SignatureMismatch)
    }

    /// Produces the `X-Slack-Signature` value Slack would send for this body.
    pub fn sign(&self, timestamp: &str, body: &[u8]) -> Result<String, VerificationError> {
        let digest = self.mac(timestamp, body)?.finalize().into_bytes();
        Ok(format!("{SIGNATURE_VERSION}={}", hex::encode(digest)))
    }

    fn mac(&self, timestamp: &str, body: &[u8]) -> Result<HmacSha256, VerificationError> {
        let mut mac = HmacSha256::new_from_slice(self.signing_secret.expose_secret().as_bytes())
            .map_err(|_| VerificationError::SignatureMismatch)?;
        mac.update(SIGNATURE_VERSION.as_bytes());
        mac.update(b":");
        mac.update(timestamp.as_bytes());
        mac.update(b":");
        mac.update(body);
        Ok(mac)
    }
}

/// Compares the legacy verification token embedded in event envelopes.
pub fn verify_token(
    expected: &SecretString,
    provided: Option<&str>,
) -> Result<(), VerificationError> {
    let expected = expected.expose_secret();
    match provided {
        Some(token) if !expected.is_empty() && token == expected => Ok(()),
        _ => Err(VerificationError::TokenMismatch),
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use secrecy::SecretString;

    use super::{
        verify_token, SignatureVerifier, VerificationError, SIGNATURE_HEADER, TIMESTAMP_HEADER,
    };

    const NOW: i64 = 1_730_000_000;
    const BODY: &[u8] = br#"{"token":"vtok","type":"url_verification","challenge":"abc"}"#;

    fn verifier() -> SignatureVerifier {
        let secret = SecretString::from("8f742231b10e8888abcd99yyyzzz85a5".to_owned());
        SignatureVerifier::new(secret, 300)
    }

    #[test]
    fn accepts_signature_over_exact_body() {
        let verifier = verifier();
        let timestamp = NOW.to_string();
        let signature = verifier.sign(&timestamp, BODY).expect("sign");

        verifier.verify(Some(&timestamp), Some(&signature), BODY, NOW).expect("valid signature");
    }

    #[test]
    fn matches_slack_documented_example() {
        let verifier = verifier();
        let body = b"token=xyzz0WbapA4vBCDEFasx0q6G&team_id=T1DC2JH3J&team_domain=testteamnow&channel_id=G8PSS9T3V&channel_name=foobar&user_id=U2CERLKJA&user_name=roadrunner&command=%2Fwebhook-collect&text=&response_url=https%3A%2F%2Fhooks.slack.com%2Fcommands%2FT1DC2JH3J%2F397700885554%2F96rGlfmibIGlgcZRskXaIFfN&trigger_id=398738663015.47445629121.803a0bc887a14d10d2c447fce8b6703c";

        verifier
            .verify(
                Some("1531420618"),
                Some("v0=a2114d57b48eac39b9ad189dd8316235a7b4a8d21a10bd27519666489c69b503"),
                body,
                1_531_420_618,
            )
            .expect("documented example should verify");
    }

    #[test]
    fn rejects_reserialized_body() {
        let verifier = verifier();
        let timestamp = NOW.to_string();
        let signature = verifier.sign(&timestamp, BODY).expect("sign");
        let reserialized =
            br#"{"challenge":"abc","token":"vtok","type":"url_verification"}"#.to_vec();

        let error = verifier
            .verify(Some(&timestamp), Some(&signature), &reserialized, NOW)
            .expect_err("reordered body must not verify");
        assert_eq!(error, VerificationError::SignatureMismatch);
    }

    #[test]
    fn rejects_missing_headers() {
        let verifier = verifier();
        assert_eq!(
            verifier.verify(None, Some("v0=00"), BODY, NOW),
            Err(VerificationError::MissingHeader(TIMESTAMP_HEADER))
        );
        assert_eq!(
            verifier.verify(Some("1730000000"), Some("  "), BODY, NOW),
            Err(VerificationError::MissingHeader(SIGNATURE_HEADER))
        );
    }

    #[test]
    fn rejects_malformed_headers() {
        let verifier = verifier();
        assert!(matches!(
            verifier.verify(Some("yesterday"), Some("v0=00"), BODY, NOW),
            Err(VerificationError::MalformedTimestamp(_))
        ));
        assert_eq!(
            verifier.verify(Some("1730000000"), Some("v1=abcd"), BODY, NOW),
            Err(VerificationError::MalformedSignature)
        );
        assert_eq!(
            verifier.verify(Some("1730000000"), Some("v0=not-hex"), BODY, NOW),
            Err(VerificationError::MalformedSignature)
        );
    }

    #[test]
    fn rejects_stale_timestamp_even_with_valid_signature() {
        let verifier = verifier();
        let timestamp = (NOW - 301).to_string();
        let signature = verifier.sign(&timestamp, BODY).expect("sign");

        assert_eq!(
            verifier.verify(Some(&timestamp), Some(&signature), BODY, NOW),
            Err(VerificationError::StaleTimestamp { max_skew_secs: 300 })
        );
    }

    #[test]
    fn rejects_signature_from_other_secret() {
        let timestamp = NOW.to_string();
        let forged = SignatureVerifier::new(SecretString::from("other-secret".to_owned()), 300)
            .sign(&timestamp, BODY)
            .expect("sign");

        assert_eq!(
            verifier().verify(Some(&timestamp), Some(&forged), BODY, NOW),
            Err(VerificationError::SignatureMismatch)
        );
    }

    #[test]
    fn token_check_requires_exact_match() {
        let expected = SecretString::from("vtok".to_owned());
        assert_eq!(verify_token(&expected, Some("vtok")), Ok(()));
        assert_eq!(verify_token(&expected, Some("other")), Err(VerificationError::TokenMismatch));
        assert_eq!(verify_token(&expected, None), Err(VerificationError::TokenMismatch));
        assert_eq!(
            verify_token(&SecretString::from("".to_owned()), Some("")),
            Err(VerificationError::TokenMismatch)
        );
    }
}
