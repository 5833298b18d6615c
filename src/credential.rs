//! Session credential (PMT) issuance and validation
//!
//! Credentials are compact HS256 tokens (`header.payload.signature`, each
//! segment base64url without padding). The payload carries the consented
//! mode, the budget snapshot at handshake time, and an expiry in unix
//! seconds. Validation is a pure function of the token, the secret, and the
//! current time.

use crate::ledger::RiskBudget;
use crate::state_machine::Mode;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

const ALGORITHM: &str = "HS256";

/// Claims signed into a credential
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialClaims {
    pub mode: Mode,
    pub risk_budget: RiskBudget,
    /// Expiry, unix seconds
    pub exp: i64,
}

impl CredentialClaims {
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Header {
    alg: String,
    typ: String,
}

/// Reasons a token is rejected. Callers only see valid/invalid; the reason
/// is logged.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CredentialError {
    #[error("signing key must not be empty")]
    InvalidKey,
    #[error("token is not three base64url segments")]
    Malformed,
    #[error("unsupported algorithm {0:?}")]
    UnsupportedAlgorithm(String),
    #[error("signature mismatch")]
    BadSignature,
    #[error("payload could not be decoded: {0}")]
    BadPayload(String),
    #[error("token expired at {0}")]
    Expired(i64),
}

/// Signs and verifies session credentials with a process-wide secret
#[derive(Clone)]
pub struct CredentialIssuer {
    mac: HmacSha256,
}

impl std::fmt::Debug for CredentialIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialIssuer").finish_non_exhaustive()
    }
}

impl CredentialIssuer {
    pub fn new(secret: &[u8]) -> Result<Self, CredentialError> {
        if secret.is_empty() {
            return Err(CredentialError::InvalidKey);
        }
        let mac = HmacSha256::new_from_slice(secret).map_err(|_| CredentialError::InvalidKey)?;
        Ok(Self { mac })
    }

    /// Issue a credential expiring `lifetime` from now
    pub fn issue(&self, mode: Mode, budget: RiskBudget, lifetime: Duration) -> String {
        self.issue_at(mode, budget, lifetime, Utc::now())
    }

    pub fn issue_at(
        &self,
        mode: Mode,
        budget: RiskBudget,
        lifetime: Duration,
        now: DateTime<Utc>,
    ) -> String {
        let exp = now
            .checked_add_signed(lifetime)
            .map_or(i64::MAX, |t| t.timestamp());
        let claims = CredentialClaims {
            mode,
            risk_budget: budget,
            exp,
        };
        let header = Header {
            alg: ALGORITHM.to_string(),
            typ: "JWT".to_string(),
        };

        // Both structs serialize infallibly: no maps with non-string keys
        let header = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&header).unwrap_or_default());
        let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims).unwrap_or_default());
        let signing_input = format!("{header}.{payload}");
        let signature = URL_SAFE_NO_PAD.encode(self.sign(signing_input.as_bytes()));

        format!("{signing_input}.{signature}")
    }

    /// Validate against the current time. Never fails loudly: any problem
    /// yields `None`.
    pub fn validate(&self, token: &str) -> Option<CredentialClaims> {
        self.validate_at(token, Utc::now())
    }

    pub fn validate_at(&self, token: &str, now: DateTime<Utc>) -> Option<CredentialClaims> {
        match self.verify(token, now) {
            Ok(claims) => Some(claims),
            Err(e) => {
                tracing::debug!(reason = %e, "Credential rejected");
                None
            }
        }
    }

    fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<CredentialClaims, CredentialError> {
        let mut parts = token.split('.');
        let (Some(header_b64), Some(payload_b64), Some(signature_b64), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(CredentialError::Malformed);
        };

        let header_json = URL_SAFE_NO_PAD
            .decode(header_b64)
            .map_err(|_| CredentialError::Malformed)?;
        let header: Header = serde_json::from_slice(&header_json)
            .map_err(|e| CredentialError::BadPayload(e.to_string()))?;
        if header.alg != ALGORITHM {
            return Err(CredentialError::UnsupportedAlgorithm(header.alg));
        }

        let signature = URL_SAFE_NO_PAD
            .decode(signature_b64)
            .map_err(|_| CredentialError::Malformed)?;
        let mut mac = self.mac.clone();
        mac.update(header_b64.as_bytes());
        mac.update(b".");
        mac.update(payload_b64.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| CredentialError::BadSignature)?;

        let payload_json = URL_SAFE_NO_PAD
            .decode(payload_b64)
            .map_err(|_| CredentialError::Malformed)?;
        let claims: CredentialClaims = serde_json::from_slice(&payload_json)
            .map_err(|e| CredentialError::BadPayload(e.to_string()))?;

        if claims.exp <= now.timestamp() {
            return Err(CredentialError::Expired(claims.exp));
        }
        Ok(claims)
    }

    fn sign(&self, input: &[u8]) -> Vec<u8> {
        let mut mac = self.mac.clone();
        mac.update(input);
        mac.finalize().into_bytes().to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::RiskCategory;

    fn issuer() -> CredentialIssuer {
        CredentialIssuer::new(b"test-secret").unwrap()
    }

    fn budget() -> RiskBudget {
        RiskBudget::from_allocation([10, 7, 3, 0]).unwrap()
    }

    #[test]
    fn test_empty_secret_rejected() {
        assert_eq!(
            CredentialIssuer::new(b"").unwrap_err(),
            CredentialError::InvalidKey
        );
    }

    #[test]
    fn test_valid_token_returns_exact_payload() {
        let now = Utc::now();
        let token = issuer().issue_at(Mode::Simulation, budget(), Duration::hours(4), now);

        let claims = issuer().validate_at(&token, now).unwrap();
        assert_eq!(claims.mode, Mode::Simulation);
        assert_eq!(claims.risk_budget, budget());
        assert_eq!(claims.risk_budget.get(RiskCategory::ParadoxExposure), 0);
        assert_eq!(claims.exp, (now + Duration::hours(4)).timestamp());
    }

    #[test]
    fn test_token_has_three_segments() {
        let token = issuer().issue(Mode::Diagnostic, budget(), Duration::hours(1));
        assert_eq!(token.split('.').count(), 3);
        assert!(!token.contains('='));
    }

    #[test]
    fn test_expired_token_rejected() {
        let issued = Utc::now();
        let token = issuer().issue_at(Mode::Diagnostic, budget(), Duration::hours(1), issued);

        assert!(issuer()
            .validate_at(&token, issued + Duration::minutes(59))
            .is_some());
        assert_eq!(
            issuer()
                .verify(&token, issued + Duration::hours(1))
                .unwrap_err(),
            CredentialError::Expired((issued + Duration::hours(1)).timestamp())
        );
        assert!(issuer()
            .validate_at(&token, issued + Duration::hours(2))
            .is_none());
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let now = Utc::now();
        let token = issuer().issue_at(Mode::Diagnostic, budget(), Duration::hours(1), now);
        let parts: Vec<&str> = token.split('.').collect();

        let forged_claims = CredentialClaims {
            mode: Mode::Simulation,
            risk_budget: RiskBudget::full(),
            exp: (now + Duration::hours(1)).timestamp(),
        };
        let forged = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&forged_claims).unwrap());
        let tampered = format!("{}.{}.{}", parts[0], forged, parts[2]);

        assert_eq!(
            issuer().verify(&tampered, now).unwrap_err(),
            CredentialError::BadSignature
        );
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = issuer().issue(Mode::CoCreation, budget(), Duration::hours(1));
        let other = CredentialIssuer::new(b"another-secret").unwrap();
        assert!(other.validate(&token).is_none());
    }

    #[test]
    fn test_garbage_rejected() {
        let now = Utc::now();
        for token in ["", "abc", "a.b", "a.b.c.d", "!!!.@@@.###"] {
            assert!(issuer().validate_at(token, now).is_none(), "{token}");
        }
    }

    #[test]
    fn test_unsupported_algorithm_rejected() {
        let token = issuer().issue(Mode::CoCreation, budget(), Duration::hours(1));
        let parts: Vec<&str> = token.split('.').collect();
        let none_header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#);
        let forged = format!("{none_header}.{}.", parts[1]);
        assert_eq!(
            issuer().verify(&forged, Utc::now()).unwrap_err(),
            CredentialError::UnsupportedAlgorithm("none".to_string())
        );
    }

    #[test]
    fn test_indefinite_lifetime_does_not_overflow() {
        let lifetime = crate::state_machine::CredentialLifetime::Indefinite.duration();
        let token = issuer().issue(Mode::ConsensusSafe, budget(), lifetime);
        let claims = issuer().validate(&token).unwrap();
        assert!(claims.expires_at().is_some());
    }
}
