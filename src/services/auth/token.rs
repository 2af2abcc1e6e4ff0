use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::repos::user_repo::UserRecord;

/// Fixed issuer embedded in every token this service signs.
pub const ISSUER: &str = "app-service";

#[derive(Debug, Error)]
pub enum TokenError {
    /// Unparseable, structurally wrong, or signed with a different key.
    #[error("malformed token: {0}")]
    Malformed(#[from] jsonwebtoken::errors::Error),

    /// The token parsed and verified, but the named claim is not present.
    #[error("missing claim: {0}")]
    ClaimAbsent(String),
}

/// Symmetric key for HS256 signing.
///
/// Generated once at process start and never persisted or rotated: every
/// token this process issues is verifiable only by this process instance.
#[derive(Clone)]
pub struct SigningKey(Vec<u8>);

impl SigningKey {
    pub fn generate() -> Self {
        let mut bytes = [0u8; 32];
        getrandom::fill(&mut bytes).expect("getrandom failed");
        Self::from_bytes(&bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }

    fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl std::fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Do not print key material
        f.debug_struct("SigningKey").finish_non_exhaustive()
    }
}

/// Claims carried by an issued token.
///
/// userId/userRole/userEmail are denormalized copies of the user record at
/// issuance time. Validation never reads them back; authorities always come
/// from a fresh store lookup.
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    iss: String,
    iat: i64,
    exp: i64,
    #[serde(rename = "userId")]
    user_id: i64,
    #[serde(rename = "userRole")]
    user_role: String,
    #[serde(rename = "userEmail")]
    user_email: String,
}

/// Issues and verifies HS256 bearer tokens.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl_seconds: i64,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Do not print key material
        f.debug_struct("TokenService")
            .field("validation", &self.validation)
            .field("ttl_seconds", &self.ttl_seconds)
            .finish()
    }
}

impl TokenService {
    pub fn new(key: &SigningKey, ttl_seconds: i64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[ISSUER]);
        // Expiry is checked explicitly (is_expired / is_valid) so that an
        // expired-but-well-formed token still parses for claim extraction.
        validation.validate_exp = false;

        Self {
            encoding_key: EncodingKey::from_secret(key.as_bytes()),
            decoding_key: DecodingKey::from_secret(key.as_bytes()),
            validation,
            ttl_seconds,
        }
    }

    pub fn ttl_seconds(&self) -> i64 {
        self.ttl_seconds
    }

    /// Sign a token for the given account snapshot. Expiration is fixed here
    /// at `now + ttl`; nothing about the token changes afterwards.
    pub fn issue(&self, user: &UserRecord) -> Result<String, TokenError> {
        let iat = Utc::now().timestamp();
        let claims = Claims {
            sub: user.email.clone(),
            iss: ISSUER.to_string(),
            iat,
            exp: iat + self.ttl_seconds,
            user_id: user.id,
            user_role: user.role.to_string(),
            user_email: user.email.clone(),
        };

        let token =
            jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?;

        Ok(token)
    }

    fn decode(&self, token: &str) -> Result<Claims, TokenError> {
        let data = jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &self.validation)?;
        Ok(data.claims)
    }

    /// Parse + signature-verify, then return the embedded subject.
    pub fn extract_subject(&self, token: &str) -> Result<String, TokenError> {
        Ok(self.decode(token)?.sub)
    }

    /// Generic claim projection (userId, userRole, userEmail, ...).
    pub fn extract_claim(&self, token: &str, name: &str) -> Result<serde_json::Value, TokenError> {
        let claims =
            jsonwebtoken::decode::<serde_json::Value>(token, &self.decoding_key, &self.validation)?
                .claims;

        claims
            .get(name)
            .cloned()
            .ok_or_else(|| TokenError::ClaimAbsent(name.to_string()))
    }

    /// Pure comparison of `exp` against the clock. Errs only when the token
    /// cannot be parsed at all.
    pub fn is_expired(&self, token: &str) -> Result<bool, TokenError> {
        let claims = self.decode(token)?;
        Ok(claims.exp < Utc::now().timestamp())
    }

    /// A token is valid for a candidate account iff it parses and
    /// signature-verifies, the subject equals the account's username
    /// (case-insensitively, tolerating email case variance), and it has not
    /// expired. Any failure is `false`, never an error.
    pub fn is_valid(&self, token: &str, user: &UserRecord) -> bool {
        match (self.extract_subject(token), self.is_expired(token)) {
            (Ok(subject), Ok(expired)) => {
                subject.eq_ignore_ascii_case(user.username()) && !expired
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repos::user_repo::Role;

    fn service(ttl_seconds: i64) -> TokenService {
        TokenService::new(&SigningKey::from_bytes(b"test-signing-key-0123456789abcd"), ttl_seconds)
    }

    fn alice() -> UserRecord {
        UserRecord {
            id: 7,
            email: "alice@example.com".to_string(),
            first_name: "Alice".to_string(),
            last_name: "Waters".to_string(),
            password_hash: "$2b$04$irrelevant".to_string(),
            role: Role::Admin,
            access_token: None,
        }
    }

    fn named(email: &str) -> UserRecord {
        UserRecord {
            email: email.to_string(),
            ..alice()
        }
    }

    #[test]
    fn subject_round_trips() {
        let svc = service(3600);
        let token = svc.issue(&alice()).unwrap();
        assert_eq!(svc.extract_subject(&token).unwrap(), "alice@example.com");
    }

    #[test]
    fn identity_claims_are_embedded() {
        let svc = service(3600);
        let token = svc.issue(&alice()).unwrap();
        assert_eq!(svc.extract_claim(&token, "userRole").unwrap(), "Admin");
        assert_eq!(svc.extract_claim(&token, "userId").unwrap(), 7);
        assert_eq!(
            svc.extract_claim(&token, "userEmail").unwrap(),
            "alice@example.com"
        );
        assert_eq!(svc.extract_claim(&token, "iss").unwrap(), ISSUER);
    }

    #[test]
    fn missing_claim_is_reported_as_absent() {
        let svc = service(3600);
        let token = svc.issue(&alice()).unwrap();
        assert!(matches!(
            svc.extract_claim(&token, "department"),
            Err(TokenError::ClaimAbsent(_))
        ));
    }

    #[test]
    fn fresh_token_is_not_expired() {
        let svc = service(3600);
        let token = svc.issue(&alice()).unwrap();
        assert!(!svc.is_expired(&token).unwrap());
    }

    #[test]
    fn token_past_its_ttl_is_expired() {
        // Expired 2 minutes ago.
        let svc = service(-120);
        let token = svc.issue(&alice()).unwrap();
        assert!(svc.is_expired(&token).unwrap());
    }

    #[test]
    fn expired_token_still_parses_for_claims() {
        let svc = service(-120);
        let token = svc.issue(&alice()).unwrap();
        assert_eq!(svc.extract_subject(&token).unwrap(), "alice@example.com");
        assert_eq!(svc.extract_claim(&token, "userRole").unwrap(), "Admin");
    }

    #[test]
    fn is_valid_matches_subject_case_insensitively() {
        let svc = service(3600);
        let token = svc.issue(&alice()).unwrap();
        assert!(svc.is_valid(&token, &named("ALICE@example.com")));
    }

    #[test]
    fn is_valid_rejects_a_different_subject() {
        let svc = service(3600);
        let token = svc.issue(&alice()).unwrap();
        assert!(!svc.is_valid(&token, &named("bob@example.com")));
    }

    #[test]
    fn is_valid_rejects_expired_tokens() {
        let svc = service(-120);
        let token = svc.issue(&alice()).unwrap();
        assert!(!svc.is_valid(&token, &alice()));
    }

    #[test]
    fn is_valid_rejects_garbage() {
        let svc = service(3600);
        assert!(!svc.is_valid("not.a.token", &alice()));
    }

    #[test]
    fn token_from_another_key_is_malformed() {
        let issuer = service(3600);
        let verifier =
            TokenService::new(&SigningKey::from_bytes(b"a-completely-different-key!!!!!"), 3600);
        let token = issuer.issue(&alice()).unwrap();
        assert!(matches!(
            verifier.extract_subject(&token),
            Err(TokenError::Malformed(_))
        ));
    }

    #[test]
    fn tampered_token_is_malformed() {
        let svc = service(3600);
        let token = svc.issue(&alice()).unwrap();
        // Flip a character in the middle of the payload section.
        let mut tampered = token.into_bytes();
        let mid = tampered.len() / 2;
        tampered[mid] = if tampered[mid] == b'x' { b'y' } else { b'x' };
        let tampered = String::from_utf8(tampered).unwrap();
        assert!(matches!(
            svc.extract_subject(&tampered),
            Err(TokenError::Malformed(_))
        ));
    }

    #[test]
    fn generated_keys_differ_between_processes() {
        // Two generated keys standing in for two process instances: a token
        // from one never verifies under the other.
        let a = TokenService::new(&SigningKey::generate(), 3600);
        let b = TokenService::new(&SigningKey::generate(), 3600);
        let token = a.issue(&alice()).unwrap();
        assert!(a.is_valid(&token, &alice()));
        assert!(!b.is_valid(&token, &alice()));
    }
}
