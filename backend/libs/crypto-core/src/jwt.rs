/// JWT issuance and validation for the post service
///
/// Tokens are signed with RS256 only. Keys live in a `JwtKeys` value that the
/// service builds at startup and hands to whoever needs it; nothing here is
/// stored in process-global state.
///
/// ## Usage
///
/// ```rust,ignore
/// use crypto_core::jwt::{IdentityResolver, JwtKeys};
///
/// let keys = JwtKeys::from_rsa_pem(&private_pem, &public_pem)?;
/// let token = keys.issue_access_token(user_id, "user@example.com")?;
/// let resolved = keys.resolve_identity(&token.access_token)?;
/// assert_eq!(resolved, user_id);
/// ```
use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, TokenData,
    Validation,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const DEFAULT_ACCESS_TOKEN_TTL_SECS: i64 = 3600;

/// JWT algorithm - RS256 only, never a symmetric fallback
const JWT_ALGORITHM: Algorithm = Algorithm::RS256;

const ACCESS_TOKEN_TYPE: &str = "access";

// ============================================================================
// Data Structures
// ============================================================================

/// Claims carried by every token
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user ID as UUID string)
    pub sub: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Token type, only "access" is accepted for API calls
    pub token_type: String,
    /// Email address at issue time
    pub email: String,
}

/// Token returned to clients on sign-in
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

/// Failures while loading keys or signing
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    #[error("invalid RSA key: {0}")]
    InvalidKey(String),

    #[error("signing key not configured (validation-only keys)")]
    SigningKeyMissing,

    #[error("token signing failed: {0}")]
    Signing(String),
}

/// Why a credential did not resolve to an identity
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("missing credential")]
    MissingCredential,

    #[error("malformed token: {0}")]
    Malformed(String),

    #[error("token expired")]
    Expired,

    #[error("invalid token signature")]
    InvalidSignature,

    #[error("token type '{0}' cannot be used for API access")]
    WrongTokenType(String),
}

// ============================================================================
// Identity resolution seam
// ============================================================================

/// Resolves a bearer credential to the user it was issued for.
///
/// A valid, unexpired, correctly signed credential always resolves to the same
/// user id. Anything else yields an `AuthError` and no identity.
pub trait IdentityResolver: Send + Sync {
    fn resolve_identity(&self, credential: &str) -> Result<Uuid, AuthError>;
}

// ============================================================================
// Keys
// ============================================================================

/// RSA key material plus token lifetime
#[derive(Clone)]
pub struct JwtKeys {
    encoding: Option<EncodingKey>,
    decoding: DecodingKey,
    access_ttl: Duration,
}

impl std::fmt::Debug for JwtKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtKeys")
            .field("can_sign", &self.encoding.is_some())
            .field("access_ttl_secs", &self.access_ttl.num_seconds())
            .finish()
    }
}

impl JwtKeys {
    /// Build keys able to both sign and validate tokens
    pub fn from_rsa_pem(private_key_pem: &str, public_key_pem: &str) -> Result<Self, JwtError> {
        let encoding = EncodingKey::from_rsa_pem(private_key_pem.as_bytes())
            .map_err(|e| JwtError::InvalidKey(format!("private key: {e}")))?;
        let mut keys = Self::validation_only(public_key_pem)?;
        keys.encoding = Some(encoding);
        Ok(keys)
    }

    /// Build keys that can only validate tokens
    pub fn validation_only(public_key_pem: &str) -> Result<Self, JwtError> {
        let decoding = DecodingKey::from_rsa_pem(public_key_pem.as_bytes())
            .map_err(|e| JwtError::InvalidKey(format!("public key: {e}")))?;

        Ok(Self {
            encoding: None,
            decoding,
            access_ttl: Duration::seconds(DEFAULT_ACCESS_TOKEN_TTL_SECS),
        })
    }

    pub fn with_access_ttl(mut self, ttl: Duration) -> Self {
        self.access_ttl = ttl;
        self
    }

    pub fn access_ttl(&self) -> Duration {
        self.access_ttl
    }

    /// Issue an access token for a signed-in user
    pub fn issue_access_token(&self, user_id: Uuid, email: &str) -> Result<TokenResponse, JwtError> {
        let access_token = self.issue_token(user_id, email, ACCESS_TOKEN_TYPE, self.access_ttl)?;

        Ok(TokenResponse {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in: self.access_ttl.num_seconds(),
        })
    }

    pub(crate) fn issue_token(
        &self,
        user_id: Uuid,
        email: &str,
        token_type: &str,
        ttl: Duration,
    ) -> Result<String, JwtError> {
        let encoding_key = self.encoding.as_ref().ok_or(JwtError::SigningKeyMissing)?;

        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
            token_type: token_type.to_string(),
            email: email.to_string(),
        };

        encode(&Header::new(JWT_ALGORITHM), &claims, encoding_key)
            .map_err(|e| JwtError::Signing(e.to_string()))
    }

    /// Verify signature and expiry, returning the decoded claims
    pub fn validate_token(&self, token: &str) -> Result<TokenData<Claims>, AuthError> {
        let mut validation = Validation::new(JWT_ALGORITHM);
        validation.validate_exp = true;

        decode::<Claims>(token, &self.decoding, &validation).map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => AuthError::Expired,
            ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                AuthError::InvalidSignature
            }
            _ => AuthError::Malformed(e.to_string()),
        })
    }
}

impl IdentityResolver for JwtKeys {
    fn resolve_identity(&self, credential: &str) -> Result<Uuid, AuthError> {
        let credential = credential.trim();
        if credential.is_empty() {
            return Err(AuthError::MissingCredential);
        }

        let token_data = self.validate_token(credential)?;
        let claims = token_data.claims;

        if claims.token_type != ACCESS_TOKEN_TYPE {
            return Err(AuthError::WrongTokenType(claims.token_type));
        }

        let user_id = Uuid::parse_str(&claims.sub)
            .map_err(|e| AuthError::Malformed(format!("subject is not a user id: {e}")))?;
        if user_id.is_nil() {
            return Err(AuthError::Malformed("subject is the nil id".to_string()));
        }

        Ok(user_id)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{test_jwt_keys, TEST_PUBLIC_KEY};

    const OTHER_PUBLIC_KEY: &str = r#"-----BEGIN PUBLIC KEY-----
MIIBIjANBgkqhkiG9w0BAQEFAAOCAQ8AMIIBCgKCAQEAxmo26gia07qUe+1AEYWi
0EqoyaFi+tnyM2fesAbwhL+GTcX7EILtExZmpEU6m7mZnj+rVkSbq2tHsrtiuaTY
2lch5qfDQUMs6wDc6wLyneH8LOhqeN4DHnpIak0zt6Z8tN3HYZYbSN8fwSz4m/43
ArSykEo1YNpjNdDF8u+XFHjrrGZbdUd5eDrWv1pIxBi2jazbbwMJvCPWWULdH/zp
z6Ux1jNvaZ0Myn+VJ/iuGPKh6obtR0tjoZmTyWgB3nTwjbfj7AV5eb5FRFu62LI9
XrBie12d/MkXoeWu7g/m2KBFB+vc1ujLL0QIBzuKpNICDqjT5DCt+2lJ/7HMWMRp
sQIDAQAB
-----END PUBLIC KEY-----"#;

    #[test]
    fn test_issue_and_resolve_access_token() {
        let keys = test_jwt_keys();
        let user_id = Uuid::new_v4();

        let token = keys
            .issue_access_token(user_id, "test@example.com")
            .expect("Failed to issue token");

        assert_eq!(token.token_type, "Bearer");
        assert_eq!(token.expires_in, 3600);
        assert_eq!(token.access_token.matches('.').count(), 2);
        assert_eq!(keys.resolve_identity(&token.access_token), Ok(user_id));
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let keys = test_jwt_keys();
        let user_id = Uuid::new_v4();
        let token = keys.issue_access_token(user_id, "a@b.io").unwrap().access_token;

        for _ in 0..3 {
            assert_eq!(keys.resolve_identity(&token), Ok(user_id));
        }
    }

    #[test]
    fn test_empty_credential() {
        let keys = test_jwt_keys();
        assert_eq!(keys.resolve_identity("   "), Err(AuthError::MissingCredential));
    }

    #[test]
    fn test_garbage_token_is_malformed() {
        let keys = test_jwt_keys();
        assert!(matches!(
            keys.resolve_identity("invalid.token.here"),
            Err(AuthError::Malformed(_))
        ));
    }

    #[test]
    fn test_tampered_signature_rejected() {
        let keys = test_jwt_keys();
        let token = keys
            .issue_access_token(Uuid::new_v4(), "test@example.com")
            .unwrap()
            .access_token;

        let (head, signature) = token.rsplit_once('.').unwrap();
        let mut sig: Vec<char> = signature.chars().collect();
        sig[0] = if sig[0] == 'A' { 'B' } else { 'A' };
        let tampered = format!("{}.{}", head, sig.into_iter().collect::<String>());

        assert!(keys.resolve_identity(&tampered).is_err());
    }

    #[test]
    fn test_token_from_other_key_rejected() {
        let signer = test_jwt_keys();
        let verifier = JwtKeys::validation_only(OTHER_PUBLIC_KEY).unwrap();
        let token = signer
            .issue_access_token(Uuid::new_v4(), "test@example.com")
            .unwrap()
            .access_token;

        assert_eq!(
            verifier.resolve_identity(&token),
            Err(AuthError::InvalidSignature)
        );
    }

    #[test]
    fn test_expired_token_rejected() {
        let keys = test_jwt_keys();
        let token = keys
            .issue_token(
                Uuid::new_v4(),
                "test@example.com",
                ACCESS_TOKEN_TYPE,
                Duration::hours(-2),
            )
            .unwrap();

        assert_eq!(keys.resolve_identity(&token), Err(AuthError::Expired));
    }

    #[test]
    fn test_refresh_token_cannot_authenticate() {
        let keys = test_jwt_keys();
        let token = keys
            .issue_token(Uuid::new_v4(), "test@example.com", "refresh", Duration::days(30))
            .unwrap();

        assert_eq!(
            keys.resolve_identity(&token),
            Err(AuthError::WrongTokenType("refresh".to_string()))
        );
    }

    #[test]
    fn test_nil_subject_rejected() {
        let keys = test_jwt_keys();
        let token = keys.issue_access_token(Uuid::nil(), "x@y.io").unwrap().access_token;

        assert!(matches!(
            keys.resolve_identity(&token),
            Err(AuthError::Malformed(_))
        ));
    }

    #[test]
    fn test_validation_only_keys_cannot_sign() {
        let keys = JwtKeys::validation_only(TEST_PUBLIC_KEY).unwrap();
        assert!(matches!(
            keys.issue_access_token(Uuid::new_v4(), "x@y.io"),
            Err(JwtError::SigningKeyMissing)
        ));
    }

    #[test]
    fn test_custom_ttl_reported() {
        let keys = test_jwt_keys().with_access_ttl(Duration::minutes(5));
        let token = keys.issue_access_token(Uuid::new_v4(), "x@y.io").unwrap();
        assert_eq!(token.expires_in, 300);

        let claims = keys.validate_token(&token.access_token).unwrap().claims;
        assert_eq!(claims.exp - claims.iat, 300);
        assert_eq!(claims.email, "x@y.io");
    }

    #[test]
    fn test_invalid_pem_rejected() {
        assert!(matches!(
            JwtKeys::validation_only("not a key"),
            Err(JwtError::InvalidKey(_))
        ));
    }
}
