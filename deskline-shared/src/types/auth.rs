use chrono::{DateTime, TimeZone, Utc};
use jsonwebtoken::{decode, decode_header, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    #[default]
    User,
    Manager,
    Admin,
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UserRole::User => write!(f, "user"),
            UserRole::Manager => write!(f, "manager"),
            UserRole::Admin => write!(f, "admin"),
        }
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(UserRole::User),
            "manager" => Ok(UserRole::Manager),
            "admin" => Ok(UserRole::Admin),
            _ => Err(format!("unknown role: {s}")),
        }
    }
}

/// Profile of the signed-in user, stored alongside the bearer token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub role: UserRole,
}

/// The client-held session object persisted under the `session` storage key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    #[serde(alias = "access_token", alias = "accessToken")]
    pub token: String,
    #[serde(default)]
    pub user: Option<UserProfile>,
}

/// The subset of JWT claims the client cares about.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenClaims {
    #[serde(default)]
    pub exp: Option<i64>,
}

impl Session {
    pub fn new(token: impl Into<String>, user: Option<UserProfile>) -> Self {
        Self {
            token: token.into(),
            user,
        }
    }

    /// Expiry read from the token's `exp` claim.
    ///
    /// The signature is not checked; the backend remains the authority. Opaque
    /// (non-JWT) tokens and tokens without `exp` yield `None`.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        let header = decode_header(&self.token).ok()?;
        let mut validation = Validation::new(header.alg);
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        let data = decode::<TokenClaims>(&self.token, &DecodingKey::from_secret(&[]), &validation).ok()?;
        Utc.timestamp_opt(data.claims.exp?, 0).single()
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at() {
            Some(exp) => now >= exp,
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};

    fn token_with_exp(exp: i64) -> String {
        encode(
            &Header::default(),
            &serde_json::json!({ "sub": "7", "exp": exp }),
            &EncodingKey::from_secret(b"server-side-secret"),
        )
        .unwrap()
    }

    #[test]
    fn role_round_trip() {
        assert_eq!("Admin".parse::<UserRole>().unwrap(), UserRole::Admin);
        assert_eq!(UserRole::Manager.to_string(), "manager");
        assert!("guest".parse::<UserRole>().is_err());
    }

    #[test]
    fn expiry_is_read_without_the_secret() {
        let exp = Utc::now().timestamp() + 3600;
        let session = Session::new(token_with_exp(exp), None);
        assert_eq!(session.expires_at().unwrap().timestamp(), exp);
        assert!(!session.is_expired());
    }

    #[test]
    fn past_exp_is_expired() {
        let session = Session::new(token_with_exp(Utc::now().timestamp() - 10), None);
        assert!(session.is_expired());
    }

    #[test]
    fn opaque_token_never_expires_locally() {
        let session = Session::new("opaque-token-value", None);
        assert!(session.expires_at().is_none());
        assert!(!session.is_expired());
    }

    #[test]
    fn session_accepts_access_token_alias() {
        let session: Session = serde_json::from_str(
            r#"{"access_token":"abc","user":{"id":3,"name":"Ops","email":"ops@example.com","role":"admin"}}"#,
        )
        .unwrap();
        assert_eq!(session.token, "abc");
        assert_eq!(session.user.unwrap().role, UserRole::Admin);
    }

    #[test]
    fn expiry_is_read_for_any_algorithm_and_audience() {
        let exp = Utc::now().timestamp() - 60;
        let token = encode(
            &Header::new(Algorithm::HS384),
            &serde_json::json!({ "sub": "7", "aud": "deskline-admin", "exp": exp }),
            &EncodingKey::from_secret(b"server-side-secret"),
        )
        .unwrap();

        let session = Session::new(token, None);
        assert_eq!(session.expires_at().unwrap().timestamp(), exp);
        assert!(session.is_expired());
    }
}
