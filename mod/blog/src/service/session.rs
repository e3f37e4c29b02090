use argon2::Argon2;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use password_hash::{PasswordHash, PasswordVerifier};

use minstrel_core::new_id;
use minstrel_sql::Value;

use crate::model::{Claims, Session, TokenPair, User};
use crate::service::{BlogError, BlogService};

impl BlogService {
    /// Verify credentials and issue a JWT access token.
    ///
    /// Creates a session record so the token can be revoked on logout.
    pub fn login(&self, handle: &str, password: &str) -> Result<TokenPair, BlogError> {
        let Some((user, hash)) = self.find_user_by_handle(handle)? else {
            return Err(BlogError::Unauthorized("invalid credentials".into()));
        };

        let parsed = PasswordHash::new(&hash)
            .map_err(|e| BlogError::Internal(format!("stored hash unreadable: {}", e)))?;
        if Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_err()
        {
            return Err(BlogError::Unauthorized("invalid credentials".into()));
        }

        self.issue_token(&user)
    }

    /// Issue a JWT access token for a user, recording the session.
    pub fn issue_token(&self, user: &User) -> Result<TokenPair, BlogError> {
        let session_id = new_id();
        let now = chrono::Utc::now();
        let expires = now + chrono::Duration::seconds(self.config.access_token_ttl);

        let claims = Claims {
            sub: user.id.clone(),
            handle: user.handle.clone(),
            sid: session_id.clone(),
            iat: now.timestamp(),
            exp: expires.timestamp(),
        };

        let access_token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_bytes()),
        )
        .map_err(|e| BlogError::Internal(format!("JWT encode failed: {}", e)))?;

        let session = Session {
            id: session_id,
            user_id: user.id.clone(),
            issued_at: now.to_rfc3339(),
            expires_at: expires.to_rfc3339(),
            revoked: false,
        };

        self.insert_record(
            "sessions",
            &session.id,
            &session,
            &[
                ("user_id", Value::Text(session.user_id.clone())),
                ("revoked", Value::Integer(0)),
                ("issued_at", Value::Text(session.issued_at.clone())),
                ("expires_at", Value::Text(session.expires_at.clone())),
            ],
        )?;

        Ok(TokenPair {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in: self.config.access_token_ttl,
        })
    }

    /// Verify and decode a JWT access token.
    /// Returns the claims if valid and the session is not revoked.
    pub fn verify_token(&self, token: &str) -> Result<Claims, BlogError> {
        let mut validation = Validation::default();
        validation.validate_exp = true;

        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.jwt_secret.as_bytes()),
            &validation,
        )
        .map_err(|e| BlogError::Unauthorized(format!("invalid token: {}", e)))?;

        let claims = token_data.claims;

        if let Ok(session) = self.get_record::<Session>("sessions", &claims.sid) {
            if session.revoked {
                return Err(BlogError::Unauthorized("session has been revoked".into()));
            }
        }

        Ok(claims)
    }

    /// Revoke a session (its token becomes invalid).
    pub fn revoke_session(&self, session_id: &str) -> Result<(), BlogError> {
        let mut session: Session = self.get_record("sessions", session_id)?;
        session.revoked = true;

        self.update_record(
            "sessions",
            session_id,
            &session,
            &[("revoked", Value::Integer(1))],
        )?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::service::testutil::{register, test_service};
    use crate::service::BlogError;

    #[test]
    fn login_and_verify() {
        let (_tmp, svc) = test_service();
        let user = register(&svc, "alice");

        let tokens = svc.login("alice", "hunter2-secret").unwrap();
        assert!(!tokens.access_token.is_empty());
        assert_eq!(tokens.token_type, "Bearer");

        let claims = svc.verify_token(&tokens.access_token).unwrap();
        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.handle, "alice");
    }

    #[test]
    fn login_rejects_bad_credentials() {
        let (_tmp, svc) = test_service();
        register(&svc, "alice");

        let err = svc.login("alice", "wrong-password").unwrap_err();
        assert!(matches!(err, BlogError::Unauthorized(_)));

        let err = svc.login("nobody", "hunter2-secret").unwrap_err();
        assert!(matches!(err, BlogError::Unauthorized(_)));
    }

    #[test]
    fn revoked_session_is_rejected() {
        let (_tmp, svc) = test_service();
        register(&svc, "alice");

        let tokens = svc.login("alice", "hunter2-secret").unwrap();
        let claims = svc.verify_token(&tokens.access_token).unwrap();

        svc.revoke_session(&claims.sid).unwrap();
        assert!(svc.verify_token(&tokens.access_token).is_err());
    }

    #[test]
    fn garbage_token_is_rejected() {
        let (_tmp, svc) = test_service();
        assert!(svc.verify_token("this.is.not.a.valid.jwt").is_err());
    }
}
