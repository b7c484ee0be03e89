//! Firebase Identity Toolkit client: email/password sign-in and sign-up.

use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use tracing::info;

const IDENTITY_TOOLKIT_ROOT: &str = "https://identitytoolkit.googleapis.com/v1";

/// An authenticated identity. Vote operations require one; everything else
/// treats its absence as anonymous browsing.
#[derive(Debug, Clone)]
pub struct Session {
    pub uid: String,
    pub email: String,
    /// Bearer token for the document store.
    pub id_token: String,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Email already exists")]
    EmailExists,
    #[error("Invalid email address")]
    InvalidEmail,
    #[error("Password should be at least 6 characters")]
    WeakPassword,
    #[error("No account found with this email")]
    AccountNotFound,
    #[error("Incorrect password")]
    WrongPassword,
    #[error("Passwords do not match")]
    PasswordMismatch,
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("auth backend returned {status}: {code}")]
    Backend { status: u16, code: String },
}

impl AuthError {
    /// Message shown to the user. Known account conditions get specific
    /// wording; transport and unexpected backend failures stay generic.
    pub fn user_message(&self) -> String {
        match self {
            Self::Http(_) | Self::Backend { .. } => "An error occurred".to_string(),
            other => other.to_string(),
        }
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    #[serde(rename = "localId")]
    local_id: String,
    email: String,
    #[serde(rename = "idToken")]
    id_token: String,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

pub struct AuthClient {
    client: reqwest::Client,
    api_key: String,
}

impl AuthClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
        }
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let session = self.token_request("signInWithPassword", email, password).await?;
        info!(uid = %session.uid, "signed in");
        Ok(session)
    }

    /// Create an account. Password confirmation is checked before any
    /// network traffic.
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        confirm_password: &str,
    ) -> Result<Session, AuthError> {
        if password != confirm_password {
            return Err(AuthError::PasswordMismatch);
        }
        let session = self.token_request("signUp", email, password).await?;
        info!(uid = %session.uid, "account created");
        Ok(session)
    }

    async fn token_request(
        &self,
        endpoint: &str,
        email: &str,
        password: &str,
    ) -> Result<Session, AuthError> {
        let url = format!(
            "{IDENTITY_TOOLKIT_ROOT}/accounts:{endpoint}?key={}",
            self.api_key
        );
        let body = json!({
            "email": email,
            "password": password,
            "returnSecureToken": true,
        });
        let resp = self.client.post(&url).json(&body).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let code = resp
                .json::<ErrorBody>()
                .await
                .map(|b| b.error.message)
                .unwrap_or_default();
            return Err(map_backend_error(status.as_u16(), &code));
        }
        let token: TokenResponse = resp.json().await?;
        Ok(Session {
            uid: token.local_id,
            email: token.email,
            id_token: token.id_token,
        })
    }
}

/// Map an Identity Toolkit error message to the user-facing taxonomy.
///
/// Some codes arrive with a trailing explanation, e.g.
/// "WEAK_PASSWORD : Password should be at least 6 characters", so only the
/// leading token is matched.
fn map_backend_error(status: u16, message: &str) -> AuthError {
    let code = message.split_whitespace().next().unwrap_or_default();
    match code {
        "EMAIL_EXISTS" => AuthError::EmailExists,
        "INVALID_EMAIL" => AuthError::InvalidEmail,
        "WEAK_PASSWORD" => AuthError::WeakPassword,
        "EMAIL_NOT_FOUND" => AuthError::AccountNotFound,
        "INVALID_PASSWORD" => AuthError::WrongPassword,
        _ => AuthError::Backend {
            status,
            code: message.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_codes_map_to_specific_errors() {
        assert!(matches!(
            map_backend_error(400, "EMAIL_EXISTS"),
            AuthError::EmailExists
        ));
        assert!(matches!(
            map_backend_error(400, "INVALID_EMAIL"),
            AuthError::InvalidEmail
        ));
        assert!(matches!(
            map_backend_error(400, "EMAIL_NOT_FOUND"),
            AuthError::AccountNotFound
        ));
        assert!(matches!(
            map_backend_error(400, "INVALID_PASSWORD"),
            AuthError::WrongPassword
        ));
    }

    #[test]
    fn weak_password_matches_with_trailing_explanation() {
        let err = map_backend_error(400, "WEAK_PASSWORD : Password should be at least 6 characters");
        assert!(matches!(err, AuthError::WeakPassword));
        assert_eq!(
            err.user_message(),
            "Password should be at least 6 characters"
        );
    }

    #[test]
    fn unknown_code_stays_generic_for_the_user() {
        let err = map_backend_error(400, "TOO_MANY_ATTEMPTS_TRY_LATER");
        assert!(matches!(err, AuthError::Backend { .. }));
        assert_eq!(err.user_message(), "An error occurred");
    }

    #[test]
    fn specific_errors_render_user_wording() {
        assert_eq!(AuthError::EmailExists.user_message(), "Email already exists");
        assert_eq!(
            AuthError::InvalidEmail.user_message(),
            "Invalid email address"
        );
        assert_eq!(
            AuthError::AccountNotFound.user_message(),
            "No account found with this email"
        );
        assert_eq!(AuthError::WrongPassword.user_message(), "Incorrect password");
        assert_eq!(
            AuthError::PasswordMismatch.user_message(),
            "Passwords do not match"
        );
    }

    #[tokio::test]
    async fn sign_up_rejects_mismatched_confirmation_before_any_io() {
        let client = AuthClient::new("test-key");
        let err = client
            .sign_up("a@example.com", "hunter22", "hunter23")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::PasswordMismatch));
    }
}
