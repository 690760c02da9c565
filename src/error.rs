//! Errors raised while verifying a session.
//!
//! Verification failures never reach the caller as an error response. The
//! gate logs them and folds them into its decision: protected paths fail
//! closed, the login entry point fails open.

use custom_error::custom_error;

use crate::oidc::introspection::IntrospectionError;

custom_error! {
    pub VerificationError
        Introspection{source: IntrospectionError} = "session introspection failed: {source}",
        Refresh{cause: IntrospectionError} = "session refresh failed: {cause}",
        Timeout = "session verification timed out",
        Backend{message: String} = "session backend unavailable: {message}",
}

impl VerificationError {
    pub fn backend(message: impl Into<String>) -> Self {
        VerificationError::Backend {
            message: message.into(),
        }
    }
}
