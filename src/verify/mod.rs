//! The verification collaborator seam.
//!
//! The gate does not know how a session is checked. It hands the request
//! cookies to a [`SessionVerifier`] and receives the outcome together with any
//! cookies the verifier wants written back.

use async_trait::async_trait;

use crate::cookies::{CookieInstruction, RequestCookies};
use crate::error::VerificationError;
use crate::session::Session;

pub type VerifyResult = Result<Option<Session>, VerificationError>;

/// Outcome of a single verification.
#[derive(Debug)]
pub struct Verification {
    pub result: VerifyResult,
    /// Cookies refreshed, rotated or revoked while verifying. Applied whatever
    /// the result is.
    pub set_cookies: Vec<CookieInstruction>,
}

impl Verification {
    pub fn new(result: VerifyResult) -> Self {
        Self {
            result,
            set_cookies: Vec::new(),
        }
    }

    pub fn authenticated(session: Session) -> Self {
        Self::new(Ok(Some(session)))
    }

    pub fn anonymous() -> Self {
        Self::new(Ok(None))
    }

    pub fn failed(error: VerificationError) -> Self {
        Self::new(Err(error))
    }

    pub fn with_cookie(mut self, instruction: CookieInstruction) -> Self {
        self.set_cookies.push(instruction);
        self
    }

    pub fn with_cookies(mut self, instructions: impl IntoIterator<Item = CookieInstruction>) -> Self {
        self.set_cookies.extend(instructions);
        self
    }
}

#[async_trait]
pub trait SessionVerifier: Send + Sync + std::fmt::Debug {
    /// Check the session the cookies refer to. Called at most once per request.
    async fn verify(&self, cookies: &RequestCookies) -> Verification;
}

#[async_trait]
impl<V> SessionVerifier for std::sync::Arc<V>
where
    V: SessionVerifier + ?Sized,
{
    async fn verify(&self, cookies: &RequestCookies) -> Verification {
        (**self).verify(cookies).await
    }
}
