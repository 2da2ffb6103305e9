//! Connect-key handshake collaborator.

use async_trait::async_trait;

use crate::result::AppResult;

/// Performs the request/response round trip that yields a one-time connect
/// key binding the realtime connection to an authenticated session.
#[async_trait]
pub trait HandshakeClient: Send + Sync + std::fmt::Debug + 'static {
    /// Fetch a fresh connect key. Called once per connect attempt.
    async fn fetch_connect_key(&self, cookie_header: Option<&str>) -> AppResult<String>;
}
