//! Who is calling.

use crate::error::{FolioError, Result, StoreContext};
use crate::gateway::AuthApi;
use crate::types::User;
use tracing::debug;

/// Whether the gateway currently holds an auth session.
pub async fn has_session<G: AuthApi + ?Sized>(gateway: &G) -> Result<bool> {
    let session = gateway.session().await.context("checking session")?;
    Ok(session.is_some())
}

/// The signed-in user, or [`FolioError::Unauthenticated`].
pub async fn require_user<G: AuthApi + ?Sized>(gateway: &G) -> Result<User> {
    match gateway.current_user().await.context("fetching current user")? {
        Some(user) => {
            debug!(user_id = %user.id, "authenticated");
            Ok(user)
        }
        None => Err(FolioError::Unauthenticated),
    }
}
