//! Per-request layout context shared by every HTML page.

use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;

use storefinder_core::{StoreId, avatar_url};

use super::flash::{Flash, take_flashes};
use crate::db::UserRepository;
use crate::error::AppError;
use crate::models::session::{CurrentUser, keys};
use crate::state::AppState;

/// Avatar size in the navigation bar.
const NAV_AVATAR_SIZE: u32 = 32;

/// Everything the base layout needs: who is logged in, their hearts, flash
/// messages queued for this page, and the map key.
#[derive(Debug, Clone, Default)]
pub struct PageContext {
    pub user: Option<CurrentUser>,
    pub avatar: Option<String>,
    pub hearts: Vec<StoreId>,
    pub flashes: Vec<Flash>,
    pub maps_key: Option<String>,
    pub path: String,
}

impl PageContext {
    /// Whether the current user has hearted `store_id`.
    #[must_use]
    pub fn is_hearted(&self, store_id: StoreId) -> bool {
        self.hearts.contains(&store_id)
    }

    /// Number of hearted stores, shown in the navigation bar.
    #[must_use]
    pub fn heart_count(&self) -> usize {
        self.hearts.len()
    }

    /// Whether the current path is `prefix` or below it.
    #[must_use]
    pub fn is_active(&self, prefix: &str) -> bool {
        self.path == prefix
            || self
                .path
                .strip_prefix(prefix)
                .is_some_and(|rest| rest.starts_with('/'))
    }
}

impl FromRequestParts<AppState> for PageContext {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let mut page = Self {
            maps_key: state.config().maps_key.clone(),
            path: parts.uri.path().to_owned(),
            ..Self::default()
        };

        let Some(session) = parts.extensions.get::<Session>() else {
            return Ok(page);
        };

        page.flashes = take_flashes(session)
            .await
            .map_err(|e| AppError::Internal(format!("session error: {e}")))?;

        page.user = session
            .get::<CurrentUser>(keys::CURRENT_USER)
            .await
            .ok()
            .flatten();

        if let Some(user) = &page.user {
            page.avatar = Some(avatar_url(&user.email, NAV_AVATAR_SIZE));
            page.hearts = UserRepository::new(state.pool()).heart_ids(user.id).await?;
        }

        Ok(page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_active_matches_prefix_segments() {
        let page = PageContext {
            path: "/tags/Wifi".to_owned(),
            ..PageContext::default()
        };
        assert!(page.is_active("/tags"));
        assert!(!page.is_active("/tag"));
        assert!(!page.is_active("/stores"));
    }

    #[test]
    fn test_hearts() {
        let page = PageContext {
            hearts: vec![StoreId::new(1), StoreId::new(3)],
            ..PageContext::default()
        };
        assert!(page.is_hearted(StoreId::new(3)));
        assert!(!page.is_hearted(StoreId::new(2)));
        assert_eq!(page.heart_count(), 2);
    }
}
