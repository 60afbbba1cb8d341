//! One-shot flash messages stored in the session.
//!
//! Handlers push a message before redirecting; the next rendered page drains
//! and displays it.

use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use crate::models::session::keys;

/// Visual category of a flash message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashKind {
    Success,
    Error,
    Info,
}

impl FlashKind {
    /// CSS modifier used by templates.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
            Self::Info => "info",
        }
    }
}

/// A message to show once on the next page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub kind: FlashKind,
    pub message: String,
}

/// Queue a flash message in the session.
///
/// # Errors
///
/// Returns an error if the session cannot be read or written.
pub async fn push_flash(
    session: &Session,
    kind: FlashKind,
    message: impl Into<String>,
) -> Result<(), tower_sessions::session::Error> {
    let mut flashes: Vec<Flash> = session.get(keys::FLASH).await?.unwrap_or_default();
    flashes.push(Flash {
        kind,
        message: message.into(),
    });
    session.insert(keys::FLASH, flashes).await
}

/// Queue a flash message, logging instead of failing if the session is unavailable.
pub async fn flash(session: &Session, kind: FlashKind, message: impl Into<String>) {
    if let Err(e) = push_flash(session, kind, message).await {
        tracing::warn!(error = %e, "Failed to store flash message");
    }
}

/// Remove and return every queued flash message.
///
/// # Errors
///
/// Returns an error if the session cannot be read or written.
pub async fn take_flashes(session: &Session) -> Result<Vec<Flash>, tower_sessions::session::Error> {
    Ok(session
        .remove::<Vec<Flash>>(keys::FLASH)
        .await?
        .unwrap_or_default())
}
