//! Tag route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, State},
    response::IntoResponse,
};

use super::views::{StoreCard, TagLink};
use crate::db::StoreRepository;
use crate::error::Result;
use crate::filters;
use crate::middleware::PageContext;
use crate::state::AppState;

/// Tags page: tag counts plus the stores carrying the selected tag.
#[derive(Template, WebTemplate)]
#[template(path = "tags.html")]
pub struct TagsTemplate {
    pub page: PageContext,
    pub active_tag: Option<String>,
    pub tags: Vec<TagLink>,
    pub stores: Vec<StoreCard>,
}

/// All tags with every store.
pub async fn index(State(state): State<AppState>, page: PageContext) -> Result<impl IntoResponse> {
    render(&state, page, None).await
}

/// All tags with the stores carrying `tag`.
pub async fn show(
    State(state): State<AppState>,
    page: PageContext,
    Path(tag): Path<String>,
) -> Result<impl IntoResponse> {
    render(&state, page, Some(tag)).await
}

async fn render(
    state: &AppState,
    page: PageContext,
    active_tag: Option<String>,
) -> Result<TagsTemplate> {
    let stores = StoreRepository::new(state.pool());

    let (tags, matching) = tokio::try_join!(
        stores.tag_counts(),
        stores.list_by_tag(active_tag.as_deref()),
    )?;

    Ok(TagsTemplate {
        tags: TagLink::many(tags, active_tag.as_deref()),
        stores: StoreCard::many(&matching, &page),
        active_tag,
        page,
    })
}
