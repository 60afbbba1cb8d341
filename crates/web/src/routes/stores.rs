//! Store route handlers.
//!
//! Listing, the add/edit form (multipart with an optional photo), the store
//! page, the map page, and the current user's hearted stores.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Multipart, Path, State},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;
use tracing::instrument;

use storefinder_core::StoreId;

use super::views::{StoreCard, StoreDetail, photo_url};
use crate::db::{StoreRepository, UserRepository};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::filters;
use crate::middleware::{Flash, FlashKind, PageContext, RequireAuth, flash};
use crate::models::{CurrentUser, Store, StoreForm, StoreInput, TAG_CHOICES};
use crate::services::uploads::{PhotoUpload, UploadError, discard_photo, save_photo};
use crate::state::AppState;

/// Message shown when someone other than the author edits a store.
pub const NOT_OWNER_MESSAGE: &str = "You must own a store in order to edit it!";

// =============================================================================
// Templates
// =============================================================================

/// Store grid page (all stores, or the user's hearts).
#[derive(Template, WebTemplate)]
#[template(path = "stores.html")]
pub struct StoresTemplate {
    pub page: PageContext,
    pub title: String,
    pub stores: Vec<StoreCard>,
}

/// Single store page.
#[derive(Template, WebTemplate)]
#[template(path = "store.html")]
pub struct StoreTemplate {
    pub page: PageContext,
    pub store: StoreDetail,
}

/// Add/edit store form.
#[derive(Template, WebTemplate)]
#[template(path = "edit_store.html")]
pub struct EditStoreTemplate {
    pub page: PageContext,
    pub title: String,
    pub action: String,
    pub form: StoreForm,
    pub photo_url: Option<String>,
    pub view_url: Option<String>,
    pub tag_choices: &'static [&'static str],
}

impl EditStoreTemplate {
    fn add(page: PageContext, form: StoreForm) -> Self {
        Self {
            page,
            title: "Add Store".to_owned(),
            action: "/add".to_owned(),
            form,
            photo_url: None,
            view_url: None,
            tag_choices: TAG_CHOICES,
        }
    }

    fn edit(page: PageContext, store: &Store, form: StoreForm) -> Self {
        Self {
            page,
            title: format!("Edit {}", store.name),
            action: format!("/add/{}", store.id),
            form,
            photo_url: store.photo.as_deref().map(|p| photo_url(Some(p))),
            view_url: Some(format!("/store/{}", store.slug)),
            tag_choices: TAG_CHOICES,
        }
    }
}

/// Map page.
#[derive(Template, WebTemplate)]
#[template(path = "map.html")]
pub struct MapTemplate {
    pub page: PageContext,
}

// =============================================================================
// Form Parsing
// =============================================================================

/// Read the store form fields and the optional photo from a multipart body.
async fn read_store_form(mut multipart: Multipart) -> Result<(StoreForm, Option<PhotoUpload>)> {
    let mut form = StoreForm::default();
    let mut photo = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.body_text()))?
    {
        let name = field.name().unwrap_or_default().to_owned();

        if name == "photo" {
            let has_file = field.file_name().is_some_and(|f| !f.is_empty());
            let content_type = field.content_type().unwrap_or_default().to_owned();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::BadRequest(e.body_text()))?;
            if has_file && !bytes.is_empty() {
                photo = Some(PhotoUpload {
                    content_type,
                    bytes: bytes.to_vec(),
                });
            }
            continue;
        }

        let value = field
            .text()
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;
        match name.as_str() {
            "name" => form.name = value,
            "description" => form.description = value,
            "tags" => form.tags.push(value),
            "address" => form.address = value,
            "lng" => form.lng = value,
            "lat" => form.lat = value,
            _ => {}
        }
    }

    Ok((form, photo))
}

/// Validate the form and upload type together, then store the photo.
///
/// Returns the messages to show when anything is invalid; nothing is written
/// to disk in that case.
async fn prepare_input(
    state: &AppState,
    form: StoreForm,
    upload: Option<PhotoUpload>,
) -> Result<std::result::Result<StoreInput, Vec<String>>> {
    let upload_error = upload
        .as_ref()
        .and_then(|u| u.filename().err())
        .map(|e| e.to_string());

    let mut input = match (form.validate(), upload_error) {
        (Ok(input), None) => input,
        (result, upload_error) => {
            let mut errors = result.err().unwrap_or_default();
            errors.extend(upload_error);
            return Ok(Err(errors));
        }
    };

    if let Some(upload) = upload {
        match save_photo(&state.config().uploads_dir, upload).await {
            Ok(filename) => input.photo = Some(filename),
            Err(e @ (UploadError::UnsupportedFormat(_) | UploadError::Image(_))) => {
                tracing::info!(error = %e, "Rejected unreadable photo");
                return Ok(Err(vec!["That image could not be read".to_owned()]));
            }
            Err(e) => return Err(e.into()),
        }
    }

    Ok(Ok(input))
}

/// Remove the photo stored for `input` after the database rejected it.
async fn discard_new_photo(state: &AppState, input: &StoreInput) {
    if let Some(photo) = &input.photo {
        discard_photo(&state.config().uploads_dir, photo).await;
    }
}

/// Show validation messages on the re-rendered form.
fn with_errors(mut page: PageContext, errors: Vec<String>) -> PageContext {
    page.flashes.extend(errors.into_iter().map(|message| Flash {
        kind: FlashKind::Error,
        message,
    }));
    page
}

/// Load a store and check the current user authored it.
async fn owned_store(state: &AppState, id: StoreId, user: &CurrentUser) -> Result<Store> {
    let store = StoreRepository::new(state.pool())
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("store {id}")))?;

    if !store.is_owned_by(user.id) {
        return Err(AppError::Forbidden(NOT_OWNER_MESSAGE.to_owned()));
    }

    Ok(store)
}

// =============================================================================
// Handlers
// =============================================================================

/// List all stores, newest first.
#[instrument(skip_all)]
pub async fn index(State(state): State<AppState>, page: PageContext) -> Result<impl IntoResponse> {
    let stores = StoreRepository::new(state.pool()).list().await?;

    Ok(StoresTemplate {
        title: "Stores".to_owned(),
        stores: StoreCard::many(&stores, &page),
        page,
    })
}

/// Show an empty store form.
pub async fn add_page(RequireAuth(_user): RequireAuth, page: PageContext) -> impl IntoResponse {
    EditStoreTemplate::add(page, StoreForm::default())
}

/// Create a store from the submitted form.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    session: Session,
    page: PageContext,
    multipart: Multipart,
) -> Result<Response> {
    let (form, upload) = read_store_form(multipart).await?;

    let input = match prepare_input(&state, form.clone(), upload).await? {
        Ok(input) => input,
        Err(errors) => {
            return Ok(EditStoreTemplate::add(with_errors(page, errors), form).into_response());
        }
    };

    let store = match StoreRepository::new(state.pool())
        .create(&input, user.id)
        .await
    {
        Ok(store) => store,
        Err(e) => {
            discard_new_photo(&state, &input).await;
            return Err(e.into());
        }
    };

    let store_id = store.id.to_string();
    add_breadcrumb("stores", "Created store", Some(&[("store_id", store_id.as_str())]));
    tracing::info!(store_id = %store.id, slug = %store.slug, "Store created");

    flash(
        &session,
        FlashKind::Success,
        format!("Successfully created {}. Care to leave a review?", store.name),
    )
    .await;
    Ok(Redirect::to(&format!("/store/{}", store.slug)).into_response())
}

/// Show the edit form for a store the current user owns.
pub async fn edit_page(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    page: PageContext,
    Path(id): Path<StoreId>,
) -> Result<impl IntoResponse> {
    let store = owned_store(&state, id, &user).await?;
    let form = StoreForm::from_store(&store);
    Ok(EditStoreTemplate::edit(page, &store, form))
}

/// Update a store the current user owns.
#[instrument(skip_all, fields(user_id = %user.id, store_id = %id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    session: Session,
    page: PageContext,
    Path(id): Path<StoreId>,
    multipart: Multipart,
) -> Result<Response> {
    let current = owned_store(&state, id, &user).await?;
    let (form, upload) = read_store_form(multipart).await?;

    let input = match prepare_input(&state, form.clone(), upload).await? {
        Ok(input) => input,
        Err(errors) => {
            let template = EditStoreTemplate::edit(with_errors(page, errors), &current, form);
            return Ok(template.into_response());
        }
    };

    let store = match StoreRepository::new(state.pool()).update(id, &input).await {
        Ok(store) => store,
        Err(e) => {
            discard_new_photo(&state, &input).await;
            return Err(e.into());
        }
    };
    tracing::info!(slug = %store.slug, "Store updated");

    flash(
        &session,
        FlashKind::Success,
        format!("Successfully updated {}.", store.name),
    )
    .await;
    Ok(Redirect::to(&format!("/stores/{}/edit", store.id)).into_response())
}

/// Show a single store with its author.
pub async fn show(
    State(state): State<AppState>,
    page: PageContext,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse> {
    let (store, author) = StoreRepository::new(state.pool())
        .get_by_slug_with_author(&slug)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("store {slug}")))?;

    Ok(StoreTemplate {
        store: StoreDetail::new(&store, author, &page),
        page,
    })
}

/// Show the map page.
pub async fn map_page(page: PageContext) -> impl IntoResponse {
    MapTemplate { page }
}

/// List the stores the current user has hearted.
pub async fn hearts(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    page: PageContext,
) -> Result<impl IntoResponse> {
    let ids = UserRepository::new(state.pool()).heart_ids(user.id).await?;
    let stores = StoreRepository::new(state.pool()).list_by_ids(&ids).await?;

    Ok(StoresTemplate {
        title: "Hearted Stores".to_owned(),
        stores: StoreCard::many(&stores, &page),
        page,
    })
}
