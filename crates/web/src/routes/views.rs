//! View models passed to templates.
//!
//! Templates only read precomputed fields, so formatting and per-user state
//! are decided here.

use serde::Serialize;

use storefinder_core::{Slug, StoreId};

use crate::middleware::PageContext;
use crate::models::{Location, Store, StoreAuthor, TagCount};

/// Words kept in a store card's description excerpt.
const EXCERPT_WORDS: usize = 25;

/// Image shown for stores without a photo.
pub const PLACEHOLDER_PHOTO: &str = "/static/images/store.svg";

/// Public URL of a store's photo (or the placeholder).
#[must_use]
pub fn photo_url(photo: Option<&str>) -> String {
    photo.map_or_else(|| PLACEHOLDER_PHOTO.to_owned(), |p| format!("/uploads/{p}"))
}

/// First `words` words of `text`, with an ellipsis when truncated.
#[must_use]
pub fn excerpt(text: &str, words: usize) -> String {
    let mut parts = text.split_whitespace();
    let kept: Vec<&str> = parts.by_ref().take(words).collect();
    let mut out = kept.join(" ");
    if parts.next().is_some() {
        out.push_str("...");
    }
    out
}

/// A store in a grid of cards.
#[derive(Debug, Clone)]
pub struct StoreCard {
    pub id: StoreId,
    pub name: String,
    pub slug: String,
    pub excerpt: String,
    pub photo_url: String,
    pub hearted: bool,
    pub editable: bool,
}

impl StoreCard {
    #[must_use]
    pub fn new(store: &Store, page: &PageContext) -> Self {
        Self {
            id: store.id,
            name: store.name.clone(),
            slug: store.slug.to_string(),
            excerpt: excerpt(&store.description, EXCERPT_WORDS),
            photo_url: photo_url(store.photo.as_deref()),
            hearted: page.is_hearted(store.id),
            editable: page.user.as_ref().is_some_and(|u| store.is_owned_by(u.id)),
        }
    }

    /// Cards for a list of stores.
    #[must_use]
    pub fn many(stores: &[Store], page: &PageContext) -> Vec<Self> {
        stores.iter().map(|s| Self::new(s, page)).collect()
    }
}

/// A single store page.
#[derive(Debug, Clone)]
pub struct StoreDetail {
    pub id: StoreId,
    pub name: String,
    pub description: String,
    pub tags: Vec<String>,
    pub address: String,
    pub photo_url: String,
    pub static_map_url: Option<String>,
    pub author: StoreAuthor,
    pub hearted: bool,
    pub editable: bool,
}

impl StoreDetail {
    #[must_use]
    pub fn new(store: &Store, author: StoreAuthor, page: &PageContext) -> Self {
        Self {
            id: store.id,
            name: store.name.clone(),
            description: store.description.clone(),
            tags: store.tags.clone(),
            address: store.location.address.clone(),
            photo_url: photo_url(store.photo.as_deref()),
            static_map_url: page
                .maps_key
                .as_deref()
                .map(|key| static_map_url(&store.location, key)),
            author,
            hearted: page.is_hearted(store.id),
            editable: page.user.as_ref().is_some_and(|u| store.is_owned_by(u.id)),
        }
    }
}

/// Google Static Maps image centered on a store.
fn static_map_url(location: &Location, key: &str) -> String {
    let (lat, lng) = (location.point.lat(), location.point.lng());
    format!(
        "https://maps.googleapis.com/maps/api/staticmap?center={lat},{lng}\
         &zoom=14&size=800x150&scale=2&markers={lat},{lng}&key={key}"
    )
}

/// A tag link on the tags page.
#[derive(Debug, Clone)]
pub struct TagLink {
    pub tag: String,
    pub count: i64,
    pub active: bool,
}

impl TagLink {
    #[must_use]
    pub fn many(tags: Vec<TagCount>, active: Option<&str>) -> Vec<Self> {
        tags.into_iter()
            .map(|t| Self {
                active: active == Some(t.tag.as_str()),
                tag: t.tag,
                count: t.count,
            })
            .collect()
    }
}

/// JSON shape of a store in API responses.
#[derive(Debug, Clone, Serialize)]
pub struct StoreSummary {
    pub slug: Slug,
    pub name: String,
    pub description: String,
    pub location: Location,
    pub photo: Option<String>,
}

impl From<Store> for StoreSummary {
    fn from(store: Store) -> Self {
        Self {
            slug: store.slug,
            name: store.name,
            description: store.description,
            location: store.location,
            photo: store.photo,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;

    use storefinder_core::{Email, GeoPoint, UserId};

    use super::*;
    use crate::models::CurrentUser;

    fn store() -> Store {
        Store {
            id: StoreId::new(4),
            name: "Wes's Coffee".to_owned(),
            slug: Slug::from_name("Wes's Coffee"),
            description: "Great beans".to_owned(),
            tags: vec!["Wifi".to_owned()],
            created_at: Utc::now(),
            location: Location {
                point: GeoPoint::new(-79.8, 43.2).unwrap(),
                address: "Hamilton".to_owned(),
            },
            photo: None,
            author_id: UserId::new(1),
        }
    }

    #[test]
    fn test_excerpt() {
        assert_eq!(excerpt("one two three", 5), "one two three");
        assert_eq!(excerpt("one  two\nthree four", 2), "one two...");
        assert_eq!(excerpt("", 3), "");
    }

    #[test]
    fn test_photo_url() {
        assert_eq!(photo_url(Some("a.jpeg")), "/uploads/a.jpeg");
        assert_eq!(photo_url(None), PLACEHOLDER_PHOTO);
    }

    #[test]
    fn test_store_card_reflects_viewer() {
        let guest = StoreCard::new(&store(), &PageContext::default());
        assert!(!guest.hearted);
        assert!(!guest.editable);
        assert_eq!(guest.slug, "wess-coffee");

        let owner = PageContext {
            user: Some(CurrentUser {
                id: UserId::new(1),
                email: Email::parse("wes@example.com").unwrap(),
                name: "Wes".to_owned(),
            }),
            hearts: vec![StoreId::new(4)],
            ..PageContext::default()
        };
        let card = StoreCard::new(&store(), &owner);
        assert!(card.hearted);
        assert!(card.editable);
    }

    #[test]
    fn test_store_summary_json() {
        let json = serde_json::to_value(StoreSummary::from(store())).unwrap();
        assert_eq!(json["slug"], "wess-coffee");
        assert_eq!(json["location"]["type"], "Point");
        assert_eq!(json["location"]["coordinates"][0], -79.8);
        assert!(json["photo"].is_null());
    }

    #[test]
    fn test_tag_links_mark_active() {
        let links = TagLink::many(
            vec![
                TagCount {
                    tag: "Wifi".to_owned(),
                    count: 3,
                },
                TagCount {
                    tag: "Licensed".to_owned(),
                    count: 1,
                },
            ],
            Some("Licensed"),
        );
        assert!(!links[0].active);
        assert!(links[1].active);
    }
}
