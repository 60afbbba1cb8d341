//! Store domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::ser::{SerializeStruct, Serializer};

use storefinder_core::{GeoPoint, Slug, StoreId, UserId};

/// Tags a store can be labelled with on the store form.
pub const TAG_CHOICES: &[&str] = &["Wifi", "Open Late", "Family Friendly", "Vegatarian", "Licensed"];

/// Where a store is: a point plus the human-readable address.
#[derive(Debug, Clone, PartialEq)]
pub struct Location {
    pub point: GeoPoint,
    pub address: String,
}

/// Serializes as a `GeoJSON`-style point with the address attached:
/// `{"type": "Point", "coordinates": [lng, lat], "address": "..."}`.
impl Serialize for Location {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Location", 3)?;
        state.serialize_field("type", "Point")?;
        state.serialize_field("coordinates", &self.point.coordinates())?;
        state.serialize_field("address", &self.address)?;
        state.end()
    }
}

/// A store listing (domain type).
#[derive(Debug, Clone)]
pub struct Store {
    pub id: StoreId,
    pub name: String,
    pub slug: Slug,
    pub description: String,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub location: Location,
    /// Uploaded photo filename, relative to the uploads directory.
    pub photo: Option<String>,
    pub author_id: UserId,
}

impl Store {
    /// Whether `user_id` authored this store.
    #[must_use]
    pub fn is_owned_by(&self, user_id: UserId) -> bool {
        self.author_id == user_id
    }
}

/// Public view of the user who created a store.
#[derive(Debug, Clone)]
pub struct StoreAuthor {
    pub id: UserId,
    pub name: String,
    pub avatar: String,
}

/// A tag and the number of stores carrying it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagCount {
    pub tag: String,
    pub count: i64,
}

/// Validated fields for creating or updating a store.
#[derive(Debug, Clone)]
pub struct StoreInput {
    pub name: String,
    pub description: String,
    pub tags: Vec<String>,
    pub location: Location,
    /// New photo filename. `None` keeps the existing photo on update.
    pub photo: Option<String>,
}

/// Unvalidated store form fields, as submitted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreForm {
    pub name: String,
    pub description: String,
    pub tags: Vec<String>,
    pub address: String,
    pub lng: String,
    pub lat: String,
}

impl StoreForm {
    /// Prefill the form from an existing store.
    #[must_use]
    pub fn from_store(store: &Store) -> Self {
        Self {
            name: store.name.clone(),
            description: store.description.clone(),
            tags: store.tags.clone(),
            address: store.location.address.clone(),
            lng: store.location.point.lng().to_string(),
            lat: store.location.point.lat().to_string(),
        }
    }

    /// Whether `tag` is ticked on the form.
    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Validate the form into a [`StoreInput`] without a photo.
    ///
    /// # Errors
    ///
    /// Returns every validation message when any field is invalid.
    pub fn validate(self) -> Result<StoreInput, Vec<String>> {
        let mut errors = Vec::new();

        let name = self.name.trim().to_owned();
        if name.is_empty() {
            errors.push("Please enter a store name!".to_owned());
        }

        let address = self.address.trim().to_owned();
        if address.is_empty() {
            errors.push("You must supply an address!".to_owned());
        }

        let point = match (
            self.lng.trim().parse::<f64>(),
            self.lat.trim().parse::<f64>(),
        ) {
            (Ok(lng), Ok(lat)) => match GeoPoint::new(lng, lat) {
                Ok(point) => Some(point),
                Err(e) => {
                    errors.push(format!("Invalid coordinates: {e}"));
                    None
                }
            },
            _ => {
                errors.push("You must supply coordinates!".to_owned());
                None
            }
        };

        let mut tags: Vec<String> = Vec::with_capacity(self.tags.len());
        for tag in self.tags {
            let tag = tag.trim();
            if !tag.is_empty() && !tags.iter().any(|t| t == tag) {
                tags.push(tag.to_owned());
            }
        }

        match point {
            Some(point) if errors.is_empty() => Ok(StoreInput {
                name,
                description: self.description.trim().to_owned(),
                tags,
                location: Location { point, address },
                photo: None,
            }),
            _ => Err(errors),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn form() -> StoreForm {
        StoreForm {
            name: "  Wes's Coffee ".to_owned(),
            description: " Great beans ".to_owned(),
            tags: vec!["Wifi".to_owned(), "Wifi".to_owned(), String::new()],
            address: "1 King St W, Hamilton".to_owned(),
            lng: "-79.8".to_owned(),
            lat: "43.2".to_owned(),
        }
    }

    #[test]
    fn test_validate_trims_and_dedupes_tags() {
        let input = form().validate().unwrap();
        assert_eq!(input.name, "Wes's Coffee");
        assert_eq!(input.description, "Great beans");
        assert_eq!(input.tags, vec!["Wifi".to_owned()]);
        assert_eq!(input.location.point.coordinates(), [-79.8, 43.2]);
        assert!(input.photo.is_none());
    }

    #[test]
    fn test_validate_collects_all_errors() {
        let errors = StoreForm::default().validate().unwrap_err();
        assert_eq!(
            errors,
            vec![
                "Please enter a store name!".to_owned(),
                "You must supply an address!".to_owned(),
                "You must supply coordinates!".to_owned(),
            ]
        );
    }

    #[test]
    fn test_validate_rejects_out_of_range_coordinates() {
        let mut form = form();
        form.lat = "95".to_owned();
        let errors = form.validate().unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].starts_with("Invalid coordinates"));
    }

    #[test]
    fn test_location_serializes_as_point() {
        let location = Location {
            point: GeoPoint::new(-79.8, 43.2).unwrap(),
            address: "Hamilton".to_owned(),
        };
        let json = serde_json::to_value(&location).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "type": "Point",
                "coordinates": [-79.8, 43.2],
                "address": "Hamilton",
            })
        );
    }
}
