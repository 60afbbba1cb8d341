//! Seed the database with sample users and stores.
//!
//! The YAML file lists users first, then stores referencing their author by
//! email:
//!
//! ```yaml
//! users:
//!   - name: Wes
//!     email: wes@example.com
//!     password: correct-horse-battery
//! stores:
//!   - name: Wes's Coffee
//!     description: Great beans.
//!     tags: [Wifi, Open Late]
//!     address: 1 King St W, Hamilton, ON
//!     lng: -79.8687
//!     lat: 43.2569
//!     author: wes@example.com
//! ```
//!
//! Users that already exist are reused. Stores are always inserted, so pass
//! `--clear` to replace a previous seed instead of duplicating it.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use tracing::{error, info};

use storefinder_core::{Email, UserId};
use storefinder_web::db::{StoreRepository, UserRepository};
use storefinder_web::models::StoreForm;
use storefinder_web::services::auth::{AuthService, Registration};

use super::connect;

/// Top-level seed file.
#[derive(Debug, Deserialize)]
pub struct SeedFile {
    #[serde(default)]
    pub users: Vec<SeedUser>,
    #[serde(default)]
    pub stores: Vec<SeedStore>,
}

/// A user to create.
#[derive(Debug, Deserialize)]
pub struct SeedUser {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// A store to create.
#[derive(Debug, Deserialize)]
pub struct SeedStore {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub address: String,
    pub lng: f64,
    pub lat: f64,
    /// Filename inside the uploads directory.
    #[serde(default)]
    pub photo: Option<String>,
    /// Author email; must match a seeded or existing user.
    pub author: String,
}

impl SeedStore {
    fn to_form(&self) -> StoreForm {
        StoreForm {
            name: self.name.clone(),
            description: self.description.clone(),
            tags: self.tags.clone(),
            address: self.address.clone(),
            lng: self.lng.to_string(),
            lat: self.lat.to_string(),
        }
    }
}

/// Parse a seed file.
fn parse(content: &str) -> Result<SeedFile, serde_yaml::Error> {
    serde_yaml::from_str(content)
}

/// Load a seed file into the database.
///
/// # Errors
///
/// Returns an error if the file can't be read or parsed, any entry is
/// invalid, or a database operation fails.
pub async fn run(file_path: &str, clear_existing: bool) -> Result<(), Box<dyn std::error::Error>> {
    let path = Path::new(file_path);
    if !path.exists() {
        return Err(format!("File not found: {file_path}").into());
    }

    info!(path = %file_path, "Loading seed data from file");
    let content = tokio::fs::read_to_string(path).await?;
    let seed = parse(&content)?;
    info!(users = seed.users.len(), stores = seed.stores.len(), "Parsed seed file");

    let pool = connect().await?;
    let users = UserRepository::new(&pool);
    let stores = StoreRepository::new(&pool);
    let auth = AuthService::new(&pool);

    if clear_existing {
        let removed = stores.delete_all().await?;
        info!(removed, "Cleared existing stores");
    }

    let mut authors: HashMap<Email, UserId> = HashMap::new();
    for user in &seed.users {
        let email = Email::parse(&user.email)?;
        if let Some(existing) = users.get_by_email(&email).await? {
            info!(email = %email, "User exists, reusing");
            authors.insert(email, existing.id);
            continue;
        }

        let created = auth
            .register(&Registration {
                name: user.name.clone(),
                email: user.email.clone(),
                password: user.password.clone(),
                password_confirm: user.password.clone(),
            })
            .await?;
        info!(email = %created.email, id = %created.id, "Created user");
        authors.insert(created.email, created.id);
    }

    let mut inserted = 0_usize;
    let mut failed = 0_usize;
    for store in &seed.stores {
        let author_email = Email::parse(&store.author)?;
        let author_id = match authors.get(&author_email) {
            Some(id) => *id,
            None => match users.get_by_email(&author_email).await? {
                Some(user) => {
                    authors.insert(author_email, user.id);
                    user.id
                }
                None => {
                    error!(store = %store.name, author = %store.author, "Unknown author");
                    failed += 1;
                    continue;
                }
            },
        };

        let mut input = match store.to_form().validate() {
            Ok(input) => input,
            Err(errors) => {
                error!(store = %store.name, errors = %errors.join("; "), "Invalid store");
                failed += 1;
                continue;
            }
        };
        input.photo.clone_from(&store.photo);

        let created = stores.create(&input, author_id).await?;
        info!(slug = %created.slug, "Created store");
        inserted += 1;
    }

    info!("Seeding complete!");
    info!("  Stores inserted: {inserted}");
    if failed > 0 {
        error!("  Stores skipped: {failed}");
        return Err(format!("{failed} stores could not be seeded").into());
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_seed_file() {
        let seed = parse(
            r"
users:
  - name: Wes
    email: wes@example.com
    password: correct-horse-battery
stores:
  - name: Wes's Coffee
    tags: [Wifi]
    address: 1 King St W, Hamilton
    lng: -79.8687
    lat: 43.2569
    author: wes@example.com
",
        )
        .unwrap();

        assert_eq!(seed.users.len(), 1);
        let store = &seed.stores[0];
        assert!(store.description.is_empty());
        assert!(store.photo.is_none());

        let input = store.to_form().validate().unwrap();
        assert_eq!(input.tags, vec!["Wifi".to_owned()]);
        assert_eq!(input.location.point.coordinates(), [-79.8687, 43.2569]);
    }

    #[test]
    fn test_parse_empty_sections() {
        let seed = parse("users: []\n").unwrap();
        assert!(seed.stores.is_empty());
    }

    #[test]
    fn test_sample_file_parses() {
        let content = include_str!("../../../../data/sample.yaml");
        let seed = parse(content).unwrap();
        assert!(!seed.users.is_empty());
        for store in &seed.stores {
            assert!(store.to_form().validate().is_ok(), "{}", store.name);
            assert!(
                seed.users.iter().any(|u| u.email == store.author),
                "{} has unknown author",
                store.name
            );
        }
    }
}
