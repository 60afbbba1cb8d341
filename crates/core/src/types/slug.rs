//! URL slugs derived from store names.

use core::fmt;

use serde::{Deserialize, Serialize};

/// A URL-safe identifier derived from a display name.
///
/// Slugs contain only lowercase ASCII letters, digits and single hyphens,
/// never start or end with a hyphen, and are never empty.
///
/// ## Examples
///
/// ```
/// use storefinder_core::Slug;
///
/// assert_eq!(Slug::from_name("Wes's Coffee & Donuts").as_str(), "wess-coffee-donuts");
/// assert_eq!(Slug::from_name("Café Crème").as_str(), "cafe-creme");
///
/// // Two existing stores already use "cafe-creme" (or a numbered variant)
/// assert_eq!(Slug::from_name("Café Crème").disambiguate(2).as_str(), "cafe-creme-3");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Slug(String);

impl Slug {
    /// Slug used when a name contains nothing sluggable.
    pub const FALLBACK: &'static str = "store";

    /// Derive a slug from a display name.
    ///
    /// Letters are lowercased and common accented Latin letters are folded
    /// to their ASCII base. Apostrophes and letters without an ASCII base are
    /// dropped; every other run of non-alphanumeric characters becomes a
    /// single hyphen.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        let mut slug = String::with_capacity(name.len());
        let mut pending_hyphen = false;

        for c in name.chars() {
            if matches!(c, '\'' | '\u{2019}') {
                continue;
            }

            let lower = c.to_ascii_lowercase();
            let folded = if lower.is_ascii_alphanumeric() {
                Some(FoldedChar::Ascii(lower))
            } else {
                fold_accented(c).map(FoldedChar::Str)
            };

            let Some(folded) = folded else {
                // Letters with no ASCII base vanish; anything else separates words
                if !c.is_alphabetic() {
                    pending_hyphen = true;
                }
                continue;
            };

            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            match folded {
                FoldedChar::Ascii(c) => slug.push(c),
                FoldedChar::Str(s) => slug.push_str(s),
            }
        }

        if slug.is_empty() {
            return Self(Self::FALLBACK.to_owned());
        }

        Self(slug)
    }

    /// Wrap a slug that was already stored.
    ///
    /// Database values are assumed valid.
    #[must_use]
    pub const fn from_stored(slug: String) -> Self {
        Self(slug)
    }

    /// Regular expression matching this slug and its numbered variants
    /// (`slug`, `slug-1`, `slug-2`, ...).
    ///
    /// Slugs only contain `[a-z0-9-]`, so no escaping is needed. Matching is
    /// expected to be case-insensitive.
    #[must_use]
    pub fn conflict_pattern(&self) -> String {
        format!("^({})((-[0-9]*$)?)$", self.0)
    }

    /// Return a slug that does not collide with `existing` stores already
    /// matching [`Self::conflict_pattern`].
    ///
    /// With no conflicts the slug is unchanged; otherwise the count of
    /// conflicting stores plus one is appended.
    #[must_use]
    pub fn disambiguate(self, existing: usize) -> Self {
        if existing == 0 {
            return self;
        }
        Self(format!("{}-{}", self.0, existing + 1))
    }

    /// Returns the slug as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `Slug` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

enum FoldedChar {
    Ascii(char),
    Str(&'static str),
}

/// Fold an accented Latin letter to its ASCII base.
///
/// Covers Western and Central European alphabets.
fn fold_accented(c: char) -> Option<&'static str> {
    let folded = match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'ā' | 'ă' | 'ą' | 'À' | 'Á' | 'Â' | 'Ã' | 'Ä' | 'Å'
        | 'Ā' | 'Ă' | 'Ą' => "a",
        'æ' | 'Æ' => "ae",
        'ç' | 'ć' | 'č' | 'Ç' | 'Ć' | 'Č' => "c",
        'ď' | 'đ' | 'ð' | 'Ď' | 'Đ' | 'Ð' => "d",
        'è' | 'é' | 'ê' | 'ë' | 'ē' | 'ė' | 'ę' | 'ě' | 'È' | 'É' | 'Ê' | 'Ë' | 'Ē' | 'Ė' | 'Ę'
        | 'Ě' => "e",
        'ğ' | 'Ğ' => "g",
        'ì' | 'í' | 'î' | 'ï' | 'ī' | 'į' | 'ı' | 'Ì' | 'Í' | 'Î' | 'Ï' | 'Ī' | 'Į' | 'İ' => "i",
        'ł' | 'ľ' | 'ĺ' | 'Ł' | 'Ľ' | 'Ĺ' => "l",
        'ñ' | 'ń' | 'ň' | 'Ñ' | 'Ń' | 'Ň' => "n",
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' | 'ō' | 'ő' | 'Ò' | 'Ó' | 'Ô' | 'Õ' | 'Ö' | 'Ø' | 'Ō'
        | 'Ő' => "o",
        'œ' | 'Œ' => "oe",
        'ř' | 'ŕ' | 'Ř' | 'Ŕ' => "r",
        'ś' | 'š' | 'ş' | 'ș' | 'Ś' | 'Š' | 'Ş' | 'Ș' => "s",
        'ß' => "ss",
        'ť' | 'ţ' | 'ț' | 'Ť' | 'Ţ' | 'Ț' => "t",
        'þ' | 'Þ' => "th",
        'ù' | 'ú' | 'û' | 'ü' | 'ū' | 'ů' | 'ű' | 'ų' | 'Ù' | 'Ú' | 'Û' | 'Ü' | 'Ū' | 'Ů' | 'Ű'
        | 'Ų' => "u",
        'ý' | 'ÿ' | 'Ý' | 'Ÿ' => "y",
        'ź' | 'ż' | 'ž' | 'Ź' | 'Ż' | 'Ž' => "z",
        _ => return None,
    };
    Some(folded)
}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Slug {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_name_basic() {
        assert_eq!(Slug::from_name("Hello World").as_str(), "hello-world");
        assert_eq!(Slug::from_name("  Lots   of   space ").as_str(), "lots-of-space");
        assert_eq!(Slug::from_name("Store #42!").as_str(), "store-42");
    }

    #[test]
    fn test_from_name_drops_apostrophes() {
        assert_eq!(Slug::from_name("Bob's Burgers").as_str(), "bobs-burgers");
        assert_eq!(Slug::from_name("Bob\u{2019}s Burgers").as_str(), "bobs-burgers");
    }

    #[test]
    fn test_from_name_folds_accents() {
        assert_eq!(Slug::from_name("Crème Brûlée").as_str(), "creme-brulee");
        assert_eq!(Slug::from_name("Straße").as_str(), "strasse");
    }

    #[test]
    fn test_from_name_folds_central_european_letters() {
        assert_eq!(Slug::from_name("Wrocław Café").as_str(), "wroclaw-cafe");
        assert_eq!(Slug::from_name("Žluťoučký kůň").as_str(), "zlutoucky-kun");
        assert_eq!(Slug::from_name("Győr Söröző").as_str(), "gyor-sorozo");
    }

    #[test]
    fn test_from_name_drops_unfoldable_letters_inside_words() {
        assert_eq!(Slug::from_name("Caféα Bar").as_str(), "cafe-bar");
        assert_eq!(Slug::from_name("Sushi寿司Bar").as_str(), "sushibar");
        assert_eq!(Slug::from_name("Tea & 寿司").as_str(), "tea");
    }

    #[test]
    fn test_from_name_is_deterministic() {
        let a = Slug::from_name("Dang That's Delicious");
        let b = Slug::from_name("Dang That's Delicious");
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "dang-thats-delicious");
    }

    #[test]
    fn test_from_name_fallback() {
        assert_eq!(Slug::from_name("").as_str(), Slug::FALLBACK);
        assert_eq!(Slug::from_name("!!! ???").as_str(), Slug::FALLBACK);
        assert_eq!(Slug::from_name("寿司").as_str(), Slug::FALLBACK);
    }

    #[test]
    fn test_disambiguate_without_conflicts() {
        let slug = Slug::from_name("Coffee Shop");
        assert_eq!(slug.disambiguate(0).as_str(), "coffee-shop");
    }

    #[test]
    fn test_disambiguate_appends_incrementing_suffix() {
        let slug = Slug::from_name("Coffee Shop");
        assert_eq!(slug.clone().disambiguate(1).as_str(), "coffee-shop-2");
        assert_eq!(slug.clone().disambiguate(2).as_str(), "coffee-shop-3");
        assert_eq!(slug.disambiguate(9).as_str(), "coffee-shop-10");
    }

    #[test]
    fn test_conflict_pattern() {
        let slug = Slug::from_name("Coffee Shop");
        assert_eq!(slug.conflict_pattern(), "^(coffee-shop)((-[0-9]*$)?)$");
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Slug::from_name("Tea House")), "tea-house");
    }
}
