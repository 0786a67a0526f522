//! Catalog filter model: the criteria one browse/search request carries and
//! the combination semantics every backend must honor.
//!
//! Groups combine with AND; values within a group combine with OR. An absent
//! group contributes no constraint. The SQL rendering in `bloomery-db` and
//! the pure predicate here must agree; the predicate is the reference.

use rust_decimal::Decimal;

use crate::domain::product::Product;

/// Named price interval used for price filtering.
///
/// Only the first bucket includes its lower bound; the others are half-open
/// at the bottom so adjacent buckets never overlap.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PriceBucket {
    /// `0-500` — [0, 500]
    UpTo500,
    /// `500-1000` — (500, 1000]
    From500To1000,
    /// `1000-1500` — (1000, 1500]
    From1000To1500,
    /// `1500+` — (1500, ∞)
    Above1500,
}

impl PriceBucket {
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "0-500" => Some(Self::UpTo500),
            "500-1000" => Some(Self::From500To1000),
            "1000-1500" => Some(Self::From1000To1500),
            "1500+" => Some(Self::Above1500),
            _ => None,
        }
    }

    pub fn token(&self) -> &'static str {
        match self {
            Self::UpTo500 => "0-500",
            Self::From500To1000 => "500-1000",
            Self::From1000To1500 => "1000-1500",
            Self::Above1500 => "1500+",
        }
    }

    pub fn contains(&self, price: Decimal) -> bool {
        match self {
            Self::UpTo500 => price >= Decimal::ZERO && price <= Decimal::from(500),
            Self::From500To1000 => price > Decimal::from(500) && price <= Decimal::from(1000),
            Self::From1000To1500 => price > Decimal::from(1000) && price <= Decimal::from(1500),
            Self::Above1500 => price > Decimal::from(1500),
        }
    }
}

/// Escape `%`, `_` and the escape character itself so user search text is
/// matched literally by `LIKE ... ESCAPE '\'` instead of as a pattern.
pub fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

/// Ephemeral criteria for one catalog query; never persisted.
///
/// Category and bucket values are kept as raw strings: an unknown category
/// value simply matches no product, and an unknown bucket token makes the
/// whole price group match nothing, so malformed input surfaces as "no
/// results" rather than silently widening the query.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FilterRequest {
    pub search: Option<String>,
    pub flower_types: Vec<String>,
    pub colors: Vec<String>,
    pub price_buckets: Vec<String>,
}

impl FilterRequest {
    /// Build from repeatable query parameters (`?flowerType=a&flowerType=b`).
    /// Unknown keys are ignored; a blank search contributes nothing.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut filter = Self::default();
        for (key, value) in pairs {
            let value = value.into();
            match key.as_ref() {
                "search" => {
                    if !value.trim().is_empty() {
                        filter.search = Some(value);
                    }
                }
                "flowerType" => filter.flower_types.push(value),
                "color" => filter.colors.push(value),
                "price" => filter.price_buckets.push(value),
                _ => {}
            }
        }
        filter
    }

    pub fn is_empty(&self) -> bool {
        self.search.is_none()
            && self.flower_types.is_empty()
            && self.colors.is_empty()
            && self.price_buckets.is_empty()
    }

    /// All bucket tokens parsed, or `None` when any token is unrecognized —
    /// in which case the price group must match nothing.
    pub fn parsed_buckets(&self) -> Option<Vec<PriceBucket>> {
        self.price_buckets.iter().map(|token| PriceBucket::parse(token)).collect()
    }

    /// Reference predicate: does `product` satisfy every supplied group?
    pub fn matches(&self, product: &Product) -> bool {
        if let Some(search) = &self.search {
            // ASCII folding only, to stay in step with SQLite's LOWER(),
            // which leaves non-ASCII characters untouched.
            let needle = search.to_ascii_lowercase();
            let in_name = product.name.to_ascii_lowercase().contains(&needle);
            let in_description = product
                .description
                .as_deref()
                .map(|description| description.to_ascii_lowercase().contains(&needle))
                .unwrap_or(false);
            if !in_name && !in_description {
                return false;
            }
        }

        if !self.flower_types.is_empty() {
            let member = product
                .flower_type
                .map(|flower_type| {
                    self.flower_types.iter().any(|value| value == flower_type.as_str())
                })
                .unwrap_or(false);
            if !member {
                return false;
            }
        }

        if !self.colors.is_empty() {
            let member = product
                .color
                .map(|color| self.colors.iter().any(|value| value == color.as_str()))
                .unwrap_or(false);
            if !member {
                return false;
            }
        }

        if !self.price_buckets.is_empty() {
            match self.parsed_buckets() {
                Some(buckets) => {
                    if !buckets.iter().any(|bucket| bucket.contains(product.price)) {
                        return false;
                    }
                }
                None => return false,
            }
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use rust_decimal::Decimal;

    use super::{escape_like, FilterRequest, PriceBucket};
    use crate::domain::product::{Color, FlowerType, Product, ProductId};

    fn product(name: &str, price: i64) -> Product {
        Product {
            id: ProductId(format!("PRD-{name}")),
            name: name.to_string(),
            price: Decimal::from(price),
            description: Some("hand-tied arrangement".to_string()),
            flower_type: Some(FlowerType::FreshFlowers),
            color: Some(Color::Red),
            image_path: "uploads/test.jpg".to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn empty_filter_matches_everything() {
        let filter = FilterRequest::default();
        assert!(filter.is_empty());
        assert!(filter.matches(&product("Rose Bouquet", 450)));
    }

    #[test]
    fn bucket_boundaries_are_exclusive_at_the_bottom() {
        let at_500 = Decimal::from(500);
        assert!(PriceBucket::UpTo500.contains(at_500));
        assert!(!PriceBucket::From500To1000.contains(at_500));

        let at_1500 = Decimal::from(1500);
        assert!(PriceBucket::From1000To1500.contains(at_1500));
        assert!(!PriceBucket::Above1500.contains(at_1500));

        assert!(PriceBucket::Above1500.contains(Decimal::new(150001, 2)));
    }

    #[test]
    fn bucket_tokens_round_trip() {
        for token in ["0-500", "500-1000", "1000-1500", "1500+"] {
            let bucket = PriceBucket::parse(token).expect("known token");
            assert_eq!(bucket.token(), token);
        }
        assert_eq!(PriceBucket::parse("0-9999"), None);
    }

    #[test]
    fn search_is_case_insensitive_over_name_and_description() {
        let filter = FilterRequest { search: Some("ROSE".to_string()), ..Default::default() };
        assert!(filter.matches(&product("Rose Bouquet", 450)));

        let in_description =
            FilterRequest { search: Some("Hand-Tied".to_string()), ..Default::default() };
        assert!(in_description.matches(&product("Tulips", 450)));

        let no_match = FilterRequest { search: Some("orchid".to_string()), ..Default::default() };
        assert!(!no_match.matches(&product("Rose Bouquet", 450)));
    }

    #[test]
    fn search_case_folding_stops_at_ascii() {
        // Folding is ASCII-scoped, like SQLite's LOWER(). A needle that
        // matches the stored casing exactly still hits; one that needs
        // Unicode folding does not.
        let exact = FilterRequest { search: Some("Röse".to_string()), ..Default::default() };
        assert!(exact.matches(&product("Röse Garland", 450)));

        let upper = FilterRequest { search: Some("RÖSE".to_string()), ..Default::default() };
        assert!(!upper.matches(&product("Röse Garland", 450)));
    }

    #[test]
    fn like_metacharacters_are_escaped() {
        assert_eq!(escape_like("50% off"), "50\\% off");
        assert_eq!(escape_like("a_b"), "a\\_b");
        assert_eq!(escape_like("back\\slash"), "back\\\\slash");
        assert_eq!(escape_like("plain"), "plain");
    }

    #[test]
    fn category_groups_require_membership() {
        let filter = FilterRequest {
            flower_types: vec!["Balloon".to_string(), "Fresh Flowers".to_string()],
            ..Default::default()
        };
        assert!(filter.matches(&product("Rose Bouquet", 450)));

        let other = FilterRequest {
            flower_types: vec!["Dried Flowers".to_string()],
            ..Default::default()
        };
        assert!(!other.matches(&product("Rose Bouquet", 450)));

        // A product without the field never belongs to a requested set.
        let mut uncategorized = product("Mystery Box", 450);
        uncategorized.flower_type = None;
        assert!(!filter.matches(&uncategorized));
    }

    #[test]
    fn unknown_bucket_token_collapses_the_price_group() {
        let filter = FilterRequest {
            price_buckets: vec!["0-500".to_string(), "cheap".to_string()],
            ..Default::default()
        };
        assert_eq!(filter.parsed_buckets(), None);
        assert!(!filter.matches(&product("Rose Bouquet", 450)));
    }

    #[test]
    fn groups_combine_with_and() {
        let filter = FilterRequest {
            search: Some("rose".to_string()),
            colors: vec!["Pink".to_string()],
            ..Default::default()
        };
        // Search matches but the color group does not.
        assert!(!filter.matches(&product("Rose Bouquet", 450)));
    }

    #[test]
    fn from_pairs_collects_repeated_parameters() {
        let filter = FilterRequest::from_pairs(vec![
            ("search", "rose"),
            ("flowerType", "Fresh Flowers"),
            ("flowerType", "Balloon"),
            ("color", "Red"),
            ("price", "0-500"),
            ("price", "1500+"),
            ("page", "2"),
        ]);

        assert_eq!(filter.search.as_deref(), Some("rose"));
        assert_eq!(filter.flower_types, vec!["Fresh Flowers", "Balloon"]);
        assert_eq!(filter.colors, vec!["Red"]);
        assert_eq!(filter.price_buckets, vec!["0-500", "1500+"]);
    }

    #[test]
    fn from_pairs_ignores_blank_search() {
        let filter = FilterRequest::from_pairs(vec![("search", "   ")]);
        assert!(filter.is_empty());
    }
}
