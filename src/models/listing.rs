//! Listing model and browse filters

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use unicode_normalization::{char::is_combining_mark, UnicodeNormalization};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ListingCategory {
    Houses,
    Cars,
    Land,
    Other,
}

text_enum!(ListingCategory {
    Houses => "houses",
    Cars => "cars",
    Land => "land",
    Other => "other",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ListingStatus {
    Available,
    Pending,
    Sold,
    Archived,
}

text_enum!(ListingStatus {
    Available => "available",
    Pending => "pending",
    Sold => "sold",
    Archived => "archived",
});

/// Road access of a land plot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RoadAccess {
    Paved,
    Gravel,
    Dirt,
    None,
}

text_enum!(RoadAccess {
    Paved => "paved",
    Gravel => "gravel",
    Dirt => "dirt",
    None => "none",
});

/// Listing row. Category specific columns are null for other categories.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Listing {
    pub id: Uuid,
    pub seller_id: Uuid,
    pub category: ListingCategory,
    pub status: ListingStatus,
    pub title: String,
    pub description: Option<String>,
    /// Asking price in minor currency units
    pub price: i64,
    pub currency: String,
    pub location: Option<String>,
    /// Fee a buyer pays to schedule a visit, in minor units. None when visits are not offered.
    pub visit_fee: Option<i64>,
    // houses
    pub bedrooms: Option<i32>,
    pub bathrooms: Option<i32>,
    // land
    pub plot_size_sqm: Option<i32>,
    pub road_access: Option<RoadAccess>,
    // cars
    pub fuel_type: Option<String>,
    pub transmission: Option<String>,
    pub featured: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Browse filters. All filters are combined with AND.
#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct ListingQuery {
    pub category: Option<ListingCategory>,
    /// Defaults to `available`
    pub status: Option<ListingStatus>,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    pub min_bedrooms: Option<i32>,
    pub min_bathrooms: Option<i32>,
    pub min_plot_size: Option<i32>,
    pub max_plot_size: Option<i32>,
    pub road_access: Option<RoadAccess>,
    pub fuel_type: Option<String>,
    pub transmission: Option<String>,
    /// Case and accent insensitive substring search over title and description
    pub search: Option<String>,
    /// Page number (1-based)
    pub page: Option<i64>,
    /// Items per page
    pub per_page: Option<i64>,
}

impl ListingQuery {
    pub fn effective_status(&self) -> ListingStatus {
        self.status.unwrap_or(ListingStatus::Available)
    }

    /// Normalized search term, None when blank
    pub fn search_term(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(fold_text)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }

    /// Whether a listing satisfies every filter of this query
    pub fn matches(&self, listing: &Listing) -> bool {
        if listing.status != self.effective_status() {
            return false;
        }
        if self.category.is_some_and(|c| listing.category != c) {
            return false;
        }
        if self.min_price.is_some_and(|min| listing.price < min) {
            return false;
        }
        if self.max_price.is_some_and(|max| listing.price > max) {
            return false;
        }
        if !at_least(listing.bedrooms, self.min_bedrooms) || !at_least(listing.bathrooms, self.min_bathrooms) {
            return false;
        }
        if !at_least(listing.plot_size_sqm, self.min_plot_size) {
            return false;
        }
        if let Some(max) = self.max_plot_size {
            if !listing.plot_size_sqm.is_some_and(|size| size <= max) {
                return false;
            }
        }
        if self.road_access.is_some() && listing.road_access != self.road_access {
            return false;
        }
        if !same_label(listing.fuel_type.as_deref(), self.fuel_type.as_deref())
            || !same_label(listing.transmission.as_deref(), self.transmission.as_deref())
        {
            return false;
        }
        if let Some(term) = self.search_term() {
            let in_title = fold_text(&listing.title).contains(&term);
            let in_description = listing
                .description
                .as_deref()
                .is_some_and(|d| fold_text(d).contains(&term));
            if !in_title && !in_description {
                return false;
            }
        }
        true
    }
}

fn at_least(value: Option<i32>, min: Option<i32>) -> bool {
    match min {
        Some(min) => value.is_some_and(|v| v >= min),
        None => true,
    }
}

fn same_label(value: Option<&str>, wanted: Option<&str>) -> bool {
    match wanted {
        Some(wanted) => value.is_some_and(|v| v.eq_ignore_ascii_case(wanted)),
        None => true,
    }
}

/// Lowercase and strip diacritics ("Accra Écoles" -> "accra ecoles")
pub fn fold_text(text: &str) -> String {
    text.nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Admin toggle of the featured (promoted) flag
#[derive(Debug, Deserialize, ToSchema)]
pub struct SetFeatured {
    pub featured: bool,
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn listing(category: ListingCategory, title: &str, price: i64) -> Listing {
        let now = Utc::now();
        Listing {
            id: Uuid::new_v4(),
            seller_id: Uuid::new_v4(),
            category,
            status: ListingStatus::Available,
            title: title.to_string(),
            description: None,
            price,
            currency: "GHS".to_string(),
            location: None,
            visit_fee: None,
            bedrooms: None,
            bathrooms: None,
            plot_size_sqm: None,
            road_access: None,
            fuel_type: None,
            transmission: None,
            featured: false,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_default_query_only_matches_available() {
        let query = ListingQuery::default();
        let mut l = listing(ListingCategory::Other, "Bicycle", 100);
        assert!(query.matches(&l));
        l.status = ListingStatus::Sold;
        assert!(!query.matches(&l));
    }

    #[test]
    fn test_bedroom_minimum_requires_value() {
        let query = ListingQuery {
            min_bedrooms: Some(3),
            ..Default::default()
        };
        let mut house = listing(ListingCategory::Houses, "House", 1);
        assert!(!query.matches(&house));
        house.bedrooms = Some(2);
        assert!(!query.matches(&house));
        house.bedrooms = Some(3);
        assert!(query.matches(&house));
    }

    #[test]
    fn test_plot_size_range_and_road_access() {
        let query = ListingQuery {
            category: Some(ListingCategory::Land),
            min_plot_size: Some(400),
            max_plot_size: Some(1000),
            road_access: Some(RoadAccess::Paved),
            ..Default::default()
        };
        let mut plot = listing(ListingCategory::Land, "Plot", 1);
        plot.plot_size_sqm = Some(600);
        plot.road_access = Some(RoadAccess::Paved);
        assert!(query.matches(&plot));
        plot.road_access = Some(RoadAccess::Dirt);
        assert!(!query.matches(&plot));
        plot.road_access = Some(RoadAccess::Paved);
        plot.plot_size_sqm = Some(1200);
        assert!(!query.matches(&plot));
    }

    #[test]
    fn test_car_labels_are_case_insensitive() {
        let query = ListingQuery {
            fuel_type: Some("Diesel".to_string()),
            transmission: Some("automatic".to_string()),
            ..Default::default()
        };
        let mut car = listing(ListingCategory::Cars, "Pickup", 1);
        car.fuel_type = Some("diesel".to_string());
        car.transmission = Some("Automatic".to_string());
        assert!(query.matches(&car));
        car.fuel_type = Some("petrol".to_string());
        assert!(!query.matches(&car));
    }

    #[test]
    fn test_search_ignores_case_and_accents() {
        let query = ListingQuery {
            search: Some("  CAFE ".to_string()),
            ..Default::default()
        };
        let mut l = listing(ListingCategory::Other, "Espresso machine", 1);
        assert!(!query.matches(&l));
        l.description = Some("Used in a small café".to_string());
        assert!(query.matches(&l));
    }

    #[test]
    fn test_search_wildcard_characters_are_literal() {
        let villa = listing(ListingCategory::Houses, "Villa in Accra", 1);
        for term in ["%", "_", "a_c"] {
            let query = ListingQuery {
                search: Some(term.to_string()),
                ..Default::default()
            };
            assert!(!query.matches(&villa), "{} should not match", term);
        }
        let query = ListingQuery {
            search: Some("100%".to_string()),
            ..Default::default()
        };
        assert!(query.matches(&listing(ListingCategory::Other, "100% cotton sofa", 1)));
    }

    #[test]
    fn test_blank_search_is_ignored() {
        let query = ListingQuery {
            search: Some("   ".to_string()),
            ..Default::default()
        };
        assert!(query.search_term().is_none());
        assert!(query.matches(&listing(ListingCategory::Cars, "Sedan", 1)));
    }
}
