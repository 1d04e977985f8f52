//! Data models for the marketplace

/// String-backed enum stored in TEXT columns.
///
/// Generates `as_str`, `Display`, `FromStr` and the sqlx conversions so the
/// enum can be bound and decoded directly.
macro_rules! text_enum {
    ($name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    _ => Err(format!("Invalid {}: {}", stringify!($name), s)),
                }
            }
        }

        impl sqlx::Type<sqlx::Postgres> for $name {
            fn type_info() -> sqlx::postgres::PgTypeInfo {
                <String as sqlx::Type<sqlx::Postgres>>::type_info()
            }

            fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
                <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
            }
        }

        impl<'r> sqlx::Decode<'r, sqlx::Postgres> for $name {
            fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
                let s = <String as sqlx::Decode<'r, sqlx::Postgres>>::decode(value)?;
                s.parse().map_err(|e: String| e.into())
            }
        }

        impl sqlx::Encode<'_, sqlx::Postgres> for $name {
            fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
                <String as sqlx::Encode<sqlx::Postgres>>::encode(self.as_str().to_string(), buf)
            }
        }
    };
}

pub mod inquiry;
pub mod listing;
pub mod notification;
pub mod payment_method;
pub mod user;
pub mod visit;

pub use inquiry::{CreateInquiry, Inquiry};
pub use listing::{Listing, ListingCategory, ListingQuery, ListingStatus, RoadAccess};
pub use notification::{
    Channel, ChannelDelivery, ChannelOutcome, NewNotification, Notification, NotificationPreferences,
    NotificationStatus, Priority,
};
pub use payment_method::{PaymentMethod, UpsertPaymentMethod};
pub use user::{UserClaims, UserProfile, UserRole};
pub use visit::{CreateVisitRequest, VisitRequest, VisitStatus};

/// Resolved pagination window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page: i64,
    pub per_page: i64,
}

impl Page {
    /// Clamp user supplied paging values (page is 1-based)
    pub fn resolve(page: Option<i64>, per_page: Option<i64>, default_per_page: i64, max_per_page: i64) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            per_page: per_page.unwrap_or(default_per_page).clamp(1, max_per_page.max(1)),
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.per_page
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_defaults_and_clamping() {
        let page = Page::resolve(None, None, 20, 100);
        assert_eq!(page, Page { page: 1, per_page: 20 });
        assert_eq!(page.offset(), 0);

        let page = Page::resolve(Some(0), Some(500), 20, 100);
        assert_eq!(page, Page { page: 1, per_page: 100 });

        let page = Page::resolve(Some(3), Some(10), 20, 100);
        assert_eq!(page.offset(), 20);
    }
}
