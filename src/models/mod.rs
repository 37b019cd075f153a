//! Domain types shared by the store and the HTTP handlers.
//!
//! Enumerated columns are stored as TEXT and exposed as typed enums; the
//! `text_enum!` macro generates the string mapping both ways.

/// Declare an enum whose variants map one-to-one onto stored/wire strings.
macro_rules! text_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $($variant:ident => $text:literal),+ $(,)?
        }
        default = $default:ident;
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ::serde::Serialize, ::serde::Deserialize)]
        pub enum $name {
            $(#[serde(rename = $text)] $variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl Default for $name {
            fn default() -> Self {
                $name::$default
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = anyhow::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(anyhow::anyhow!(
                        "invalid {} value: {}",
                        stringify!($name),
                        other
                    )),
                }
            }
        }
    };
}

mod auth;
mod payment;
mod property;
mod room;
mod tenant;
mod ticket;
mod user;

pub use auth::*;
pub use payment::*;
pub use property::*;
pub use room::*;
pub use tenant::*;
pub use ticket::*;
pub use user::*;

use serde::Serialize;

/// Pagination summary attached to every list response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub total_pages: i64,
    pub current_page: i64,
    pub total: i64,
}

impl PageMeta {
    pub fn new(total: i64, page: i64, limit: i64) -> Self {
        let total_pages = if limit > 0 { (total + limit - 1) / limit } else { 0 };
        Self {
            total_pages,
            current_page: page,
            total,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_math() {
        assert_eq!(PageMeta::new(21, 1, 10).total_pages, 3);
        assert_eq!(PageMeta::new(20, 2, 10).total_pages, 2);
        assert_eq!(PageMeta::new(0, 1, 10).total_pages, 0);
    }

    #[test]
    fn test_text_enum_round_trip() {
        assert_eq!("under_review".parse::<PropertyVerificationStatus>().ok(), Some(PropertyVerificationStatus::UnderReview));
        assert_eq!(RoomStatus::Occupied.as_str(), "occupied");
        assert!("vip".parse::<RoomType>().is_err());
        assert_eq!(Role::default(), Role::Tenant);
    }
}
