//! Newtype IDs for type-safe record references.
//!
//! Records in the data files are keyed by random UUID v4 strings. The
//! `define_id!` macro wraps them so a review id cannot be passed where some
//! other id is expected.

use uuid::Uuid;

/// Macro to define a type-safe UUID wrapper.
///
/// Creates a newtype wrapper around [`Uuid`] with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]` (hyphenated string)
/// - `Debug`, `Clone`, `Copy`, `PartialEq`, `Eq`, `Hash`
/// - `generate()` for fresh v4 ids, `as_uuid()`, `Display` and `FromStr`
///
/// # Example
///
/// ```rust
/// # use school_reviews_core::define_id;
/// define_id!(CommentId);
///
/// let a = CommentId::generate();
/// let b = CommentId::generate();
/// assert_ne!(a, b);
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            Hash,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(::uuid::Uuid);

        impl $name {
            /// Generate a new random (v4) ID.
            #[must_use]
            pub fn generate() -> Self {
                Self(::uuid::Uuid::new_v4())
            }

            /// Wrap an existing UUID.
            #[must_use]
            pub const fn from_uuid(id: ::uuid::Uuid) -> Self {
                Self(id)
            }

            /// Get the underlying UUID.
            #[must_use]
            pub const fn as_uuid(&self) -> ::uuid::Uuid {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = ::uuid::Error;

            fn from_str(s: &str) -> ::core::result::Result<Self, Self::Err> {
                ::uuid::Uuid::parse_str(s).map(Self)
            }
        }
    };
}

define_id!(ReviewId);

impl From<Uuid> for ReviewId {
    fn from(id: Uuid) -> Self {
        Self::from_uuid(id)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_is_unique() {
        let ids: std::collections::HashSet<ReviewId> =
            (0..100).map(|_| ReviewId::generate()).collect();
        assert_eq!(ids.len(), 100);
    }

    #[test]
    fn test_generate_is_v4() {
        assert_eq!(ReviewId::generate().as_uuid().get_version_num(), 4);
    }

    #[test]
    fn test_serializes_as_hyphenated_string() {
        let id: ReviewId = "0b6f4c1e-2f5e-4a4e-9d8e-3c2b1a0f9e8d".parse().unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"0b6f4c1e-2f5e-4a4e-9d8e-3c2b1a0f9e8d\"");

        let back: ReviewId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_from_str_rejects_garbage() {
        assert!("not-a-uuid".parse::<ReviewId>().is_err());
    }
}
