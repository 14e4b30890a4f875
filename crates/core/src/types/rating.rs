//! Star ratings.

use core::fmt;

/// Errors that can occur when constructing a [`StarRating`].
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("rating must be between {min} and {max} stars (got {got})", min = StarRating::MIN, max = StarRating::MAX)]
pub struct RatingError {
    /// The rejected value.
    pub got: i64,
}

/// A star rating for a newly submitted review, between 1 and 5 inclusive.
///
/// Reviews already on disk keep their raw integer; this type only guards
/// the submission path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StarRating(u8);

impl StarRating {
    /// Lowest allowed rating.
    pub const MIN: u8 = 1;
    /// Highest allowed rating.
    pub const MAX: u8 = 5;

    /// Validate a submitted rating.
    ///
    /// # Errors
    ///
    /// Returns [`RatingError`] if `value` is outside `1..=5`.
    pub fn new(value: i64) -> Result<Self, RatingError> {
        u8::try_from(value)
            .ok()
            .filter(|v| (Self::MIN..=Self::MAX).contains(v))
            .map(Self)
            .ok_or(RatingError { got: value })
    }

    /// Get the rating as a number of stars.
    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }
}

impl fmt::Display for StarRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<StarRating> for i64 {
    fn from(rating: StarRating) -> Self {
        Self::from(rating.0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_one_through_five() {
        for stars in 1..=5_u8 {
            assert_eq!(
                StarRating::new(i64::from(stars)).map(StarRating::get),
                Ok(stars)
            );
        }
    }

    #[test]
    fn test_rejects_out_of_range() {
        assert_eq!(StarRating::new(0), Err(RatingError { got: 0 }));
        assert_eq!(StarRating::new(6), Err(RatingError { got: 6 }));
        assert_eq!(StarRating::new(-3), Err(RatingError { got: -3 }));
        assert_eq!(StarRating::new(300), Err(RatingError { got: 300 }));
    }

    #[test]
    fn test_error_message() {
        let err = StarRating::new(9).unwrap_err();
        assert_eq!(err.to_string(), "rating must be between 1 and 5 stars (got 9)");
    }
}
