//! Review aggregation

use rust_decimal::Decimal;
use thiserror::Error;

/// Raised for a rating outside `1..=5`.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("rating must be between 1 and 5, got {0}")]
pub struct InvalidRating(pub i64);

/// A validated star rating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Rating(u8);

impl Rating {
    /// Lowest allowed rating.
    pub const MIN: u8 = 1;

    /// Highest allowed rating.
    pub const MAX: u8 = 5;

    /// Validate a rating.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidRating`] when the value is outside `1..=5`.
    pub fn new(value: i64) -> Result<Self, InvalidRating> {
        u8::try_from(value)
            .ok()
            .filter(|stars| (Self::MIN..=Self::MAX).contains(stars))
            .map(Self)
            .ok_or(InvalidRating(value))
    }

    /// Number of stars.
    pub const fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for Rating {
    type Error = InvalidRating;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Aggregate rating of a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReviewSummary {
    /// Mean rating, zero when there are no reviews.
    pub rating: Decimal,

    /// Number of reviews.
    pub num_reviews: u32,
}

/// Recompute a product's aggregate from all of its ratings.
pub fn recompute<I>(ratings: I) -> ReviewSummary
where
    I: IntoIterator<Item = Rating>,
{
    let (sum, count) = ratings
        .into_iter()
        .fold((0_u64, 0_u32), |(sum, count), rating| {
            (sum + u64::from(rating.get()), count.saturating_add(1))
        });

    if count == 0 {
        return ReviewSummary {
            rating: Decimal::ZERO,
            num_reviews: 0,
        };
    }

    ReviewSummary {
        rating: Decimal::from(sum) / Decimal::from(count),
        num_reviews: count,
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    fn ratings(values: &[i64]) -> Result<Vec<Rating>, InvalidRating> {
        values.iter().copied().map(Rating::new).collect()
    }

    #[test]
    fn mean_of_five_reviews() -> TestResult {
        let summary = recompute(ratings(&[5, 4, 3, 5, 3])?);

        assert_eq!(summary.rating, Decimal::from(4));
        assert_eq!(summary.num_reviews, 5);

        Ok(())
    }

    #[test]
    fn no_reviews_yields_zero() {
        let summary = recompute(Vec::new());

        assert_eq!(summary.rating, Decimal::ZERO);
        assert_eq!(summary.num_reviews, 0);
    }

    #[test]
    fn mean_is_not_truncated() -> TestResult {
        let summary = recompute(ratings(&[5, 4])?);

        assert_eq!(summary.rating, Decimal::new(45, 1));

        Ok(())
    }

    #[test]
    fn ratings_outside_range_are_rejected() {
        assert_eq!(Rating::new(0), Err(InvalidRating(0)));
        assert_eq!(Rating::new(6), Err(InvalidRating(6)));
        assert_eq!(Rating::new(-3), Err(InvalidRating(-3)));
    }

    #[test]
    fn ratings_inside_range_are_accepted() -> TestResult {
        for value in 1..=5 {
            assert_eq!(i64::from(Rating::try_from(value)?.get()), value);
        }

        Ok(())
    }
}
