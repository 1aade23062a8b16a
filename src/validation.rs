// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Client-side record validation.
//!
//! Validation is pure: no I/O, no clock, no randomness. Each record yields
//! exactly one [`ValidationOutcome`] at the same index as its input, and the
//! first violated rule wins.
//!
//! # Example
//!
//! ```
//! use bulk_engine::{ListingInput, ValidationLimits, validation::validate_listings};
//!
//! let listings = vec![
//!     ListingInput::new("Hub", "coworking", "Berlin", "Germany"),
//!     ListingInput::new("", "cafe", "Lisbon", "Portugal"),
//! ];
//! let outcomes = validate_listings(&listings, &ValidationLimits::default());
//! assert!(outcomes[0].is_valid());
//! assert_eq!(outcomes[1].reason().as_deref(), Some("Name is required"));
//! ```

use serde_json::Value;
use thiserror::Error;
use url::Url;

use crate::config::BulkEngineConfig;
use crate::listing::{DocumentUpdate, ListingInput, LISTING_TYPES};

/// A rule violation detected before any remote call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Name is required")]
    MissingName,
    #[error("Valid type is required (accommodation, coworking, cafe, activity)")]
    InvalidType,
    #[error("City is required")]
    MissingCity,
    #[error("Country is required")]
    MissingCountry,
    #[error("Invalid website URL")]
    InvalidWebsite,
    #[error("Invalid latitude")]
    InvalidLatitude,
    #[error("Invalid longitude")]
    InvalidLongitude,
    #[error("Eco tags must be an array with max {0} items")]
    TooManyEcoTags(usize),
    #[error("Maximum {0} images allowed per listing")]
    TooManyAttachments(usize),
    #[error("Document id is required")]
    MissingId,
    #[error("Patch must be a JSON object")]
    InvalidPatch,
}

/// Cardinality limits applied during validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationLimits {
    pub max_eco_tags: usize,
    pub max_attachments: usize,
}

impl Default for ValidationLimits {
    fn default() -> Self {
        Self {
            max_eco_tags: 10,
            max_attachments: 20,
        }
    }
}

impl From<&BulkEngineConfig> for ValidationLimits {
    fn from(config: &BulkEngineConfig) -> Self {
        Self {
            max_eco_tags: config.max_eco_tags,
            max_attachments: config.max_attachments,
        }
    }
}

/// Per-record verdict.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationOutcome<'a, R> {
    Valid(&'a R),
    Invalid(&'a R, ValidationError),
}

impl<'a, R> ValidationOutcome<'a, R> {
    #[must_use]
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid(_))
    }

    #[must_use]
    pub fn record(&self) -> &'a R {
        match self {
            Self::Valid(record) | Self::Invalid(record, _) => record,
        }
    }

    /// Human-readable reason, if invalid.
    #[must_use]
    pub fn reason(&self) -> Option<String> {
        match self {
            Self::Valid(_) => None,
            Self::Invalid(_, err) => Some(err.to_string()),
        }
    }

    fn from_check(record: &'a R, check: Result<(), ValidationError>) -> Self {
        match check {
            Ok(()) => Self::Valid(record),
            Err(err) => Self::Invalid(record, err),
        }
    }
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// Check a single listing. Returns the first violated rule.
pub fn validate_listing(listing: &ListingInput, limits: &ValidationLimits) -> Result<(), ValidationError> {
    if is_blank(&listing.name) {
        return Err(ValidationError::MissingName);
    }
    if !LISTING_TYPES.contains(&listing.listing_type.as_str()) {
        return Err(ValidationError::InvalidType);
    }
    if is_blank(&listing.city) {
        return Err(ValidationError::MissingCity);
    }
    if is_blank(&listing.country) {
        return Err(ValidationError::MissingCountry);
    }

    // A blank website counts as absent
    if let Some(website) = listing.website.as_deref().filter(|w| !is_blank(w)) {
        // Url::parse only accepts absolute URLs
        if Url::parse(website).is_err() {
            return Err(ValidationError::InvalidWebsite);
        }
    }

    if let Some(coords) = listing.coordinates {
        // Range checks are written so NaN fails them
        if !(-90.0..=90.0).contains(&coords.lat) {
            return Err(ValidationError::InvalidLatitude);
        }
        if !(-180.0..=180.0).contains(&coords.lng) {
            return Err(ValidationError::InvalidLongitude);
        }
    }

    if listing.eco_tags.len() > limits.max_eco_tags {
        return Err(ValidationError::TooManyEcoTags(limits.max_eco_tags));
    }
    if listing.attachments.len() > limits.max_attachments {
        return Err(ValidationError::TooManyAttachments(limits.max_attachments));
    }

    Ok(())
}

/// Validate every listing, index-aligned with the input.
pub fn validate_listings<'a>(
    listings: &'a [ListingInput],
    limits: &ValidationLimits,
) -> Vec<ValidationOutcome<'a, ListingInput>> {
    listings
        .iter()
        .map(|listing| ValidationOutcome::from_check(listing, validate_listing(listing, limits)))
        .collect()
}

/// An update needs a target id and an object patch.
pub fn validate_update(update: &DocumentUpdate) -> Result<(), ValidationError> {
    if is_blank(&update.id) {
        return Err(ValidationError::MissingId);
    }
    if !matches!(update.patch, Value::Object(_)) {
        return Err(ValidationError::InvalidPatch);
    }
    Ok(())
}

pub fn validate_updates(updates: &[DocumentUpdate]) -> Vec<ValidationOutcome<'_, DocumentUpdate>> {
    updates
        .iter()
        .map(|update| ValidationOutcome::from_check(update, validate_update(update)))
        .collect()
}

pub fn validate_delete_id(id: &str) -> Result<(), ValidationError> {
    if is_blank(id) {
        return Err(ValidationError::MissingId);
    }
    Ok(())
}

pub fn validate_delete_ids(ids: &[String]) -> Vec<ValidationOutcome<'_, String>> {
    ids.iter()
        .map(|id| ValidationOutcome::from_check(id, validate_delete_id(id)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listing::Attachment;
    use serde_json::json;

    fn valid() -> ListingInput {
        ListingInput::new("Hub", "coworking", "Berlin", "Germany")
    }

    fn check(listing: &ListingInput) -> Result<(), ValidationError> {
        validate_listing(listing, &ValidationLimits::default())
    }

    #[test]
    fn test_minimal_listing_is_valid() {
        assert_eq!(check(&valid()), Ok(()));
    }

    #[test]
    fn test_required_fields_are_trimmed() {
        let mut listing = valid();
        listing.name = "   ".into();
        assert_eq!(check(&listing), Err(ValidationError::MissingName));

        let mut listing = valid();
        listing.city = "\t".into();
        assert_eq!(check(&listing), Err(ValidationError::MissingCity));

        let mut listing = valid();
        listing.country = String::new();
        assert_eq!(check(&listing), Err(ValidationError::MissingCountry));
    }

    #[test]
    fn test_type_must_be_known() {
        for kind in LISTING_TYPES {
            let mut listing = valid();
            listing.listing_type = kind.into();
            assert_eq!(check(&listing), Ok(()), "type {kind} should be accepted");
        }

        let mut listing = valid();
        listing.listing_type = "hostel".into();
        assert_eq!(check(&listing), Err(ValidationError::InvalidType));

        listing.listing_type = "Cafe".into();
        assert_eq!(check(&listing), Err(ValidationError::InvalidType));
    }

    #[test]
    fn test_first_violation_wins() {
        let mut listing = valid();
        listing.name = String::new();
        listing.listing_type = "unknown".into();
        listing.city = String::new();
        assert_eq!(check(&listing), Err(ValidationError::MissingName));
    }

    #[test]
    fn test_website_must_be_absolute_url() {
        assert_eq!(check(&valid().with_website("https://example.com/hub")), Ok(()));
        assert_eq!(check(&valid().with_website("example.com")), Err(ValidationError::InvalidWebsite));
        assert_eq!(check(&valid().with_website("/relative/path")), Err(ValidationError::InvalidWebsite));
    }

    #[test]
    fn test_blank_website_is_treated_as_absent() {
        assert_eq!(check(&valid().with_website("")), Ok(()));
        assert_eq!(check(&valid().with_website("   ")), Ok(()));
    }

    #[test]
    fn test_coordinate_ranges() {
        assert_eq!(check(&valid().with_coordinates(90.0, -180.0)), Ok(()));
        assert_eq!(check(&valid().with_coordinates(-90.0, 180.0)), Ok(()));
        assert_eq!(check(&valid().with_coordinates(90.1, 0.0)), Err(ValidationError::InvalidLatitude));
        assert_eq!(check(&valid().with_coordinates(0.0, -180.5)), Err(ValidationError::InvalidLongitude));
        assert_eq!(check(&valid().with_coordinates(f64::NAN, 0.0)), Err(ValidationError::InvalidLatitude));
        assert_eq!(check(&valid().with_coordinates(0.0, f64::INFINITY)), Err(ValidationError::InvalidLongitude));
    }

    #[test]
    fn test_eco_tag_limit() {
        let tags = |n: usize| (0..n).map(|i| format!("tag-{i}")).collect::<Vec<_>>();
        assert_eq!(check(&valid().with_eco_tags(tags(10))), Ok(()));

        let err = check(&valid().with_eco_tags(tags(11))).unwrap_err();
        assert_eq!(err, ValidationError::TooManyEcoTags(10));
        assert_eq!(err.to_string(), "Eco tags must be an array with max 10 items");
    }

    #[test]
    fn test_attachment_limit() {
        let files = |n: usize| {
            (0..n)
                .map(|i| Attachment::new(format!("{i}.jpg"), "image/jpeg", vec![0]))
                .collect::<Vec<_>>()
        };
        assert_eq!(check(&valid().with_attachments(files(20))), Ok(()));

        let err = check(&valid().with_attachments(files(21))).unwrap_err();
        assert_eq!(err.to_string(), "Maximum 20 images allowed per listing");
    }

    #[test]
    fn test_custom_limits() {
        let limits = ValidationLimits { max_eco_tags: 1, max_attachments: 0 };
        let listing = valid().with_eco_tags(vec!["a".into(), "b".into()]);
        assert_eq!(
            validate_listing(&listing, &limits).unwrap_err().to_string(),
            "Eco tags must be an array with max 1 items"
        );
    }

    #[test]
    fn test_outcomes_are_index_aligned() {
        let mut bad = valid();
        bad.name = String::new();
        let listings = vec![valid(), valid(), bad, valid()];

        let outcomes = validate_listings(&listings, &ValidationLimits::default());
        assert_eq!(outcomes.len(), 4);
        assert!(outcomes[0].is_valid());
        assert!(outcomes[1].is_valid());
        assert_eq!(outcomes[2].reason().as_deref(), Some("Name is required"));
        assert!(std::ptr::eq(outcomes[2].record(), &listings[2]));
        assert!(outcomes[3].is_valid());
    }

    #[test]
    fn test_update_checks() {
        assert_eq!(validate_update(&DocumentUpdate::new("a", json!({"x": 1}))), Ok(()));
        assert_eq!(validate_update(&DocumentUpdate::new(" ", json!({}))), Err(ValidationError::MissingId));
        assert_eq!(validate_update(&DocumentUpdate::new("a", json!([1]))), Err(ValidationError::InvalidPatch));
        assert_eq!(validate_update(&DocumentUpdate::new("a", json!(null))), Err(ValidationError::InvalidPatch));
    }

    #[test]
    fn test_delete_checks() {
        let ids = vec!["a".to_string(), "".to_string()];
        let outcomes = validate_delete_ids(&ids);
        assert!(outcomes[0].is_valid());
        assert_eq!(outcomes[1].reason().as_deref(), Some("Document id is required"));
    }
}
