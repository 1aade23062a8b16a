//! Property-based tests (fuzzing) for bulk engine invariants.
//!
//! Uses proptest to generate random listings and failure patterns and checks
//! that validation is deterministic and every input record gets exactly one
//! outcome, whatever the mix of invalid records and store failures.
//!
//! Run with: `cargo test --test proptest_fuzz`

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use proptest::prelude::*;
use serde_json::Value;

use bulk_engine::store::InMemoryDocumentStore;
use bulk_engine::validation::{validate_listing, validate_listings};
use bulk_engine::{
    BulkEngine, BulkEngineConfig, Coordinates, CreateBatchOptions, Document, DocumentStore,
    ListingInput, StoreError, ValidationLimits,
};

// =============================================================================
// Strategies for generating test data
// =============================================================================

fn listing_type_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("accommodation".to_string()),
        Just("coworking".to_string()),
        Just("cafe".to_string()),
        Just("activity".to_string()),
        "[a-z]{0,12}",
    ]
}

fn website_strategy() -> impl Strategy<Value = Option<String>> {
    prop_oneof![
        Just(None),
        Just(Some("https://example.org".to_string())),
        "[a-z:/. ]{0,20}".prop_map(Some),
    ]
}

/// Listings that are sometimes valid, sometimes not.
fn listing_strategy() -> impl Strategy<Value = ListingInput> {
    (
        "[ a-zA-Z]{0,16}",
        listing_type_strategy(),
        "[ a-zA-Z]{0,10}",
        "[ a-zA-Z]{0,10}",
        website_strategy(),
        prop::option::of((-120.0f64..120.0, -200.0f64..200.0)),
        prop::collection::vec("[a-z]{1,8}", 0..14),
    )
        .prop_map(|(name, listing_type, city, country, website, coords, eco_tags)| {
            let mut listing = ListingInput::new(name, listing_type, city, country);
            listing.website = website;
            listing.coordinates = coords.map(|(lat, lng)| Coordinates { lat, lng });
            listing.eco_tags = eco_tags;
            listing
        })
}

// =============================================================================
// Store double: fails a fixed set of names on every attempt
// =============================================================================

struct SelectiveStore {
    inner: InMemoryDocumentStore,
    failing: HashSet<String>,
}

#[async_trait]
impl DocumentStore for SelectiveStore {
    async fn create(&self, document: Value) -> Result<Document, StoreError> {
        let name = document["name"].as_str().unwrap_or_default();
        if self.failing.contains(name) {
            return Err(StoreError::Backend(format!("rejected {name}")));
        }
        self.inner.create(document).await
    }

    async fn update(&self, id: &str, patch: Value) -> Result<Document, StoreError> {
        self.inner.update(id, patch).await
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.inner.delete(id).await
    }
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .expect("runtime")
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Validating the same record twice yields the same outcome.
    #[test]
    fn validation_is_deterministic(listing in listing_strategy()) {
        let limits = ValidationLimits::default();
        prop_assert_eq!(validate_listing(&listing, &limits), validate_listing(&listing, &limits));
    }

    /// Outcomes line up one-to-one with the input.
    #[test]
    fn validation_outcomes_are_index_aligned(listings in prop::collection::vec(listing_strategy(), 0..20)) {
        let limits = ValidationLimits::default();
        let outcomes = validate_listings(&listings, &limits);
        prop_assert_eq!(outcomes.len(), listings.len());
        for (listing, outcome) in listings.iter().zip(&outcomes) {
            prop_assert!(std::ptr::eq(listing, outcome.record()));
            prop_assert_eq!(outcome.is_valid(), validate_listing(listing, &limits).is_ok());
        }
    }

    /// Every record ends with exactly one outcome; failures keep their input index.
    #[test]
    fn batch_accounts_for_every_record(
        listings in prop::collection::vec(listing_strategy(), 0..16),
        failing_mask in prop::collection::vec(any::<bool>(), 16),
        concurrency in 1usize..6,
    ) {
        let failing: HashSet<String> = listings
            .iter()
            .zip(&failing_mask)
            .filter(|(_, fail)| **fail)
            .map(|(l, _)| l.name.trim().to_string())
            .collect();
        let store = Arc::new(SelectiveStore { inner: InMemoryDocumentStore::new(), failing });
        let config = BulkEngineConfig {
            concurrency,
            retry_base_delay_ms: 0,
            window_pause_ms: 0,
            ..Default::default()
        };
        let engine = BulkEngine::new(store, config).unwrap();

        let result = runtime()
            .block_on(engine.run_create_batch(&listings, CreateBatchOptions::default()))
            .unwrap();

        prop_assert_eq!(result.total, listings.len());
        prop_assert_eq!(result.success_count + result.failure_count, result.total);
        prop_assert_eq!(result.successes.len(), result.success_count);
        prop_assert_eq!(result.failures.len(), result.failure_count);

        let indices: HashSet<usize> = result.failures.iter().map(|f| f.index).collect();
        prop_assert_eq!(indices.len(), result.failure_count);
        prop_assert!(indices.iter().all(|&i| i < listings.len()));
        for failure in &result.failures {
            prop_assert_eq!(&failure.data["name"], &Value::String(listings[failure.index].name.clone()));
        }
    }

    /// validate_only never produces more successes than valid records.
    #[test]
    fn validate_only_counts_valid_records(listings in prop::collection::vec(listing_strategy(), 0..20)) {
        let store = Arc::new(InMemoryDocumentStore::new());
        let engine = BulkEngine::new(store.clone(), BulkEngineConfig::default()).unwrap();
        let options = CreateBatchOptions { validate_only: true, ..Default::default() };

        let result = runtime().block_on(engine.run_create_batch(&listings, options)).unwrap();

        let valid = validate_listings(&listings, &ValidationLimits::default())
            .iter()
            .filter(|o| o.is_valid())
            .count();
        prop_assert_eq!(result.success_count, valid);
        prop_assert!(store.is_empty());
    }
}
