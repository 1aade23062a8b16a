// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Basic bulk-engine usage example.
//!
//! Demonstrates:
//! 1. Building an engine over in-memory document and asset stores
//! 2. A validate-only dry run
//! 3. A create batch with one invalid record and a progress observer
//! 4. Updating and soft-deleting what was created
//! 5. Displaying the captured metrics
//!
//! # Run
//!
//! ```bash
//! RUST_LOG=bulk_engine=debug cargo run --example basic_usage
//! ```

use std::sync::Arc;

use bulk_engine::store::{InMemoryAssetStore, InMemoryDocumentStore};
use bulk_engine::{
    Attachment, BulkEngine, BulkEngineConfig, CreateBatchOptions, DeleteBatchOptions,
    DocumentUpdate, ListingInput, UpdateBatchOptions,
};
use metrics_util::debugging::{DebugValue, DebuggingRecorder, Snapshotter};
use serde_json::json;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    recorder.install().expect("failed to install metrics recorder");

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("bulk_engine=info")))
        .with_target(false)
        .compact()
        .init();

    println!("\n╔═══════════════════════════════════════════════════════════════╗");
    println!("║             bulk-engine: Basic Usage Example                  ║");
    println!("╚═══════════════════════════════════════════════════════════════╝\n");

    // ─────────────────────────────────────────────────────────────────────────
    // 1. Build the engine
    // ─────────────────────────────────────────────────────────────────────────
    let documents = Arc::new(InMemoryDocumentStore::new());
    let assets = Arc::new(InMemoryAssetStore::new());
    let config = BulkEngineConfig {
        concurrency: 2,
        window_pause_ms: 50,
        retry_base_delay_ms: 100,
        ..Default::default()
    };
    let engine = BulkEngine::new(documents.clone(), config)?.with_uploader(assets.clone());
    println!("📦 Engine ready: {:?}", engine.config());

    let listings = vec![
        ListingInput::new("Blue Door Cafe", "cafe", "Lisbon", "Portugal")
            .with_website("https://bluedoor.example")
            .with_eco_tags(vec!["organic".into(), "zero-waste".into()]),
        ListingInput::new("Hub Kreuzberg", "coworking", "Berlin", "Germany").with_coordinates(52.49, 13.42),
        ListingInput::new("   ", "cafe", "Porto", "Portugal"),
        ListingInput::new("Casa Verde", "accommodation", "Oaxaca", "Mexico").with_attachments(vec![
            Attachment::new("front.jpg", "image/jpeg", vec![0xFF, 0xD8, 0xFF]),
            Attachment::new("menu.pdf", "application/pdf", vec![0x25, 0x50]),
        ]),
        ListingInput::new("Canopy Walk", "activity", "Monteverde", "Costa Rica"),
    ];

    // ─────────────────────────────────────────────────────────────────────────
    // 2. Dry run
    // ─────────────────────────────────────────────────────────────────────────
    println!("\n🔍 Validate-only run...");
    let dry = engine
        .run_create_batch(&listings, CreateBatchOptions { validate_only: true, ..Default::default() })
        .await?;
    println!("   └─ {}", dry.summary);
    for failure in dry.failures_by_index() {
        println!("   └─ #{} rejected: {}", failure.index, failure.error);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // 3. Create
    // ─────────────────────────────────────────────────────────────────────────
    println!("\n📝 Creating listings...");
    let options = CreateBatchOptions::default()
        .with_progress(|done, total, stage| println!("   │  {stage}: {done}/{total}"));
    let created = engine.run_create_batch(&listings, options).await?;
    println!("   └─ {}", created.summary);
    for success in &created.successes {
        let images = success.data.content["images"].as_array().map_or(0, Vec::len);
        println!("   └─ {} → {} ({} images)", success.id, success.data.content["name"], images);
    }
    println!("   📷 Assets stored: {}", assets.len());

    // ─────────────────────────────────────────────────────────────────────────
    // 4. Update, then soft delete
    // ─────────────────────────────────────────────────────────────────────────
    let ids: Vec<String> = created.successes.iter().map(|s| s.id.clone()).collect();

    println!("\n✏️  Approving listings...");
    let updates: Vec<DocumentUpdate> = ids
        .iter()
        .map(|id| DocumentUpdate::new(id.clone(), json!({ "status": "approved" })))
        .collect();
    let updated = engine
        .run_update_batch(&updates, UpdateBatchOptions { reason: Some("moderation".into()), ..Default::default() })
        .await?;
    println!("   └─ {}", updated.summary);

    println!("\n🗑️  Soft deleting listings...");
    let deleted = engine
        .run_delete_batch(&ids, DeleteBatchOptions { soft_delete: true, ..Default::default() })
        .await?;
    println!("   └─ {}", deleted.summary);
    println!("   └─ Documents still stored: {}", documents.len());

    // ─────────────────────────────────────────────────────────────────────────
    // 5. Metrics
    // ─────────────────────────────────────────────────────────────────────────
    println!("\n📈 Metrics:");
    dump_metrics(&snapshotter);

    println!("\n╔═══════════════════════════════════════════════════════════════╗");
    println!("║                    Example complete!                          ║");
    println!("╚═══════════════════════════════════════════════════════════════╝\n");

    Ok(())
}

/// Print counters and histogram sample counts, sorted by name.
fn dump_metrics(snapshotter: &Snapshotter) {
    let mut lines: Vec<String> = snapshotter
        .snapshot()
        .into_vec()
        .into_iter()
        .map(|(composite_key, _, _, value)| {
            let (_, key) = composite_key.into_parts();
            let labels: Vec<_> = key.labels().map(|l| format!("{}={}", l.key(), l.value())).collect();
            let name = if labels.is_empty() {
                key.name().to_string()
            } else {
                format!("{}{{{}}}", key.name(), labels.join(","))
            };
            match value {
                DebugValue::Counter(v) => format!("{name} = {v}"),
                DebugValue::Gauge(v) => format!("{name} = {:.2}", v.into_inner()),
                DebugValue::Histogram(samples) => {
                    let sum: f64 = samples.iter().map(|v| v.into_inner()).sum();
                    format!("{name} count={} sum={sum:.4}", samples.len())
                }
            }
        })
        .collect();
    lines.sort();

    if lines.is_empty() {
        println!("   └─ (no metrics recorded)");
    }
    for line in lines {
        println!("   └─ {line}");
    }
}
