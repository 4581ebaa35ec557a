//! Basic Usage Demo
//!
//! Filters a call input for two different viewers, then serves a listing
//! through the application cache.
//!
//! Run with: cargo run --example basic_usage

use rpc_edge_cache::{CacheOptions, CachePipelineBuilder, CallContext, Viewer};
use serde_json::json;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    println!("=== RPC Edge Cache: Basic Usage ===\n");

    // 1. Assemble the pipeline (defaults: in-memory store, JSON codec)
    let pipeline = CachePipelineBuilder::new().namespace("demo").build();

    // 2. Filter the same raw input for two audiences
    let raw_input = json!({ "limit": 3, "period": "Week" });

    let anon = CallContext::anonymous();
    let anon_input = pipeline.preferences().apply(&raw_input, &anon).await?;
    println!("Anonymous input (pinned to sfw):\n  {anon_input}\n");

    let viewer = CallContext::for_viewer(Viewer::unrestricted(7));
    let viewer_input = pipeline.preferences().apply(&raw_input, &viewer).await?;
    println!("Unrestricted viewer input:\n  {viewer_input}\n");

    // 3. Serve through the application cache; the handler opts in
    anon.allow_caching();
    let handler = || async {
        println!("  ... handler computing listing ...");
        anyhow::Ok(json!({ "items": ["fog", "mist", "haze"], "total": 3 }))
    };

    println!("First call (cold):");
    let first = pipeline
        .app_cache()
        .wrap("tag.list", &anon_input, &CacheOptions::default(), &anon, handler)
        .await?;
    println!("  hit = {}\n", first.is_hit());

    println!("Second call (same audience, padded input):");
    let padded = pipeline
        .preferences()
        .apply(&json!({ "limit": 3, "period": "Week", "cursor": null }), &anon)
        .await?;
    let second = pipeline
        .app_cache()
        .wrap("tag.list", &padded, &CacheOptions::default(), &anon, handler)
        .await?;
    println!("  hit = {}\n", second.is_hit());

    // 4. Statistics
    let stats = pipeline.app_cache().stats();
    println!("=== Cache Statistics ===");
    println!("Hits: {}", stats.hits);
    println!("Misses: {}", stats.misses);
    println!("Writes: {}", stats.writes);
    println!("Hit ratio: {:.2}%", stats.hit_ratio() * 100.0);

    Ok(())
}
