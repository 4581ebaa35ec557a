//! End-to-end tests composing the full middleware chain the way a service
//! would: filter the input, serve through the cache, purge after mutations.

mod common;

use std::sync::Arc;

use serde_json::json;

use common::{CountingPreferences, RecordingPurger, sample_preferences, test_data::Listing};
use rpc_edge_cache::{
    CacheOptions, CachePipelineBuilder, CallContext, EdgeCacheOptions, Viewer,
};

/// Filtered inputs keep differently-scoped viewers on separate cache
/// entries: an anonymous viewer must never see a payload cached for an
/// unrestricted one.
#[tokio::test]
async fn test_audiences_get_separate_entries() {
    let pipeline = CachePipelineBuilder::new()
        .with_preferences(CountingPreferences::new(sample_preferences()))
        .namespace("pipeline")
        .build();

    let handler = || async { Ok::<_, anyhow::Error>(Listing::sample()) };

    // Unrestricted viewer, no filtering.
    let ctx = CallContext::for_viewer(Viewer::unrestricted(7));
    ctx.allow_caching();
    let input = pipeline
        .preferences()
        .apply(&json!({ "limit": 20 }), &ctx)
        .await
        .unwrap();
    let first = pipeline
        .app_cache()
        .wrap("image.getInfinite", &input, &CacheOptions::default(), &ctx, handler)
        .await
        .unwrap();
    assert!(!first.is_hit());

    // Anonymous viewer; exclusions change the input, so the key changes.
    let anon = CallContext::anonymous();
    anon.allow_caching();
    let anon_input = pipeline
        .preferences()
        .apply(&json!({ "limit": 20 }), &anon)
        .await
        .unwrap();
    assert_ne!(input, anon_input);

    let second = pipeline
        .app_cache()
        .wrap("image.getInfinite", &anon_input, &CacheOptions::default(), &anon, handler)
        .await
        .unwrap();
    assert!(!second.is_hit(), "filtered audiences must not share entries");

    // Repeat calls per audience hit their own entries.
    let repeat = pipeline
        .app_cache()
        .wrap("image.getInfinite", &anon_input, &CacheOptions::default(), &anon, handler)
        .await
        .unwrap();
    assert!(repeat.is_hit());
}

/// The same audience converges on one entry even when the raw inputs differ
/// in padding.
#[tokio::test]
async fn test_same_audience_converges_on_one_entry() {
    let pipeline = CachePipelineBuilder::new()
        .with_preferences(CountingPreferences::new(sample_preferences()))
        .build();

    let handler = || async { Ok::<_, anyhow::Error>(Listing::sample()) };
    let ctx = CallContext::anonymous();
    ctx.allow_caching();

    let input = pipeline
        .preferences()
        .apply(&json!({ "limit": 20, "cursor": null }), &ctx)
        .await
        .unwrap();
    pipeline
        .app_cache()
        .wrap("tag.list", &input, &CacheOptions::default(), &ctx, handler)
        .await
        .unwrap();

    let same_meaning = pipeline
        .preferences()
        .apply(&json!({ "limit": 20, "page": 0 }), &ctx)
        .await
        .unwrap();
    let outcome = pipeline
        .app_cache()
        .wrap("tag.list", &same_meaning, &CacheOptions::default(), &ctx, handler)
        .await
        .unwrap();

    assert!(outcome.is_hit());
}

/// Reads flow through the edge fallback in development; a mutation then
/// purges the matching tags.
#[tokio::test]
async fn test_read_then_mutate_then_purge() {
    let purger = Arc::new(RecordingPurger::new());
    let pipeline = CachePipelineBuilder::new()
        .with_purger(purger.clone())
        .build();

    let ctx = CallContext::for_viewer(Viewer::unrestricted(3));
    ctx.allow_caching();

    let input = pipeline
        .preferences()
        .apply(&json!({ "id": 42 }), &ctx)
        .await
        .unwrap();
    let opts = EdgeCacheOptions::default()
        .ttl_secs(120)
        .tags(|input| vec![format!("model-{}", input["id"])]);

    let read = pipeline
        .edge_cache()
        .wrap("model.getById", &input, &opts, &ctx, || async {
            Ok::<_, anyhow::Error>(Listing::sample())
        })
        .await
        .unwrap();
    assert!(!read.is_hit());

    let tags = vec!["model-42".to_string()];
    pipeline
        .purge()
        .wrap(&tags, || async { Ok::<_, anyhow::Error>(()) })
        .await
        .unwrap();

    assert_eq!(purger.calls(), vec![tags]);
}

/// The zero-config builder serves a working pipeline.
#[tokio::test]
async fn test_builder_defaults_work_end_to_end() {
    let pipeline = CachePipelineBuilder::new().build();
    let ctx = CallContext::anonymous();
    ctx.allow_caching();

    let input = pipeline
        .preferences()
        .apply(&json!({ "limit": 5 }), &ctx)
        .await
        .unwrap();

    let first = pipeline
        .app_cache()
        .wrap("tag.list", &input, &CacheOptions::default(), &ctx, || async {
            Ok::<_, anyhow::Error>(Listing::sample())
        })
        .await
        .unwrap();
    let second = pipeline
        .app_cache()
        .wrap("tag.list", &input, &CacheOptions::default(), &ctx, || async {
            Ok::<_, anyhow::Error>(Listing::sample())
        })
        .await
        .unwrap();

    assert!(!first.is_hit());
    assert!(second.is_hit());
    assert_eq!(pipeline.app_cache().store_name(), "memory");
}
