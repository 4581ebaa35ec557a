//! Edge Directives Demo
//!
//! Runs the annotator in production mode, prints the headers the transport
//! layer would emit, then purges the matching tags after a mutation.
//!
//! Run with: cargo run --example edge_directives

use rpc_edge_cache::{
    CachePipelineBuilder, CallContext, EdgeCacheOptions, Environment, Viewer,
};
use serde_json::json;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug")),
        )
        .init();

    println!("=== RPC Edge Cache: Edge Directives ===\n");

    // 1. Production pipeline; the default purger just logs
    let pipeline = CachePipelineBuilder::new()
        .namespace("demo")
        .environment(Environment::Production)
        .build();

    // 2. A read that wants a long edge TTL and tag addressing
    let ctx = CallContext::for_viewer(Viewer::unrestricted(7));
    ctx.allow_caching();

    let input = pipeline
        .preferences()
        .apply(&json!({ "id": 42 }), &ctx)
        .await?;
    let opts = EdgeCacheOptions::default()
        .ttl_secs(500)
        .tags(|input| vec![format!("Model {}", input["id"]), "Front Page".to_string()]);

    let outcome = pipeline
        .edge_cache()
        .wrap("model.getById", &input, &opts, &ctx, || async {
            anyhow::Ok(json!({ "id": 42, "name": "Foggy Mountains", "downloads": 12840 }))
        })
        .await?;
    println!("Handler ran, hit = {}\n", outcome.is_hit());

    // 3. The headers the transport layer would attach
    if let Some(directive) = ctx.directive() {
        println!("Cache-Control: {}", directive.cache_control());
        if let Some(tag_header) = directive.cache_tag() {
            println!("Cache-Tag: {tag_header}");
        }
        println!();
    }

    // 4. A mutation purges the tags it invalidates
    println!("Updating model 42, then purging...");
    pipeline
        .purge()
        .wrap(&["model-42".to_string()], || async {
            anyhow::Ok(json!({ "updated": true }))
        })
        .await?;

    println!("Done.");
    Ok(())
}
