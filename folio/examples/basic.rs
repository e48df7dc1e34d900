// Example: read-through collection queries with shared in-flight fetches.
use folio::{CacheOptions, MemoryStore, Projects, QueryCache, User};
use serde_json::json;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let store = MemoryStore::new().with_latency_ms(50);
    for name in ["Ledger", "Relay"] {
        let fields = json!({ "name": name }).as_object().cloned().unwrap_or_default();
        store.insert("projects", fields);
    }
    let profile = json!({ "userInfo": { "text_blocks": { "mail": "me@example.com" } } });
    store.insert("user", profile.as_object().cloned().unwrap_or_default());

    let cache = QueryCache::with_options(
        store.clone(),
        CacheOptions::new().with_fetch_timeout_ms(Some(2_000)),
    );

    // Two consumers asking at once share one fetch.
    let mut a = cache.query::<Projects>();
    let mut b = cache.query::<Projects>();
    println!("initial status={:?}", a.status());
    let (ra, rb) = tokio::join!(a.settled(), b.settled());
    println!(
        "settled: a={} items, b={} items, store fetches={}",
        ra.data.len(),
        rb.data.len(),
        store.fetch_count("projects")
    );
    for item in &ra.data {
        println!("  {} -> {}", item.id, item.data["name"]);
    }

    // A later consumer is served from the cache.
    let cached = cache.cached::<Projects>();
    println!("cached hit={}", cached.is_some());

    // Writes are not observed until a refetch.
    store.insert("projects", json!({ "name": "Atlas" }).as_object().cloned().unwrap_or_default());
    let refreshed = cache.refetch::<Projects>().settled().await;
    println!(
        "after refetch: {} items, generation={}",
        refreshed.data.len(),
        refreshed.generation
    );

    let user = cache.fetch::<User>().await;
    println!("user docs={:?}", user.data);
}
