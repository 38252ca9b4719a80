use crate::cache::CacheStore;
use crate::services::ResultStore;
use crate::utils::{get_cache_dir, get_results_db_path, get_universe_path};

pub async fn run() {
    println!("📋 marketpulse status\n");

    let universe_path = get_universe_path();
    println!("   🗂  Universe file: {} ({})", universe_path.display(), if universe_path.exists() { "present" } else { "missing" });

    let cache_dir = get_cache_dir();
    let cache = CacheStore::new(cache_dir.clone());
    match cache.stats().await {
        Ok(stats) => {
            println!("   📁 Cache dir:     {}", cache_dir.display());
            println!("      Entries:       {} current, {} legacy", stats.current_entries, stats.legacy_entries);
            println!("      Size:          {:.2} MB", stats.total_bytes as f64 / (1024.0 * 1024.0));
            if stats.legacy_entries > 0 {
                println!("      💡 Run `marketpulse migrate-cache` to re-encode legacy entries");
            }
        }
        Err(e) => eprintln!("   ⚠️  Could not read cache stats: {}", e),
    }

    let db_path = get_results_db_path();
    if db_path.exists() {
        match ResultStore::new(db_path.clone()).await {
            Ok(store) => match store.count().await {
                Ok(count) => {
                    println!("   💾 Result store:  {}", db_path.display());
                    println!("      Rows:          {}", count);
                }
                Err(e) => eprintln!("   ⚠️  Could not count results: {}", e),
            },
            Err(e) => eprintln!("   ⚠️  Could not open result store: {}", e),
        }
    } else {
        println!("   💾 Result store:  {} (not created yet)", db_path.display());
    }
}
