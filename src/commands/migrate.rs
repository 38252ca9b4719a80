use crate::cache::CacheStore;
use crate::utils::get_cache_dir;

pub async fn run() {
    let cache_dir = get_cache_dir();
    println!("🔄 Migrating legacy cache entries in {}...", cache_dir.display());

    let store = CacheStore::new(cache_dir);
    match store.migrate().await {
        Ok(0) => println!("✅ Nothing to migrate, cache is already in the current encoding"),
        Ok(count) => println!("✅ Migrated {} cache entr{}", count, if count == 1 { "y" } else { "ies" }),
        Err(e) => {
            eprintln!("❌ Migration failed: {}", e);
            std::process::exit(1);
        }
    }
}
