use crate::services::ResultStore;
use crate::utils::get_results_db_path;

pub async fn run(duplicates_only: bool) {
    let store = match ResultStore::new(get_results_db_path()).await {
        Ok(store) => store,
        Err(e) => {
            eprintln!("❌ Failed to open result store: {}", e);
            std::process::exit(1);
        }
    };

    let outcome = if duplicates_only {
        store.clear_duplicates().await
    } else {
        store.clear_history().await
    };

    match outcome {
        Ok(removed) if duplicates_only => {
            println!("✅ Removed {} duplicate row(s), latest result per symbol retained", removed)
        }
        Ok(removed) => println!("✅ Removed {} stored result(s)", removed),
        Err(e) => {
            eprintln!("❌ Clear failed: {}", e);
            std::process::exit(1);
        }
    }
}
