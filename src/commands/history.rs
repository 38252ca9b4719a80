use crate::services::ResultStore;
use crate::utils::get_results_db_path;

pub async fn run(symbol: Option<String>, limit: usize) {
    let store = match ResultStore::new(get_results_db_path()).await {
        Ok(store) => store,
        Err(e) => {
            eprintln!("❌ Failed to open result store: {}", e);
            std::process::exit(1);
        }
    };

    let rows = match store.get_history(symbol.as_deref(), limit).await {
        Ok(rows) => rows,
        Err(e) => {
            eprintln!("❌ Failed to query history: {}", e);
            std::process::exit(1);
        }
    };

    if rows.is_empty() {
        match symbol {
            Some(symbol) => println!("📭 No results stored for {}", symbol),
            None => println!("📭 No results stored yet"),
        }
        return;
    }

    println!("📊 {} result(s):", rows.len());
    for row in rows {
        let confidence = if row.low_confidence { " ⚠️ low confidence" } else { "" };
        println!(
            "   {} [{}] {} composite {:.1} ({} | run {}){}",
            row.symbol,
            row.market,
            row.signal,
            row.composite_score,
            row.created_at.format("%Y-%m-%d %H:%M UTC"),
            row.run_id,
            confidence,
        );
    }
}
