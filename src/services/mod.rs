mod fetcher;
mod result_store;
mod universe;

pub use fetcher::{FetchRequest, ResilientFetcher};
pub use result_store::{ResultStore, StoredResult};
pub use universe::{load_universe, UniverseEntry};
