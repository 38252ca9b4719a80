mod market;
mod ohlcv;
mod signal;
mod timeframe;

pub use market::Market;
pub use ohlcv::Ohlcv;
pub use signal::{CompositeResult, ModuleScore, Signal};
pub use timeframe::{Interval, Period};
