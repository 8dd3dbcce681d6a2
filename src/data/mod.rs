pub mod types;
pub mod candle_store;
pub mod quotes;

pub use types::{Bar, SeriesKey};
pub use candle_store::{CandleStore, UpsertOutcome, MAX_BARS};
pub use quotes::{LiveQuote, QuoteCache};
