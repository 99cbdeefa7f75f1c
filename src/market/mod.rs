pub mod cache;
pub mod source;

pub use cache::{MarketPriceCache, PriceCacheSummary, PriceQuote, CURRENCIES};
pub use source::{ExchangeRateSource, JsonRateSource};
