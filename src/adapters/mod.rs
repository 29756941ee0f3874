pub mod market_source;
pub mod sqlite;
pub mod transaction_manager;

pub use market_source::{
    market_from_summary, screen_opportunities, snapshot_from_summary, MarketFeed, MarketFilters,
    MarketSource, MarketSummary, Opportunity, ScreenCriteria,
};
pub use sqlite::SqliteStore;
pub use transaction_manager::{ManagedTransaction, TransactionManager, TransactionScope};
