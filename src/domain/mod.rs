pub mod ids;
pub mod market;
pub mod outcome;
pub mod prediction;
pub mod state;
pub mod trade;

pub use ids::*;
pub use market::*;
pub use outcome::*;
pub use prediction::*;
pub use state::*;
pub use trade::*;
