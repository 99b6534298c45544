pub mod analyzer;
pub mod dedup;
pub mod scheduler;
pub mod session;
pub mod yahoo;

pub use analyzer::Analyzer;
pub use dedup::{decide, AlertState, Decision};
pub use scheduler::{Phase, Scheduler, SubscriptionWorker, TickOutcome};
pub use session::SessionGate;
pub use yahoo::YahooClient;
