pub mod aggregator;
pub mod backend;
pub mod config;
pub mod display;
pub mod error;
pub mod fetcher;
pub mod filter;
pub mod gate;
pub mod latency;
pub mod payment;
pub mod session;
pub mod state;
pub mod types;

pub use aggregator::{FeedAggregator, LoadStats};
pub use backend::{FeedBackend, HttpBackend, VerifyRequest};
pub use config::Config;
pub use error::{AppError, Result, VerificationFailure};
pub use filter::{FilterSelection, LeagueTag, StatusTab};
pub use gate::{is_visible, Entitlement, GatedRow, RowContent};
pub use payment::{PaymentVerificationMachine, VerificationState, VerificationTicket};
pub use session::Session;
pub use types::{Analysis, FeedRow, Fixture, FixtureStatus, MatchContext, Prediction};
