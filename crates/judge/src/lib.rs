pub mod client;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod events;
pub mod leaderboard;
pub mod poller;
pub mod registry;
pub mod service;
pub mod store;

pub use client::HttpJudgeClient;
pub use config::{JudgeConfig, JudgeEndpointConfig, LimitsConfig, PollingConfig};
pub use error::{ErrorKind, JudgeError, Result};
pub use events::{EventBroadcaster, EventStream, JudgeEvent};
pub use leaderboard::{LeaderboardService, LeaderboardView};
pub use poller::{JudgePoller, PollContext, PollOutcome};
pub use registry::PollerRegistry;
pub use service::{JudgeService, Stores, SubmitRequest};
pub use store::{
    ContestStore, InMemoryStore, LeaderboardStore, ProblemCatalog, ProblemSpec, SubmissionStore,
    TestcaseSpec,
};
