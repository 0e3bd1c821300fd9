pub mod github;
pub mod telnyx;

pub use github::GitHubClient;
pub use telnyx::TelnyxClient;
