//! CloudFormation custom resource for GitHub repositories.
//!
//! The Lambda receives Create / Update / Delete events for a `Custom::GitHubRepo` resource,
//! creates or deletes the repo via the GitHub API and reports the outcome back to CloudFormation
//! via the pre-signed response URL from the event.

pub mod callback;
pub mod config;
pub mod error;
pub mod event;
pub mod github;
pub mod handler;

pub use config::Config;
pub use error::Error;
pub use handler::handle;
