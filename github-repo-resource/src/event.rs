//! Typed view of the CloudFormation custom resource request.
//! See https://docs.aws.amazon.com/AWSCloudFormation/latest/UserGuide/crpg-ref-requests.html
//!
//! Parsing is done in two steps:
//! 1. the bookkeeping fields needed to send a response back to CloudFormation
//! 2. the resource properties, which are only validated inside the handler so that
//!    a bad template still gets a FAILED response instead of a stuck stack

use crate::error::Error;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::fmt;

const GITHUB_TOKEN: &str = "GitHubToken";
const REPO_NAME: &str = "RepoName";
const REPO_DESCRIPTION: &str = "RepoDescription";
const DELETE_REPO: &str = "DeleteRepo";

/// What CloudFormation wants done with the resource.
/// Anything not documented by AWS is kept verbatim for logging.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum RequestType {
    Create,
    Update,
    Delete,
    Other(String),
}

impl From<String> for RequestType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "Create" => Self::Create,
            "Update" => Self::Update,
            "Delete" => Self::Delete,
            _ => Self::Other(value),
        }
    }
}

impl fmt::Display for RequestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Create => f.write_str("Create"),
            Self::Update => f.write_str("Update"),
            Self::Delete => f.write_str("Delete"),
            Self::Other(v) => f.write_str(v),
        }
    }
}

/// The inbound event with only the fields this resource cares about.
/// Other fields sent by CloudFormation (ServiceToken, ResourceType, OldResourceProperties) are ignored.
/// No Debug because the properties contain the GitHub token, use [redact_token] for logging.
#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LifecycleEvent {
    /// Not needed to address the response, so a missing value is reported as FAILED
    #[serde(default)]
    pub request_type: Option<RequestType>,
    /// Pre-signed S3 URL for the response
    #[serde(rename = "ResponseURL")]
    pub response_url: String,
    pub stack_id: String,
    pub request_id: String,
    pub logical_resource_id: String,
    /// Validated later with [RepoProperties::from_properties]
    #[serde(default)]
    pub resource_properties: Map<String, Value>,
}

impl LifecycleEvent {
    /// Extracts the event from the raw payload passed by the Lambda runtime.
    pub fn from_value(payload: Value) -> Result<Self, Error> {
        serde_json::from_value(payload).map_err(Error::InvalidEvent)
    }
}

/// Validated resource properties from the template.
#[derive(Clone, PartialEq, Eq)]
pub struct RepoProperties {
    pub token: String,
    pub name: String,
    pub description: String,
    /// Delete the repo from GitHub when the resource is deleted from the stack
    pub delete_on_removal: bool,
}

impl RepoProperties {
    pub fn from_properties(props: &Map<String, Value>) -> Result<Self, Error> {
        Ok(Self {
            token: required_str(props, GITHUB_TOKEN)?.to_owned(),
            name: repo_name(required_str(props, REPO_NAME)?)?.to_owned(),
            description: required_str(props, REPO_DESCRIPTION)?.to_owned(),
            delete_on_removal: parse_flag(DELETE_REPO, required_str(props, DELETE_REPO)?)?,
        })
    }
}

// the token must never end up in CloudWatch
impl fmt::Debug for RepoProperties {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RepoProperties")
            .field("token", &"***")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("delete_on_removal", &self.delete_on_removal)
            .finish()
    }
}

/// CloudFormation passes all scalar properties as strings, so anything else is a template error.
fn required_str<'a>(props: &'a Map<String, Value>, name: &'static str) -> Result<&'a str, Error> {
    match props.get(name) {
        None | Some(Value::Null) => Err(Error::MissingProperty(name)),
        Some(Value::String(v)) => Ok(v.as_str()),
        Some(v) => Err(Error::InvalidProperty {
            name,
            value: v.to_string(),
        }),
    }
}

/// GitHub allows only ASCII letters, digits, `.`, `-` and `_`, up to 100 chars.
/// The name ends up in the API path, so anything else is rejected before it gets there.
fn repo_name(value: &str) -> Result<&str, Error> {
    let valid = !value.is_empty()
        && value.len() <= 100
        && value != "."
        && value != ".."
        && value
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'.' || b == b'-' || b == b'_');

    if valid {
        Ok(value)
    } else {
        Err(Error::InvalidProperty {
            name: REPO_NAME,
            value: value.to_owned(),
        })
    }
}

/// Converts exactly `"true"` / `"false"` into a bool, anything else is an error.
fn parse_flag(name: &'static str, value: &str) -> Result<bool, Error> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(Error::InvalidProperty {
            name,
            value: value.to_owned(),
        }),
    }
}

/// Returns a copy of the raw event that is safe to log.
pub fn redact_token(payload: &Value) -> Value {
    let mut payload = payload.clone();
    if let Some(token) = payload
        .get_mut("ResourceProperties")
        .and_then(|props| props.get_mut(GITHUB_TOKEN))
    {
        *token = Value::String("***".to_owned());
    }
    payload
}
