//! Sends the result of the invocation back to CloudFormation.
//! See https://docs.aws.amazon.com/AWSCloudFormation/latest/UserGuide/crpg-ref-responses.html

use crate::error::Error;
use crate::event::LifecycleEvent;
use lambda_runtime::Context;
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE};
use reqwest::Client;
use serde::Serialize;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    Success,
    Failed,
}

/// Free-form data returned to the stack. CloudFormation exposes it via Fn::GetAtt.
#[derive(Debug, Serialize)]
pub struct ResponseData<'a> {
    #[serde(rename = "Message")]
    pub message: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ResponseEnvelope<'a> {
    pub status: Status,
    pub reason: String,
    pub physical_resource_id: &'a str,
    pub stack_id: &'a str,
    pub request_id: &'a str,
    pub logical_resource_id: &'a str,
    pub data: ResponseData<'a>,
}

impl<'a> ResponseEnvelope<'a> {
    /// The log stream is used as the physical ID, same as the reason points at it for details.
    pub fn new(event: &'a LifecycleEvent, ctx: &'a Context, status: Status, message: &'a str) -> Self {
        let log_stream = ctx.env_config.log_stream.as_str();
        Self {
            status,
            reason: ["See the details in CloudWatch Log Stream: ", log_stream].concat(),
            physical_resource_id: log_stream,
            stack_id: &event.stack_id,
            request_id: &event.request_id,
            logical_resource_id: &event.logical_resource_id,
            data: ResponseData { message },
        }
    }
}

/// PUTs the response to the pre-signed URL from the event.
/// There is no retry. Any failure is returned to the runtime as an invocation error.
pub async fn send_response(
    client: &Client,
    event: &LifecycleEvent,
    ctx: &Context,
    status: Status,
    message: &str,
) -> Result<(), Error> {
    let body = serde_json::to_string(&ResponseEnvelope::new(event, ctx, status, message)).map_err(Error::Serialize)?;

    info!("ResponseURL: {}", event.response_url);
    info!("ResponseBody: {body}");

    // the URL is pre-signed without a content type, so S3 rejects the request if one is sent
    let resp = client
        .put(&event.response_url)
        .header(CONTENT_TYPE, "")
        .header(CONTENT_LENGTH, body.len())
        .body(body)
        .send()
        .await?;

    let status = resp.status();
    info!("Status code: {}", status.as_u16());

    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(Error::Callback {
            status: status.as_u16(),
            body,
        });
    }

    Ok(())
}
