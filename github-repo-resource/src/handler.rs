use crate::callback::{send_response, Status};
use crate::config::Config;
use crate::error::Error;
use crate::event::{redact_token, LifecycleEvent, RepoProperties, RequestType};
use crate::github::{GitHub, NewRepo};
use lambda_runtime::{Context, LambdaEvent};
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, error, info, info_span, Instrument};

pub const MSG_CREATED: &str = "Resource creation successful!";
pub const MSG_UPDATED: &str = "Resource update successful!";
pub const MSG_DELETED: &str = "Resource deletion successful!";
pub const MSG_UNEXPECTED: &str = "Unexpected event received from CloudFormation";
pub const MSG_EXCEPTION: &str = "Exception during processing";

/// Handles one CloudFormation event and sends exactly one response back to CloudFormation.
///
/// Processing errors are logged and reported to CloudFormation as FAILED, so the invocation itself succeeds.
/// Only two things fail the invocation:
/// - an event that cannot be responded to because the bookkeeping fields are missing
/// - a failure to deliver the response
pub async fn handle(client: &Client, config: &Config, event: LambdaEvent<Value>) -> Result<(), Error> {
    let (payload, ctx) = event.into_parts();

    info!("REQUEST RECEIVED:\n{}", redact_token(&payload));
    debug!("Context: {:?}", ctx);

    let event = LifecycleEvent::from_value(payload)?;

    let request_type = event
        .request_type
        .as_ref()
        .map_or_else(String::new, RequestType::to_string);

    let span = info_span!(
        "cfn",
        request_id = %event.request_id,
        resource = %event.logical_resource_id,
        request_type = %request_type,
    );

    respond(client, config, &event, &ctx).instrument(span).await
}

async fn respond(client: &Client, config: &Config, event: &LifecycleEvent, ctx: &Context) -> Result<(), Error> {
    // the deadline is informational only, there is no timeout enforcement
    debug!("Deadline (ms since epoch): {}", ctx.deadline);

    let (status, message) = match process(client, config, event).await {
        Ok(v) => v,
        Err(e) => {
            error!("FAILED!");
            error!("EXCEPTION:\n{e}");
            (Status::Failed, MSG_EXCEPTION)
        }
    };

    send_response(client, event, ctx, status, message).await
}

/// Performs the GitHub side of the request and returns what should be reported to CloudFormation.
async fn process(
    client: &Client,
    config: &Config,
    event: &LifecycleEvent,
) -> Result<(Status, &'static str), Error> {
    let props = RepoProperties::from_properties(&event.resource_properties)?;
    debug!("{:?}", props);

    let github = GitHub::new(client, config, &props.token);

    match &event.request_type {
        Some(RequestType::Create) => {
            info!("CREATE!");
            github
                .create_repo(&NewRepo::with_defaults(&props.name, &props.description))
                .await?;
            Ok((Status::Success, MSG_CREATED))
        }
        Some(RequestType::Update) => {
            // update in place is a no-op, renaming or editing the description is not supported
            info!("UPDATE!");
            Ok((Status::Success, MSG_UPDATED))
        }
        Some(RequestType::Delete) => {
            info!("DELETE!");
            if props.delete_on_removal {
                let user = github.authenticated_user().await?;
                let repo = github.get_repo(&user.login, &props.name).await?;
                github.delete_repo(&repo).await?;
            } else {
                info!("DeleteRepo set to false. Not deleting {}", props.name);
            }
            Ok((Status::Success, MSG_DELETED))
        }
        Some(RequestType::Other(v)) => {
            error!("Unexpected request type: {v}");
            Ok((Status::Failed, MSG_UNEXPECTED))
        }
        None => Err(Error::MissingRequestType),
    }
}
