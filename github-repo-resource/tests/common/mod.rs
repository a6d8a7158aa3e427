//! A local HTTP server that plays both GitHub and the CloudFormation response URL.
//! It records every request so the tests can check what the handler sent and how many times.

use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use lambda_runtime::{Context, LambdaEvent};
use serde_json::{json, Value};
use std::convert::Infallible;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

pub const OWNER: &str = "octocat";
pub const TOKEN: &str = "ghp_test_token";
pub const LOG_STREAM: &str = "2024/06/11/github-repo[$LATEST]b1de3d3cab074896b448859c52fa1a2d";

#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub authorization: Option<String>,
    pub content_type: Option<String>,
    pub content_length: Option<String>,
    pub user_agent: Option<String>,
    pub body: String,
}

impl Recorded {
    pub fn json(&self) -> Value {
        serde_json::from_str(&self.body).expect("request body is not JSON")
    }
}

/// Canned failures the server can be asked to produce.
#[derive(Debug, Default, Clone, Copy)]
pub struct Faults {
    /// `POST /user/repos` answers 422 as if the name is taken
    pub repo_exists: bool,
    /// `GET /repos/..` answers 404
    pub repo_missing: bool,
    /// the response URL answers 403 as if the signature expired
    pub callback_rejected: bool,
}

pub struct MockServer {
    pub url: String,
    requests: Arc<Mutex<Vec<Recorded>>>,
}

impl MockServer {
    pub async fn start(faults: Faults) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("failed to bind");
        let url = format!("http://{}", listener.local_addr().expect("no local addr"));
        let requests = Arc::new(Mutex::new(Vec::new()));

        let recorder = requests.clone();
        tokio::spawn(async move {
            loop {
                let (stream, _) = match listener.accept().await {
                    Ok(v) => v,
                    Err(_) => return,
                };
                let io = TokioIo::new(stream);
                let recorder = recorder.clone();

                tokio::task::spawn(async move {
                    let service = service_fn(move |req| {
                        let recorder = recorder.clone();
                        async move { Ok::<_, Infallible>(route(req, faults, recorder).await) }
                    });
                    let _ = http1::Builder::new().serve_connection(io, service).await;
                });
            }
        });

        Self { url, requests }
    }

    pub fn callback_url(&self) -> String {
        format!("{}/callback/signed?X-Amz-Signature=abc", self.url)
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().expect("poisoned").clone()
    }

    pub fn requests_to(&self, method: Method, path_prefix: &str) -> Vec<Recorded> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == method && r.path.starts_with(path_prefix))
            .collect()
    }

    /// Requests that went to GitHub rather than to the response URL
    pub fn github_requests(&self) -> Vec<Recorded> {
        self.requests()
            .into_iter()
            .filter(|r| !r.path.starts_with("/callback"))
            .collect()
    }

    /// The one and only response sent to CloudFormation
    pub fn callback(&self) -> Recorded {
        let callbacks = self.requests_to(Method::PUT, "/callback");
        assert_eq!(callbacks.len(), 1, "expected exactly one callback, got {:?}", callbacks);
        callbacks[0].clone()
    }
}

fn header(req: &Request<hyper::body::Incoming>, name: hyper::header::HeaderName) -> Option<String> {
    req.headers()
        .get(name)
        .map(|v| v.to_str().expect("non-ASCII header").to_owned())
}

async fn route(
    req: Request<hyper::body::Incoming>,
    faults: Faults,
    recorder: Arc<Mutex<Vec<Recorded>>>,
) -> Response<Full<Bytes>> {
    let method = req.method().clone();
    let path = req.uri().path().to_owned();
    let query = req.uri().query().map(str::to_owned);
    let authorization = header(&req, hyper::header::AUTHORIZATION);
    let content_type = header(&req, hyper::header::CONTENT_TYPE);
    let content_length = header(&req, hyper::header::CONTENT_LENGTH);
    let user_agent = header(&req, hyper::header::USER_AGENT);
    let body = req.into_body().collect().await.expect("failed to read body").to_bytes();
    let body = String::from_utf8(body.to_vec()).expect("non-UTF-8 body");

    let (status, resp_body) = if method == Method::PUT && path.starts_with("/callback") {
        if faults.callback_rejected {
            (StatusCode::FORBIDDEN, "<Error><Code>AccessDenied</Code></Error>".to_owned())
        } else {
            (StatusCode::OK, String::new())
        }
    } else if method == Method::GET && path == "/user" {
        (StatusCode::OK, json!({ "login": OWNER, "id": 1 }).to_string())
    } else if method == Method::POST && path == "/user/repos" {
        if faults.repo_exists {
            (
                StatusCode::UNPROCESSABLE_ENTITY,
                json!({
                    "message": "Repository creation failed.",
                    "errors": [{ "field": "name", "code": "custom", "message": "name already exists on this account" }]
                })
                .to_string(),
            )
        } else {
            let new_repo: Value = serde_json::from_str(&body).expect("create body is not JSON");
            (StatusCode::CREATED, repo_json(new_repo["name"].as_str().unwrap_or_default()))
        }
    } else if method == Method::GET && path.starts_with("/repos/") {
        if faults.repo_missing {
            (StatusCode::NOT_FOUND, json!({ "message": "Not Found" }).to_string())
        } else {
            (StatusCode::OK, repo_json(path.rsplit('/').next().unwrap_or_default()))
        }
    } else if method == Method::DELETE && path.starts_with("/repos/") {
        (StatusCode::NO_CONTENT, String::new())
    } else {
        (StatusCode::NOT_FOUND, json!({ "message": "Not Found" }).to_string())
    };

    recorder.lock().expect("poisoned").push(Recorded {
        method,
        path,
        query,
        authorization,
        content_type,
        content_length,
        user_agent,
        body,
    });

    Response::builder()
        .status(status)
        .body(Full::new(Bytes::from(resp_body)))
        .expect("Failed to create a response")
}

fn repo_json(name: &str) -> String {
    json!({
        "id": 1296269,
        "name": name,
        "full_name": format!("{OWNER}/{name}"),
        "private": false,
        "owner": { "login": OWNER, "id": 1 },
    })
    .to_string()
}

/// A CloudFormation event addressed to the mock server.
pub fn cfn_event(server: &MockServer, request_type: &str, delete_repo: &str) -> Value {
    json!({
        "RequestType": request_type,
        "ServiceToken": "arn:aws:lambda:us-east-1:512295225992:function:github-repo",
        "ResponseURL": server.callback_url(),
        "StackId": "arn:aws:cloudformation:us-east-1:512295225992:stack/repos/1f2e3d4c",
        "RequestId": "f4b4d8e0-2e49-4a3c-9d7a-2a0c5d9b8d1e",
        "LogicalResourceId": "DocsRepo",
        "ResourceType": "Custom::GitHubRepo",
        "ResourceProperties": {
            "ServiceToken": "arn:aws:lambda:us-east-1:512295225992:function:github-repo",
            "GitHubToken": TOKEN,
            "RepoName": "docs",
            "RepoDescription": "Project documentation",
            "DeleteRepo": delete_repo
        }
    })
}

pub fn lambda_event(payload: Value) -> LambdaEvent<Value> {
    let ctx: Context = serde_json::from_value(json!({
        "request_id": "4850539c-6316-4af1-9c47-8771cb3baeb1",
        "deadline": 1718071341165_u64,
        "invoked_function_arn": "arn:aws:lambda:us-east-1:512295225992:function:github-repo",
        "xray_trace_id": null,
        "client_context": null,
        "identity": null,
        "env_config": {
            "function_name": "github-repo",
            "memory": 128,
            "version": "$LATEST",
            "log_stream": LOG_STREAM,
            "log_group": "/aws/lambda/github-repo"
        }
    }))
    .expect("invalid lambda context");

    LambdaEvent::new(payload, ctx)
}
