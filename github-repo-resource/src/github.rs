//! A minimal GitHub REST API client with just enough calls to manage a repository.
//! See https://docs.github.com/en/rest/repos/repos

use crate::config::Config;
use crate::error::Error;
use reqwest::header::{ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::{Client, Method, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

const API_VERSION: &str = "2022-11-28";

/// The owner of the token, i.e. the account repos are created under.
#[derive(Debug, Deserialize)]
pub struct User {
    pub login: String,
}

#[derive(Debug, Deserialize)]
pub struct Owner {
    pub login: String,
}

/// Only the fields needed to address the repo later.
#[derive(Debug, Deserialize)]
pub struct Repository {
    pub name: String,
    pub full_name: String,
    pub owner: Owner,
}

/// Body of `POST /user/repos`.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct NewRepo<'a> {
    pub name: &'a str,
    pub description: &'a str,
    pub allow_rebase_merge: bool,
    pub auto_init: bool,
    pub has_issues: bool,
    pub has_projects: bool,
    pub has_wiki: bool,
    pub private: bool,
}

impl<'a> NewRepo<'a> {
    /// Every repo managed by this resource is created with the same settings:
    /// public, issues only, no initial commit.
    pub fn with_defaults(name: &'a str, description: &'a str) -> Self {
        Self {
            name,
            description,
            allow_rebase_merge: true,
            auto_init: false,
            has_issues: true,
            has_projects: false,
            has_wiki: false,
            private: false,
        }
    }
}

/// GitHub client bound to a single access token.
pub struct GitHub<'a> {
    client: &'a Client,
    api_url: &'a Url,
    user_agent: &'a str,
    token: &'a str,
}

impl<'a> GitHub<'a> {
    /// Reuses the shared HTTP client so warm invocations keep their connections.
    pub fn new(client: &'a Client, config: &'a Config, token: &'a str) -> Self {
        Self {
            client,
            api_url: &config.github_api_url,
            user_agent: &config.user_agent,
            token,
        }
    }

    /// `GET /user`
    pub async fn authenticated_user(&self) -> Result<User, Error> {
        let resp = self.request(Method::GET, &["user"])?.send().await?;
        parse_response(resp).await
    }

    /// `POST /user/repos`
    pub async fn create_repo(&self, repo: &NewRepo<'_>) -> Result<Repository, Error> {
        info!("Creating repo {}", repo.name);
        let resp = self.request(Method::POST, &["user", "repos"])?.json(repo).send().await?;
        let repo: Repository = parse_response(resp).await?;
        info!("Created {}", repo.full_name);
        Ok(repo)
    }

    /// `GET /repos/{owner}/{repo}`
    pub async fn get_repo(&self, owner: &str, name: &str) -> Result<Repository, Error> {
        let resp = self
            .request(Method::GET, &["repos", owner, name])?
            .send()
            .await?;
        parse_response(resp).await
    }

    /// `DELETE /repos/{owner}/{repo}`. GitHub returns 204 on success.
    pub async fn delete_repo(&self, repo: &Repository) -> Result<(), Error> {
        info!("Deleting repo {}", repo.full_name);
        let resp = self
            .request(Method::DELETE, &["repos", repo.owner.login.as_str(), repo.name.as_str()])?
            .send()
            .await?;
        ensure_success(resp).await?;
        Ok(())
    }

    /// Each segment is percent-encoded on its own, so a `/` or `..` inside a name cannot change the path.
    fn request(&self, method: Method, segments: &[&str]) -> Result<RequestBuilder, Error> {
        let url = api_path(self.api_url, segments)?;
        debug!("{method} {url}");
        Ok(self
            .client
            .request(method, url)
            .header(AUTHORIZATION, format!("Bearer {}", self.token))
            .header(ACCEPT, "application/vnd.github+json")
            .header("X-GitHub-Api-Version", API_VERSION)
            .header(USER_AGENT, self.user_agent))
    }
}

/// Appends the segments to the base URL, keeping any base path, e.g. /api/v3 on GitHub Enterprise.
fn api_path(base: &Url, segments: &[&str]) -> Result<Url, Error> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| Error::Config(format!("GitHub API URL cannot have a path: {base}")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// Converts non-2xx responses into [Error::Api] with the body for the logs.
async fn ensure_success(resp: Response) -> Result<Response, Error> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let body = resp
        .text()
        .await
        .unwrap_or_else(|_| "<unreadable body>".to_string());

    Err(Error::Api {
        status: status.as_u16(),
        body,
    })
}

async fn parse_response<T: DeserializeOwned>(resp: Response) -> Result<T, Error> {
    let resp = ensure_success(resp).await?;
    Ok(resp.json::<T>().await?)
}
