pub mod types;

pub use types::{ChangedFile, PullRequestInfo, TargetRef};

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, instrument};

const API_BASE: &str = "https://api.github.com";

#[derive(Debug, Error)]
pub enum GitHubError {
    #[error("GitHub API request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("GitHub API responded with {status}: {message}")]
    Status {
        status: reqwest::StatusCode,
        message: String,
    },

    #[error(
        "invalid URL '{0}': expected https://github.com/<owner>/<repo>/pull/<number> \
         or https://github.com/<owner>/<repo>/compare/<base>...<head>"
    )]
    InvalidUrl(String),
}

/// Parse a pull request or compare URL into its component parts.
///
/// Pull request URLs look like https://github.com/{owner}/{repo}/pull/{number};
/// compare URLs like https://github.com/{owner}/{repo}/compare/{base}...{head},
/// where a single-branch spec compares against "main". Query strings and
/// fragments are ignored. No network access happens here.
pub fn parse_target_url(url: &str) -> Result<TargetRef, GitHubError> {
    let url = url.trim();
    if url.is_empty() {
        return Err(GitHubError::InvalidUrl("<empty>".to_string()));
    }

    let parsed =
        reqwest::Url::parse(url).map_err(|_| GitHubError::InvalidUrl(url.to_string()))?;

    let segments: Vec<_> = parsed
        .path_segments()
        .ok_or_else(|| GitHubError::InvalidUrl(url.to_string()))?
        .filter(|segment| !segment.is_empty())
        .collect();

    if segments.len() == 4 && segments[2] == "pull" {
        let number = segments[3]
            .parse::<u64>()
            .ok()
            .filter(|n| *n > 0)
            .ok_or_else(|| GitHubError::InvalidUrl(url.to_string()))?;
        return Ok(TargetRef::PullRequest {
            owner: segments[0].to_string(),
            repo: segments[1].to_string(),
            number,
        });
    }

    if segments.len() >= 4 && segments[2] == "compare" {
        // Branch names may contain slashes, so the spec spans the rest of the path.
        let spec = segments[3..].join("/");
        let parts: Vec<&str> = spec.split("...").collect();
        let (base, head) = match parts.as_slice() {
            [head] => ("main".to_string(), head.to_string()),
            [base, head] => (base.to_string(), head.to_string()),
            _ => return Err(GitHubError::InvalidUrl(url.to_string())),
        };
        if base.is_empty() || head.is_empty() {
            return Err(GitHubError::InvalidUrl(url.to_string()));
        }
        return Ok(TargetRef::Compare {
            owner: segments[0].to_string(),
            repo: segments[1].to_string(),
            base,
            head,
        });
    }

    Err(GitHubError::InvalidUrl(url.to_string()))
}

/// Remote source-control host. One implementation talks to the real
/// GitHub API; tests substitute their own.
#[async_trait]
pub trait SourceHost: Send + Sync {
    async fn fetch_pull_request(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
    ) -> Result<(PullRequestInfo, Vec<ChangedFile>), GitHubError>;

    async fn fetch_comparison(
        &self,
        owner: &str,
        repo: &str,
        base: &str,
        head: &str,
    ) -> Result<Vec<ChangedFile>, GitHubError>;

    async fn update_description(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
        description: &str,
    ) -> Result<(), GitHubError>;
}

pub struct GitHubClient {
    http: reqwest::Client,
    token: String,
}

impl GitHubClient {
    pub fn new(token: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            token,
        }
    }

    fn get(&self, url: &str) -> reqwest::RequestBuilder {
        self.http
            .get(url)
            .header("User-Agent", "prd")
            .header("Accept", "application/vnd.github+json")
            .bearer_auth(&self.token)
    }

    async fn error_for_status(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, GitHubError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "<unable to read response body>".to_string());
        Err(GitHubError::Status { status, message })
    }
}

#[derive(serde::Deserialize)]
struct FileResponse {
    filename: String,
    status: String,
    additions: u64,
    deletions: u64,
    changes: u64,
    patch: Option<String>,
}

impl From<FileResponse> for ChangedFile {
    fn from(file: FileResponse) -> Self {
        ChangedFile {
            path: file.filename,
            status: file.status,
            additions: file.additions,
            deletions: file.deletions,
            changes: file.changes,
            patch: file.patch.map(types::truncate_patch),
        }
    }
}

#[async_trait]
impl SourceHost for GitHubClient {
    #[instrument(skip(self), fields(owner = %owner, repo = %repo, number))]
    async fn fetch_pull_request(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
    ) -> Result<(PullRequestInfo, Vec<ChangedFile>), GitHubError> {
        #[derive(serde::Deserialize)]
        struct BranchRef {
            #[serde(rename = "ref")]
            name: String,
        }

        #[derive(serde::Deserialize)]
        struct PullResponse {
            number: u64,
            title: String,
            body: Option<String>,
            html_url: String,
            base: BranchRef,
            head: BranchRef,
        }

        let base_url = format!("{API_BASE}/repos/{owner}/{repo}/pulls/{number}");

        debug!("fetching PR metadata");
        let response = self.get(&base_url).send().await?;
        let metadata: PullResponse = Self::error_for_status(response).await?.json().await?;
        debug!(title = %metadata.title, "received PR metadata");

        debug!("fetching PR file list");
        let response = self.get(&format!("{base_url}/files")).send().await?;
        let files: Vec<FileResponse> = Self::error_for_status(response).await?.json().await?;
        debug!(files = files.len(), "received PR file list");

        let info = PullRequestInfo {
            number: metadata.number,
            title: metadata.title,
            body: metadata.body,
            html_url: metadata.html_url,
            base_ref: metadata.base.name,
            head_ref: metadata.head.name,
        };
        Ok((info, files.into_iter().map(ChangedFile::from).collect()))
    }

    #[instrument(skip(self), fields(owner = %owner, repo = %repo, base = %base, head = %head))]
    async fn fetch_comparison(
        &self,
        owner: &str,
        repo: &str,
        base: &str,
        head: &str,
    ) -> Result<Vec<ChangedFile>, GitHubError> {
        #[derive(serde::Deserialize)]
        struct CompareResponse {
            #[serde(default)]
            files: Vec<FileResponse>,
        }

        let url = format!("{API_BASE}/repos/{owner}/{repo}/compare/{base}...{head}");

        debug!("fetching comparison");
        let response = self.get(&url).send().await?;
        let comparison: CompareResponse = Self::error_for_status(response).await?.json().await?;
        debug!(files = comparison.files.len(), "received comparison");

        Ok(comparison
            .files
            .into_iter()
            .map(ChangedFile::from)
            .collect())
    }

    #[instrument(skip(self, description), fields(owner = %owner, repo = %repo, number))]
    async fn update_description(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
        description: &str,
    ) -> Result<(), GitHubError> {
        let url = format!("{API_BASE}/repos/{owner}/{repo}/pulls/{number}");

        debug!("updating PR body");
        let response = self
            .http
            .patch(&url)
            .header("User-Agent", "prd")
            .header("Accept", "application/vnd.github+json")
            .bearer_auth(&self.token)
            .json(&serde_json::json!({ "body": description }))
            .send()
            .await?;
        Self::error_for_status(response).await?;
        Ok(())
    }
}
