//! Minimal GitHub REST client for comments and commit statuses.

use super::{status_description, Target};
use crate::analysis::Aggregate;
use crate::config::GithubConfig;
use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Serialize)]
struct CommentRequest<'a> {
    body: &'a str,
}

/// Body of `POST /repos/{owner}/{repo}/statuses/{sha}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusRequest {
    pub state: String,
    pub target_url: String,
    pub description: String,
    pub context: String,
}

#[derive(Debug, Deserialize)]
struct PullCommit {
    sha: String,
}

/// Authenticated client bound to one repository.
pub struct GithubClient {
    http_client: reqwest::Client,
    api_url: String,
    repo: String,
    token: String,
    timeout_seconds: u64,
}

impl GithubClient {
    pub fn new(config: &GithubConfig, token: impl Into<String>) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(concat!("prreport/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            http_client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            repo: config.repo_name(),
            token: token.into(),
            timeout_seconds: config.timeout_seconds,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/repos/{}/{}", self.api_url, self.repo, path)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response> {
        let response = request
            .bearer_auth(&self.token)
            .header("Accept", "application/vnd.github+json")
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    anyhow!("Request timed out after {}s", self.timeout_seconds)
                } else if e.is_connect() {
                    anyhow!("Cannot connect to GitHub at {}", self.api_url)
                } else {
                    anyhow!("Failed to send request: {}", e)
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("GitHub API error {}: {}", status, body));
        }

        Ok(response)
    }

    /// Post a comment on an issue or pull request.
    pub async fn create_comment(&self, number: u64, body: &str) -> Result<()> {
        let url = self.url(&format!("issues/{}/comments", number));
        debug!("POST {}", url);

        self.send(self.http_client.post(&url).json(&CommentRequest { body }))
            .await
            .with_context(|| format!("Failed to comment on #{}", number))?;
        Ok(())
    }

    /// SHA of the last commit on the first page of the pull request's commits.
    pub async fn last_commit_sha(&self, number: u64) -> Result<String> {
        let url = self.url(&format!("pulls/{}/commits", number));
        debug!("GET {}", url);

        let commits: Vec<PullCommit> = self
            .send(self.http_client.get(&url))
            .await
            .with_context(|| format!("Failed to list commits of #{}", number))?
            .json()
            .await
            .context("Failed to parse commit list")?;

        commits
            .into_iter()
            .last()
            .map(|c| c.sha)
            .ok_or_else(|| anyhow!("Pull request #{} has no commits", number))
    }

    /// Create one commit status.
    pub async fn create_status(&self, sha: &str, status: &StatusRequest) -> Result<()> {
        let url = self.url(&format!("statuses/{}", sha));
        debug!("POST {} ({})", url, status.context);

        self.send(self.http_client.post(&url).json(status))
            .await
            .with_context(|| format!("Failed to set status '{}'", status.context))?;
        Ok(())
    }
}

/// Statuses for every check, linking to the check's report section.
pub fn status_requests(
    aggregate: &Aggregate,
    report_url: &str,
    finished: DateTime<Utc>,
) -> Vec<StatusRequest> {
    let description = status_description(finished);

    aggregate
        .statuses()
        .into_iter()
        .map(|check| StatusRequest {
            state: check.state.gh_status().to_string(),
            target_url: format!("{}#{}", report_url, check.kind.anchor()),
            description: description.clone(),
            context: check.kind.context().to_string(),
        })
        .collect()
}

/// Post the comment, then one status per check on the latest commit.
pub async fn publish(
    client: &GithubClient,
    aggregate: &Aggregate,
    target: Target,
    report_url: &str,
    finished: DateTime<Utc>,
) -> Result<()> {
    let number = target.number();

    info!("Commenting on #{} ({:?})", number, target);
    client
        .create_comment(number, &aggregate.comment_body(report_url))
        .await?;

    let sha = client.last_commit_sha(number).await?;
    info!("Setting statuses on commit {}", sha);

    for status in status_requests(aggregate, report_url, finished) {
        client.create_status(&sha, &status).await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collectors::CheckReport;
    use crate::models::{FutureSummary, LintSummary};
    use chrono::TimeZone;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn aggregate(pylint_failed: bool) -> Aggregate {
        Aggregate {
            pylint: CheckReport {
                failed: pylint_failed,
                summary: LintSummary::default(),
                html: "<p>pylint</p>".to_string(),
            },
            pylint3k: None,
            unit_tests: None,
            pycodestyle: None,
            future: CheckReport {
                failed: false,
                summary: FutureSummary::new(),
                html: String::new(),
            },
            functional: None,
        }
    }

    fn client(server: &MockServer) -> GithubClient {
        let config = GithubConfig {
            api_url: server.uri(),
            ..GithubConfig::default()
        };
        GithubClient::new(&config, "secret").unwrap()
    }

    fn finished() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 5, 14, 7, 0).unwrap()
    }

    #[test]
    fn test_status_requests_link_anchors() {
        let statuses = status_requests(&aggregate(true), "https://ci/r.html", finished());
        assert_eq!(statuses.len(), 3);
        assert_eq!(
            statuses[0],
            StatusRequest {
                state: "failure".to_string(),
                target_url: "https://ci/r.html#pylint".to_string(),
                description: "Finished at 05 Mar 2024 14:07 GMT".to_string(),
                context: "Pylint".to_string(),
            }
        );
        assert_eq!(statuses[1].target_url, "https://ci/r.html#unittests");
        assert_eq!(statuses[1].context, "Unit tests");
        assert_eq!(statuses[2].state, "success");
        assert_eq!(statuses[2].context, "Python3 compatibility");
    }

    #[tokio::test]
    async fn test_create_comment() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/repos/dmwm/WMCore/issues/42/comments"))
            .and(header("authorization", "Bearer secret"))
            .and(body_json(serde_json::json!({"body": "hello"})))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        tokio_test::assert_ok!(client(&server).create_comment(42, "hello").await);
    }

    #[tokio::test]
    async fn test_last_commit_of_first_page() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/dmwm/WMCore/pulls/42/commits"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"sha": "aaa"},
                {"sha": "bbb"},
                {"sha": "ccc"}
            ])))
            .mount(&server)
            .await;

        let sha = client(&server).last_commit_sha(42).await.unwrap();
        assert_eq!(sha, "ccc");
    }

    #[tokio::test]
    async fn test_no_commits_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/dmwm/WMCore/pulls/42/commits"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .mount(&server)
            .await;

        tokio_test::assert_err!(client(&server).last_commit_sha(42).await);
    }

    #[tokio::test]
    async fn test_api_error_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/repos/dmwm/WMCore/issues/42/comments"))
            .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
            .mount(&server)
            .await;

        let err = client(&server).create_comment(42, "x").await.unwrap_err();
        let message = format!("{:#}", err);
        assert!(message.contains("403"), "{}", message);
        assert!(message.contains("forbidden"), "{}", message);
    }

    #[tokio::test]
    async fn test_publish_posts_comment_and_statuses() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/repos/dmwm/WMCore/issues/7/comments"))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/repos/dmwm/WMCore/pulls/7/commits"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!([{"sha": "abc123"}])),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/repos/dmwm/WMCore/statuses/abc123"))
            .and(body_json(serde_json::json!({
                "state": "success",
                "target_url": "https://ci/r.html#pylint",
                "description": "Finished at 05 Mar 2024 14:07 GMT",
                "context": "Pylint"
            })))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/repos/dmwm/WMCore/statuses/abc123"))
            .respond_with(ResponseTemplate::new(201))
            .expect(2)
            .mount(&server)
            .await;

        publish(
            &client(&server),
            &aggregate(false),
            Target::Daily(7),
            "https://ci/r.html",
            finished(),
        )
        .await
        .unwrap();
    }
}
