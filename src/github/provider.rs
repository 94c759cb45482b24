//! Issue, pull request and repository fetching via octocrab.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use octocrab::Octocrab;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::GitHubError;
use crate::records::{
    CommentRecord, IssueRecord, PullRequestRecord, RepositoryRecord, ReviewerRecord,
};

use super::remote::RepoSlug;

/// Maximum body length to prevent token exhaustion (10KB).
pub const MAX_BODY_LENGTH: usize = 10 * 1024;

const PER_PAGE: u8 = 100;

/// Safety limit to prevent infinite pagination loops.
const MAX_PAGES: u32 = 50;

/// A source of issues and pull requests for a hosted repository.
#[async_trait]
pub trait RepositoryProvider: Send + Sync {
    /// All issues (open and closed) with their comments. Pull requests are excluded.
    async fn fetch_issues(&self, slug: &RepoSlug) -> Result<Vec<IssueRecord>, GitHubError>;

    async fn fetch_issue(&self, slug: &RepoSlug, number: u64) -> Result<IssueRecord, GitHubError>;

    /// All pull requests with their review comments and reviewers.
    async fn fetch_pull_requests(
        &self,
        slug: &RepoSlug,
    ) -> Result<Vec<PullRequestRecord>, GitHubError>;

    async fn fetch_pull_request(
        &self,
        slug: &RepoSlug,
        number: u64,
    ) -> Result<PullRequestRecord, GitHubError>;

    async fn fetch_repository(&self, slug: &RepoSlug) -> Result<RepositoryRecord, GitHubError>;
}

/// GitHub REST API provider.
pub struct GitHubProvider {
    client: Octocrab,
}

impl GitHubProvider {
    /// Build a provider authenticated with a personal token.
    pub fn new(token: &str) -> Result<Self, GitHubError> {
        let client = Octocrab::builder()
            .personal_token(token.to_string())
            .build()
            .map_err(|e| GitHubError::ClientBuild(Box::new(e)))?;
        Ok(Self::with_client(client))
    }

    /// Use a pre-configured octocrab client (e.g. one pointed at a mock server).
    pub fn with_client(client: Octocrab) -> Self {
        Self { client }
    }

    async fn get<T: DeserializeOwned>(
        &self,
        route: &str,
        params: Option<&PageParams<'_>>,
        slug: &RepoSlug,
        what: &str,
    ) -> Result<T, GitHubError> {
        self.client
            .get::<T, _, _>(route, params)
            .await
            .map_err(|e| classify_error(e, slug, what))
    }

    /// Fetch every page of a list endpoint, stopping at a short page or the page cap.
    async fn get_all<T: DeserializeOwned>(
        &self,
        route: &str,
        state: Option<&str>,
        slug: &RepoSlug,
        what: &str,
    ) -> Result<Vec<T>, GitHubError> {
        let mut all = Vec::new();
        let mut page = 1u32;

        loop {
            let params = PageParams {
                state,
                per_page: PER_PAGE,
                page,
            };
            let items: Vec<T> = self.get(route, Some(&params), slug, what).await?;
            let count = items.len();
            all.extend(items);

            if count < PER_PAGE as usize {
                break;
            }

            page += 1;
            if page > MAX_PAGES {
                warn!(
                    "Reached {}-page safety limit while fetching {} for {}",
                    MAX_PAGES, what, slug
                );
                break;
            }
        }

        debug!("Fetched {} {} for {}", all.len(), what, slug);
        Ok(all)
    }

    async fn comments(&self, route: String, slug: &RepoSlug) -> Result<Vec<CommentRecord>, GitHubError> {
        let comments: Vec<CommentDto> = self.get_all(&route, None, slug, "comments").await?;
        Ok(comments.into_iter().map(CommentDto::into_record).collect())
    }

    async fn issue_record(&self, slug: &RepoSlug, issue: IssueDto) -> Result<IssueRecord, GitHubError> {
        let route = format!(
            "/repos/{}/{}/issues/{}/comments",
            slug.owner, slug.name, issue.number
        );
        let comments = self.comments(route, slug).await?;

        Ok(IssueRecord {
            id: issue.number.to_string(),
            title: issue.title,
            body: truncate_body(issue.body.unwrap_or_default()),
            created_at: issue.created_at,
            url: issue.html_url,
            state: issue.state,
            comments,
            extra: Default::default(),
        })
    }

    async fn pull_request_record(
        &self,
        slug: &RepoSlug,
        pr: PullDto,
    ) -> Result<PullRequestRecord, GitHubError> {
        let base = format!("/repos/{}/{}/pulls/{}", slug.owner, slug.name, pr.number);
        let comments = self.comments(format!("{}/comments", base), slug).await?;

        let reviews: Vec<ReviewDto> = self
            .get_all(&format!("{}/reviews", base), None, slug, "reviews")
            .await?;
        let mut reviewers: Vec<ReviewerRecord> = Vec::new();
        for user in reviews.into_iter().filter_map(|r| r.user) {
            let id = user.id.to_string();
            if !reviewers.iter().any(|r| r.id == id) {
                reviewers.push(ReviewerRecord {
                    id,
                    name: user.login,
                    profile_url: user.html_url,
                    email: user.email,
                });
            }
        }

        Ok(PullRequestRecord {
            id: pr.number.to_string(),
            title: pr.title.unwrap_or_default(),
            body: truncate_body(pr.body.unwrap_or_default()),
            state: pr.state,
            created_at: pr.created_at,
            source_branch: pr.head.name,
            target_branch: pr.base.name,
            author: pr.user.map(|u| u.login).unwrap_or_default(),
            assignee: pr.assignee.map(|u| u.login),
            comments,
            reviewers,
        })
    }
}

#[async_trait]
impl RepositoryProvider for GitHubProvider {
    async fn fetch_issues(&self, slug: &RepoSlug) -> Result<Vec<IssueRecord>, GitHubError> {
        let route = format!("/repos/{}/{}/issues", slug.owner, slug.name);
        let issues: Vec<IssueDto> = self.get_all(&route, Some("all"), slug, "issues").await?;

        let mut records = Vec::new();
        for issue in issues.into_iter().filter(|i| i.pull_request.is_none()) {
            records.push(self.issue_record(slug, issue).await?);
        }
        Ok(records)
    }

    async fn fetch_issue(&self, slug: &RepoSlug, number: u64) -> Result<IssueRecord, GitHubError> {
        let route = format!("/repos/{}/{}/issues/{}", slug.owner, slug.name, number);
        let issue: IssueDto = self.get(&route, None, slug, "issue").await?;
        self.issue_record(slug, issue).await
    }

    async fn fetch_pull_requests(
        &self,
        slug: &RepoSlug,
    ) -> Result<Vec<PullRequestRecord>, GitHubError> {
        let route = format!("/repos/{}/{}/pulls", slug.owner, slug.name);
        let pulls: Vec<PullDto> = self
            .get_all(&route, Some("all"), slug, "pull requests")
            .await?;

        let mut records = Vec::new();
        for pr in pulls {
            records.push(self.pull_request_record(slug, pr).await?);
        }
        Ok(records)
    }

    async fn fetch_pull_request(
        &self,
        slug: &RepoSlug,
        number: u64,
    ) -> Result<PullRequestRecord, GitHubError> {
        let route = format!("/repos/{}/{}/pulls/{}", slug.owner, slug.name, number);
        let pr: PullDto = self.get(&route, None, slug, "pull request").await?;
        self.pull_request_record(slug, pr).await
    }

    async fn fetch_repository(&self, slug: &RepoSlug) -> Result<RepositoryRecord, GitHubError> {
        let route = format!("/repos/{}/{}", slug.owner, slug.name);
        let repo: RepoDto = self.get(&route, None, slug, "repository").await?;

        Ok(RepositoryRecord {
            id: repo.id.to_string(),
            name: repo.name,
            owner: repo.owner.login,
            description: repo.description.unwrap_or_default(),
            created_at: repo.created_at,
        })
    }
}

/// Truncate a body to [`MAX_BODY_LENGTH`] bytes on a character boundary.
pub fn truncate_body(body: String) -> String {
    if body.len() <= MAX_BODY_LENGTH {
        return body;
    }

    let mut end = MAX_BODY_LENGTH;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}... [truncated]", &body[..end])
}

fn classify_error(e: octocrab::Error, slug: &RepoSlug, what: &str) -> GitHubError {
    // Check both Display and Debug output to handle different octocrab error formats
    let err_display = e.to_string();
    let err_debug = format!("{:?}", e);

    if err_display.to_lowercase().contains("rate limit")
        || err_debug.to_lowercase().contains("rate limit")
    {
        return GitHubError::RateLimited {
            what: what.to_string(),
        };
    }

    if err_display.contains("Not Found") || err_debug.contains("Not Found") {
        return GitHubError::RepositoryNotFound {
            owner: slug.owner.clone(),
            repo: slug.name.clone(),
        };
    }

    GitHubError::Request {
        what: what.to_string(),
        source: Box::new(e),
    }
}

#[derive(Serialize)]
struct PageParams<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    state: Option<&'a str>,
    per_page: u8,
    page: u32,
}

#[derive(Deserialize)]
struct UserDto {
    id: u64,
    login: String,
    #[serde(default)]
    html_url: String,
    #[serde(default)]
    email: Option<String>,
}

#[derive(Deserialize)]
struct IssueDto {
    number: u64,
    title: String,
    #[serde(default)]
    body: Option<String>,
    #[serde(default)]
    html_url: String,
    state: String,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pull_request: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct CommentDto {
    id: u64,
    #[serde(default)]
    body: Option<String>,
    created_at: DateTime<Utc>,
    #[serde(default)]
    user: Option<UserDto>,
    #[serde(default)]
    html_url: String,
}

impl CommentDto {
    fn into_record(self) -> CommentRecord {
        CommentRecord {
            id: self.id.to_string(),
            body: self.body.unwrap_or_default(),
            created_at: self.created_at,
            author: self.user.map(|u| u.login).unwrap_or_default(),
            url: self.html_url,
        }
    }
}

#[derive(Deserialize)]
struct BranchDto {
    #[serde(rename = "ref")]
    name: String,
}

#[derive(Deserialize)]
struct PullDto {
    number: u64,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    body: Option<String>,
    state: String,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
    head: BranchDto,
    base: BranchDto,
    #[serde(default)]
    user: Option<UserDto>,
    #[serde(default)]
    assignee: Option<UserDto>,
}

#[derive(Deserialize)]
struct ReviewDto {
    #[serde(default)]
    user: Option<UserDto>,
}

#[derive(Deserialize)]
struct RepoDto {
    id: u64,
    name: String,
    owner: UserDto,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
}
