//! REST client for the story server.
//!
//! Wraps the project and chapter endpoints using [`reqwest`]. Every request
//! carries the command's correlation id in the `x-correlation-id` header.

use std::time::Duration;

use async_trait::async_trait;
use chaptersmith_core::backend::{Generation, PromptResponse, StoryBackend};
use chaptersmith_core::chapter::{Chapter, ChapterPatch};
use chaptersmith_core::error::DomainError;
use chaptersmith_core::project::{NewProject, Project, ProjectId};
use reqwest::{Method, Url};
use tracing::debug;
use uuid::Uuid;

use crate::error::HttpBackendError;

/// Header carrying the correlation id of the issuing command.
pub const CORRELATION_HEADER: &str = "x-correlation-id";

/// HTTP client for one story server.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpBackend {
    /// Create a client for the server at `base_url`, e.g.
    /// `http://localhost:8000`, giving up on any request after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns `HttpBackendError::InvalidBaseUrl` if `base_url` is not an
    /// absolute http(s) URL, or `HttpBackendError::Request` if the client
    /// cannot be built.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, HttpBackendError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Self::with_client(client, base_url)
    }

    /// Create a client reusing an existing [`reqwest::Client`].
    ///
    /// # Errors
    ///
    /// Returns `HttpBackendError::InvalidBaseUrl` if `base_url` is not an
    /// absolute http(s) URL.
    pub fn with_client(client: reqwest::Client, base_url: &str) -> Result<Self, HttpBackendError> {
        let parsed = Url::parse(base_url)
            .map_err(|err| HttpBackendError::InvalidBaseUrl(format!("{base_url}: {err}")))?;
        if !matches!(parsed.scheme(), "http" | "https") || parsed.cannot_be_a_base() {
            return Err(HttpBackendError::InvalidBaseUrl(base_url.to_owned()));
        }
        Ok(Self {
            client,
            base_url: parsed,
        })
    }

    // ---- private helpers ----

    /// Appends `segments` to the base URL, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, HttpBackendError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| HttpBackendError::InvalidBaseUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(
        &self,
        method: Method,
        url: Url,
        correlation_id: Uuid,
    ) -> reqwest::RequestBuilder {
        debug!(%method, %url, %correlation_id, "backend request");
        self.client
            .request(method, url)
            .header(CORRELATION_HEADER, correlation_id.to_string())
    }

    /// Ensure the response has a success status code. Returns the response
    /// unchanged on success, or an `Api` error carrying the status and body.
    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, HttpBackendError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(HttpBackendError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    /// Parse a successful JSON response body into the expected type.
    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, HttpBackendError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }

    /// Assert the response has a success status code, discarding the body.
    async fn check_status(response: reqwest::Response) -> Result<(), HttpBackendError> {
        Self::ensure_success(response).await?;
        Ok(())
    }

    fn chapter_url(
        &self,
        project_id: &ProjectId,
        number: u32,
        action: Option<&str>,
    ) -> Result<Url, HttpBackendError> {
        let number = number.to_string();
        let mut segments = vec!["api", "projects", project_id.0.as_str(), "chapters", number.as_str()];
        segments.extend(action);
        self.endpoint(&segments)
    }
}

#[async_trait]
impl StoryBackend for HttpBackend {
    async fn create_project(
        &self,
        correlation_id: Uuid,
        project: &NewProject,
    ) -> Result<Project, DomainError> {
        let url = self.endpoint(&["api", "projects"])?;
        let response = self
            .request(Method::POST, url, correlation_id)
            .json(project)
            .send()
            .await
            .map_err(HttpBackendError::from)?;
        Ok(Self::parse_response(response).await?)
    }

    async fn list_projects(&self, correlation_id: Uuid) -> Result<Vec<Project>, DomainError> {
        let url = self.endpoint(&["api", "projects"])?;
        let response = self
            .request(Method::GET, url, correlation_id)
            .send()
            .await
            .map_err(HttpBackendError::from)?;
        Ok(Self::parse_response(response).await?)
    }

    async fn delete_project(
        &self,
        correlation_id: Uuid,
        project_id: &ProjectId,
    ) -> Result<(), DomainError> {
        let url = self.endpoint(&["api", "projects", project_id.0.as_str()])?;
        let response = self
            .request(Method::DELETE, url, correlation_id)
            .send()
            .await
            .map_err(HttpBackendError::from)?;
        Ok(Self::check_status(response).await?)
    }

    async fn initialize_chapters(
        &self,
        correlation_id: Uuid,
        project_id: &ProjectId,
    ) -> Result<Vec<Chapter>, DomainError> {
        let url = self.endpoint(&["api", "projects", project_id.0.as_str(), "chapters", "init"])?;
        let response = self
            .request(Method::POST, url, correlation_id)
            .send()
            .await
            .map_err(HttpBackendError::from)?;
        Ok(Self::parse_response(response).await?)
    }

    async fn generate_chapter(
        &self,
        correlation_id: Uuid,
        project_id: &ProjectId,
        number: u32,
    ) -> Result<Generation, DomainError> {
        let url = self.chapter_url(project_id, number, Some("generate"))?;
        let response = self
            .request(Method::POST, url, correlation_id)
            .send()
            .await
            .map_err(HttpBackendError::from)?;
        Ok(Self::parse_response(response).await?)
    }

    async fn build_prompt(
        &self,
        correlation_id: Uuid,
        project_id: &ProjectId,
        number: u32,
    ) -> Result<PromptResponse, DomainError> {
        let url = self.chapter_url(project_id, number, Some("prompt"))?;
        let response = self
            .request(Method::POST, url, correlation_id)
            .send()
            .await
            .map_err(HttpBackendError::from)?;
        Ok(Self::parse_response(response).await?)
    }

    async fn update_chapter(
        &self,
        correlation_id: Uuid,
        project_id: &ProjectId,
        number: u32,
        patch: &ChapterPatch,
    ) -> Result<Chapter, DomainError> {
        let url = self.chapter_url(project_id, number, None)?;
        let response = self
            .request(Method::PATCH, url, correlation_id)
            .json(patch)
            .send()
            .await
            .map_err(HttpBackendError::from)?;
        Ok(Self::parse_response(response).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend(base: &str) -> HttpBackend {
        HttpBackend::new(base, Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_endpoint_joins_segments_under_base_path() {
        let backend = backend("http://localhost:8000/story/");

        let url = backend.chapter_url(&"p-1".into(), 3, Some("generate")).unwrap();

        assert_eq!(
            url.as_str(),
            "http://localhost:8000/story/api/projects/p-1/chapters/3/generate"
        );
    }

    #[test]
    fn test_project_id_is_percent_encoded() {
        let backend = backend("http://localhost:8000");

        let url = backend.chapter_url(&"a/b c".into(), 1, None).unwrap();

        assert_eq!(
            url.as_str(),
            "http://localhost:8000/api/projects/a%2Fb%20c/chapters/1"
        );
    }

    #[test]
    fn test_rejects_unusable_base_urls() {
        for base in ["localhost:8000", "not a url", "mailto:someone@example.com"] {
            let result = HttpBackend::new(base, Duration::from_secs(5));

            assert!(
                matches!(result, Err(HttpBackendError::InvalidBaseUrl(_))),
                "{base} should be rejected"
            );
        }
    }
}
