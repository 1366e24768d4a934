use crate::error::ApiError;
use async_trait::async_trait;
use log::debug;
use reqwest::Client;

// Raw status and body of a backend reply; interpretation is left to the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[async_trait]
pub trait BallotApi: Send + Sync {
    // `GET <base>/api/candidates`
    async fn get_candidates(&self) -> Result<ApiResponse, ApiError>;

    // `POST <base>/api/vote` with a JSON body, bearer token attached when present.
    async fn post_vote(
        &self,
        body: serde_json::Value,
        token: Option<&str>,
    ) -> Result<ApiResponse, ApiError>;
}

pub struct HttpBallotApi {
    base: String,
    client: Client,
}

impl HttpBallotApi {
    pub fn new(base: &str) -> Result<Self, ApiError> {
        // Talk to the backend directly, like the raft example clients
        let client = Client::builder()
            .no_proxy()
            .build()
            .map_err(|e| ApiError::Client(e.to_string()))?;
        Ok(Self {
            base: base.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base, path)
    }

    // No retry and no timeout: the request resolves on its own terms
    async fn read(&self, url: &str, request: reqwest::RequestBuilder) -> Result<ApiResponse, ApiError> {
        let transport = |e: reqwest::Error| ApiError::Transport {
            url: url.to_string(),
            reason: e.to_string(),
        };

        let resp = request.send().await.map_err(transport)?;
        let status = resp.status().as_u16();
        let body = resp.text().await.map_err(transport)?;
        debug!("<<< {} replied with status {}", url, status);

        Ok(ApiResponse { status, body })
    }
}

#[async_trait]
impl BallotApi for HttpBallotApi {
    async fn get_candidates(&self) -> Result<ApiResponse, ApiError> {
        let url = self.url("api/candidates");
        debug!(">>> GET {}", url);
        self.read(&url, self.client.get(url.clone())).await
    }

    async fn post_vote(
        &self,
        body: serde_json::Value,
        token: Option<&str>,
    ) -> Result<ApiResponse, ApiError> {
        let url = self.url("api/vote");
        debug!(">>> POST {} (authorized: {})", url, token.is_some());

        let mut request = self.client.post(url.clone()).json(&body);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        self.read(&url, request).await
    }
}
