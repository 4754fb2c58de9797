use async_trait::async_trait;
use serde::de::DeserializeOwned;
use thiserror::Error;
use url::Url;

use crate::RegistryClient;
use fedreg_core::{TrainingRecord, UpdatePatch};

/// Name of the header that carries the requester's user identifier.
pub const USER_HEADER: &str = "x-fedreg-user";

/// Error returned by a [`Client`].
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("the registry has no such training")]
    NotFound,

    #[error("communication with the registry failed: {0}")]
    Communication(String),

    #[error("the registry rejected the request: {0}")]
    Rejected(String),

    #[error("the registry denied the request (status {0})")]
    Denied(u16),

    #[error("failed to (de)serialize data: {0}")]
    Deserialize(String),

    #[error("unexpected response (status {0})")]
    UnexpectedResponse(u16),
}

impl From<serde_json::Error> for ClientError {
    fn from(e: serde_json::Error) -> Self {
        Self::Deserialize(format!("{}", e))
    }
}

/// A raw HTTP response: the status code and the collected body.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

/// A basic HTTP interface that [`Client`] backends must implement.
///
/// The registry speaks JSON; bodies handed to `post` and `put` are
/// already serialized and must be sent as `application/json`.
#[async_trait]
pub trait RegistryHttpClient {
    async fn get(
        &mut self,
        url: &str,
        headers: &[(&'static str, String)],
    ) -> Result<RawResponse, ClientError>;

    async fn post(
        &mut self,
        url: &str,
        headers: &[(&'static str, String)],
        body: Vec<u8>,
    ) -> Result<RawResponse, ClientError>;

    async fn put(
        &mut self,
        url: &str,
        headers: &[(&'static str, String)],
        body: Vec<u8>,
    ) -> Result<RawResponse, ClientError>;

    async fn delete(
        &mut self,
        url: &str,
        headers: &[(&'static str, String)],
    ) -> Result<RawResponse, ClientError>;
}

/// Error returned when trying to build a [`Client`] with an invalid
/// address for the registry.
#[derive(Debug, Error)]
#[error("Invalid base URL: {}", .0)]
pub struct InvalidBaseUrl(String);

#[derive(Debug, Clone)]
/// A client that communicates with the registry's API via HTTP(S).
pub struct Client<C> {
    /// HTTP(S) backend
    http: C,
    /// Registry URL
    base_url: Url,
    /// The user this client authenticates as
    user: Option<u64>,
}

impl<C> Client<C>
where
    C: RegistryHttpClient + Send,
{
    /// Creates a new client.
    ///
    /// # Args
    ///
    /// - `http` is the backend that performs the HTTP requests. Any
    ///   backend can be used, as long as it implements the
    ///   [`RegistryHttpClient`] trait.
    /// - `base_url` is the URL of the registry.
    /// - `user` is the identifier sent along as the requester.
    ///
    /// # Errors
    ///
    /// An error is returned if `base_url` is not a valid URL.
    pub fn new(http: C, base_url: &str, user: Option<u64>) -> Result<Self, InvalidBaseUrl> {
        let base_url = Url::parse(base_url).map_err(|e| InvalidBaseUrl(format!("{}", e)))?;
        if base_url.cannot_be_a_base() {
            return Err(InvalidBaseUrl(String::from("cannot be a base URL")));
        }
        Ok(Self {
            http,
            base_url,
            user,
        })
    }

    /// Append the given segments to the client base URL.
    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        {
            let mut path = url.path_segments_mut().unwrap();
            for segment in segments {
                path.push(segment);
            }
        }
        url
    }

    fn headers(&self) -> Vec<(&'static str, String)> {
        match self.user {
            Some(user) => vec![(USER_HEADER, user.to_string())],
            None => Vec::new(),
        }
    }

    async fn get_json<T>(&mut self, url: &Url) -> Result<T, ClientError>
    where
        T: DeserializeOwned,
    {
        let headers = self.headers();
        let resp = self.http.get(url.as_str(), &headers).await?;
        parse_json(resp)
    }
}

/// Parses a JSON success body, mapping error statuses onto [`ClientError`].
fn parse_json<T>(resp: RawResponse) -> Result<T, ClientError>
where
    T: DeserializeOwned,
{
    match resp.status {
        200 | 201 => serde_json::from_slice(&resp.body).map_err(ClientError::from),
        _ => Err(error_for(resp)),
    }
}

fn error_for(resp: RawResponse) -> ClientError {
    match resp.status {
        400 => ClientError::Rejected(detail(&resp.body)),
        401 | 403 => ClientError::Denied(resp.status),
        404 => ClientError::NotFound,
        500..=599 => ClientError::Communication(format!("registry error (status {})", resp.status)),
        status => ClientError::UnexpectedResponse(status),
    }
}

/// Extracts the human-readable message from an error body.
fn detail(body: &[u8]) -> String {
    serde_json::from_slice::<serde_json::Value>(body)
        .ok()
        .and_then(|value| {
            value
                .get("detail")
                .and_then(|detail| detail.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| String::from_utf8_lossy(body).into_owned())
}

#[async_trait]
impl<C> RegistryClient for Client<C>
where
    C: RegistryHttpClient + Send,
{
    fn user_id(&self) -> Option<u64> {
        self.user
    }

    async fn create(&mut self, draft: &TrainingRecord) -> Result<TrainingRecord, ClientError> {
        let url = self.url(&["federated-trainings"]);
        let body = serde_json::to_vec(draft)?;
        let headers = self.headers();
        let resp = self.http.post(url.as_str(), &headers, body).await?;
        parse_json(resp)
    }

    async fn get(&mut self, id: u64) -> Result<TrainingRecord, ClientError> {
        let url = self.url(&["federated-trainings", &id.to_string()]);
        self.get_json(&url).await
    }

    async fn list(&mut self) -> Result<Vec<TrainingRecord>, ClientError> {
        let url = self.url(&["federated-trainings"]);
        self.get_json(&url).await
    }

    async fn list_mine(&mut self) -> Result<Vec<TrainingRecord>, ClientError> {
        let mut url = self.url(&["federated-trainings"]);
        url.query_pairs_mut().append_pair("mine", "1");
        self.get_json(&url).await
    }

    async fn update(
        &mut self,
        id: u64,
        patch: &UpdatePatch,
    ) -> Result<TrainingRecord, ClientError> {
        let url = self.url(&["federated-trainings", &id.to_string()]);
        let body = serde_json::to_vec(patch)?;
        let headers = self.headers();
        let resp = self.http.put(url.as_str(), &headers, body).await?;
        parse_json(resp)
    }

    async fn delete(&mut self, id: u64) -> Result<(), ClientError> {
        let url = self.url(&["federated-trainings", &id.to_string()]);
        let headers = self.headers();
        let resp = self.http.delete(url.as_str(), &headers).await?;
        match resp.status {
            200 | 204 => Ok(()),
            _ => Err(error_for(resp)),
        }
    }
}

#[cfg(feature = "reqwest-client")]
#[async_trait]
impl RegistryHttpClient for reqwest::Client {
    async fn get(
        &mut self,
        url: &str,
        headers: &[(&'static str, String)],
    ) -> Result<RawResponse, ClientError> {
        let mut request = reqwest::Client::get(self, url);
        for (name, value) in headers {
            request = request.header(*name, value);
        }
        into_raw(request.send().await).await
    }

    async fn post(
        &mut self,
        url: &str,
        headers: &[(&'static str, String)],
        body: Vec<u8>,
    ) -> Result<RawResponse, ClientError> {
        let mut request = reqwest::Client::post(self, url)
            .header("Content-Type", "application/json")
            .body(body);
        for (name, value) in headers {
            request = request.header(*name, value);
        }
        into_raw(request.send().await).await
    }

    async fn put(
        &mut self,
        url: &str,
        headers: &[(&'static str, String)],
        body: Vec<u8>,
    ) -> Result<RawResponse, ClientError> {
        let mut request = reqwest::Client::put(self, url)
            .header("Content-Type", "application/json")
            .body(body);
        for (name, value) in headers {
            request = request.header(*name, value);
        }
        into_raw(request.send().await).await
    }

    async fn delete(
        &mut self,
        url: &str,
        headers: &[(&'static str, String)],
    ) -> Result<RawResponse, ClientError> {
        let mut request = reqwest::Client::delete(self, url);
        for (name, value) in headers {
            request = request.header(*name, value);
        }
        into_raw(request.send().await).await
    }
}

#[cfg(feature = "reqwest-client")]
async fn into_raw(
    result: Result<reqwest::Response, reqwest::Error>,
) -> Result<RawResponse, ClientError> {
    let resp = result.map_err(|e| ClientError::Communication(format!("{}", e)))?;
    let status = resp.status().as_u16();
    let body = resp
        .bytes()
        .await
        .map_err(|e| ClientError::Communication(format!("{}", e)))?
        .to_vec();
    Ok(RawResponse { status, body })
}
