use bytes::Bytes;
use futures::future::BoxFuture;
use futures::stream::BoxStream;
use futures::{FutureExt, StreamExt, TryStreamExt};
use reqwest::header::HeaderMap;
use reqwest::{Method, Url};

use crate::error::BoxError;

/// Response body as a stream of chunks. Dropping it releases the underlying connection.
pub type Body = BoxStream<'static, Result<Bytes, BoxError>>;

#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
}

pub struct Response {
    pub status: u16,
    pub body: Body,
}

impl Response {
    pub fn new(status: u16, body: Body) -> Self {
        Self { status, body }
    }

    /// Response with the whole body already in memory.
    pub fn from_bytes(status: u16, body: impl Into<Bytes>) -> Self {
        let body: Bytes = body.into();
        Self::new(status, futures::stream::once(async move { Ok::<_, BoxError>(body) }).boxed())
    }

    /// Reads the remaining body to the end, consuming the response.
    pub async fn read_body(self) -> Result<Vec<u8>, BoxError> {
        let mut body = self.body;
        let mut buf = Vec::new();
        while let Some(chunk) = body.try_next().await? {
            buf.extend_from_slice(&chunk);
        }

        Ok(buf)
    }
}

impl std::fmt::Debug for Response {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Response")
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

/// Performs a single HTTP exchange. Implementations decide pooling, TLS and timeouts.
pub trait Transport: Send + Sync {
    fn send(&self, request: Request) -> BoxFuture<'_, Result<Response, BoxError>>;
}

#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    http: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(http: reqwest::Client) -> Self {
        Self { http }
    }
}

impl Transport for ReqwestTransport {
    fn send(&self, request: Request) -> BoxFuture<'_, Result<Response, BoxError>> {
        async move {
            let response = self
                .http
                .request(request.method, request.url)
                .headers(request.headers)
                .send()
                .await?;

            let status = response.status().as_u16();
            let body = response
                .bytes_stream()
                .map_err(|e| Box::new(e) as BoxError)
                .boxed();

            Ok::<_, BoxError>(Response::new(status, body))
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::{HeaderName, HeaderValue};
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_from_bytes_reads_back() {
        let response = Response::from_bytes(200, "hello");
        assert_eq!(response.status, 200);
        assert_eq!(response.read_body().await.unwrap(), b"hello");
    }

    #[tokio::test]
    async fn test_read_body_joins_chunks() {
        let chunks: Vec<Result<Bytes, BoxError>> =
            vec![Ok(Bytes::from_static(b"{\"a\":")), Ok(Bytes::from_static(b"1}"))];
        let response = Response::new(200, futures::stream::iter(chunks).boxed());

        assert_eq!(response.read_body().await.unwrap(), b"{\"a\":1}");
    }

    #[tokio::test]
    async fn test_read_body_surfaces_stream_error() {
        let chunks: Vec<Result<Bytes, BoxError>> =
            vec![Ok(Bytes::from_static(b"{")), Err("connection reset".into())];
        let response = Response::new(200, futures::stream::iter(chunks).boxed());

        let err = response.read_body().await.unwrap_err();
        assert_eq!(err.to_string(), "connection reset");
    }

    #[tokio::test]
    async fn test_reqwest_transport_sends_request() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/secrets"))
            .and(query_param("project", "backend"))
            .and(header("Accepts", "application/json"))
            .respond_with(ResponseTemplate::new(201).set_body_string("created"))
            .expect(1)
            .mount(&server)
            .await;

        let mut headers = HeaderMap::new();
        headers.insert(
            HeaderName::from_static("accepts"),
            HeaderValue::from_static("application/json"),
        );
        let request = Request {
            method: Method::GET,
            url: Url::parse(&format!("{}/secrets?project=backend", server.uri())).unwrap(),
            headers,
        };

        let response = ReqwestTransport::new().send(request).await.unwrap();
        assert_eq!(response.status, 201);
        assert_eq!(response.read_body().await.unwrap(), b"created");
    }

    #[tokio::test]
    async fn test_reqwest_transport_connection_failure() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);
        let url = Url::parse(&format!("http://127.0.0.1:{port}/secrets")).unwrap();

        let request = Request {
            method: Method::GET,
            url,
            headers: HeaderMap::new(),
        };

        assert!(ReqwestTransport::new().send(request).await.is_err());
    }
}
