//! reqwest-backed transport
//!
//! Sends the credential as the `Cookie` header together with the fixed
//! `Referer` the remote service expects, reads the whole body as text and
//! hands it to `classify_response`.

use std::future::Future;
use std::pin::Pin;

use reqwest::header::{ACCEPT, COOKIE, HeaderValue, REFERER, RETRY_AFTER, USER_AGENT};
use tracing::{debug, instrument};

use crate::classify::classify_response;
use crate::constants;
use crate::{ApiRequest, Error, RemoteOutcome, Result, Transport};

/// HTTP transport for the remote service.
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
    referer: HeaderValue,
}

impl HttpTransport {
    /// Build a transport for `base_url`.
    ///
    /// Timeouts are a property of `client`; the transport does not add its own.
    pub fn new(client: reqwest::Client, base_url: &str, referer: &str) -> Result<Self> {
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(Error::InvalidBaseUrl(base_url.to_string()));
        }
        let referer = HeaderValue::from_str(referer)
            .map_err(|e| Error::InvalidHeader(format!("referer: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            referer,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    #[instrument(skip_all, fields(method = %request.method, path = %request.path))]
    async fn send_inner(&self, request: &ApiRequest, credential: &str) -> RemoteOutcome {
        let mut builder = self
            .client
            .request(request.method.clone(), self.url(&request.path))
            .header(REFERER, self.referer.clone())
            .header(ACCEPT, "application/json")
            .header(USER_AGENT, constants::USER_AGENT);

        if !credential.is_empty() {
            match HeaderValue::from_str(credential) {
                Ok(mut value) => {
                    value.set_sensitive(true);
                    builder = builder.header(COOKIE, value);
                }
                Err(e) => {
                    return RemoteOutcome::Failure(format!(
                        "credential is not a valid cookie header: {e}"
                    ));
                }
            }
        }

        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = match builder.send().await {
            Ok(r) => r,
            Err(e) if e.is_timeout() => {
                return RemoteOutcome::Failure(format!("request timed out: {e}"));
            }
            Err(e) => return RemoteOutcome::Failure(format!("request failed: {e}")),
        };

        let status = response.status().as_u16();
        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);

        let body = match response.text().await {
            Ok(b) => b,
            Err(e) => return RemoteOutcome::Failure(format!("reading response body: {e}")),
        };

        let outcome = classify_response(status, retry_after.as_deref(), &body);
        debug!(status, outcome = outcome.label(), "remote call finished");
        outcome
    }
}

impl Transport for HttpTransport {
    fn send<'a>(
        &'a self,
        request: &'a ApiRequest,
        credential: &'a str,
    ) -> Pin<Box<dyn Future<Output = RemoteOutcome> + Send + 'a>> {
        Box::pin(self.send_inner(request, credential))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Response, StatusCode};
    use serde_json::json;
    use std::time::Duration;
    use tokio::net::TcpListener;

    /// Start a mock upstream answering every request with the given status,
    /// headers and body.
    async fn start_mock(
        status: StatusCode,
        headers: Vec<(&'static str, &'static str)>,
        body: &'static str,
    ) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        tokio::spawn(async move {
            let app = axum::Router::new().fallback(move || {
                let headers = headers.clone();
                async move {
                    let mut response = Response::builder().status(status);
                    for (name, value) in headers {
                        response = response.header(name, value);
                    }
                    response.body(Body::from(body)).unwrap()
                }
            });
            axum::serve(listener, app).await.unwrap();
        });
        url
    }

    /// Start a mock upstream that echoes method, path, cookie, referer and body.
    async fn start_echo() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        tokio::spawn(async move {
            let app = axum::Router::new().fallback(
                |request: axum::http::Request<Body>| async move {
                    let (cookie, referer) = {
                        let header = |name: &str| {
                            request
                                .headers()
                                .get(name)
                                .and_then(|v| v.to_str().ok())
                                .unwrap_or("")
                                .to_string()
                        };
                        (header("cookie"), header("referer"))
                    };
                    let method = request.method().to_string();
                    let path = request.uri().path().to_string();
                    let bytes = axum::body::to_bytes(request.into_body(), 1024 * 1024)
                        .await
                        .unwrap();
                    let body = json!({
                        "success": true,
                        "method": method,
                        "path": path,
                        "cookie": cookie,
                        "referer": referer,
                        "body": String::from_utf8_lossy(&bytes),
                    });
                    axum::Json(body)
                },
            );
            axum::serve(listener, app).await.unwrap();
        });
        url
    }

    fn transport(url: &str) -> HttpTransport {
        HttpTransport::new(reqwest::Client::new(), url, "https://game.example/").unwrap()
    }

    #[tokio::test]
    async fn sends_cookie_referer_and_json_body() {
        let url = start_echo().await;
        let transport = transport(&url);

        let outcome = transport
            .send(&ApiRequest::complete_task("7"), "sid=abc")
            .await;

        let RemoteOutcome::Ok(payload) = outcome else {
            panic!("expected Ok, got {outcome:?}");
        };
        assert_eq!(payload["method"], "POST");
        assert_eq!(payload["path"], "/api/tasks/7/complete");
        assert_eq!(payload["cookie"], "sid=abc");
        assert_eq!(payload["referer"], "https://game.example/");
        assert_eq!(payload["body"], "{}");
    }

    #[tokio::test]
    async fn reserved_characters_in_ids_stay_in_one_segment() {
        let url = start_echo().await;
        let transport = transport(&url);

        let outcome = transport
            .send(&ApiRequest::open_lootbox("gold/../x?y"), "sid=abc")
            .await;

        let RemoteOutcome::Ok(payload) = outcome else {
            panic!("expected Ok, got {outcome:?}");
        };
        assert_eq!(payload["path"], "/api/lootboxes/gold%2F..%2Fx%3Fy/open");
    }

    #[tokio::test]
    async fn empty_credential_sends_no_cookie() {
        let url = start_echo().await;
        let outcome = transport(&url).send(&ApiRequest::identity(), "").await;
        let RemoteOutcome::Ok(payload) = outcome else {
            panic!("expected Ok, got {outcome:?}");
        };
        assert_eq!(payload["cookie"], "");
        assert_eq!(payload["method"], "GET");
    }

    #[tokio::test]
    async fn rate_limit_with_retry_after_header() {
        let url = start_mock(
            StatusCode::TOO_MANY_REQUESTS,
            vec![("retry-after", "4")],
            "<html>slow down</html>",
        )
        .await;

        let outcome = transport(&url).send(&ApiRequest::create_token(), "c=1").await;
        assert_eq!(
            outcome,
            RemoteOutcome::RateLimited {
                wait_hint: Some(Duration::from_secs(4)),
                raw: Some("4".into()),
            }
        );
    }

    #[tokio::test]
    async fn forbidden_html_is_auth_invalid() {
        let url = start_mock(StatusCode::FORBIDDEN, vec![], "<html>Forbidden</html>").await;
        let outcome = transport(&url).send(&ApiRequest::identity(), "c=1").await;
        assert_eq!(outcome, RemoteOutcome::AuthInvalid(403));
    }

    #[tokio::test]
    async fn dead_upstream_is_failure() {
        // Bind then drop to get a port nothing listens on
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);

        let outcome = transport(&url).send(&ApiRequest::identity(), "c=1").await;
        assert!(
            matches!(outcome, RemoteOutcome::Failure(_)),
            "got {outcome:?}"
        );
    }

    #[tokio::test]
    async fn invalid_cookie_value_is_failure_without_sending() {
        let url = start_echo().await;
        let outcome = transport(&url)
            .send(&ApiRequest::identity(), "bad\nvalue")
            .await;
        assert!(matches!(outcome, RemoteOutcome::Failure(_)));
    }

    #[test]
    fn rejects_base_url_without_scheme() {
        let result = HttpTransport::new(reqwest::Client::new(), "game.example", "x");
        assert!(matches!(result, Err(Error::InvalidBaseUrl(_))));
    }

    #[test]
    fn trailing_slash_is_trimmed() {
        let t = transport("https://game.example/");
        assert_eq!(t.url("/api/tasks"), "https://game.example/api/tasks");
    }
}
