use reqwest::StatusCode;
use std::time::Duration;

/// Backoff settings for [`request_with_retry`].
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_delay: Duration::from_millis(1000),
            max_delay: Duration::from_secs(60),
        }
    }
}

impl RetryPolicy {
    /// A single attempt, no backoff.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }
}

/// Retries a request closure with exponential backoff.
/// Retries on:
/// - Network errors
/// - 429 Too Many Requests (respects Retry-After header)
/// - 5xx Server Errors
///
/// Returns the last Response (even if error status) or the last network error.
pub async fn request_with_retry<F, Fut>(
    mut task: F,
    policy: RetryPolicy,
) -> Result<reqwest::Response, reqwest::Error>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<reqwest::Response, reqwest::Error>>,
{
    let mut attempt = 0;
    let mut delay = policy.initial_delay;

    loop {
        attempt += 1;
        match task().await {
            Ok(response) => {
                let status = response.status();
                if status.is_success() || attempt > policy.max_retries {
                    return Ok(response);
                }

                if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
                    let retry_delay = response
                        .headers()
                        .get("retry-after")
                        .and_then(|v| v.to_str().ok())
                        .and_then(|v| v.parse::<u64>().ok())
                        .map(Duration::from_secs)
                        .unwrap_or(delay)
                        .min(policy.max_delay);

                    tracing::warn!(
                        "[HTTP] Request failed with status {}, retrying in {:?} (attempt {}/{})",
                        status,
                        retry_delay,
                        attempt,
                        policy.max_retries
                    );
                    tokio::time::sleep(retry_delay).await;
                    delay = std::cmp::min(delay * 2, policy.max_delay);
                    continue;
                }

                // 400, 401, 404 and friends are permanent
                return Ok(response);
            }
            Err(e) => {
                if attempt > policy.max_retries {
                    return Err(e);
                }
                tracing::warn!(
                    "[HTTP] Network error: {}, retrying in {:?} (attempt {}/{})",
                    e,
                    delay,
                    attempt,
                    policy.max_retries
                );
                tokio::time::sleep(delay).await;
                delay = std::cmp::min(delay * 2, policy.max_delay);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fast_policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            initial_delay: Duration::from_millis(5),
            max_delay: Duration::from_millis(20),
        }
    }

    async fn post(client: &reqwest::Client, url: &str) -> Result<reqwest::Response, reqwest::Error> {
        client.post(url).body("{}").send().await
    }

    #[tokio::test]
    async fn retries_server_errors_then_returns_last_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/flaky"))
            .respond_with(ResponseTemplate::new(503))
            .expect(3)
            .mount(&server)
            .await;

        let client = reqwest::Client::builder().no_proxy().build().unwrap();
        let url = format!("{}/flaky", server.uri());
        let (client, url) = (&client, url.as_str());
        let response = request_with_retry(move || post(client, url), fast_policy(2))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn client_errors_are_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/denied"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&server)
            .await;

        let client = reqwest::Client::builder().no_proxy().build().unwrap();
        let url = format!("{}/denied", server.uri());
        let (client, url) = (&client, url.as_str());
        let response = request_with_retry(move || post(client, url), fast_policy(3))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn network_error_surfaces_after_retries() {
        let client = reqwest::Client::builder().no_proxy().build().unwrap();
        let client = &client;
        // Nothing listens on the discard port in test environments.
        let result =
            request_with_retry(move || post(client, "http://127.0.0.1:9/x"), fast_policy(1)).await;
        assert!(result.is_err());
    }
}
