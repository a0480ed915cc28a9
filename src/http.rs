use anyhow::{anyhow, Context, Result};
use reqwest::{
    header,
    header::{HeaderMap, HeaderValue},
    Client, ClientBuilder, Method, StatusCode,
};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tokio::time::Duration;
use tracing::{event, Level};

use crate::models::{lenient, UserType};

pub const API_URL: &str = "https://www.blacktri.com/api/v1";

/// The environment variable to change the default timeout for blacktri requests.
const BLACKTRI_TIMEOUT_MS: &str = "BLACKTRI_TIMEOUT_MS";
const DEFAULT_TIMEOUT_MS: u64 = 5000;

fn timeout_from_env() -> Duration {
    let timeout = std::env::var(BLACKTRI_TIMEOUT_MS)
        .ok()
        .and_then(|t| t.parse::<u64>().ok())
        .unwrap_or(DEFAULT_TIMEOUT_MS);
    Duration::from_millis(timeout)
}

fn create_http_connection_client(timeout: Option<Duration>) -> Result<Client> {
    let mut headers = HeaderMap::new();
    headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    ClientBuilder::new()
        .pool_idle_timeout(Some(Duration::from_secs(60)))
        .tcp_keepalive(Some(Duration::from_secs(30)))
        .timeout(timeout.unwrap_or_else(timeout_from_env))
        .default_headers(headers)
        .build()
        .context("should be able to build the http client")
}

/// Executes requests against the API root, authenticating every call with
/// the account's api key and secret.
#[derive(Clone)]
pub struct BlackTriHttpClient {
    base_url: String,
    api_key: String,
    api_secret: String,
    http_client: Client,
}

impl BlackTriHttpClient {
    pub fn new(
        api_key: String,
        api_secret: String,
        api_url: Option<String>,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        let base_url = api_url
            .unwrap_or_else(|| API_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        let http_client = create_http_connection_client(timeout)?;
        Ok(Self {
            base_url,
            api_key,
            api_secret,
            http_client,
        })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// Sends `payload` (if any) to `path` and decodes the response into `T`.
    ///
    /// Responses without content (204 or an empty body) decode from JSON `null`,
    /// so `T` should be `Option<_>`, `()` or `serde_json::Value` for those.
    pub async fn perform_request<T: DeserializeOwned>(
        &self,
        path: &str,
        method: Method,
        payload: Option<Value>,
    ) -> Result<T> {
        let url = self.url(path);
        event!(Level::DEBUG, "{} {}", method, url);

        let mut request = self
            .http_client
            .request(method.clone(), url.as_str())
            .basic_auth(&self.api_key, Some(&self.api_secret));
        if let Some(body) = payload {
            event!(Level::TRACE, "{} {} payload: {}", method, url, body);
            request = request.json(&body);
        }

        let response = request.send().await;
        let res = match response {
            Ok(result) => match result.status() {
                status if status.is_success() => Ok(result),
                status => {
                    let body = result.text().await.unwrap_or_default();
                    event!(
                        Level::WARN,
                        "Error while calling {} {}: {} {}",
                        method,
                        url,
                        status,
                        body
                    );
                    Err(anyhow!("blacktri error: {}", status))
                }
            },
            Err(err) => Err(anyhow!("failed to send request: {}", err)),
        }?;

        if res.status() == StatusCode::NO_CONTENT {
            event!(Level::TRACE, "{} {} returned no content", method, url);
            return serde_json::from_value(Value::Null)
                .map_err(|e| anyhow!("error parsing empty response: {}", e));
        }

        let body = res
            .bytes()
            .await
            .map_err(|e| anyhow!("error reading response: {}", e))?;
        if body.is_empty() {
            return serde_json::from_value(Value::Null)
                .map_err(|e| anyhow!("error parsing empty response: {}", e));
        }

        serde_json::from_slice(&body).map_err(|e| anyhow!("error parsing response: {}", e))
    }

    /// Exchanges the api credentials for the id of the logged in account.
    pub async fn login(&self, user_type: UserType) -> Result<u64> {
        #[derive(Serialize)]
        struct LoginBody<'a> {
            apikey: &'a str,
            apisecret: &'a str,
            usertype: UserType,
        }

        let body = LoginBody {
            apikey: &self.api_key,
            apisecret: &self.api_secret,
            usertype: user_type,
        };

        let id: Value = self
            .perform_request("login", Method::POST, Some(serde_json::to_value(&body)?))
            .await?;
        lenient::from_value(id)
            .map_err(|e| anyhow!("error parsing login response: {}", e))?
            .ok_or_else(|| anyhow!("login response did not contain an account id"))
    }
}
