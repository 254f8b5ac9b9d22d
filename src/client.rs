use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use reqwest::{header::USER_AGENT, Client as ReqwestClient, Method, StatusCode};
use serde_json::Value;
use tokio::{
    sync::{Semaphore, SemaphorePermit},
    task::JoinHandle,
    time::interval,
};

use crate::{
    error::Error,
    interfaces::Interfaces,
    models::{
        page::{Envelope, Page},
        Params,
    },
    result::Result,
};

/// Root of the Disqus REST API.
pub const API_ROOT: &str = "https://disqus.com/api/3.0";

const RATE_LIMIT_CODES: [u16; 2] = [13, 14];

/// The one capability the export needs from an API client.
///
/// `endpoint` is a dotted name such as `forums.listThreads`. `params`
/// may carry a `method` entry selecting the HTTP method.
#[async_trait]
pub trait Api {
    /// Performs one request and returns the page it produced.
    ///
    /// Implementations must report an exceeded quota as
    /// [`Error::RateLimited`] so callers can tell it apart.
    async fn get(&self, endpoint: &str, params: &Params) -> Result<Page>;
}

/// Key pair issued for an application.
#[derive(Clone)]
pub struct Credentials {
    /// Public API key.
    pub api_key: String,
    /// Secret API key.
    pub api_secret: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &self.api_key)
            .field("api_secret", &"<redacted>")
            .finish()
    }
}

/// Authenticated HTTP client for the Disqus API.
#[derive(Debug)]
pub struct Client {
    http: ReqwestClient,
    credentials: Credentials,
    interfaces: Interfaces,
    root: String,
    limiter: Option<RateLimit>,
}

/// Spaces requests out to at most one per interval.
#[derive(Debug)]
pub(crate) struct RateLimit {
    pub(crate) permit: Arc<Semaphore>,
    pub(crate) replenisher: JoinHandle<()>,
}

impl RateLimit {
    /// Must be called from within a tokio runtime.
    fn new(period: Duration) -> Self {
        let permit = Arc::new(Semaphore::new(1));
        let clone = permit.clone();

        let replenisher = tokio::spawn(async move {
            let mut interval = interval(period);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                if clone.available_permits() == 0 {
                    clone.add_permits(1);
                }
            }
        });

        RateLimit {
            permit,
            replenisher,
        }
    }

    pub async fn acquire(&self) -> Result<SemaphorePermit<'_>> {
        self.permit
            .acquire()
            .await
            .map_err(|e| Error::Io(std::io::Error::new(std::io::ErrorKind::Other, e)))
    }
}

impl Drop for RateLimit {
    fn drop(&mut self) {
        self.replenisher.abort();
    }
}

impl Client {
    /// Constructs a client.
    ///
    /// When `request_interval` is set, requests are paced to at most one
    /// per interval. Pacing spawns a background task, so in that case this
    /// must be called from within a tokio runtime.
    pub fn new(
        credentials: Credentials,
        interfaces: Interfaces,
        request_interval: Option<Duration>,
    ) -> Client {
        let limiter = request_interval
            .filter(|period| !period.is_zero())
            .map(RateLimit::new);

        Client {
            http: ReqwestClient::new(),
            credentials,
            interfaces,
            root: API_ROOT.to_string(),
            limiter,
        }
    }

    /// Points the client at a different API root.
    #[must_use]
    pub fn with_root(mut self, root: impl Into<String>) -> Self {
        self.root = root.into().trim_end_matches('/').to_string();
        self
    }

    /// Returns the URL a dotted endpoint resolves to.
    pub fn endpoint_url(&self, endpoint: &str) -> String {
        format!("{}/{}.json", self.root, endpoint.replace('.', "/"))
    }

    /// Splits `params` into the HTTP method and the arguments sent on the wire,
    /// with the credentials appended.
    pub(crate) fn prepare(&self, default_method: Option<&str>, params: &Params) -> (Method, Params) {
        let method = params
            .get("method")
            .map(String::as_str)
            .or(default_method)
            .map_or(Method::GET, |m| {
                if m.eq_ignore_ascii_case("POST") {
                    Method::POST
                } else {
                    Method::GET
                }
            });

        let mut args: Params = params
            .iter()
            .filter(|(k, _)| k.as_str() != "method")
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        args.insert("api_key".to_string(), self.credentials.api_key.clone());
        args.insert("api_secret".to_string(), self.credentials.api_secret.clone());

        (method, args)
    }
}

#[async_trait]
impl Api for Client {
    async fn get(&self, endpoint: &str, params: &Params) -> Result<Page> {
        let interface = self.interfaces.lookup(endpoint)?;
        interface.check(endpoint, params)?;

        let (method, args) = self.prepare(interface.method.as_deref(), params);
        let url = self.endpoint_url(endpoint);

        let permit = match &self.limiter {
            Some(limiter) => Some(limiter.acquire().await?),
            None => None,
        };

        let response = {
            let builder = self
                .http
                .request(method.clone(), &url)
                .header(USER_AGENT, "DisqusExport/0.1");
            let builder = if method == Method::POST {
                builder.form(&args)
            } else {
                builder.query(&args)
            };
            log::debug!("{} {} dispatched", method, endpoint);
            builder.send().await?
        };

        // reduce the permit count
        if let Some(permit) = permit {
            permit.forget();
        }

        let status = response.status();
        log::debug!("response status: {}", status);
        let body = response.text().await?;

        decode(status, &body)
    }
}

/// Turns a raw response into a page or a classified error.
pub(crate) fn decode(status: StatusCode, body: &str) -> Result<Page> {
    let envelope: Envelope = match serde_json::from_str(body) {
        Ok(envelope) => envelope,
        Err(_) if status == StatusCode::TOO_MANY_REQUESTS => {
            return Err(Error::RateLimited {
                code: status.as_u16(),
                message: body.trim().to_string(),
            })
        }
        Err(_) if !status.is_success() => return Err(Error::UnexpectedStatus(status)),
        Err(e) => return Err(e.into()),
    };

    match envelope.code {
        0 => {
            let records = match envelope.response {
                Value::Array(records) => records,
                Value::Null => Vec::new(),
                single => vec![single],
            };
            Ok(Page::new(records, envelope.cursor))
        }
        code if RATE_LIMIT_CODES.contains(&code) => Err(Error::RateLimited {
            code,
            message: envelope.message(),
        }),
        _ if status == StatusCode::TOO_MANY_REQUESTS => Err(Error::RateLimited {
            code: envelope.code,
            message: envelope.message(),
        }),
        code => Err(Error::Api {
            code,
            message: envelope.message(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::macros::params;
    use serde_json::json;

    fn client() -> Client {
        let creds = Credentials {
            api_key: "pub".to_string(),
            api_secret: "sec".to_string(),
        };
        Client::new(creds, Interfaces::new(json!({})), None)
    }

    #[test]
    fn decode_success_page() {
        let body = r#"{
            "cursor": {"prev": null, "hasNext": true, "next": "c2", "id": "c2", "more": true},
            "code": 0,
            "response": [{"id": "1"}, {"id": "2"}]
        }"#;
        let page = decode(StatusCode::OK, body).unwrap();
        assert_eq!(page.records().len(), 2);
        assert_eq!(page.records()[1]["id"], "2");
        let cursor = page.cursor().unwrap();
        assert!(cursor.more());
        assert_eq!(cursor.id(), Some("c2"));
    }

    #[test]
    fn decode_empty_page_without_cursor() {
        let page = decode(StatusCode::OK, r#"{"code": 0, "response": []}"#).unwrap();
        assert!(page.records().is_empty());
        assert!(page.cursor().is_none());
    }

    #[test]
    fn decode_rate_limit_codes() {
        let body = r#"{"code": 13, "response": "You have exceeded the rate limit for this resource."}"#;
        let err = decode(StatusCode::FORBIDDEN, body).unwrap_err();
        assert!(err.is_rate_limit());

        let body = r#"{"code": 14, "response": "You have exceeded the rate limit for your account."}"#;
        assert!(decode(StatusCode::OK, body).unwrap_err().is_rate_limit());

        let err = decode(StatusCode::TOO_MANY_REQUESTS, "slow down").unwrap_err();
        assert!(matches!(err, Error::RateLimited { code: 429, .. }));
    }

    #[test]
    fn decode_other_api_errors() {
        let body = r#"{"code": 2, "response": "Invalid argument, 'forum': Unable to find forum 'x'"}"#;
        let err = decode(StatusCode::BAD_REQUEST, body).unwrap_err();
        assert!(matches!(err, Error::Api { code: 2, .. }));
        assert!(err.is_api_error());
        assert!(!err.is_rate_limit());
    }

    #[test]
    fn decode_non_envelope_bodies() {
        let err = decode(StatusCode::BAD_GATEWAY, "<html>").unwrap_err();
        assert!(matches!(err, Error::UnexpectedStatus(s) if s == StatusCode::BAD_GATEWAY));

        let err = decode(StatusCode::OK, "<html>").unwrap_err();
        assert!(matches!(err, Error::Json(_)));
    }

    #[test]
    fn endpoint_urls() {
        let c = client();
        assert_eq!(
            c.endpoint_url("forums.listThreads"),
            "https://disqus.com/api/3.0/forums/listThreads.json"
        );
        let c = c.with_root("http://localhost:8080/api/");
        assert_eq!(c.endpoint_url("posts.list"), "http://localhost:8080/api/posts/list.json");
    }

    #[test]
    fn prepare_strips_method_and_signs() {
        let c = client();
        let (method, args) = c.prepare(Some("GET"), &params! {"method" => "POST", "thread" => "9"});
        assert_eq!(method, Method::POST);
        assert!(!args.contains_key("method"));
        assert_eq!(args["thread"], "9");
        assert_eq!(args["api_key"], "pub");
        assert_eq!(args["api_secret"], "sec");

        let (method, _) = c.prepare(None, &params! {"forum" => "f"});
        assert_eq!(method, Method::GET);
    }

    #[test]
    fn credentials_debug_hides_secret() {
        let c = client();
        let shown = format!("{:?}", c.credentials);
        assert!(shown.contains("pub"));
        assert!(!shown.contains("\"sec\""));
    }

    #[tokio::test]
    async fn unknown_endpoint_fails_before_network() {
        let c = client().with_root("http://127.0.0.1:9");
        let err = c.get("forums.listThreads", &params! {"forum" => "f"}).await.unwrap_err();
        assert!(matches!(err, Error::UnknownEndpoint(_)));
    }

    #[tokio::test]
    async fn missing_parameter_fails_before_network() {
        let interfaces = Interfaces::new(json!({
            "forums": {"listThreads": {"method": "GET", "required": ["forum"]}}
        }));
        let creds = Credentials {
            api_key: "pub".to_string(),
            api_secret: "sec".to_string(),
        };
        let c = Client::new(creds, interfaces, None).with_root("http://127.0.0.1:9");
        let err = c.get("forums.listThreads", &params! {"method" => "GET"}).await.unwrap_err();
        assert!(matches!(err, Error::MissingParameter { .. }));
    }
}
