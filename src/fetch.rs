//! HTTP transport seam used by the catalog loader and chapter fetcher.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::error::NavError;

/// Blocking GET returning the response body as text.
///
/// Responses with status `200..400` count as success; anything else is
/// [`NavError::Http`]. `Sync` so the catalog loader can issue both catalog
/// requests at once.
pub trait Transport: Sync {
    fn get_text(&self, url: &str) -> Result<String, NavError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn get_text(&self, url: &str) -> Result<String, NavError> {
        (**self).get_text(url)
    }
}

#[cfg(feature = "http")]
pub use http::HttpTransport;

#[cfg(feature = "http")]
mod http {
    use std::time::Duration;

    use super::Transport;
    use crate::config::NavConfig;
    use crate::error::NavError;

    /// `ureq`-backed transport with connect/read/write timeouts.
    pub struct HttpTransport {
        agent: ureq::Agent,
    }

    impl HttpTransport {
        pub fn new(config: &NavConfig) -> Self {
            let timeout = Duration::from_millis(config.http_timeout_ms.max(1));
            let agent = ureq::AgentBuilder::new()
                .timeout_connect(timeout)
                .timeout_read(timeout)
                .timeout_write(timeout)
                .user_agent(&config.user_agent)
                .build();
            Self { agent }
        }
    }

    impl Transport for HttpTransport {
        fn get_text(&self, url: &str) -> Result<String, NavError> {
            log::debug!("GET {}", url);
            match self.agent.get(url).call() {
                Ok(resp) => {
                    let status = resp.status();
                    if !(200..400).contains(&status) {
                        return Err(NavError::Http {
                            url: url.to_string(),
                            status,
                        });
                    }
                    resp.into_string().map_err(|e| NavError::Transport {
                        url: url.to_string(),
                        message: format!("reading body: {}", e),
                    })
                }
                Err(ureq::Error::Status(status, _resp)) => Err(NavError::Http {
                    url: url.to_string(),
                    status,
                }),
                Err(ureq::Error::Transport(err)) => Err(NavError::Transport {
                    url: url.to_string(),
                    message: err.to_string(),
                }),
            }
        }
    }
}

/// In-memory transport serving canned bodies by exact URL.
///
/// Unknown URLs answer with status 404. Every request is recorded so tests
/// can assert on fetch counts.
#[derive(Debug, Default)]
pub struct MockTransport {
    routes: HashMap<String, Result<String, NavError>>,
    requests: Mutex<Vec<String>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `body` for `url`.
    pub fn with_body(mut self, url: impl Into<String>, body: impl Into<String>) -> Self {
        self.routes.insert(url.into(), Ok(body.into()));
        self
    }

    /// Fail `url` with `err`.
    pub fn with_error(mut self, url: impl Into<String>, err: NavError) -> Self {
        self.routes.insert(url.into(), Err(err));
        self
    }

    /// URLs requested so far, in order.
    pub fn requests(&self) -> Vec<String> {
        match self.requests.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn request_count(&self, url: &str) -> usize {
        self.requests().iter().filter(|u| u.as_str() == url).count()
    }
}

impl Transport for MockTransport {
    fn get_text(&self, url: &str) -> Result<String, NavError> {
        match self.requests.lock() {
            Ok(mut guard) => guard.push(url.to_string()),
            Err(poisoned) => poisoned.into_inner().push(url.to_string()),
        }
        match self.routes.get(url) {
            Some(result) => result.clone(),
            None => Err(NavError::Http {
                url: url.to_string(),
                status: 404,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_serves_routes_and_records_requests() {
        let transport = MockTransport::new()
            .with_body("https://x.test/a", "alpha")
            .with_error(
                "https://x.test/b",
                NavError::Transport {
                    url: "https://x.test/b".to_string(),
                    message: "refused".to_string(),
                },
            );

        assert_eq!(transport.get_text("https://x.test/a").as_deref(), Ok("alpha"));
        assert!(transport
            .get_text("https://x.test/b")
            .is_err_and(|e| e.is_transport()));
        assert_eq!(
            transport.get_text("https://x.test/c"),
            Err(NavError::Http {
                url: "https://x.test/c".to_string(),
                status: 404
            })
        );
        assert_eq!(transport.request_count("https://x.test/a"), 1);
        assert_eq!(transport.requests().len(), 3);
    }
}
