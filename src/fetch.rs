// src/fetch.rs
// =============================================================================
// HTTP fetching.
//
// One reqwest client is built per crawl and shared by all workers (it is
// cheap to clone and pools connections internally). Automatic redirect
// following is disabled: the worker follows redirects itself so that every
// hop is deduplicated and reported.
//
// Timeouts:
// - response_header_timeout bounds the wait for the status line + headers
// - timeout bounds the whole request including the body
// =============================================================================

use hyper::client::connect::dns::Name;
use reqwest::dns::{Addrs, Resolve, Resolving};
use reqwest::header::{HeaderMap, LOCATION};
use reqwest::{Client, StatusCode};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use url::Url;

use hickory_resolver::config::{
    NameServerConfig, NameServerConfigGroup, Protocol, ResolverConfig, ResolverOpts,
};
use hickory_resolver::TokioAsyncResolver;

use crate::error::CrawlError;
use crate::options::{parse_resolver, Options};
use crate::resolve::canonicalize;

/// A fetched response with its body fully read.
#[derive(Debug)]
pub struct Page {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl Page {
    pub fn is_redirect(&self) -> bool {
        self.status.is_redirection()
    }

    /// The canonical redirect target, resolved against the requested URL.
    pub fn location(&self, requested: &Url) -> Result<Url, CrawlError> {
        let invalid = || CrawlError::InvalidRedirect {
            url: requested.to_string(),
        };

        let raw = self
            .headers
            .get(LOCATION)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or_else(invalid)?;

        let target = requested.join(raw).map_err(|_| invalid())?;
        canonicalize(target.as_str()).map_err(|_| invalid())
    }
}

#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    header_timeout: Duration,
}

impl Fetcher {
    pub fn new(options: &Options) -> Result<Self, CrawlError> {
        Ok(Self {
            client: build_client(options)?,
            header_timeout: options.response_header_timeout(),
        })
    }

    /// Issues a single GET without following redirects.
    pub async fn fetch(&self, url: &Url) -> Result<Page, CrawlError> {
        debug!("Requesting {}", url);

        let response = self.send(url).await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .map_err(|e| CrawlError::transport(url, e))?
            .to_vec();

        Ok(Page {
            status,
            headers,
            body,
        })
    }

    /// Finds a scheme for a target given without one: https if anything
    /// answers there, otherwise http.
    pub async fn probe_scheme(&self, target: &str) -> Result<&'static str, CrawlError> {
        for scheme in ["https", "http"] {
            let Ok(url) = Url::parse(&format!("{}://{}", scheme, target)) else {
                continue;
            };

            match self.send(&url).await {
                Ok(_) => return Ok(scheme),
                Err(e) => debug!("Probe of {} failed: {}", url, e),
            }
        }

        Err(CrawlError::SchemeUnresolved(target.to_string()))
    }

    async fn send(&self, url: &Url) -> Result<reqwest::Response, CrawlError> {
        let request = self.client.get(url.as_str()).send();
        match tokio::time::timeout(self.header_timeout, request).await {
            Ok(result) => result.map_err(|e| CrawlError::transport(url, e)),
            Err(_) => Err(CrawlError::HeaderTimeout {
                url: url.to_string(),
                seconds: self.header_timeout.as_secs(),
            }),
        }
    }
}

fn build_client(options: &Options) -> Result<Client, CrawlError> {
    let mut builder = Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .timeout(options.timeout())
        .user_agent(options.user_agent.as_str())
        .danger_accept_invalid_certs(options.accept_invalid_certs)
        .pool_max_idle_per_host(options.concurrency);

    if let Some(proxy) = &options.proxy {
        builder = builder.proxy(reqwest::Proxy::all(proxy.as_str()).map_err(CrawlError::Client)?);
    }

    let servers: Vec<SocketAddr> = options
        .resolvers
        .iter()
        .filter_map(|raw| parse_resolver(raw))
        .collect();
    if !servers.is_empty() {
        builder = builder.dns_resolver(Arc::new(CustomResolver::new(&servers)));
    }

    builder.build().map_err(CrawlError::Client)
}

type BoxError = Box<dyn std::error::Error + Send + Sync>;

// Sends DNS queries to the configured servers instead of the system ones
struct CustomResolver {
    inner: TokioAsyncResolver,
}

impl CustomResolver {
    fn new(servers: &[SocketAddr]) -> Self {
        let mut group = NameServerConfigGroup::with_capacity(servers.len());
        for server in servers {
            group.push(NameServerConfig::new(*server, Protocol::Udp));
        }
        let config = ResolverConfig::from_parts(None, Vec::new(), group);

        // Only the given servers answer; /etc/hosts is not consulted
        let mut opts = ResolverOpts::default();
        opts.use_hosts_file = false;

        Self {
            inner: TokioAsyncResolver::tokio(config, opts),
        }
    }
}

impl Resolve for CustomResolver {
    fn resolve(&self, name: Name) -> Resolving {
        let resolver = self.inner.clone();
        Box::pin(async move {
            let lookup = resolver
                .lookup_ip(name.as_str())
                .await
                .map_err(|e| Box::new(e) as BoxError)?;

            // reqwest fills in the port
            let addrs: Addrs = Box::new(
                lookup
                    .iter()
                    .map(|ip| SocketAddr::new(ip, 0))
                    .collect::<Vec<_>>()
                    .into_iter(),
            );
            Ok::<_, BoxError>(addrs)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fetcher() -> Fetcher {
        let options = Options {
            timeout: 5,
            response_header_timeout: 2,
            ..Default::default()
        };
        Fetcher::new(&options).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_returns_status_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/page"))
            .respond_with(ResponseTemplate::new(200).set_body_string("hello"))
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/page", server.uri())).unwrap();
        let page = fetcher().fetch(&url).await.unwrap();
        assert_eq!(page.status, StatusCode::OK);
        assert_eq!(page.body, b"hello");
    }

    #[tokio::test]
    async fn test_redirects_are_not_followed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/old"))
            .respond_with(ResponseTemplate::new(302).insert_header("Location", "/new/"))
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/old", server.uri())).unwrap();
        let page = fetcher().fetch(&url).await.unwrap();
        assert!(page.is_redirect());
        assert_eq!(
            page.location(&url).unwrap().as_str(),
            format!("{}/new", server.uri())
        );
    }

    #[tokio::test]
    async fn test_missing_location() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(301))
            .mount(&server)
            .await;

        let url = Url::parse(&server.uri()).unwrap();
        let page = fetcher().fetch(&url).await.unwrap();
        assert!(page.is_redirect());
        assert!(matches!(
            page.location(&url),
            Err(CrawlError::InvalidRedirect { .. })
        ));
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport_error() {
        // Bind and drop a listener to get a port nobody listens on
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let url = Url::parse(&format!("http://127.0.0.1:{}/", port)).unwrap();
        let err = fetcher().fetch(&url).await.unwrap_err();
        assert!(matches!(err, CrawlError::Transport { .. }));
    }

    #[tokio::test]
    async fn test_probe_falls_back_to_http() {
        let server = MockServer::start().await;
        let authority = server.uri().trim_start_matches("http://").to_string();

        let scheme = fetcher().probe_scheme(&authority).await.unwrap();
        assert_eq!(scheme, "http");
    }

    #[tokio::test]
    async fn test_fetcher_builds_with_custom_resolvers() {
        let options = Options {
            resolvers: vec!["127.0.0.1:53".into(), "10.0.0.1".into()],
            ..Default::default()
        };
        assert!(Fetcher::new(&options).is_ok());
    }

    #[tokio::test]
    async fn test_custom_resolver_replaces_system_lookup() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;
        let port = server.address().port();

        // A DNS server address with nobody answering on it
        let socket = std::net::UdpSocket::bind("127.0.0.1:0").unwrap();
        let dns = socket.local_addr().unwrap();
        drop(socket);

        let options = Options {
            timeout: 2,
            response_header_timeout: 1,
            resolvers: vec![dns.to_string()],
            ..Default::default()
        };
        let fetcher = Fetcher::new(&options).unwrap();

        // "localhost" would resolve through the system; here it must not
        let url = Url::parse(&format!("http://localhost:{}/", port)).unwrap();
        let err = fetcher.fetch(&url).await.unwrap_err();
        assert!(
            matches!(
                err,
                CrawlError::Transport { .. } | CrawlError::HeaderTimeout { .. }
            ),
            "unexpected error: {}",
            err
        );
    }
}
