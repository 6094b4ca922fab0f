use futures::future::BoxFuture;
use reqwest::Client;

/// Something that can fetch the content behind a URL.
///
/// The caching layer treats the returned body as opaque text. Timeouts are an
/// implementation's own business; failures are surfaced to the caller
/// verbatim, never retried.
pub trait Fetcher {
    /// Fetch the content at `url`.
    fn fetch<'a>(
        &'a self,
        url: &'a str,
    ) -> BoxFuture<'a, Result<String, FetchError>>;
}

impl<'f, F: Fetcher> Fetcher for &'f F {
    fn fetch<'a>(
        &'a self,
        url: &'a str,
    ) -> BoxFuture<'a, Result<String, FetchError>> {
        (**self).fetch(url)
    }
}

/// The reason a fetch failed.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The request couldn't be completed, or came back with an error status.
    #[error("the request failed")]
    Http(#[from] reqwest::Error),
    /// A failure reported by a non-HTTP [`Fetcher`].
    #[error("{0}")]
    Other(String),
}

/// A [`Fetcher`] which does a `GET` request over the internet.
#[derive(Debug, Clone)]
pub struct WebFetcher {
    client: Client,
}

impl WebFetcher {
    /// The User-Agent sent with every request.
    pub const USER_AGENT: &'static str =
        concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);

    /// Create a [`WebFetcher`] with an already initialized [`Client`].
    pub fn with_client(client: Client) -> Self { WebFetcher { client } }
}

impl Default for WebFetcher {
    fn default() -> Self {
        let client = Client::builder()
            .user_agent(WebFetcher::USER_AGENT)
            .build()
            .expect("Unable to initialize the client");

        WebFetcher::with_client(client)
    }
}

impl Fetcher for WebFetcher {
    fn fetch<'a>(
        &'a self,
        url: &'a str,
    ) -> BoxFuture<'a, Result<String, FetchError>> {
        Box::pin(async move {
            log::debug!("GET \"{}\"", url);

            let body = self
                .client
                .get(url)
                .send()
                .await?
                .error_for_status()?
                .text()
                .await?;

            Ok(body)
        })
    }
}
