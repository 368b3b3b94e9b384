//! Blocking HTTP client for the quote endpoint.

use super::{Quote, QuoteError, QuoteResult};
use log::{debug, info, warn};
use reqwest::blocking::Client;
use reqwest::Url;
use serde::Deserialize;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

/// Public quote API root; the random-quote endpoint lives below it.
pub const DEFAULT_QUOTE_BASE_URL: &str = "https://zenquotes.io/api";
/// Client-side timeout applied to every request.
pub const DEFAULT_QUOTE_TIMEOUT: Duration = Duration::from_secs(10);

const RANDOM_QUOTE_PATH: &str = "random";

/// The endpoint answers with either one quote object or a list of them.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum QuotePayload {
    Single(Quote),
    Batch(Vec<Quote>),
}

/// Client for the random-quote endpoint.
#[derive(Debug, Clone)]
pub struct QuoteClient {
    base_url: String,
    client: Client,
}

impl QuoteClient {
    /// Creates a client with a request timeout.
    ///
    /// # Arguments
    ///
    /// * `base_url` - API root, e.g. `https://zenquotes.io/api`
    /// * `timeout` - applied to connect plus full response
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> QuoteResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| QuoteError::InvalidData(format!("http client setup failed: {err}")))?;

        Ok(Self {
            base_url: base_url.into(),
            client,
        })
    }

    /// Resolves `<base_url>/random`.
    ///
    /// # Errors
    /// - `BaseUrl` when the base cannot be parsed.
    /// - `BuiltUrl` when the endpoint cannot be joined onto the base or is
    ///   not HTTP(S).
    pub fn endpoint_url(&self) -> QuoteResult<Url> {
        let mut base = Url::parse(self.base_url.trim())
            .map_err(|err| QuoteError::BaseUrl(format!("`{}`: {err}", self.base_url)))?;

        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let built = base
            .join(RANDOM_QUOTE_PATH)
            .map_err(|err| QuoteError::BuiltUrl(format!("`{}`: {err}", self.base_url)))?;

        match built.scheme() {
            "http" | "https" => Ok(built),
            other => Err(QuoteError::BuiltUrl(format!(
                "unsupported scheme `{other}` in `{built}`"
            ))),
        }
    }

    /// Fetches one quote.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - the URL cannot be built
    /// - the request fails or times out
    /// - the server answers with a non-success status
    /// - the body is empty or not a quote
    pub fn fetch_quote(&self) -> QuoteResult<Quote> {
        let started_at = Instant::now();
        let url = self.endpoint_url()?;
        debug!("event=quote_fetch module=quote status=start host={}", url.host_str().unwrap_or(""));

        let result = self.fetch_from(url);
        match &result {
            Ok(_) => info!(
                "event=quote_fetch module=quote status=ok duration_ms={}",
                started_at.elapsed().as_millis()
            ),
            Err(err) => warn!(
                "event=quote_fetch module=quote status=error duration_ms={} error_code={} error={}",
                started_at.elapsed().as_millis(),
                err.code(),
                err
            ),
        }
        result
    }

    /// Runs [`QuoteClient::fetch_quote`] on a background thread.
    ///
    /// `on_done` is called exactly once, on that thread. Marshalling the
    /// result onto a UI thread is the caller's job.
    pub fn spawn_fetch<F>(&self, on_done: F) -> std::io::Result<JoinHandle<()>>
    where
        F: FnOnce(QuoteResult<Quote>) + Send + 'static,
    {
        let client = self.clone();
        std::thread::Builder::new()
            .name("quote-fetch".to_string())
            .spawn(move || on_done(client.fetch_quote()))
    }

    fn fetch_from(&self, url: Url) -> QuoteResult<Quote> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|err| QuoteError::InvalidData(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(QuoteError::StatusCode(status.as_u16()));
        }

        let body = response
            .bytes()
            .map_err(|err| QuoteError::InvalidData(err.to_string()))?;
        decode_quote_payload(&body)
    }
}

/// Decodes a quote from a JSON object or a JSON array of objects.
///
/// The first element of an array wins.
///
/// # Errors
/// - `NoData` for a blank body or an empty array.
/// - `UnableToDecode` for anything that is not a quote.
pub fn decode_quote_payload(body: &[u8]) -> QuoteResult<Quote> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(QuoteError::NoData);
    }

    let payload: QuotePayload = serde_json::from_slice(body)
        .map_err(|err| QuoteError::UnableToDecode(err.to_string()))?;

    match payload {
        QuotePayload::Single(quote) => Ok(quote),
        QuotePayload::Batch(quotes) => quotes.into_iter().next().ok_or(QuoteError::NoData),
    }
}

#[cfg(test)]
mod tests {
    use super::{decode_quote_payload, QuoteClient, DEFAULT_QUOTE_TIMEOUT};
    use crate::quote::{Quote, QuoteError};

    #[test]
    fn decodes_object_and_array_shapes() {
        let single = decode_quote_payload(br#"{"q":"Be here now.","a":"Ram Dass"}"#).unwrap();
        assert_eq!(single, Quote::new("Be here now.", "Ram Dass"));

        let batch = decode_quote_payload(
            br#"[{"q":"First.","a":"One","h":"<b>First.</b>"},{"q":"Second.","a":"Two"}]"#,
        )
        .unwrap();
        assert_eq!(batch, Quote::new("First.", "One"));
    }

    #[test]
    fn blank_body_and_empty_array_are_no_data() {
        assert_eq!(decode_quote_payload(b""), Err(QuoteError::NoData));
        assert_eq!(decode_quote_payload(b"  \n"), Err(QuoteError::NoData));
        assert_eq!(decode_quote_payload(b"[]"), Err(QuoteError::NoData));
    }

    #[test]
    fn wrong_shape_is_unable_to_decode() {
        let err = decode_quote_payload(br#"{"quote":"x","author":"y"}"#).unwrap_err();
        assert!(matches!(err, QuoteError::UnableToDecode(_)));
        let err = decode_quote_payload(b"<html>oops</html>").unwrap_err();
        assert_eq!(err.code(), "unable_to_decode");
    }

    #[test]
    fn endpoint_url_appends_random_path() {
        let client = QuoteClient::new("https://zenquotes.io/api", DEFAULT_QUOTE_TIMEOUT).unwrap();
        assert_eq!(
            client.endpoint_url().unwrap().as_str(),
            "https://zenquotes.io/api/random"
        );

        let client = QuoteClient::new("https://zenquotes.io/api/", DEFAULT_QUOTE_TIMEOUT).unwrap();
        assert_eq!(
            client.endpoint_url().unwrap().as_str(),
            "https://zenquotes.io/api/random"
        );
    }

    #[test]
    fn endpoint_url_reports_base_and_built_failures() {
        let client = QuoteClient::new("not a url", DEFAULT_QUOTE_TIMEOUT).unwrap();
        assert!(matches!(client.endpoint_url(), Err(QuoteError::BaseUrl(_))));

        let client = QuoteClient::new("ftp://quotes.example.com/api", DEFAULT_QUOTE_TIMEOUT).unwrap();
        assert!(matches!(client.endpoint_url(), Err(QuoteError::BuiltUrl(_))));
    }

    #[test]
    fn display_text_puts_author_on_its_own_line() {
        let quote = Quote::new("Keep going.", "Anon");
        assert_eq!(quote.display_text(), "Keep going.\n\n- Anon");
    }
}
