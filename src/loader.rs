//! Defines the [`Loader`] type, the loading barrier every view drives its
//! network fetches through. A view registers any number of keyed fetches
//! against one loader, awaits them in whatever order it likes, and then
//! reads a single consolidated readiness/failure signal instead of
//! tracking each request by hand.
//!
//! The barrier releases (`is_ready`) only once every registered fetch has
//! resolved, and trips a sticky failure flag (`has_failed`) on the first
//! fetch that comes back with a non-success status or a transport error.
//! A failed fetch still counts toward completion, so one bad document
//! never stalls readiness for its siblings, and siblings are never
//! cancelled on its behalf.
//!
//! Keys must be unique for the loader's lifetime; the loader does not
//! check this. One loader serves one view and is discarded with it.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde_json::Value as Json;
use url::Url;

/// A payload fetched through a [`Loader`]: a parsed JSON document or a raw
/// text body.
#[derive(Clone, Debug, PartialEq)]
pub enum Payload {
    Json(Json),
    Text(String),
}

/// The mutable barrier state. The counter pair and the store live behind
/// one lock so that a completion and the readiness it implies can never be
/// observed half-applied, no matter how fetches interleave.
#[derive(Default)]
struct State {
    store: HashMap<String, Payload>,
    expected: usize,
    completed: usize,
    failed: bool,
}

/// Runs independent keyed fetches against a content service and exposes
/// one consolidated readiness/failure signal. See the module docs for the
/// contract.
pub struct Loader {
    client: Client,
    content_root: Url,
    state: Mutex<State>,
}

impl Loader {
    /// Constructs a loader that resolves relative document paths against
    /// `content_root`. Counters start at zero and are never reset; a new
    /// view gets a new loader.
    pub fn new(client: Client, content_root: Url) -> Loader {
        Loader {
            client,
            content_root,
            state: Mutex::new(State::default()),
        }
    }

    /// The URL the loader resolves relative document paths against.
    pub fn content_root(&self) -> &Url {
        &self.content_root
    }

    /// Registers and runs a fetch for `path`, parsing the response body as
    /// JSON and storing it under `key`.
    ///
    /// The expected-count increment happens in this function body, before
    /// the returned future is first polled: a view registering several
    /// fetches back-to-back is counted in full before the first of them
    /// can resolve, so a fast sibling can never observe
    /// `completed >= expected` and report readiness early.
    pub fn load_json<'a>(&'a self, key: &str, path: &str) -> impl Future<Output = ()> + 'a {
        self.register();
        let key = key.to_owned();
        let path = path.to_owned();
        async move {
            let result = match self.fetch(&key, &path).await {
                Ok(resp) => match resp.json::<Json>().await {
                    Ok(json) => Ok(Payload::Json(json)),
                    Err(err) => Err(Error::Http(err)),
                },
                Err(err) => Err(err),
            };
            self.complete(&key, result);
        }
    }

    /// Identical contract to [`Loader::load_json`], but stores the raw
    /// textual body.
    pub fn load_text<'a>(&'a self, key: &str, path: &str) -> impl Future<Output = ()> + 'a {
        self.register();
        let key = key.to_owned();
        let path = path.to_owned();
        async move {
            let result = match self.fetch(&key, &path).await {
                Ok(resp) => match resp.text().await {
                    Ok(text) => Ok(Payload::Text(text)),
                    Err(err) => Err(Error::Http(err)),
                },
                Err(err) => Err(err),
            };
            self.complete(&key, result);
        }
    }

    /// True once every registered fetch has resolved. False until the
    /// first fetch is registered.
    pub fn is_ready(&self) -> bool {
        let state = self.lock();
        state.completed >= state.expected && state.expected > 0
    }

    /// True once any fetch has failed; never cleared for the loader's
    /// lifetime. Consumers check this before trusting
    /// [`Loader::is_ready`].
    pub fn has_failed(&self) -> bool {
        self.lock().failed
    }

    /// Returns the payload stored under `key`, or [`None`] if that fetch
    /// hasn't resolved (or failed). Absence before readiness is a normal
    /// state, not an error.
    pub fn get(&self, key: &str) -> Option<Payload> {
        self.lock().store.get(key).cloned()
    }

    /// Like [`Loader::get`], narrowed to JSON payloads.
    pub fn json(&self, key: &str) -> Option<Json> {
        match self.get(key) {
            Some(Payload::Json(json)) => Some(json),
            _ => None,
        }
    }

    /// Like [`Loader::get`], narrowed to text payloads.
    pub fn text(&self, key: &str) -> Option<String> {
        match self.get(key) {
            Some(Payload::Text(text)) => Some(text),
            _ => None,
        }
    }

    /// Counts a fetch into the expected total. Runs synchronously at
    /// registration time; see [`Loader::load_json`].
    fn register(&self) {
        self.lock().expected += 1;
    }

    /// Records the resolution of one registered fetch. Success writes the
    /// payload into the store; failure trips the sticky flag. Either way
    /// the completed count goes up exactly once, so a failed fetch never
    /// stalls the barrier.
    fn complete(&self, key: &str, result: Result<Payload, Error>) {
        let mut state = self.lock();
        match result {
            Ok(payload) => {
                state.store.insert(key.to_owned(), payload);
            }
            Err(err) => {
                tracing::warn!("loading `{}`: {}", key, err);
                state.failed = true;
            }
        }
        state.completed += 1;
    }

    async fn fetch(&self, key: &str, path: &str) -> Result<reqwest::Response, Error> {
        let url = self.content_root.join(path)?;
        tracing::debug!("requesting `{}` from {}", key, url);
        let resp = self.client.get(url).send().await?;
        if !resp.status().is_success() {
            return Err(Error::Status(resp.status()));
        }
        Ok(resp)
    }

    fn lock(&self) -> MutexGuard<State> {
        // The lock is only poisoned if a completion panicked mid-update,
        // and there is no loader state worth salvaging after that.
        self.state.lock().unwrap()
    }
}

/// Builds the HTTP client shared by every loader in a run. Cloning a
/// [`Client`] shares its connection pool.
pub fn http_client() -> Client {
    Client::builder()
        .connect_timeout(Duration::from_secs(5))
        .timeout(Duration::from_secs(30))
        .build()
        .unwrap_or_else(|_| Client::new())
}

/// Represents a failed fetch. Never surfaced past the loader's own
/// operations; failures are folded into the sticky flag and logged, and
/// consumers observe them via [`Loader::has_failed`].
#[derive(Debug)]
enum Error {
    /// Returned when the response carried a non-success status.
    Status(StatusCode),

    /// Returned for transport-level errors, including body-read and
    /// body-parse problems.
    Http(reqwest::Error),

    /// Returned when a document path can't be resolved against the
    /// content root.
    UrlParse(url::ParseError),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Status(status) => write!(f, "unexpected status {}", status),
            Error::Http(err) => err.fmt(f),
            Error::UrlParse(err) => err.fmt(f),
        }
    }
}

impl From<reqwest::Error> for Error {
    /// Converts a [`reqwest::Error`] into an [`Error`]. This allows us to
    /// use the `?` operator in fetch operations.
    fn from(err: reqwest::Error) -> Error {
        Error::Http(err)
    }
}

impl From<url::ParseError> for Error {
    /// Converts a [`url::ParseError`] into an [`Error`]. This allows us to
    /// use the `?` operator when resolving document paths.
    fn from(err: url::ParseError) -> Error {
        Error::UrlParse(err)
    }
}
