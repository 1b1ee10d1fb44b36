//! Scripted in-memory remote for tests.
//!
//! [`MockClient`] serves listings from a sorted set of URIs with the same
//! cursor, limit and shallow semantics as the real service. Individual
//! requests can be held back with a [`Gate`] to script completion order, or
//! made to fail once.

use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap, VecDeque};
use std::future::Future;
use std::ops::Bound;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};

use crate::config::URI_SCHEME;
use crate::core::client::{Content, ContentClient, ListRequest, ListingClient};
use crate::core::error::ClientError;
use crate::models::DirectoryAddress;

// =============================================================================
// Gate
// =============================================================================

#[derive(Debug, Default)]
struct GateState {
    open: bool,
    waker: Option<Waker>,
}

/// Holds a request until [`Gate::open`] is called.
#[derive(Clone, Debug, Default)]
pub struct Gate(Rc<RefCell<GateState>>);

impl Gate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Let the held request complete.
    pub fn open(&self) {
        let waker = {
            let mut state = self.0.borrow_mut();
            state.open = true;
            state.waker.take()
        };
        if let Some(waker) = waker {
            waker.wake();
        }
    }

    async fn wait(&self) {
        std::future::poll_fn(|cx| {
            let mut state = self.0.borrow_mut();
            if state.open {
                Poll::Ready(())
            } else {
                state.waker = Some(cx.waker().clone());
                Poll::Pending
            }
        })
        .await
    }
}

/// Poll a future once with a no-op waker.
///
/// Lets tests interleave several explorer operations deterministically.
pub fn poll_once<F: Future>(future: Pin<&mut F>) -> Poll<F::Output> {
    let mut cx = Context::from_waker(Waker::noop());
    future.poll(&mut cx)
}

// =============================================================================
// MockClient
// =============================================================================

/// In-memory listing and content service.
#[derive(Debug, Default)]
pub struct MockClient {
    uris: RefCell<BTreeSet<String>>,
    content: RefCell<HashMap<String, Content>>,
    gates: RefCell<HashMap<String, VecDeque<Gate>>>,
    failures: RefCell<HashMap<String, VecDeque<ClientError>>>,
    calls: RefCell<Vec<ListRequest>>,
}

impl MockClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Client pre-populated with `paths` (with or without the scheme).
    pub fn with_paths<'a>(paths: impl IntoIterator<Item = &'a str>) -> Self {
        let client = Self::new();
        for path in paths {
            client.insert(path);
        }
        client
    }

    /// Add a file (or, with a trailing `/`, an empty directory marker).
    pub fn insert(&self, path: &str) {
        self.uris.borrow_mut().insert(to_uri(path));
    }

    pub fn remove(&self, path: &str) {
        self.uris.borrow_mut().remove(&to_uri(path));
    }

    /// Serve `bytes` for `path` from [`ContentClient::fetch`].
    pub fn put_content(&self, path: &str, bytes: impl Into<Vec<u8>>, content_type: Option<&str>) {
        self.content.borrow_mut().insert(
            to_uri(path),
            Content {
                bytes: bytes.into(),
                content_type: content_type.map(str::to_string),
            },
        );
    }

    /// Hold the next listing of `dir` until the returned gate opens.
    pub fn hold(&self, dir: &str) -> Gate {
        let gate = Gate::new();
        self.gates
            .borrow_mut()
            .entry(dir_uri(dir))
            .or_default()
            .push_back(gate.clone());
        gate
    }

    /// Fail the next listing of `dir` with `error`.
    pub fn fail_next(&self, dir: &str, error: ClientError) {
        self.failures
            .borrow_mut()
            .entry(dir_uri(dir))
            .or_default()
            .push_back(error);
    }

    /// Fail the next content fetch of `path` with `error`.
    pub fn fail_content(&self, path: &str, error: ClientError) {
        self.failures
            .borrow_mut()
            .entry(to_uri(path))
            .or_default()
            .push_back(error);
    }

    /// Every listing request received so far.
    pub fn calls(&self) -> Vec<ListRequest> {
        self.calls.borrow().clone()
    }

    /// Listing requests received for `dir`.
    pub fn calls_for(&self, dir: &str) -> Vec<ListRequest> {
        let uri = dir_uri(dir);
        self.calls
            .borrow()
            .iter()
            .filter(|call| call.directory_uri == uri)
            .cloned()
            .collect()
    }

    fn take_failure(&self, key: &str) -> Option<ClientError> {
        self.failures.borrow_mut().get_mut(key)?.pop_front()
    }

    fn page(&self, request: &ListRequest) -> Vec<String> {
        let prefix = request.directory_uri.as_str();
        let uris = self.uris.borrow();
        let listed = uris
            .range::<str, _>((Bound::Included(prefix), Bound::Unbounded))
            .take_while(|uri| uri.starts_with(prefix))
            .filter(|uri| uri.as_str() != prefix);

        let visible: BTreeSet<String> = if request.shallow {
            listed.map(|uri| collapse(prefix, uri)).collect()
        } else {
            listed.cloned().collect()
        };

        let start = if request.cursor.is_empty() {
            Bound::Unbounded
        } else {
            Bound::Excluded(request.cursor.as_str())
        };
        visible
            .range::<str, _>((start, Bound::Unbounded))
            .take(request.limit as usize)
            .cloned()
            .collect()
    }
}

impl ListingClient for MockClient {
    async fn list(&self, request: ListRequest) -> Result<Vec<String>, ClientError> {
        self.calls.borrow_mut().push(request.clone());

        let gate = self
            .gates
            .borrow_mut()
            .get_mut(&request.directory_uri)
            .and_then(VecDeque::pop_front);
        if let Some(gate) = gate {
            gate.wait().await;
        }

        if let Some(error) = self.take_failure(&request.directory_uri) {
            return Err(error);
        }
        Ok(self.page(&request))
    }
}

impl ContentClient for MockClient {
    async fn fetch(&self, uri: &str) -> Result<Content, ClientError> {
        if let Some(error) = self.take_failure(uri) {
            return Err(error);
        }
        self.content
            .borrow()
            .get(uri)
            .cloned()
            .ok_or(ClientError::Status(404))
    }
}

fn to_uri(path: &str) -> String {
    if path.starts_with(URI_SCHEME) {
        path.to_string()
    } else {
        format!("{}{}", URI_SCHEME, path)
    }
}

fn dir_uri(dir: &str) -> String {
    DirectoryAddress::parse(dir).uri()
}

/// Cut `uri` after its first segment below `prefix`.
fn collapse(prefix: &str, uri: &str) -> String {
    let rest = &uri[prefix.len()..];
    match rest.find('/') {
        Some(i) => format!("{}{}", prefix, &rest[..=i]),
        None => uri.to_string(),
    }
}
