//! In-process fakes for the engine's trait seams.

use crate::traits::{HttpTransport, IdentityProvider};
use async_trait::async_trait;
use factify_core::session::SessionContext;
use factify_providers::request::{HttpRequest, Method};
use factify_providers::runtime::HttpResponse;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

struct Route {
    method: Method,
    path: String,
    responses: VecDeque<(u16, String)>,
    delay: Duration,
}

/// Replays canned responses and records every request it sees.
///
/// Routed responses match on method and URL suffix; the last response of a
/// route repeats forever. Unrouted requests consume the global queue in order.
#[derive(Default)]
pub struct ScriptedHttp {
    global: Mutex<VecDeque<(u16, String)>>,
    routes: Mutex<Vec<Route>>,
    seen: Mutex<Vec<HttpRequest>>,
    fail_with: Option<String>,
}

impl ScriptedHttp {
    pub fn new(responses: Vec<(u16, &str)>) -> Arc<Self> {
        Arc::new(Self {
            global: Mutex::new(
                responses
                    .into_iter()
                    .map(|(s, b)| (s, b.to_string()))
                    .collect(),
            ),
            ..Default::default()
        })
    }

    pub fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            fail_with: Some(message.to_string()),
            ..Default::default()
        })
    }

    pub fn routed() -> Self {
        Self::default()
    }

    pub fn route(self, method: Method, path: &str, responses: Vec<(u16, &str)>) -> Self {
        self.route_delayed(method, path, responses, Duration::ZERO)
    }

    /// Like `route`, but each response is delivered after `delay`.
    pub fn route_delayed(
        self,
        method: Method,
        path: &str,
        responses: Vec<(u16, &str)>,
        delay: Duration,
    ) -> Self {
        self.routes.lock().unwrap().push(Route {
            method,
            path: path.to_string(),
            responses: responses
                .into_iter()
                .map(|(s, b)| (s, b.to_string()))
                .collect(),
            delay,
        });
        self
    }

    pub fn build(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn calls(&self) -> usize {
        self.seen.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.seen.lock().unwrap().clone()
    }

    pub fn calls_to(&self, method: Method, path: &str) -> usize {
        self.seen
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.method == method && r.url.ends_with(path))
            .count()
    }

    fn next_response(&self, req: &HttpRequest) -> (Option<(u16, String)>, Duration) {
        let mut routes = self.routes.lock().unwrap();
        if let Some(route) = routes
            .iter_mut()
            .find(|r| r.method == req.method && req.url.ends_with(&r.path))
        {
            let resp = if route.responses.len() > 1 {
                route.responses.pop_front()
            } else {
                route.responses.front().cloned()
            };
            return (resp, route.delay);
        }
        drop(routes);
        (self.global.lock().unwrap().pop_front(), Duration::ZERO)
    }
}

#[async_trait]
impl HttpTransport for ScriptedHttp {
    async fn execute(&self, req: &HttpRequest) -> anyhow::Result<HttpResponse> {
        self.seen.lock().unwrap().push(req.clone());
        if let Some(msg) = &self.fail_with {
            return Err(anyhow::anyhow!("{msg}"));
        }

        let (resp, delay) = self.next_response(req);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        let (status, body) =
            resp.ok_or_else(|| anyhow::anyhow!("no scripted response for {}", req.url))?;
        Ok(HttpResponse {
            status,
            body: body.into_bytes(),
        })
    }
}

/// Identity with a fixed session and an optional token to refresh into.
pub struct FakeIdentity {
    session: SessionContext,
    token: Mutex<Option<String>>,
    refreshed_token: Option<String>,
    refreshes: AtomicUsize,
}

impl FakeIdentity {
    pub fn anonymous() -> Arc<Self> {
        Arc::new(Self {
            session: SessionContext::anonymous(),
            token: Mutex::new(None),
            refreshed_token: None,
            refreshes: AtomicUsize::new(0),
        })
    }

    pub fn signed_in(token: &str) -> Arc<Self> {
        Arc::new(Self::signed_in_inner(token, None))
    }

    /// Session that claims to be signed in but has no usable token.
    pub fn signed_in_without_token() -> Arc<Self> {
        Arc::new(Self {
            session: SessionContext::signed_in("user-1", Some("alice".into())),
            token: Mutex::new(None),
            refreshed_token: None,
            refreshes: AtomicUsize::new(0),
        })
    }

    fn signed_in_inner(token: &str, refreshed: Option<String>) -> Self {
        Self {
            session: SessionContext::signed_in("user-1", Some("alice".into())),
            token: Mutex::new(Some(token.to_string())),
            refreshed_token: refreshed,
            refreshes: AtomicUsize::new(0),
        }
    }

    pub fn refreshing_to(self: Arc<Self>, new_token: &str) -> Arc<Self> {
        let token = self.token.lock().unwrap().clone().unwrap_or_default();
        Arc::new(Self::signed_in_inner(&token, Some(new_token.to_string())))
    }

    pub fn refreshes(&self) -> usize {
        self.refreshes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IdentityProvider for FakeIdentity {
    fn session(&self) -> SessionContext {
        self.session.clone()
    }

    fn token(&self) -> Option<String> {
        self.token.lock().unwrap().clone()
    }

    async fn refresh(&self, _min_validity: Duration) -> anyhow::Result<bool> {
        self.refreshes.fetch_add(1, Ordering::SeqCst);
        match &self.refreshed_token {
            Some(t) => {
                *self.token.lock().unwrap() = Some(t.clone());
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
