//! Client session: the single owner of the socket and of all client-side
//! state. Every mutable field sits behind one lock; replies are applied by the
//! listener task and request operations only arm signals and wait.

use crate::config::{ClientConfig, RetryPolicy};
use crate::error::ClientError;
use crate::listener::spawn_listener;
use crate::observer::SessionObserver;
use crate::pending::{PendingRequest, PendingRequests, RequestKind, WaitOutcome};
use log::{debug, error, info, warn};
use shared::{Day, Request, WeatherRecord};
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::Instant;

#[derive(Debug)]
pub(crate) struct SessionState {
    pub server_addr: SocketAddr,
    pub known_cities: Vec<String>,
    pub selected_city: Option<WeatherRecord>,
    pub selected_day: Day,
    /// Name given to the next city-data reply, which carries none itself
    pub requested_city: Option<String>,
    pub pending: PendingRequests,
}

pub(crate) struct Shared {
    pub state: RwLock<SessionState>,
    pub observer: Arc<dyn SessionObserver>,
}

impl Shared {
    pub fn new(server_addr: SocketAddr, observer: Arc<dyn SessionObserver>) -> Self {
        Self {
            state: RwLock::new(SessionState {
                server_addr,
                known_cities: Vec::new(),
                selected_city: None,
                selected_day: Day::Today,
                requested_city: None,
                pending: PendingRequests::new(),
            }),
            observer,
        }
    }
}

/// Client side of the weather protocol.
///
/// Replies are accepted only from the exact address the session points at, so
/// a late answer from a previous server cannot overwrite the current view. A
/// server bound to a wildcard address on a multi-homed host must therefore
/// answer from the address the client was given; otherwise its replies are
/// ignored and requests time out.
pub struct ClientSession {
    socket: Arc<UdpSocket>,
    shared: Arc<Shared>,
    retry: RetryPolicy,
    listener: JoinHandle<()>,
}

impl ClientSession {
    /// Binds an ephemeral local socket and starts the listener task.
    pub async fn connect(
        config: &ClientConfig,
        observer: Arc<dyn SessionObserver>,
    ) -> Result<Self, ClientError> {
        let local: SocketAddr = if config.server_addr.is_ipv4() {
            (Ipv4Addr::UNSPECIFIED, 0).into()
        } else {
            (Ipv6Addr::UNSPECIFIED, 0).into()
        };
        let socket = Arc::new(UdpSocket::bind(local).await?);
        info!(
            "Client bound to {}, server at {}",
            socket.local_addr()?,
            config.server_addr
        );

        let shared = Arc::new(Shared::new(config.server_addr, observer));
        let listener = spawn_listener(
            Arc::clone(&socket),
            Arc::clone(&shared),
            config.buffer_size,
        );

        Ok(ClientSession {
            socket,
            shared,
            retry: config.retry,
            listener,
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    pub async fn server_addr(&self) -> SocketAddr {
        self.shared.state.read().await.server_addr
    }

    pub async fn known_cities(&self) -> Vec<String> {
        self.shared.state.read().await.known_cities.clone()
    }

    pub async fn selected_city(&self) -> Option<WeatherRecord> {
        self.shared.state.read().await.selected_city.clone()
    }

    pub async fn selected_day(&self) -> Day {
        self.shared.state.read().await.selected_day
    }

    /// Asks for the city list and waits for it, resending on every timeout.
    /// Blocks for at most `timeout * (max_retries + 1)`.
    ///
    /// If another list request is issued while this one waits, this one
    /// succeeds as soon as a newer list is applied. It fails with
    /// `Superseded` only if no newer list arrives within its own budget.
    pub async fn request_city_list(
        &self,
        timeout: Duration,
        max_retries: u32,
    ) -> Result<(), ClientError> {
        let payload = Request::ListCities.encode()?;
        let pending = self.arm(RequestKind::CityList, None).await;
        self.await_reply(pending, &payload, RetryPolicy::new(timeout, max_retries))
            .await
    }

    /// Asks the server to reload its data, then always re-requests the list.
    /// Only a failure of the list phase fails the operation, with `Timeout` or
    /// `Superseded` as for [`request_city_list`](Self::request_city_list).
    pub async fn refresh_then_relist(
        &self,
        timeout: Duration,
        max_retries: u32,
    ) -> Result<(), ClientError> {
        let payload = Request::Refresh.encode()?;
        let pending = self.arm(RequestKind::Refresh, None).await;

        match self
            .await_reply(pending, &payload, RetryPolicy::new(timeout, max_retries))
            .await
        {
            Ok(()) => info!("Server confirmed data refresh"),
            Err(e) => warn!("Data refresh not confirmed, requesting list anyway: {}", e),
        }

        self.request_city_list(timeout, max_retries).await
    }

    /// Fire-and-forget city request. The reply, if any, replaces the selected
    /// city when the listener sees it.
    pub async fn request_city(&self, name: &str) -> Result<(), ClientError> {
        let payload = Request::City(name.to_string()).encode()?;

        self.shared.state.write().await.requested_city = Some(name.to_string());
        self.send(&payload).await;
        Ok(())
    }

    /// City request with a completion signal and the usual retry policy.
    pub async fn fetch_city(
        &self,
        name: &str,
        timeout: Duration,
        max_retries: u32,
    ) -> Result<(), ClientError> {
        let payload = Request::City(name.to_string()).encode()?;
        let pending = self
            .arm(RequestKind::CityData, Some(name.to_string()))
            .await;
        self.await_reply(pending, &payload, RetryPolicy::new(timeout, max_retries))
            .await
    }

    /// Switches the displayed day and reports its forecast, if a city is
    /// selected.
    pub async fn select_day(&self, day: Day) -> Option<String> {
        let text = {
            let mut state = self.shared.state.write().await;
            state.selected_day = day;
            state
                .selected_city
                .as_ref()
                .map(|record| record.for_day(day).to_string())
        };

        if let Some(text) = &text {
            self.shared.observer.on_status_message(text);
        }
        text
    }

    /// Points the session at another server, dropping everything learned
    /// from the old one, and resynchronizes with the session retry policy.
    pub async fn reconnect(&self, server_addr: SocketAddr) -> Result<(), ClientError> {
        let observer = &self.shared.observer;
        observer.on_status_message(&format!(
            "Initiating new connection to {}. Please wait (up to {:?}).",
            server_addr,
            self.retry.max_wait() * 2
        ));
        observer.on_connection_usable(false);

        {
            let mut state = self.shared.state.write().await;
            state.server_addr = server_addr;
            state.known_cities = Vec::new();
            state.selected_city = None;
            state.requested_city = None;
        }
        observer.on_cities_updated(&[]);

        let result = self
            .refresh_then_relist(self.retry.timeout, self.retry.max_retries)
            .await;
        if result.is_err() {
            observer.on_status_message("Could not connect to given server.");
        }
        result
    }

    async fn arm(&self, kind: RequestKind, requested_city: Option<String>) -> PendingRequest {
        let mut state = self.shared.state.write().await;
        if requested_city.is_some() {
            state.requested_city = requested_city;
        }
        state.pending.arm(kind)
    }

    /// Sends `payload` and waits on `pending`, resending after each silent
    /// timeout until the attempts run out.
    async fn await_reply(
        &self,
        mut pending: PendingRequest,
        payload: &[u8],
        policy: RetryPolicy,
    ) -> Result<(), ClientError> {
        let kind = pending.kind();
        let attempts = policy.attempts();
        let deadline = Instant::now() + policy.max_wait();

        for attempt in 1..=attempts {
            debug!("Sending {} request (attempt {}/{})", kind, attempt, attempts);
            self.send(payload).await;

            match pending.wait(policy.timeout).await {
                WaitOutcome::Satisfied => return Ok(()),
                WaitOutcome::Abandoned => {
                    debug!("{} request superseded, waiting on the newer one", kind);
                    let remaining = deadline.saturating_duration_since(Instant::now());
                    return match pending.wait_for_successor(remaining).await {
                        WaitOutcome::Satisfied => Ok(()),
                        _ => Err(ClientError::Superseded { kind }),
                    };
                }
                WaitOutcome::TimedOut => warn!(
                    "No {} reply within {:?} (attempt {}/{})",
                    kind, policy.timeout, attempt, attempts
                ),
            }
        }

        self.shared
            .state
            .write()
            .await
            .pending
            .disarm(kind, pending.id());
        Err(ClientError::Timeout { kind, attempts })
    }

    /// Send errors are logged only; the retry loop covers lost datagrams.
    async fn send(&self, payload: &[u8]) {
        let server_addr = self.server_addr().await;
        if let Err(e) = self.socket.send_to(payload, server_addr).await {
            error!("Failed to send to {}: {}", server_addr, e);
        }
    }
}

impl Drop for ClientSession {
    fn drop(&mut self) {
        self.listener.abort();
    }
}
