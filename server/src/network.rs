//! Server network layer: receives request datagrams and dispatches each one
//! to its own worker task

use crate::config::ServerConfig;
use crate::store::{DataStore, RecordSource};
use log::{debug, error, info, warn};
use shared::{Reply, Request};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::sync::Semaphore;

/// Builds the reply for one decoded request, or `None` when nothing should be
/// sent back (unknown city, failed reload).
pub async fn respond(
    store: &DataStore,
    source: &Arc<dyn RecordSource>,
    request: &Request,
) -> Option<Reply> {
    match request {
        Request::ListCities => Some(Reply::Cities(store.all_names().await)),
        Request::Refresh => match store.reload(Arc::clone(source)).await {
            Ok(_) => Some(Reply::Refreshed),
            Err(e) => {
                error!("Failed to reload weather data: {}", e);
                None
            }
        },
        Request::City(name) => match store.find_by_name(name).await {
            Some(record) => Some(Reply::CityData(record.forecast().clone())),
            None => {
                debug!("No data for city {:?}, dropping request", name);
                None
            }
        },
    }
}

/// Datagram server answering list, refresh and city requests
pub struct Server {
    socket: Arc<UdpSocket>,
    store: Arc<DataStore>,
    source: Arc<dyn RecordSource>,
    buffer_size: usize,
    workers: Option<Arc<Semaphore>>,
    request_count: AtomicU64,
}

impl Server {
    pub async fn bind(
        config: &ServerConfig,
        store: Arc<DataStore>,
        source: Arc<dyn RecordSource>,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let socket = Arc::new(UdpSocket::bind(config.bind_addr).await?);
        info!("Server listening on {}", socket.local_addr()?);

        let workers = (config.max_workers > 0)
            .then(|| Arc::new(Semaphore::new(config.max_workers)));

        Ok(Server {
            socket,
            store,
            source,
            buffer_size: config.buffer_size,
            workers,
            request_count: AtomicU64::new(0),
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    pub fn request_count(&self) -> u64 {
        self.request_count.load(Ordering::Relaxed)
    }

    /// Receive loop. Never returns under normal operation; transport errors
    /// are logged and the loop keeps going.
    pub async fn run(&self) {
        let mut buffer = vec![0u8; self.buffer_size];

        loop {
            match self.socket.recv_from(&mut buffer).await {
                Ok((len, addr)) => {
                    let request_id = self.request_count.fetch_add(1, Ordering::Relaxed) + 1;
                    info!(
                        "Received request ({}): {:?} from {}",
                        request_id,
                        shared::trim_padding(&buffer[..len]),
                        addr
                    );

                    match Request::decode(&buffer[..len]) {
                        Ok(request) => self.dispatch(request_id, request, addr).await,
                        Err(e) => warn!("Dropping request {} from {}: {}", request_id, addr, e),
                    }
                }
                Err(e) => {
                    error!("Error receiving packet: {}", e);
                    tokio::time::sleep(Duration::from_millis(10)).await;
                }
            }
        }
    }

    /// Spawns a worker for the request. With a worker limit configured this
    /// waits for a free slot first, which holds back the receive loop.
    async fn dispatch(&self, request_id: u64, request: Request, addr: SocketAddr) {
        let permit = match &self.workers {
            Some(workers) => match Arc::clone(workers).acquire_owned().await {
                Ok(permit) => Some(permit),
                Err(e) => {
                    error!("Worker pool closed: {}", e);
                    return;
                }
            },
            None => None,
        };

        let socket = Arc::clone(&self.socket);
        let store = Arc::clone(&self.store);
        let source = Arc::clone(&self.source);

        tokio::spawn(async move {
            let _permit = permit;

            let Some(reply) = respond(&store, &source, &request).await else {
                return;
            };

            match socket.send_to(&reply.encode(), addr).await {
                Ok(_) => debug!("Request {} has been completed", request_id),
                Err(e) => error!("Failed to send reply to {}: {}", addr, e),
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::{Forecast, WeatherRecord};

    fn boston_store() -> DataStore {
        DataStore::with_records(vec![WeatherRecord::new("Boston", "Sunny", "Rain", "Cloudy")])
    }

    fn lines(raw: &[&str]) -> Arc<dyn RecordSource> {
        Arc::new(raw.iter().map(|line| line.to_string()).collect::<Vec<_>>())
    }

    fn no_source() -> Arc<dyn RecordSource> {
        lines(&[])
    }

    #[tokio::test]
    async fn test_city_request_known_city() {
        let store = boston_store();
        let request = Request::decode(b"RELOAD-CITYBoston").unwrap();

        let reply = respond(&store, &no_source(), &request).await.unwrap();
        assert_eq!(reply, Reply::CityData(Forecast::new("Sunny", "Rain", "Cloudy")));
        assert_eq!(reply.encode(), b"Sunny;Rain;Cloudy".to_vec());
    }

    #[tokio::test]
    async fn test_city_request_unknown_city_has_no_reply() {
        let store = boston_store();
        let request = Request::City("Paris".to_string());
        assert!(respond(&store, &no_source(), &request).await.is_none());
    }

    #[tokio::test]
    async fn test_list_request() {
        let store = DataStore::with_records(vec![
            WeatherRecord::new("Boston", "a", "b", "c"),
            WeatherRecord::new("Paris", "d", "e", "f"),
        ]);

        let reply = respond(&store, &no_source(), &Request::ListCities).await.unwrap();
        assert_eq!(reply.encode(), b"CITIES:Boston,Paris".to_vec());
    }

    #[tokio::test]
    async fn test_refresh_reloads_and_acks() {
        let store = boston_store();
        let source = lines(&["Paris", "Mild", "Windy", "Storm"]);

        let reply = respond(&store, &source, &Request::Refresh).await;
        assert_eq!(reply, Some(Reply::Refreshed));
        assert_eq!(store.all_names().await, vec!["Paris"]);
    }

    #[tokio::test]
    async fn test_failed_refresh_sends_nothing() {
        let store = boston_store();
        let source = lines(&["Paris", "Mild"]);

        assert!(respond(&store, &source, &Request::Refresh).await.is_none());
        assert_eq!(store.all_names().await, vec!["Boston"]);
    }
}
