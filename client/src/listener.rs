//! Background reader for server replies
//!
//! The listener is the only task that applies replies to session state. Each
//! reply replaces its target wholesale under the session lock and fires the
//! matching pending signal in the same critical section, so a woken waiter
//! always sees the new state.

use crate::pending::RequestKind;
use crate::session::Shared;
use log::{debug, error};
use shared::{Day, Reply, WeatherRecord};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::task::JoinHandle;

pub(crate) fn spawn_listener(
    socket: Arc<UdpSocket>,
    shared: Arc<Shared>,
    buffer_size: usize,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut buffer = vec![0u8; buffer_size];

        loop {
            match socket.recv_from(&mut buffer).await {
                Ok((len, addr)) => {
                    let server_addr = shared.state.read().await.server_addr;
                    if addr != server_addr {
                        debug!("Ignoring datagram from {} (server is {})", addr, server_addr);
                        continue;
                    }

                    match Reply::decode(&buffer[..len]) {
                        Ok(reply) => apply_reply(&shared, reply).await,
                        Err(e) => debug!("Dropping reply from {}: {}", addr, e),
                    }
                }
                Err(e) => {
                    error!("Error receiving packet: {}", e);
                    tokio::time::sleep(Duration::from_millis(10)).await;
                }
            }
        }
    })
}

pub(crate) async fn apply_reply(shared: &Shared, reply: Reply) {
    match reply {
        Reply::Cities(names) => {
            {
                let mut state = shared.state.write().await;
                state.known_cities = names.clone();
                state.pending.satisfy(RequestKind::CityList);
            }

            shared.observer.on_cities_updated(&names);
            shared.observer.on_status_message("Data updated. Choose city.");
            shared.observer.on_connection_usable(true);
        }
        Reply::Refreshed => {
            if !shared.state.write().await.pending.satisfy(RequestKind::Refresh) {
                debug!("Refresh acknowledgement with no request waiting");
            }
        }
        Reply::CityData(forecast) => {
            let record = {
                let mut state = shared.state.write().await;
                let Some(name) = state.requested_city.clone() else {
                    debug!("City data with no city requested, dropping it");
                    return;
                };
                let record = WeatherRecord::from_forecast(name, forecast);

                state.selected_city = Some(record.clone());
                state.selected_day = Day::Today;
                state.pending.satisfy(RequestKind::CityData);
                record
            };

            shared.observer.on_city_selected(&record);
            shared.observer.on_status_message(record.today());
        }
    }
}
