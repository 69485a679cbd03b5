//! Hooks through which the session reports state changes to a front-end

use log::info;
use shared::WeatherRecord;

/// Called from the listener task and from request operations, never while
/// session state is locked. All methods default to no-ops.
pub trait SessionObserver: Send + Sync {
    fn on_cities_updated(&self, _names: &[String]) {}

    fn on_city_selected(&self, _record: &WeatherRecord) {}

    fn on_status_message(&self, _text: &str) {}

    fn on_connection_usable(&self, _usable: bool) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl SessionObserver for NoopObserver {}

/// Reports every hook through the `log` facade
#[derive(Debug, Default, Clone, Copy)]
pub struct LogObserver;

impl SessionObserver for LogObserver {
    fn on_cities_updated(&self, names: &[String]) {
        info!("Cities updated: {}", names.join(", "));
    }

    fn on_city_selected(&self, record: &WeatherRecord) {
        info!("Selected city: {}", record.name());
    }

    fn on_status_message(&self, text: &str) {
        info!("Status: {}", text);
    }

    fn on_connection_usable(&self, usable: bool) {
        info!("Connection usable: {}", usable);
    }
}
