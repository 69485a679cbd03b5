//! Data model and wire codec shared by the weather server and its clients.
//!
//! Every message is a single plain-text datagram. Requests and the list/ack
//! replies are identified by a literal tag; the city-data reply is recognised
//! by its shape (three `;`-separated fields). Receivers read into a fixed-size
//! buffer, so payloads may arrive truncated or padded and are always trimmed
//! with [`trim_padding`] before any comparison.

use thiserror::Error;

pub const DEFAULT_PORT: u16 = 12345;
pub const DEFAULT_BUFFER_SIZE: usize = 100;

pub const LIST_REQUEST: &str = "GET-CITIES";
pub const LIST_RESPONSE_TAG: &str = "CITIES:";
pub const REFRESH_REQUEST: &str = "REFRESH-DATA";
pub const REFRESH_ACK: &str = "DATA-REFRESHED";
pub const CITY_REQUEST_TAG: &str = "RELOAD-CITY";

pub const FIELD_SEPARATOR: char = ';';
pub const LIST_SEPARATOR: char = ',';

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("malformed message: {0}")]
    Malformed(String),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

/// One of the three forecast slots carried for every city
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Day {
    Today,
    Tomorrow,
    In2Days,
}

impl Day {
    pub fn label(&self) -> &'static str {
        match self {
            Day::Today => "today",
            Day::Tomorrow => "tomorrow",
            Day::In2Days => "in 2 days",
        }
    }
}

/// Three-day forecast as carried by a city-data reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Forecast {
    pub today: String,
    pub tomorrow: String,
    pub in2days: String,
}

impl Forecast {
    pub fn new(
        today: impl Into<String>,
        tomorrow: impl Into<String>,
        in2days: impl Into<String>,
    ) -> Self {
        Self {
            today: today.into(),
            tomorrow: tomorrow.into(),
            in2days: in2days.into(),
        }
    }

    pub fn for_day(&self, day: Day) -> &str {
        match day {
            Day::Today => &self.today,
            Day::Tomorrow => &self.tomorrow,
            Day::In2Days => &self.in2days,
        }
    }
}

/// Weather for one city. Immutable once built; updates replace the whole value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeatherRecord {
    name: String,
    forecast: Forecast,
}

impl WeatherRecord {
    pub fn new(
        name: impl Into<String>,
        today: impl Into<String>,
        tomorrow: impl Into<String>,
        in2days: impl Into<String>,
    ) -> Self {
        Self::from_forecast(name, Forecast::new(today, tomorrow, in2days))
    }

    pub fn from_forecast(name: impl Into<String>, forecast: Forecast) -> Self {
        Self {
            name: name.into(),
            forecast,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn today(&self) -> &str {
        &self.forecast.today
    }

    pub fn tomorrow(&self) -> &str {
        &self.forecast.tomorrow
    }

    pub fn in2days(&self) -> &str {
        &self.forecast.in2days
    }

    pub fn forecast(&self) -> &Forecast {
        &self.forecast
    }

    pub fn for_day(&self, day: Day) -> &str {
        self.forecast.for_day(day)
    }
}

/// Client to server messages
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    ListCities,
    Refresh,
    City(String),
}

impl Request {
    pub fn encode(&self) -> Result<Vec<u8>, ProtocolError> {
        match self {
            Request::ListCities => Ok(encode_list_request()),
            Request::Refresh => Ok(encode_refresh_request()),
            Request::City(name) => encode_city_request(name),
        }
    }

    /// Decodes a received request. The city name is trimmed of receive-buffer
    /// padding; unknown tags are reported as malformed.
    pub fn decode(payload: &[u8]) -> Result<Self, ProtocolError> {
        let text = trim_padding(payload);

        if text == LIST_REQUEST {
            return Ok(Request::ListCities);
        }
        if text == REFRESH_REQUEST {
            return Ok(Request::Refresh);
        }
        if let Some(name) = text.strip_prefix(CITY_REQUEST_TAG) {
            let name = name.trim();
            if name.is_empty() {
                return Err(ProtocolError::Malformed(
                    "city request without a name".to_string(),
                ));
            }
            return Ok(Request::City(name.to_string()));
        }

        Err(ProtocolError::Malformed(format!(
            "unrecognized request: {:?}",
            text
        )))
    }
}

/// Server to client messages
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Cities(Vec<String>),
    Refreshed,
    CityData(Forecast),
}

impl Reply {
    pub fn encode(&self) -> Vec<u8> {
        match self {
            Reply::Cities(names) => encode_list_response(names),
            Reply::Refreshed => encode_refresh_ack(),
            Reply::CityData(forecast) => encode_city_response(forecast),
        }
    }

    /// Tags are checked in order `CITIES:`, `DATA-REFRESHED`, then the payload
    /// must have the three-field city-data shape. Anything else is malformed.
    pub fn decode(payload: &[u8]) -> Result<Self, ProtocolError> {
        let text = trim_padding(payload);

        if text.starts_with(LIST_RESPONSE_TAG) {
            return decode_list_response(payload).map(Reply::Cities);
        }
        if text == REFRESH_ACK {
            return Ok(Reply::Refreshed);
        }

        decode_city_response(payload).map(Reply::CityData)
    }
}

/// Strips the NUL and whitespace padding a fixed receive buffer leaves around
/// a payload.
pub fn trim_padding(payload: &[u8]) -> String {
    String::from_utf8_lossy(payload)
        .trim_matches(|c: char| c == '\0' || c.is_whitespace())
        .to_string()
}

pub fn encode_list_request() -> Vec<u8> {
    LIST_REQUEST.as_bytes().to_vec()
}

pub fn encode_list_response<S: AsRef<str>>(names: &[S]) -> Vec<u8> {
    let joined = names
        .iter()
        .map(|name| name.as_ref())
        .collect::<Vec<_>>()
        .join(&LIST_SEPARATOR.to_string());
    format!("{}{}", LIST_RESPONSE_TAG, joined).into_bytes()
}

pub fn decode_list_response(payload: &[u8]) -> Result<Vec<String>, ProtocolError> {
    let text = trim_padding(payload);
    let list = text.strip_prefix(LIST_RESPONSE_TAG).ok_or_else(|| {
        ProtocolError::Malformed(format!("expected {} tag", LIST_RESPONSE_TAG))
    })?;

    let mut names: Vec<String> = list.split(LIST_SEPARATOR).map(str::to_string).collect();
    while names.last().is_some_and(|name| name.is_empty()) {
        names.pop();
    }
    Ok(names)
}

pub fn encode_refresh_request() -> Vec<u8> {
    REFRESH_REQUEST.as_bytes().to_vec()
}

pub fn encode_refresh_ack() -> Vec<u8> {
    REFRESH_ACK.as_bytes().to_vec()
}

pub fn is_refresh_ack(payload: &[u8]) -> bool {
    trim_padding(payload) == REFRESH_ACK
}

/// Rejects names that would break framing before anything is sent.
pub fn encode_city_request(name: &str) -> Result<Vec<u8>, ProtocolError> {
    if name.contains(FIELD_SEPARATOR) || name.contains(LIST_SEPARATOR) {
        return Err(ProtocolError::InvalidArgument(format!(
            "city name {:?} contains a protocol separator",
            name
        )));
    }
    if name.trim().is_empty() {
        return Err(ProtocolError::InvalidArgument(
            "city name is empty".to_string(),
        ));
    }
    Ok(format!("{}{}", CITY_REQUEST_TAG, name).into_bytes())
}

pub fn encode_city_response(forecast: &Forecast) -> Vec<u8> {
    format!(
        "{}{sep}{}{sep}{}",
        forecast.today,
        forecast.tomorrow,
        forecast.in2days,
        sep = FIELD_SEPARATOR
    )
    .into_bytes()
}

pub fn decode_city_response(payload: &[u8]) -> Result<Forecast, ProtocolError> {
    let text = trim_padding(payload);
    let fields: Vec<&str> = text.split(FIELD_SEPARATOR).collect();

    if fields.len() < 3 {
        return Err(ProtocolError::Malformed(format!(
            "city data needs 3 fields, got {}",
            fields.len()
        )));
    }
    Ok(Forecast::new(fields[0], fields[1], fields[2]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_accessors() {
        let record = WeatherRecord::new("Boston", "Sunny", "Rain", "Cloudy");
        assert_eq!(record.name(), "Boston");
        assert_eq!(record.today(), "Sunny");
        assert_eq!(record.tomorrow(), "Rain");
        assert_eq!(record.in2days(), "Cloudy");
        assert_eq!(record.for_day(Day::Tomorrow), "Rain");
        assert_eq!(record.for_day(Day::In2Days), "Cloudy");
    }

    #[test]
    fn test_list_response_exact_bytes() {
        let payload = encode_list_response(&["Boston", "Paris"]);
        assert_eq!(payload, b"CITIES:Boston,Paris".to_vec());
    }

    #[test]
    fn test_list_response_roundtrip() {
        let names = vec!["Boston".to_string(), "New York".to_string(), "Paris".to_string()];
        let decoded = decode_list_response(&encode_list_response(&names)).unwrap();
        assert_eq!(decoded, names);
    }

    #[test]
    fn test_list_response_tolerates_trailing_comma_and_padding() {
        let mut payload = b"CITIES:Boston,Paris,".to_vec();
        payload.resize(DEFAULT_BUFFER_SIZE, 0);

        let decoded = decode_list_response(&payload).unwrap();
        assert_eq!(decoded, vec!["Boston", "Paris"]);
    }

    #[test]
    fn test_empty_list_response() {
        assert!(decode_list_response(b"CITIES:").unwrap().is_empty());
    }

    #[test]
    fn test_list_response_requires_tag() {
        let result = decode_list_response(b"Boston,Paris");
        assert!(matches!(result, Err(ProtocolError::Malformed(_))));
    }

    #[test]
    fn test_city_response_roundtrip() {
        let record = WeatherRecord::new("Boston", "Sunny 21C", "Rain", "Cloudy, windy");
        let decoded = decode_city_response(&encode_city_response(record.forecast())).unwrap();
        assert_eq!(&decoded, record.forecast());
    }

    #[test]
    fn test_city_response_exact_bytes() {
        let forecast = Forecast::new("Sunny", "Rain", "Cloudy");
        assert_eq!(encode_city_response(&forecast), b"Sunny;Rain;Cloudy".to_vec());
    }

    #[test]
    fn test_city_response_too_few_fields() {
        let result = decode_city_response(b"Sunny;Rain");
        assert!(matches!(result, Err(ProtocolError::Malformed(_))));
    }

    #[test]
    fn test_city_request_rejects_separators() {
        for name in ["Bos;ton", "Bos,ton", "", "   "] {
            let result = encode_city_request(name);
            assert!(
                matches!(result, Err(ProtocolError::InvalidArgument(_))),
                "accepted {:?}",
                name
            );
        }
        assert_eq!(
            encode_city_request("Boston").unwrap(),
            b"RELOAD-CITYBoston".to_vec()
        );
    }

    #[test]
    fn test_refresh_ack_detection() {
        assert!(is_refresh_ack(&encode_refresh_ack()));
        assert!(is_refresh_ack(b"DATA-REFRESHED\0\0\0"));
        assert!(!is_refresh_ack(b"DATA-REFRESHED-NOT"));
        assert!(!is_refresh_ack(b"CITIES:"));
    }

    #[test]
    fn test_request_decode() {
        assert_eq!(Request::decode(b"GET-CITIES").unwrap(), Request::ListCities);
        assert_eq!(Request::decode(b"REFRESH-DATA\0\0").unwrap(), Request::Refresh);

        let mut padded = b"RELOAD-CITYNew York".to_vec();
        padded.resize(DEFAULT_BUFFER_SIZE, 0);
        assert_eq!(
            Request::decode(&padded).unwrap(),
            Request::City("New York".to_string())
        );
    }

    #[test]
    fn test_request_decode_rejects_unknown() {
        let payloads: [&[u8]; 4] = [b"HELLO", b"RELOAD-CITY", b"GET-CITIESX", b""];
        for payload in payloads {
            assert!(Request::decode(payload).is_err(), "accepted {:?}", payload);
        }
    }

    #[test]
    fn test_reply_tagged_dispatch() {
        assert_eq!(
            Reply::decode(b"CITIES:Boston").unwrap(),
            Reply::Cities(vec!["Boston".to_string()])
        );
        assert_eq!(Reply::decode(b"DATA-REFRESHED").unwrap(), Reply::Refreshed);
        assert_eq!(
            Reply::decode(b"Sunny;Rain;Cloudy").unwrap(),
            Reply::CityData(Forecast::new("Sunny", "Rain", "Cloudy"))
        );
    }

    #[test]
    fn test_reply_garbage_is_malformed() {
        let payloads: [&[u8]; 4] = [b"garbage", b"DATA-REFRESH", b"Sunny;Rain", b""];
        for payload in payloads {
            assert!(
                matches!(Reply::decode(payload), Err(ProtocolError::Malformed(_))),
                "accepted {:?}",
                payload
            );
        }
    }

    #[test]
    fn test_request_encode_matches_free_functions() {
        assert_eq!(Request::ListCities.encode().unwrap(), encode_list_request());
        assert_eq!(Request::Refresh.encode().unwrap(), encode_refresh_request());
        assert!(Request::City("a;b".to_string()).encode().is_err());
    }
}
