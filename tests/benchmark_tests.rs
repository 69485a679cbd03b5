//! Performance benchmarks for the codec and the data store

use server::store::DataStore;
use shared::{decode_city_response, decode_list_response, encode_list_response, Reply, Request};
use std::sync::Arc;
use std::time::Instant;

fn city_names(count: usize) -> Vec<String> {
    (0..count).map(|i| format!("City{}", i)).collect()
}

/// Benchmarks decoding of list replies
#[test]
fn benchmark_list_decode() {
    let payload = encode_list_response(&city_names(10));
    let iterations = 100_000;
    let start = Instant::now();

    for _ in 0..iterations {
        let names = decode_list_response(&payload).unwrap();
        assert_eq!(names.len(), 10);
    }

    let duration = start.elapsed();
    println!(
        "List decode: {} iterations in {:?} ({:.2} ns/iter)",
        iterations,
        duration,
        duration.as_nanos() as f64 / iterations as f64
    );

    assert!(duration.as_secs() < 5);
}

/// Benchmarks tagged dispatch over a mix of replies
#[test]
fn benchmark_reply_dispatch() {
    let payloads: [&[u8]; 4] = [
        b"CITIES:Boston,Paris,Rome",
        b"DATA-REFRESHED",
        b"Sunny;Rain;Cloudy",
        b"garbage",
    ];
    let iterations = 50_000;
    let start = Instant::now();

    let mut decoded = 0;
    for _ in 0..iterations {
        for payload in &payloads {
            if Reply::decode(payload).is_ok() {
                decoded += 1;
            }
        }
    }

    let duration = start.elapsed();
    println!(
        "Reply dispatch: {} payloads in {:?}",
        iterations * payloads.len(),
        duration
    );

    assert_eq!(decoded, iterations * 3);
    assert!(duration.as_secs() < 5);
}

/// Benchmarks request decoding with receive-buffer padding
#[test]
fn benchmark_padded_request_decode() {
    let mut payload = b"RELOAD-CITYSan Francisco".to_vec();
    payload.resize(shared::DEFAULT_BUFFER_SIZE, 0);
    let iterations = 100_000;
    let start = Instant::now();

    for _ in 0..iterations {
        assert!(matches!(Request::decode(&payload), Ok(Request::City(_))));
        assert!(decode_city_response(b"a;b;c").is_ok());
    }

    let duration = start.elapsed();
    println!("Padded request decode: {} iterations in {:?}", iterations, duration);

    assert!(duration.as_secs() < 5);
}

/// Benchmarks lookups against a large store
#[tokio::test]
async fn benchmark_store_lookup() {
    let mut source = Vec::new();
    for name in city_names(1_000) {
        source.extend([name, "Sunny".into(), "Rain".into(), "Cloudy".into()]);
    }

    let store = DataStore::new();
    store.reload(Arc::new(source)).await.unwrap();

    let iterations = 1_000;
    let start = Instant::now();

    for i in 0..iterations {
        let name = format!("City{}", (i * 7) % 1_000);
        assert!(store.find_by_name(&name).await.is_some());
    }

    let duration = start.elapsed();
    println!(
        "Store lookup: {} lookups over 1000 records in {:?}",
        iterations, duration
    );

    assert!(duration.as_secs() < 5);
}
