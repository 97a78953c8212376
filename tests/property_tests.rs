use proptest::prelude::*;
use serial_relay::{ForwarderConfig, MemoryEndpoint, Session};
use std::sync::Arc;
use std::time::Duration;

const WAIT: Duration = Duration::from_secs(5);

fn config() -> ForwarderConfig {
    ForwarderConfig {
        poll_interval: Duration::from_millis(1),
        stop_timeout: Duration::from_millis(500),
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Property: whatever arrives on one port leaves the other unchanged and in order
    #[test]
    fn relay_preserves_both_streams(
        a_chunks in prop::collection::vec(prop::collection::vec(any::<u8>(), 1..64), 1..16),
        b_chunks in prop::collection::vec(prop::collection::vec(any::<u8>(), 1..64), 1..16),
    ) {
        tokio_test::block_on(async {
            let a = Arc::new(MemoryEndpoint::open("prop-a", 9600).unwrap());
            let b = Arc::new(MemoryEndpoint::open("prop-b", 9600).unwrap());
            let session = Session::start(a.clone(), b.clone(), config())
                .map_err(|e| TestCaseError::fail(format!("Session start failed: {}", e)))?;

            for (i, chunk) in a_chunks.iter().enumerate() {
                a.inject(chunk);
                if let Some(reply) = b_chunks.get(i) {
                    b.inject(reply);
                }
                tokio::task::yield_now().await;
            }
            for reply in b_chunks.iter().skip(a_chunks.len()) {
                b.inject(reply);
            }

            let a_to_b: Vec<u8> = a_chunks.concat();
            let b_to_a: Vec<u8> = b_chunks.concat();
            let reached_b = b.wait_for_written(a_to_b.len(), WAIT).await;
            let reached_a = a.wait_for_written(b_to_a.len(), WAIT).await;
            session.shutdown().await;

            prop_assert!(reached_b && reached_a, "relay did not drain in time");
            prop_assert_eq!(b.written_bytes(), a_to_b);
            prop_assert_eq!(a.written_bytes(), b_to_a);
            Ok(())
        })?;
    }

    /// Property: every write carries exactly one snapshot, never an empty one
    #[test]
    fn relay_never_writes_empty_payloads(
        data in prop::collection::vec(any::<u8>(), 1..512),
    ) {
        tokio_test::block_on(async {
            let a = Arc::new(MemoryEndpoint::open("prop-a", 115_200).unwrap());
            let b = Arc::new(MemoryEndpoint::open("prop-b", 115_200).unwrap());
            let session = Session::start(a.clone(), b.clone(), config())
                .map_err(|e| TestCaseError::fail(format!("Session start failed: {}", e)))?;

            for chunk in data.chunks(7) {
                a.inject(chunk);
            }
            let drained = b.wait_for_written(data.len(), WAIT).await;
            session.shutdown().await;

            prop_assert!(drained);
            prop_assert!(b.writes().iter().all(|payload| !payload.is_empty()));
            prop_assert_eq!(b.writes().len(), a.read_calls());
            prop_assert_eq!(b.written_bytes(), data);
            Ok(())
        })?;
    }
}
