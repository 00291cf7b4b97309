//! Expansion of transfer events into sorted interval endpoints.

use super::types::*;

/// Split one event into its start and end endpoints.
///
/// Both endpoints carry the event's category, size and elapsed time.
/// Malformed events (`end < start`, negative size) pass through unchanged.
pub fn expand_event(event: &NetworkEvent) -> [IntervalEndpoint<'_>; 2] {
    let endpoint = |when, is_start| IntervalEndpoint {
        object: &event.object,
        when,
        is_start,
        elapsed: event.elapsed(),
        size: event.size,
        local_bandwidth: event.local_bandwidth,
        event_id: event.id,
    };

    [endpoint(event.start, true), endpoint(event.end, false)]
}

/// Order endpoints by timestamp. The sort is stable, so endpoints with equal
/// timestamps keep their expansion order.
pub fn sort_endpoints(endpoints: &mut [IntervalEndpoint<'_>]) {
    endpoints.sort_by_key(|e| e.when);
}

/// Expand every event and return all endpoints in time order.
pub fn expand_and_sort(events: &[NetworkEvent]) -> Vec<IntervalEndpoint<'_>> {
    let mut endpoints: Vec<IntervalEndpoint<'_>> = events.iter().flat_map(expand_event).collect();
    sort_endpoints(&mut endpoints);
    endpoints
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeDelta, TimeZone, Utc};

    fn event(object: &str, start_ms: i64, end_ms: i64) -> NetworkEvent {
        let t0 = Utc.with_ymd_and_hms(2019, 5, 1, 12, 0, 0).unwrap();
        NetworkEvent {
            from: "user-0".to_string(),
            to: "peer-0".to_string(),
            object: object.to_string(),
            size: 256,
            start: t0 + TimeDelta::milliseconds(start_ms),
            end: t0 + TimeDelta::milliseconds(end_ms),
            local_bandwidth: 10_000,
            global_bandwidth: 100_000,
            id: 1,
        }
    }

    #[test]
    fn test_expand_event() {
        let e = event("endorsement", 10, 35);
        let [start, end] = expand_event(&e);

        assert!(start.is_start);
        assert!(!end.is_start);
        assert_eq!(start.when, e.start);
        assert_eq!(end.when, e.end);
        assert_eq!(start.elapsed, TimeDelta::milliseconds(25));
        assert_eq!(end.elapsed, TimeDelta::milliseconds(25));
        assert_eq!(start.object, "endorsement");
        assert_eq!(end.size, 256);
        assert_eq!(start.delta() + end.delta(), 0);
    }

    #[test]
    fn test_expand_malformed_event_keeps_negative_elapsed() {
        let e = event("nonce", 50, 20);
        let [start, _] = expand_event(&e);
        assert_eq!(start.elapsed, TimeDelta::milliseconds(-30));
    }

    #[test]
    fn test_expand_and_sort_orders_by_time() {
        let events = vec![event("a", 40, 90), event("b", 0, 60), event("c", 10, 20)];
        let endpoints = expand_and_sort(&events);

        assert_eq!(endpoints.len(), 6);
        assert!(endpoints.windows(2).all(|w| w[0].when <= w[1].when));
        let objects: Vec<&str> = endpoints.iter().map(|e| e.object).collect();
        assert_eq!(objects, vec!["b", "c", "c", "a", "b", "a"]);
    }
}
