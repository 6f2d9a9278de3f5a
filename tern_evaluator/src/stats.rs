use fxhash::FxHashMap;
use std::{fmt, time::Duration};

use crate::type_id::RequestTypeId;

/// How often one request type was computed, and how long that took.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RequestTypeStatistics {
    pub id: RequestTypeId,
    pub name: &'static str,
    /// Computations that were not served from a cache.
    pub evaluations: u64,
    /// Time spent computing, including sub-requests.
    pub total_time: Duration,
}

impl fmt::Display for RequestTypeStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total_time = format!("{:.3?}", self.total_time);
        write!(
            f,
            "{:<24} {:>8} {:>12}",
            self.name, self.evaluations, total_time
        )
    }
}

#[derive(Default)]
pub(crate) struct RequestStatistics {
    by_type: FxHashMap<RequestTypeId, RequestTypeStatistics>,
}

impl RequestStatistics {
    pub(crate) fn record(&mut self, id: RequestTypeId, name: &'static str, elapsed: Duration) {
        let entry = self.by_type.entry(id).or_insert(RequestTypeStatistics {
            id,
            name,
            evaluations: 0,
            total_time: Duration::ZERO,
        });

        entry.evaluations += 1;
        entry.total_time += elapsed;
    }

    /// Every request type that was computed at least once, ordered by id.
    pub(crate) fn snapshot(&self) -> Vec<RequestTypeStatistics> {
        let mut stats: Vec<_> = self.by_type.values().cloned().collect();
        stats.sort_by_key(|stats| stats.id);
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::type_id::Zone;

    #[test]
    fn accumulates_per_type() {
        let sum = RequestTypeId::new(Zone::Testing, 0);
        let parse = RequestTypeId::new(Zone::Parse, 3);
        let mut stats = RequestStatistics::default();

        stats.record(sum, "Sum", Duration::from_millis(2));
        stats.record(parse, "Parse", Duration::from_millis(1));
        stats.record(sum, "Sum", Duration::from_millis(3));

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[0].name, "Parse");
        assert_eq!(snapshot[1].evaluations, 2);
        assert_eq!(snapshot[1].total_time, Duration::from_millis(5));
    }
}
