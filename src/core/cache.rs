use std::collections::{HashMap, VecDeque};

use crate::simulation::subject::SubjectId;

/// Fixed-capacity LRU cache for assembled subject files.
///
/// Entries carry the subject's touch stamp at fill time; a lookup with a
/// newer stamp is a miss, so the cache can never serve a file that predates
/// a write to that subject. Staleness never has to be swept, it falls out
/// on read.
#[derive(Debug)]
pub struct SubjectFileCache<V> {
    capacity: usize,
    entries: HashMap<SubjectId, (u64, V)>,
    recency: VecDeque<SubjectId>,
}

impl<V: Clone> SubjectFileCache<V> {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: HashMap::new(),
            recency: VecDeque::new(),
        }
    }

    /// A hit requires the entry's fill stamp to match the subject's current
    /// touch stamp; hits refresh recency.
    pub fn get(&mut self, id: SubjectId, current_stamp: u64) -> Option<V> {
        match self.entries.get(&id) {
            Some((stamp, value)) if *stamp >= current_stamp => {
                let value = value.clone();
                self.touch_recency(id);
                Some(value)
            }
            Some(_) => {
                self.invalidate(id);
                None
            }
            None => None,
        }
    }

    pub fn insert(&mut self, id: SubjectId, stamp: u64, value: V) {
        if self.entries.insert(id, (stamp, value)).is_none() && self.entries.len() > self.capacity
        {
            if let Some(oldest) = self.recency.pop_front() {
                self.entries.remove(&oldest);
            }
        }
        self.touch_recency(id);
    }

    pub fn invalidate(&mut self, id: SubjectId) {
        self.entries.remove(&id);
        self.recency.retain(|other| *other != id);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.recency.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn touch_recency(&mut self, id: SubjectId) {
        self.recency.retain(|other| *other != id);
        self.recency.push_back(id);
    }
}

/// De-duplication ledger keyed by client request id. A replayed id returns
/// the recorded result instead of re-executing the call. Bounded FIFO; old
/// ids age out once the client has no reason to retry them.
#[derive(Debug)]
pub struct RequestLedger<T> {
    capacity: usize,
    entries: HashMap<u64, T>,
    order: VecDeque<u64>,
}

impl<T: Clone> RequestLedger<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: HashMap::new(),
            order: VecDeque::new(),
        }
    }

    pub fn replay(&self, request_id: u64) -> Option<T> {
        self.entries.get(&request_id).cloned()
    }

    pub fn record(&mut self, request_id: u64, result: T) {
        if self.entries.insert(request_id, result).is_none() {
            self.order.push_back(request_id);
            if self.order.len() > self.capacity {
                if let Some(oldest) = self.order.pop_front() {
                    self.entries.remove(&oldest);
                }
            }
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }
}

/// Polling cadence driven entirely by caller-supplied elapsed ticks; core
/// never reads a wall clock.
#[derive(Debug, Clone)]
pub struct PollClock {
    pub interval_ticks: u64,
    accumulator: u64,
    paused: bool,
}

impl PollClock {
    pub fn new(interval_ticks: u64) -> Self {
        Self {
            interval_ticks: interval_ticks.max(1),
            accumulator: 0,
            paused: false,
        }
    }

    /// Feed elapsed ticks in; get the number of due feed passes out.
    /// While paused, time does not accumulate.
    pub fn advance(&mut self, elapsed_ticks: u64) -> u64 {
        if self.paused {
            return 0;
        }
        self.accumulator += elapsed_ticks;
        let due = self.accumulator / self.interval_ticks;
        self.accumulator %= self.interval_ticks;
        due
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lru_evicts_exactly_the_least_recent_entry() {
        let mut cache: SubjectFileCache<&str> = SubjectFileCache::new(3);
        cache.insert(SubjectId(1), 0, "one");
        cache.insert(SubjectId(2), 0, "two");
        cache.insert(SubjectId(3), 0, "three");
        // Refresh 1 so 2 becomes the eviction candidate.
        assert_eq!(cache.get(SubjectId(1), 0), Some("one"));

        cache.insert(SubjectId(4), 0, "four");
        assert_eq!(cache.len(), 3);
        assert_eq!(cache.get(SubjectId(2), 0), None);
        assert_eq!(cache.get(SubjectId(1), 0), Some("one"));
        assert_eq!(cache.get(SubjectId(4), 0), Some("four"));
    }

    #[test]
    fn newer_touch_stamp_reads_as_a_miss() {
        let mut cache: SubjectFileCache<&str> = SubjectFileCache::new(2);
        cache.insert(SubjectId(1), 5, "file");
        assert_eq!(cache.get(SubjectId(1), 5), Some("file"));
        assert_eq!(cache.get(SubjectId(1), 6), None);
        // The stale entry is dropped, not resurrected on an older stamp.
        assert_eq!(cache.get(SubjectId(1), 5), None);
    }

    #[test]
    fn ledger_replays_recorded_results() {
        let mut ledger: RequestLedger<u32> = RequestLedger::new(2);
        ledger.record(10, 100);
        assert_eq!(ledger.replay(10), Some(100));
        ledger.record(11, 110);
        ledger.record(12, 120);
        assert_eq!(ledger.replay(10), None);
        assert_eq!(ledger.replay(12), Some(120));
    }

    #[test]
    fn poll_clock_fires_on_interval_and_freezes_when_paused() {
        let mut clock = PollClock::new(10);
        assert_eq!(clock.advance(9), 0);
        assert_eq!(clock.advance(1), 1);
        assert_eq!(clock.advance(25), 2);

        clock.pause();
        assert_eq!(clock.advance(50), 0);
        clock.resume();
        // Paused time was discarded, the leftover 5 ticks remain.
        assert_eq!(clock.advance(5), 1);
    }
}
