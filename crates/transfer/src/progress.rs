use std::sync::atomic::{AtomicU16, Ordering};

/// Sentinel for "nothing admitted yet".
const NONE: u16 = u16::MAX;

/// Converts transferred bytes into a percent in `0..=100`.
///
/// An empty transfer counts as complete.
pub fn percent_of(sent: u64, total: u64) -> u8 {
    if total == 0 {
        return 100;
    }
    let pct = (u128::from(sent) * 100 / u128::from(total)).min(100);
    pct as u8
}

/// Filters a raw percent series into a strictly increasing one.
///
/// A retried transfer restarts at zero; the gate holds the bar at the
/// highest value already shown until the new attempt overtakes it.
#[derive(Debug)]
pub struct ProgressGate {
    last: AtomicU16,
}

impl Default for ProgressGate {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressGate {
    pub fn new() -> Self {
        Self {
            last: AtomicU16::new(NONE),
        }
    }

    /// Returns the percent if it advances the series, `None` otherwise.
    pub fn admit(&self, percent: u8) -> Option<u8> {
        let percent = percent.min(100);
        self.last
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |last| {
                if last == NONE || u16::from(percent) > last {
                    Some(u16::from(percent))
                } else {
                    None
                }
            })
            .ok()
            .map(|_| percent)
    }

    /// Highest percent admitted so far.
    pub fn last(&self) -> Option<u8> {
        match self.last.load(Ordering::Acquire) {
            NONE => None,
            v => Some(v as u8),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_of_bounds() {
        assert_eq!(percent_of(0, 1000), 0);
        assert_eq!(percent_of(500, 1000), 50);
        assert_eq!(percent_of(999, 1000), 99);
        assert_eq!(percent_of(1000, 1000), 100);
        assert_eq!(percent_of(2000, 1000), 100);
        assert_eq!(percent_of(0, 0), 100);
    }

    #[test]
    fn percent_of_large_files() {
        let total = 1000 * 1024 * 1024 * 1024u64;
        assert_eq!(percent_of(total / 4, total), 25);
    }

    #[test]
    fn gate_admits_first_value() {
        let gate = ProgressGate::new();
        assert_eq!(gate.last(), None);
        assert_eq!(gate.admit(0), Some(0));
        assert_eq!(gate.last(), Some(0));
    }

    #[test]
    fn gate_drops_duplicates_and_regressions() {
        let gate = ProgressGate::new();
        let series = [0, 10, 10, 40, 5, 0, 40, 41, 100, 100];
        let admitted: Vec<u8> = series.iter().filter_map(|&p| gate.admit(p)).collect();
        assert_eq!(admitted, vec![0, 10, 40, 41, 100]);
    }

    #[test]
    fn gate_clamps_to_100() {
        let gate = ProgressGate::new();
        assert_eq!(gate.admit(150), Some(100));
        assert_eq!(gate.admit(100), None);
    }

    #[test]
    fn gate_concurrent_admits_are_monotonic() {
        use std::sync::{Arc, Mutex};
        use std::thread;

        let gate = Arc::new(ProgressGate::new());
        let admitted = Arc::new(Mutex::new(Vec::new()));
        let mut handles = vec![];

        for t in 0..4u8 {
            let g = Arc::clone(&gate);
            let a = Arc::clone(&admitted);
            handles.push(thread::spawn(move || {
                for p in (t..=100).step_by(4) {
                    if let Some(v) = g.admit(p) {
                        a.lock().unwrap().push(v);
                    }
                }
            }));
        }
        for h in handles {
            h.join().unwrap();
        }

        // Every admitted value was, at admission time, above all earlier ones.
        let values = admitted.lock().unwrap();
        let mut sorted = values.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), values.len());
        assert_eq!(gate.last(), Some(100));
    }
}
