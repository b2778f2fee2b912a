//! Resource data model - counter samples and the bounded history they live in

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// One reading of the system-wide counters.
///
/// Immutable once created; produced by the sampler on every tick and held
/// only inside a [`ResourceHistory`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceSample {
    /// CPU usage percentage (0.0-100.0)
    pub cpu_percent: f32,
    /// Physical memory usage percentage (0.0-100.0)
    pub ram_percent: f32,
    /// Usage percentage of the volume holding the working directory
    pub disk_percent: f32,
    /// KiB sent on all interfaces since the previous sample
    pub net_sent_kb: f64,
    /// KiB received on all interfaces since the previous sample
    pub net_recv_kb: f64,
}

/// Fixed-capacity FIFO of samples; once full, the oldest entry is evicted
/// for every new one.
#[derive(Debug, Clone)]
pub struct ResourceHistory {
    samples: VecDeque<ResourceSample>,
    capacity: usize,
}

impl ResourceHistory {
    /// A capacity of zero is clamped to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a sample, evicting the oldest one if the buffer is full.
    pub fn push(&mut self, sample: ResourceSample) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    /// Most recent sample, or a zeroed default before the first push.
    pub fn latest(&self) -> ResourceSample {
        self.samples.back().copied().unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Oldest-first iteration over the retained samples.
    pub fn iter(&self) -> impl Iterator<Item = &ResourceSample> {
        self.samples.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cpu(p: f32) -> ResourceSample {
        ResourceSample {
            cpu_percent: p,
            ..Default::default()
        }
    }

    #[test]
    fn length_never_exceeds_capacity() {
        let mut history = ResourceHistory::new(3);
        for i in 0..10 {
            history.push(cpu(i as f32));
            assert_eq!(history.len(), (i + 1).min(3));
        }
    }

    #[test]
    fn oldest_evicted_first() {
        let mut history = ResourceHistory::new(2);
        history.push(cpu(1.0));
        history.push(cpu(2.0));
        history.push(cpu(3.0));
        let retained: Vec<f32> = history.iter().map(|s| s.cpu_percent).collect();
        assert_eq!(retained, vec![2.0, 3.0]);
    }

    #[test]
    fn latest_is_zeroed_when_empty() {
        let history = ResourceHistory::new(4);
        assert!(history.is_empty());
        assert_eq!(history.latest(), ResourceSample::default());
    }

    #[test]
    fn zero_capacity_clamped() {
        let mut history = ResourceHistory::new(0);
        history.push(cpu(1.0));
        history.push(cpu(2.0));
        assert_eq!(history.len(), 1);
        assert_eq!(history.latest().cpu_percent, 2.0);
    }
}
