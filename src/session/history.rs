use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use super::events::Detection;

/// Default number of retained frames
pub const DEFAULT_HISTORY_CAPACITY: usize = 200;

/// A retained frame that had at least one detection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub frame_index: i64,
    pub timestamp: String,
    pub detections: Vec<Detection>,
}

/// Bounded append-only frame history, oldest evicted first
#[derive(Debug, Clone, PartialEq)]
pub struct RingHistory {
    entries: VecDeque<HistoryEntry>,
    capacity: usize,
}

impl RingHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity.min(DEFAULT_HISTORY_CAPACITY)),
            capacity,
        }
    }

    /// Append at the end, dropping from the front past capacity
    pub fn append(&mut self, entry: HistoryEntry) {
        self.entries.push_back(entry);
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }

    /// Last `n` entries, most recent first
    pub fn recent(&self, n: usize) -> Vec<HistoryEntry> {
        self.entries.iter().rev().take(n).cloned().collect()
    }

    /// Entries in arrival order
    pub fn iter(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl Default for RingHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(frame_index: i64) -> HistoryEntry {
        HistoryEntry {
            frame_index,
            timestamp: format!("00:00:{:02}", frame_index % 60),
            detections: vec![Detection {
                class: "knife".to_string(),
                confidence: 0.8,
                bbox: [0.0, 0.0, 10.0, 10.0],
                track_id: None,
            }],
        }
    }

    #[test]
    fn test_history_evicts_oldest_past_capacity() {
        let mut history = RingHistory::default();

        for i in 0..250 {
            history.append(entry(i));
            assert!(history.len() <= 200);
        }

        assert_eq!(history.len(), 200);
        let indices: Vec<i64> = history.iter().map(|e| e.frame_index).collect();
        let expected: Vec<i64> = (50..250).collect();
        assert_eq!(indices, expected);
    }

    #[test]
    fn test_recent_is_newest_first_and_non_mutating() {
        let mut history = RingHistory::new(10);
        for i in 1..=5 {
            history.append(entry(i));
        }

        let recent = history.recent(3);
        let indices: Vec<i64> = recent.iter().map(|e| e.frame_index).collect();
        assert_eq!(indices, vec![5, 4, 3]);
        assert_eq!(history.len(), 5);

        // Asking for more than is stored returns everything
        assert_eq!(history.recent(30).len(), 5);
    }

    #[test]
    fn test_clear() {
        let mut history = RingHistory::new(3);
        history.append(entry(1));
        history.clear();

        assert!(history.is_empty());
        assert_eq!(history, RingHistory::new(3));
    }
}
