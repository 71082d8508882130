use std::collections::VecDeque;

pub const DEFAULT_CAPACITY: usize = 20;
pub const DEFAULT_LABEL_LIMIT: usize = 6;
pub const DEFAULT_DISPLAY_CAP: usize = 8;

const LABEL_MAX_CHARS: usize = 20;
const LABEL_KEEP_CHARS: usize = 17;
const ELLIPSIS: &str = "...";

/// Display form of a remembered question.
pub fn truncate_label(text: &str) -> String {
    if text.chars().count() > LABEL_MAX_CHARS {
        let head: String = text.chars().take(LABEL_KEEP_CHARS).collect();
        format!("{head}{ELLIPSIS}")
    } else {
        text.to_string()
    }
}

/// Bounded FIFO of the user's literal questions. Outlives conversation resets.
#[derive(Debug, Clone)]
pub struct HistoryCache {
    entries: VecDeque<String>,
    capacity: usize,
}

impl HistoryCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Oldest first.
    pub fn entries(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    pub fn record(&mut self, text: impl Into<String>) {
        self.entries.push_back(text.into());
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }

    /// Labels for the `limit` most recent distinct questions, newest first.
    ///
    /// Distinctness is decided on the full text; labels that collapse to the
    /// same truncated form are then folded so no two labels compare equal.
    pub fn recent_labels(&self, limit: usize, display_cap: usize) -> Vec<String> {
        let mut distinct: Vec<&str> = Vec::new();
        for text in self.entries.iter().rev() {
            if distinct.len() == limit {
                break;
            }
            if !distinct.contains(&text.as_str()) {
                distinct.push(text);
            }
        }

        let mut labels: Vec<String> = Vec::new();
        for text in distinct {
            let label = truncate_label(text);
            if !labels.contains(&label) {
                labels.push(label);
            }
        }
        labels.truncate(display_cap);
        labels
    }

    /// Removes every stored copy of the question behind `label`.
    ///
    /// The label is resolved against all entries, newest first; when nothing
    /// truncates to it, the label itself is treated as the text. Returns
    /// whether anything was removed.
    pub fn remove(&mut self, label: &str) -> bool {
        let full = self
            .entries
            .iter()
            .rev()
            .find(|text| truncate_label(text) == label)
            .cloned()
            .unwrap_or_else(|| label.to_string());

        let before = self.entries.len();
        self.entries.retain(|text| *text != full);
        before != self.entries.len()
    }

    /// History is kept across conversation resets; this leaves it untouched.
    pub fn reset(&mut self) {
        tracing::debug!(entries = self.entries.len(), "history kept across reset");
    }
}

impl Default for HistoryCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(cache: &HistoryCache) -> Vec<String> {
        cache.recent_labels(DEFAULT_LABEL_LIMIT, DEFAULT_DISPLAY_CAP)
    }

    #[test]
    fn test_truncate_label_boundaries() {
        assert_eq!(truncate_label("short"), "short");
        assert_eq!(truncate_label(&"a".repeat(20)), "a".repeat(20));
        assert_eq!(
            truncate_label(&"a".repeat(21)),
            format!("{}...", "a".repeat(17))
        );
    }

    #[test]
    fn test_truncate_label_counts_characters_not_bytes() {
        let text = "Tôi muốn tìm hiểu về văn hóa Khánh Hòa";
        let label = truncate_label(text);
        assert_eq!(label, "Tôi muốn tìm hiểu...");
        assert_eq!(label.chars().count(), 20);
    }

    #[test]
    fn test_capacity_never_exceeded() {
        let mut cache = HistoryCache::default();
        for i in 0..50 {
            cache.record(format!("q{i}"));
            assert!(cache.len() <= DEFAULT_CAPACITY);
        }
        assert_eq!(cache.entries().next(), Some("q30"));
    }

    #[test]
    fn test_same_text_three_times_gives_one_label() {
        let mut cache = HistoryCache::default();
        for _ in 0..3 {
            cache.record("Tôi tìm nhà hàng");
        }
        assert_eq!(labels(&cache), vec!["Tôi tìm nhà hàng".to_string()]);
    }

    #[test]
    fn test_labels_most_recent_first_and_limited() {
        let mut cache = HistoryCache::default();
        for i in 1..=9 {
            cache.record(format!("q{i}"));
        }
        assert_eq!(labels(&cache), vec!["q9", "q8", "q7", "q6", "q5", "q4"]);
    }

    #[test]
    fn test_labels_skip_repeats_when_filling_limit() {
        let mut cache = HistoryCache::default();
        cache.record("a");
        cache.record("b");
        cache.record("b");
        cache.record("c");
        cache.record("b");
        assert_eq!(cache.recent_labels(3, 8), vec!["b", "c", "a"]);
    }

    #[test]
    fn test_labels_fold_equal_truncations() {
        let mut cache = HistoryCache::default();
        let prefix = "x".repeat(17);
        cache.record(format!("{prefix}1111"));
        cache.record(format!("{prefix}2222"));

        let shown = labels(&cache);
        assert_eq!(shown, vec![format!("{prefix}...")]);
    }

    #[test]
    fn test_display_cap_applies() {
        let mut cache = HistoryCache::default();
        for i in 0..12 {
            cache.record(format!("q{i}"));
        }
        assert_eq!(cache.recent_labels(10, 8).len(), 8);
    }

    #[test]
    fn test_remove_by_truncated_label_drops_all_copies() {
        let mut cache = HistoryCache::default();
        let long = "Tôi muốn tìm sự kiện ở Nha Trang";
        cache.record(long);
        cache.record("other");
        cache.record(long);

        assert!(cache.remove(&truncate_label(long)));
        assert_eq!(cache.entries().collect::<Vec<_>>(), vec!["other"]);
    }

    #[test]
    fn test_remove_falls_back_to_literal_text() {
        let mut cache = HistoryCache::default();
        cache.record("Tôi tìm tour");
        assert!(cache.remove("Tôi tìm tour"));
        assert!(cache.is_empty());
        assert!(!cache.remove("never asked"));
    }

    #[test]
    fn test_evicted_entry_not_removable() {
        let mut cache = HistoryCache::default();
        for i in 0..21 {
            cache.record(format!("question {i}"));
        }
        assert!(!cache.remove("question 0"));
        assert_eq!(cache.len(), DEFAULT_CAPACITY);
        assert!(cache.remove("question 1"));
    }

    #[test]
    fn test_reset_keeps_content() {
        let mut cache = HistoryCache::default();
        cache.record("a");
        cache.reset();
        assert_eq!(cache.len(), 1);
    }
}
