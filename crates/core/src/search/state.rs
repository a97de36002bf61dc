//! Observable search state.

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::movie::Movie;

/// State of a search session. Exactly one holds at a time.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SearchState {
    /// Empty query.
    #[default]
    Idle,
    /// Query shorter than the minimum length.
    Initial,
    /// First page requested (or debouncing).
    Loading,
    /// Rows available.
    Loaded { has_more: bool },
    /// Search completed with no rows.
    Empty,
    /// Search failed; `message` is safe to display.
    Error { message: String },
}

/// Everything a consumer needs to render the search screen.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SearchSnapshot {
    /// Trimmed query text.
    pub query: String,
    /// Last page requested (1-based, 0 before the first edit).
    pub page: u32,
    pub state: SearchState,
    /// Accumulated rows, in page order.
    pub rows: Vec<Movie>,
    /// True when the rows came from the offline cache after a
    /// connectivity failure.
    pub offline: bool,
}

impl SearchSnapshot {
    /// Screen title for the current state.
    pub fn headline(&self) -> String {
        match self.state {
            SearchState::Empty => "No results found".to_string(),
            SearchState::Loaded { .. } => {
                let total = self.rows.len();
                format!("Found {} movie{}", total, if total == 1 { "" } else { "s" })
            }
            _ => "Search Movies".to_string(),
        }
    }
}

/// Handle for a callback subscription. Delivery stops when it is dropped.
#[derive(Debug)]
pub struct Subscription {
    handle: JoinHandle<()>,
}

impl Subscription {
    pub(crate) fn spawn<F>(mut rx: watch::Receiver<SearchSnapshot>, mut callback: F) -> Self
    where
        F: FnMut(&SearchSnapshot) + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            loop {
                // Clone before calling out so the callback may publish
                let snapshot = rx.borrow_and_update().clone();
                callback(&snapshot);
                if rx.changed().await.is_err() {
                    break;
                }
            }
        });
        Self { handle }
    }

    /// Stop delivering snapshots.
    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headline() {
        let mut snapshot = SearchSnapshot::default();
        assert_eq!(snapshot.headline(), "Search Movies");

        snapshot.state = SearchState::Empty;
        assert_eq!(snapshot.headline(), "No results found");

        snapshot.state = SearchState::Loaded { has_more: false };
        snapshot.rows = vec![Movie::new(1, "Heat")];
        assert_eq!(snapshot.headline(), "Found 1 movie");

        snapshot.rows.push(Movie::new(2, "Ronin"));
        assert_eq!(snapshot.headline(), "Found 2 movies");

        snapshot.state = SearchState::Error {
            message: "Something went wrong.".to_string(),
        };
        assert_eq!(snapshot.headline(), "Search Movies");
    }

    #[test]
    fn test_state_serialization() {
        let json = serde_json::to_string(&SearchState::Loaded { has_more: true }).unwrap();
        assert_eq!(json, r#"{"state":"loaded","has_more":true}"#);

        let json = serde_json::to_string(&SearchState::Idle).unwrap();
        assert_eq!(json, r#"{"state":"idle"}"#);
    }

    #[tokio::test]
    async fn test_subscription_delivers_until_dropped() {
        let (tx, rx) = watch::channel(SearchSnapshot::default());
        let (seen_tx, mut seen_rx) = tokio::sync::mpsc::unbounded_channel();

        let subscription = Subscription::spawn(rx, move |snapshot| {
            let _ = seen_tx.send(snapshot.state.clone());
        });

        assert_eq!(seen_rx.recv().await, Some(SearchState::Idle));

        tx.send_replace(SearchSnapshot {
            state: SearchState::Initial,
            ..Default::default()
        });
        assert_eq!(seen_rx.recv().await, Some(SearchState::Initial));

        subscription.unsubscribe();
        tx.send_replace(SearchSnapshot {
            state: SearchState::Loading,
            ..Default::default()
        });

        // The callback (and its sender) is dropped with the aborted task
        assert_eq!(seen_rx.recv().await, None);
    }
}
