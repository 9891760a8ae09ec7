//! Splits a feed snapshot into what a display shows.

use chama_types::{CallRecord, FeedSnapshot};
use serde::{Deserialize, Serialize};

/// The call on screen and the calls listed beside it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallSelection {
    pub current: Option<CallRecord>,
    pub history: Vec<CallRecord>,
}

/// Element 0 is the current call; everything after it is history, in the
/// order the store returned it. Nothing is filtered or reordered here.
pub fn select_calls(snapshot: FeedSnapshot) -> CallSelection {
    let mut calls = snapshot.into_calls().into_iter();
    let current = calls.next();
    CallSelection {
        current,
        history: calls.collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, seq: i64) -> CallRecord {
        CallRecord {
            id: id.to_string(),
            patient_name: format!("Paciente {id}"),
            room_number: "1".to_string(),
            professional_name: None,
            seq,
            created_at: "2024-05-01 09:00:00".to_string(),
        }
    }

    #[test]
    fn empty_snapshot_has_no_current() {
        let selection = select_calls(FeedSnapshot::default());
        assert_eq!(selection.current, None);
        assert!(selection.history.is_empty());
    }

    #[test]
    fn single_record_is_current_with_empty_history() {
        let selection = select_calls(vec![record("a", 1)].into());
        assert_eq!(selection.current, Some(record("a", 1)));
        assert!(selection.history.is_empty());
    }

    #[test]
    fn selection_preserves_snapshot_exactly() {
        for k in 0..=6 {
            let calls: Vec<CallRecord> = (0..k)
                .map(|i| record(&format!("id{i}"), 100 - i as i64))
                .collect();
            let selection = select_calls(FeedSnapshot::new(calls.clone()));

            assert_eq!(selection.current, calls.first().cloned());
            let expected_history: Vec<CallRecord> = calls.iter().skip(1).cloned().collect();
            assert_eq!(selection.history, expected_history);
        }
    }

    #[test]
    fn selector_does_not_reorder() {
        // Deliberately out of seq order: the selector trusts the store.
        let calls = vec![record("b", 1), record("a", 5), record("c", 3)];
        let selection = select_calls(FeedSnapshot::new(calls));
        assert_eq!(selection.current.unwrap().id, "b");
        let ids: Vec<&str> = selection.history.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, ["a", "c"]);
    }
}
