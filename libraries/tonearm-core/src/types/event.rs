/// Events emitted by the engine for UI consumers
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Maximum number of per-file errors carried in a `Completed` event
///
/// The full error list stays in the `ScanReport`; event payloads are capped
/// for UI display with a summary line for the remainder.
pub const EVENT_ERROR_CAP: usize = 25;

/// Typed event stream produced by the scan orchestrator
///
/// Consumers subscribe via a broadcast channel; a slow consumer may miss
/// intermediate `Progress` events but `Started`/`Completed` bracket every
/// scan, and `Completed` is only sent after all store writes have landed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ScanEvent {
    /// A scan entered the enumerating stage
    ScanStarted,

    /// Throttled progress update; `scanned_files` is monotonic per scan
    #[serde(rename_all = "camelCase")]
    ScanProgress {
        scanned_files: usize,
        total_files: usize,
        current_file: Option<PathBuf>,
    },

    /// Scan finished; per-file errors are capped at `EVENT_ERROR_CAP`
    #[serde(rename_all = "camelCase")]
    ScanCompleted { errors: Vec<String> },

    /// Catastrophic scan failure (per-file errors never produce this)
    #[serde(rename_all = "camelCase")]
    ScanError { error: String },

    /// Settings were mutated via a command; emitted synchronously
    SettingsChanged,
}

impl ScanEvent {
    /// Build a `ScanCompleted` event from a full error list, applying the cap
    pub fn completed(errors: &[(PathBuf, String)]) -> Self {
        let mut capped: Vec<String> = errors
            .iter()
            .take(EVENT_ERROR_CAP)
            .map(|(path, msg)| format!("{}: {}", path.display(), msg))
            .collect();
        if errors.len() > EVENT_ERROR_CAP {
            capped.push(format!(
                "... and {} more errors",
                errors.len() - EVENT_ERROR_CAP
            ));
        }
        Self::ScanCompleted { errors: capped }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completed_event_caps_error_list() {
        let errors: Vec<(PathBuf, String)> = (0..30)
            .map(|i| (PathBuf::from(format!("/m/{i}.mp3")), "bad header".to_string()))
            .collect();

        let ScanEvent::ScanCompleted { errors: capped } = ScanEvent::completed(&errors) else {
            panic!("expected ScanCompleted");
        };
        assert_eq!(capped.len(), EVENT_ERROR_CAP + 1);
        assert!(capped.last().unwrap().contains("5 more"));
    }

    #[test]
    fn completed_event_without_errors_is_empty() {
        let ScanEvent::ScanCompleted { errors } = ScanEvent::completed(&[]) else {
            panic!("expected ScanCompleted");
        };
        assert!(errors.is_empty());
    }
}
