//! Interpretation of `GET /history/{prompt_id}` bodies.
//!
//! ComfyUI answers `{}` while a prompt is queued or running, and
//! `{"<prompt_id>": {"outputs": {...}, "status": {...}}}` once it has
//! finished, successfully or not.

use serde::Deserialize;
use serde_json::Value;

/// Reference to one file written by a SaveImage node.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OutputImage {
    pub filename: String,
    #[serde(default)]
    pub subfolder: String,
    #[serde(rename = "type", default = "default_folder_type")]
    pub folder_type: String,
}

fn default_folder_type() -> String {
    "output".to_string()
}

/// Where a prompt stands according to its history entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryState {
    /// No history entry yet.
    Pending,
    /// Finished with at least one image.
    Completed(OutputImage),
    /// Finished without an image, or with an execution error.
    Failed(String),
}

/// Classify a history body for `prompt_id`.
///
/// Images from `preferred_node` win; otherwise the first image of any
/// node is used.
pub fn parse_history(history: &Value, prompt_id: &str, preferred_node: &str) -> HistoryState {
    let Some(entry) = history.get(prompt_id) else {
        return HistoryState::Pending;
    };

    if let Some(message) = execution_error(entry) {
        return HistoryState::Failed(message);
    }

    let outputs = entry.get("outputs").and_then(Value::as_object);
    let Some(outputs) = outputs else {
        return HistoryState::Failed("history entry has no outputs".into());
    };

    let preferred = outputs.get(preferred_node).and_then(first_image);
    let any = || outputs.values().find_map(first_image);

    match preferred.or_else(any) {
        Some(image) => HistoryState::Completed(image),
        None if is_completed(entry) => {
            HistoryState::Failed("prompt completed without producing an image".into())
        }
        // Entry written but outputs not flushed yet.
        None => HistoryState::Pending,
    }
}

fn first_image(node_output: &Value) -> Option<OutputImage> {
    node_output
        .get("images")?
        .as_array()?
        .iter()
        .find_map(|img| serde_json::from_value::<OutputImage>(img.clone()).ok())
}

fn is_completed(entry: &Value) -> bool {
    entry
        .pointer("/status/completed")
        .and_then(Value::as_bool)
        .unwrap_or(true)
}

/// Extract the exception message of an `execution_error` status, if any.
fn execution_error(entry: &Value) -> Option<String> {
    let status = entry.get("status")?;
    if status.get("status_str").and_then(Value::as_str) != Some("error") {
        return None;
    }

    let detail = status
        .get("messages")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .find_map(|msg| {
            let pair = msg.as_array()?;
            if pair.first()?.as_str()? != "execution_error" {
                return None;
            }
            let data = pair.get(1)?;
            let kind = data.get("exception_type").and_then(Value::as_str).unwrap_or("Error");
            let text = data
                .get("exception_message")
                .and_then(Value::as_str)
                .unwrap_or("unknown error");
            Some(format!("{kind}: {}", text.trim()))
        });

    Some(detail.unwrap_or_else(|| "execution failed".to_string()))
}
