use std::fmt::{self, Display, Formatter};

/// Crate-wide error taxonomy (see the error handling design notes).
///
/// Categories 3 and 4 (inference/positive-information contradictions) are
/// usually resolved in place by the elimination machinery and recorded as a
/// per-order note rather than raised here; the variants below exist so that
/// a handler can still surface one explicitly when the contradiction can't
/// be locally repaired.
#[derive(Debug)]
pub enum EngineError {
	/// Category 1: surfaced from the driver boundary (connection dropped, websocket failure).
	Transport(String),
	/// Category 2: unknown event type or malformed JSON field.
	Protocol(String),
	/// Category 3: a candidate set was emptied by convention narrowing and had to be restored.
	InferenceContradiction { order: usize, note: String },
	/// Category 4: a touch/no-touch disagreed with existing possibilities.
	PositiveContradiction { order: usize, note: String },
	/// Category 5: no residue table / clue scheme exists for this variant shape.
	UnimplementedVariant(String),
	/// Category 6: no safe action exists; the policy made a deliberate sacrifice.
	ForcedLoss(String),
}

impl Display for EngineError {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			EngineError::Transport(msg) => write!(f, "transport error: {msg}"),
			EngineError::Protocol(msg) => write!(f, "protocol violation: {msg}"),
			EngineError::InferenceContradiction { order, note } => write!(f, "inference contradiction at order {order}: {note}"),
			EngineError::PositiveContradiction { order, note } => write!(f, "positive-information contradiction at order {order}: {note}"),
			EngineError::UnimplementedVariant(name) => write!(f, "unimplemented variant combination: {name}"),
			EngineError::ForcedLoss(msg) => write!(f, "forced loss, sacrificing: {msg}"),
		}
	}
}

impl std::error::Error for EngineError {}

impl From<serde_json::Error> for EngineError {
	fn from(err: serde_json::Error) -> Self {
		EngineError::Protocol(err.to_string())
	}
}

impl From<reqwest::Error> for EngineError {
	fn from(err: reqwest::Error) -> Self {
		EngineError::Transport(err.to_string())
	}
}

impl From<tokio_tungstenite::tungstenite::Error> for EngineError {
	fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
		EngineError::Transport(err.to_string())
	}
}

impl From<std::io::Error> for EngineError {
	fn from(err: std::io::Error) -> Self {
		EngineError::Transport(err.to_string())
	}
}
