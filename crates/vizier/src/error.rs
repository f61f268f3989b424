use thiserror::Error;

/// Failure taxonomy for one pipeline invocation.
///
/// Every variant eventually lands in the `error` field of the single
/// response object; nothing here is allowed to escape `main` as a panic.
#[derive(Debug, Error)]
pub enum Error {
  /// The external generation capability returned no usable chart plan.
  /// No artifacts have been written when this is raised.
  #[error("chart generation failed: {0}")]
  Generation(String),

  /// Drawing or document synthesis failed. The spec JSON may already be
  /// on disk at this point; generate is deliberately not atomic.
  #[error("chart rendering failed: {0}")]
  Render(String),

  /// An update was requested against a base name that has no stored
  /// specification. Distinct from plain I/O failures so callers can
  /// tell "you never generated this" from "the disk is broken".
  #[error("no stored chart specification named '{name}' to update")]
  UpdateTargetMissing { name: String },

  #[error("request is not valid: {0}")]
  BadRequest(String),

  #[error(transparent)]
  Io(#[from] std::io::Error),

  #[error(transparent)]
  Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
