//! Artifact persistence under `<directory>/visualization/`.
//!
//! One logical chart name owns up to three files: the specification
//! (`.json`), the rendered chart (`.png`/`.html`) and the insight
//! summary (`.md`). Generate-mode naming never silently overwrites an
//! existing bundle; update-mode targets the exact name on purpose.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::serializer;
use crate::spec::{InsightRecord, SpecDocument};

pub const ARTIFACT_SUBDIR: &str = "visualization";
const COLLISION_SUFFIX: &str = "_new";

#[derive(Debug, Clone)]
pub struct ArtifactStore {
  root: PathBuf,
}

impl ArtifactStore {
  /// Open (creating if absent) the artifact directory under `directory`.
  pub fn new(directory: &Path) -> Result<Self> {
    let root = directory.join(ARTIFACT_SUBDIR);
    fs::create_dir_all(&root)?;
    Ok(Self { root })
  }

  pub fn root(&self) -> &Path {
    &self.root
  }

  pub fn path_for(&self, name: &str, extension: &str) -> PathBuf {
    self.root.join(format!("{name}.{extension}"))
  }

  /// Pick the base name for a bundle.
  ///
  /// Generate mode treats a name as taken while either its spec
  /// document or the requested chart file exists, and appends `_new`
  /// until both are free. The spec probe covers orphaned bundles (a
  /// render failure leaves the `.json` behind) and bundles rendered
  /// with a different chart extension. Update mode returns the exact
  /// name (intentional overwrite).
  pub fn resolve_name(&self, base: &str, extension: &str, update: bool) -> String {
    if update {
      return base.to_string();
    }
    let mut candidate = base.to_string();
    while self.path_for(&candidate, "json").exists()
      || self.path_for(&candidate, extension).exists()
    {
      candidate.push_str(COLLISION_SUFFIX);
    }
    candidate
  }

  pub fn save_spec(&self, name: &str, document: &SpecDocument) -> Result<PathBuf> {
    let path = self.path_for(name, "json");
    fs::write(&path, serializer::to_json(document)?)?;
    tracing::debug!(path = %path.display(), "spec persisted");
    Ok(path)
  }

  /// Load a stored spec document; a missing file is the explicit
  /// update-target-missing error, not a generic I/O failure.
  pub fn load_spec(&self, name: &str) -> Result<SpecDocument> {
    let path = self.path_for(name, "json");
    if !path.exists() {
      return Err(Error::UpdateTargetMissing { name: name.to_string() });
    }
    serializer::from_json(&fs::read_to_string(&path)?)
  }

  pub fn save_chart(&self, name: &str, extension: &str, bytes: &[u8]) -> Result<PathBuf> {
    let path = self.path_for(name, extension);
    fs::write(&path, bytes)?;
    tracing::debug!(path = %path.display(), "chart persisted");
    Ok(path)
  }

  /// Write the `.md` summary: a titled, 1-based numbered list. Nothing
  /// is written when there are no insights.
  pub fn save_insight_summary(
    &self,
    name: &str,
    title: &str,
    insights: &[InsightRecord],
  ) -> Result<Option<(PathBuf, String)>> {
    if insights.is_empty() {
      return Ok(None);
    }

    let mut markdown = format!("# {title}\n\n");
    for record in insights {
      markdown.push_str(&format!("{}. {}\n", record.ordinal, record.content));
    }

    let path = self.path_for(name, "md");
    fs::write(&path, &markdown)?;
    Ok(Some((path, markdown)))
  }
}
