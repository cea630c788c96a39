//! Assembly of the distributable package.
//!
//! An [`ArtifactManifest`] is executed step by step against the staging
//! directory. Steps with [`OverwritePolicy::SkipIfExists`] are created once and
//! left alone afterwards; [`OverwritePolicy::AlwaysRefresh`] steps replace
//! their destination on every run. Nothing already written is rolled back when
//! a later step fails.

pub mod copy;
pub mod manifest;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::{BuildConfiguration, LayoutMode};

pub use manifest::{ArtifactManifest, CopyKind, CopyStep, OverwritePolicy, Stage};

#[derive(Debug, Error)]
pub enum CopyError {
  #[error("{stage}: expected source '{path}' does not exist")]
  MissingSource { stage: Stage, path: PathBuf },

  #[error("failed to write '{path}'")]
  Io {
    path: PathBuf,
    #[source]
    source: io::Error,
  },
}

impl CopyError {
  fn io(path: &Path) -> impl FnOnce(io::Error) -> Self + '_ {
    move |source| Self::Io {
      path: path.to_path_buf(),
      source,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StepOutcome {
  /// Destination was absent and has been created.
  Copied,
  /// Destination already existed and was left untouched.
  Skipped,
  /// Destination was replaced.
  Refreshed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepReport {
  pub stage: Stage,
  pub destination: PathBuf,
  pub outcome: StepOutcome,
  /// Prune entries actually removed.
  #[serde(skip_serializing_if = "Vec::is_empty")]
  pub pruned: Vec<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AssemblyReport {
  pub staging_dir: PathBuf,
  pub steps: Vec<StepReport>,
}

impl AssemblyReport {
  pub fn count(&self, outcome: StepOutcome) -> usize {
    self.steps.iter().filter(|s| s.outcome == outcome).count()
  }

  pub fn copied(&self) -> usize {
    self.count(StepOutcome::Copied)
  }

  pub fn skipped(&self) -> usize {
    self.count(StepOutcome::Skipped)
  }

  pub fn refreshed(&self) -> usize {
    self.count(StepOutcome::Refreshed)
  }
}

/// Executes manifests against one configuration's staging directory.
pub struct ArtifactAssembler<'a> {
  config: &'a BuildConfiguration,
}

impl<'a> ArtifactAssembler<'a> {
  pub fn new(config: &'a BuildConfiguration) -> Self {
    Self { config }
  }

  /// Run every step in order, stopping at the first failure.
  pub fn assemble(&self, manifest: &ArtifactManifest) -> Result<AssemblyReport, CopyError> {
    let staging = &manifest.staging_dir;
    fs::create_dir_all(staging).map_err(CopyError::io(staging))?;

    info!(
      staging = %staging.display(),
      steps = manifest.steps.len(),
      layout = ?self.config.layout,
      "assembling package"
    );

    let mut report = AssemblyReport {
      staging_dir: staging.clone(),
      steps: Vec::with_capacity(manifest.steps.len()),
    };
    for step in &manifest.steps {
      report.steps.push(self.execute(staging, step)?);
    }

    info!(
      copied = report.copied(),
      skipped = report.skipped(),
      refreshed = report.refreshed(),
      "package assembled"
    );
    Ok(report)
  }

  fn execute(&self, staging: &Path, step: &CopyStep) -> Result<StepReport, CopyError> {
    if !step.source.exists() {
      return Err(CopyError::MissingSource {
        stage: step.stage,
        path: step.source.clone(),
      });
    }

    if let Some(parent) = step.destination.parent() {
      fs::create_dir_all(parent).map_err(CopyError::io(parent))?;
    }

    let existed = copy::path_occupied(&step.destination);
    let outcome = match (step.policy, existed) {
      (OverwritePolicy::SkipIfExists, true) => {
        debug!(stage = %step.stage, path = %step.destination.display(), "already present, skipping");
        return Ok(StepReport {
          stage: step.stage,
          destination: step.destination.clone(),
          outcome: StepOutcome::Skipped,
          pruned: Vec::new(),
        });
      }
      (OverwritePolicy::AlwaysRefresh, true) => {
        copy::remove_path(&step.destination).map_err(CopyError::io(&step.destination))?;
        StepOutcome::Refreshed
      }
      (_, false) => StepOutcome::Copied,
    };

    let place: fn(&Path, &Path, CopyKind) -> io::Result<()> = match self.config.layout {
      LayoutMode::Copy => copy::copy_entry,
      LayoutMode::Link => copy::link_entry,
    };
    place(&step.source, &step.destination, step.kind).map_err(CopyError::io(&step.destination))?;
    debug!(
      stage = %step.stage,
      from = %step.source.display(),
      to = %step.destination.display(),
      "placed"
    );

    let mut pruned = Vec::new();
    if self.config.layout == LayoutMode::Copy {
      for rel in &step.prune {
        if copy::prune(staging, rel).map_err(CopyError::io(&staging.join(rel)))? {
          pruned.push(rel.clone());
        }
      }
    }

    Ok(StepReport {
      stage: step.stage,
      destination: step.destination.clone(),
      outcome,
      pruned,
    })
  }
}
