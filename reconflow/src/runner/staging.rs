//! Input staging for stages whose tools want a plain list file.
//!
//! The HTTP prober reads `host:port` pairs extracted from the port-scan
//! JSON-lines; the DAST scanner reads URLs extracted from the endpoint
//! JSON-lines. Staged lists are scratch files next to the artifacts and
//! are removed once the stage's process has exited.

use crate::errors::ReconError;
use crate::pipeline::StageId;
use crate::store::{ArtifactKind, ArtifactStore, Target};
use serde_json::Value;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

/// A staged input list; the file is removed on drop.
#[derive(Debug)]
pub struct StagedList {
    path: PathBuf,
    entries: usize,
}

impl StagedList {
    /// The staged file's path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns true if nothing was staged.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries == 0
    }
}

impl Drop for StagedList {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}

/// Prepares the staged input list a stage needs, if any.
pub(crate) fn prepare(
    stage: StageId,
    store: &ArtifactStore,
    target: &Target,
) -> Result<Option<StagedList>, ReconError> {
    match stage {
        StageId::HttpProbe => stage_host_ports(store, target).map(Some),
        StageId::DastScan => stage_endpoint_urls(store, target).map(Some),
        _ => Ok(None),
    }
}

/// Extracts sorted, de-duplicated `host:port` pairs from the port-scan
/// artifact into a scratch list. Undecodable lines are skipped.
pub fn stage_host_ports(store: &ArtifactStore, target: &Target) -> Result<StagedList, ReconError> {
    let raw = store.read(target, ArtifactKind::OpenPorts)?;

    let mut pairs = BTreeSet::new();
    for line in raw.lines().map(str::trim).filter(|line| !line.is_empty()) {
        let Ok(Value::Object(object)) = serde_json::from_str::<Value>(line) else {
            continue;
        };
        let host = object.get("host").and_then(Value::as_str);
        let port = object.get("port").and_then(Value::as_u64);
        if let (Some(host), Some(port)) = (host, port) {
            pairs.insert(format!("{host}:{port}"));
        }
    }

    write_list(
        store.root().join(format!("{target}_hostport.txt")),
        pairs.iter().map(String::as_str),
        pairs.len(),
    )
}

/// Extracts `url` fields from the endpoint artifact into a scratch list,
/// preserving discovery order. Undecodable lines are skipped.
pub fn stage_endpoint_urls(
    store: &ArtifactStore,
    target: &Target,
) -> Result<StagedList, ReconError> {
    let raw = store.read(target, ArtifactKind::Endpoints)?;

    let mut urls = Vec::new();
    for line in raw.lines().map(str::trim).filter(|line| !line.is_empty()) {
        let Ok(Value::Object(object)) = serde_json::from_str::<Value>(line) else {
            continue;
        };
        if let Some(url) = object.get("url").and_then(Value::as_str) {
            urls.push(url.to_string());
        }
    }

    let count = urls.len();
    write_list(
        store.root().join(format!("{target}_dast_urls.txt")),
        urls.iter().map(String::as_str),
        count,
    )
}

fn write_list<'a>(
    path: PathBuf,
    entries: impl Iterator<Item = &'a str>,
    count: usize,
) -> Result<StagedList, ReconError> {
    let mut contents = String::new();
    for entry in entries {
        contents.push_str(entry);
        contents.push('\n');
    }
    fs::write(&path, contents)?;

    Ok(StagedList {
        path,
        entries: count,
    })
}
