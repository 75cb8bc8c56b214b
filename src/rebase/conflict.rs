//! Automatic reconciliation of conflicting JSON manifests.
//!
//! Editing an early step often changes a manifest such as `package.json`
//! that later steps touch too, so replaying those steps conflicts. Both
//! versions are recovered from git's inline markers, parsed, and merged
//! key by key with the replayed commit's values winning.

use crate::error::{Error, Result};
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;
use tracing::info;

/// The two competing versions of a conflicted file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConflictSides {
    /// Version already in the rewritten history (`<<<<<<<` side)
    pub ours: String,
    /// Version from the commit being replayed (`>>>>>>>` side)
    pub theirs: String,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Section {
    Common,
    Ours,
    Base,
    Theirs,
}

/// Split text containing conflict markers into both sides.
///
/// Every conflict region is handled, however many there are; text outside
/// regions goes to both sides. Returns `None` when there are no markers.
pub fn split_conflict(text: &str) -> Result<Option<ConflictSides>> {
    let mut ours = String::new();
    let mut theirs = String::new();
    let mut section = Section::Common;
    let mut found = false;

    for line in text.split_inclusive('\n') {
        let bare = line.trim_end_matches(['\n', '\r']);
        match section {
            Section::Common if bare.starts_with("<<<<<<<") => {
                section = Section::Ours;
                found = true;
            }
            Section::Ours if bare.starts_with("|||||||") => section = Section::Base,
            Section::Ours | Section::Base if bare == "=======" => section = Section::Theirs,
            Section::Theirs if bare.starts_with(">>>>>>>") => section = Section::Common,
            Section::Common => {
                ours.push_str(line);
                theirs.push_str(line);
            }
            Section::Ours => ours.push_str(line),
            Section::Base => {}
            Section::Theirs => theirs.push_str(line),
        }
    }

    if section != Section::Common {
        return Err(Error::RebaseConflict(
            "conflict markers are not terminated".to_string(),
        ));
    }

    Ok(found.then_some(ConflictSides { ours, theirs }))
}

/// Deep-merge two JSON documents; `theirs` wins on scalar clashes
pub fn merge_values(ours: Value, theirs: Value) -> Value {
    match (ours, theirs) {
        (Value::Object(ours), Value::Object(theirs)) => Value::Object(merge_maps(ours, theirs)),
        (_, theirs) => theirs,
    }
}

fn merge_maps(mut ours: Map<String, Value>, theirs: Map<String, Value>) -> Map<String, Value> {
    for (key, their_value) in theirs {
        let merged = match ours.remove(&key) {
            Some(our_value) => merge_values(our_value, their_value),
            None => their_value,
        };
        ours.insert(key, merged);
    }
    ours
}

/// Resolve a conflicted JSON file's text into the merged document
pub fn reconcile_json(text: &str) -> Result<String> {
    let Some(sides) = split_conflict(text)? else {
        return Ok(text.to_string());
    };

    let parse = |side: &str, label: &str| -> Result<Value> {
        serde_json::from_str(side)
            .map_err(|e| Error::RebaseConflict(format!("{label} side is not valid JSON: {e}")))
    };
    let ours = parse(&sides.ours, "our")?;
    let theirs = parse(&sides.theirs, "their")?;

    if !ours.is_object() || !theirs.is_object() {
        return Err(Error::RebaseConflict(
            "expected both sides to be JSON objects".to_string(),
        ));
    }

    let merged = merge_values(ours, theirs);
    let mut out = serde_json::to_string_pretty(&merged)
        .map_err(|e| Error::Manifest(format!("failed to serialize merged manifest: {e}")))?;
    out.push('\n');
    Ok(out)
}

/// Rewrite a conflicted manifest on disk with its reconciled content
pub fn resolve_manifest(path: &Path) -> Result<()> {
    let text = fs::read_to_string(path)?;
    let merged = reconcile_json(&text).map_err(|e| match e {
        Error::RebaseConflict(msg) => Error::RebaseConflict(format!("{}: {msg}", path.display())),
        other => other,
    })?;
    fs::write(path, merged)?;
    info!(path = %path.display(), "Reconciled manifest conflict");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const CONFLICTED: &str = r#"{
  "name": "app",
<<<<<<< HEAD
  "version": "1.0.0",
=======
  "version": "1.1.0",
>>>>>>> 3333333 (Step 2.1: Add b)
  "dependencies": {
<<<<<<< HEAD
    "left-pad": "1.0.0"
=======
    "left-pad": "1.0.0",
    "react": "18.0.0"
>>>>>>> 3333333 (Step 2.1: Add b)
  }
}
"#;

    #[test]
    fn test_split_handles_multiple_regions() {
        let sides = split_conflict(CONFLICTED).unwrap().unwrap();
        assert!(sides.ours.contains("\"1.0.0\""));
        assert!(!sides.ours.contains("react"));
        assert!(sides.theirs.contains("\"1.1.0\""));
        assert!(sides.theirs.contains("react"));
        assert!(!sides.ours.contains("<<<<<<<"));
        assert!(!sides.theirs.contains(">>>>>>>"));
    }

    #[test]
    fn test_split_without_markers_is_none() {
        assert!(split_conflict("{\"a\": 1}\n").unwrap().is_none());
    }

    #[test]
    fn test_split_skips_diff3_base_section() {
        let text = "<<<<<<< HEAD\nours\n||||||| base\nbase\n=======\ntheirs\n>>>>>>> abc\n";
        let sides = split_conflict(text).unwrap().unwrap();
        assert_eq!(sides.ours, "ours\n");
        assert_eq!(sides.theirs, "theirs\n");
    }

    #[test]
    fn test_split_rejects_unterminated_region() {
        let err = split_conflict("<<<<<<< HEAD\nours\n=======\ntheirs\n").unwrap_err();
        assert!(matches!(err, Error::RebaseConflict(_)));
    }

    #[test]
    fn test_reconcile_prefers_replayed_values() {
        let merged: Value = serde_json::from_str(&reconcile_json(CONFLICTED).unwrap()).unwrap();
        assert_eq!(
            merged,
            json!({
                "name": "app",
                "version": "1.1.0",
                "dependencies": { "left-pad": "1.0.0", "react": "18.0.0" }
            })
        );
    }

    #[test]
    fn test_merge_keeps_keys_only_on_our_side() {
        let merged = merge_values(
            json!({ "scripts": { "build": "tsc", "lint": "eslint" } }),
            json!({ "scripts": { "build": "vite build" } }),
        );
        assert_eq!(
            merged,
            json!({ "scripts": { "build": "vite build", "lint": "eslint" } })
        );
    }

    #[test]
    fn test_reconcile_rejects_non_json_sides() {
        let text = "<<<<<<< HEAD\nnot json\n=======\n{}\n>>>>>>> abc\n";
        assert!(matches!(
            reconcile_json(text).unwrap_err(),
            Error::RebaseConflict(_)
        ));
    }

    #[test]
    fn test_reconcile_rejects_non_object_root() {
        let text = "<<<<<<< HEAD\n[1]\n=======\n[2]\n>>>>>>> abc\n";
        assert!(matches!(
            reconcile_json(text).unwrap_err(),
            Error::RebaseConflict(_)
        ));
    }
}
