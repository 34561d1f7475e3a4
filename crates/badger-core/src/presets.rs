//! Named, persisted sequences.
//!
//! Every mutation rewrites the whole config file. Nothing is written when a
//! mutation is refused or only partly applicable.

use std::{collections::BTreeMap, path::Path};

use crate::{config::Config, errors::Error, sequence::Sequence, Result};

/// Preset name → sequence string.
pub type PresetStore = BTreeMap<String, String>;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved,
    /// An existing preset was kept because overwrite was declined.
    Kept,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DeleteOutcome {
    pub deleted: Vec<String>,
    pub missing: Vec<String>,
}

impl DeleteOutcome {
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }

    /// Error form of the missing names, for the caller's exit path.
    pub fn missing_error(&self) -> Option<Error> {
        match self.missing.as_slice() {
            [] => None,
            [one] => Some(Error::PresetNotFound(one.clone())),
            many => Some(Error::PresetsNotFound(many.to_vec())),
        }
    }
}

/// Store `sequence` under `name`.
///
/// If `name` already exists, `confirm(name, existing)` decides whether to
/// overwrite it.
pub fn save_preset(
    cfg: &mut Config,
    path: &Path,
    name: &str,
    sequence: &Sequence,
    confirm: impl FnOnce(&str, &str) -> Result<bool>,
) -> Result<SaveOutcome> {
    if let Some(existing) = cfg.presets.get(name) {
        if !confirm(name, existing)? {
            tracing::debug!(preset = name, "overwrite declined");
            return Ok(SaveOutcome::Kept);
        }
    }

    cfg.presets
        .insert(name.to_string(), sequence.as_str().to_string());
    cfg.save(path)?;
    tracing::info!(preset = name, sequence = %sequence, "preset saved");
    Ok(SaveOutcome::Saved)
}

/// Remove every name in `names` from the store.
///
/// Found names are removed in memory regardless; the file is only rewritten
/// when none were missing.
pub fn delete_presets(cfg: &mut Config, path: &Path, names: &[String]) -> Result<DeleteOutcome> {
    let mut outcome = DeleteOutcome::default();
    for name in names {
        if cfg.presets.remove(name).is_some() {
            outcome.deleted.push(name.clone());
        } else if !outcome.missing.contains(name) && !outcome.deleted.contains(name) {
            outcome.missing.push(name.clone());
        }
    }

    if outcome.is_complete() {
        cfg.save(path)?;
        tracing::info!(count = outcome.deleted.len(), "presets deleted");
    } else {
        tracing::debug!(missing = ?outcome.missing, "delete aborted, config not written");
    }
    Ok(outcome)
}

/// Human listing of the store.
pub fn format_presets(store: &PresetStore) -> String {
    if store.is_empty() {
        return "No saved presets.".to_string();
    }

    let width = store.keys().map(|k| k.chars().count()).max().unwrap_or(0);
    let mut out = String::from("Saved presets:");
    for (name, seq) in store {
        out.push('\n');
        out.push_str(&format!("{name:<width$} - {seq}"));
    }
    out
}

/// Pick the sequence to run.
///
/// `sequence` wins over `preset`; a stored preset is re-validated since the
/// file may have been edited by hand. With `skip_refund` a leading refund
/// step is dropped. An empty result is an error.
pub fn resolve_sequence(
    cfg: &Config,
    sequence: Option<&str>,
    preset: Option<&str>,
    skip_refund: bool,
) -> Result<Sequence> {
    let seq = match (sequence, preset) {
        (Some(raw), _) => Sequence::parse(raw)?,
        (None, Some(name)) => {
            let raw = cfg
                .presets
                .get(name)
                .filter(|s| !s.is_empty())
                .ok_or_else(|| Error::PresetNotFound(name.to_string()))?;
            Sequence::parse(raw)?
        }
        (None, None) => return Err(Error::EmptySequence),
    };

    let seq = if skip_refund {
        seq.without_refund()
    } else {
        seq
    };
    if seq.is_empty() {
        return Err(Error::EmptySequence);
    }
    Ok(seq)
}
