use std::fs;
use std::path::{Path, PathBuf};

use calc::Calculation;

use crate::{Error, Param, ParamCollection, ParamKind, ParamValue};

/// Outcome of a save sweep. Failures don't stop the sweep.
#[derive(Debug, Default)]
pub struct SaveReport {
    /// files written, in sweep order
    pub saved: Vec<PathBuf>,
    /// (parameter id, error) for every resource that couldn't be written
    pub failed: Vec<(String, Error)>,
}

impl SaveReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

// LOAD ////////////////////////
impl Param {
    /// Copy a value staged in `foreign` into this node and refresh its views.
    ///
    /// Returns false, leaving this node untouched, if `foreign` holds a variant
    /// this node can't take. Accepted combinations:
    /// - same kind: the value is copied;
    /// - file into object: the path is bound and any loaded object dropped;
    /// - object into file: the object's path is copied;
    /// - number into numbers: a single-element array;
    /// - collection into collection: visible children are staged from foreign
    ///   children with the same id, and `progress` counts one unit per match.
    pub fn load_resources(&mut self, foreign: &Param, progress: Option<&Calculation>) -> bool {
        let staged = match (self.value_mut(), foreign.value()) {
            (ParamValue::Collection(mine), ParamValue::Collection(theirs)) => {
                stage_children(mine, theirs, progress)
            }
            (ParamValue::Object(mine), ParamValue::Object(theirs)) => mine.copy_from(theirs),
            (ParamValue::Object(mine), ParamValue::File(Some(path))) => {
                mine.set_path(path.clone());
                true
            }
            (ParamValue::File(mine), ParamValue::Object(theirs)) => match theirs.path() {
                Some(path) => {
                    *mine = Some(path.to_path_buf());
                    true
                }
                None => false,
            },
            (ParamValue::NumberCollection(mine), ParamValue::Number(v)) => {
                *mine = vec![*v];
                true
            }
            (mine, theirs) if mine.kind() == theirs.kind() => {
                *mine = theirs.clone();
                true
            }
            _ => false,
        };
        if staged {
            self.update();
        } else {
            log::debug!(
                "not staging {} '{}' into {} '{}'",
                foreign.kind(),
                foreign.id(),
                self.kind(),
                self.id()
            );
        }
        staged
    }

    /// Read every visible resource that has a path but no object yet.
    /// Continues past failures; returns true only if every read succeeded.
    pub fn materialize_resources(&mut self) -> bool {
        match self.kind() {
            ParamKind::Collection => {
                let mut ok = true;
                if let Some(c) = self.collection_mut() {
                    for child in c.children.iter_mut().filter(|c| !c.is_hidden()) {
                        ok &= child.materialize_resources();
                    }
                }
                ok
            }
            ParamKind::Object => {
                let id = self.id().to_owned();
                let Ok(slot) = self.resource_mut() else {
                    return false;
                };
                if slot.path().is_none() || slot.object().is_some() {
                    return true;
                }
                if let Err(e) = slot.load() {
                    log::warn!("failed to load parameter '{id}': {}", error_chain(&e));
                    return false;
                }
                self.update();
                true
            }
            _ => true,
        }
    }
}

fn stage_children(
    mine: &mut ParamCollection,
    theirs: &ParamCollection,
    progress: Option<&Calculation>,
) -> bool {
    let matched = mine
        .visible()
        .filter(|child| theirs.get(child.id()).is_some())
        .count();
    if let Some(calc) = progress {
        calc.set_total_units(matched as u64);
    }
    let mut ok = true;
    for child in mine.children.iter_mut() {
        if child.is_hidden() {
            continue;
        }
        if let Some(source) = theirs.get(child.id()) {
            ok &= child.load_resources(source, None);
            if let Some(calc) = progress {
                calc.increment();
            }
        }
    }
    ok
}

// SAVE ////////////////////////
impl Param {
    /// Write every materialized resource in this subtree, skipping hidden children.
    ///
    /// Each resource goes to `dir/<param id>/`, or straight into `dir` when
    /// `override_subdirectory` is set. Nothing in memory counts as success.
    /// Returns false if any write failed; the rest are still attempted.
    pub fn save_resources(&mut self, dir: &Path, override_subdirectory: bool) -> bool {
        self.save_all(dir, override_subdirectory).is_success()
    }

    /// Like [`Param::save_resources`], with the details.
    pub fn save_all(&mut self, dir: &Path, override_subdirectory: bool) -> SaveReport {
        let mut report = SaveReport::default();
        self.save_into(dir, override_subdirectory, &mut report);
        report
    }

    fn save_into(&mut self, dir: &Path, override_subdirectory: bool, report: &mut SaveReport) {
        match self.kind() {
            ParamKind::Collection => {
                if let Some(c) = self.collection_mut() {
                    for child in c.children.iter_mut() {
                        if child.is_hidden() {
                            log::trace!("skipping hidden parameter '{}'", child.id());
                            continue;
                        }
                        child.save_into(dir, override_subdirectory, report);
                    }
                }
            }
            ParamKind::Object => match self.save_resource(dir, override_subdirectory) {
                Ok(Some(path)) => report.saved.push(path),
                Ok(None) => (),
                Err(e) => {
                    log::warn!("failed to save parameter '{}': {}", self.id(), error_chain(&e));
                    report.failed.push((self.id().to_owned(), e));
                }
            },
            _ => (),
        }
    }

    /// Write this node's resource, if it holds one in memory.
    fn save_resource(
        &mut self,
        dir: &Path,
        override_subdirectory: bool,
    ) -> Result<Option<PathBuf>, Error> {
        let id = self.id().to_owned();
        let slot = self.resource_mut()?;
        if slot.object().is_none() {
            return Ok(None);
        }
        if slot.codec().is_none() {
            return Err(Error::NoCodec);
        }
        let dir = if override_subdirectory {
            dir.to_path_buf()
        } else {
            dir.join(&id)
        };
        fs::create_dir_all(&dir).map_err(|e| Error::CreateDir(dir.clone(), e))?;
        let written = slot.save(&dir, &id)?;
        self.update();
        Ok(written)
    }
}

// EXPLICIT ACCESS /////////////
impl ParamCollection {
    /// Save one child by id, whether or not it is hidden.
    pub fn save_by_id(
        &mut self,
        id: &str,
        dir: &Path,
        override_subdirectory: bool,
    ) -> Result<SaveReport, Error> {
        let child = self
            .get_mut(id)
            .ok_or_else(|| Error::NotFound(id.to_owned()))?;
        Ok(child.save_all(dir, override_subdirectory))
    }

    /// Stage one child by id, whether or not it is hidden.
    pub fn load_by_id(
        &mut self,
        id: &str,
        foreign: &Param,
        progress: Option<&Calculation>,
    ) -> Result<bool, Error> {
        let child = self
            .get_mut(id)
            .ok_or_else(|| Error::NotFound(id.to_owned()))?;
        Ok(child.load_resources(foreign, progress))
    }
}

fn error_chain(e: &dyn std::error::Error) -> String {
    let mut msg = e.to_string();
    let mut source = e.source();
    while let Some(cause) = source {
        msg.push_str(": ");
        msg.push_str(&cause.to_string());
        source = cause.source();
    }
    msg
}
