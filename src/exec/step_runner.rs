use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use colored::Colorize;

use calc::Calculation;
use param::{Codecs, Param, ParamKind, ParamValue, SaveReport, ID_PATH_DELIM};

use crate::algorithms;
use crate::fs::Fs;
use crate::manifest::StepSpec;
use crate::settings::Settings;
use crate::ui::Ui;

use super::{poller, Error, Errors};

/// `StepRunner` is the struct that actually runs a pipeline.
///
/// For each step it builds the algorithm's parameter trees, stages the values
/// the manifest (and the command line) provide, and checks that every
/// required input is bound. Then it runs the algorithm while a poller thread
/// prints its progress, and saves whatever the outputs hold into the step's
/// directory. A failing step is recorded and the next one still runs.
pub struct StepRunner<'a> {
    /// codecs handed to every parameter tree
    codecs: Codecs,
    /// (input id, text value) from `--set`
    overrides: &'a [(String, String)],
    /// write outputs straight into the step dir
    flat: bool,
    dry_run: bool,
    interval: Duration,
    /// Filesystem interface
    fs: Fs,
    /// User interface
    ui: Ui,
}

impl<'a> StepRunner<'a> {
    /// Create a new `StepRunner`.
    pub fn new(settings: &'a Settings, codecs: Codecs, fs: Fs, ui: Ui) -> Self {
        Self {
            codecs,
            overrides: &settings.overrides,
            flat: settings.flat,
            dry_run: settings.dry_run,
            interval: settings.interval,
            fs,
            ui,
        }
    }

    pub fn run(&mut self, steps: &[&StepSpec]) -> Result<()> {
        debug_assert!(!steps.is_empty());

        let mut errors = Errors::default();
        for step in steps {
            self.ui.start_timer();
            eprintln!("{} {}", "STEP".green(), step.name);
            match self.run_step(step) {
                Ok(()) => {
                    self.ui.print_elapsed("Step execution");
                    eprintln!("{} {}\n", "COMPLETED".green(), step.name);
                }
                Err(e) => {
                    eprintln!("{} {}\n", "FAILED".red(), step.name);
                    errors.add_context(e, format!("in step '{}'", step.name));
                }
            }
        }
        errors.print_recap("running pipeline")?;

        if self.dry_run {
            eprintln!("{}", "Dry run complete; nothing was run.".green());
        } else {
            eprintln!("{}\n", "Completed pipeline.".green());
        }
        Ok(())
    }

    fn run_step(&self, step: &StepSpec) -> Result<()> {
        let algorithm = algorithms::lookup(&step.algorithm)?;
        let calc = Calculation::root(step.name.as_str());

        let mut inputs = algorithm.inputs(&self.codecs)?;
        let mut outputs = algorithm.outputs(&self.codecs)?;
        inputs.seal();
        outputs.seal();

        self.stage_inputs(step, &mut inputs, &calc)
            .context("while staging inputs")?;
        algorithms::check_required(algorithm.as_ref(), &inputs)?;
        self.ui.print_inputs("inputs:", &inputs);

        if self.dry_run {
            return Ok(());
        }

        self.name_outputs(step, &mut outputs)?;
        let Some(dir) = self.prepare_step_dir(&step.name)? else {
            return Ok(());
        };

        log::info!("running algorithm '{}' for step '{}'", algorithm.name(), step.name);
        poller::watch(&calc, self.interval, || {
            algorithm.run(&mut inputs, &mut outputs, &calc)
        })
        .context("while running algorithm")?;

        let report = self.save_outputs(step, &mut outputs, &dir);
        self.ui.print_outputs("outputs:", &outputs);
        for path in &report.saved {
            self.ui.verbose_msg(&format!(" - {}", path.display()));
        }
        if !report.is_success() {
            let failed: Vec<_> = report.failed.iter().map(|(id, _)| id.as_str()).collect();
            return Err(Error::SaveFailed(step.name.clone(), failed.join(", ")).into());
        }
        Ok(())
    }

    /// Stage manifest values, with `--set` overrides taking precedence,
    /// then apply the manifest's labels and visibility.
    fn stage_inputs(&self, step: &StepSpec, inputs: &mut Param, calc: &Calculation) -> Result<()> {
        let mut staged = step.staged_inputs(&self.codecs)?;
        for (id, text) in self.overrides {
            let Some(kind) = inputs.find(id).map(Param::kind) else {
                log::debug!("step '{}' has no input '{id}'; ignoring override", step.name);
                continue;
            };
            let value = match kind {
                // objects are overridden with the path to read them from:
                ParamKind::Object => ParamValue::File(Some(PathBuf::from(text))),
                kind => ParamValue::parse(kind, text)?,
            };
            staged.retain(|p| p.id() != id);
            staged.push(Param::from_value(id.as_str(), value));
        }
        let foreign = foreign_tree(&step.name, staged)?;

        let stage = calc.child("stage");
        if !inputs.load_resources(&foreign, Some(&stage)) {
            log::warn!("some staged values of step '{}' didn't fit their inputs", step.name);
        }
        stage.detach();

        for spec in &step.inputs {
            if let Some(param) = inputs.find_mut(&spec.id) {
                if let Some(label) = &spec.label {
                    param.set_label(label.as_str());
                }
                if spec.hidden {
                    param.set_hidden(true);
                }
            }
        }
        Ok(())
    }

    fn name_outputs(&self, step: &StepSpec, outputs: &mut Param) -> Result<()> {
        for spec in &step.outputs {
            let param = outputs
                .find_mut(&spec.id)
                .ok_or_else(|| Error::UnknownOutput(step.name.clone(), spec.id.clone()))?;
            if let Some(file) = &spec.file {
                param.resource_mut()?.set_file_name(file);
            }
        }
        Ok(())
    }

    /// Create an empty step directory, asking before replacing old results.
    /// Returns `None` if the user declined.
    fn prepare_step_dir(&self, step: &str) -> Result<Option<PathBuf>> {
        let dir = self.fs.step_dir(step);
        if self.fs.has_entries(&dir)? {
            let prompt = format!("Output directory {dir:?} is not empty. Replace its contents?");
            if !self.ui.confirm(&prompt)? {
                eprintln!("Skipping step '{step}'.");
                return Ok(None);
            }
            self.fs.delete_dir(&dir)?;
        }
        self.fs.create_dir(&dir)?;
        Ok(Some(dir))
    }

    /// Save-all sweep, plus hidden outputs the manifest asks for by name.
    fn save_outputs(&self, step: &StepSpec, outputs: &mut Param, dir: &Path) -> SaveReport {
        let mut report = outputs.save_all(dir, self.flat);
        for spec in &step.outputs {
            let hidden = outputs.find(&spec.id).map_or(false, Param::is_hidden);
            if !hidden {
                continue;
            }
            let Some(collection) = outputs.collection_mut() else {
                continue;
            };
            match collection.save_by_id(&spec.id, dir, self.flat) {
                Ok(r) => {
                    report.saved.extend(r.saved);
                    report.failed.extend(r.failed);
                }
                Err(e) => report.failed.push((spec.id.clone(), e)),
            }
        }
        report
    }
}

/// Arrange staged values into a tree shaped like the inputs, so a value
/// staged for `filters.cutoff` reaches the `cutoff` input nested in `filters`.
fn foreign_tree(name: &str, staged: Vec<Param>) -> Result<Param, param::Error> {
    let mut root = Param::collection(name);
    for param in staged {
        let Some((parents, leaf)) = param.id().rsplit_once(ID_PATH_DELIM) else {
            root.add(param)?;
            continue;
        };
        let leaf = Param::from_value(leaf, param.value().clone());
        let mut node = &mut root;
        for segment in parents.split(ID_PATH_DELIM) {
            if node.find(segment).is_none() {
                node.add(Param::collection(segment))?;
            }
            node = node.get_mut(segment)?;
        }
        node.add(leaf)?;
    }
    Ok(root)
}
