use anyhow::{Context, Result};

use param::Codecs;

use crate::exec::StepRunner;
use crate::fs::Fs;
use crate::manifest::{Manifest, StepSpec};
use crate::settings::Settings;
use crate::ui::Ui;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("No step named '{0}' in manifest")]
    UnknownStep(String),
}

/// This struct actually runs the command-line app.
pub struct App {
    /// Interpreted command line settings
    settings: Settings,
    /// Filesystem interface
    fs: Fs,
    /// User interface
    ui: Ui,
}

impl App {
    /// Create a new `App`.
    pub fn new(settings: Settings) -> Self {
        let fs = Fs::new(&settings.output, settings.dry_run);
        let ui = Ui::new(&settings);
        Self { settings, fs, ui }
    }

    /// Run the app, using settings to determine which steps to run.
    pub fn run(mut self) -> Result<()> {
        if self.settings.verbose > 0 {
            eprintln!("Using output directory {:?}", self.settings.output);
        }
        self.fs.ensure_output_dir_exists(self.settings.verbose > 0)?;

        let manifest = self.read_manifest()?;
        let steps = self.select_steps(&manifest)?;

        let codecs = Codecs::standard();
        log::debug!("registered file extensions: {}", codecs.extensions().join(", "));

        let mut runner = StepRunner::new(&self.settings, codecs, self.fs, self.ui);
        runner.run(&steps).context("while running pipeline")?;
        Ok(())
    }

    fn read_manifest(&mut self) -> Result<Manifest> {
        let mut strbuf = String::with_capacity(0); // will be resized when read.
        self.ui.verbose_progress_debug("Reading manifest", &self.settings.config);
        self.fs
            .read_to_buf(&self.settings.config, &mut strbuf)
            .with_context(|| format!("while reading manifest {:?}", self.settings.config))?;
        self.ui.done();

        self.ui.verbose_progress("Parsing manifest");
        self.ui.start_timer();
        let manifest = Manifest::parse(&strbuf, self.settings.config_parent_dir()?)
            .with_context(|| format!("while parsing manifest {:?}", self.settings.config))?;
        self.ui.done();
        self.ui.print_elapsed("Parsing manifest");
        Ok(manifest)
    }

    /// Steps named with `--step`, in manifest order; all of them if none were named.
    fn select_steps<'m>(&self, manifest: &'m Manifest) -> Result<Vec<&'m StepSpec>> {
        if self.settings.steps.is_empty() {
            return Ok(manifest.steps.iter().collect());
        }
        for name in &self.settings.steps {
            if manifest.step(name).is_none() {
                return Err(Error::UnknownStep(name.clone()).into());
            }
        }
        log::debug!("running steps '{}' named on command line", self.settings.steps.join(", "));
        Ok(manifest
            .steps
            .iter()
            .filter(|s| self.settings.steps.contains(&s.name))
            .collect())
    }
}
