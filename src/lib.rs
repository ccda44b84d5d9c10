/// High-level command line app
mod app;
/// Definition of command-line args
mod args;
/// Built-in algorithms
mod algorithms;
/// Step execution
mod exec;
/// Filesystem operations
mod fs;
/// Pipeline manifest
mod manifest;
/// Combined command-line and manifest run settings
mod settings;
/// Text UI
mod ui;

// exported for tests:
pub use app::App;
pub use args::Args;
pub use settings::Settings;

/// Run the command-line app.
pub fn run() -> Result<(), anyhow::Error> {
    use clap::Parser;
    let args = Args::parse();

    // INTERPRET SETTINGS ///////////////
    let settings: Settings = args.try_into()?;
    simple_logging::log_to_stderr(settings.log_level());

    // RUN THE THING /////////////////
    let app = App::new(settings);
    app.run()?;

    Ok(())
}
