use anyhow::Result;
use paramflow::{App, Args};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::{tempdir, TempDir};

const SIGNAL: &str = "# sensor trace\n1.0, 2.0\n-0.5\n4\n";

const SCALE: &str = r#"
[[step]]
name = "scale-signal"
algorithm = "scale"

[[step.input]]
id = "signal"
kind = "file"
path = "data/signal.csv"

[[step.input]]
id = "gain"
kind = "number"
value = 2.5
label = "Gain factor"

[[step.output]]
id = "scaled"
file = "scaled.f64"
"#;

const STATS: &str = r#"
[[step]]
name = "stats"
algorithm = "summarize"

[[step.input]]
id = "source"
kind = "object"
codec = "numbers"
path = "data/signal.csv"

[[step.output]]
id = "report"

[[step]]
name = "quiet-stats"
algorithm = "summarize"

[[step.input]]
id = "source"
kind = "file"
path = "data/signal.csv"

[[step.output]]
id = "summary"
file = "stats.cbor"
"#;

/// Manifest and input data in one temp dir, output in another.
struct Fixture {
    work: TempDir,
    output: TempDir,
}

impl Fixture {
    fn new(manifest: &str) -> Result<Self> {
        let work = tempdir()?;
        fs::create_dir(work.path().join("data"))?;
        fs::write(work.path().join("data/signal.csv"), SIGNAL)?;
        fs::write(work.path().join("pipeline.toml"), manifest)?;
        Ok(Self {
            work,
            output: tempdir()?,
        })
    }

    fn args(&self) -> Args {
        Args {
            config: path_string(&self.work.path().join("pipeline.toml")),
            output: path_string(self.output.path()),
            steps: Vec::with_capacity(0),
            overrides: Vec::with_capacity(0),
            flat: false,
            yes: true,
            verbose: 1,
            dry_run: false,
            interval: 1,
        }
    }

    fn out(&self, rel: &str) -> PathBuf {
        self.output.path().join(rel)
    }
}

fn path_string(path: &Path) -> String {
    path.to_str().unwrap().to_owned()
}

fn run(args: Args) -> Result<()> {
    simple_logging::log_to_stderr(log::LevelFilter::Trace);
    App::new(args.try_into()?).run()
}

fn read_f64s(path: &Path) -> Result<Vec<f64>> {
    let bytes = fs::read(path)?;
    Ok(bytes
        .chunks_exact(8)
        .map(|b| f64::from_le_bytes(b.try_into().unwrap()))
        .collect())
}

#[test]
fn test_scale() -> Result<()> {
    let fixture = Fixture::new(SCALE)?;
    run(fixture.args())?;

    let scaled = fixture.out("scale-signal/scaled/scaled.f64");
    assert!(scaled.exists(), "Output written under its parameter dir");
    assert_eq!(read_f64s(&scaled)?, vec![2.5, 5.0, -1.25, 10.0]);
    Ok(())
}

#[test]
fn test_override_and_flat() -> Result<()> {
    let fixture = Fixture::new(SCALE)?;
    let mut args = fixture.args();
    args.flat = true;
    args.overrides = vec!["gain=-1".to_owned()];
    run(args)?;

    let scaled = fixture.out("scale-signal/scaled.f64");
    assert!(scaled.exists(), "Flat output written into the step dir");
    assert_eq!(read_f64s(&scaled)?, vec![-1.0, -2.0, 0.5, -4.0]);

    // objects are overridden by path; this one is relative to the cwd, so make it absolute:
    let other = fixture.work.path().join("data/other.txt");
    fs::write(&other, "10 20")?;
    let mut args = fixture.args();
    args.overrides = vec![format!("signal={}", other.display())];
    run(args)?;
    assert_eq!(
        read_f64s(&fixture.out("scale-signal/scaled/scaled.f64"))?,
        vec![25.0, 50.0]
    );
    Ok(())
}

#[test]
fn test_hidden_output_saved_only_when_named() -> Result<()> {
    let fixture = Fixture::new(STATS)?;
    run(fixture.args())?;

    let summary: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(fixture.out("stats/summary/summary.json"))?)?;
    assert_eq!(
        summary,
        serde_json::json!({ "count": 4, "min": -0.5, "max": 4.0, "mean": 1.625 })
    );
    assert_eq!(
        fs::read_to_string(fixture.out("stats/report/report.txt"))?,
        "count: 4\nmin: -0.5\nmax: 4\nmean: 1.625\n"
    );

    assert!(fixture.out("quiet-stats/summary/stats.cbor").is_file());
    assert!(
        !fixture.out("quiet-stats/report").exists(),
        "Hidden output not written unless named"
    );
    Ok(())
}

#[test]
fn test_select_step() -> Result<()> {
    let fixture = Fixture::new(STATS)?;
    let mut args = fixture.args();
    args.steps = vec!["quiet-stats".to_owned()];
    run(args)?;
    assert!(fixture.out("quiet-stats").exists());
    assert!(!fixture.out("stats").exists());

    let mut args = fixture.args();
    args.steps = vec!["nope".to_owned()];
    assert!(run(args).is_err());
    Ok(())
}

#[test]
fn test_rerun_replaces_outputs() -> Result<()> {
    let fixture = Fixture::new(SCALE)?;
    run(fixture.args())?;
    let stale = fixture.out("scale-signal/stale.txt");
    fs::write(&stale, "old")?;

    run(fixture.args())?;
    assert!(!stale.exists(), "Step dir was cleared before rerunning");
    assert!(fixture.out("scale-signal/scaled/scaled.f64").exists());
    Ok(())
}

#[test]
fn test_dry_run() -> Result<()> {
    let fixture = Fixture::new(SCALE)?;
    let mut args = fixture.args();
    let output = fixture.out("nested/out");
    args.output = path_string(&output);
    args.dry_run = true;
    run(args)?;
    assert!(!output.exists(), "Dry run writes nothing");
    Ok(())
}

#[test]
fn test_failures_are_aggregated() -> Result<()> {
    let manifest = format!(
        "{SCALE}\n{}",
        r#"
[[step]]
name = "broken"
algorithm = "convert"

[[step.input]]
id = "source"
kind = "file"
path = "data/missing.csv"

[[step]]
name = "unbound"
algorithm = "convert"
"#
    );
    let fixture = Fixture::new(&manifest)?;
    let err = run(fixture.args()).err().map(|e| format!("{e:#}"));
    assert_eq!(
        err.as_deref(),
        Some("while running pipeline: running pipeline failed due to 2 errors")
    );
    // the good step still ran:
    assert!(fixture.out("scale-signal/scaled/scaled.f64").exists());
    Ok(())
}
