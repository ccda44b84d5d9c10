use std::fmt::Write;

use anyhow::{Context, Result};
use serde_json::json;

use calc::Calculation;
use param::{Codecs, Param, Resource, ResourceType};

use super::{load_numbers, numbers_slot, store, Algorithm};

pub const NAME: &str = "summarize";

/// Summary statistics of `source`: a `summary` document with count, min, max
/// and mean, plus a hidden plain-text `report` that is only written on request.
pub struct Summarize;

impl Algorithm for Summarize {
    fn name(&self) -> &'static str {
        NAME
    }

    fn inputs(&self, codecs: &Codecs) -> Result<Param, param::Error> {
        Param::collection("inputs").with_child(numbers_slot("source", codecs).with_label("Source"))
    }

    fn outputs(&self, codecs: &Codecs) -> Result<Param, param::Error> {
        Param::collection("outputs")
            .with_child(
                Param::object("summary", codecs.slot(ResourceType::Document)).with_label("Summary"),
            )?
            .with_child(
                Param::object("report", codecs.slot(ResourceType::Text))
                    .with_label("Report")
                    .hidden(),
            )
    }

    fn required(&self) -> &'static [&'static str] {
        &["source"]
    }

    fn run(&self, inputs: &mut Param, outputs: &mut Param, calc: &Calculation) -> Result<()> {
        let source = load_numbers(inputs, "source").context("while reading source")?;
        calc.set_total_units(source.len() as u64);

        let mut stats = Stats::default();
        for v in &source {
            stats.add(*v);
            calc.increment();
        }

        store(outputs, "summary", Resource::Document(stats.to_json()))?;
        store(outputs, "report", Resource::Text(stats.report()))?;
        Ok(())
    }
}

#[derive(Debug, Default)]
struct Stats {
    count: usize,
    sum: f64,
    min: Option<f64>,
    max: Option<f64>,
}

impl Stats {
    fn add(&mut self, v: f64) {
        self.count += 1;
        self.sum += v;
        self.min = Some(self.min.map_or(v, |m| m.min(v)));
        self.max = Some(self.max.map_or(v, |m| m.max(v)));
    }

    fn mean(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }

    fn to_json(&self) -> serde_json::Value {
        json!({
            "count": self.count,
            "min": self.min,
            "max": self.max,
            "mean": self.mean(),
        })
    }

    fn report(&self) -> String {
        let mut text = String::with_capacity(64);
        let fmt = |v: Option<f64>| v.map_or_else(|| "n/a".to_owned(), |v| v.to_string());
        // writing to a String is infallible:
        let _ = writeln!(text, "count: {}", self.count);
        let _ = writeln!(text, "min: {}", fmt(self.min));
        let _ = writeln!(text, "max: {}", fmt(self.max));
        let _ = writeln!(text, "mean: {}", fmt(self.mean()));
        text
    }
}
