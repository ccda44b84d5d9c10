use anyhow::Result;

use calc::Calculation;
use param::{Codecs, Param, ParamValue, Resource, ResourceType};

/// Numeric array → numeric array, re-encoded by output file name
mod convert;
/// Numeric array times a gain
mod scale;
/// Summary statistics of a numeric array
mod summarize;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Unknown algorithm '{0}' (expected one of: {names})", names = ALGORITHMS.join(", "))]
    UnknownAlgorithm(String),
    #[error("Required input '{0}' is not bound")]
    MissingInput(String),
}

const ALGORITHMS: &[&str] = &[convert::NAME, scale::NAME, summarize::NAME];

/// A built-in processing step.
///
/// Algorithms describe their inputs and outputs as parameter trees; the
/// runner stages values into the inputs, calls [`Algorithm::run`] with a
/// calculation to report progress on, and saves whatever the outputs hold.
pub trait Algorithm {
    fn name(&self) -> &'static str;

    /// Fresh input tree, with defaults.
    fn inputs(&self, codecs: &Codecs) -> Result<Param, param::Error>;

    /// Fresh output tree; resources start unbound.
    fn outputs(&self, codecs: &Codecs) -> Result<Param, param::Error>;

    /// Ids of inputs that must be bound before running.
    fn required(&self) -> &'static [&'static str];

    /// Do the work. Progress goes to `calc`, which the caller may be polling
    /// from another thread.
    fn run(&self, inputs: &mut Param, outputs: &mut Param, calc: &Calculation) -> Result<()>;
}

/// Look up a built-in algorithm by name.
pub fn lookup(name: &str) -> Result<Box<dyn Algorithm>, Error> {
    match name {
        convert::NAME => Ok(Box::new(convert::Convert)),
        scale::NAME => Ok(Box::new(scale::Scale)),
        summarize::NAME => Ok(Box::new(summarize::Summarize)),
        _ => Err(Error::UnknownAlgorithm(name.to_owned())),
    }
}

/// Fail if any required input is unbound.
pub fn check_required(algorithm: &dyn Algorithm, inputs: &Param) -> Result<(), Error> {
    for id in algorithm.required() {
        let bound = match inputs.find(id).map(Param::value) {
            Some(ParamValue::File(path)) => path.is_some(),
            Some(ParamValue::Object(slot)) => slot.path().is_some() || slot.object().is_some(),
            Some(_) => true,
            None => false,
        };
        if !bound {
            return Err(Error::MissingInput((*id).to_owned()));
        }
    }
    Ok(())
}

/// Read a numeric-array resource input, materializing it if needed.
fn load_numbers(inputs: &mut Param, id: &str) -> Result<Vec<f64>, param::Error> {
    let param = inputs.get_mut(id)?;
    let values = param.resource_mut()?.load_as::<Vec<f64>>()?.clone();
    param.update();
    Ok(values)
}

fn numbers_slot(id: &str, codecs: &Codecs) -> Param {
    Param::object(id, codecs.slot(ResourceType::Numbers))
}

fn store(outputs: &mut Param, id: &str, object: Resource) -> Result<(), param::Error> {
    outputs.get_mut(id)?.set_object(object)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup() {
        for name in ALGORITHMS {
            assert_eq!(lookup(name).map(|a| a.name()).ok(), Some(*name));
        }
        let err = lookup("fft").err().map(|e| e.to_string());
        assert_eq!(
            err.as_deref(),
            Some("Unknown algorithm 'fft' (expected one of: convert, scale, summarize)")
        );
    }

    #[test]
    fn test_check_required() -> Result<()> {
        let codecs = Codecs::standard();
        let algorithm = lookup("scale")?;
        let mut inputs = algorithm.inputs(&codecs)?;
        assert!(matches!(
            check_required(algorithm.as_ref(), &inputs),
            Err(Error::MissingInput(id)) if id == "signal"
        ));
        inputs.get_mut("signal")?.resource_mut()?.set_path("in.csv");
        check_required(algorithm.as_ref(), &inputs)?;
        Ok(())
    }
}
