use anyhow::{Context, Result};

use calc::Calculation;
use param::{Codecs, Param, Resource};

use super::{load_numbers, numbers_slot, store, Algorithm};

pub const NAME: &str = "convert";

/// Copies a numeric array from `source` to `result`. The output file name
/// picks the format, so this converts e.g. csv to raw doubles.
pub struct Convert;

impl Algorithm for Convert {
    fn name(&self) -> &'static str {
        NAME
    }

    fn inputs(&self, codecs: &Codecs) -> Result<Param, param::Error> {
        Param::collection("inputs").with_child(numbers_slot("source", codecs).with_label("Source"))
    }

    fn outputs(&self, codecs: &Codecs) -> Result<Param, param::Error> {
        Param::collection("outputs").with_child(numbers_slot("result", codecs).with_label("Result"))
    }

    fn required(&self) -> &'static [&'static str] {
        &["source"]
    }

    fn run(&self, inputs: &mut Param, outputs: &mut Param, calc: &Calculation) -> Result<()> {
        let source = load_numbers(inputs, "source").context("while reading source")?;
        calc.set_total_units(source.len() as u64);

        let mut result = Vec::with_capacity(source.len());
        for v in source {
            result.push(v);
            calc.increment();
        }
        store(outputs, "result", Resource::Numbers(result))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use param::ResourceSlot;

    #[test]
    fn test_convert() -> Result<()> {
        let codecs = Codecs::standard();
        let mut inputs = Convert.inputs(&codecs)?;
        let mut outputs = Convert.outputs(&codecs)?;
        inputs.get_mut("source")?.set_object(Resource::Numbers(vec![3.0, 1.5]))?;

        let calc = Calculation::root(NAME);
        Convert.run(&mut inputs, &mut outputs, &calc)?;
        assert!(calc.is_completed());
        assert_eq!(calc.total_units(), 2);
        assert_eq!(
            outputs.find("result").and_then(Param::resource).and_then(ResourceSlot::object),
            Some(&Resource::Numbers(vec![3.0, 1.5]))
        );
        Ok(())
    }
}
