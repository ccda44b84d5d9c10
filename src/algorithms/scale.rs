use anyhow::{Context, Result};

use calc::Calculation;
use param::{Codecs, Param, Resource};

use super::{load_numbers, numbers_slot, store, Algorithm};

pub const NAME: &str = "scale";

/// Multiplies every element of `signal` by `gain`.
pub struct Scale;

impl Algorithm for Scale {
    fn name(&self) -> &'static str {
        NAME
    }

    fn inputs(&self, codecs: &Codecs) -> Result<Param, param::Error> {
        Param::collection("inputs")
            .with_child(numbers_slot("signal", codecs).with_label("Signal"))?
            .with_child(Param::number("gain", 1.0).with_label("Gain"))
    }

    fn outputs(&self, codecs: &Codecs) -> Result<Param, param::Error> {
        Param::collection("outputs").with_child(numbers_slot("scaled", codecs).with_label("Scaled"))
    }

    fn required(&self) -> &'static [&'static str] {
        &["signal"]
    }

    fn run(&self, inputs: &mut Param, outputs: &mut Param, calc: &Calculation) -> Result<()> {
        let gain = inputs.find("gain").and_then(Param::as_number).unwrap_or(1.0);

        // while reading, the nested calculation is what a poller sees:
        let read = calc.child("read");
        read.set_total_units(1);
        let signal = load_numbers(inputs, "signal").context("while reading signal")?;
        read.finish();
        read.detach();

        calc.set_total_units(signal.len() as u64);
        let mut scaled = Vec::with_capacity(signal.len());
        for v in signal {
            scaled.push(v * gain);
            calc.increment();
        }
        store(outputs, "scaled", Resource::Numbers(scaled))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use param::{ParamValue, ResourceSlot};

    #[test]
    fn test_scale() -> Result<()> {
        let codecs = Codecs::standard();
        let mut inputs = Scale.inputs(&codecs)?;
        let mut outputs = Scale.outputs(&codecs)?;
        inputs.get_mut("signal")?.set_object(Resource::Numbers(vec![1.0, -2.0, 0.5]))?;
        inputs.get_mut("gain")?.set_value(ParamValue::Number(4.0))?;

        let calc = Calculation::root(NAME);
        Scale.run(&mut inputs, &mut outputs, &calc)?;
        assert!(calc.children().is_empty());
        assert_eq!(calc.units(), calc.own_units());
        assert_eq!(calc.completed_units(), 3);
        assert_eq!(
            outputs.find("scaled").and_then(Param::resource).and_then(ResourceSlot::object),
            Some(&Resource::Numbers(vec![4.0, -8.0, 2.0]))
        );
        Ok(())
    }

    #[test]
    fn test_unreadable_signal() -> Result<()> {
        let codecs = Codecs::standard();
        let mut inputs = Scale.inputs(&codecs)?;
        let mut outputs = Scale.outputs(&codecs)?;
        inputs.get_mut("signal")?.resource_mut()?.set_path("/nonexistent/signal.csv");

        let calc = Calculation::root(NAME);
        let err = Scale.run(&mut inputs, &mut outputs, &calc).err();
        assert_eq!(err.map(|e| e.to_string()).as_deref(), Some("while reading signal"));
        // the read step is still attached, showing where it stopped:
        assert_eq!(calc.children().len(), 1);
        assert_eq!(calc.total_units(), 1);
        assert_eq!(calc.completed_units(), 0);
        Ok(())
    }
}
