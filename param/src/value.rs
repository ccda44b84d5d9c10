use std::fmt;
use std::path::PathBuf;

use crate::{Error, ParamCollection, ResourceSlot};

/// The closed set of parameter variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamKind {
    Number,
    NumberCollection,
    File,
    Object,
    Collection,
    Text,
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Number => "number",
            Self::NumberCollection => "numbers",
            Self::File => "file",
            Self::Object => "object",
            Self::Collection => "collection",
            Self::Text => "text",
        };
        f.write_str(name)
    }
}

/// Current value of a parameter. The variant is fixed when the parameter is built.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Number(f64),
    NumberCollection(Vec<f64>),
    File(Option<PathBuf>),
    Object(ResourceSlot),
    Collection(ParamCollection),
    Text(String),
}

impl ParamValue {
    pub fn kind(&self) -> ParamKind {
        match self {
            Self::Number(_) => ParamKind::Number,
            Self::NumberCollection(_) => ParamKind::NumberCollection,
            Self::File(_) => ParamKind::File,
            Self::Object(_) => ParamKind::Object,
            Self::Collection(_) => ParamKind::Collection,
            Self::Text(_) => ParamKind::Text,
        }
    }

    /// Parse a value of the given kind from command-line text.
    /// Objects and collections have no text form.
    pub fn parse(kind: ParamKind, text: &str) -> Result<Self, Error> {
        let parse_err = || Error::ParseValue {
            kind,
            text: text.to_owned(),
        };
        match kind {
            ParamKind::Number => text
                .trim()
                .parse()
                .map(Self::Number)
                .map_err(|_| parse_err()),
            ParamKind::NumberCollection => text
                .split(|c: char| c == ',' || c.is_whitespace())
                .filter(|t| !t.is_empty())
                .map(str::parse::<f64>)
                .collect::<Result<Vec<f64>, _>>()
                .map(Self::NumberCollection)
                .map_err(|_| parse_err()),
            ParamKind::File if text.is_empty() => Ok(Self::File(None)),
            ParamKind::File => Ok(Self::File(Some(PathBuf::from(text)))),
            ParamKind::Text => Ok(Self::Text(text.to_owned())),
            ParamKind::Object | ParamKind::Collection => Err(parse_err()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() -> Result<(), Error> {
        assert_eq!(ParamValue::parse(ParamKind::Number, " 2.5 ")?, ParamValue::Number(2.5));
        assert_eq!(
            ParamValue::parse(ParamKind::NumberCollection, "1, 2 3")?,
            ParamValue::NumberCollection(vec![1.0, 2.0, 3.0])
        );
        assert_eq!(
            ParamValue::parse(ParamKind::File, "data/x.csv")?,
            ParamValue::File(Some(PathBuf::from("data/x.csv")))
        );
        assert_eq!(ParamValue::parse(ParamKind::File, "")?, ParamValue::File(None));
        assert!(matches!(
            ParamValue::parse(ParamKind::Number, "two"),
            Err(Error::ParseValue { kind: ParamKind::Number, .. })
        ));
        assert!(ParamValue::parse(ParamKind::Collection, "x").is_err());
        Ok(())
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(ParamKind::NumberCollection.to_string(), "numbers");
        assert_eq!(ParamValue::Text("x".into()).kind(), ParamKind::Text);
    }
}
