use serde::Deserialize;

/// How generic nodes are turned into data objects.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DeserializationStrategy {
    /// Convert the whole subtree up front and call the generated
    /// constructor.
    #[default]
    Eager,
    /// Return a view converting each child on first access.
    Lazy,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields, default)]
pub struct CodecConfig {
    pub deserialization: DeserializationStrategy,
    /// Reject generic children that have no counterpart in the schema
    /// binding. When unset, such children are logged and skipped.
    pub strict: bool,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            deserialization: DeserializationStrategy::default(),
            strict: true,
        }
    }
}

impl CodecConfig {
    pub fn from_json(json: &str) -> Result<Self, crate::Error> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::{CodecConfig, DeserializationStrategy};
    use rstest::rstest;

    #[rstest]
    #[case::empty("{}", CodecConfig::default())]
    #[case::lazy(
        r#"{"deserialization": "lazy"}"#,
        CodecConfig { deserialization: DeserializationStrategy::Lazy, strict: true }
    )]
    #[case::lenient(
        r#"{"strict": false}"#,
        CodecConfig { deserialization: DeserializationStrategy::Eager, strict: false }
    )]
    fn parse(#[case] json: &str, #[case] expected: CodecConfig) {
        assert_eq!(expected, CodecConfig::from_json(json).expect("must parse"));
    }

    #[rstest]
    #[case::unknown_field(r#"{"cache": true}"#)]
    #[case::unknown_strategy(r#"{"deserialization": "sometimes"}"#)]
    fn reject(#[case] json: &str) {
        assert!(matches!(
            CodecConfig::from_json(json),
            Err(crate::Error::Config(_))
        ));
    }
}
