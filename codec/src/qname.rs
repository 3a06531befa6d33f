use smol_str::SmolStr;
use std::fmt::{self, Debug, Display};

/// A qualified name, identifying a schema node (or identity) by the
/// namespace of its defining module and its local name.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QName {
    namespace: SmolStr,
    local_name: SmolStr,
}

impl QName {
    pub fn new(namespace: impl Into<SmolStr>, local_name: impl Into<SmolStr>) -> Self {
        Self {
            namespace: namespace.into(),
            local_name: local_name.into(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn local_name(&self) -> &str {
        &self.local_name
    }

    /// Returns a name with the same namespace, but a different local name.
    pub fn bind_to(&self, local_name: impl Into<SmolStr>) -> Self {
        Self {
            namespace: self.namespace.clone(),
            local_name: local_name.into(),
        }
    }
}

impl Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}){}", self.namespace, self.local_name)
    }
}

impl Debug for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Display::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::QName;

    #[test]
    fn display() {
        let name = QName::new("urn:example", "top");
        assert_eq!("(urn:example)top", name.to_string());
        assert_eq!("(urn:example)item", name.bind_to("item").to_string());
    }

    #[test]
    fn ordering_is_namespace_first() {
        let a = QName::new("urn:a", "z");
        let b = QName::new("urn:b", "a");
        assert!(a < b);
    }
}
