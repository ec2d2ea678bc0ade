//! Generic element tree that manifests are parsed from
//!
//! Markup decoding is kept behind [`ManifestDecoder`]; the parser only ever
//! sees named children and their text.

use super::ManifestError;

/// One node of a decoded manifest document
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Element {
    pub name: String,
    pub text: Option<String>,
    pub children: Vec<Element>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: None,
            children: Vec::new(),
        }
    }

    /// Leaf element carrying text
    pub fn leaf(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: Some(text.into()),
            children: Vec::new(),
        }
    }

    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    /// First child with the given name
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    /// All children with the given name, in document order
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// Trimmed text of the first child with the given name; empty text is `None`
    pub fn child_text(&self, name: &str) -> Option<&str> {
        self.child(name)
            .and_then(|c| c.text.as_deref())
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }
}

/// Turns raw manifest bytes into an [`Element`] tree
pub trait ManifestDecoder: Send + Sync {
    fn decode(&self, bytes: &[u8]) -> Result<Element, ManifestError>;
}

/// Decoder for TOML manifests.
///
/// Tables become elements, arrays become repeated children sharing the
/// array's key, and scalars become text leaves.
#[derive(Debug, Clone, Copy, Default)]
pub struct TomlDecoder;

impl TomlDecoder {
    pub const ROOT: &'static str = "document";
}

impl ManifestDecoder for TomlDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<Element, ManifestError> {
        let content = std::str::from_utf8(bytes)
            .map_err(|e| ManifestError::Malformed(format!("manifest is not UTF-8: {}", e)))?;
        let table: toml::Table = toml::from_str(content)
            .map_err(|e| ManifestError::Malformed(e.message().to_string()))?;

        let mut root = Element::new(Self::ROOT);
        push_table(&mut root, table);
        Ok(root)
    }
}

fn push_table(parent: &mut Element, table: toml::Table) {
    for (key, value) in table {
        push_value(parent, key, value);
    }
}

fn push_value(parent: &mut Element, key: String, value: toml::Value) {
    match value {
        toml::Value::Table(table) => {
            let mut element = Element::new(key);
            push_table(&mut element, table);
            parent.children.push(element);
        }
        toml::Value::Array(items) => {
            for item in items {
                push_value(parent, key.clone(), item);
            }
        }
        toml::Value::String(text) => parent.children.push(Element::leaf(key, text)),
        other => parent.children.push(Element::leaf(key, other.to_string())),
    }
}
