use serde::{Deserialize, Serialize};

use crate::error::NotewalkError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

/// Outgoing structured content, one element of a page document.
///
/// An empty `namespace` inherits the parent's namespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentElement {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub namespace: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<Attribute>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ContentElement>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl ContentElement {
    pub fn new(name: impl Into<String>) -> Self {
        ContentElement {
            name: name.into(),
            namespace: String::new(),
            attributes: Vec::new(),
            children: Vec::new(),
            text: None,
        }
    }

    pub fn in_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attribute(name, value);
        self
    }

    pub fn with_child(mut self, child: ContentElement) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn from_json(json: &str) -> Result<Self, NotewalkError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|attr| attr.name == name)
            .map(|attr| attr.value.as_str())
    }

    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|attr| attr.name == name) {
            Some(attr) => attr.value = value,
            None => self.attributes.push(Attribute { name, value }),
        }
    }

    /// Descendant reached by following child indices from this element.
    pub fn descendant(&self, location: &[usize]) -> Option<&ContentElement> {
        location
            .iter()
            .try_fold(self, |node, idx| node.children.get(*idx))
    }

    pub fn descendant_mut(&mut self, location: &[usize]) -> Option<&mut ContentElement> {
        location
            .iter()
            .try_fold(self, |node, idx| node.children.get_mut(*idx))
    }
}
