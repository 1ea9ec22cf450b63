// Schema registry for outgoing page content
//
// Schemas are keyed by content namespace and versioned. Built-in schemas cover the host's page
// document; additional namespaces can be registered at runtime.

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, sync::Arc, time::Duration};

use crate::error::NotewalkError;

/// Global singleton schema registry with built-in schemas
pub static SCHEMAS: Lazy<SchemaRegistry> = Lazy::new(SchemaRegistry::create);

/// Namespace of the host's page document.
pub const PAGE_NAMESPACE: &str = "urn:notewalk:page:2013";

/// Largest value the host stores in a single-precision float attribute.
pub const FLOAT_MAX: f64 = f32::MAX as f64;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AttributeKind {
    Text,
    Boolean,
    Integer {
        #[serde(default)]
        min: Option<i64>,
        #[serde(default)]
        max: Option<i64>,
    },
    Decimal {
        #[serde(default)]
        min_inclusive: Option<f64>,
        #[serde(default)]
        max_inclusive: Option<f64>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeRule {
    pub name: String,
    pub kind: AttributeKind,
    #[serde(default)]
    pub required: bool,
}

impl AttributeRule {
    pub fn new(name: &str, kind: AttributeKind) -> Self {
        AttributeRule {
            name: name.to_string(),
            kind,
            required: false,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementRule {
    pub name: String,
    #[serde(default)]
    pub attributes: Vec<AttributeRule>,
    /// Child element names allowed in the same namespace. Empty means no children.
    #[serde(default)]
    pub children: Vec<String>,
}

impl ElementRule {
    pub fn new(name: &str, attributes: Vec<AttributeRule>, children: &[&str]) -> Self {
        ElementRule {
            name: name.to_string(),
            attributes,
            children: children.iter().map(|c| c.to_string()).collect(),
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&AttributeRule> {
        self.attributes.iter().find(|rule| rule.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaDefinition {
    pub namespace: String,
    pub version: String,
    pub elements: Vec<ElementRule>,
}

impl SchemaDefinition {
    pub fn element(&self, name: &str) -> Option<&ElementRule> {
        self.elements.iter().find(|rule| rule.name == name)
    }

    pub fn from_toml(content: &str) -> Result<Self, NotewalkError> {
        Ok(toml::from_str(content)?)
    }
}

fn float() -> AttributeKind {
    AttributeKind::Decimal {
        min_inclusive: Some(0.0),
        max_inclusive: Some(FLOAT_MAX),
    }
}

fn page_schema() -> SchemaDefinition {
    use AttributeKind::{Boolean, Text};
    let text = |name| AttributeRule::new(name, Text);
    SchemaDefinition {
        namespace: PAGE_NAMESPACE.to_string(),
        version: "2013".to_string(),
        elements: vec![
            ElementRule::new(
                "Page",
                vec![
                    text("ID"),
                    text("name").required(),
                    text("dateTime"),
                    text("lang"),
                ],
                &["Title", "Outline", "Image"],
            ),
            ElementRule::new("Title", vec![text("lang")], &["OE"]),
            ElementRule::new(
                "Outline",
                vec![text("objectID"), text("author")],
                &["Position", "Size", "OEChildren"],
            ),
            ElementRule::new(
                "Position",
                vec![
                    AttributeRule::new("x", float()).required(),
                    AttributeRule::new("y", float()).required(),
                    AttributeRule::new(
                        "z",
                        AttributeKind::Integer {
                            min: Some(0),
                            max: None,
                        },
                    ),
                ],
                &[],
            ),
            ElementRule::new(
                "Size",
                vec![
                    AttributeRule::new("width", float()).required(),
                    AttributeRule::new("height", float()).required(),
                    AttributeRule::new("isSetByUser", Boolean),
                ],
                &[],
            ),
            ElementRule::new("OEChildren", vec![], &["OE"]),
            ElementRule::new(
                "OE",
                vec![text("objectID"), text("alignment"), text("quickStyleIndex")],
                &["T", "OEChildren", "Image"],
            ),
            ElementRule::new("T", vec![], &[]),
            ElementRule::new(
                "Image",
                vec![text("format").required()],
                &["Position", "Size"],
            ),
        ],
    }
}

/// Thread-safe registry for schema definitions
///
/// Pattern matches the global singletons used elsewhere in the crate: a cheap-to-clone handle
/// around a shared map.
pub struct SchemaRegistry(Arc<RwLock<HashMap<String, Arc<SchemaDefinition>>>>);

impl Clone for SchemaRegistry {
    fn clone(&self) -> Self {
        SchemaRegistry(self.0.clone())
    }
}

impl SchemaRegistry {
    /// Create registry with built-in schemas
    pub fn create() -> Self {
        let registry = SchemaRegistry::empty();
        registry.register(page_schema());
        registry
    }

    pub fn empty() -> Self {
        SchemaRegistry(Arc::new(RwLock::new(HashMap::new())))
    }

    /// Register a schema definition under its namespace
    ///
    /// If a schema for this namespace already exists, it will be overwritten and a log message
    /// emitted.
    pub fn register(&self, definition: SchemaDefinition) {
        while self.0.is_locked() {
            tracing::info!(
                "[SchemaRegistry::register] Waiting for write access to schema registry"
            );
            std::thread::sleep(Duration::from_millis(100));
        }

        let mut writer = self.0.write();

        if let Some(existing) = writer.get(&definition.namespace) {
            tracing::info!(
                "[SchemaRegistry::register] Overwriting schema {} version {} with version {}",
                definition.namespace,
                existing.version,
                definition.version
            );
        }

        writer.insert(definition.namespace.clone(), Arc::new(definition));
    }

    /// Retrieve a schema definition by namespace
    ///
    /// Returns a cheap Arc clone if the schema exists.
    pub fn get(&self, namespace: &str) -> Option<Arc<SchemaDefinition>> {
        self.0.read().get(namespace).cloned()
    }

    /// List all registered namespaces
    pub fn list_schemas(&self) -> Vec<String> {
        self.0.read().keys().cloned().collect()
    }
}
