//! Validation of outgoing page content.
//!
//! - [`ContentElement`] - the content tree submitted to the host
//! - [`SchemaRegistry`] - versioned schemas keyed by namespace (global instance: [`SCHEMAS`])
//! - [`Validator`] - checks content against its schema and applies the exponent-notation
//!   correction before reporting errors
//!
//! Register a schema for your own namespace:
//!
//! ```rust
//! use notewalk::schema::{AttributeKind, AttributeRule, ElementRule, SchemaDefinition, SCHEMAS};
//!
//! SCHEMAS.register(SchemaDefinition {
//!     namespace: "urn:example:shapes".to_string(),
//!     version: "1".to_string(),
//!     elements: vec![ElementRule::new(
//!         "Circle",
//!         vec![AttributeRule::new(
//!             "radius",
//!             AttributeKind::Decimal { min_inclusive: Some(0.0), max_inclusive: None },
//!         )
//!         .required()],
//!         &[],
//!     )],
//! });
//! ```

pub mod content;
pub mod registry;
pub mod validate;

pub use content::{Attribute, ContentElement};
pub use registry::{
    AttributeKind, AttributeRule, ElementRule, SchemaDefinition, SchemaRegistry, PAGE_NAMESPACE,
    SCHEMAS,
};
pub use validate::{
    truncate_mantissa, Correction, IssueKind, IssueNode, ValidationIssue, ValidationOutcome,
    Validator,
};
