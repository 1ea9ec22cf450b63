//! Schema validation of outgoing content, with one auto-correction.
//!
//! The host writes single-precision values such as `3.40282347E+38` that it then refuses to
//! read back, because the decimal string rounds above the schema's maximum. When a
//! max-inclusive check fails on an attribute in exponent notation, the mantissa is cut to one
//! fractional digit (`3.4E+38`) and the error is considered handled.
//!
//! Validation never touches the caller's content: corrections are applied to a copy, which is
//! validated again and returned in the [`ValidationOutcome`].

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{
    content::ContentElement,
    registry::{AttributeKind, AttributeRule, SchemaRegistry, SCHEMAS},
};
use crate::error::NotewalkError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum IssueNode {
    Element,
    Attribute(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum IssueKind {
    SchemaNotFound(String),
    UnknownElement,
    UnexpectedChild(String),
    UnknownAttribute,
    MissingAttribute(String),
    InvalidValue(String),
    MinInclusive(f64),
    MaxInclusive(f64),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationIssue {
    /// Element path for display, e.g. `/Page/Outline[0]/Size[1]`.
    pub path: String,
    /// Child indices from the validated root to the element.
    pub location: Vec<usize>,
    pub node: IssueNode,
    pub kind: IssueKind,
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.node {
            IssueNode::Element => write!(f, "{}: ", self.path)?,
            IssueNode::Attribute(name) => write!(f, "{}@{name}: ", self.path)?,
        }
        match &self.kind {
            IssueKind::SchemaNotFound(ns) => write!(f, "no schema registered for '{ns}'"),
            IssueKind::UnknownElement => write!(f, "element is not declared"),
            IssueKind::UnexpectedChild(parent) => write!(f, "not allowed inside '{parent}'"),
            IssueKind::UnknownAttribute => write!(f, "attribute is not declared"),
            IssueKind::MissingAttribute(name) => write!(f, "required attribute '{name}' missing"),
            IssueKind::InvalidValue(reason) => write!(f, "invalid value: {reason}"),
            IssueKind::MinInclusive(limit) => write!(f, "value below minimum {limit:E}"),
            IssueKind::MaxInclusive(limit) => write!(f, "value exceeds maximum {limit:E}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Correction {
    pub path: String,
    pub attribute: String,
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidationOutcome {
    /// The validated content with corrections applied.
    pub content: ContentElement,
    pub corrections: Vec<Correction>,
    /// Errors left after correction. Content is safe to submit only when this is empty.
    pub issues: Vec<ValidationIssue>,
}

impl ValidationOutcome {
    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }

    /// The corrected content, or a [`NotewalkError::Validation`] listing what is still wrong.
    pub fn into_result(self) -> Result<ContentElement, NotewalkError> {
        if self.issues.is_empty() {
            Ok(self.content)
        } else {
            Err(NotewalkError::Validation(
                self.issues
                    .iter()
                    .map(|issue| issue.to_string())
                    .collect::<Vec<_>>()
                    .join("; "),
            ))
        }
    }
}

/// Rewrite `value` with a one-digit fractional mantissa, if it is in exponent notation and has
/// more than one fractional digit.
///
/// `"12.345E+10"` becomes `"12.3E+10"`. Values without an `E`, without a decimal point, or with
/// the point directly before the `E` are left alone, as is anything that is not plain ASCII.
pub fn truncate_mantissa(value: &str) -> Option<String> {
    if !value.is_ascii() {
        return None;
    }
    let exp = value.find('E')?;
    let dot = value[..exp].find('.')?;
    if dot + 1 == exp || exp - dot <= 2 {
        return None;
    }
    Some(format!("{}{}", &value[..dot + 2], &value[exp..]))
}

#[derive(Clone)]
pub struct Validator {
    registry: SchemaRegistry,
}

impl Default for Validator {
    fn default() -> Self {
        Validator {
            registry: SCHEMAS.clone(),
        }
    }
}

impl Validator {
    pub fn new(registry: SchemaRegistry) -> Self {
        Validator { registry }
    }

    /// Validate `content`, correcting what can be corrected on a copy.
    pub fn validate(&self, content: &ContentElement) -> ValidationOutcome {
        let mut corrected = content.clone();
        let mut corrections = Vec::new();
        let mut issues = Vec::new();

        for issue in self.check(content) {
            match correct(&mut corrected, &issue) {
                Some(correction) => {
                    tracing::info!(
                        "[Validator::validate] corrected {}@{} from {} to {}",
                        correction.path,
                        correction.attribute,
                        correction.from,
                        correction.to
                    );
                    corrections.push(correction);
                }
                None => issues.push(issue),
            }
        }

        if !corrections.is_empty() {
            issues = self.check(&corrected);
        }
        for issue in issues.iter() {
            tracing::error!("[Validator::validate] {issue}");
        }

        ValidationOutcome {
            content: corrected,
            corrections,
            issues,
        }
    }

    /// All schema violations in `root`, in document order.
    pub fn check(&self, root: &ContentElement) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();
        let mut stack: Vec<(&ContentElement, Vec<usize>, String, String)> = vec![(
            root,
            Vec::new(),
            format!("/{}", root.name),
            root.namespace.clone(),
        )];

        while let Some((element, location, path, namespace)) = stack.pop() {
            let issue = |node: IssueNode, kind: IssueKind| ValidationIssue {
                path: path.clone(),
                location: location.clone(),
                node,
                kind,
            };

            let Some(schema) = self.registry.get(&namespace) else {
                issues.push(issue(IssueNode::Element, IssueKind::SchemaNotFound(namespace.clone())));
                continue;
            };
            let Some(rule) = schema.element(&element.name) else {
                issues.push(issue(IssueNode::Element, IssueKind::UnknownElement));
                continue;
            };

            for attr in element.attributes.iter() {
                let node = IssueNode::Attribute(attr.name.clone());
                match rule.attribute(&attr.name) {
                    Some(attr_rule) => {
                        if let Some(kind) = check_value(attr_rule, &attr.value) {
                            issues.push(issue(node, kind));
                        }
                    }
                    None => issues.push(issue(node, IssueKind::UnknownAttribute)),
                }
            }
            for required in rule.attributes.iter().filter(|a| a.required) {
                if element.attribute(&required.name).is_none() {
                    issues.push(issue(
                        IssueNode::Element,
                        IssueKind::MissingAttribute(required.name.clone()),
                    ));
                }
            }

            for (idx, child) in element.children.iter().enumerate().rev() {
                let child_ns = if child.namespace.is_empty() {
                    namespace.clone()
                } else {
                    child.namespace.clone()
                };
                let mut child_location = location.clone();
                child_location.push(idx);
                let child_path = format!("{path}/{}[{idx}]", child.name);
                if child_ns == namespace && !rule.children.iter().any(|c| c == &child.name) {
                    issues.push(ValidationIssue {
                        path: child_path,
                        location: child_location,
                        node: IssueNode::Element,
                        kind: IssueKind::UnexpectedChild(element.name.clone()),
                    });
                    continue;
                }
                stack.push((child, child_location, child_path, child_ns));
            }
        }
        issues
    }
}

fn check_value(rule: &AttributeRule, value: &str) -> Option<IssueKind> {
    match &rule.kind {
        AttributeKind::Text => None,
        AttributeKind::Boolean => match value {
            "true" | "false" => None,
            _ => Some(IssueKind::InvalidValue(format!("'{value}' is not a boolean"))),
        },
        AttributeKind::Integer { min, max } => match value.trim().parse::<i64>() {
            Ok(n) if min.is_some_and(|m| n < m) => {
                min.map(|m| IssueKind::MinInclusive(m as f64))
            }
            Ok(n) if max.is_some_and(|m| n > m) => {
                max.map(|m| IssueKind::MaxInclusive(m as f64))
            }
            Ok(_) => None,
            Err(_) => Some(IssueKind::InvalidValue(format!("'{value}' is not an integer"))),
        },
        AttributeKind::Decimal {
            min_inclusive,
            max_inclusive,
        } => match value.trim().parse::<f64>() {
            Ok(n) if n.is_nan() => Some(IssueKind::InvalidValue("NaN".to_string())),
            Ok(n) if min_inclusive.is_some_and(|m| n < m) => {
                min_inclusive.map(IssueKind::MinInclusive)
            }
            Ok(n) if max_inclusive.is_some_and(|m| n > m) => {
                max_inclusive.map(IssueKind::MaxInclusive)
            }
            Ok(_) => None,
            Err(_) => Some(IssueKind::InvalidValue(format!("'{value}' is not a decimal"))),
        },
    }
}

/// Apply the exponent-mantissa correction for `issue` to `content`, if it qualifies.
fn correct(content: &mut ContentElement, issue: &ValidationIssue) -> Option<Correction> {
    let (IssueNode::Attribute(name), IssueKind::MaxInclusive(_)) = (&issue.node, &issue.kind)
    else {
        return None;
    };
    let element = content.descendant_mut(&issue.location)?;
    let from = element.attribute(name)?.to_string();
    let to = truncate_mantissa(&from)?;
    element.set_attribute(name.clone(), to.clone());
    Some(Correction {
        path: issue.path.clone(),
        attribute: name.clone(),
        from,
        to,
    })
}
