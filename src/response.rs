//! Parsing of the CAS 2.0 `serviceValidate` XML response.
//!
//! The protocol does not guarantee any particular namespace prefix, so
//! elements are located by local name first; the namespace URI is only
//! confirmed where the core/extension distinction matters.

use std::collections::HashMap;

use roxmltree::{Document, Node};
use serde::{Deserialize, Serialize};

/// Namespace of the CAS 2.0 core elements.
pub const CAS_NAMESPACE: &str = "http://www.yale.edu/tp/cas";

/// Outcome of one ticket validation, assembled once and never mutated.
///
/// Invariant: an empty `errors` list implies a non-empty `user`; a response
/// that declared success without naming a user carries exactly one error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub user: Option<String>,
    pub attributes: HashMap<String, String>,
    pub errors: Vec<String>,
}

impl ValidationResult {
    /// CAS accepted the ticket and named a user.
    pub fn is_success(&self) -> bool {
        self.errors.is_empty() && self.user.is_some()
    }
}

/// Parse a CAS 2.0 response body.
///
/// Malformed XML is an `Err`; a well-formed but semantically incomplete
/// response comes back as `Ok` with the problem recorded in `errors`.
pub fn parse_cas20(
    body: &str,
    attribute_namespace: &str,
) -> Result<ValidationResult, roxmltree::Error> {
    let document = Document::parse(body)?;
    let mut result = ValidationResult::default();

    let success = document
        .descendants()
        .find(|n| n.is_element() && n.tag_name().name() == "authenticationSuccess");

    let Some(success) = success else {
        // No success element: collect every failure text in document order.
        for failure in document
            .descendants()
            .filter(|n| n.is_element() && n.tag_name().name() == "authenticationFailure")
        {
            if let Some(text) = element_text(&failure) {
                result.errors.push(text);
            }
        }
        return Ok(result);
    };

    for user in success.children().filter(|n| {
        n.is_element()
            && n.tag_name().name() == "user"
            && n.tag_name().namespace() == Some(CAS_NAMESPACE)
    }) {
        if let Some(text) = element_text(&user) {
            result.user = Some(text);
        }
    }
    if result.user.is_none() {
        result
            .errors
            .push("Invalid Auth Response: Success Declared but no User given".to_string());
        return Ok(result);
    }

    // Attribute elements sit one container below the success element; only
    // the recognized extension namespace counts. Later duplicates overwrite.
    for container in success.children().filter(Node::is_element) {
        for attribute in container.children().filter(|n| {
            n.is_element() && n.tag_name().namespace() == Some(attribute_namespace)
        }) {
            if let Some(text) = element_text(&attribute) {
                result
                    .attributes
                    .insert(attribute.tag_name().name().to_string(), text);
            }
        }
    }

    Ok(result)
}

fn element_text(node: &Node) -> Option<String> {
    let text = node.text()?.trim();
    (!text.is_empty()).then(|| text.to_string())
}
