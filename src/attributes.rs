use indexmap::map::Entry;
use tracing::warn;

use crate::ast::AttributeList;
use crate::config::DuplicateAttributes;
use crate::error::{Result, TranslateError};
use crate::ir::Attributes;

/// Reserved key whose value interfaces expose as `client`.
pub const CLIENT_KEY: &str = "Client";

/// Turn an attribute list into a mapping, keeping source order.
/// An absent list is an empty mapping.
pub fn normalize(list: Option<&AttributeList>, policy: DuplicateAttributes) -> Result<Attributes> {
    let mut out = Attributes::new();
    let Some(list) = list else { return Ok(out) };

    for attribute in list {
        match out.entry(attribute.key.clone()) {
            Entry::Vacant(slot) => {
                slot.insert(attribute.value.clone());
            }
            Entry::Occupied(mut slot) => match policy {
                DuplicateAttributes::Reject => {
                    return Err(TranslateError::DuplicateAttribute {
                        key: attribute.key.clone(),
                    });
                }
                DuplicateAttributes::LastWins => {
                    warn!(key = %attribute.key, "duplicate attribute key, keeping last value");
                    slot.insert(attribute.value.clone());
                }
            },
        }
    }
    Ok(out)
}

// ------------------------------- Tests ------------------------------------ //
