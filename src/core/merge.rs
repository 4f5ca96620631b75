//! Combining identity mappings with payload mappings
//!
//! Both operations are pure. A name present in the identity mapping is a
//! key component, never free-form payload, so overlaps are caller errors.

use crate::core::error::ControllerError;
use crate::core::field::{Attributes, Identity};

/// Union of `ids` and `kw`, in that order.
///
/// Fails with a 400 conflict if any name appears in both mappings, even
/// when the values agree.
pub fn merge(ids: &Identity, kw: &Attributes) -> Result<Attributes, ControllerError> {
    let overlapping: Vec<&str> = kw
        .keys()
        .filter(|name| ids.contains_key(*name))
        .map(String::as_str)
        .collect();
    if !overlapping.is_empty() {
        return Err(ControllerError::Conflict {
            message: format!(
                "conflicting fields in identity and payload: {}",
                overlapping.join(", ")
            ),
        });
    }

    let mut combined = ids.clone();
    combined.extend(kw.iter().map(|(k, v)| (k.clone(), v.clone())));
    Ok(combined)
}

/// `kw` without the names found in `ids`.
///
/// Repeating an identity component with the same value is tolerated; a
/// differing value fails with a 400 conflict.
pub fn eject(ids: &Identity, kw: &Attributes) -> Result<Attributes, ControllerError> {
    let mut payload = Attributes::with_capacity(kw.len());
    for (name, value) in kw {
        match ids.get(name) {
            Some(id_value) if id_value == value => {}
            Some(_) => {
                return Err(ControllerError::Conflict {
                    message: format!("conflicting values for identity field {}", name),
                });
            }
            None => {
                payload.insert(name.clone(), value.clone());
            }
        }
    }
    Ok(payload)
}
