//! Image value object

use crate::core::field::{FieldType, FieldValue, from_json_field_value, json_field_value};
use serde::{Deserialize, Serialize};

/// Three renditions of one picture, stored inline on its owner
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    pub small: Option<String>,
    pub medium: Option<String>,
    pub large: Option<String>,
}

impl Image {
    pub fn new(small: Option<String>, medium: Option<String>, large: Option<String>) -> Self {
        Self {
            small,
            medium,
            large,
        }
    }

    /// No rendition at all
    pub fn is_empty(&self) -> bool {
        self.small.is_none() && self.medium.is_none() && self.large.is_none()
    }
}

impl FieldType for Image {
    fn to_field_value(&self) -> FieldValue {
        json_field_value(self)
    }

    fn from_field_value(value: FieldValue) -> Result<Self, String> {
        from_json_field_value(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_field_roundtrip() {
        let image = Image::new(Some("s.jpg".into()), None, Some("l.jpg".into()));
        let value = image.to_field_value();
        assert!(matches!(value, FieldValue::Json(_)));
        assert_eq!(Image::from_field_value(value).unwrap(), image);
    }

    #[test]
    fn test_image_rejects_scalars() {
        assert!(Image::from_field_value(FieldValue::from("s.jpg")).is_err());
    }

    #[test]
    fn test_empty_image() {
        assert!(Image::default().is_empty());
        assert!(!Image::new(Some("a".into()), None, None).is_empty());
    }
}
