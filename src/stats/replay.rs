use crate::types::Properties;
use serde_json::Value;

/// Property/value pairs captured from an all-scalar object descriptor that
/// later received a non-scalar value.
///
/// Every pair is fed back through the per-key path as a single-pair record,
/// so the columns the descriptor stood for survive its demotion.
#[derive(Debug, Default, PartialEq)]
pub(crate) struct ReplayBuffer {
    entries: Vec<(String, Value)>,
}

impl ReplayBuffer {
    pub fn capture(properties: &Properties) -> Self {
        let mut entries = Vec::new();
        for (name, property) in properties {
            // Limited properties lost their values but still had some
            if property.limited {
                entries.push((name.clone(), Value::String(String::new())));
                continue;
            }
            for value in &property.values {
                entries.push((name.clone(), Value::String(value.clone())));
            }
        }
        ReplayBuffer { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Property;

    #[test]
    fn test_capture_keeps_order() {
        let mut properties = Properties::new();
        properties.insert(
            "name".to_string(),
            Property {
                values: ["color".to_string(), "size".to_string()].into_iter().collect(),
                limited: false,
            },
        );
        properties.insert(
            "value".to_string(),
            Property {
                values: Default::default(),
                limited: true,
            },
        );

        let buffer = ReplayBuffer::capture(&properties);
        assert_eq!(buffer.len(), 3);
        let pairs: Vec<(&str, &Value)> = buffer.iter().collect();
        assert_eq!(pairs[0], ("name", &Value::from("color")));
        assert_eq!(pairs[1], ("name", &Value::from("size")));
        assert_eq!(pairs[2], ("value", &Value::from("")));
    }
}
