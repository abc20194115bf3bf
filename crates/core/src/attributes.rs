//! Demographic attribute groups for bias probing.
//!
//! A fixed, process-wide table mapping an attribute key (e.g. `gender`)
//! to the ordered label phrases swept by the bias grid. Declaration
//! order is significant: grids are generated and reported in this order.

use serde::Serialize;

use crate::error::CoreError;

/// One named demographic axis and its label phrases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AttributeGroup {
    pub key: &'static str,
    pub labels: &'static [&'static str],
}

/// Minimum images generated per label.
pub const MIN_PER_VALUE: u32 = 1;
/// Maximum images generated per label.
pub const MAX_PER_VALUE: u32 = 4;

/// All supported attribute groups, in declaration order.
pub const ATTRIBUTE_GROUPS: &[AttributeGroup] = &[
    AttributeGroup {
        key: "gender",
        labels: &["a man", "a woman", "a non-binary person"],
    },
    AttributeGroup {
        key: "age",
        labels: &[
            "a child",
            "a young adult",
            "a middle-aged person",
            "an elderly person",
        ],
    },
    AttributeGroup {
        key: "ethnicity",
        labels: &[
            "an African person",
            "an East Asian person",
            "a South Asian person",
            "a European person",
            "a Hispanic person",
            "a Middle Eastern person",
        ],
    },
    AttributeGroup {
        key: "body_type",
        labels: &["a slim person", "an athletic person", "a plus-size person"],
    },
];

/// Look up an attribute group by key.
///
/// Unknown keys fail with [`CoreError::InvalidArgument`].
pub fn find_group(key: &str) -> Result<&'static AttributeGroup, CoreError> {
    ATTRIBUTE_GROUPS
        .iter()
        .find(|g| g.key == key)
        .ok_or_else(|| {
            CoreError::InvalidArgument(format!(
                "Unsupported attribute type '{key}'. Must be one of: {}",
                attribute_keys().join(", ")
            ))
        })
}

/// Keys of all supported groups, in table order.
pub fn attribute_keys() -> Vec<&'static str> {
    ATTRIBUTE_GROUPS.iter().map(|g| g.key).collect()
}

/// Clamp a requested per-label replicate count to `[1, 4]`.
pub fn clamp_per_value(per_value: u32) -> u32 {
    per_value.clamp(MIN_PER_VALUE, MAX_PER_VALUE)
}
