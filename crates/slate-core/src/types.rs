use crate::natsort;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// A named unit of footage: one or more files on the source plus their
/// combined size. Paths are `/`-separated and relative to the source root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Clip {
    pub name: String,
    pub paths: Vec<String>,
    pub total_size: u64,
}

impl Clip {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            paths: Vec::new(),
            total_size: 0,
        }
    }
}

/// Unique identifier of a take: scene plus take number.
///
/// Ordered by natural comparison of `scene`, then of `num`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct TakeId {
    pub scene: String,
    pub num: String,
}

impl TakeId {
    pub fn new(scene: impl Into<String>, num: impl Into<String>) -> Self {
        Self {
            scene: scene.into(),
            num: num.into(),
        }
    }
}

impl Ord for TakeId {
    fn cmp(&self, other: &Self) -> Ordering {
        natsort::compare(&self.scene, &other.scene)
            .then_with(|| natsort::compare(&self.num, &other.num))
    }
}

impl PartialOrd for TakeId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for TakeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.scene, self.num)
    }
}

/// A selection record pairing a take id with the clip it was shot on.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Take {
    pub id: TakeId,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub clip_name: String,
    #[serde(default)]
    pub select: bool,
}

impl Take {
    pub fn new(id: TakeId, clip_name: impl Into<String>, select: bool) -> Self {
        Self {
            id,
            clip_name: clip_name.into(),
            select,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn take_id_orders_numerically() {
        assert!(TakeId::new("2", "") < TakeId::new("10", ""));
        assert!(TakeId::new("1", "2") < TakeId::new("1", "3"));
        assert!(TakeId::new("1", "10") < TakeId::new("2", "1"));
        assert!(TakeId::new("4A", "1") > TakeId::new("4", "9"));
    }

    #[test]
    fn take_id_equality_matches_ordering() {
        let a = TakeId::new("01", "1");
        let b = TakeId::new("1", "1");
        assert_ne!(a, b);
        assert_ne!(a.cmp(&b), Ordering::Equal);
    }

    #[test]
    fn take_id_display() {
        assert_eq!(TakeId::new("12", "3").to_string(), "12-3");
    }

    #[test]
    fn clip_json_shape() {
        let clip = Clip {
            name: "a.mov".into(),
            paths: vec!["a.mov".into()],
            total_size: 42,
        };
        let json = serde_json::to_value(&clip).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"name": "a.mov", "paths": ["a.mov"], "totalSize": 42})
        );
    }

    #[test]
    fn take_json_omits_empty_clip_name() {
        let take = Take::new(TakeId::new("1", "2"), "", true);
        let json = serde_json::to_value(&take).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"id": {"scene": "1", "num": "2"}, "select": true})
        );
        let back: Take = serde_json::from_value(json).unwrap();
        assert_eq!(back, take);
    }
}
