use std::collections::{BTreeMap, BTreeSet};

use serde_json::{Map, Value};

use crate::{GroupId, LightId, ProtocolError};

/// The groups a module defines, each a set of light IDs.
///
/// Modules send this as JSON whose keys are the group IDs written as text, e.g.
/// `{"0":[1,2],"1":[3]}`. Keys are normalised to [`GroupId`]s when parsing so membership
/// checks never compare text against numbers.
///
/// # Examples
///
/// ```
/// use picolights_core::{GroupConfig, GroupId, LightId};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = GroupConfig::from_json(br#"{"0":[1,2],"1":[3]}"#)?;
/// assert!(config.contains(GroupId::try_new(0)?));
/// assert!(!config.contains(GroupId::try_new(5)?));
///
/// let lights = config.lights(GroupId::try_new(1)?).unwrap();
/// assert!(lights.contains(&LightId::try_new(3)?));
/// # Ok(()) }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupConfig {
    groups: BTreeMap<GroupId, BTreeSet<LightId>>,
}

impl GroupConfig {
    /// Creates an empty configuration.
    pub fn new() -> Self {
        Default::default()
    }

    /// Parses the JSON group assignments sent by a module.
    ///
    /// # Errors
    ///
    /// Returns:
    /// * [`ProtocolError::InvalidGroupConfig`] if the payload is not a JSON object of integer arrays.
    /// * [`ProtocolError::InvalidGroupKey`] if a key is not a group ID between 0 and 15.
    /// * [`ProtocolError::InvalidGroupMember`] if a member is not a light ID between 0 and 15.
    pub fn from_json(payload: &[u8]) -> Result<Self, ProtocolError> {
        let raw: BTreeMap<String, Vec<i64>> = serde_json::from_slice(payload)?;

        let mut config = GroupConfig::new();
        for (key, members) in raw {
            let group = key
                .trim()
                .parse::<i32>()
                .ok()
                .and_then(|value| GroupId::try_new(value).ok())
                .ok_or_else(|| ProtocolError::InvalidGroupKey { key: key.clone() })?;

            let lights = members
                .into_iter()
                .map(|value| {
                    i32::try_from(value)
                        .ok()
                        .and_then(|id| LightId::try_new(id).ok())
                        .ok_or(ProtocolError::InvalidGroupMember {
                            group: group.get(),
                            value,
                        })
                })
                .collect::<Result<BTreeSet<_>, _>>()?;

            config.groups.entry(group).or_default().extend(lights);
        }
        Ok(config)
    }

    /// Serialises the configuration the way a module sends it, with text keys.
    pub fn to_json(&self) -> String {
        let object = self
            .groups
            .iter()
            .map(|(group, lights)| {
                let members = lights.iter().map(|id| Value::from(id.get())).collect();
                (group.to_string(), Value::Array(members))
            })
            .collect::<Map<_, _>>();
        Value::Object(object).to_string()
    }

    /// Adds lights to a group, creating it if necessary.
    pub fn insert<I>(&mut self, group: GroupId, lights: I)
    where
        I: IntoIterator<Item = LightId>,
    {
        self.groups.entry(group).or_default().extend(lights);
    }

    /// Whether the group is defined.
    pub fn contains(&self, group: GroupId) -> bool {
        self.groups.contains_key(&group)
    }

    /// Returns the lights in a group, if it is defined.
    pub fn lights(&self, group: GroupId) -> Option<&BTreeSet<LightId>> {
        self.groups.get(&group)
    }

    /// Iterates over the groups in ascending ID order.
    pub fn iter(&self) -> impl Iterator<Item = (GroupId, &BTreeSet<LightId>)> {
        self.groups.iter().map(|(&group, lights)| (group, lights))
    }

    /// Number of groups defined.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Whether no groups are defined.
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn group(id: i32) -> GroupId {
        GroupId::try_new(id).unwrap()
    }

    fn light(id: i32) -> LightId {
        LightId::try_new(id).unwrap()
    }

    #[test]
    fn text_keys_normalised() {
        let config = GroupConfig::from_json(br#"{"0":[1,2],"1":[3]}"#).unwrap();
        assert_eq!(2, config.len());
        assert_eq!(Some(&BTreeSet::from([light(1), light(2)])), config.lights(group(0)));
        assert_eq!(Some(&BTreeSet::from([light(3)])), config.lights(group(1)));
        assert!(!config.contains(group(2)));
    }

    #[test]
    fn empty_object_is_empty_config() {
        let config = GroupConfig::from_json(b"{}").unwrap();
        assert!(config.is_empty());
    }

    #[test]
    fn empty_group_still_defined() {
        let config = GroupConfig::from_json(br#"{"7":[]}"#).unwrap();
        assert!(config.contains(group(7)));
        assert!(config.lights(group(7)).unwrap().is_empty());
    }

    #[test_case(b"not json" ; "garbage")]
    #[test_case(b"[1,2,3]" ; "array")]
    #[test_case(br#"{"0":"1,2"}"# ; "string members")]
    #[test_case(br#"{"0":[1,2]"# ; "truncated")]
    fn malformed_json_rejected(payload: &[u8]) {
        assert!(matches!(GroupConfig::from_json(payload), Err(ProtocolError::InvalidGroupConfig { .. })));
    }

    #[test_case(br#"{"16":[1]}"# ; "out of range")]
    #[test_case(br#"{"kitchen":[1]}"# ; "not a number")]
    #[test_case(br#"{"-1":[1]}"# ; "negative")]
    fn bad_key_rejected(payload: &[u8]) {
        assert!(matches!(GroupConfig::from_json(payload), Err(ProtocolError::InvalidGroupKey { .. })));
    }

    #[test]
    fn bad_member_rejected() {
        let error = GroupConfig::from_json(br#"{"2":[1,99]}"#).unwrap_err();
        assert!(matches!(error, ProtocolError::InvalidGroupMember { group: 2, value: 99 }));
    }

    #[test]
    fn json_uses_text_keys() {
        let mut config = GroupConfig::new();
        config.insert(group(1), vec![light(3)]);
        config.insert(group(0), vec![light(2), light(1)]);
        assert_eq!(r#"{"0":[1,2],"1":[3]}"#, config.to_json());
        assert_eq!(config, GroupConfig::from_json(config.to_json().as_bytes()).unwrap());
    }
}
