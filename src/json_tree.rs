//! Generic JSON tree walk and event-name substitution
//!
//! Campaigns name custom events freely, while some simulator builds only
//! accept a fixed set of builtin slot names. `EventRenamer` rewrites every
//! event-name string to `GP_EVENT_000`, `GP_EVENT_001`, ... in first-seen
//! order and remembers the mapping so post-processing can translate back.

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Visitor over a JSON tree
///
/// `key` is the object key the value sits under (the nearest enclosing key
/// for array elements) and `None` at the root.
pub trait JsonVisitor {
    fn visit_string(&mut self, key: Option<&str>, value: &mut String);

    fn visit_number(&mut self, _key: Option<&str>, _value: &mut serde_json::Number) {}
}

/// Depth-first walk calling the visitor on every leaf string and number
pub fn walk_mut<V: JsonVisitor + ?Sized>(value: &mut Value, visitor: &mut V) {
    walk_inner(value, None, visitor);
}

fn walk_inner<V: JsonVisitor + ?Sized>(value: &mut Value, key: Option<&str>, visitor: &mut V) {
    match value {
        Value::Object(map) => {
            for (k, v) in map.iter_mut() {
                walk_inner(v, Some(k.as_str()), visitor);
            }
        }
        Value::Array(items) => {
            for item in items.iter_mut() {
                walk_inner(item, key, visitor);
            }
        }
        Value::String(s) => visitor.visit_string(key, s),
        Value::Number(n) => visitor.visit_number(key, n),
        Value::Bool(_) | Value::Null => {}
    }
}

/// Keys whose string values are event names
pub const EVENT_NAME_KEYS: &[&str] = &[
    "Broadcast_Event",
    "Trigger_Condition_List",
    "Positive_Diagnosis_Event",
    "Negative_Diagnosis_Event",
    "Defaulters_Event",
    "Event_Trigger",
    "Expiration_Event",
    "Event_Or_Config",
];

/// Events the simulator always understands; these are never renamed
pub const BUILTIN_EVENTS: &[&str] = &[
    "NoTrigger",
    "Births",
    "EveryUpdate",
    "EveryTimeStep",
    "NewInfectionEvent",
    "NewClinicalCase",
    "NewSevereCase",
    "NewlySymptomatic",
    "DiseaseDeaths",
    "NonDiseaseDeaths",
    "Emigrating",
    "Immigrating",
    "HappyBirthday",
    "GaveBirth",
    "Pregnant",
];

/// Rewrites ad-hoc event names to builtin slot names
#[derive(Debug, Default, Clone)]
pub struct EventRenamer {
    mapping: BTreeMap<String, String>,
    order: Vec<String>,
}

impl EventRenamer {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot_name(index: usize) -> String {
        format!("GP_EVENT_{:03}", index)
    }

    /// Slot for `name`, allocating the next one on first sight
    pub fn slot_for(&mut self, name: &str) -> String {
        if let Some(slot) = self.mapping.get(name) {
            return slot.clone();
        }
        let slot = Self::slot_name(self.order.len());
        self.mapping.insert(name.to_string(), slot.clone());
        self.order.push(name.to_string());
        slot
    }

    /// Original names in allocation order, paired with their slots
    pub fn mapping(&self) -> Vec<(String, String)> {
        self.order
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), Self::slot_name(i)))
            .collect()
    }

    /// Reverse lookup used when reading renamed output
    pub fn original_name(&self, slot: &str) -> Option<&str> {
        self.order
            .iter()
            .enumerate()
            .find(|(i, _)| Self::slot_name(*i) == slot)
            .map(|(_, name)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

impl JsonVisitor for EventRenamer {
    fn visit_string(&mut self, key: Option<&str>, value: &mut String) {
        let Some(key) = key else { return };
        if !EVENT_NAME_KEYS.contains(&key) || value.is_empty() {
            return;
        }
        if BUILTIN_EVENTS.contains(&value.as_str()) {
            return;
        }
        *value = self.slot_for(value);
    }
}

#[derive(Serialize)]
struct MappingEntry<'a> {
    original: &'a str,
    slot: &'a str,
}

/// Rename events in a campaign file and write the result plus a mapping file
///
/// The mapping is written next to `output` as `<stem>_event_map.json`.
pub fn rename_campaign_events<P: AsRef<Path>, Q: AsRef<Path>>(
    input: P,
    output: Q,
) -> Result<EventRenamer> {
    let input = input.as_ref();
    let output = output.as_ref();

    let contents = fs::read_to_string(input)
        .with_context(|| format!("Failed to read campaign file {}", input.display()))?;
    let mut tree: Value = serde_json::from_str(&contents)
        .with_context(|| format!("Invalid campaign JSON in {}", input.display()))?;

    let mut renamer = EventRenamer::new();
    walk_mut(&mut tree, &mut renamer);

    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }
    let rendered = serde_json::to_string_pretty(&tree)?;
    fs::write(output, rendered)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    let map_path = event_map_path(output);
    let pairs = renamer.mapping();
    let entries: Vec<MappingEntry> = pairs
        .iter()
        .map(|(original, slot)| MappingEntry { original, slot })
        .collect();
    fs::write(&map_path, serde_json::to_string_pretty(&entries)?)
        .with_context(|| format!("Failed to write {}", map_path.display()))?;

    tracing::info!(
        "Renamed {} events: {} -> {}",
        renamer.len(),
        input.display(),
        output.display()
    );
    Ok(renamer)
}

/// Location of the mapping file written alongside a renamed campaign
pub fn event_map_path(output: &Path) -> std::path::PathBuf {
    let stem = output
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "campaign".to_string());
    output.with_file_name(format!("{}_event_map.json", stem))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn sample_campaign() -> Value {
        json!({
            "Events": [
                {
                    "Start_Day": 1,
                    "Event_Coordinator_Config": {
                        "Intervention_Config": {
                            "class": "BroadcastEvent",
                            "Broadcast_Event": "Vaccinated_Twice"
                        }
                    }
                },
                {
                    "Start_Day": 2,
                    "Event_Coordinator_Config": {
                        "Intervention_Config": {
                            "class": "NodeLevelHealthTriggeredIV",
                            "Trigger_Condition_List": ["Tested_Positive", "Births", "Vaccinated_Twice"],
                            "Actual_IndividualIntervention_Config": {
                                "class": "SimpleDiagnostic",
                                "Positive_Diagnosis_Event": "Tested_Positive",
                                "Notes": "Vaccinated_Twice"
                            }
                        }
                    }
                }
            ]
        })
    }

    #[test]
    fn test_rename_first_seen_order() {
        let mut tree = sample_campaign();
        let mut renamer = EventRenamer::new();
        walk_mut(&mut tree, &mut renamer);

        assert_eq!(
            renamer.mapping(),
            vec![
                ("Vaccinated_Twice".to_string(), "GP_EVENT_000".to_string()),
                ("Tested_Positive".to_string(), "GP_EVENT_001".to_string()),
            ]
        );

        let trigger = &tree["Events"][1]["Event_Coordinator_Config"]["Intervention_Config"];
        assert_eq!(
            trigger["Trigger_Condition_List"],
            json!(["GP_EVENT_001", "Births", "GP_EVENT_000"])
        );
        assert_eq!(
            trigger["Actual_IndividualIntervention_Config"]["Positive_Diagnosis_Event"],
            "GP_EVENT_001"
        );
    }

    #[test]
    fn test_non_event_keys_untouched() {
        let mut tree = sample_campaign();
        walk_mut(&mut tree, &mut EventRenamer::new());
        let notes = &tree["Events"][1]["Event_Coordinator_Config"]["Intervention_Config"]
            ["Actual_IndividualIntervention_Config"]["Notes"];
        assert_eq!(notes, "Vaccinated_Twice");
        assert_eq!(
            tree["Events"][0]["Event_Coordinator_Config"]["Intervention_Config"]["class"],
            "BroadcastEvent"
        );
    }

    #[test]
    fn test_reverse_lookup() {
        let mut renamer = EventRenamer::new();
        renamer.slot_for("A");
        renamer.slot_for("B");
        assert_eq!(renamer.slot_for("A"), "GP_EVENT_000");
        assert_eq!(renamer.original_name("GP_EVENT_001"), Some("B"));
        assert_eq!(renamer.original_name("GP_EVENT_009"), None);
    }

    struct NumberDoubler;

    impl JsonVisitor for NumberDoubler {
        fn visit_string(&mut self, _key: Option<&str>, _value: &mut String) {}

        fn visit_number(&mut self, _key: Option<&str>, value: &mut serde_json::Number) {
            if let Some(n) = value.as_f64().and_then(|v| serde_json::Number::from_f64(v * 2.0)) {
                *value = n;
            }
        }
    }

    #[test]
    fn test_visitor_sees_numbers() {
        let mut tree = json!({"a": [1.0, {"b": 2.5}], "c": null});
        walk_mut(&mut tree, &mut NumberDoubler);
        assert_eq!(tree, json!({"a": [2.0, {"b": 5.0}], "c": null}));
    }

    #[test]
    fn test_rename_campaign_file() {
        let temp_dir = TempDir::new().unwrap();
        let input = temp_dir.path().join("campaign.json");
        let output = temp_dir.path().join("out").join("campaign_renamed.json");
        fs::write(&input, sample_campaign().to_string()).unwrap();

        let renamer = rename_campaign_events(&input, &output).unwrap();
        assert_eq!(renamer.len(), 2);

        let written: Value = serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
        assert_eq!(
            written["Events"][0]["Event_Coordinator_Config"]["Intervention_Config"]["Broadcast_Event"],
            "GP_EVENT_000"
        );

        let map: Value =
            serde_json::from_str(&fs::read_to_string(event_map_path(&output)).unwrap()).unwrap();
        assert_eq!(map[1]["original"], "Tested_Positive");
        assert_eq!(map[1]["slot"], "GP_EVENT_001");
    }
}
