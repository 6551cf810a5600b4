use std::borrow::Cow;

use hashlink::LinkedHashMap;
use saphyr::{Scalar, Yaml};
use tracing::debug;

/// A task declaration as far as the mirror cares: its name, the tasks it
/// depends on and the paths it reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    name: String,
    dependencies: Vec<String>,
    inputs: Vec<String>,
}

impl Task {
    pub fn new(
        name: impl Into<String>,
        dependencies: Vec<String>,
        inputs: Vec<String>,
    ) -> Self {
        Self {
            name: name.into(),
            dependencies,
            inputs,
        }
    }

    pub fn from_task_yaml(task_name: &str, task_data: &LinkedHashMap<Yaml, Yaml>) -> Self {
        debug!("Parsing task '{}'", task_name);

        Task {
            name: task_name.to_string(),
            dependencies: string_sequence(task_data, "dependsOn"),
            inputs: string_sequence(task_data, "inputs"),
        }
    }

    pub fn id(&self) -> &str {
        &self.name
    }

    pub fn dependencies(&self) -> &[String] {
        &self.dependencies
    }

    pub fn inputs(&self) -> &[String] {
        &self.inputs
    }
}

/// Reads `key` as a list of strings. Non-string items are dropped, a missing
/// key or a non-sequence value yields an empty list.
fn string_sequence(task_data: &LinkedHashMap<Yaml, Yaml>, key: &'static str) -> Vec<String> {
    task_data
        .get(&Yaml::Value(Scalar::String(Cow::Borrowed(key))))
        .and_then(|v| v.as_sequence())
        .map(|seq| {
            seq.iter()
                .filter_map(|item| item.as_str().map(|s| s.to_string()))
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use saphyr::LoadableYamlNode;

    fn task_from(yaml: &str) -> Task {
        let docs = Yaml::load_from_str(yaml).expect("valid yaml");
        let mapping = docs[0].as_mapping().expect("task is a mapping");
        Task::from_task_yaml("build", mapping)
    }

    #[test]
    fn parses_dependencies_and_inputs() {
        let task = task_from("dependsOn: [generate]\ninputs: [src, Cargo.toml]\ncommand: cargo build");

        assert_eq!(task.id(), "build");
        assert_eq!(task.dependencies(), ["generate"]);
        assert_eq!(task.inputs(), ["src", "Cargo.toml"]);
    }

    #[test]
    fn missing_lists_are_empty() {
        let task = task_from("command: echo hello");

        assert!(task.dependencies().is_empty());
        assert!(task.inputs().is_empty());
    }

    #[test]
    fn non_string_items_are_dropped() {
        let task = task_from("inputs: [src, 42, {nested: map}, docs]");

        assert_eq!(task.inputs(), ["src", "docs"]);
    }

    #[test]
    fn scalar_inputs_are_ignored() {
        let task = task_from("inputs: src");

        assert!(task.inputs().is_empty());
    }
}
