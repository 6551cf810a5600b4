use std::borrow::Cow;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use compio::fs;
use hashlink::LinkedHashMap;
use saphyr::{LoadableYamlNode, Scalar, Yaml};
use snafu::prelude::*;
use tracing::{debug, warn};

use crate::tasks::Task;

const TASK_FILE_NAME: &str = "tasks.yaml";

fn get_task_file_path(root: &Path) -> PathBuf {
    root.join(TASK_FILE_NAME)
}

/// Tasks declared in a project's `tasks.yaml`, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct TaskRegistry {
    tasks: LinkedHashMap<String, Task>,
}

impl TaskRegistry {
    pub async fn read(root: &Path) -> Result<Self, TaskRegistryCreationError> {
        Self::from_path(get_task_file_path(root)).await
    }

    pub async fn from_path(path: PathBuf) -> Result<Self, TaskRegistryCreationError> {
        debug!("Reading task file: {}", path.display());
        let bytes = fs::read(&path).await.context(ReadSnafu {
            file_path: path.display().to_string(),
        })?;
        debug!("Read {} bytes from task file", bytes.len());

        let contents = String::from_utf8(bytes).context(EncodingSnafu {
            file_path: path.display().to_string(),
        })?;
        contents.as_str().try_into()
    }

    pub fn get_task_by_id(&self, id: impl AsRef<str>) -> Option<&Task> {
        self.tasks.get(id.as_ref())
    }

    pub fn get_tasks_iter(&self) -> impl Iterator<Item = &Task> {
        self.tasks.values()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Tasks whose inputs matter for `target`: the target itself followed by
    /// its transitive dependencies. Every task when no target is given.
    pub fn needed_tasks(&self, target: Option<&str>) -> Result<Vec<&Task>, TaskLookupError> {
        let Some(target) = target else {
            return Ok(self.get_tasks_iter().collect());
        };
        let target_task = self
            .get_task_by_id(target)
            .context(UnknownTaskSnafu { task_name: target })?;

        let mut needed = Vec::new();
        let mut visited = HashSet::new();
        let mut pending = vec![target_task];

        while let Some(task) = pending.pop() {
            if !visited.insert(task.id()) {
                continue;
            }
            needed.push(task);

            for dep_id in task.dependencies().iter().rev() {
                match self.get_task_by_id(dep_id) {
                    Some(dependency) => pending.push(dependency),
                    None => warn!(
                        "Task '{}' depends on unknown task '{}', ignoring it",
                        task.id(),
                        dep_id
                    ),
                }
            }
        }

        debug!(
            "Needed tasks for '{}': {:?}",
            target,
            needed.iter().map(|task| task.id()).collect::<Vec<_>>()
        );
        Ok(needed)
    }

    fn parse_tasks_from_yaml(
        top_level: &LinkedHashMap<Yaml, Yaml>,
    ) -> Result<Vec<Task>, TaskRegistryCreationError> {
        let tasks = top_level
            .get(&Yaml::Value(Scalar::String(Cow::Borrowed("tasks"))))
            .unwrap_or(&Yaml::Mapping(LinkedHashMap::new()))
            .as_mapping()
            .ok_or(TaskRegistryCreationError::TasksNotMap)?
            .iter()
            .filter_map(|(key, value)| {
                if let (Yaml::Value(Scalar::String(task_name)), Yaml::Mapping(task_data)) =
                    (key, value)
                {
                    return Some(Task::from_task_yaml(task_name, task_data));
                }
                debug!("Skipping invalid task entry: {:?}", key);
                None
            })
            .collect::<Vec<_>>();

        Ok(tasks)
    }
}

impl TryFrom<&str> for TaskRegistry {
    type Error = TaskRegistryCreationError;

    fn try_from(contents: &str) -> Result<Self, Self::Error> {
        let documents = Yaml::load_from_str(contents).context(ParseSnafu)?;
        let top_level = documents
            .first()
            .ok_or(TaskRegistryCreationError::MalformedConfig)?
            .as_mapping()
            .ok_or(TaskRegistryCreationError::TopLevelNotMap)?;

        let tasks = Self::parse_tasks_from_yaml(top_level)?.into_iter().try_fold(
            LinkedHashMap::new(),
            |mut acc, task| {
                if acc.contains_key(task.id()) {
                    // saphyr rejects duplicate keys while parsing, kept for other sources
                    DuplicateTaskSnafu {
                        task_name: task.id(),
                    }
                    .fail()
                } else {
                    acc.insert(task.id().to_string(), task);
                    Ok(acc)
                }
            },
        )?;

        Ok(TaskRegistry { tasks })
    }
}

#[derive(Debug, Snafu)]
pub enum TaskRegistryCreationError {
    #[snafu(display("Failed to read the task file: {}", file_path))]
    ReadError {
        file_path: String,
        source: std::io::Error,
    },
    #[snafu(display("Task file {} is not valid UTF-8", file_path))]
    EncodingError {
        file_path: String,
        source: std::string::FromUtf8Error,
    },
    #[snafu(display("Failed to parse the task file"))]
    ParseError { source: saphyr::ScanError },
    #[snafu(display("Improperly formatted task file"))]
    MalformedConfig,
    #[snafu(display("Top level of the task file should be a map"))]
    TopLevelNotMap,
    #[snafu(display("Tasks section should be a map"))]
    TasksNotMap,
    #[snafu(display("Task '{}' is defined multiple times", task_name))]
    DuplicateTask { task_name: String },
}

#[derive(Debug, Snafu)]
pub enum TaskLookupError {
    #[snafu(display("Task '{}' is not declared in {}", task_name, TASK_FILE_NAME))]
    UnknownTask { task_name: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::*;
    use tempfile::TempDir;

    const PROJECT: &str = r#"
tasks:
  generate:
    inputs: [schema]
  compile:
    dependsOn: [generate]
    inputs: [src]
  test:
    dependsOn: [compile, generate]
    inputs: [tests]
  docs:
    inputs: [docs]
"#;

    fn registry(yaml: &str) -> TaskRegistry {
        yaml.try_into().expect("valid task file")
    }

    fn ids(tasks: &[&Task]) -> Vec<String> {
        tasks.iter().map(|task| task.id().to_string()).collect()
    }

    #[compio::test]
    async fn registry_returns_error_on_nonexistent_file() {
        let result = TaskRegistry::from_path(PathBuf::from("nonexistent.yaml")).await;
        assert!(matches!(
            result,
            Err(TaskRegistryCreationError::ReadError { .. })
        ));
    }

    #[compio::test]
    async fn registry_reads_task_file_from_root() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        std::fs::write(dir.path().join(TASK_FILE_NAME), PROJECT).expect("Failed to write tasks");

        let registry = TaskRegistry::read(dir.path())
            .await
            .expect("Failed to read registry");

        assert_eq!(registry.len(), 4);
        assert_eq!(
            registry.get_task_by_id("compile").map(|task| task.inputs()),
            Some(&["src".to_string()][..])
        );
    }

    #[compio::test]
    async fn registry_rejects_non_utf8_file() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        std::fs::write(dir.path().join(TASK_FILE_NAME), [0xffu8, 0xfe, 0x00])
            .expect("Failed to write tasks");

        let result = TaskRegistry::read(dir.path()).await;

        assert!(matches!(
            result,
            Err(TaskRegistryCreationError::EncodingError { .. })
        ));
    }

    #[rstest]
    #[case("invalid: yaml: content: [unclosed")]
    fn registry_returns_error_on_invalid_yaml(#[case] contents: &str) {
        let result: Result<TaskRegistry, _> = contents.try_into();
        assert!(matches!(
            result,
            Err(TaskRegistryCreationError::ParseError { .. })
        ));
    }

    #[test]
    fn registry_returns_error_on_empty_file() {
        let result: Result<TaskRegistry, _> = "".try_into();
        assert!(matches!(
            result,
            Err(TaskRegistryCreationError::MalformedConfig)
        ));
    }

    #[rstest]
    #[case("- item1\n- item2")]
    #[case("just a string")]
    fn registry_requires_top_level_map(#[case] contents: &str) {
        let result: Result<TaskRegistry, _> = contents.try_into();
        assert!(matches!(
            result,
            Err(TaskRegistryCreationError::TopLevelNotMap)
        ));
    }

    #[test]
    fn registry_requires_tasks_map() {
        let result: Result<TaskRegistry, _> = "tasks:\n  - invalid_task_format".try_into();
        assert!(matches!(result, Err(TaskRegistryCreationError::TasksNotMap)));
    }

    #[rstest]
    #[case("tasks: {}")]
    #[case("other_config: value")]
    fn registry_handles_missing_or_empty_tasks(#[case] contents: &str) {
        assert!(registry(contents).is_empty());
    }

    #[test]
    fn registry_skips_invalid_task_entries() {
        let registry = registry(
            r#"
tasks:
  123: "invalid numeric key"
  valid_task:
    inputs: [src]
  "another_invalid": "string value instead of map"
  null_task: null
"#,
        );

        assert_eq!(registry.len(), 1);
        assert!(registry.get_task_by_id("valid_task").is_some());
    }

    #[test]
    fn registry_keeps_declaration_order() {
        let registry = registry(PROJECT);

        let ids: Vec<_> = registry.get_tasks_iter().map(|task| task.id()).collect();

        assert_eq!(ids, ["generate", "compile", "test", "docs"]);
    }

    #[test]
    fn needed_tasks_without_target_is_everything() {
        let registry = registry(PROJECT);

        let needed = registry.needed_tasks(None).unwrap();

        assert_eq!(ids(&needed), ["generate", "compile", "test", "docs"]);
    }

    #[rstest]
    #[case("generate", &["generate"])]
    #[case("compile", &["compile", "generate"])]
    #[case("test", &["test", "compile", "generate"])]
    #[case("docs", &["docs"])]
    fn needed_tasks_follow_dependencies(#[case] target: &str, #[case] expected: &[&str]) {
        let registry = registry(PROJECT);

        let needed = registry.needed_tasks(Some(target)).unwrap();

        assert_eq!(ids(&needed), expected);
    }

    #[test]
    fn needed_tasks_survive_cycles_and_unknown_dependencies() {
        let registry = registry(
            r#"
tasks:
  a:
    dependsOn: [b, ghost]
  b:
    dependsOn: [a]
"#,
        );

        let needed = registry.needed_tasks(Some("a")).unwrap();

        assert_eq!(ids(&needed), ["a", "b"]);
    }

    #[test]
    fn needed_tasks_reject_unknown_target() {
        let registry = registry(PROJECT);

        let result = registry.needed_tasks(Some("deploy"));

        match result {
            Err(TaskLookupError::UnknownTask { task_name }) => assert_eq!(task_name, "deploy"),
            Ok(tasks) => panic!("Expected UnknownTask, got {:?}", ids(&tasks)),
        }
    }
}
