pub mod task_registry;

pub use task_registry::{TaskLookupError, TaskRegistry, TaskRegistryCreationError};
