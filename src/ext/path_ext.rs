use std::io;
use std::path::{Component, Path, PathBuf};

pub trait PathExt {
    /// Joins a relative path onto the current directory. Absolute paths are
    /// returned untouched, nothing is resolved on disk.
    fn to_absolute(&self) -> io::Result<PathBuf>;

    /// Drops `.` components and folds `..` into the preceding component
    /// without touching the file system. `..` never climbs above the root.
    fn normalized(&self) -> PathBuf;
}

impl PathExt for Path {
    fn to_absolute(&self) -> io::Result<PathBuf> {
        if self.is_absolute() {
            Ok(self.to_path_buf())
        } else {
            Ok(std::env::current_dir()?.join(self))
        }
    }

    fn normalized(&self) -> PathBuf {
        let mut components: Vec<Component> = Vec::new();

        for component in self.components() {
            match component {
                Component::CurDir => {}
                Component::ParentDir => match components.last() {
                    Some(Component::Normal(_)) => {
                        components.pop();
                    }
                    Some(Component::RootDir | Component::Prefix(_)) => {}
                    _ => components.push(component),
                },
                _ => components.push(component),
            }
        }

        components.iter().collect()
    }
}
