use crate::category::Category;
use crate::reconcile::Orphan;
use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Component, Path};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeletionOutcome {
    pub deleted_count: usize,
    pub error_count: usize,
    pub error_messages: Vec<String>,
    pub deleted: Vec<Orphan>,
}

impl DeletionOutcome {
    pub fn is_clean(&self) -> bool {
        self.error_count == 0
    }

    fn record_success(&mut self, orphan: &Orphan) {
        self.deleted_count += 1;
        self.deleted.push(orphan.clone());
    }

    fn record_failure(&mut self, message: String) {
        warn!("{message}");
        self.error_count += 1;
        self.error_messages.push(message);
    }
}

#[derive(Debug)]
enum Failure {
    NotFound,
    UnsafeName,
    Io(io::Error),
}

fn is_plain_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(part)), None) if part == name
    )
}

fn remove(orphan: &Orphan, root: &Path) -> Result<(), Failure> {
    if !is_plain_name(&orphan.name) {
        return Err(Failure::UnsafeName);
    }
    if let Category::Folder(folder) = &orphan.category {
        if !is_plain_name(folder) {
            return Err(Failure::UnsafeName);
        }
    }

    let path = orphan.category.resolve(root, &orphan.name);
    let meta = match fs::symlink_metadata(&path) {
        Ok(meta) => meta,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(Failure::NotFound),
        Err(e) => return Err(Failure::Io(e)),
    };

    if meta.is_dir() {
        fs::remove_dir_all(&path).map_err(Failure::Io)
    } else {
        fs::remove_file(&path).map_err(Failure::Io)
    }
}

/// Deletes every item under `root`, recording each success or failure.
pub fn delete_selected(items: &[Orphan], root: &Path) -> DeletionOutcome {
    delete_selected_with(items, root, |_| {})
}

/// Like [`delete_selected`], calling `on_item` after each item is processed.
pub fn delete_selected_with<F>(items: &[Orphan], root: &Path, mut on_item: F) -> DeletionOutcome
where
    F: FnMut(&Orphan),
{
    let mut outcome = DeletionOutcome::default();

    for orphan in items {
        match remove(orphan, root) {
            Ok(()) => {
                debug!(name = %orphan.name, category = %orphan.category, "deleted");
                outcome.record_success(orphan);
            }
            Err(Failure::NotFound) => {
                outcome.record_failure(format!("File not found: {}", orphan.name));
            }
            Err(Failure::UnsafeName) => {
                outcome.record_failure(format!(
                    "Refusing to delete {}: not a plain entry name",
                    orphan.name
                ));
            }
            Err(Failure::Io(e)) => {
                outcome.record_failure(format!("Error deleting {}: {}", orphan.name, e));
            }
        }
        on_item(orphan);
    }

    info!(
        deleted = outcome.deleted_count,
        errors = outcome.error_count,
        "deletion finished"
    );
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use tempfile::TempDir;

    fn folder(name: &str) -> Category {
        Category::Folder(name.to_string())
    }

    #[test]
    fn empty_input_is_a_no_op() {
        let tmp = TempDir::new().unwrap();
        File::create(tmp.path().join("keep")).unwrap();

        let outcome = delete_selected(&[], tmp.path());

        assert_eq!(outcome, DeletionOutcome::default());
        assert!(tmp.path().join("keep").exists());
    }

    #[test]
    fn deletes_files_and_directories() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        File::create(root.join("doc.pdf")).unwrap();
        fs::create_dir_all(root.join("TV/show/s1")).unwrap();
        File::create(root.join("TV/show/s1/ep.mkv")).unwrap();
        File::create(root.join("TV/keep.mkv")).unwrap();

        let items = vec![
            Orphan::new("doc.pdf", Category::Root),
            Orphan::new("show", folder("TV")),
        ];
        let outcome = delete_selected(&items, root);

        assert_eq!(outcome.deleted_count, 2);
        assert_eq!(outcome.error_count, 0);
        assert!(outcome.is_clean());
        assert_eq!(outcome.deleted, items);
        assert!(!root.join("doc.pdf").exists());
        assert!(!root.join("TV/show").exists());
        assert!(root.join("TV/keep.mkv").exists());
    }

    #[test]
    fn missing_item_is_recorded_and_batch_continues() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir(tmp.path().join("Movies")).unwrap();
        File::create(tmp.path().join("Movies/real.mkv")).unwrap();

        let items = vec![
            Orphan::new("ghost.mkv", folder("Movies")),
            Orphan::new("real.mkv", folder("Movies")),
        ];
        let outcome = delete_selected(&items, tmp.path());

        assert_eq!(outcome.deleted_count, 1);
        assert_eq!(outcome.error_count, 1);
        assert_eq!(outcome.error_messages, vec!["File not found: ghost.mkv".to_string()]);
        assert!(!tmp.path().join("Movies/real.mkv").exists());
    }

    #[test]
    fn only_missing_item_reports_single_error() {
        let tmp = TempDir::new().unwrap();

        let outcome = delete_selected(&[Orphan::new("ghost.mkv", folder("Movies"))], tmp.path());

        assert_eq!(
            outcome,
            DeletionOutcome {
                deleted_count: 0,
                error_count: 1,
                error_messages: vec!["File not found: ghost.mkv".to_string()],
                deleted: vec![],
            }
        );
    }

    #[test]
    fn refuses_names_that_escape_the_root() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("root");
        fs::create_dir(&root).unwrap();
        File::create(tmp.path().join("outside")).unwrap();

        let items = vec![
            Orphan::new("../outside", Category::Root),
            Orphan::new("..", Category::Root),
            Orphan::new("", Category::Root),
            Orphan::new("outside", folder("..")),
        ];
        let outcome = delete_selected(&items, &root);

        assert_eq!(outcome.error_count, 4);
        assert_eq!(outcome.deleted_count, 0);
        assert_eq!(
            outcome.error_messages[0],
            "Refusing to delete ../outside: not a plain entry name"
        );
        assert!(tmp.path().join("outside").exists());
    }

    #[test]
    fn every_item_is_accounted_once() {
        let tmp = TempDir::new().unwrap();
        File::create(tmp.path().join("a")).unwrap();
        File::create(tmp.path().join("b")).unwrap();

        let items = vec![
            Orphan::new("a", Category::Root),
            Orphan::new("missing", Category::Root),
            Orphan::new("b", Category::Root),
            Orphan::new("a", Category::Root),
        ];
        let mut seen = Vec::new();
        let outcome = delete_selected_with(&items, tmp.path(), |o| seen.push(o.name.clone()));

        assert_eq!(outcome.deleted_count + outcome.error_count, items.len());
        assert_eq!(outcome.deleted_count, 2);
        assert_eq!(seen, vec!["a", "missing", "b", "a"]);
    }

    #[cfg(unix)]
    #[test]
    fn removes_symlink_without_touching_target() {
        let tmp = TempDir::new().unwrap();
        let target = TempDir::new().unwrap();
        File::create(target.path().join("data")).unwrap();
        std::os::unix::fs::symlink(target.path(), tmp.path().join("link")).unwrap();

        let outcome = delete_selected(&[Orphan::new("link", Category::Root)], tmp.path());

        assert_eq!(outcome.deleted_count, 1);
        assert!(!tmp.path().join("link").exists());
        assert!(target.path().join("data").exists());
    }

    #[cfg(unix)]
    #[test]
    fn dangling_symlink_is_removed_not_reported_missing() {
        let tmp = TempDir::new().unwrap();
        let link = tmp.path().join("broken");
        std::os::unix::fs::symlink(tmp.path().join("nowhere"), &link).unwrap();

        let outcome = delete_selected(&[Orphan::new("broken", Category::Root)], tmp.path());

        assert_eq!(outcome.deleted_count, 1);
        assert!(outcome.error_messages.is_empty());
        assert!(fs::symlink_metadata(&link).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn io_failure_is_recorded_and_batch_continues() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = TempDir::new().unwrap();
        let sealed = tmp.path().join("Sealed");
        fs::create_dir(&sealed).unwrap();
        File::create(sealed.join("y.mkv")).unwrap();
        File::create(tmp.path().join("free.mkv")).unwrap();
        fs::set_permissions(&sealed, fs::Permissions::from_mode(0o555)).unwrap();
        // Privileged users can unlink regardless of the mode.
        let writable = File::create(sealed.join("write-check")).is_ok();

        let items = vec![
            Orphan::new("y.mkv", folder("Sealed")),
            Orphan::new("free.mkv", Category::Root),
        ];
        let outcome = delete_selected(&items, tmp.path());
        fs::set_permissions(&sealed, fs::Permissions::from_mode(0o755)).unwrap();
        if writable {
            return;
        }

        assert_eq!(outcome.error_count, 1);
        assert_eq!(outcome.deleted_count, 1);
        assert!(outcome.error_messages[0].starts_with("Error deleting y.mkv: "));
        assert!(sealed.join("y.mkv").exists());
        assert!(!tmp.path().join("free.mkv").exists());
    }
}
