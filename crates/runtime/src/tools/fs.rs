//! Filesystem tool host.
//!
//! The fixed registry of four local tools the model may call:
//! `list_directory`, `cat_file`, `create_file`, `update_file`. Paths are
//! resolved relative to the process working directory and vetted by the
//! path policy before any filesystem touch.

use crate::model::{ToolCall, ToolSpec};
use crate::tools::{ToolError, ToolHost};
use policy::{Decision, PathRequest, Policy};
use serde_json::{Value, json};
use similar::TextDiff;
use std::path::PathBuf;

/// Tool host exposing the filesystem tool set.
pub struct FsToolHost {
    specs: Vec<ToolSpec>,
    policy: Policy,
    root: PathBuf,
}

impl FsToolHost {
    pub fn new(policy: Policy) -> Self {
        Self {
            specs: tool_specs(),
            policy,
            root: PathBuf::from("."),
        }
    }

    /// Resolve tool paths against a different directory. Used by tests;
    /// production hosts work relative to the process working directory.
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }

    fn check(&self, request: PathRequest) -> Result<(), ToolError> {
        match self.policy.check(&request) {
            Decision::Allow => Ok(()),
            Decision::Deny { reason } => Err(ToolError::Denied(reason)),
        }
    }

    fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(path)
    }

    /// Directory entries with dirs suffixed `/`, files before directories,
    /// case-insensitive lexical order within each group. A read failure
    /// degrades to an empty listing.
    fn list_directory(&self, directory: &str) -> Result<Value, ToolError> {
        self.check(PathRequest::read(directory))?;

        let mut files = Vec::new();
        let mut dirs = Vec::new();
        if let Ok(entries) = std::fs::read_dir(self.resolve(directory)) {
            for entry in entries.flatten() {
                let name = entry.file_name().to_string_lossy().into_owned();
                let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
                if is_dir {
                    dirs.push(format!("{name}/"));
                } else {
                    files.push(name);
                }
            }
        }
        files.sort_by_key(|n| n.to_lowercase());
        dirs.sort_by_key(|n| n.to_lowercase());
        files.extend(dirs);

        Ok(json!({ "entries": files }))
    }

    /// Full file content, fenced as a code block.
    fn cat_file(&self, file_path: &str) -> Result<Value, ToolError> {
        self.check(PathRequest::read(file_path))?;

        let content = std::fs::read_to_string(self.resolve(file_path))
            .map_err(|e| ToolError::Io(format!("{file_path}: {e}")))?;

        Ok(json!({ "content": format!("```\n{content}\n```") }))
    }

    /// Create an empty file; fails if it already exists or the parent
    /// directory is absent.
    fn create_file(&self, file_path: &str) -> Result<Value, ToolError> {
        self.check(PathRequest::write(file_path))?;

        std::fs::File::create_new(self.resolve(file_path))
            .map_err(|e| ToolError::Io(format!("{file_path}: {e}")))?;

        Ok(json!({ "result": "file created" }))
    }

    /// Overwrite the file, returning a unified diff of old vs new content.
    fn update_file(&self, path: &str, new_content: &str) -> Result<Value, ToolError> {
        self.check(PathRequest::write(path))?;

        let resolved = self.resolve(path);
        let old_content = std::fs::read_to_string(&resolved)
            .map_err(|e| ToolError::Io(format!("{path}: {e}")))?;
        std::fs::write(&resolved, new_content)
            .map_err(|e| ToolError::Io(format!("{path}: {e}")))?;

        let diff = TextDiff::from_lines(old_content.as_str(), new_content)
            .unified_diff()
            .header(&format!("a/{path}"), &format!("b/{path}"))
            .to_string();

        Ok(json!({ "diff": format!("```diff\n{diff}```") }))
    }
}

impl ToolHost for FsToolHost {
    fn specs(&self) -> &[ToolSpec] {
        &self.specs
    }

    async fn execute(&self, call: &ToolCall) -> Result<Value, ToolError> {
        match call.name.as_str() {
            "list_directory" => self.list_directory(require_str(&call.args, "directory")?),
            "cat_file" => self.cat_file(require_str(&call.args, "filePath")?),
            "create_file" => self.create_file(require_str(&call.args, "filePath")?),
            "update_file" => self.update_file(
                require_str(&call.args, "path")?,
                require_str(&call.args, "new_content")?,
            ),
            other => Err(ToolError::NotFound(other.to_string())),
        }
    }
}

fn require_str<'a>(args: &'a Value, key: &str) -> Result<&'a str, ToolError> {
    args.get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| ToolError::InvalidInput(format!("missing string argument: {key}")))
}

fn string_property(description: &str) -> Value {
    json!({ "type": "string", "description": description })
}

fn tool_specs() -> Vec<ToolSpec> {
    vec![
        ToolSpec {
            name: "list_directory".into(),
            description: "Given a directory, return its direct children. Directories are suffixed with /".into(),
            schema: json!({
                "type": "object",
                "properties": {
                    "directory": string_property("the directory to list, use . for the project root"),
                },
                "required": ["directory"],
            }),
        },
        ToolSpec {
            name: "cat_file".into(),
            description: "Return the full content of a file as a fenced code block".into(),
            schema: json!({
                "type": "object",
                "properties": {
                    "filePath": string_property("path of the file to read"),
                },
                "required": ["filePath"],
            }),
        },
        ToolSpec {
            name: "create_file".into(),
            description: "Create a new empty file at the given path".into(),
            schema: json!({
                "type": "object",
                "properties": {
                    "filePath": string_property("path of the file to create"),
                },
                "required": ["filePath"],
            }),
        },
        ToolSpec {
            name: "update_file".into(),
            description: "Overwrite a file with new content, returning a diff of the change".into(),
            schema: json!({
                "type": "object",
                "properties": {
                    "path": string_property("path of the file to update"),
                    "new_content": string_property("the full new content of the file"),
                },
                "required": ["path", "new_content"],
            }),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn host(dir: &TempDir) -> FsToolHost {
        FsToolHost::new(Policy::workspace_only()).with_root(dir.path())
    }

    fn call(name: &str, args: Value) -> ToolCall {
        ToolCall {
            id: "t1".into(),
            name: name.into(),
            args,
        }
    }

    #[tokio::test]
    async fn list_directory_orders_files_before_dirs() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("b.txt"), "").unwrap();
        std::fs::write(dir.path().join("a.txt"), "").unwrap();
        std::fs::create_dir(dir.path().join("A")).unwrap();

        let result = host(&dir)
            .execute(&call("list_directory", json!({"directory": "."})))
            .await
            .unwrap();
        assert_eq!(result["entries"], json!(["a.txt", "b.txt", "A/"]));
    }

    #[tokio::test]
    async fn list_directory_degrades_to_empty_on_read_failure() {
        let dir = TempDir::new().unwrap();
        let result = host(&dir)
            .execute(&call("list_directory", json!({"directory": "no-such-dir"})))
            .await
            .unwrap();
        assert_eq!(result["entries"], json!([]));
    }

    #[tokio::test]
    async fn cat_file_fences_content() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("x.txt"), "hello").unwrap();

        let result = host(&dir)
            .execute(&call("cat_file", json!({"filePath": "x.txt"})))
            .await
            .unwrap();
        assert_eq!(result["content"], "```\nhello\n```");
    }

    #[tokio::test]
    async fn cat_file_missing_is_io_error() {
        let dir = TempDir::new().unwrap();
        let err = host(&dir)
            .execute(&call("cat_file", json!({"filePath": "nope.txt"})))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::Io(_)));
    }

    #[tokio::test]
    async fn create_file_refuses_existing() {
        let dir = TempDir::new().unwrap();
        let h = host(&dir);
        h.execute(&call("create_file", json!({"filePath": "new.txt"})))
            .await
            .unwrap();
        assert!(dir.path().join("new.txt").exists());

        let err = h
            .execute(&call("create_file", json!({"filePath": "new.txt"})))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::Io(_)));
    }

    #[tokio::test]
    async fn update_file_returns_diff() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("x.txt"), "old").unwrap();

        let result = host(&dir)
            .execute(&call(
                "update_file",
                json!({"path": "x.txt", "new_content": "new"}),
            ))
            .await
            .unwrap();

        let diff = result["diff"].as_str().unwrap();
        assert!(diff.contains("-old"));
        assert!(diff.contains("+new"));
        assert_eq!(std::fs::read_to_string(dir.path().join("x.txt")).unwrap(), "new");
    }

    #[tokio::test]
    async fn unknown_tool_is_not_found() {
        let dir = TempDir::new().unwrap();
        let err = host(&dir)
            .execute(&call("delete_file", json!({"filePath": "x"})))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::NotFound(_)));
    }

    #[tokio::test]
    async fn missing_argument_is_invalid_input() {
        let dir = TempDir::new().unwrap();
        let err = host(&dir)
            .execute(&call("cat_file", json!({"path": "x"})))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn escaping_path_is_denied() {
        let dir = TempDir::new().unwrap();
        let err = host(&dir)
            .execute(&call("cat_file", json!({"filePath": "../../etc/passwd"})))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::Denied(_)));
    }
}
