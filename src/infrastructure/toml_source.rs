//! TOML node files
//!
//! A node file holds an array of `[[nodes]]` tables:
//!
//! ```toml
//! [[nodes]]
//! id = 1
//! name = "Math"
//! type = "subject"
//! order = 1
//! grade_levels = ["9", "10"]
//!
//! [[nodes]]
//! id = 2
//! parent_id = 1
//! name = "Algebra"
//! type = "unit"
//! ```
//!
//! A directory source is every `*.toml` file below it; dot-files (local config,
//! saved view state) are skipped.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use walkdir::WalkDir;

use crate::application::error_ext::FormatResultExt;
use crate::application::{ApplicationError, ApplicationResult, IoResultExt};
use crate::domain::{CurriculumNode, RawNode};
use crate::infrastructure::traits::{FileSystem, NodeSource};

#[derive(Debug, Default, Deserialize)]
struct NodeFile {
    #[serde(default)]
    nodes: Vec<RawNode>,
}

#[derive(Debug, Serialize)]
struct NodeFileOut<'a> {
    nodes: &'a [CurriculumNode],
}

/// Node source backed by TOML files.
pub struct TomlNodeSource {
    fs: Arc<dyn FileSystem>,
}

impl TomlNodeSource {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self { fs }
    }

    fn is_node_file(path: &Path) -> bool {
        let visible = path
            .file_name()
            .map(|n| !n.to_string_lossy().starts_with('.'))
            .unwrap_or(false);
        visible && path.extension().map(|ext| ext == "toml").unwrap_or(false)
    }
}

impl NodeSource for TomlNodeSource {
    #[instrument(level = "debug", skip(self))]
    fn files(&self, path: &Path) -> ApplicationResult<Vec<PathBuf>> {
        if self.fs.is_file(path) {
            return Ok(vec![path.to_path_buf()]);
        }
        if !self.fs.is_dir(path) {
            return Err(ApplicationError::OperationFailed {
                context: format!("curriculum source not found: {}", path.display()),
                source: Box::new(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "no such file or directory",
                )),
            });
        }

        let mut files: Vec<PathBuf> = WalkDir::new(path)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file() && Self::is_node_file(e.path()))
            .map(|e| e.into_path())
            .collect();
        files.sort();
        debug!("files: {} node files in {}", files.len(), path.display());
        Ok(files)
    }

    #[instrument(level = "debug", skip(self))]
    fn load_file(&self, file: &Path) -> ApplicationResult<Vec<CurriculumNode>> {
        let content = self
            .fs
            .read_to_string(file)
            .with_path_context("read node file", file)?;
        let parsed: NodeFile = toml::from_str(&content).with_format_context("parse node file", file)?;

        parsed
            .nodes
            .into_iter()
            .enumerate()
            .map(|(index, raw)| {
                CurriculumNode::validate(raw, index).map_err(|source| {
                    ApplicationError::InvalidRecords {
                        path: file.to_path_buf(),
                        source,
                    }
                })
            })
            .collect()
    }

    #[instrument(level = "debug", skip(self, nodes), fields(nodes = nodes.len()))]
    fn save_file(&self, file: &Path, nodes: &[CurriculumNode]) -> ApplicationResult<()> {
        let content =
            toml::to_string(&NodeFileOut { nodes }).with_format_context("serialize nodes", file)?;
        self.fs
            .ensure_parent(file)
            .with_path_context("create directory for", file)?;
        self.fs
            .write(file, &content)
            .with_path_context("write node file", file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DomainError, NodeId};
    use crate::infrastructure::traits::RealFileSystem;
    use tempfile::TempDir;

    fn source() -> TomlNodeSource {
        TomlNodeSource::new(Arc::new(RealFileSystem))
    }

    #[test]
    fn given_node_file_when_loading_then_accepts_camel_case_aliases() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("math.toml");
        std::fs::write(
            &file,
            r#"
[[nodes]]
id = 1
name = "Math"
nodeType = "subject"
gradeLevel = ["9"]

[[nodes]]
id = "alg"
parentId = 1
name = "Algebra"
type = "unit"
order = 2
"#,
        )
        .unwrap();

        let nodes = source().load_file(&file).unwrap();
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0].grade_levels[0].0, "9");
        assert_eq!(nodes[1].parent_id, Some(NodeId::from(1)));
        assert_eq!(nodes[1].order, Some(2));
    }

    #[test]
    fn given_record_without_id_when_loading_then_reports_file_and_index() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("bad.toml");
        std::fs::write(
            &file,
            "[[nodes]]\nid = 1\nname = \"A\"\ntype = \"unit\"\n\n[[nodes]]\nname = \"B\"\ntype = \"unit\"\n",
        )
        .unwrap();

        match source().load_file(&file) {
            Err(ApplicationError::InvalidRecords { path, source }) => {
                assert_eq!(path, file);
                assert_eq!(source, DomainError::MissingId { index: 1 });
            }
            other => panic!("expected InvalidRecords, got {other:?}"),
        }
    }

    #[test]
    fn given_directory_when_listing_files_then_skips_dotfiles_and_sorts() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("b.toml"), "").unwrap();
        std::fs::write(dir.path().join("a.toml"), "").unwrap();
        std::fs::write(dir.path().join(".currtree.toml"), "").unwrap();
        std::fs::write(dir.path().join("notes.md"), "").unwrap();

        let files = source().files(dir.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|f| f.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, ["a.toml", "b.toml"]);
    }

    #[test]
    fn given_nodes_when_saving_then_file_loads_back() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("sub").join("out.toml");
        let nodes = vec![
            CurriculumNode::new(1, "Math", crate::domain::NodeType::Subject)
                .with_description("numbers")
                .with_grade_levels(["9", "10"]),
            CurriculumNode::new(2, "Algebra", crate::domain::NodeType::Unit).with_parent(1),
        ];
        source().save_file(&file, &nodes).unwrap();

        let text = std::fs::read_to_string(&file).unwrap();
        assert!(text.contains("[[nodes]]"));
        assert!(text.contains("parent_id = 1"));
        assert_eq!(source().load_file(&file).unwrap(), nodes);
    }

    #[test]
    fn given_missing_path_when_listing_files_then_errors() {
        assert!(source().files(Path::new("/nonexistent/curriculum")).is_err());
    }
}
