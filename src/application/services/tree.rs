//! Tree analysis service
//!
//! Loads a model file, builds the closed-world policy from settings and runs
//! the analyzer for one root or for every candidate root.

use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::application::{ApplicationError, ApplicationResult, IoResultExt};
use crate::config::Settings;
use crate::domain::{
    Explanation, ModelArena, ModelQuery, PatternPolicy, TreeAnalyzer, TreeType, TypeInfo, TypeKind,
};
use crate::infrastructure::model_file::ModelDocument;
use crate::infrastructure::traits::FileSystem;

/// One flattened ill-formed branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BranchReport {
    /// Type owning the branch
    pub owner: String,
    pub branch: String,
    pub explanations: Vec<Explanation>,
}

/// Result of checking one root.
#[derive(Debug, Clone, Serialize)]
pub struct TreeReport {
    pub root: String,
    pub fully_well_formed: bool,
    pub depth: usize,
    pub ill_formed_nodes: Vec<String>,
    pub ill_formed_branches: Vec<BranchReport>,
    pub tree: TreeType,
}

impl TreeReport {
    pub fn from_tree(tree: TreeType) -> Self {
        let ill_formed_branches = tree
            .ill_formed_branches()
            .into_iter()
            .map(|(owner, branch)| BranchReport {
                owner: owner.tree_type().display_name(),
                branch: branch.label(),
                explanations: branch.explanations().to_vec(),
            })
            .collect();
        let ill_formed_nodes = tree
            .ill_formed_trees()
            .into_iter()
            .map(|node| node.tree_type().display_name())
            .collect();
        Self {
            root: tree.tree_type().display_name(),
            fully_well_formed: tree.is_fully_well_formed(),
            depth: tree.depth(),
            ill_formed_nodes,
            ill_formed_branches,
            tree,
        }
    }
}

/// Status line for one candidate root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RootSummary {
    pub name: String,
    pub kind: TypeKind,
    pub fully_well_formed: bool,
    pub ill_formed_nodes: usize,
    pub ill_formed_branches: usize,
    pub depth: usize,
}

pub struct TreeService {
    fs: Arc<dyn FileSystem>,
    settings: Arc<Settings>,
}

impl TreeService {
    pub fn new(fs: Arc<dyn FileSystem>, settings: Arc<Settings>) -> Self {
        Self { fs, settings }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Read and build a TOML model file.
    #[instrument(level = "debug", skip(self))]
    pub fn load_model(&self, path: &Path) -> ApplicationResult<ModelArena> {
        if !self.fs.is_file(path) {
            return Err(ApplicationError::ModelNotFound(path.to_path_buf()));
        }
        let content = self.fs.read_to_string(path).with_path_context("read model", path)?;
        let model_error = |e: crate::infrastructure::ModelFileError| ApplicationError::ModelFile {
            path: path.to_path_buf(),
            message: e.to_string(),
        };
        let model = ModelDocument::parse(&content)
            .and_then(ModelDocument::into_model)
            .map_err(model_error)?;
        info!(path = %path.display(), types = model.type_count(), "model loaded");
        Ok(model)
    }

    /// Closed-world policy compiled from the policy settings.
    pub fn policy(&self) -> ApplicationResult<PatternPolicy> {
        self.settings.policy.to_policy()
    }

    /// Analyze the type named `root` in the model at `path`.
    #[instrument(level = "debug", skip(self))]
    pub fn check(&self, path: &Path, root: &str) -> ApplicationResult<TreeReport> {
        let model = self.load_model(path)?;
        self.check_model(&model, root, path)
    }

    /// Analyze the type named `root` in an already loaded model.
    pub fn check_model<M>(&self, model: &M, root: &str, source: &Path) -> ApplicationResult<TreeReport>
    where
        M: ModelQuery + ?Sized,
    {
        let root_type = model
            .find_type(root)?
            .ok_or_else(|| ApplicationError::RootNotFound {
                name: root.to_string(),
                model: source.to_path_buf(),
            })?;
        let policy = self.policy()?;
        let tree = TreeAnalyzer::new(model, &policy).analyze_root(root_type.id)?;
        let report = TreeReport::from_tree(tree);
        debug!(
            root = %report.root,
            fully_well_formed = report.fully_well_formed,
            ill_formed = report.ill_formed_branches.len(),
            "root checked"
        );
        Ok(report)
    }

    /// Analyze every class and data type of the model as a root, in parallel.
    #[instrument(level = "debug", skip(self))]
    pub fn summarize_roots(&self, path: &Path) -> ApplicationResult<Vec<RootSummary>> {
        let model = self.load_model(path)?;
        let policy = self.policy()?;

        let candidates: Vec<TypeInfo> = model
            .types()?
            .into_iter()
            .filter(|ty| ty.kind.is_tree_feature_type())
            .collect();
        let ids: Vec<_> = candidates.iter().map(|ty| ty.id).collect();

        let results = TreeAnalyzer::new(&model, &policy).analyze_roots(&ids);
        candidates
            .into_iter()
            .zip(results)
            .map(|(ty, result)| {
                let tree = result?;
                Ok(RootSummary {
                    name: ty.display_name(),
                    kind: ty.kind,
                    fully_well_formed: tree.is_fully_well_formed(),
                    ill_formed_nodes: tree.ill_formed_trees().len(),
                    ill_formed_branches: tree.ill_formed_branches().len(),
                    depth: tree.depth(),
                })
            })
            .collect()
    }
}
