//! Service container for dependency injection
//!
//! Wires up all services with their dependencies.

use std::sync::Arc;

use crate::application::access::{AccessPolicy, RolePolicy};
use crate::application::services::CurriculumService;
use crate::config::Settings;
use crate::infrastructure::toml_source::TomlNodeSource;
use crate::infrastructure::traits::{FileSystem, NodeSource, RealFileSystem, Selector, SkimSelector};

/// Container holding all application services.
pub struct ServiceContainer {
    /// Application settings
    pub settings: Arc<Settings>,

    /// Filesystem abstraction
    pub fs: Arc<dyn FileSystem>,

    /// Curriculum node data source
    pub source: Arc<dyn NodeSource>,

    /// Interactive node picker
    pub selector: Arc<dyn Selector>,

    /// Access-control collaborator
    pub policy: Arc<dyn AccessPolicy>,
}

impl ServiceContainer {
    /// Create a new service container with real implementations.
    pub fn new(settings: Settings) -> Self {
        let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
        let source = Arc::new(TomlNodeSource::new(fs.clone()));
        Self::with_deps(
            settings,
            fs,
            source,
            Arc::new(SkimSelector),
            Arc::new(RolePolicy),
        )
    }

    /// Create a service container with custom dependencies (for testing).
    pub fn with_deps(
        settings: Settings,
        fs: Arc<dyn FileSystem>,
        source: Arc<dyn NodeSource>,
        selector: Arc<dyn Selector>,
        policy: Arc<dyn AccessPolicy>,
    ) -> Self {
        let settings = Arc::new(settings);

        Self {
            settings,
            fs,
            source,
            selector,
            policy,
        }
    }

    pub fn curriculum_service(&self) -> CurriculumService {
        CurriculumService::new(self.fs.clone(), self.source.clone(), self.policy.clone())
    }
}
