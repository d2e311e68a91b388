//! Importable userland modules.
//!
//! A module is native code registered under a URL. Importing the URL runs
//! the module once against the sandbox's [`Userland`].

use std::sync::Arc;

use dashmap::DashMap;

use crate::error::ModuleError;
use crate::userland::Userland;

/// Code importable into a sandbox.
pub trait SandboxModule: Send + Sync {
    /// URL the module is imported by.
    fn url(&self) -> &str;

    /// Run the module's top-level code.
    fn run(&self, userland: &mut Userland) -> anyhow::Result<()>;
}

/// Module backed by a closure.
pub struct FnModule<F> {
    url: String,
    run: F,
}

impl<F> FnModule<F>
where
    F: Fn(&mut Userland) -> anyhow::Result<()> + Send + Sync,
{
    pub fn new(url: impl Into<String>, run: F) -> Self {
        Self {
            url: url.into(),
            run,
        }
    }
}

impl<F> SandboxModule for FnModule<F>
where
    F: Fn(&mut Userland) -> anyhow::Result<()> + Send + Sync,
{
    fn url(&self) -> &str {
        &self.url
    }

    fn run(&self, userland: &mut Userland) -> anyhow::Result<()> {
        (self.run)(userland)
    }
}

/// Modules available to every sandbox, keyed by URL.
#[derive(Default)]
pub struct ModuleRegistry {
    modules: DashMap<String, Arc<dyn SandboxModule>>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a module. Fails if its URL is taken.
    pub fn register(&self, module: Arc<dyn SandboxModule>) -> Result<(), ModuleError> {
        let url = module.url().to_string();
        if self.modules.contains_key(&url) {
            return Err(ModuleError::AlreadyRegistered(url));
        }
        self.modules.insert(url, module);
        Ok(())
    }

    /// Register `run` under `url`.
    pub fn register_fn<F>(&self, url: impl Into<String>, run: F) -> Result<(), ModuleError>
    where
        F: Fn(&mut Userland) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.register(Arc::new(FnModule::new(url, run)))
    }

    pub fn get(&self, url: &str) -> Option<Arc<dyn SandboxModule>> {
        self.modules.get(url).map(|m| Arc::clone(m.value()))
    }

    pub fn contains(&self, url: &str) -> bool {
        self.modules.contains_key(url)
    }

    pub fn urls(&self) -> Vec<String> {
        let mut urls: Vec<String> = self.modules.iter().map(|m| m.key().clone()).collect();
        urls.sort();
        urls
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

impl std::fmt::Debug for ModuleRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleRegistry")
            .field("urls", &self.urls())
            .finish()
    }
}
