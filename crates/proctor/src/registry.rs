//! Per-file registration of tests and hooks

use crate::artifact::{
    HookKind, SetupHook, TeardownEachHook, TeardownHook, TestArtifact, TestBody, TestOptions,
};
use crate::assert::Assert;
use crate::error::{ConfigurationError, TestResult};
use crate::outcome::Outcome;
use crate::signal::Done;
use proctor_config::ExecutionMode;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;

/// Everything registered under one logical file
pub struct FileRegistry {
    file: String,
    tests: Vec<TestArtifact>,
    names: HashSet<String>,
    pub(crate) setup: Option<SetupHook>,
    pub(crate) setup_each: Option<SetupHook>,
    pub(crate) teardown: Option<TeardownHook>,
    pub(crate) teardown_each: Option<TeardownEachHook>,
    mode: ExecutionMode,
}

impl FileRegistry {
    pub(crate) fn new(file: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            tests: Vec::new(),
            names: HashSet::new(),
            setup: None,
            setup_each: None,
            teardown: None,
            teardown_each: None,
            mode: ExecutionMode::Default,
        }
    }

    pub fn file(&self) -> &str {
        &self.file
    }

    /// Registered tests in registration order
    pub fn tests(&self) -> &[TestArtifact] {
        &self.tests
    }

    pub fn mode(&self) -> ExecutionMode {
        self.mode
    }

    #[cfg(test)]
    fn has_hook(&self, kind: HookKind) -> bool {
        match kind {
            HookKind::Setup => self.setup.is_some(),
            HookKind::SetupEach => self.setup_each.is_some(),
            HookKind::Teardown => self.teardown.is_some(),
            HookKind::TeardownEach => self.teardown_each.is_some(),
        }
    }

    fn register_test(
        &mut self,
        name: &str,
        options: TestOptions,
        body: TestBody,
    ) -> Result<(), ConfigurationError> {
        if name.trim().is_empty() {
            return Err(ConfigurationError::MissingName);
        }

        if options.is_discarded() {
            tracing::trace!(file = %self.file, test = name, "registration skipped");
            return Ok(());
        }

        let options = Arc::new(options);

        let instances: Vec<(String, Option<(usize, Value)>)> = if options.cases.is_empty() {
            vec![(name.to_string(), None)]
        } else {
            options
                .cases
                .iter()
                .enumerate()
                .map(|(index, case)| (format!("{}_{}", name, index), Some((index, case.clone()))))
                .collect()
        };

        // All names are checked before any is claimed, so a collision leaves the file untouched
        if let Some((taken, _)) = instances.iter().find(|(n, _)| self.names.contains(n)) {
            return Err(ConfigurationError::DuplicateTest {
                name: taken.clone(),
                file: self.file.clone(),
            });
        }

        for (instance_name, case) in instances {
            self.names.insert(instance_name.clone());
            self.tests.push(TestArtifact {
                name: instance_name,
                file: self.file.clone(),
                options: Arc::clone(&options),
                body: Arc::clone(&body),
                case,
            });
        }

        Ok(())
    }

    fn duplicate_hook(&self, kind: HookKind) -> ConfigurationError {
        ConfigurationError::DuplicateHook {
            kind,
            file: self.file.clone(),
        }
    }

    /// Split tests into the async group and the sync group
    pub(crate) fn partition(&self, mode: ExecutionMode) -> (Vec<&TestArtifact>, Vec<&TestArtifact>) {
        match mode {
            ExecutionMode::Async => (self.tests.iter().collect(), Vec::new()),
            ExecutionMode::Sync => (Vec::new(), self.tests.iter().collect()),
            ExecutionMode::Default => self.tests.iter().partition(|t| t.is_async()),
        }
    }
}

/// Registration handle for one logical file
pub struct FileScope<'a> {
    registry: &'a mut FileRegistry,
}

impl<'a> FileScope<'a> {
    pub(crate) fn new(registry: &'a mut FileRegistry) -> Self {
        Self { registry }
    }

    pub fn file(&self) -> &str {
        self.registry.file()
    }

    /// Register a test with default options
    pub fn test<F>(&mut self, name: &str, body: F) -> Result<&mut Self, ConfigurationError>
    where
        F: Fn(Assert, Done, Option<&Value>) -> TestResult + Send + Sync + 'static,
    {
        self.test_with(name, TestOptions::default(), body)
    }

    /// Register a test.
    ///
    /// Skipped or ignored tests are discarded without a name check. With
    /// cases, one test named `{name}_{index}` is registered per case.
    pub fn test_with<F>(
        &mut self,
        name: &str,
        options: TestOptions,
        body: F,
    ) -> Result<&mut Self, ConfigurationError>
    where
        F: Fn(Assert, Done, Option<&Value>) -> TestResult + Send + Sync + 'static,
    {
        self.registry.register_test(name, options, Arc::new(body))?;
        Ok(self)
    }

    /// Run once before any test of the file
    pub fn setup<F>(&mut self, hook: F) -> Result<&mut Self, ConfigurationError>
    where
        F: Fn(Assert, Done) -> TestResult + Send + Sync + 'static,
    {
        if self.registry.setup.is_some() {
            return Err(self.registry.duplicate_hook(HookKind::Setup));
        }
        self.registry.setup = Some(Box::new(hook));
        Ok(self)
    }

    /// Run before every test of the file
    pub fn setup_each<F>(&mut self, hook: F) -> Result<&mut Self, ConfigurationError>
    where
        F: Fn(Assert, Done) -> TestResult + Send + Sync + 'static,
    {
        if self.registry.setup_each.is_some() {
            return Err(self.registry.duplicate_hook(HookKind::SetupEach));
        }
        self.registry.setup_each = Some(Box::new(hook));
        Ok(self)
    }

    /// Run once after all tests of the file
    pub fn teardown<F>(&mut self, hook: F) -> Result<&mut Self, ConfigurationError>
    where
        F: Fn(Done) -> TestResult + Send + Sync + 'static,
    {
        if self.registry.teardown.is_some() {
            return Err(self.registry.duplicate_hook(HookKind::Teardown));
        }
        self.registry.teardown = Some(Box::new(hook));
        Ok(self)
    }

    /// Run after every test of the file, with the outcome so far
    pub fn teardown_each<F>(&mut self, hook: F) -> Result<&mut Self, ConfigurationError>
    where
        F: Fn(Assert, &Outcome, Done) -> TestResult + Send + Sync + 'static,
    {
        if self.registry.teardown_each.is_some() {
            return Err(self.registry.duplicate_hook(HookKind::TeardownEach));
        }
        self.registry.teardown_each = Some(Box::new(hook));
        Ok(self)
    }

    /// Choose how this file's tests are scheduled
    pub fn set_mode(&mut self, mode: ExecutionMode) -> &mut Self {
        self.registry.mode = mode;
        self
    }
}
