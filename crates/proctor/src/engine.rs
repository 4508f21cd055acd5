//! The orchestration engine
//!
//! `Proctor` owns every file registry and drives a run: files execute one
//! after another in the order they were first registered, and the reporter
//! turns the collected outcomes into a summary and an exit code.

use crate::error::ConfigurationError;
use crate::outcome::Outcome;
use crate::registry::{FileRegistry, FileScope};
use crate::reporter::{Reporter, Summary};
use crate::runner::TestRunner;
use proctor_config::{
    ConfigLoader, ConfigResult, ExecutionMode, OutputStyle, PartialConfig, ProctorConfig,
};
use std::collections::HashMap;
use std::io::{self, Write};
use std::time::{Duration, Instant};

/// Result of a completed run
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    /// 0 when every outcome passed, 1 otherwise
    pub exit_code: i32,
    pub summary: Summary,
    /// Every outcome in logging order
    pub outcomes: Vec<Outcome>,
    /// Wall-clock time of the whole run
    pub duration: Duration,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        self.exit_code == 0
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "exit_code": self.exit_code,
            "summary": self.summary,
            "duration_ms": u64::try_from(self.duration.as_millis()).unwrap_or(u64::MAX),
            "results": self.outcomes,
        })
    }
}

/// Test orchestration engine
pub struct Proctor {
    files: Vec<FileRegistry>,
    index: HashMap<String, usize>,
    config: ProctorConfig,
    writer: Option<Box<dyn Write + Send>>,
    has_run: bool,
}

impl Default for Proctor {
    fn default() -> Self {
        Self::new()
    }
}

impl Proctor {
    /// Create an engine with default configuration
    pub fn new() -> Self {
        Self::with_config(ProctorConfig::default())
    }

    pub fn with_config(config: ProctorConfig) -> Self {
        Self {
            files: Vec::new(),
            index: HashMap::new(),
            config,
            writer: None,
            has_run: false,
        }
    }

    /// Create an engine configured from proctor.toml and the environment
    pub fn from_env() -> ConfigResult<Self> {
        let cwd = std::env::current_dir()?;
        let config = ConfigLoader::new().load_from_directory(&cwd)?;
        Ok(Self::with_config(config))
    }

    pub fn with_output(mut self, output: OutputStyle) -> Self {
        self.config.output = output;
        self
    }

    pub fn with_no_color(mut self, no_color: bool) -> Self {
        self.config.no_color = no_color;
        self
    }

    /// Fail any hook or body that has not signalled completion within `timeout`
    ///
    /// The same rule as `timeout_ms` in configuration applies: below one
    /// millisecond is rejected.
    pub fn with_timeout(mut self, timeout: Duration) -> ConfigResult<Self> {
        let layer = PartialConfig {
            timeout_ms: Some(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX)),
            ..Default::default()
        };
        layer.validate()?;
        self.config.apply(&layer);
        Ok(self)
    }

    /// Force one execution mode onto every file
    pub fn with_sync_mode(mut self, mode: ExecutionMode) -> Self {
        self.config.sync_mode = Some(mode);
        self
    }

    /// Mark the run as owned elsewhere; `run` becomes a no-op
    pub fn with_global_run(mut self, global_run: bool) -> Self {
        self.config.global_run = global_run;
        self
    }

    /// Write the report somewhere other than stdout
    pub fn with_writer<W: Write + Send + 'static>(mut self, writer: W) -> Self {
        self.writer = Some(Box::new(writer));
        self
    }

    pub fn config(&self) -> &ProctorConfig {
        &self.config
    }

    /// Registries in execution order
    pub fn files(&self) -> &[FileRegistry] {
        &self.files
    }

    /// Registration handle for the logical file `id`
    ///
    /// The file is created on first use; later calls with the same id
    /// register into the same file.
    pub fn file(&mut self, id: &str) -> Result<FileScope<'_>, ConfigurationError> {
        let id = id.trim();
        if id.is_empty() {
            return Err(ConfigurationError::MissingFile);
        }

        let index = match self.index.get(id) {
            Some(&index) => index,
            None => {
                tracing::trace!(file = id, "registering file");
                self.files.push(FileRegistry::new(id));
                let index = self.files.len() - 1;
                self.index.insert(id.to_string(), index);
                index
            }
        };

        Ok(FileScope::new(&mut self.files[index]))
    }

    /// Run every registered file on a single-threaded runtime
    ///
    /// Returns `None` when there is nothing to do: no tests are registered,
    /// the engine already ran, or the run is owned by another instance.
    pub fn run(&mut self) -> io::Result<Option<RunReport>> {
        if !self.should_run() {
            return Ok(None);
        }

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        Ok(Some(runtime.block_on(self.execute())))
    }

    /// Same as [`Proctor::run`], for callers already inside a runtime
    pub async fn run_async(&mut self) -> Option<RunReport> {
        if !self.should_run() {
            return None;
        }
        Some(self.execute().await)
    }

    /// Run, then terminate the process with the run's exit code
    pub fn run_and_exit(&mut self) -> io::Result<()> {
        if let Some(report) = self.run()? {
            std::process::exit(report.exit_code);
        }
        Ok(())
    }

    fn should_run(&self) -> bool {
        if self.has_run || self.config.global_run {
            tracing::debug!(
                has_run = self.has_run,
                global_run = self.config.global_run,
                "run skipped"
            );
            return false;
        }

        if !self.files.iter().any(|f| !f.tests().is_empty()) {
            tracing::debug!("no tests registered");
            return false;
        }

        true
    }

    fn build_reporter(&mut self) -> Reporter {
        let reporter = Reporter::new(self.config.output).with_no_color(self.config.no_color);
        match self.writer.take() {
            Some(writer) => reporter.with_writer(writer),
            None => reporter,
        }
    }

    async fn execute(&mut self) -> RunReport {
        let reporter = self.build_reporter();
        let runner = TestRunner::new(&reporter)
            .with_timeout(self.config.timeout())
            .with_mode(self.config.sync_mode);

        tracing::debug!(files = self.files.len(), output = %self.config.output, "starting run");
        let start = Instant::now();

        // Files holding only hooks have nothing to run
        for registry in self.files.iter().filter(|f| !f.tests().is_empty()) {
            runner.run_file(registry).await;
        }

        let duration = start.elapsed();
        let exit_code = reporter.finalize(duration);
        self.has_run = true;

        let summary = reporter.summary();
        tracing::debug!(exit_code, total = summary.total, "run finished");

        RunReport {
            exit_code,
            summary,
            outcomes: reporter.outcomes(),
            duration,
        }
    }
}
