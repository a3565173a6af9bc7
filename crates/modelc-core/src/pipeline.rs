//! Enhancer pipeline.
//!
//! Passes run in the order they were added. The pipeline does not reorder
//! them; a pass that reads what another pass writes must be added after it.

use crate::error::Result;
use crate::model::ModelEnvironment;
use crate::validation::ValidationFailure;
use serde::Serialize;
use tracing::{debug, info};

/// Outcome of one enhancer pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnhancerResult {
    /// Name of the enhancer.
    pub enhancer_name: String,
    /// Whether the pass completed.
    pub success: bool,
}

impl EnhancerResult {
    /// A successful pass.
    pub fn ok(enhancer_name: impl Into<String>) -> Self {
        Self {
            enhancer_name: enhancer_name.into(),
            success: true,
        }
    }
}

/// A mutation pass over the entity graph.
///
/// Implementations must be idempotent: running a pass twice leaves the graph
/// as running it once does.
pub trait Enhancer: Send + Sync {
    /// Enhancer name, used in results and logs.
    fn name(&self) -> &'static str;

    /// Run the pass.
    fn enhance(&self, env: &mut ModelEnvironment) -> Result<EnhancerResult>;
}

/// A read-only check over the entity graph.
pub trait Validator: Send + Sync {
    /// Validator name, recorded on every failure it reports.
    fn name(&self) -> &'static str;

    /// Report failures.
    fn validate(&self, env: &ModelEnvironment) -> Vec<ValidationFailure>;
}

/// A named group of enhancers and validators.
pub struct Plugin {
    /// Plugin name.
    pub name: String,
    /// Enhancers in execution order.
    pub enhancers: Vec<Box<dyn Enhancer>>,
    /// Validators in execution order.
    pub validators: Vec<Box<dyn Validator>>,
}

impl Plugin {
    /// Create an empty plugin.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            enhancers: Vec::new(),
            validators: Vec::new(),
        }
    }

    /// Append an enhancer.
    pub fn with_enhancer(mut self, enhancer: impl Enhancer + 'static) -> Self {
        self.enhancers.push(Box::new(enhancer));
        self
    }

    /// Append a validator.
    pub fn with_validator(mut self, validator: impl Validator + 'static) -> Self {
        self.validators.push(Box::new(validator));
        self
    }
}

/// Ordered enhancers followed by validators.
#[derive(Default)]
pub struct Pipeline {
    plugins: Vec<String>,
    enhancers: Vec<Box<dyn Enhancer>>,
    validators: Vec<Box<dyn Validator>>,
    skip_validation: bool,
}

impl Pipeline {
    /// Create an empty pipeline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a plugin's enhancers and validators.
    pub fn with_plugin(mut self, plugin: Plugin) -> Self {
        self.plugins.push(plugin.name);
        self.enhancers.extend(plugin.enhancers);
        self.validators.extend(plugin.validators);
        self
    }

    /// Append a single enhancer.
    pub fn with_enhancer(mut self, enhancer: impl Enhancer + 'static) -> Self {
        self.enhancers.push(Box::new(enhancer));
        self
    }

    /// Append a single validator.
    pub fn with_validator(mut self, validator: impl Validator + 'static) -> Self {
        self.validators.push(Box::new(validator));
        self
    }

    /// Skip validators when running.
    pub fn without_validation(mut self) -> Self {
        self.skip_validation = true;
        self
    }

    /// Names of the plugins added so far.
    pub fn plugin_names(&self) -> &[String] {
        &self.plugins
    }

    /// Enhancer names in execution order.
    pub fn enhancer_names(&self) -> Vec<&'static str> {
        self.enhancers.iter().map(|e| e.name()).collect()
    }

    /// Run every enhancer in order, then every validator.
    ///
    /// Validation failures are appended to `env.validation_failures`. Only
    /// internal faults abort the run.
    pub fn run(&self, env: &mut ModelEnvironment) -> Result<Vec<EnhancerResult>> {
        let mut results = Vec::with_capacity(self.enhancers.len());
        for enhancer in &self.enhancers {
            debug!(enhancer = enhancer.name(), "Running enhancer");
            results.push(enhancer.enhance(env)?);
        }

        if !self.skip_validation {
            for validator in &self.validators {
                let failures = validator.validate(env);
                debug!(validator = validator.name(), failures = failures.len(), "Validator finished");
                env.validation_failures.extend(failures);
            }
        }

        info!(
            enhancers = results.len(),
            failures = env.validation_failures.len(),
            "Pipeline finished"
        );
        Ok(results)
    }
}
