//! Conversion plans produced by the resolver.

use serde::Serialize;
use std::fmt;
use std::sync::Arc;

use crate::format::Format;
use crate::registry::RegisteredConverter;

/// One converter invocation within a plan.
#[derive(Debug, Clone)]
pub struct PlanStep {
    /// Converter performing the step.
    pub converter: Arc<RegisteredConverter>,
    /// Format consumed by the step.
    pub input_format: Format,
    /// Format produced by the step.
    pub output_format: Format,
}

/// Serializable view of a plan step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanStepSummary {
    pub converter: String,
    pub input_format: Format,
    pub output_format: Format,
}

impl PlanStep {
    /// Returns the serializable view of this step.
    pub fn summary(&self) -> PlanStepSummary {
        PlanStepSummary {
            converter: self.converter.name().to_string(),
            input_format: self.input_format.clone(),
            output_format: self.output_format.clone(),
        }
    }
}

/// A non-empty chain of steps where each step consumes the previous output.
#[derive(Debug, Clone)]
pub struct ConversionPlan {
    steps: Vec<PlanStep>,
}

impl ConversionPlan {
    /// Builds a plan, returning `None` for an empty or broken chain.
    pub fn new(steps: Vec<PlanStep>) -> Option<Self> {
        if steps.is_empty() {
            return None;
        }
        let chained = steps
            .windows(2)
            .all(|pair| pair[0].output_format == pair[1].input_format);
        chained.then_some(Self { steps })
    }

    /// Steps in execution order.
    pub fn steps(&self) -> &[PlanStep] {
        &self.steps
    }

    /// Number of steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Whether the plan has no steps. Never true for a built plan.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Format consumed by the first step.
    pub fn input_format(&self) -> &Format {
        &self.steps[0].input_format
    }

    /// Format produced by the last step.
    pub fn output_format(&self) -> &Format {
        &self.steps[self.steps.len() - 1].output_format
    }

    /// Every format along the chain, starting with the input.
    pub fn format_chain(&self) -> Vec<Format> {
        std::iter::once(self.input_format().clone())
            .chain(self.steps.iter().map(|step| step.output_format.clone()))
            .collect()
    }

    /// Serializable views of all steps.
    pub fn summaries(&self) -> Vec<PlanStepSummary> {
        self.steps.iter().map(PlanStep::summary).collect()
    }
}

impl fmt::Display for ConversionPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let chain: Vec<String> = self
            .format_chain()
            .iter()
            .map(ToString::to_string)
            .collect();
        write!(f, "{}", chain.join(" -> "))
    }
}
