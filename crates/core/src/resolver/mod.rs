//! Path resolution over the capability graph.
//!
//! Formats are nodes and every registered direct conversion is a directed
//! edge. The resolver runs a breadth-first search from the source format, so
//! the first plan found has the fewest steps. Ties between equally short
//! paths are broken by edge enumeration order, which follows discovery order.

mod plan;

pub use plan::{ConversionPlan, PlanStep, PlanStepSummary};

use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};
use std::sync::Arc;
use tracing::debug;

use crate::format::Format;
use crate::registry::{ConverterRegistry, RegistrySnapshot};

/// Shortest-path resolver.
#[derive(Debug, Clone, Default)]
pub struct PathResolver {
    max_steps: Option<usize>,
}

impl PathResolver {
    /// Creates an unbounded resolver.
    pub fn new() -> Self {
        Self::default()
    }

    /// Limits the number of steps in a plan.
    pub fn with_max_steps(mut self, max_steps: Option<usize>) -> Self {
        self.max_steps = max_steps;
        self
    }

    /// Returns the step limit, if any.
    pub fn max_steps(&self) -> Option<usize> {
        self.max_steps
    }

    /// Resolves against the registry's current snapshot.
    pub fn resolve(
        &self,
        registry: &ConverterRegistry,
        from: &Format,
        to: &Format,
    ) -> Option<ConversionPlan> {
        self.resolve_in(&registry.snapshot(), from, to)
    }

    /// Finds the shortest plan converting `from` into `to`.
    ///
    /// A direct converter is always preferred. `from == to` resolves to the
    /// identity step when the format is known, and to nothing otherwise.
    pub fn resolve_in(
        &self,
        snapshot: &RegistrySnapshot,
        from: &Format,
        to: &Format,
    ) -> Option<ConversionPlan> {
        if self.max_steps == Some(0) {
            return None;
        }

        if let Some(converter) = snapshot.entry(from, to) {
            return ConversionPlan::new(vec![PlanStep {
                converter,
                input_format: from.clone(),
                output_format: to.clone(),
            }]);
        }
        if from == to {
            return None;
        }

        // Parent pointers: format -> (previous format, edge index).
        let mut parents: HashMap<Format, (Format, usize)> = HashMap::new();
        let mut visited: HashSet<Format> = HashSet::from([from.clone()]);
        let mut queue: VecDeque<(Format, usize)> = VecDeque::from([(from.clone(), 0)]);

        while let Some((current, depth)) = queue.pop_front() {
            if self.max_steps.is_some_and(|max| depth >= max) {
                continue;
            }

            for (index, edge) in snapshot.edges_from(&current).iter().enumerate() {
                if !visited.insert(edge.target.clone()) {
                    continue;
                }
                parents.insert(edge.target.clone(), (current.clone(), index));

                if &edge.target == to {
                    let plan = Self::rebuild(snapshot, &parents, from, to);
                    if let Some(plan) = &plan {
                        debug!("Resolved {} -> {} in {} steps: {}", from, to, plan.len(), plan);
                    }
                    return plan;
                }
                queue.push_back((edge.target.clone(), depth + 1));
            }
        }

        debug!("No conversion path from {} to {}", from, to);
        None
    }

    /// Formats reachable from `from` within the step limit, excluding `from`.
    pub fn reachable_from(&self, snapshot: &RegistrySnapshot, from: &Format) -> BTreeSet<Format> {
        let mut visited: HashSet<Format> = HashSet::from([from.clone()]);
        let mut queue: VecDeque<(Format, usize)> = VecDeque::from([(from.clone(), 0)]);
        let mut reachable = BTreeSet::new();

        while let Some((current, depth)) = queue.pop_front() {
            if self.max_steps.is_some_and(|max| depth >= max) {
                continue;
            }
            for edge in snapshot.edges_from(&current) {
                if visited.insert(edge.target.clone()) {
                    reachable.insert(edge.target.clone());
                    queue.push_back((edge.target.clone(), depth + 1));
                }
            }
        }

        reachable
    }

    fn rebuild(
        snapshot: &RegistrySnapshot,
        parents: &HashMap<Format, (Format, usize)>,
        from: &Format,
        to: &Format,
    ) -> Option<ConversionPlan> {
        let mut steps = Vec::new();
        let mut current = to.clone();

        while &current != from {
            let (previous, index) = parents.get(&current)?;
            let edge = snapshot.edges_from(previous).get(*index)?;
            steps.push(PlanStep {
                converter: Arc::clone(&edge.converter),
                input_format: previous.clone(),
                output_format: current.clone(),
            });
            current = previous.clone();
        }

        steps.reverse();
        ConversionPlan::new(steps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{ConverterSource, RegistryConfig};
    use crate::testing::MockConverter;

    fn registry(converters: &[(&str, &[&str], &[&str])]) -> ConverterRegistry {
        let sources: Vec<ConverterSource> = converters
            .iter()
            .map(|(name, inputs, outputs)| {
                ConverterSource::from_instance(
                    "document",
                    Arc::new(MockConverter::new(name, inputs, outputs)),
                )
            })
            .collect();
        ConverterRegistry::discover(RegistryConfig::default(), &sources).0
    }

    fn names(plan: &ConversionPlan) -> Vec<String> {
        plan.steps()
            .iter()
            .map(|step| step.converter.name().to_string())
            .collect()
    }

    #[test]
    fn test_two_step_path() {
        let registry = registry(&[("docx-html", &["docx"], &["html"]), ("html-pdf", &["html"], &["pdf"])]);
        let plan = PathResolver::new()
            .resolve(&registry, &"docx".into(), &"pdf".into())
            .unwrap();

        assert_eq!(plan.len(), 2);
        assert_eq!(names(&plan), vec!["docx-html", "html-pdf"]);
        assert_eq!(plan.to_string(), "docx -> html -> pdf");
        assert_eq!(plan.input_format(), &Format::new("docx"));
        assert_eq!(plan.output_format(), &Format::new("pdf"));
    }

    #[test]
    fn test_direct_converter_is_preferred() {
        let registry = registry(&[
            ("docx-html", &["docx"], &["html"]),
            ("html-pdf", &["html"], &["pdf"]),
            ("docx-pdf", &["docx"], &["pdf"]),
        ]);
        let plan = PathResolver::new()
            .resolve(&registry, &"docx".into(), &"pdf".into())
            .unwrap();

        assert_eq!(names(&plan), vec!["docx-pdf"]);
    }

    #[test]
    fn test_unreachable_target() {
        let registry = registry(&[("docx-html", &["docx"], &["html"]), ("csv-json", &["csv"], &["json"])]);
        let resolver = PathResolver::new();

        assert!(resolver.resolve(&registry, &"docx".into(), &"json".into()).is_none());
        assert!(resolver.resolve(&registry, &"xyz".into(), &"html".into()).is_none());
        assert!(resolver.resolve(&registry, &"html".into(), &"docx".into()).is_none());
    }

    #[test]
    fn test_ties_follow_enumeration_order() {
        let registry = registry(&[
            ("a-bc", &["a"], &["b", "c"]),
            ("b-d", &["b"], &["d"]),
            ("c-d", &["c"], &["d"]),
        ]);
        let resolver = PathResolver::new();

        for _ in 0..5 {
            let plan = resolver.resolve(&registry, &"a".into(), &"d".into()).unwrap();
            assert_eq!(
                plan.format_chain(),
                vec![Format::new("a"), Format::new("b"), Format::new("d")]
            );
        }
    }

    #[test]
    fn test_shortest_path_wins_over_longer_chain() {
        let registry = registry(&[
            ("a-b", &["a"], &["b", "x"]),
            ("b-c", &["b"], &["c"]),
            ("c-d", &["c"], &["d"]),
            ("x-d", &["x"], &["d"]),
        ]);
        let plan = PathResolver::new()
            .resolve(&registry, &"a".into(), &"d".into())
            .unwrap();

        assert_eq!(names(&plan), vec!["a-b", "x-d"]);
    }

    #[test]
    fn test_cycles_terminate() {
        let registry = registry(&[
            ("a-b", &["a"], &["b"]),
            ("b-a", &["b"], &["a"]),
        ]);
        assert!(PathResolver::new()
            .resolve(&registry, &"a".into(), &"z".into())
            .is_none());
    }

    #[test]
    fn test_max_steps_bounds_plan_length() {
        let registry = registry(&[
            ("a-b", &["a"], &["b"]),
            ("b-c", &["b"], &["c"]),
            ("c-d", &["c"], &["d"]),
        ]);
        let snapshot = registry.snapshot();

        assert!(PathResolver::new()
            .with_max_steps(Some(2))
            .resolve_in(&snapshot, &"a".into(), &"d".into())
            .is_none());
        assert_eq!(
            PathResolver::new()
                .with_max_steps(Some(3))
                .resolve_in(&snapshot, &"a".into(), &"d".into())
                .unwrap()
                .len(),
            3
        );
    }

    #[test]
    fn test_same_format_uses_identity() {
        let registry = registry(&[("md-html", &["md"], &["html"])]);
        let resolver = PathResolver::new();

        let plan = resolver.resolve(&registry, &"md".into(), &"md".into()).unwrap();
        assert_eq!(plan.len(), 1);
        assert_eq!(names(&plan), vec![crate::converter::IDENTITY_CONVERTER_NAME]);

        assert!(resolver.resolve(&registry, &"png".into(), &"png".into()).is_none());
    }

    #[test]
    fn test_reachable_from() {
        let registry = registry(&[
            ("a-b", &["a"], &["b"]),
            ("b-c", &["b"], &["c", "a"]),
        ]);
        let snapshot = registry.snapshot();

        let reachable = PathResolver::new().reachable_from(&snapshot, &"a".into());
        assert_eq!(reachable, BTreeSet::from([Format::new("b"), Format::new("c")]));

        let bounded = PathResolver::new()
            .with_max_steps(Some(1))
            .reachable_from(&snapshot, &"a".into());
        assert_eq!(bounded, BTreeSet::from([Format::new("b")]));
    }

    #[test]
    fn test_plan_rejects_broken_chain() {
        let registry = registry(&[("a-b", &["a"], &["b"]), ("c-d", &["c"], &["d"])]);
        let snapshot = registry.snapshot();
        let ab = snapshot.entry(&"a".into(), &"b".into()).unwrap();
        let cd = snapshot.entry(&"c".into(), &"d".into()).unwrap();

        let steps = vec![
            PlanStep {
                converter: ab,
                input_format: "a".into(),
                output_format: "b".into(),
            },
            PlanStep {
                converter: cd,
                input_format: "c".into(),
                output_format: "d".into(),
            },
        ];
        assert!(ConversionPlan::new(steps).is_none());
        assert!(ConversionPlan::new(Vec::new()).is_none());
    }
}
