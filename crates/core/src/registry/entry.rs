//! Registration records for converters.

use once_cell::sync::OnceCell;
use std::fmt;
use std::sync::Arc;

use crate::converter::{
    CommandConverter, CommandConverterConfig, Converter, ConverterCapability, ConverterError,
    IdentityConverter, IDENTITY_CONVERTER_NAME,
};

/// Zero-argument constructor for a converter instance.
pub type ConverterFactory =
    Arc<dyn Fn() -> Result<Arc<dyn Converter>, ConverterError> + Send + Sync>;

/// A declared capability plus the factory that builds the converter lazily.
pub struct ConverterRegistration {
    capability: ConverterCapability,
    priority: i32,
    factory: ConverterFactory,
    instance: Option<Arc<dyn Converter>>,
}

impl ConverterRegistration {
    /// Creates a registration whose converter is built on first use.
    pub fn new<F>(capability: ConverterCapability, factory: F) -> Self
    where
        F: Fn() -> Result<Arc<dyn Converter>, ConverterError> + Send + Sync + 'static,
    {
        Self {
            capability,
            priority: 0,
            factory: Arc::new(factory),
            instance: None,
        }
    }

    /// Creates a registration from an existing instance, reading its declared capability.
    pub fn from_instance(category: impl Into<String>, converter: Arc<dyn Converter>) -> Self {
        let capability = ConverterCapability::describe(converter.as_ref(), category);
        let shared = Arc::clone(&converter);
        Self {
            capability,
            priority: 0,
            factory: Arc::new(move || Ok(Arc::clone(&shared))),
            instance: Some(converter),
        }
    }

    /// Sets the priority used to break ties between competing converters.
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Returns the declared capability.
    pub fn capability(&self) -> &ConverterCapability {
        &self.capability
    }

    /// Returns the priority.
    pub fn priority(&self) -> i32 {
        self.priority
    }
}

/// One entry of the bootstrap list scanned by registry discovery.
#[derive(Clone)]
pub struct ConverterSource {
    category: String,
    priority: i32,
    factory: ConverterFactory,
}

impl ConverterSource {
    /// Creates a source from a category and a factory.
    pub fn new<F>(category: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> Result<Arc<dyn Converter>, ConverterError> + Send + Sync + 'static,
    {
        Self {
            category: category.into(),
            priority: 0,
            factory: Arc::new(factory),
        }
    }

    /// Creates a source that always yields the given instance.
    pub fn from_instance(category: impl Into<String>, converter: Arc<dyn Converter>) -> Self {
        Self::new(category, move || Ok(Arc::clone(&converter)))
    }

    /// Creates a source for a configured external tool.
    pub fn from_command(config: CommandConverterConfig) -> Self {
        let category = config.category.clone();
        let priority = config.priority;
        Self::new(category, move || {
            Ok(Arc::new(CommandConverter::new(config.clone())) as Arc<dyn Converter>)
        })
        .with_priority(priority)
    }

    /// Sets the priority used to break ties between competing converters.
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Returns the category.
    pub fn category(&self) -> &str {
        &self.category
    }

    /// Instantiates the converter and reads its declared capability.
    pub(crate) fn load(&self) -> Result<ConverterRegistration, ConverterError> {
        let instance = (self.factory)()?;
        let capability = ConverterCapability::describe(instance.as_ref(), self.category.clone());
        Ok(ConverterRegistration {
            capability,
            priority: self.priority,
            factory: Arc::clone(&self.factory),
            instance: Some(instance),
        })
    }
}

impl fmt::Debug for ConverterSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConverterSource")
            .field("category", &self.category)
            .field("priority", &self.priority)
            .finish_non_exhaustive()
    }
}

/// An indexed converter with its lazily constructed, cached instance.
pub struct RegisteredConverter {
    capability: ConverterCapability,
    priority: i32,
    order: usize,
    factory: ConverterFactory,
    instance: OnceCell<Arc<dyn Converter>>,
}

impl RegisteredConverter {
    pub(crate) fn from_registration(registration: ConverterRegistration, order: usize) -> Self {
        let instance = OnceCell::new();
        if let Some(converter) = registration.instance {
            let _ = instance.set(converter);
        }

        Self {
            capability: registration.capability,
            priority: registration.priority,
            order,
            factory: registration.factory,
            instance,
        }
    }

    pub(crate) fn identity() -> Self {
        Self::from_registration(
            ConverterRegistration::new(
                ConverterCapability::new(IDENTITY_CONVERTER_NAME, "builtin"),
                || Ok(Arc::new(IdentityConverter) as Arc<dyn Converter>),
            ),
            usize::MAX,
        )
    }

    /// Returns the converter name.
    pub fn name(&self) -> &str {
        &self.capability.name
    }

    /// Returns the converter category.
    pub fn category(&self) -> &str {
        &self.capability.category
    }

    /// Returns the declared capability.
    pub fn capability(&self) -> &ConverterCapability {
        &self.capability
    }

    /// Returns the priority.
    pub fn priority(&self) -> i32 {
        self.priority
    }

    /// Position in discovery order.
    pub fn order(&self) -> usize {
        self.order
    }

    /// Whether the instance has been constructed yet.
    pub fn is_instantiated(&self) -> bool {
        self.instance.get().is_some()
    }

    /// Returns the cached instance, constructing it on first use.
    pub fn instance(&self) -> Result<Arc<dyn Converter>, ConverterError> {
        self.instance
            .get_or_try_init(|| (self.factory)())
            .map(Arc::clone)
    }

    /// Whether this entry beats `other` for the same format pair.
    pub(crate) fn outranks(&self, other: &RegisteredConverter) -> bool {
        self.priority > other.priority
    }
}

impl fmt::Debug for RegisteredConverter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisteredConverter")
            .field("name", &self.capability.name)
            .field("category", &self.capability.category)
            .field("priority", &self.priority)
            .field("order", &self.order)
            .field("instantiated", &self.is_instantiated())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockConverter;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_lazy_instantiation_is_cached() {
        let built = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&built);
        let mock = MockConverter::new("docx-html", &["docx"], &["html"]);
        let capability = ConverterCapability::describe(&mock, "document");

        let registration = ConverterRegistration::new(capability, move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(mock.clone()) as Arc<dyn Converter>)
        });
        let entry = RegisteredConverter::from_registration(registration, 0);

        assert!(!entry.is_instantiated());
        assert_eq!(built.load(Ordering::SeqCst), 0);

        let first = entry.instance().unwrap();
        let second = entry.instance().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(built.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_failed_instantiation_is_retried_next_time() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&attempts);
        let capability = ConverterCapability::new("flaky", "document");

        let registration = ConverterRegistration::new(capability, move || {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            if n == 0 {
                Err(ConverterError::instantiation("flaky", "library missing"))
            } else {
                Ok(Arc::new(MockConverter::new("flaky", &["a"], &["b"])) as Arc<dyn Converter>)
            }
        });
        let entry = RegisteredConverter::from_registration(registration, 0);

        assert!(entry.instance().is_err());
        assert!(entry.instance().is_ok());
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_source_load_describes_capability() {
        let mock = MockConverter::new("csv-json", &["csv"], &["json"]);
        let source = ConverterSource::from_instance("data", Arc::new(mock)).with_priority(3);

        let registration = source.load().unwrap();
        assert_eq!(registration.capability().name, "csv-json");
        assert_eq!(registration.capability().category, "data");
        assert_eq!(registration.priority(), 3);
    }

    #[test]
    fn test_command_source_uses_config_category_and_priority() {
        let mut config = CommandConverterConfig::new("pandoc", "pandoc", &["md"], &["html"])
            .with_category("document");
        config.priority = 7;

        let source = ConverterSource::from_command(config);
        assert_eq!(source.category(), "document");

        let registration = source.load().unwrap();
        assert_eq!(registration.priority(), 7);
        assert_eq!(registration.capability().name, "pandoc");
    }
}
