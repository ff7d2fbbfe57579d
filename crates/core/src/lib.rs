pub mod config;
pub mod converter;
pub mod engine;
pub mod format;
pub mod metrics;
pub mod registry;
pub mod resolver;
pub mod testing;

pub use config::{
    config_from_map, load_config, load_config_from_str, validate_config, Config, ConfigError,
};
pub use converter::{
    CommandConverter, CommandConverterConfig, Converter, ConverterCapability, ConverterError,
    IdentityConverter, Metadata, ParamSpec, ParamType, ParameterSchema, Parameters,
};
pub use engine::{
    BatchConverter, BatchReport, BatchSummary, ConversionEngine, ConversionError, ConversionInfo,
    ConversionRequest, ConversionResult, EngineConfig, Workspace,
};
pub use format::{extension_candidates, normalize_extension, Format};
pub use registry::{
    ConverterRegistration, ConverterRegistry, ConverterSource, DiscoveryReport, DuplicatePolicy,
    RegisteredConverter, RegistryConfig, RegistryError, RegistrySnapshot, SkippedConverter,
};
pub use resolver::{ConversionPlan, PathResolver, PlanStep, PlanStepSummary};
