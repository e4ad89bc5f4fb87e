pub mod builtin;
pub mod cache;
pub mod definition;
pub mod derive;
pub mod registry;
pub mod snapshot;

pub use cache::{CacheStats, FactRegistryCache};
pub use definition::{CompositeLogic, FactCondition, FactDefinition, FactDerivation};
pub use derive::FactResolver;
pub use registry::{get_available_facts, FactMeta, FactRegistry, FactSource, FactType, GuardBuildError};
pub use snapshot::FactSnapshot;
