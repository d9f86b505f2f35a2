//! Core library for the stagehand script generator.
//!
//! The crate turns declarative instance definitions into idempotent shell
//! scripts for the stages of a continuous-delivery pipeline: host
//! preparation, instance start and startup monitoring. Builders are pure
//! functions returning command text; nothing here executes commands or
//! inspects live hosts. Only [`store`] and the binary touch the filesystem.

pub mod composer;
pub mod config;
pub mod defaults;
pub mod error;
pub mod links;
pub mod model;
pub mod paths;
pub mod runtime;
pub mod script;
pub mod store;
pub mod sync;
pub mod transport;

pub use composer::{ChangeFlags, InstanceLookup, ScriptComposer, Stage};
pub use config::{ConfigError, PipelineConfig};
pub use error::ScriptError;
pub use links::{LinkComposer, init_folder};
pub use model::{
    ComposeSpec, DataSource, DeploymentDescriptor, DockerSpec, InstanceDefinition, LinkDescriptor,
    LinkKind, RuntimeKind, RuntimeSpec,
};
pub use paths::{FixedSuffix, SuffixSource, TrailingSlash, UuidSuffix};
pub use runtime::{ComposeRuntime, ContainerRuntime, DockerRuntime, Mount, RuntimeAdapter};
pub use script::ScriptDocument;
pub use store::{JsonInstanceStore, StoreError};
pub use sync::{SyncDirection, SyncRequest, build_sync};
pub use transport::{HostConnection, wrap_remote};
