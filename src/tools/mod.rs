//! Action 层：Schema 注册表与校验、Handler 注册表、分发器，以及 11 个 Handler

pub mod arithmetic;
pub mod count;
pub mod examples;
pub mod executor;
pub mod finish;
pub mod overview;
pub mod registry;
pub mod schema;
pub mod semantic;
pub mod summarize;

pub use executor::{ActionDispatcher, ActionResult};
pub use registry::{ActionHandler, HandlerRegistry};
pub use schema::{
    ActionKind, ActionLimits, ActionRequest, ActionSchema, ActionSchemaRegistry, SampleSpec,
};
