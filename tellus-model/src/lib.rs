//! Telemetry entity model for tellus.
//!
//! Defines the records an application captures and ships:
//! - [`Session`] and [`Transaction`]: timed containers that own child records
//! - [`Event`] and [`State`]: point-in-time records qualified by a subtype
//! - [`GenericRecord`]: what the decoder builds for a tag it cannot resolve
//! - [`TypeRegistry`]: kind ↔ tag, field ↔ wire-key and bean type tables
//!
//! Every record implements [`Telemetry`]; containers additionally implement
//! [`Container`]. The codec works purely through these two traits. Timed
//! containers also implement [`Execution`] so they can be stacked.

mod exec;
mod fields;
mod generic;
mod info;
mod registry;
mod subtyped;
mod telemetry;

pub use exec::{ExecInfo, Execution, Session, Transaction};
pub use fields::{field, tag, wire, CORE_NAMESPACE, STANDARD_FIELDS};
pub use generic::GenericRecord;
pub use info::EntityInfo;
pub use registry::{BeanFactory, KindFactory, Resolution, TypeRegistry};
pub use subtyped::{Event, State, SubTypedInfo};
pub use telemetry::{Container, Telemetry};
