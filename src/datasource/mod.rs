//! Data-source connectivity: descriptor parsing and connection probes.

pub mod descriptor;
pub mod probe;

use serde::{Deserialize, Serialize};

pub use descriptor::ConnectionDescriptor;
pub use probe::probe;

/// Supported data-source families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSourceKind {
    MySql,
    #[serde(alias = "postgresql")]
    Postgres,
}
