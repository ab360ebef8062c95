//! QSTATE State Views
//!
//! Materializes queried keyed-state snapshots as read-only views.
//! One view per state kind: value, list, map, reducing, aggregating.

pub mod serializer;
pub mod codec;
pub mod descriptor;
pub mod value;
pub mod list;
pub mod map;
pub mod reducing;
pub mod aggregating;
pub mod read_only;
pub mod factory;

pub use serializer::*;
pub use codec::*;
pub use descriptor::*;
pub use value::*;
pub use list::*;
pub use map::*;
pub use reducing::*;
pub use aggregating::*;
pub use read_only::*;
pub use factory::*;
