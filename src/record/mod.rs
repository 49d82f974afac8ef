//! Product records and their harvest outcomes

mod item;
mod status;

pub use item::{Field, Record};
pub use status::{Issue, IssueKind, RecordState};
