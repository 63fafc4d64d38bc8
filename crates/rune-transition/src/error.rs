use thiserror::Error;

use crate::host::ElementId;
use crate::property::StylePropertyId;
use crate::value::ValueKind;

pub type Result<T> = std::result::Result<T, TransitionError>;

/// Errors surfaced by the transition engine.
///
/// None of these are fatal: a rejected start leaves the caller to apply the
/// end value directly, and consistency failures are reported, not repaired.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransitionError {
    #[error("{property:?} transitions {expected:?} values, got {found:?}")]
    ValueKindMismatch {
        property: StylePropertyId,
        expected: ValueKind,
        found: ValueKind,
    },

    #[error(
        "element {owner:?} still counts {running} running and {completed} completed transitions"
    )]
    InconsistentCounters {
        owner: ElementId,
        running: u32,
        completed: u32,
    },

    #[error("{kind:?} registry corrupted: {detail}")]
    RegistryCorrupted { kind: ValueKind, detail: String },
}
