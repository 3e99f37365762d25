//! Dependents of a virtual unit and the notifications they publish.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::id::EntityRef;
use crate::mode::EnslavedMode;
use crate::unit::UnitKind;

/// Ordered, de-duplicated, non-empty set of dependent entities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct DependentSet(Vec<EntityRef>);

impl DependentSet {
    /// Build a set from `entities`, keeping the first occurrence of duplicates.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyDependents`] when `entities` is empty.
    pub fn new(entities: impl IntoIterator<Item = EntityRef>) -> Result<Self, ValidationError> {
        let mut unique: Vec<EntityRef> = Vec::new();
        for entity in entities {
            if !unique.contains(&entity) {
                unique.push(entity);
            }
        }
        if unique.is_empty() {
            return Err(ValidationError::EmptyDependents);
        }
        Ok(Self(unique))
    }

    #[must_use]
    pub fn contains(&self, entity: &EntityRef) -> bool {
        self.0.contains(entity)
    }

    pub fn iter(&self) -> impl Iterator<Item = &EntityRef> {
        self.0.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'a> IntoIterator for &'a DependentSet {
    type Item = &'a EntityRef;
    type IntoIter = std::slice::Iter<'a, EntityRef>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Change notification published by a unit after each state change.
///
/// Fields a unit does not carry are `None`: virtual units have no enslaved
/// mode, and only enslaved units report the scheduler flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DependentState {
    pub entity: EntityRef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enslaved_mode: Option<EnslavedMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduler_active: Option<bool>,
}

/// Decides whether a dependent currently contributes to a virtual reading.
pub type HandledPredicate = fn(&DependentState) -> bool;

/// A master handles dependents that follow it in `auto` mode.
#[must_use]
pub fn handled_by_master(state: &DependentState) -> bool {
    state.enslaved_mode == Some(EnslavedMode::Auto)
}

/// A schedulable unit handles dependents under a scheduler override.
#[must_use]
pub fn handled_by_schedulable(state: &DependentState) -> bool {
    state.scheduler_active == Some(true)
}

impl UnitKind {
    /// Predicate used by a virtual unit of this kind, `None` for enslaved units.
    #[must_use]
    pub fn handled_predicate(self) -> Option<HandledPredicate> {
        match self {
            Self::Enslaved => None,
            Self::Master => Some(handled_by_master),
            Self::Schedulable => Some(handled_by_schedulable),
        }
    }
}
