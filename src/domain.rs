//! The two resources this API serves.

use crate::resource::{FieldSpec, Schema};

/// `/humans`: a name and, optionally, a brain type (`small`, `large`, …).
pub struct Human;

impl Schema for Human {
    const SINGULAR: &'static str = "human";
    const PLURAL: &'static str = "humans";
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::required("name"),
        FieldSpec::optional("brain_type"),
    ];
}

/// `/zombies`: a name and an optional weapon.
pub struct Zombie;

impl Schema for Zombie {
    const SINGULAR: &'static str = "zombie";
    const PLURAL: &'static str = "zombies";
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::required("name"),
        FieldSpec::optional("weapon"),
    ];
}
