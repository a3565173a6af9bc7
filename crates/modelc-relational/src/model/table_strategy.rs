//! Table strategies: which physical table a child entity's rows join.

use super::foreign_key::TableIdentity;
use crate::annotation::entity_data;
use crate::error::{RelationalError, Result};
use modelc_core::{EntityId, ModelEnvironment};

/// Where an entity's derived columns and sub-table keys point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableStrategy {
    /// The entity's own table.
    Default(TableIdentity),
    /// Whatever table the base entity's strategy resolves to.
    Delegating {
        /// Entity delegated to.
        base: EntityId,
    },
}

impl TableStrategy {
    /// Follow delegation to a physical table identity.
    pub fn resolve(&self, env: &ModelEnvironment) -> Result<TableIdentity> {
        let mut visited: Vec<EntityId> = Vec::new();
        let mut current = self;
        loop {
            match current {
                TableStrategy::Default(identity) => return Ok(identity.clone()),
                TableStrategy::Delegating { base } => {
                    if visited.contains(base) {
                        return Err(RelationalError::DelegationCycle(env.entity(*base).name.clone()));
                    }
                    visited.push(*base);
                    current = &entity_data(env, *base)?.table_strategy;
                }
            }
        }
    }

    /// Check whether this strategy delegates.
    pub fn is_delegating(&self) -> bool {
        matches!(self, TableStrategy::Delegating { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::RelationalEntityData;
    use modelc_core::{EntityKind, TopLevelEntity};

    fn annotate(env: &mut ModelEnvironment, id: EntityId, strategy: TableStrategy) {
        let table_id = env.entity(id).name.clone();
        env.entity_mut(id).data.insert(RelationalEntityData {
            table_id,
            schema: "edfi".into(),
            table_strategy: strategy,
            cascade_primary_key_updates: false,
        });
    }

    #[test]
    fn test_default_resolves_to_itself() {
        let env = ModelEnvironment::new();
        let identity = TableIdentity::new("edfi", "EdFi", "Student");
        let strategy = TableStrategy::Default(identity.clone());
        assert_eq!(strategy.resolve(&env).unwrap(), identity);
        assert!(!strategy.is_delegating());
    }

    #[test]
    fn test_delegation_chain() {
        let mut env = ModelEnvironment::new();
        let ns = env.add_namespace("EdFi", false, &[]);
        let base = env
            .add_entity(ns, TopLevelEntity::new(EntityKind::DomainEntity, "Student"))
            .unwrap();
        let middle = env
            .add_entity(ns, TopLevelEntity::new(EntityKind::DomainEntityExtension, "Student"))
            .unwrap();
        annotate(&mut env, base, TableStrategy::Default(TableIdentity::new("edfi", "EdFi", "Student")));
        annotate(&mut env, middle, TableStrategy::Delegating { base });

        let strategy = TableStrategy::Delegating { base: middle };
        assert_eq!(strategy.resolve(&env).unwrap().table_id, "Student");
    }

    #[test]
    fn test_delegation_cycle_is_an_error() {
        let mut env = ModelEnvironment::new();
        let ns = env.add_namespace("EdFi", false, &[]);
        let a = env
            .add_entity(ns, TopLevelEntity::new(EntityKind::DomainEntity, "A"))
            .unwrap();
        let b = env
            .add_entity(ns, TopLevelEntity::new(EntityKind::DomainEntity, "B"))
            .unwrap();
        annotate(&mut env, a, TableStrategy::Delegating { base: b });
        annotate(&mut env, b, TableStrategy::Delegating { base: a });

        let err = TableStrategy::Delegating { base: a }.resolve(&env).unwrap_err();
        assert!(matches!(err, RelationalError::DelegationCycle(_)));
    }

    #[test]
    fn test_missing_annotation() {
        let mut env = ModelEnvironment::new();
        let ns = env.add_namespace("EdFi", false, &[]);
        let a = env
            .add_entity(ns, TopLevelEntity::new(EntityKind::DomainEntity, "A"))
            .unwrap();
        let err = TableStrategy::Delegating { base: a }.resolve(&env).unwrap_err();
        assert!(matches!(err, RelationalError::MissingAnnotation(_)));
    }
}
