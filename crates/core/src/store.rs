//! Calculator persistence contract and an in-memory implementation.
//!
//! Real deployments put a database behind [`CalculatorRepository`]; the
//! in-memory store backs tests and the CLI.

use std::sync::{Arc, RwLock};

use chrono::Utc;
use thiserror::Error;

use crate::model::{Calculator, CalculatorIssue};
use crate::types::{CalculatorId, ProductId};

/// Errors that can occur during repository operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    /// Requested calculator was not found.
    #[error("calculator not found: {0}")]
    NotFound(CalculatorId),

    /// The calculator failed validation and was not stored.
    #[error("calculator is invalid ({} issue(s))", .0.len())]
    Invalid(Vec<CalculatorIssue>),

    #[error("repository lock poisoned")]
    LockPoisoned,
}

/// CRUD over calculators keyed by id. Edits are full replacements.
pub trait CalculatorRepository {
    /// All calculators in creation order.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store is unavailable.
    fn list(&self) -> Result<Vec<Calculator>, RepositoryError>;

    /// # Errors
    ///
    /// Returns an error if the backing store is unavailable.
    fn get(&self, id: &CalculatorId) -> Result<Option<Calculator>, RepositoryError>;

    /// Validate and store a new calculator, assigning its id and timestamps.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Invalid`] with every issue when the
    /// calculator fails validation.
    fn create(&self, calculator: Calculator) -> Result<Calculator, RepositoryError>;

    /// Replace a calculator, keeping its id and creation time.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::NotFound`] for an unknown id and
    /// [`RepositoryError::Invalid`] when the replacement fails validation.
    fn update(&self, id: &CalculatorId, calculator: Calculator) -> Result<Calculator, RepositoryError>;

    /// # Errors
    ///
    /// Returns [`RepositoryError::NotFound`] for an unknown id.
    fn delete(&self, id: &CalculatorId) -> Result<(), RepositoryError>;

    /// The first calculator assigned to `product_id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store is unavailable.
    fn find_by_product_id(&self, product_id: &ProductId) -> Result<Option<Calculator>, RepositoryError> {
        Ok(self
            .list()?
            .into_iter()
            .find(|calculator| calculator.is_assigned_to_product(product_id)))
    }
}

/// Thread-safe store holding calculators in memory. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCalculatorRepository {
    inner: Arc<RwLock<Vec<Calculator>>>,
}

impl InMemoryCalculatorRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn check(calculator: &Calculator) -> Result<(), RepositoryError> {
    let issues = calculator.validate();
    if issues.is_empty() {
        Ok(())
    } else {
        tracing::debug!(name = %calculator.name, issues = issues.len(), "calculator rejected");
        Err(RepositoryError::Invalid(issues))
    }
}

impl CalculatorRepository for InMemoryCalculatorRepository {
    fn list(&self) -> Result<Vec<Calculator>, RepositoryError> {
        let guard = self.inner.read().map_err(|_| RepositoryError::LockPoisoned)?;
        Ok(guard.clone())
    }

    fn get(&self, id: &CalculatorId) -> Result<Option<Calculator>, RepositoryError> {
        let guard = self.inner.read().map_err(|_| RepositoryError::LockPoisoned)?;
        Ok(guard
            .iter()
            .find(|calculator| calculator.id.as_ref() == Some(id))
            .cloned())
    }

    fn create(&self, mut calculator: Calculator) -> Result<Calculator, RepositoryError> {
        check(&calculator)?;

        let now = Utc::now();
        calculator.id = Some(CalculatorId::generate());
        calculator.created_at = Some(now);
        calculator.updated_at = Some(now);

        self.inner
            .write()
            .map_err(|_| RepositoryError::LockPoisoned)?
            .push(calculator.clone());

        tracing::info!(id = ?calculator.id, name = %calculator.name, "calculator created");
        Ok(calculator)
    }

    fn update(&self, id: &CalculatorId, mut calculator: Calculator) -> Result<Calculator, RepositoryError> {
        check(&calculator)?;

        let mut guard = self.inner.write().map_err(|_| RepositoryError::LockPoisoned)?;
        let slot = guard
            .iter_mut()
            .find(|existing| existing.id.as_ref() == Some(id))
            .ok_or_else(|| RepositoryError::NotFound(id.clone()))?;

        calculator.id = Some(id.clone());
        calculator.created_at = slot.created_at;
        calculator.touch();
        slot.clone_from(&calculator);
        drop(guard);

        tracing::info!(%id, "calculator updated");
        Ok(calculator)
    }

    fn delete(&self, id: &CalculatorId) -> Result<(), RepositoryError> {
        let mut guard = self.inner.write().map_err(|_| RepositoryError::LockPoisoned)?;
        let before = guard.len();
        guard.retain(|calculator| calculator.id.as_ref() != Some(id));
        let removed = guard.len() < before;
        drop(guard);

        if removed {
            tracing::info!(%id, "calculator deleted");
            Ok(())
        } else {
            Err(RepositoryError::NotFound(id.clone()))
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::Field;

    fn calculator(name: &str) -> Calculator {
        Calculator::new(name, "basePrice + width", vec![Field::number("width", "Width")])
    }

    #[test]
    fn test_create_assigns_identity() {
        let repo = InMemoryCalculatorRepository::new();
        let created = repo.create(calculator("Shelf")).unwrap();
        assert!(created.id.is_some());
        assert!(created.created_at.is_some());
        assert_eq!(created.created_at, created.updated_at);
        assert_eq!(repo.get(created.id.as_ref().unwrap()).unwrap(), Some(created));
    }

    #[test]
    fn test_create_rejects_invalid() {
        let repo = InMemoryCalculatorRepository::new();
        let err = repo.create(Calculator::new("", "", Vec::new())).unwrap_err();
        assert!(matches!(err, RepositoryError::Invalid(issues) if issues.len() == 3));
        assert!(repo.list().unwrap().is_empty());
    }

    #[test]
    fn test_ids_are_never_reused() {
        let repo = InMemoryCalculatorRepository::new();
        let first = repo.create(calculator("A")).unwrap();
        repo.delete(first.id.as_ref().unwrap()).unwrap();
        let second = repo.create(calculator("A")).unwrap();
        assert_ne!(first.id, second.id);
    }

    #[test]
    fn test_update_keeps_id_and_created_at() {
        let repo = InMemoryCalculatorRepository::new();
        let created = repo.create(calculator("Shelf")).unwrap();
        let id = created.id.clone().unwrap();

        let updated = repo.update(&id, calculator("Shelf v2")).unwrap();
        assert_eq!(updated.id, Some(id.clone()));
        assert_eq!(updated.created_at, created.created_at);
        assert!(updated.updated_at >= created.updated_at);
        assert_eq!(repo.get(&id).unwrap().unwrap().name, "Shelf v2");
        assert_eq!(repo.list().unwrap().len(), 1);
    }

    #[test]
    fn test_unknown_id() {
        let repo = InMemoryCalculatorRepository::new();
        let id = CalculatorId::new("missing");
        assert_eq!(
            repo.update(&id, calculator("X")),
            Err(RepositoryError::NotFound(id.clone()))
        );
        assert_eq!(repo.delete(&id), Err(RepositoryError::NotFound(id.clone())));
        assert_eq!(repo.get(&id).unwrap(), None);
    }

    #[test]
    fn test_find_by_product_id() {
        let repo = InMemoryCalculatorRepository::new();
        let product = ProductId::new("gid://shopify/Product/42");
        repo.create(calculator("Unassigned")).unwrap();
        let mut assigned = calculator("Assigned");
        assigned.assign_to_product(product.clone());
        repo.create(assigned).unwrap();

        let found = repo.find_by_product_id(&product).unwrap().unwrap();
        assert_eq!(found.name, "Assigned");
        assert!(repo
            .find_by_product_id(&ProductId::new("gid://shopify/Product/7"))
            .unwrap()
            .is_none());
    }
}
