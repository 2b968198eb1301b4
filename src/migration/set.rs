//! Ordered list of migration scripts supplied by the hosting application

use super::error::MigrationError;
use super::migration::Migration;
use super::naming::validate_name;

/// The full, ordered script listing for one database.
///
/// Order is the application order. Names are unique within a set.
///
/// ```rust,no_run
/// use podium::migration::MigrationSet;
/// # fn competitions() -> Box<dyn podium::migration::Migration> { todo!() }
/// # fn registrations() -> Box<dyn podium::migration::Migration> { todo!() }
///
/// let mut set = MigrationSet::new();
/// set.add(competitions())?;
/// set.add(registrations())?;
/// # Ok::<(), podium::migration::MigrationError>(())
/// ```
#[derive(Default)]
pub struct MigrationSet {
    migrations: Vec<Box<dyn Migration>>,
}

impl MigrationSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from scripts already in application order.
    ///
    /// # Errors
    ///
    /// Returns `MigrationError::DuplicateScript` or `MigrationError::InvalidName`.
    pub fn from_migrations(
        migrations: Vec<Box<dyn Migration>>,
    ) -> Result<Self, MigrationError> {
        let mut set = Self::new();
        for migration in migrations {
            set.add(migration)?;
        }
        Ok(set)
    }

    /// Append a script.
    ///
    /// # Errors
    ///
    /// Returns `MigrationError::DuplicateScript` if the name is already in the set,
    /// or `MigrationError::InvalidName` if it is empty or too long for the ledger.
    pub fn add(&mut self, migration: Box<dyn Migration>) -> Result<(), MigrationError> {
        validate_name(migration.name())?;
        if self.contains(migration.name()) {
            return Err(MigrationError::DuplicateScript(migration.name().to_string()));
        }
        self.migrations.push(migration);
        Ok(())
    }

    /// Order scripts by name, i.e. by timestamp prefix.
    pub fn sort_by_name(&mut self) {
        self.migrations.sort_by(|a, b| a.name().cmp(b.name()));
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &dyn Migration> + '_ {
        self.migrations.iter().map(|m| m.as_ref())
    }

    pub fn get(&self, name: &str) -> Option<&dyn Migration> {
        self.iter().find(|m| m.name() == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn names(&self) -> Vec<&str> {
        self.iter().map(|m| m.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.migrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.migrations.is_empty()
    }
}
