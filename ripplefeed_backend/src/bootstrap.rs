use crate::config::RipplefeedConfig;
use crate::database::Database;
use anyhow::Result;
use std::fs;

pub struct BootstrapResources {
    pub directories_created: Vec<String>,
    pub database_initialized: bool,
    pub database: Database,
}

/// Creates the on-disk layout, opens the database, and applies migrations.
/// The returned handle is the only shared resource; it is threaded through
/// every service explicitly and lives until shutdown.
pub fn initialize(config: &RipplefeedConfig) -> Result<BootstrapResources> {
    let mut directories_created = Vec::new();
    create_dir_if_missing(&config.paths.data_dir, &mut directories_created)?;
    create_dir_if_missing(&config.paths.logs_dir, &mut directories_created)?;

    let database = Database::connect(&config.paths)?;
    let database_initialized = database.ensure_migrations()?;

    Ok(BootstrapResources {
        directories_created,
        database_initialized,
        database,
    })
}

fn create_dir_if_missing(path: &std::path::Path, created: &mut Vec<String>) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)?;
        created.push(path.display().to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RipplefeedPaths;
    use tempfile::tempdir;

    #[test]
    fn initialize_creates_layout_and_database() {
        let temp = tempdir().expect("tempdir");
        let config = RipplefeedConfig::new(
            0,
            RipplefeedPaths::from_base_dir(temp.path()).expect("paths"),
        );

        let resources = initialize(&config).expect("bootstrap");
        assert!(resources.database_initialized);
        assert!(config.paths.data_dir.exists());
        assert!(config.paths.db_path.exists());

        // a second boot reuses the existing database
        let again = initialize(&config).expect("bootstrap again");
        assert!(!again.database_initialized);
    }
}
