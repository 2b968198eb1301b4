//! Migration file generator

use chrono::{DateTime, Utc};
use podium::migration::{MigrationError, MigrationName};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Write a new migration template into `dir`, named after `description` and `now`.
///
/// Returns the path of the file written. An existing file is never overwritten.
pub fn write_migration(
    dir: &Path,
    description: &str,
    now: DateTime<Utc>,
) -> Result<PathBuf, MigrationError> {
    let name = MigrationName::generate(now, description)?;

    fs::create_dir_all(dir)?;
    let path = dir.join(name.file_name());
    if path.exists() {
        return Err(MigrationError::Io(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("{} already exists", path.display()),
        )));
    }

    fs::write(&path, render_template(&name, now))?;
    Ok(path)
}

/// `create_score_table` → `CreateScoreTable`
pub fn struct_name(slug: &str) -> String {
    slug.split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect()
}

fn render_template(name: &MigrationName, now: DateTime<Utc>) -> String {
    let mut struct_name = struct_name(&name.slug);
    if struct_name.starts_with(|c: char| c.is_ascii_digit()) {
        struct_name.insert(0, 'M');
    }

    format!(
        r#"//! Migration: {slug}
//! Version: {version}
//! Generated: {generated}

use podium::migration::{{Migration, SchemaManager}};
use podium::PodiumError;

pub struct {struct_name};

impl Migration for {struct_name} {{
    fn name(&self) -> &str {{
        "{name}"
    }}

    fn up(&self, manager: &SchemaManager<'_>) -> Result<(), PodiumError> {{
        // let table = sea_query::Table::create()
        //     .table("example")
        //     .col(sea_query::ColumnDef::new("id").big_integer().not_null().primary_key())
        //     .to_owned();
        // manager.create_table(table)?;
        let _ = manager;
        Ok(())
    }}

    fn down(&self, manager: &SchemaManager<'_>) -> Result<(), PodiumError> {{
        // manager.drop_table(sea_query::Table::drop().table("example").to_owned())?;
        let _ = manager;
        Ok(())
    }}
}}
"#,
        slug = name.slug,
        version = name.version,
        generated = now.format("%Y-%m-%d %H:%M:%S UTC"),
        struct_name = struct_name,
        name = name,
    )
}
