pub use sea_orm_migration::prelude::*;

mod m20231230_000001_create_video_entries_table;
mod m20231230_000002_create_url_entries_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20231230_000001_create_video_entries_table::Migration),
            Box::new(m20231230_000002_create_url_entries_table::Migration),
        ]
    }
}
