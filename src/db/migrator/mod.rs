use sea_orm_migration::prelude::*;

mod m20240601_initial;
mod m20240602_user_data_unique_name;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240601_initial::Migration),
            Box::new(m20240602_user_data_unique_name::Migration),
        ]
    }
}
