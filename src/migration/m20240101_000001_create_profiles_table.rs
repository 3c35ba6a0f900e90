use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Profiles::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Profiles::Id).text().not_null().primary_key())
                    .col(ColumnDef::new(Profiles::Email).text())
                    .col(ColumnDef::new(Profiles::FullName).text())
                    .col(ColumnDef::new(Profiles::Company).text())
                    .col(ColumnDef::new(Profiles::JobTitle).text())
                    .col(ColumnDef::new(Profiles::Industry).text())
                    .col(ColumnDef::new(Profiles::Location).text())
                    .col(ColumnDef::new(Profiles::LinkedinUrl).text())
                    .col(ColumnDef::new(Profiles::Bio).text())
                    .col(ColumnDef::new(Profiles::PhoneNumber).text())
                    .col(ColumnDef::new(Profiles::BatchYear).text())
                    .col(ColumnDef::new(Profiles::Dob).date())
                    .col(ColumnDef::new(Profiles::JobStartDate).date())
                    .col(ColumnDef::new(Profiles::Tags).json())
                    .col(ColumnDef::new(Profiles::IsProfileComplete).boolean())
                    .col(ColumnDef::new(Profiles::UpdatedAt).timestamp_with_time_zone())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Profiles::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Profiles {
    Table,
    Id,
    Email,
    FullName,
    Company,
    JobTitle,
    Industry,
    Location,
    LinkedinUrl,
    Bio,
    PhoneNumber,
    BatchYear,
    Dob,
    JobStartDate,
    Tags,
    IsProfileComplete,
    UpdatedAt,
}
