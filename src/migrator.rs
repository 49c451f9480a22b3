//! Embedded schema migrations, executed by `db::run_migrations`.

use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_units_tables::Migration),
            Box::new(m20240101_000002_create_products_table::Migration),
            Box::new(m20240101_000003_create_inventory_tables::Migration),
            Box::new(m20240101_000004_create_requests_table::Migration),
            Box::new(m20240101_000005_create_movement_tables::Migration),
        ]
    }
}

mod m20240101_000001_create_units_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000001_create_units_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Units::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Units::Id)
                                .big_integer()
                                .primary_key()
                                .auto_increment()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Units::Code).string().not_null())
                        .col(ColumnDef::new(Units::Name).string().not_null())
                        .col(ColumnDef::new(Units::MagnitudeGroup).string().not_null())
                        .col(
                            ColumnDef::new(Units::IsBase)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .to_owned(),
                )
                .await?;

            // One stored direction per unit pair; the inverse is derived at runtime.
            manager
                .create_table(
                    Table::create()
                        .table(UnitConversions::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(UnitConversions::Id)
                                .big_integer()
                                .primary_key()
                                .auto_increment()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(UnitConversions::OriginUnitId)
                                .big_integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(UnitConversions::DestinationUnitId)
                                .big_integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(UnitConversions::Factor)
                                .decimal_len(19, 8)
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_unit_conversions_pair")
                        .table(UnitConversions::Table)
                        .col(UnitConversions::OriginUnitId)
                        .col(UnitConversions::DestinationUnitId)
                        .unique()
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(UnitConversions::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Units::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Units {
        Table,
        Id,
        Code,
        Name,
        MagnitudeGroup,
        IsBase,
    }

    #[derive(DeriveIden)]
    enum UnitConversions {
        Table,
        Id,
        OriginUnitId,
        DestinationUnitId,
        Factor,
    }
}

mod m20240101_000002_create_products_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000002_create_products_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Products::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Products::Id)
                                .big_integer()
                                .primary_key()
                                .auto_increment()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Products::Name).string().not_null())
                        .col(ColumnDef::new(Products::UnitId).big_integer().null())
                        .col(ColumnDef::new(Products::CreatedAt).timestamp().not_null())
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Products::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Products {
        Table,
        Id,
        Name,
        UnitId,
        CreatedAt,
    }
}

mod m20240101_000003_create_inventory_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000003_create_inventory_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(StorageLocations::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(StorageLocations::Id)
                                .big_integer()
                                .primary_key()
                                .auto_increment()
                                .not_null(),
                        )
                        .col(ColumnDef::new(StorageLocations::Name).string().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(InventoryBatches::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(InventoryBatches::Id)
                                .big_integer()
                                .primary_key()
                                .auto_increment()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryBatches::ProductId)
                                .big_integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryBatches::LocationId)
                                .big_integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryBatches::QuantityAvailable)
                                .decimal_len(19, 4)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryBatches::UpdatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_inventory_batches_product")
                        .table(InventoryBatches::Table)
                        .col(InventoryBatches::ProductId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(InventoryBatches::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(StorageLocations::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum StorageLocations {
        Table,
        Id,
        Name,
    }

    #[derive(DeriveIden)]
    enum InventoryBatches {
        Table,
        Id,
        ProductId,
        LocationId,
        QuantityAvailable,
        UpdatedAt,
    }
}

mod m20240101_000004_create_requests_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000004_create_requests_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(DonationRequests::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(DonationRequests::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(DonationRequests::BeneficiaryId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(DonationRequests::FoodType)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(DonationRequests::Quantity)
                                .decimal_len(19, 4)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(DonationRequests::UnitId)
                                .big_integer()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(DonationRequests::Status)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(DonationRequests::AdminComment)
                                .text()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(DonationRequests::RespondedAt)
                                .timestamp()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(DonationRequests::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_donation_requests_status")
                        .table(DonationRequests::Table)
                        .col(DonationRequests::Status)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(DonationRequests::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum DonationRequests {
        Table,
        Id,
        BeneficiaryId,
        FoodType,
        Quantity,
        UnitId,
        Status,
        AdminComment,
        RespondedAt,
        CreatedAt,
    }
}

mod m20240101_000005_create_movement_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000005_create_movement_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(MovementHeaders::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(MovementHeaders::Id)
                                .big_integer()
                                .primary_key()
                                .auto_increment()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(MovementHeaders::MovedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .col(ColumnDef::new(MovementHeaders::ActorId).uuid().not_null())
                        .col(
                            ColumnDef::new(MovementHeaders::RecipientId)
                                .uuid()
                                .not_null(),
                        )
                        .col(ColumnDef::new(MovementHeaders::Status).string().not_null())
                        .col(ColumnDef::new(MovementHeaders::Note).text().null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(MovementDetails::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(MovementDetails::Id)
                                .big_integer()
                                .primary_key()
                                .auto_increment()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(MovementDetails::HeaderId)
                                .big_integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(MovementDetails::ProductId)
                                .big_integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(MovementDetails::Quantity)
                                .decimal_len(19, 4)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(MovementDetails::TransactionKind)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(MovementDetails::UnitId)
                                .big_integer()
                                .null(),
                        )
                        .col(ColumnDef::new(MovementDetails::Note).text().null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_movement_details_header")
                        .table(MovementDetails::Table)
                        .col(MovementDetails::HeaderId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(MovementDetails::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(MovementHeaders::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum MovementHeaders {
        Table,
        Id,
        MovedAt,
        ActorId,
        RecipientId,
        Status,
        Note,
    }

    #[derive(DeriveIden)]
    enum MovementDetails {
        Table,
        Id,
        HeaderId,
        ProductId,
        Quantity,
        TransactionKind,
        UnitId,
        Note,
    }
}
