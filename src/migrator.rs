use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_parts_table::Migration),
            Box::new(m20240101_000002_create_stock_locations_table::Migration),
            Box::new(m20240101_000003_create_sales_tables::Migration),
            Box::new(m20240101_000004_create_transfers_tables::Migration),
        ]
    }
}

// Migration implementations

mod m20240101_000001_create_parts_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000001_create_parts_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Parts::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Parts::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Parts::Sku).string().not_null())
                        .col(ColumnDef::new(Parts::Name).string().not_null())
                        .col(ColumnDef::new(Parts::ManufacturerCode).string().not_null())
                        .col(ColumnDef::new(Parts::Brand).string().not_null())
                        .col(
                            ColumnDef::new(Parts::UnitPrice)
                                .decimal_len(16, 4)
                                .not_null(),
                        )
                        .col(ColumnDef::new(Parts::ImageUrl).string().null())
                        .col(ColumnDef::new(Parts::AiTags).string().null())
                        .col(
                            ColumnDef::new(Parts::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_parts_sku")
                        .table(Parts::Table)
                        .col(Parts::Sku)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Parts::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum Parts {
        Table,
        Id,
        Sku,
        Name,
        ManufacturerCode,
        Brand,
        UnitPrice,
        ImageUrl,
        AiTags,
        CreatedAt,
    }
}

mod m20240101_000002_create_stock_locations_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000002_create_stock_locations_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(StockLocations::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(StockLocations::Id)
                                .big_integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(StockLocations::PartId).uuid().not_null())
                        .col(
                            ColumnDef::new(StockLocations::StoreId)
                                .integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(StockLocations::Label).string().not_null())
                        .col(
                            ColumnDef::new(StockLocations::Quantity)
                                .big_integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(StockLocations::SubLocation)
                                .string()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            // One ledger entry per (part, store); credits to a new store
            // append a row, never renumber existing ones.
            manager
                .create_index(
                    Index::create()
                        .name("idx_stock_locations_part_store")
                        .table(StockLocations::Table)
                        .col(StockLocations::PartId)
                        .col(StockLocations::StoreId)
                        .unique()
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(StockLocations::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum StockLocations {
        Table,
        Id,
        PartId,
        StoreId,
        Label,
        Quantity,
        SubLocation,
    }
}

mod m20240101_000003_create_sales_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000003_create_sales_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Sales::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Sales::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Sales::StoreId).integer().not_null())
                        .col(ColumnDef::new(Sales::Seller).string().not_null())
                        .col(ColumnDef::new(Sales::Client).string().not_null())
                        .col(
                            ColumnDef::new(Sales::Subtotal)
                                .decimal_len(16, 4)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Sales::Discount)
                                .decimal_len(16, 4)
                                .not_null(),
                        )
                        .col(ColumnDef::new(Sales::Total).decimal_len(16, 4).not_null())
                        .col(ColumnDef::new(Sales::Status).string().not_null())
                        .col(ColumnDef::new(Sales::PaymentMethod).string().null())
                        .col(
                            ColumnDef::new(Sales::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Sales::FinalizedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_sales_store_status")
                        .table(Sales::Table)
                        .col(Sales::StoreId)
                        .col(Sales::Status)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(SaleItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(SaleItems::Id)
                                .big_integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(SaleItems::SaleId).uuid().not_null())
                        .col(ColumnDef::new(SaleItems::PartId).uuid().not_null())
                        .col(ColumnDef::new(SaleItems::Name).string().not_null())
                        .col(ColumnDef::new(SaleItems::Quantity).big_integer().not_null())
                        .col(
                            ColumnDef::new(SaleItems::UnitPrice)
                                .decimal_len(16, 4)
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_sale_items_sale")
                        .table(SaleItems::Table)
                        .col(SaleItems::SaleId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(SaleItems::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Sales::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum Sales {
        Table,
        Id,
        StoreId,
        Seller,
        Client,
        Subtotal,
        Discount,
        Total,
        Status,
        PaymentMethod,
        CreatedAt,
        FinalizedAt,
    }

    #[derive(Iden)]
    enum SaleItems {
        Table,
        Id,
        SaleId,
        PartId,
        Name,
        Quantity,
        UnitPrice,
    }
}

mod m20240101_000004_create_transfers_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000004_create_transfers_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Transfers::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Transfers::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Transfers::PartId).uuid().not_null())
                        .col(ColumnDef::new(Transfers::PartName).string().not_null())
                        .col(ColumnDef::new(Transfers::PartImage).string().null())
                        .col(ColumnDef::new(Transfers::FromStoreId).integer().not_null())
                        .col(ColumnDef::new(Transfers::ToStoreId).integer().not_null())
                        .col(ColumnDef::new(Transfers::Quantity).big_integer().not_null())
                        .col(ColumnDef::new(Transfers::Kind).string().not_null())
                        .col(ColumnDef::new(Transfers::Status).string().not_null())
                        .col(
                            ColumnDef::new(Transfers::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_transfers_from_store")
                        .table(Transfers::Table)
                        .col(Transfers::FromStoreId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_transfers_to_store")
                        .table(Transfers::Table)
                        .col(Transfers::ToStoreId)
                        .to_owned(),
                )
                .await?;

            // Append-only audit trail; seq preserves the order transitions
            // were accepted in.
            manager
                .create_table(
                    Table::create()
                        .table(TransferEvents::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(TransferEvents::Seq)
                                .big_integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(TransferEvents::TransferId).uuid().not_null())
                        .col(ColumnDef::new(TransferEvents::Status).string().not_null())
                        .col(ColumnDef::new(TransferEvents::Actor).string().not_null())
                        .col(
                            ColumnDef::new(TransferEvents::RecordedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_transfer_events_transfer")
                        .table(TransferEvents::Table)
                        .col(TransferEvents::TransferId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(TransferEvents::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Transfers::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum Transfers {
        Table,
        Id,
        PartId,
        PartName,
        PartImage,
        FromStoreId,
        ToStoreId,
        Quantity,
        Kind,
        Status,
        CreatedAt,
    }

    #[derive(Iden)]
    enum TransferEvents {
        Table,
        Seq,
        TransferId,
        Status,
        Actor,
        RecordedAt,
    }
}
