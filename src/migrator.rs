use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_bom_tables::Migration),
            Box::new(m20240101_000002_create_bin_tables::Migration),
            Box::new(m20240101_000003_create_sales_order_tables::Migration),
            Box::new(m20240101_000004_create_dispatch_tables::Migration),
            Box::new(m20240101_000005_create_automation_attempts_table::Migration),
        ]
    }
}

// Migration implementations

mod m20240101_000001_create_bom_tables {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000001_create_bom_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Boms::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Boms::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Boms::RawId).string().not_null())
                        .col(ColumnDef::new(Boms::ProductCode).string().not_null())
                        .col(ColumnDef::new(Boms::Name).string().null())
                        .col(ColumnDef::new(Boms::Quantity).decimal().not_null())
                        .col(ColumnDef::new(Boms::CreatedAt).timestamp().not_null())
                        .col(ColumnDef::new(Boms::UpdatedAt).timestamp().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(FinishedGoods::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(FinishedGoods::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(FinishedGoods::BomId).uuid().not_null())
                        .col(ColumnDef::new(FinishedGoods::ProductId).string().not_null())
                        .col(
                            ColumnDef::new(FinishedGoods::ProductCode)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(FinishedGoods::Quantity)
                                .decimal()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(FinishedGoods::SortOrder)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(FinishedGoods::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(FinishedGoods::UpdatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_finished_goods_bom")
                                .from(FinishedGoods::Table, FinishedGoods::BomId)
                                .to(Boms::Table, Boms::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(ConsumedProducts::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ConsumedProducts::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ConsumedProducts::FinishedGoodId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ConsumedProducts::ProductId)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ConsumedProducts::ProductCode)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ConsumedProducts::Quantity)
                                .decimal()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ConsumedProducts::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ConsumedProducts::UpdatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_consumed_products_finished_good")
                                .from(ConsumedProducts::Table, ConsumedProducts::FinishedGoodId)
                                .to(FinishedGoods::Table, FinishedGoods::Id),
                        )
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(ConsumedProducts::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(FinishedGoods::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Boms::Table).to_owned())
                .await?;
            Ok(())
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Boms {
        Table,
        Id,
        RawId,
        ProductCode,
        Name,
        Quantity,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    pub(super) enum FinishedGoods {
        Table,
        Id,
        BomId,
        ProductId,
        ProductCode,
        Quantity,
        SortOrder,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    pub(super) enum ConsumedProducts {
        Table,
        Id,
        FinishedGoodId,
        ProductId,
        ProductCode,
        Quantity,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240101_000002_create_bin_tables {

    use sea_orm_migration::prelude::*;

    use super::m20240101_000001_create_bom_tables::{Boms, FinishedGoods};

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000002_create_bin_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Bins::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Bins::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Bins::BinNumber).integer().not_null())
                        .col(ColumnDef::new(Bins::BomId).uuid().not_null())
                        .col(ColumnDef::new(Bins::TotalBinsUsed).decimal().not_null())
                        .col(ColumnDef::new(Bins::BatchId).string().not_null())
                        .col(ColumnDef::new(Bins::BatchName).string().not_null())
                        .col(ColumnDef::new(Bins::BatchLocation).string().not_null())
                        .col(ColumnDef::new(Bins::CustomBatch).string().not_null())
                        .col(ColumnDef::new(Bins::StaffCount).integer().not_null())
                        .col(ColumnDef::new(Bins::TimeStart).timestamp().not_null())
                        .col(ColumnDef::new(Bins::TimeFinish).timestamp().not_null())
                        .col(
                            ColumnDef::new(Bins::PostingState)
                                .string_len(16)
                                .not_null()
                                .default("DRAFT"),
                        )
                        .col(
                            ColumnDef::new(Bins::PostingAttempts)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(Bins::AdjustmentNumber).string().null())
                        .col(ColumnDef::new(Bins::AdjustmentId).string().null())
                        .col(ColumnDef::new(Bins::ExternalStatus).string().null())
                        .col(ColumnDef::new(Bins::ExternalModifiedBy).string().null())
                        .col(ColumnDef::new(Bins::ExternalModifiedOn).string().null())
                        .col(ColumnDef::new(Bins::CreatedAt).timestamp().not_null())
                        .col(ColumnDef::new(Bins::UpdatedAt).timestamp().not_null())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_bins_bom")
                                .from(Bins::Table, Bins::BomId)
                                .to(Boms::Table, Boms::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(BinBatches::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(BinBatches::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(BinBatches::BinId).uuid().not_null())
                        .col(ColumnDef::new(BinBatches::BatchId).string().not_null())
                        .col(ColumnDef::new(BinBatches::BatchName).string().not_null())
                        .col(
                            ColumnDef::new(BinBatches::BatchLocation)
                                .string()
                                .not_null(),
                        )
                        .col(ColumnDef::new(BinBatches::Quantity).decimal().not_null())
                        .col(ColumnDef::new(BinBatches::CreatedAt).timestamp().not_null())
                        .col(ColumnDef::new(BinBatches::UpdatedAt).timestamp().not_null())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_bin_batches_bin")
                                .from(BinBatches::Table, BinBatches::BinId)
                                .to(Bins::Table, Bins::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(BinFinishedGoods::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(BinFinishedGoods::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(BinFinishedGoods::BinId).uuid().not_null())
                        .col(
                            ColumnDef::new(BinFinishedGoods::FinishedGoodId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(BinFinishedGoods::FinishedGoodProductId)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(BinFinishedGoods::Quantity)
                                .decimal()
                                .not_null(),
                        )
                        .col(ColumnDef::new(BinFinishedGoods::Comment).string().null())
                        .col(
                            ColumnDef::new(BinFinishedGoods::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(BinFinishedGoods::UpdatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_bin_finished_goods_bin")
                                .from(BinFinishedGoods::Table, BinFinishedGoods::BinId)
                                .to(Bins::Table, Bins::Id),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_bin_finished_goods_finished_good")
                                .from(
                                    BinFinishedGoods::Table,
                                    BinFinishedGoods::FinishedGoodId,
                                )
                                .to(FinishedGoods::Table, FinishedGoods::Id),
                        )
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(BinFinishedGoods::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(BinBatches::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Bins::Table).to_owned())
                .await?;
            Ok(())
        }
    }

    #[derive(DeriveIden)]
    enum Bins {
        Table,
        Id,
        BinNumber,
        BomId,
        TotalBinsUsed,
        BatchId,
        BatchName,
        BatchLocation,
        CustomBatch,
        StaffCount,
        TimeStart,
        TimeFinish,
        PostingState,
        PostingAttempts,
        AdjustmentNumber,
        AdjustmentId,
        ExternalStatus,
        ExternalModifiedBy,
        ExternalModifiedOn,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum BinBatches {
        Table,
        Id,
        BinId,
        BatchId,
        BatchName,
        BatchLocation,
        Quantity,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum BinFinishedGoods {
        Table,
        Id,
        BinId,
        FinishedGoodId,
        FinishedGoodProductId,
        Quantity,
        Comment,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240101_000003_create_sales_order_tables {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000003_create_sales_order_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(SalesOrders::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(SalesOrders::Id)
                                .integer()
                                .auto_increment()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(SalesOrders::OrderNumber).string().not_null())
                        .col(
                            ColumnDef::new(SalesOrders::CustomerCode)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(SalesOrders::CustomerName)
                                .string()
                                .not_null(),
                        )
                        .col(ColumnDef::new(SalesOrders::Warehouse).string().not_null())
                        .col(
                            ColumnDef::new(SalesOrders::Status)
                                .string_len(16)
                                .not_null(),
                        )
                        .col(ColumnDef::new(SalesOrders::OrderDate).timestamp().not_null())
                        .col(ColumnDef::new(SalesOrders::CreatedAt).timestamp().not_null())
                        .col(ColumnDef::new(SalesOrders::UpdatedAt).timestamp().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(SalesOrderLines::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(SalesOrderLines::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(SalesOrderLines::SalesOrderId)
                                .integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(SalesOrderLines::Line).integer().not_null())
                        .col(
                            ColumnDef::new(SalesOrderLines::ProductCode)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(SalesOrderLines::ProductDescription)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(SalesOrderLines::Quantity)
                                .decimal()
                                .not_null(),
                        )
                        .col(ColumnDef::new(SalesOrderLines::Price).decimal().not_null())
                        .col(
                            ColumnDef::new(SalesOrderLines::Shipped)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(SalesOrderLines::Invoiced)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(SalesOrderLines::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(SalesOrderLines::UpdatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_sales_order_lines_order")
                                .from(SalesOrderLines::Table, SalesOrderLines::SalesOrderId)
                                .to(SalesOrders::Table, SalesOrders::Id),
                        )
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(SalesOrderLines::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(SalesOrders::Table).to_owned())
                .await?;
            Ok(())
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum SalesOrders {
        Table,
        Id,
        OrderNumber,
        CustomerCode,
        CustomerName,
        Warehouse,
        Status,
        OrderDate,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    pub(super) enum SalesOrderLines {
        Table,
        Id,
        SalesOrderId,
        Line,
        ProductCode,
        ProductDescription,
        Quantity,
        Price,
        Shipped,
        Invoiced,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240101_000004_create_dispatch_tables {

    use sea_orm_migration::prelude::*;

    use super::m20240101_000003_create_sales_order_tables::SalesOrderLines;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000004_create_dispatch_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Dispatches::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Dispatches::Id)
                                .integer()
                                .auto_increment()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Dispatches::CustomerId).string().not_null())
                        .col(ColumnDef::new(Dispatches::CustomerCode).string().not_null())
                        .col(ColumnDef::new(Dispatches::CustomerName).string().not_null())
                        .col(
                            ColumnDef::new(Dispatches::CustomerType)
                                .string_len(16)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Dispatches::ShippingCompany)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Dispatches::ShippingCompanyId)
                                .string()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Dispatches::Address).string().not_null())
                        .col(
                            ColumnDef::new(Dispatches::TrackingNumber)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Dispatches::DispatchDate)
                                .timestamp()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Dispatches::NumberOfPackages)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Dispatches::ShipmentWeight)
                                .decimal()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Dispatches::Status).string_len(16).not_null())
                        .col(
                            ColumnDef::new(Dispatches::MarkedDone)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(Dispatches::PostingState)
                                .string_len(16)
                                .not_null()
                                .default("DRAFT"),
                        )
                        .col(
                            ColumnDef::new(Dispatches::PostingAttempts)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(Dispatches::AdjustmentNumber).string().null())
                        .col(ColumnDef::new(Dispatches::AdjustmentId).string().null())
                        .col(ColumnDef::new(Dispatches::ExternalStatus).string().null())
                        .col(
                            ColumnDef::new(Dispatches::ExternalCreatedBy)
                                .string()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Dispatches::ExternalCreatedOn)
                                .string()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Dispatches::ExternalModifiedBy)
                                .string()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Dispatches::ExternalModifiedOn)
                                .string()
                                .null(),
                        )
                        .col(ColumnDef::new(Dispatches::CreatedAt).timestamp().not_null())
                        .col(ColumnDef::new(Dispatches::UpdatedAt).timestamp().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(DispatchLines::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(DispatchLines::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(DispatchLines::DispatchId)
                                .integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(DispatchLines::Line).integer().not_null())
                        .col(
                            ColumnDef::new(DispatchLines::ProductCode)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(DispatchLines::ProductDescription)
                                .string()
                                .not_null(),
                        )
                        .col(ColumnDef::new(DispatchLines::Ship).decimal().not_null())
                        .col(ColumnDef::new(DispatchLines::Weight).decimal().null())
                        .col(
                            ColumnDef::new(DispatchLines::SalesOrderLineId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(DispatchLines::BatchNumber)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(DispatchLines::BatchLocation)
                                .string()
                                .not_null(),
                        )
                        .col(ColumnDef::new(DispatchLines::SealNumber).string().null())
                        .col(
                            ColumnDef::new(DispatchLines::ContainerNumber)
                                .string()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(DispatchLines::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(DispatchLines::UpdatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_dispatch_lines_dispatch")
                                .from(DispatchLines::Table, DispatchLines::DispatchId)
                                .to(Dispatches::Table, Dispatches::Id),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_dispatch_lines_sales_order_line")
                                .from(DispatchLines::Table, DispatchLines::SalesOrderLineId)
                                .to(SalesOrderLines::Table, SalesOrderLines::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(CrateLines::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(CrateLines::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(CrateLines::DispatchId).integer().null())
                        .col(ColumnDef::new(CrateLines::Line).integer().null())
                        .col(ColumnDef::new(CrateLines::CustomerId).string().not_null())
                        .col(ColumnDef::new(CrateLines::CustomerCode).string().not_null())
                        .col(ColumnDef::new(CrateLines::CustomerName).string().not_null())
                        .col(ColumnDef::new(CrateLines::Sku).string_len(24).not_null())
                        .col(ColumnDef::new(CrateLines::Reference).string().not_null())
                        .col(ColumnDef::new(CrateLines::Quantity).integer().not_null())
                        .col(ColumnDef::new(CrateLines::CreatedAt).timestamp().not_null())
                        .col(ColumnDef::new(CrateLines::UpdatedAt).timestamp().not_null())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_crate_lines_dispatch")
                                .from(CrateLines::Table, CrateLines::DispatchId)
                                .to(Dispatches::Table, Dispatches::Id),
                        )
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(CrateLines::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(DispatchLines::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Dispatches::Table).to_owned())
                .await?;
            Ok(())
        }
    }

    #[derive(DeriveIden)]
    enum Dispatches {
        Table,
        Id,
        CustomerId,
        CustomerCode,
        CustomerName,
        CustomerType,
        ShippingCompany,
        ShippingCompanyId,
        Address,
        TrackingNumber,
        DispatchDate,
        NumberOfPackages,
        ShipmentWeight,
        Status,
        MarkedDone,
        PostingState,
        PostingAttempts,
        AdjustmentNumber,
        AdjustmentId,
        ExternalStatus,
        ExternalCreatedBy,
        ExternalCreatedOn,
        ExternalModifiedBy,
        ExternalModifiedOn,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum DispatchLines {
        Table,
        Id,
        DispatchId,
        Line,
        ProductCode,
        ProductDescription,
        Ship,
        Weight,
        SalesOrderLineId,
        BatchNumber,
        BatchLocation,
        SealNumber,
        ContainerNumber,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum CrateLines {
        Table,
        Id,
        DispatchId,
        Line,
        CustomerId,
        CustomerCode,
        CustomerName,
        Sku,
        Reference,
        Quantity,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240101_000005_create_automation_attempts_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000005_create_automation_attempts_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(AutomationAttempts::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(AutomationAttempts::Number)
                                .string()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(AutomationAttempts::Attempts)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(AutomationAttempts::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(AutomationAttempts::UpdatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(AutomationAttempts::Table).to_owned())
                .await?;
            Ok(())
        }
    }

    #[derive(DeriveIden)]
    enum AutomationAttempts {
        Table,
        Number,
        Attempts,
        CreatedAt,
        UpdatedAt,
    }
}
