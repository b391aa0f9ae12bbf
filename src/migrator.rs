use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240601_000001_create_products_table::Migration),
            Box::new(m20240601_000002_create_bom_tables::Migration),
            Box::new(m20240601_000003_create_bom_cost_components_table::Migration),
        ]
    }
}

mod m20240601_000001_create_products_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240601_000001_create_products_table"
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
                        .col(ColumnDef::new(Products::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Products::BranchId).uuid().not_null())
                        .col(ColumnDef::new(Products::Name).string().not_null())
                        .col(ColumnDef::new(Products::Sku).string().null())
                        .col(
                            ColumnDef::new(Products::QuantityInStock)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(Products::PurchasePrice).decimal().null())
                        .col(ColumnDef::new(Products::SalePrice).decimal().null())
                        .col(
                            ColumnDef::new(Products::IsVariant)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(Products::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Products::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_products_branch_id")
                        .table(Products::Table)
                        .col(Products::BranchId)
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

    #[derive(Iden)]
    enum Products {
        Table,
        Id,
        BranchId,
        Name,
        Sku,
        QuantityInStock,
        PurchasePrice,
        SalePrice,
        IsVariant,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240601_000002_create_bom_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240601_000002_create_bom_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(BomVersions::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(BomVersions::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(BomVersions::BranchId).uuid().not_null())
                        .col(
                            ColumnDef::new(BomVersions::ParentProductId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(BomVersions::VersionNumber)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(BomVersions::Status)
                                .string_len(16)
                                .not_null()
                                .default("draft"),
                        )
                        .col(
                            ColumnDef::new(BomVersions::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(BomVersions::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            // No foreign key to bom_versions: line items may be unversioned and
            // deletes are issued explicitly, line items first.
            manager
                .create_table(
                    Table::create()
                        .table(ProductBom::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(ProductBom::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(ProductBom::BranchId).uuid().not_null())
                        .col(ColumnDef::new(ProductBom::ParentProductId).uuid().not_null())
                        .col(
                            ColumnDef::new(ProductBom::ComponentProductId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ProductBom::QuantityRequired)
                                .decimal()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ProductBom::UnitOfMeasure)
                                .string()
                                .not_null()
                                .default("pcs"),
                        )
                        .col(ColumnDef::new(ProductBom::ScrapFactor).decimal().null())
                        .col(ColumnDef::new(ProductBom::ProductionStep).string().null())
                        .col(ColumnDef::new(ProductBom::BomVersionId).uuid().null())
                        .col(
                            ColumnDef::new(ProductBom::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ProductBom::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_product_bom_parent")
                        .table(ProductBom::Table)
                        .col(ProductBom::BranchId)
                        .col(ProductBom::ParentProductId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_product_bom_component")
                        .table(ProductBom::Table)
                        .col(ProductBom::BranchId)
                        .col(ProductBom::ComponentProductId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_bom_versions_parent")
                        .table(BomVersions::Table)
                        .col(BomVersions::BranchId)
                        .col(BomVersions::ParentProductId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(ProductBom::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(BomVersions::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum BomVersions {
        Table,
        Id,
        BranchId,
        ParentProductId,
        VersionNumber,
        Status,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(Iden)]
    enum ProductBom {
        Table,
        Id,
        BranchId,
        ParentProductId,
        ComponentProductId,
        QuantityRequired,
        UnitOfMeasure,
        ScrapFactor,
        ProductionStep,
        BomVersionId,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240601_000003_create_bom_cost_components_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240601_000003_create_bom_cost_components_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(BomCostComponents::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(BomCostComponents::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(BomCostComponents::BranchId).uuid().not_null())
                        .col(
                            ColumnDef::new(BomCostComponents::BomVersionId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(BomCostComponents::CostType)
                                .string_len(16)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(BomCostComponents::Description)
                                .string()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(BomCostComponents::RatePerUnit)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(BomCostComponents::Quantity)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(BomCostComponents::TotalCost)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(BomCostComponents::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(BomCostComponents::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            // Entries are removed per version when their BOM is deleted
            manager
                .create_index(
                    Index::create()
                        .name("idx_bom_cost_components_version")
                        .table(BomCostComponents::Table)
                        .col(BomCostComponents::BranchId)
                        .col(BomCostComponents::BomVersionId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(BomCostComponents::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum BomCostComponents {
        Table,
        Id,
        BranchId,
        BomVersionId,
        CostType,
        Description,
        RatePerUnit,
        Quantity,
        TotalCost,
        CreatedAt,
        UpdatedAt,
    }
}
