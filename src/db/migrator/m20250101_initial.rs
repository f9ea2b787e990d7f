use crate::entities::{prelude::*, push_subscriptions};
use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::Schema;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let backend = manager.get_database_backend();
        let schema = Schema::new(backend);

        // Parents before children so foreign keys resolve.
        manager
            .create_table(
                schema
                    .create_table_from_entity(Users)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(Plants)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(Waterings)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(PushSubscriptions)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        let indexes = schema
            .create_index_from_entity(Plants)
            .into_iter()
            .chain(schema.create_index_from_entity(Waterings))
            .chain(schema.create_index_from_entity(PushSubscriptions));

        for mut index in indexes {
            manager.create_index(index.if_not_exists().to_owned()).await?;
        }

        manager
            .create_index(
                Index::create()
                    .name("idx_push_subscriptions_user_endpoint")
                    .table(PushSubscriptions)
                    .col(push_subscriptions::Column::UserId)
                    .col(push_subscriptions::Column::Endpoint)
                    .unique()
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PushSubscriptions).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Waterings).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Plants).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users).to_owned())
            .await?;

        Ok(())
    }
}
