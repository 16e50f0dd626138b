use sea_orm::ConnectionTrait;
use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        self.create_gazetteer_entries_table(manager).await?;
        self.create_input_records_table(manager).await?;
        self.create_match_attempts_table(manager).await?;
        self.create_match_results_table(manager).await?;
        self.create_correction_notes_table(manager).await?;
        self.create_indexes(manager).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(CorrectionNotes::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(MatchResults::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(MatchAttempts::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(InputRecords::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(GazetteerEntries::Table).to_owned()).await?;
        Ok(())
    }
}

impl Migration {
    fn create_timestamp_column(&self, manager: &SchemaManager, column: impl IntoIden) -> ColumnDef {
        let mut col = ColumnDef::new(column);
        match manager.get_database_backend() {
            sea_orm::DatabaseBackend::Postgres => col.timestamp_with_time_zone().not_null(),
            _ => col.string().not_null(),
        };
        col
    }

    async fn create_gazetteer_entries_table(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(GazetteerEntries::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(GazetteerEntries::Key).string().not_null().primary_key())
                    .col(ColumnDef::new(GazetteerEntries::Canonical).text().not_null())
                    .col(ColumnDef::new(GazetteerEntries::Components).text().not_null())
                    .col(ColumnDef::new(GazetteerEntries::X).double())
                    .col(ColumnDef::new(GazetteerEntries::Y).double())
                    .col(ColumnDef::new(GazetteerEntries::Lon).double())
                    .col(ColumnDef::new(GazetteerEntries::Lat).double())
                    .col(ColumnDef::new(GazetteerEntries::Status).string().not_null())
                    .col(ColumnDef::new(GazetteerEntries::BlpuFamily).string_len(1))
                    .col(ColumnDef::new(GazetteerEntries::StreetRef).string())
                    .col(ColumnDef::new(GazetteerEntries::IsHistoric).boolean().not_null().default(false))
                    .col(ColumnDef::new(GazetteerEntries::SourceInputId).string())
                    .col(ColumnDef::new(GazetteerEntries::Embedding).text())
                    .to_owned(),
            )
            .await
    }

    async fn create_input_records_table(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(InputRecords::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(InputRecords::InputId).string().not_null().primary_key())
                    .col(ColumnDef::new(InputRecords::RawText).text().not_null())
                    .col(ColumnDef::new(InputRecords::Family).string().not_null())
                    .col(ColumnDef::new(InputRecords::ExternalRef).string())
                    .col(ColumnDef::new(InputRecords::RawReferenceNumber).string())
                    .col(ColumnDef::new(InputRecords::RawX).double())
                    .col(ColumnDef::new(InputRecords::RawY).double())
                    .col(ColumnDef::new(InputRecords::DocDate).date())
                    .col(ColumnDef::new(InputRecords::Canonical).text())
                    .col(ColumnDef::new(InputRecords::Postcode).string())
                    .col(ColumnDef::new(InputRecords::Tokens).text().not_null())
                    .col(ColumnDef::new(InputRecords::Components).text().not_null())
                    .col(ColumnDef::new(InputRecords::LowQualityCanonical).boolean().not_null().default(false))
                    .col(ColumnDef::new(InputRecords::Descriptors).text().not_null())
                    .col(ColumnDef::new(InputRecords::CorrectionTrail).text().not_null())
                    .to_owned(),
            )
            .await
    }

    async fn create_match_attempts_table(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(MatchAttempts::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(MatchAttempts::AttemptId).big_integer().not_null().auto_increment().primary_key())
                    .col(ColumnDef::new(MatchAttempts::RunLabel).string().not_null())
                    .col(ColumnDef::new(MatchAttempts::InputId).string().not_null())
                    .col(ColumnDef::new(MatchAttempts::GazetteerKey).string().not_null())
                    .col(ColumnDef::new(MatchAttempts::Method).string().not_null())
                    .col(ColumnDef::new(MatchAttempts::Score).double().not_null())
                    .col(ColumnDef::new(MatchAttempts::TieRank).integer().not_null())
                    .col(ColumnDef::new(MatchAttempts::Features).text().not_null())
                    .to_owned(),
            )
            .await
    }

    async fn create_match_results_table(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(MatchResults::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(MatchResults::InputId).string().not_null())
                    .col(ColumnDef::new(MatchResults::RunLabel).string().not_null())
                    .col(ColumnDef::new(MatchResults::Decision).string().not_null())
                    .col(ColumnDef::new(MatchResults::GazetteerKey).string())
                    .col(ColumnDef::new(MatchResults::Method).string())
                    .col(ColumnDef::new(MatchResults::Score).double().not_null())
                    .col(ColumnDef::new(MatchResults::Reason).text().not_null())
                    .col(self.create_timestamp_column(manager, MatchResults::Ts))
                    .primary_key(Index::create().col(MatchResults::InputId).col(MatchResults::RunLabel))
                    .to_owned(),
            )
            .await
    }

    async fn create_correction_notes_table(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(CorrectionNotes::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(CorrectionNotes::NoteId).big_integer().not_null().auto_increment().primary_key())
                    .col(ColumnDef::new(CorrectionNotes::InputId).string().not_null())
                    .col(ColumnDef::new(CorrectionNotes::Agent).string().not_null())
                    .col(ColumnDef::new(CorrectionNotes::BeforeCanonical).text().not_null())
                    .col(ColumnDef::new(CorrectionNotes::AfterCanonical).text().not_null())
                    .col(ColumnDef::new(CorrectionNotes::Confidence).double().not_null())
                    .col(ColumnDef::new(CorrectionNotes::Validation).text().not_null())
                    .col(self.create_timestamp_column(manager, CorrectionNotes::Ts))
                    .to_owned(),
            )
            .await
    }

    async fn create_indexes(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_index(
                Index::create()
                    .name("idx_gazetteer_entries_canonical")
                    .table(GazetteerEntries::Table)
                    .col(GazetteerEntries::Canonical)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_gazetteer_entries_xy")
                    .table(GazetteerEntries::Table)
                    .col(GazetteerEntries::X)
                    .col(GazetteerEntries::Y)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_match_attempts_input_id")
                    .table(MatchAttempts::Table)
                    .col(MatchAttempts::InputId)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_correction_notes_input_id")
                    .table(CorrectionNotes::Table)
                    .col(CorrectionNotes::InputId)
                    .to_owned(),
            )
            .await?;

        // PostgreSQL-only: trigram GIN index accelerating S2's similarity
        // lookup. No-op elsewhere, same pattern as the donor's pg_trgm
        // migration for its filterable text columns.
        if manager.get_database_backend() == sea_orm::DatabaseBackend::Postgres {
            let conn = manager.get_connection();
            if let Err(e) = conn.execute_unprepared("CREATE EXTENSION IF NOT EXISTS pg_trgm").await {
                tracing::warn!("unable to create pg_trgm extension, trigram search will fall back to a sequential scan: {e}");
                return Ok(());
            }
            conn.execute_unprepared(
                "CREATE INDEX IF NOT EXISTS idx_gazetteer_entries_canonical_trgm ON gazetteer_entries USING GIN (canonical gin_trgm_ops)",
            )
            .await?;
        }

        Ok(())
    }
}

#[derive(DeriveIden)]
enum GazetteerEntries {
    Table,
    Key,
    Canonical,
    Components,
    X,
    Y,
    Lon,
    Lat,
    Status,
    BlpuFamily,
    StreetRef,
    IsHistoric,
    SourceInputId,
    Embedding,
}

#[derive(DeriveIden)]
enum InputRecords {
    Table,
    InputId,
    RawText,
    Family,
    ExternalRef,
    RawReferenceNumber,
    RawX,
    RawY,
    DocDate,
    Canonical,
    Postcode,
    Tokens,
    Components,
    LowQualityCanonical,
    Descriptors,
    CorrectionTrail,
}

#[derive(DeriveIden)]
enum MatchAttempts {
    Table,
    AttemptId,
    RunLabel,
    InputId,
    GazetteerKey,
    Method,
    Score,
    TieRank,
    Features,
}

#[derive(DeriveIden)]
enum MatchResults {
    Table,
    InputId,
    RunLabel,
    Decision,
    GazetteerKey,
    Method,
    Score,
    Reason,
    Ts,
}

#[derive(DeriveIden)]
enum CorrectionNotes {
    Table,
    NoteId,
    InputId,
    Agent,
    BeforeCanonical,
    AfterCanonical,
    Confidence,
    Validation,
    Ts,
}
