//! Initial schema migration - creates all tables from scratch.
//!
//! The complete schema for the poker results service:
//!
//! - `tenants`: one row per table (group), addressed by subdomain label
//! - `players`: tenant-scoped accounts with materialized balances
//! - `games`: settled sessions with derived winner fields
//! - `game_players`: one participation row per seat
//! - `audit_log`: append-only trail of privileged mutations
//! - `potm_history`: player-of-the-month awards, one per tenant-month

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

// ─────────────────────────────────────────────────────────────────────────────
// Table identifiers
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Iden)]
enum Tenants {
    Table,
    Id,
    Name,
    OwnerId,
    CreatedAt,
}

#[derive(Iden)]
enum Players {
    Table,
    Id,
    TenantId,
    Username,
    PasswordHash,
    Balance,
    IsAdmin,
    MustSetPassword,
    AvatarRef,
    PasswordChangedAt,
}

#[derive(Iden)]
enum Games {
    Table,
    Id,
    TenantId,
    Date,
    Buyin,
    Winner,
    Amount,
    Rebuys,
}

#[derive(Iden)]
enum GamePlayers {
    Table,
    Id,
    GameId,
    TenantId,
    Seat,
    Username,
    Buyin,
    Rebuys,
    Cashout,
    Net,
}

#[derive(Iden)]
enum AuditLog {
    Table,
    Id,
    TenantId,
    Actor,
    Action,
    Target,
    Ip,
    Timestamp,
}

#[derive(Iden)]
enum PotmHistory {
    Table,
    TenantId,
    Month,
    Username,
    Score,
}

// ─────────────────────────────────────────────────────────────────────────────
// Migration implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ───────────────────────────────────────────────────────────────────
        // 1. Tenants
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Tenants::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Tenants::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Tenants::Name).string().not_null())
                    .col(ColumnDef::new(Tenants::OwnerId).string())
                    .col(ColumnDef::new(Tenants::CreatedAt).timestamp().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-tenants-name-unique")
                    .table(Tenants::Table)
                    .col(Tenants::Name)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 2. Players
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Players::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Players::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Players::TenantId).string().not_null())
                    .col(ColumnDef::new(Players::Username).string().not_null())
                    .col(ColumnDef::new(Players::PasswordHash).string().not_null())
                    .col(ColumnDef::new(Players::Balance).big_integer().not_null())
                    .col(ColumnDef::new(Players::IsAdmin).boolean().not_null())
                    .col(
                        ColumnDef::new(Players::MustSetPassword)
                            .boolean()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Players::AvatarRef).string())
                    .col(ColumnDef::new(Players::PasswordChangedAt).timestamp())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-players-tenant_id")
                            .from(Players::Table, Players::TenantId)
                            .to(Tenants::Table, Tenants::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-players-tenant_id-username-unique")
                    .table(Players::Table)
                    .col(Players::TenantId)
                    .col(Players::Username)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 3. Games
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Games::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Games::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Games::TenantId).string().not_null())
                    .col(ColumnDef::new(Games::Date).date().not_null())
                    .col(ColumnDef::new(Games::Buyin).big_integer().not_null())
                    .col(ColumnDef::new(Games::Winner).string().not_null())
                    .col(ColumnDef::new(Games::Amount).big_integer().not_null())
                    .col(ColumnDef::new(Games::Rebuys).big_integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-games-tenant_id")
                            .from(Games::Table, Games::TenantId)
                            .to(Tenants::Table, Tenants::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-games-tenant_id-date")
                    .table(Games::Table)
                    .col(Games::TenantId)
                    .col(Games::Date)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 4. Game Players
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(GamePlayers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(GamePlayers::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(GamePlayers::GameId).string().not_null())
                    .col(ColumnDef::new(GamePlayers::TenantId).string().not_null())
                    .col(ColumnDef::new(GamePlayers::Seat).big_integer().not_null())
                    .col(ColumnDef::new(GamePlayers::Username).string().not_null())
                    .col(ColumnDef::new(GamePlayers::Buyin).big_integer().not_null())
                    .col(ColumnDef::new(GamePlayers::Rebuys).big_integer().not_null())
                    .col(
                        ColumnDef::new(GamePlayers::Cashout)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(GamePlayers::Net).big_integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-game_players-game_id")
                            .from(GamePlayers::Table, GamePlayers::GameId)
                            .to(Games::Table, Games::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-game_players-game_id-username-unique")
                    .table(GamePlayers::Table)
                    .col(GamePlayers::GameId)
                    .col(GamePlayers::Username)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-game_players-tenant_id-username")
                    .table(GamePlayers::Table)
                    .col(GamePlayers::TenantId)
                    .col(GamePlayers::Username)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 5. Audit Log
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(AuditLog::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AuditLog::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(AuditLog::TenantId).string().not_null())
                    .col(ColumnDef::new(AuditLog::Actor).string().not_null())
                    .col(ColumnDef::new(AuditLog::Action).string().not_null())
                    .col(ColumnDef::new(AuditLog::Target).string())
                    .col(ColumnDef::new(AuditLog::Ip).string())
                    .col(ColumnDef::new(AuditLog::Timestamp).timestamp().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-audit_log-tenant_id-timestamp")
                    .table(AuditLog::Table)
                    .col(AuditLog::TenantId)
                    .col(AuditLog::Timestamp)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 6. Player of the Month History
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(PotmHistory::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(PotmHistory::TenantId).string().not_null())
                    .col(ColumnDef::new(PotmHistory::Month).string().not_null())
                    .col(ColumnDef::new(PotmHistory::Username).string().not_null())
                    .col(ColumnDef::new(PotmHistory::Score).big_integer().not_null())
                    .primary_key(
                        Index::create()
                            .col(PotmHistory::TenantId)
                            .col(PotmHistory::Month),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Drop in reverse order of creation (respecting FK dependencies)
        manager
            .drop_table(Table::drop().table(PotmHistory::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(AuditLog::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(GamePlayers::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Games::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Players::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Tenants::Table).to_owned())
            .await?;
        Ok(())
    }
}
