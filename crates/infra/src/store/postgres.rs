//! Postgres-backed access-control store.
//!
//! One type implements every store port over a shared connection pool.
//! Multi-row changes (deactivation, cascade deletes) run inside a single
//! transaction, so a crash can never leave a deactivated user with live
//! credentials or a deleted node with dangling grants.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | Result |
//! |------------|----------------------|--------|
//! | Database (unique violation) | `23505` | `DomainError::Conflict` on admin writes, `StoreError::Backend` elsewhere |
//! | Database (foreign key violation) | `23503` | `DomainError::Validation` on admin writes, `StoreError::Backend` elsewhere |
//! | Database (check violation) | `23514` | `DomainError::Validation` on admin writes, `StoreError::Backend` elsewhere |
//! | Database (other) | any | `StoreError::Backend` |
//! | PoolClosed / PoolTimedOut / Io / Tls | N/A | `StoreError::Unavailable` |
//! | Decode / ColumnDecode / ColumnNotFound | N/A | `StoreError::Corrupt` |

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sqlx::{PgPool, Postgres, Row, Transaction};
use tracing::{Span, instrument};
use uuid::Uuid;

use coursedesk_auth::{
    AccountStatus, AdminError, AdminStore, Credential, CredentialStore, Grant, GrantFlags,
    GrantStore, IssuedCredential, PermissionGroup, ResourceNode, ResourceStore, StoreError,
    StoreResult, UrlPath, UserAccount, UserStore,
};
use coursedesk_core::{CredentialId, DomainError, GroupId, ResourceNodeId, UserId};

const SCHEMA: &str = include_str!("../../migrations/0001_access_control.sql");

/// Postgres implementation of every access-control store port.
#[derive(Debug, Clone)]
pub struct PostgresAccessStore {
    pool: Arc<PgPool>,
}

impl PostgresAccessStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Apply the bundled schema. Idempotent.
    #[instrument(skip(self), err)]
    pub async fn migrate(&self) -> StoreResult<()> {
        sqlx::raw_sql(SCHEMA)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("migrate", e))?;
        Ok(())
    }

    async fn begin(&self) -> StoreResult<Transaction<'static, Postgres>> {
        self.pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))
    }
}

async fn commit(tx: Transaction<'_, Postgres>) -> StoreResult<()> {
    tx.commit()
        .await
        .map_err(|e| map_sqlx_error("commit_transaction", e))
}

async fn rollback(tx: Transaction<'_, Postgres>) -> StoreResult<()> {
    tx.rollback()
        .await
        .map_err(|e| map_sqlx_error("rollback", e))
}

#[async_trait]
impl ResourceStore for PostgresAccessStore {
    #[instrument(skip(self), fields(url_path = %path), err)]
    async fn node_by_path(&self, path: &UrlPath) -> StoreResult<Option<ResourceNode>> {
        let row = sqlx::query(
            r#"
            SELECT id, url_path, parent_id, label, icon, position
            FROM resource_nodes
            WHERE url_path = $1
            "#,
        )
        .bind(path.as_str())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("node_by_path", e))?;

        row.map(|r| ResourceNodeRow::decode(&r).and_then(ResourceNode::try_from))
            .transpose()
    }

    #[instrument(skip(self), err)]
    async fn node(&self, id: ResourceNodeId) -> StoreResult<Option<ResourceNode>> {
        let row = sqlx::query(
            r#"
            SELECT id, url_path, parent_id, label, icon, position
            FROM resource_nodes
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("node", e))?;

        row.map(|r| ResourceNodeRow::decode(&r).and_then(ResourceNode::try_from))
            .transpose()
    }

    #[instrument(skip(self), fields(node_count = tracing::field::Empty), err)]
    async fn all_nodes(&self) -> StoreResult<Vec<ResourceNode>> {
        let rows = sqlx::query(
            r#"
            SELECT id, url_path, parent_id, label, icon, position
            FROM resource_nodes
            ORDER BY position ASC, label ASC
            "#,
        )
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("all_nodes", e))?;

        let nodes = rows
            .iter()
            .map(|r| ResourceNodeRow::decode(r).and_then(ResourceNode::try_from))
            .collect::<StoreResult<Vec<ResourceNode>>>()?;
        Span::current().record("node_count", nodes.len());
        Ok(nodes)
    }
}

#[async_trait]
impl GrantStore for PostgresAccessStore {
    #[instrument(skip(self), err)]
    async fn grant(&self, resource: ResourceNodeId, group: GroupId) -> StoreResult<Option<GrantFlags>> {
        let row = sqlx::query(
            r#"
            SELECT resource_id, group_id, can_view, can_create, can_edit, can_delete, can_upload
            FROM resource_grants
            WHERE resource_id = $1 AND group_id = $2
            "#,
        )
        .bind(resource.as_uuid())
        .bind(group.as_uuid())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("grant", e))?;

        Ok(row
            .map(|r| GrantRow::decode(&r))
            .transpose()?
            .map(|g| Grant::from(g).flags))
    }

    #[instrument(skip(self), err)]
    async fn grants_for_group(&self, group: GroupId) -> StoreResult<Vec<Grant>> {
        let rows = sqlx::query(
            r#"
            SELECT resource_id, group_id, can_view, can_create, can_edit, can_delete, can_upload
            FROM resource_grants
            WHERE group_id = $1
            "#,
        )
        .bind(group.as_uuid())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("grants_for_group", e))?;

        rows.iter()
            .map(|r| GrantRow::decode(r).map(Grant::from))
            .collect()
    }

    #[instrument(
        skip(self, grant),
        fields(resource_id = %grant.resource_id, group_id = %grant.group_id),
        err
    )]
    async fn upsert_grant(&self, grant: Grant) -> StoreResult<()> {
        let f = grant.flags;
        sqlx::query(
            r#"
            INSERT INTO resource_grants (
                resource_id, group_id, can_view, can_create, can_edit, can_delete, can_upload
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (resource_id, group_id)
            DO UPDATE SET
                can_view = EXCLUDED.can_view,
                can_create = EXCLUDED.can_create,
                can_edit = EXCLUDED.can_edit,
                can_delete = EXCLUDED.can_delete,
                can_upload = EXCLUDED.can_upload,
                updated_at = NOW()
            "#,
        )
        .bind(grant.resource_id.as_uuid())
        .bind(grant.group_id.as_uuid())
        .bind(f.view)
        .bind(f.create)
        .bind(f.edit)
        .bind(f.delete)
        .bind(f.upload)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("upsert_grant", e))?;
        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn delete_grant(&self, resource: ResourceNodeId, group: GroupId) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM resource_grants WHERE resource_id = $1 AND group_id = $2")
            .bind(resource.as_uuid())
            .bind(group.as_uuid())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_grant", e))?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl UserStore for PostgresAccessStore {
    #[instrument(skip(self), err)]
    async fn user(&self, id: UserId) -> StoreResult<Option<UserAccount>> {
        let row = sqlx::query(
            r#"
            SELECT id, display_name, permission_group_id, status, legacy_active
            FROM user_accounts
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("user", e))?;

        Ok(row.map(|r| UserRow::decode(&r)).transpose()?.map(Into::into))
    }

    #[instrument(skip(self), err)]
    async fn group(&self, id: GroupId) -> StoreResult<Option<PermissionGroup>> {
        let row = sqlx::query("SELECT id, name, active FROM permission_groups WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("group", e))?;

        Ok(row.map(|r| GroupRow::decode(&r)).transpose()?.map(Into::into))
    }

    #[instrument(skip(self), fields(revoked = tracing::field::Empty), err)]
    async fn set_user_active(&self, id: UserId, active: bool) -> StoreResult<Option<u64>> {
        let status = if active {
            AccountStatus::Active
        } else {
            AccountStatus::Inactive
        };

        let mut tx = self.begin().await?;

        let updated = sqlx::query(
            "UPDATE user_accounts SET status = $2, legacy_active = $3 WHERE id = $1",
        )
        .bind(id.as_uuid())
        .bind(status.as_str())
        .bind(active)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("set_user_active", e))?;

        if updated.rows_affected() == 0 {
            rollback(tx).await?;
            return Ok(None);
        }

        let revoked = if active {
            0
        } else {
            revoke_live(&mut tx, id).await?
        };

        commit(tx).await?;
        Span::current().record("revoked", revoked);
        Ok(Some(revoked))
    }
}

async fn revoke_live(tx: &mut Transaction<'_, Postgres>, user: UserId) -> StoreResult<u64> {
    let result = sqlx::query(
        r#"
        UPDATE session_credentials
        SET revoked_at = NOW()
        WHERE user_id = $1 AND revoked_at IS NULL
        "#,
    )
    .bind(user.as_uuid())
    .execute(&mut **tx)
    .await
    .map_err(|e| map_sqlx_error("revoke_live", e))?;
    Ok(result.rows_affected())
}

#[async_trait]
impl CredentialStore for PostgresAccessStore {
    #[instrument(skip(self), err)]
    async fn credential(&self, id: CredentialId) -> StoreResult<Option<Credential>> {
        let row = sqlx::query(
            r#"
            SELECT id, user_id, issued_at, expires_at, revoked_at
            FROM session_credentials
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("credential", e))?;

        Ok(row.map(|r| CredentialRow::decode(&r)).transpose()?.map(Into::into))
    }

    #[instrument(skip_all, err)]
    async fn credential_by_token(&self, token: &str) -> StoreResult<Option<Credential>> {
        let row = sqlx::query(
            r#"
            SELECT id, user_id, issued_at, expires_at, revoked_at
            FROM session_credentials
            WHERE token = $1
            "#,
        )
        .bind(token)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("credential_by_token", e))?;

        Ok(row.map(|r| CredentialRow::decode(&r)).transpose()?.map(Into::into))
    }

    #[instrument(skip(self), err)]
    async fn issue(&self, user: UserId, ttl: Duration) -> StoreResult<IssuedCredential> {
        let now = Utc::now();
        let credential = Credential {
            id: CredentialId::new(),
            user_id: user,
            issued_at: now,
            expires_at: now + ttl,
            revoked_at: None,
        };
        let token = super::new_token();

        sqlx::query(
            r#"
            INSERT INTO session_credentials (id, user_id, token, issued_at, expires_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(credential.id.as_uuid())
        .bind(user.as_uuid())
        .bind(&token)
        .bind(credential.issued_at)
        .bind(credential.expires_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("issue", e))?;

        Ok(IssuedCredential { credential, token })
    }

    #[instrument(skip(self), err)]
    async fn revoke(&self, id: CredentialId) -> StoreResult<bool> {
        let result = sqlx::query(
            "UPDATE session_credentials SET revoked_at = NOW() WHERE id = $1 AND revoked_at IS NULL",
        )
        .bind(id.as_uuid())
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("revoke", e))?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self), err)]
    async fn revoke_all(&self, user: UserId) -> StoreResult<u64> {
        let mut tx = self.begin().await?;
        let revoked = revoke_live(&mut tx, user).await?;
        commit(tx).await?;
        Ok(revoked)
    }
}

#[async_trait]
impl AdminStore for PostgresAccessStore {
    #[instrument(skip(self, node), fields(resource_id = %node.id, url_path = %node.url_path), err)]
    async fn insert_resource(&self, node: ResourceNode) -> Result<(), AdminError> {
        sqlx::query(
            r#"
            INSERT INTO resource_nodes (id, url_path, parent_id, label, icon, position)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(node.id.as_uuid())
        .bind(node.url_path.as_str())
        .bind(node.parent_id.map(Uuid::from))
        .bind(&node.label)
        .bind(node.icon.as_deref())
        .bind(node.position)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_admin_error("insert_resource", e))?;
        Ok(())
    }

    #[instrument(skip(self, group), fields(group_id = %group.id), err)]
    async fn insert_group(&self, group: PermissionGroup) -> Result<(), AdminError> {
        sqlx::query("INSERT INTO permission_groups (id, name, active) VALUES ($1, $2, $3)")
            .bind(group.id.as_uuid())
            .bind(group.name.as_str())
            .bind(group.active)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_admin_error("insert_group", e))?;
        Ok(())
    }

    #[instrument(skip(self, user), fields(user_id = %user.id), err)]
    async fn insert_user(&self, user: UserAccount) -> Result<(), AdminError> {
        sqlx::query(
            r#"
            INSERT INTO user_accounts (id, display_name, permission_group_id, status, legacy_active)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(user.id.as_uuid())
        .bind(&user.display_name)
        .bind(user.permission_group_id.map(Uuid::from))
        .bind(user.status.as_str())
        .bind(user.legacy_active)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_admin_error("insert_user", e))?;
        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn delete_resource(&self, id: ResourceNodeId) -> Result<u64, AdminError> {
        let mut tx = self.begin().await?;

        let exists = sqlx::query("SELECT id FROM resource_nodes WHERE id = $1 FOR UPDATE")
            .bind(id.as_uuid())
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("lock_resource", e))?;
        if exists.is_none() {
            rollback(tx).await?;
            return Err(DomainError::not_found("resource node").into());
        }

        let children: i64 = sqlx::query("SELECT COUNT(*) AS n FROM resource_nodes WHERE parent_id = $1")
            .bind(id.as_uuid())
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("count_children", e))?
            .try_get("n")
            .map_err(|e| map_sqlx_error("count_children", e))?;
        if children > 0 {
            rollback(tx).await?;
            return Err(DomainError::invariant("resource node still has children").into());
        }

        let dropped = sqlx::query("DELETE FROM resource_grants WHERE resource_id = $1")
            .bind(id.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("delete_resource_grants", e))?
            .rows_affected();

        sqlx::query("DELETE FROM resource_nodes WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_admin_error("delete_resource", e))?;

        commit(tx).await?;
        Ok(dropped)
    }

    #[instrument(skip(self), err)]
    async fn delete_group(&self, id: GroupId) -> Result<u64, AdminError> {
        let mut tx = self.begin().await?;

        let exists = sqlx::query("SELECT id FROM permission_groups WHERE id = $1 FOR UPDATE")
            .bind(id.as_uuid())
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("lock_group", e))?;
        if exists.is_none() {
            rollback(tx).await?;
            return Err(DomainError::not_found("permission group").into());
        }

        let members: i64 =
            sqlx::query("SELECT COUNT(*) AS n FROM user_accounts WHERE permission_group_id = $1")
                .bind(id.as_uuid())
                .fetch_one(&mut *tx)
                .await
                .map_err(|e| map_sqlx_error("count_members", e))?
                .try_get("n")
                .map_err(|e| map_sqlx_error("count_members", e))?;
        if members > 0 {
            rollback(tx).await?;
            return Err(DomainError::invariant("permission group is still assigned to users").into());
        }

        let dropped = sqlx::query("DELETE FROM resource_grants WHERE group_id = $1")
            .bind(id.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("delete_group_grants", e))?
            .rows_affected();

        sqlx::query("DELETE FROM permission_groups WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_admin_error("delete_group", e))?;

        commit(tx).await?;
        Ok(dropped)
    }
}

fn pg_code(err: &sqlx::Error) -> Option<String> {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().map(|c| c.into_owned()),
        _ => None,
    }
}

/// Map SQLx errors to StoreError.
fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            StoreError::Backend(format!("database error in {}: {}", operation, db_err.message()))
        }
        sqlx::Error::PoolClosed => {
            StoreError::Unavailable(format!("connection pool closed in {}", operation))
        }
        sqlx::Error::PoolTimedOut => {
            StoreError::Unavailable(format!("connection pool timed out in {}", operation))
        }
        sqlx::Error::Io(e) => StoreError::Unavailable(format!("io error in {}: {}", operation, e)),
        sqlx::Error::Tls(e) => StoreError::Unavailable(format!("tls error in {}: {}", operation, e)),
        sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::ColumnNotFound(_)
        | sqlx::Error::Decode(_) => StoreError::Corrupt(format!("undecodable row in {}: {}", operation, err)),
        _ => StoreError::Backend(format!("sqlx error in {}: {}", operation, err)),
    }
}

/// Admin writes surface constraint violations as domain errors.
fn map_admin_error(operation: &str, err: sqlx::Error) -> AdminError {
    match pg_code(&err).as_deref() {
        Some("23505") => DomainError::conflict(format!("{operation}: record already exists")).into(),
        Some("23503") => DomainError::validation(format!("{operation}: referenced record missing or still in use")).into(),
        Some("23514") => DomainError::validation(format!("{operation}: check constraint failed")).into(),
        _ => map_sqlx_error(operation, err).into(),
    }
}

// SQLx row types

#[derive(Debug)]
struct ResourceNodeRow {
    id: Uuid,
    url_path: String,
    parent_id: Option<Uuid>,
    label: String,
    icon: Option<String>,
    position: i32,
}

impl<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow> for ResourceNodeRow {
    fn from_row(row: &'r sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        Ok(ResourceNodeRow {
            id: row.try_get("id")?,
            url_path: row.try_get("url_path")?,
            parent_id: row.try_get("parent_id")?,
            label: row.try_get("label")?,
            icon: row.try_get("icon")?,
            position: row.try_get("position")?,
        })
    }
}

impl TryFrom<ResourceNodeRow> for ResourceNode {
    type Error = StoreError;

    fn try_from(row: ResourceNodeRow) -> Result<Self, Self::Error> {
        let url_path = UrlPath::new(&row.url_path)
            .map_err(|e| StoreError::Corrupt(format!("resource node {}: {}", row.id, e)))?;
        Ok(ResourceNode {
            id: ResourceNodeId::from_uuid(row.id),
            url_path,
            parent_id: row.parent_id.map(ResourceNodeId::from_uuid),
            label: row.label,
            icon: row.icon,
            position: row.position,
        })
    }
}

#[derive(Debug)]
struct GrantRow {
    resource_id: Uuid,
    group_id: Uuid,
    can_view: bool,
    can_create: bool,
    can_edit: bool,
    can_delete: bool,
    can_upload: bool,
}

impl<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow> for GrantRow {
    fn from_row(row: &'r sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        Ok(GrantRow {
            resource_id: row.try_get("resource_id")?,
            group_id: row.try_get("group_id")?,
            can_view: row.try_get("can_view")?,
            can_create: row.try_get("can_create")?,
            can_edit: row.try_get("can_edit")?,
            can_delete: row.try_get("can_delete")?,
            can_upload: row.try_get("can_upload")?,
        })
    }
}

impl From<GrantRow> for Grant {
    fn from(row: GrantRow) -> Self {
        Grant {
            resource_id: ResourceNodeId::from_uuid(row.resource_id),
            group_id: GroupId::from_uuid(row.group_id),
            flags: GrantFlags {
                view: row.can_view,
                create: row.can_create,
                edit: row.can_edit,
                delete: row.can_delete,
                upload: row.can_upload,
            },
        }
    }
}

#[derive(Debug)]
struct UserRow {
    id: Uuid,
    display_name: String,
    permission_group_id: Option<Uuid>,
    status: String,
    legacy_active: bool,
}

impl<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow> for UserRow {
    fn from_row(row: &'r sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        Ok(UserRow {
            id: row.try_get("id")?,
            display_name: row.try_get("display_name")?,
            permission_group_id: row.try_get("permission_group_id")?,
            status: row.try_get("status")?,
            legacy_active: row.try_get("legacy_active")?,
        })
    }
}

impl From<UserRow> for UserAccount {
    fn from(row: UserRow) -> Self {
        UserAccount {
            id: UserId::from_uuid(row.id),
            display_name: row.display_name,
            permission_group_id: row.permission_group_id.map(GroupId::from_uuid),
            status: AccountStatus::from(row.status),
            legacy_active: row.legacy_active,
        }
    }
}

#[derive(Debug)]
struct GroupRow {
    id: Uuid,
    name: String,
    active: bool,
}

impl<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow> for GroupRow {
    fn from_row(row: &'r sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        Ok(GroupRow {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            active: row.try_get("active")?,
        })
    }
}

impl From<GroupRow> for PermissionGroup {
    fn from(row: GroupRow) -> Self {
        let mut group = PermissionGroup::new(GroupId::from_uuid(row.id), row.name);
        group.active = row.active;
        group
    }
}

#[derive(Debug)]
struct CredentialRow {
    id: Uuid,
    user_id: Uuid,
    issued_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    revoked_at: Option<DateTime<Utc>>,
}

impl<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow> for CredentialRow {
    fn from_row(row: &'r sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        Ok(CredentialRow {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            issued_at: row.try_get("issued_at")?,
            expires_at: row.try_get("expires_at")?,
            revoked_at: row.try_get("revoked_at")?,
        })
    }
}

impl From<CredentialRow> for Credential {
    fn from(row: CredentialRow) -> Self {
        Credential {
            id: CredentialId::from_uuid(row.id),
            user_id: UserId::from_uuid(row.user_id),
            issued_at: row.issued_at,
            expires_at: row.expires_at,
            revoked_at: row.revoked_at,
        }
    }
}

/// Decode a row, reporting shape mismatches as corrupt records.
trait DecodeRow: Sized {
    fn decode(row: &sqlx::postgres::PgRow) -> StoreResult<Self>;
}

impl<T> DecodeRow for T
where
    T: for<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow>,
{
    fn decode(row: &sqlx::postgres::PgRow) -> StoreResult<Self> {
        T::from_row(row).map_err(|e| StoreError::Corrupt(format!("failed to decode row: {}", e)))
    }
}
