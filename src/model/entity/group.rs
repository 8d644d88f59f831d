use crate::impl_paginatable_for;
use crate::model::repo::ResourceTyped;
use crate::model::{
    DatabaseError, ModelManager, NoFilter, ResourceType, error::DatabaseResult,
    repo::CrudRepository,
};
use crate::web::AuthenticatedUser;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct Group {
    id: Uuid,
    name: String,
    members: Vec<Uuid>,
}

#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct GroupCreate {
    pub name: String,
    #[serde(default)]
    pub members: Vec<Uuid>,
}

impl ResourceTyped for Group {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::Group
    }
}

impl Group {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn members(&self) -> &[Uuid] {
        &self.members
    }
}

const SELECT_GROUP: &str = r#"
    SELECT
        g.id,
        g.name,
        COALESCE(
            array_agg(gm.user_id ORDER BY gm.user_id) FILTER (WHERE gm.user_id IS NOT NULL),
            '{}'
        ) AS members
    FROM account_groups g
    LEFT JOIN group_members gm ON gm.group_id = g.id
"#;

/// Every member must be an existing account.
async fn check_members(tx: &mut sqlx::PgConnection, members: &[Uuid]) -> DatabaseResult<()> {
    let known: Vec<Uuid> = sqlx::query_scalar("SELECT id FROM users WHERE id = ANY($1)")
        .bind(members)
        .fetch_all(&mut *tx)
        .await?;

    match members.iter().find(|id| !known.contains(id)) {
        Some(id) => Err(DatabaseError::MissingReference {
            resource_type: ResourceType::User,
            field: "members",
            id: *id,
        }),
        None => Ok(()),
    }
}

async fn name_taken(
    tx: &mut sqlx::PgConnection,
    name: &str,
    except: Option<Uuid>,
) -> DatabaseResult<bool> {
    let taken: bool = sqlx::query_scalar(
        "SELECT EXISTS (SELECT 1 FROM account_groups WHERE name = $1 AND id IS DISTINCT FROM $2)",
    )
    .bind(name)
    .bind(except)
    .fetch_one(&mut *tx)
    .await?;
    Ok(taken)
}

async fn replace_members(
    tx: &mut sqlx::PgConnection,
    group_id: Uuid,
    members: &[Uuid],
) -> DatabaseResult<()> {
    sqlx::query("DELETE FROM group_members WHERE group_id = $1")
        .bind(group_id)
        .execute(&mut *tx)
        .await?;

    sqlx::query(
        "INSERT INTO group_members (group_id, user_id) SELECT $1, UNNEST($2::uuid[]) ON CONFLICT DO NOTHING",
    )
    .bind(group_id)
    .bind(members)
    .execute(&mut *tx)
    .await?;

    Ok(())
}

#[async_trait]
impl CrudRepository<Group, GroupCreate, uuid::Uuid> for Group {
    async fn create(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: GroupCreate,
    ) -> DatabaseResult<Self> {
        let mut tx = mm.executor().begin().await?;
        if name_taken(&mut *tx, &data.name, None).await? {
            return Err(DatabaseError::AlreadyExists(ResourceType::Group));
        }
        check_members(&mut *tx, &data.members).await?;
        let id = Uuid::new_v4();

        sqlx::query("INSERT INTO account_groups (id, name) VALUES ($1, $2)")
            .bind(id)
            .bind(&data.name)
            .execute(&mut *tx)
            .await?;
        replace_members(&mut *tx, id, &data.members).await?;
        tx.commit().await?;

        let mut members = data.members;
        members.sort();
        members.dedup();
        Ok(Group {
            id,
            name: data.name,
            members,
        })
    }

    async fn update(
        mut self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: GroupCreate,
    ) -> DatabaseResult<Self> {
        let mut tx = mm.executor().begin().await?;
        if name_taken(&mut *tx, &data.name, Some(self.id)).await? {
            return Err(DatabaseError::AlreadyExists(ResourceType::Group));
        }
        check_members(&mut *tx, &data.members).await?;

        sqlx::query("UPDATE account_groups SET name = $1 WHERE id = $2")
            .bind(&data.name)
            .bind(self.id)
            .execute(&mut *tx)
            .await?;
        replace_members(&mut *tx, self.id, &data.members).await?;
        tx.commit().await?;

        let mut members = data.members;
        members.sort();
        members.dedup();
        self.name = data.name;
        self.members = members;
        Ok(self)
    }

    async fn delete(self, mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<()> {
        sqlx::query("DELETE FROM account_groups WHERE id = $1")
            .bind(self.id)
            .execute(mm.executor())
            .await?;
        Ok(())
    }

    async fn find_by_id(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        id: uuid::Uuid,
    ) -> DatabaseResult<Option<Self>> {
        let result = sqlx::query_as(&format!("{SELECT_GROUP} WHERE g.id = $1 GROUP BY g.id"))
            .bind(id)
            .fetch_optional(mm.executor())
            .await?;
        Ok(result)
    }

    async fn list(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        _filter: &NoFilter,
        limit: i64,
        offset: i64,
    ) -> DatabaseResult<Vec<Self>> {
        let result = sqlx::query_as(&format!(
            "{SELECT_GROUP} GROUP BY g.id ORDER BY g.name LIMIT $1 OFFSET $2"
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(mm.executor())
        .await?;
        Ok(result)
    }

    async fn count(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        _filter: &NoFilter,
    ) -> DatabaseResult<i64> {
        let result: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM account_groups")
            .fetch_one(mm.executor())
            .await?;

        Ok(result)
    }
}

impl_paginatable_for!(Group, GroupCreate, Uuid);
