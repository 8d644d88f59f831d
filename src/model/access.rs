//! Who may see and touch what.
//!
//! Courses, assessments, results and students are visible only through
//! `course_professors`: a professor sees what hangs off their own courses and
//! nothing else. Anonymous callers see nothing at all.

use uuid::Uuid;

use crate::{
    model::{
        ModelManager, Page, ResourceType,
        error::{DatabaseError, DatabaseResult},
    },
    web::{AuthenticatedUser, RequestContext, UserRole},
};

#[async_trait::async_trait]
pub trait HasOwner {
    type OwnerId: PartialEq + Send + Sync;
    async fn get_owner_ids(
        &self,
        mm: &ModelManager,
        ctx: &AuthenticatedUser,
    ) -> DatabaseResult<Vec<Self::OwnerId>>;
}

pub async fn check_access<T: HasOwner<OwnerId = O>, O: PartialEq + Send + Sync>(
    mm: &ModelManager,
    ctx: &AuthenticatedUser,
    resource: &T,
    expected: O,
) -> DatabaseResult<()> {
    let owners = resource.get_owner_ids(mm, ctx).await?;

    // admin can manage all accounts and groups
    if ctx.user_role() == UserRole::Admin {
        return Ok(());
    }

    if owners.contains(&expected) {
        Ok(())
    } else {
        Err(DatabaseError::Forbidden)
    }
}

/// Lists on behalf of whoever made the request. Without an authenticated user
/// the result is an empty page and `fetch` is never called.
pub async fn scoped_page<T, F, Fut>(
    ctx: &RequestContext,
    limit: i64,
    offset: i64,
    fetch: F,
) -> DatabaseResult<Page<T>>
where
    F: FnOnce(AuthenticatedUser) -> Fut,
    Fut: Future<Output = DatabaseResult<Page<T>>>,
{
    match ctx.maybe_user() {
        Some(user) => fetch(user.clone()).await,
        None => Ok(Page::empty(limit, offset)),
    }
}

/// Fails with `MissingReference` if the course does not exist and with
/// `Forbidden` if `actor` is not one of its professors.
pub async fn require_course_owner(
    mm: &ModelManager,
    actor: &AuthenticatedUser,
    course_id: Uuid,
    field: &'static str,
) -> DatabaseResult<()> {
    let (exists, owned): (bool, bool) = sqlx::query_as(
        r#"
        SELECT
            EXISTS (SELECT 1 FROM courses WHERE id = $1),
            EXISTS (SELECT 1 FROM course_professors WHERE course_id = $1 AND user_id = $2)
        "#,
    )
    .bind(course_id)
    .bind(actor.user_id())
    .fetch_one(mm.executor())
    .await?;

    if !exists {
        return Err(DatabaseError::MissingReference {
            resource_type: ResourceType::Course,
            field,
            id: course_id,
        });
    }

    if !owned {
        return Err(DatabaseError::Forbidden);
    }

    Ok(())
}
