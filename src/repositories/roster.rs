use sqlx::PgPool;

use crate::db::models::RosterStudent;

const COLUMNS: &str = "id, name, email, status, created_at";

pub(crate) struct CreateRosterStudent<'a> {
    pub(crate) id: &'a str,
    pub(crate) name: &'a str,
    pub(crate) email: &'a str,
    pub(crate) status: &'a str,
    pub(crate) now: time::PrimitiveDateTime,
}

#[derive(Default)]
pub(crate) struct UpdateRosterStudent<'a> {
    pub(crate) name: Option<&'a str>,
    pub(crate) email: Option<&'a str>,
    pub(crate) status: Option<&'a str>,
}

pub(crate) async fn create(
    pool: &PgPool,
    student: CreateRosterStudent<'_>,
) -> Result<RosterStudent, sqlx::Error> {
    sqlx::query_as::<_, RosterStudent>(&format!(
        "INSERT INTO roster_students (id, name, email, status, created_at)
         VALUES ($1,$2,$3,$4,$5)
         RETURNING {COLUMNS}"
    ))
    .bind(student.id)
    .bind(student.name)
    .bind(student.email)
    .bind(student.status)
    .bind(student.now)
    .fetch_one(pool)
    .await
}

pub(crate) async fn list(pool: &PgPool) -> Result<Vec<RosterStudent>, sqlx::Error> {
    sqlx::query_as::<_, RosterStudent>(&format!(
        "SELECT {COLUMNS} FROM roster_students ORDER BY created_at, id"
    ))
    .fetch_all(pool)
    .await
}

/// Applies the provided fields; `None` when the student does not exist.
pub(crate) async fn update(
    pool: &PgPool,
    id: &str,
    changes: UpdateRosterStudent<'_>,
) -> Result<Option<RosterStudent>, sqlx::Error> {
    sqlx::query_as::<_, RosterStudent>(&format!(
        "UPDATE roster_students
         SET name = COALESCE($1, name),
             email = COALESCE($2, email),
             status = COALESCE($3, status)
         WHERE id = $4
         RETURNING {COLUMNS}"
    ))
    .bind(changes.name)
    .bind(changes.email)
    .bind(changes.status)
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn delete(pool: &PgPool, id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM roster_students WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Whether another roster entry already uses `email`.
pub(crate) async fn email_taken(
    pool: &PgPool,
    email: &str,
    except_id: Option<&str>,
) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT EXISTS(
            SELECT 1 FROM roster_students
            WHERE lower(email) = lower($1) AND ($2::VARCHAR IS NULL OR id <> $2)
        )",
    )
    .bind(email)
    .bind(except_id)
    .fetch_one(pool)
    .await
}
