//! Staff queries

use ams_core::{Error, Result, StaffStatus};
use anyhow::Context;
use sqlx::{Pool, Sqlite};
use tracing::instrument;

use crate::map_row_error;
use crate::models::{CreateStaff, Staff};

const STAFF_COLUMNS: &str = "id, name, father_name, mother_name, dob, gender, phone, alt_phone, \
     email, marital_status, blood_group, address, role, userid, password_hash, photo, status, \
     login_enabled, created_at";

/// List all staff ordered by name
#[instrument(skip(pool))]
pub async fn list_staff(pool: &Pool<Sqlite>) -> Result<Vec<Staff>> {
    sqlx::query_as::<_, Staff>(&format!(
        "SELECT {} FROM staff ORDER BY name COLLATE NOCASE, id",
        STAFF_COLUMNS
    ))
    .fetch_all(pool)
    .await
    .context("Failed to list staff")
    .map_err(|e| Error::DatabaseError(e.to_string()))
}

/// Get staff member by ID
#[instrument(skip(pool))]
pub async fn get_staff(pool: &Pool<Sqlite>, id: i64) -> Result<Staff> {
    sqlx::query_as::<_, Staff>(&format!("SELECT {} FROM staff WHERE id = ?", STAFF_COLUMNS))
        .bind(id)
        .fetch_one(pool)
        .await
        .map_err(|e| map_row_error(e, "Staff member"))
}

/// Get staff member by login user id
#[instrument(skip(pool))]
pub async fn get_staff_by_userid(pool: &Pool<Sqlite>, userid: &str) -> Result<Staff> {
    sqlx::query_as::<_, Staff>(&format!("SELECT {} FROM staff WHERE userid = ?", STAFF_COLUMNS))
        .bind(userid)
        .fetch_one(pool)
        .await
        .map_err(|e| map_row_error(e, "Staff member"))
}

/// Create a new staff member
#[instrument(skip(pool, input), fields(userid = %input.userid))]
pub async fn create_staff(pool: &Pool<Sqlite>, input: &CreateStaff) -> Result<i64> {
    input.validate().map_err(Error::ValidationError)?;

    let result = sqlx::query(
        r#"
        INSERT INTO staff (name, father_name, mother_name, dob, gender, phone, alt_phone,
                           email, marital_status, blood_group, address, role, userid,
                           password_hash, photo, status, login_enabled)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(input.name.trim())
    .bind(&input.father_name)
    .bind(&input.mother_name)
    .bind(&input.dob)
    .bind(&input.gender)
    .bind(&input.phone)
    .bind(&input.alt_phone)
    .bind(&input.email)
    .bind(&input.marital_status)
    .bind(&input.blood_group)
    .bind(&input.address)
    .bind(&input.role)
    .bind(&input.userid)
    .bind(&input.password_hash)
    .bind(&input.photo)
    .bind(StaffStatus::Active.as_str())
    .bind(input.login_enabled)
    .execute(pool)
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(ref db) if db.is_unique_violation() => {
            Error::ValidationError(format!("User id '{}' is already taken", input.userid))
        }
        other => Error::DatabaseError(format!("Failed to create staff: {}", other)),
    })?;

    Ok(result.last_insert_rowid())
}

async fn update_one(pool: &Pool<Sqlite>, sql: &str, value: impl ToString, id: i64) -> Result<()> {
    let result = sqlx::query(sql)
        .bind(value.to_string())
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to update staff")
        .map_err(|e| Error::DatabaseError(e.to_string()))?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound("Staff member".to_string()));
    }
    Ok(())
}

/// Set the employment status of a staff member
#[instrument(skip(pool))]
pub async fn set_staff_status(pool: &Pool<Sqlite>, id: i64, status: StaffStatus) -> Result<()> {
    update_one(pool, "UPDATE staff SET status = ? WHERE id = ?", status.as_str(), id).await
}

/// Allow or forbid a staff member to log in
#[instrument(skip(pool))]
pub async fn set_staff_login(pool: &Pool<Sqlite>, id: i64, enabled: bool) -> Result<()> {
    let result = sqlx::query("UPDATE staff SET login_enabled = ? WHERE id = ?")
        .bind(enabled)
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to update staff login")
        .map_err(|e| Error::DatabaseError(e.to_string()))?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound("Staff member".to_string()));
    }
    Ok(())
}

/// Replace a staff member's password hash
#[instrument(skip(pool, password_hash))]
pub async fn update_staff_password(pool: &Pool<Sqlite>, id: i64, password_hash: &str) -> Result<()> {
    update_one(pool, "UPDATE staff SET password_hash = ? WHERE id = ?", password_hash, id).await
}

/// Delete a staff member, returning the removed row so the photo can be cleaned up
#[instrument(skip(pool))]
pub async fn delete_staff(pool: &Pool<Sqlite>, id: i64) -> Result<Staff> {
    let staff = get_staff(pool, id).await?;

    sqlx::query("DELETE FROM staff WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete staff")
        .map_err(|e| Error::DatabaseError(e.to_string()))?;

    Ok(staff)
}

/// Count all staff
#[instrument(skip(pool))]
pub async fn count_staff(pool: &Pool<Sqlite>) -> Result<i64> {
    let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM staff")
        .fetch_one(pool)
        .await
        .context("Failed to count staff")
        .map_err(|e| Error::DatabaseError(e.to_string()))?;
    Ok(count.0)
}
