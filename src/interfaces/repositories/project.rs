use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    entities::project::{ProjectInsert, ProjectRecord, ProjectRow},
    errors::{AppError, StoreOperation},
    repositories::sqlx_repo::SqlxProjectRepo,
};

/// Record store for portfolio projects.
///
/// `create_project` assigns the id and sets both timestamps to the same
/// instant. `update_project` refreshes `updated_at` and never touches `id`
/// or `created_at`. Listing is newest-created first.
#[async_trait]
pub trait ProjectRepository: Send + Sync {
    async fn list_projects(&self) -> Result<Vec<ProjectRecord>, AppError>;
    async fn get_project(&self, id: &Uuid) -> Result<ProjectRecord, AppError>;
    async fn create_project(&self, project: &ProjectInsert) -> Result<ProjectRecord, AppError>;
    async fn update_project(&self, project: &ProjectRecord) -> Result<ProjectRecord, AppError>;
    async fn delete_project(&self, id: &Uuid) -> Result<(), AppError>;
    async fn check_connection(&self) -> Result<(), AppError>;
}

#[async_trait]
impl<T: ProjectRepository + ?Sized> ProjectRepository for Arc<T> {
    async fn list_projects(&self) -> Result<Vec<ProjectRecord>, AppError> {
        (**self).list_projects().await
    }

    async fn get_project(&self, id: &Uuid) -> Result<ProjectRecord, AppError> {
        (**self).get_project(id).await
    }

    async fn create_project(&self, project: &ProjectInsert) -> Result<ProjectRecord, AppError> {
        (**self).create_project(project).await
    }

    async fn update_project(&self, project: &ProjectRecord) -> Result<ProjectRecord, AppError> {
        (**self).update_project(project).await
    }

    async fn delete_project(&self, id: &Uuid) -> Result<(), AppError> {
        (**self).delete_project(id).await
    }

    async fn check_connection(&self) -> Result<(), AppError> {
        (**self).check_connection().await
    }
}

impl SqlxProjectRepo {
    pub fn new(pool: PgPool) -> Self {
        SqlxProjectRepo { pool }
    }
}

fn map_sqlx_error(operation: StoreOperation, err: sqlx::Error) -> AppError {
    match err {
        sqlx::Error::RowNotFound => AppError::NotFound("Project not found".into()),
        other => AppError::store(operation, other),
    }
}

#[async_trait]
impl ProjectRepository for SqlxProjectRepo {
    async fn list_projects(&self) -> Result<Vec<ProjectRecord>, AppError> {
        let rows = sqlx::query_as::<_, ProjectRow>(
            r#"SELECT * FROM projects ORDER BY created_at DESC"#
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::store(StoreOperation::List, e))?;

        rows.into_iter().map(ProjectRecord::try_from).collect()
    }

    async fn get_project(&self, id: &Uuid) -> Result<ProjectRecord, AppError> {
        let row = sqlx::query_as::<_, ProjectRow>(
            r#"SELECT * FROM projects WHERE id = $1"#
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx_error(StoreOperation::Get, e))?;

        row.try_into()
    }

    async fn create_project(&self, project: &ProjectInsert) -> Result<ProjectRecord, AppError> {
        let now = Utc::now();

        let row = sqlx::query_as::<_, ProjectRow>(
            r#"
            INSERT INTO projects (
                id, title, description, technologies, date, project_type,
                github_url, demo_url, image_url, gif_url, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $11)
            RETURNING *
            "#
        )
        .bind(Uuid::new_v4())
        .bind(&project.title)
        .bind(&project.description)
        .bind(&project.technologies)
        .bind(project.date)
        .bind(project.project_type.as_str())
        .bind(&project.github_url)
        .bind(&project.demo_url)
        .bind(&project.image_url)
        .bind(&project.gif_url)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::store(StoreOperation::Create, e))?;

        row.try_into()
    }

    async fn update_project(&self, project: &ProjectRecord) -> Result<ProjectRecord, AppError> {
        let row = sqlx::query_as::<_, ProjectRow>(
            r#"
            UPDATE projects SET
                title = $1,
                description = $2,
                technologies = $3,
                date = $4,
                project_type = $5,
                github_url = $6,
                demo_url = $7,
                image_url = $8,
                gif_url = $9,
                updated_at = $10
            WHERE id = $11
            RETURNING *
            "#
        )
        .bind(&project.title)
        .bind(&project.description)
        .bind(&project.technologies)
        .bind(project.date)
        .bind(project.project_type.as_str())
        .bind(&project.github_url)
        .bind(&project.demo_url)
        .bind(&project.image_url)
        .bind(&project.gif_url)
        .bind(Utc::now())
        .bind(project.id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx_error(StoreOperation::Update, e))?;

        row.try_into()
    }

    async fn delete_project(&self, id: &Uuid) -> Result<(), AppError> {
        let result = sqlx::query(r#"DELETE FROM projects WHERE id = $1"#)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::store(StoreOperation::Delete, e))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Project not found".into()));
        }

        Ok(())
    }

    async fn check_connection(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::store(StoreOperation::Ping, e))?;
        Ok(())
    }
}
