use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use uuid::Uuid;

use crate::{
    entities::project::{ProjectInsert, ProjectRecord},
    errors::AppError,
    repositories::project::ProjectRepository,
};

/// Process-local record store, used when no database is configured.
#[derive(Debug, Default)]
pub struct InMemoryProjectRepo {
    projects: DashMap<Uuid, ProjectRecord>,
}

impl InMemoryProjectRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.projects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }
}

#[async_trait]
impl ProjectRepository for InMemoryProjectRepo {
    async fn list_projects(&self) -> Result<Vec<ProjectRecord>, AppError> {
        let mut projects: Vec<ProjectRecord> = self.projects
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        projects.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(projects)
    }

    async fn get_project(&self, id: &Uuid) -> Result<ProjectRecord, AppError> {
        self.projects
            .get(id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| AppError::NotFound("Project not found".into()))
    }

    async fn create_project(&self, project: &ProjectInsert) -> Result<ProjectRecord, AppError> {
        let record = ProjectRecord::from_insert(Uuid::new_v4(), project, Utc::now());
        self.projects.insert(record.id, record.clone());
        Ok(record)
    }

    async fn update_project(&self, project: &ProjectRecord) -> Result<ProjectRecord, AppError> {
        let mut entry = self.projects
            .get_mut(&project.id)
            .ok_or_else(|| AppError::NotFound("Project not found".into()))?;

        let stored = entry.value_mut();
        *stored = ProjectRecord {
            id: stored.id,
            created_at: stored.created_at,
            updated_at: Utc::now(),
            ..project.clone()
        };

        Ok(stored.clone())
    }

    async fn delete_project(&self, id: &Uuid) -> Result<(), AppError> {
        self.projects
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound("Project not found".into()))
    }

    async fn check_connection(&self) -> Result<(), AppError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::entities::project::ProjectType;

    fn insert(title: &str) -> ProjectInsert {
        ProjectInsert {
            title: title.into(),
            description: "A project".into(),
            technologies: vec!["Rust".into()],
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            project_type: ProjectType::Desktop,
            github_url: None,
            demo_url: None,
            image_url: None,
            gif_url: None,
        }
    }

    #[tokio::test]
    async fn create_sets_equal_timestamps() {
        let repo = InMemoryProjectRepo::new();

        let record = repo.create_project(&insert("One")).await.unwrap();

        assert_eq!(record.created_at, record.updated_at);
        assert_eq!(repo.get_project(&record.id).await.unwrap(), record);
    }

    #[tokio::test]
    async fn update_preserves_identity_and_creation_time() {
        let repo = InMemoryProjectRepo::new();
        let created = repo.create_project(&insert("One")).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;

        let mut edited = created.clone();
        edited.title = "Renamed".into();
        edited.created_at = Utc::now();
        let updated = repo.update_project(&edited).await.unwrap();

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.created_at, created.created_at);
        assert!(updated.updated_at > created.updated_at);
        assert_eq!(updated.title, "Renamed");
    }

    #[tokio::test]
    async fn lists_newest_first() {
        let repo = InMemoryProjectRepo::new();
        repo.create_project(&insert("Old")).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        repo.create_project(&insert("New")).await.unwrap();

        let titles: Vec<String> = repo.list_projects().await.unwrap()
            .into_iter()
            .map(|p| p.title)
            .collect();

        assert_eq!(titles, vec!["New", "Old"]);
    }

    #[tokio::test]
    async fn unknown_ids_report_not_found() {
        let repo = InMemoryProjectRepo::new();
        let kept = repo.create_project(&insert("Kept")).await.unwrap();
        let mut ghost = kept.clone();
        ghost.id = Uuid::new_v4();

        assert!(matches!(repo.delete_project(&ghost.id).await, Err(AppError::NotFound(_))));
        assert!(matches!(repo.update_project(&ghost).await, Err(AppError::NotFound(_))));
        assert_eq!(repo.list_projects().await.unwrap(), vec![kept]);
    }
}
