use crate::{
    entities::{
        project::{GalleryCard, ProjectForm, ProjectRecord, ProjectType},
        upload::{StoredUpload, UploadedFile},
    },
    errors::AppError,
    media::{resolve_on_save, MediaFields},
    repositories::project::ProjectRepository,
    storage::{storage_file_name, FileStorage},
    utils::valid_uuid::valid_uuid,
};

pub struct ProjectHandler<R, S>
where
    R: ProjectRepository,
    S: FileStorage,
{
    pub project_repo: R,
    pub storage: S,
}

impl<R, S> ProjectHandler<R, S>
where
    R: ProjectRepository,
    S: FileStorage,
{
    pub fn new(project_repo: R, storage: S) -> Self {
        ProjectHandler { project_repo, storage }
    }

    /// Lists projects newest first, optionally restricted to one type
    pub async fn list_projects(&self, filter: Option<ProjectType>) -> Result<Vec<ProjectRecord>, AppError> {
        let projects = self.project_repo.list_projects().await?;

        Ok(match filter {
            Some(project_type) => projects
                .into_iter()
                .filter(|p| p.project_type == project_type)
                .collect(),
            None => projects,
        })
    }

    /// Builds the public gallery cards
    pub async fn gallery(&self, filter: Option<ProjectType>) -> Result<Vec<GalleryCard>, AppError> {
        let projects = self.list_projects(filter).await?;
        Ok(projects.iter().map(ProjectRecord::to_gallery_card).collect())
    }

    pub async fn get_project(&self, id: &str) -> Result<ProjectRecord, AppError> {
        let valid_id = valid_uuid(id)?;
        self.project_repo.get_project(&valid_id).await
    }

    /// Pre-filled admin form for an existing project
    pub async fn edit_form(&self, id: &str) -> Result<ProjectForm, AppError> {
        let project = self.get_project(id).await?;
        Ok(ProjectForm::from_record(&project))
    }

    /// Creates a project from the admin form, storing the attached file first
    pub async fn create_project(
        &self,
        form: ProjectForm,
        upload: Option<UploadedFile>,
    ) -> Result<ProjectRecord, AppError> {
        let form = form.normalized();
        // Date problems are reported before anything is uploaded.
        form.prepare_for_insert(form.media())?;

        let media = self.resolve_media(form.media(), upload).await?;
        let insert = form.prepare_for_insert(media)?;

        let project = self.project_repo.create_project(&insert).await?;
        tracing::info!(id = %project.id, title = %project.title, "project created");

        Ok(project)
    }

    /// Replaces the editable fields of an existing project
    pub async fn update_project(
        &self,
        id: &str,
        form: ProjectForm,
        upload: Option<UploadedFile>,
    ) -> Result<ProjectRecord, AppError> {
        let valid_id = valid_uuid(id)?;
        let form = form.normalized();
        form.prepare_for_insert(form.media())?;

        let current = self.project_repo.get_project(&valid_id).await?;

        let media = self.resolve_media(form.media(), upload).await?;
        let insert = form.prepare_for_insert(media)?;

        let project = self.project_repo
            .update_project(&current.with_changes(insert))
            .await?;
        tracing::info!(id = %project.id, "project updated");

        Ok(project)
    }

    /// Deletes a project by its ID
    pub async fn delete_project(&self, id: &str) -> Result<(), AppError> {
        let valid_id = valid_uuid(id)?;

        self.project_repo
            .delete_project(&valid_id)
            .await
            .map_err(|e| match e {
                AppError::NotFound(_) => AppError::NotFound(format!("Project {} not found", valid_id)),
                _ => e,
            })?;

        tracing::info!(id = %valid_id, "project deleted");
        Ok(())
    }

    async fn resolve_media(
        &self,
        current: MediaFields,
        upload: Option<UploadedFile>,
    ) -> Result<MediaFields, AppError> {
        let stored = match upload {
            Some(file) => Some(self.store_upload(file).await?),
            None => None,
        };

        Ok(resolve_on_save(current, stored.as_ref()))
    }

    async fn store_upload(&self, file: UploadedFile) -> Result<StoredUpload, AppError> {
        let file_name = storage_file_name(&file.file_name);

        let storage_path = self.storage
            .upload(&file.bytes, &file_name, &file.mime_type)
            .await?;
        let public_url = self.storage.public_url(&storage_path);

        tracing::debug!(%storage_path, %public_url, mime_type = %file.mime_type, "upload stored");

        Ok(StoredUpload {
            public_url,
            mime_type: file.mime_type,
        })
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use mockall::mock;
    use uuid::Uuid;

    use super::*;
    use crate::repositories::in_memory::InMemoryProjectRepo;

    mock! {
        pub Storage {}

        #[async_trait]
        impl FileStorage for Storage {
            async fn upload(&self, bytes: &[u8], file_name: &str, content_type: &str) -> Result<String, AppError>;
            fn public_url(&self, storage_path: &str) -> String;
        }
    }

    fn form(display_date: &str) -> ProjectForm {
        ProjectForm {
            title: "Portfolio".into(),
            description: "Personal site".into(),
            technologies: vec!["React".into(), " ".into()],
            display_date: display_date.into(),
            project_type: ProjectType::Web,
            ..Default::default()
        }
    }

    fn storage_returning(url: &'static str) -> MockStorage {
        let mut storage = MockStorage::new();
        storage
            .expect_upload()
            .times(1)
            .returning(|_, name, _| Ok(format!("projects/{}", name)));
        storage
            .expect_public_url()
            .times(1)
            .returning(move |_| url.to_string());
        storage
    }

    #[tokio::test]
    async fn video_upload_becomes_gif_url() {
        let handler = ProjectHandler::new(
            InMemoryProjectRepo::new(),
            storage_returning("https://cdn.example.com/demo.mp4"),
        );
        let file = UploadedFile::new(vec![0, 0, 0, 24], "demo.mp4", "video/mp4");

        let project = handler.create_project(form("Janvier 2024"), Some(file)).await.unwrap();

        assert_eq!(project.gif_url.as_deref(), Some("https://cdn.example.com/demo.mp4"));
        assert_eq!(project.image_url, None);
        assert_eq!(project.technologies, vec!["React"]);
        assert_eq!(project.date.to_string(), "2024-01-01");
    }

    #[tokio::test]
    async fn png_upload_becomes_image_url() {
        let handler = ProjectHandler::new(
            InMemoryProjectRepo::new(),
            storage_returning("https://cdn.example.com/shot.png"),
        );
        let file = UploadedFile::new(vec![0x89, b'P', b'N', b'G'], "shot.png", "image/png");

        let project = handler.create_project(form("Mai 2022"), Some(file)).await.unwrap();

        assert_eq!(project.image_url.as_deref(), Some("https://cdn.example.com/shot.png"));
        assert_eq!(project.gif_url, None);
    }

    #[tokio::test]
    async fn upload_uses_generated_name_with_extension() {
        let mut storage = MockStorage::new();
        storage
            .expect_upload()
            .withf(|_, name, content_type| {
                name.ends_with(".gif") && name != "demo.gif" && content_type == "image/gif"
            })
            .times(1)
            .returning(|_, name, _| Ok(name.to_string()));
        storage
            .expect_public_url()
            .returning(|path| format!("https://cdn.example.com/{}", path));
        let handler = ProjectHandler::new(InMemoryProjectRepo::new(), storage);

        let file = UploadedFile::new(b"GIF89a".to_vec(), "demo.gif", "image/gif");
        let project = handler.create_project(form("Mai 2022"), Some(file)).await.unwrap();

        assert!(project.gif_url.unwrap().ends_with(".gif"));
    }

    #[tokio::test]
    async fn unsupported_upload_is_stored_but_ignored() {
        let handler = ProjectHandler::new(
            InMemoryProjectRepo::new(),
            storage_returning("https://cdn.example.com/notes.pdf"),
        );
        let mut draft = form("Juin 2021");
        draft.image_url = Some("https://example.com/typed.png".into());
        let file = UploadedFile::new(b"%PDF".to_vec(), "notes.pdf", "application/pdf");

        let project = handler.create_project(draft, Some(file)).await.unwrap();

        assert_eq!(project.image_url.as_deref(), Some("https://example.com/typed.png"));
        assert_eq!(project.gif_url, None);
    }

    #[tokio::test]
    async fn upload_failure_surfaces_and_nothing_is_saved() {
        let mut storage = MockStorage::new();
        storage
            .expect_upload()
            .times(1)
            .returning(|_, _, _| Err(AppError::upload("bucket not found")));
        storage.expect_public_url().never();
        let repo = InMemoryProjectRepo::new();
        let handler = ProjectHandler::new(repo, storage);

        let file = UploadedFile::new(vec![1, 2, 3], "shot.png", "image/png");
        let err = handler.create_project(form("Mai 2022"), Some(file)).await.unwrap_err();

        assert!(err.to_string().ends_with("bucket not found"));
        assert!(handler.project_repo.is_empty());
    }

    #[tokio::test]
    async fn bad_date_fails_before_upload() {
        let mut storage = MockStorage::new();
        storage.expect_upload().never();
        let handler = ProjectHandler::new(InMemoryProjectRepo::new(), storage);

        let file = UploadedFile::new(vec![1], "shot.png", "image/png");
        let err = handler.create_project(form("Smarch 2024"), Some(file)).await.unwrap_err();

        assert!(matches!(err, AppError::InvalidDateFormat));
    }

    #[tokio::test]
    async fn update_refreshes_timestamp_and_keeps_identity() {
        let handler = ProjectHandler::new(InMemoryProjectRepo::new(), MockStorage::new());
        let created = handler.create_project(form("Janvier 2024"), None).await.unwrap();
        assert_eq!(created.created_at, created.updated_at);
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;

        let mut edit = handler.edit_form(&created.id.to_string()).await.unwrap();
        assert_eq!(edit.display_date, "Janvier 2024");
        edit.title = "Portfolio v2".into();
        edit.display_date = "Fevrier 2024".into();

        let updated = handler
            .update_project(&created.id.to_string(), edit, None)
            .await
            .unwrap();

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.created_at, created.created_at);
        assert_ne!(updated.updated_at, created.updated_at);
        assert_eq!(updated.title, "Portfolio v2");
        assert_eq!(updated.date.to_string(), "2024-02-01");
    }

    #[tokio::test]
    async fn deleting_unknown_project_leaves_listing_unchanged() {
        let handler = ProjectHandler::new(InMemoryProjectRepo::new(), MockStorage::new());
        let kept = handler.create_project(form("Janvier 2024"), None).await.unwrap();

        let err = handler
            .delete_project(&Uuid::new_v4().to_string())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::NotFound(_)));
        assert_eq!(handler.list_projects(None).await.unwrap(), vec![kept]);
    }

    #[tokio::test]
    async fn invalid_ids_are_rejected() {
        let handler = ProjectHandler::new(InMemoryProjectRepo::new(), MockStorage::new());

        assert!(matches!(
            handler.delete_project("not-a-uuid").await,
            Err(AppError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn gallery_filters_by_type() {
        let handler = ProjectHandler::new(InMemoryProjectRepo::new(), MockStorage::new());
        handler.create_project(form("Janvier 2024"), None).await.unwrap();
        let mut mobile = form("Mars 2023");
        mobile.project_type = ProjectType::Mobile;
        mobile.gif_url = Some("https://example.com/demo.gif".into());
        handler.create_project(mobile, None).await.unwrap();

        let cards = handler.gallery(Some(ProjectType::Mobile)).await.unwrap();

        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].type_label, "Mobile");
        assert_eq!(cards[0].display_date, "Mars 2023");
        assert_eq!(
            cards[0].demo_preview.as_ref().map(|p| p.url.as_str()),
            Some("https://example.com/demo.gif")
        );
        assert_eq!(handler.gallery(None).await.unwrap().len(), 2);
    }
}
