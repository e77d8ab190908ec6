//! Showcase service
//!
//! Gallery images and social media links shown on the home page.
//! Public lists only carry active records, ordered by display order.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use super::retry::with_deadline;
use super::validate;
use crate::data::{Database, EntityId, GalleryImage, SocialLink, SocialPlatform};
use crate::error::AppError;

/// Editable fields of a gallery image
#[derive(Debug, Clone, Default)]
pub struct GalleryImageInput {
    pub title: String,
    pub description: Option<String>,
    pub image_url: String,
    pub display_order: i64,
    pub is_active: bool,
}

/// Editable fields of a social link
#[derive(Debug, Clone, Default)]
pub struct SocialLinkInput {
    pub platform: String,
    pub url: String,
    pub display_order: i64,
    pub is_active: bool,
}

/// Showcase service
pub struct ShowcaseService {
    db: Arc<Database>,
    store_timeout: Duration,
}

impl ShowcaseService {
    /// Create new showcase service
    pub fn new(db: Arc<Database>, store_timeout: Duration) -> Self {
        Self { db, store_timeout }
    }

    // =========================================================================
    // Gallery
    // =========================================================================

    /// Gallery images
    ///
    /// # Arguments
    /// * `active_only` - Public callers pass `true`
    pub async fn list_gallery(&self, active_only: bool) -> Result<Vec<GalleryImage>, AppError> {
        self.store("list_gallery_images", self.db.list_gallery_images(active_only))
            .await
    }

    /// Add a gallery image
    pub async fn create_gallery_image(
        &self,
        input: GalleryImageInput,
    ) -> Result<GalleryImage, AppError> {
        let now = Utc::now();
        let image = build_gallery_image(EntityId::new().0, input, now, now)?;
        self.store("upsert_gallery_image", self.db.upsert_gallery_image(&image))
            .await?;
        tracing::info!(image_id = %image.id, "Gallery image created");
        Ok(image)
    }

    /// Replace a gallery image
    pub async fn update_gallery_image(
        &self,
        id: &str,
        input: GalleryImageInput,
    ) -> Result<GalleryImage, AppError> {
        let existing = self
            .store("get_gallery_image", self.db.get_gallery_image(id))
            .await?
            .ok_or(AppError::NotFound("Gallery image"))?;
        let image = build_gallery_image(existing.id, input, existing.created_at, Utc::now())?;
        self.store("upsert_gallery_image", self.db.upsert_gallery_image(&image))
            .await?;
        Ok(image)
    }

    /// Delete a gallery image
    pub async fn delete_gallery_image(&self, id: &str) -> Result<(), AppError> {
        if !self
            .store("delete_gallery_image", self.db.delete_gallery_image(id))
            .await?
        {
            return Err(AppError::NotFound("Gallery image"));
        }
        Ok(())
    }

    // =========================================================================
    // Social links
    // =========================================================================

    /// Social links
    ///
    /// # Arguments
    /// * `active_only` - Public callers pass `true`
    pub async fn list_social(&self, active_only: bool) -> Result<Vec<SocialLink>, AppError> {
        self.store("list_social_links", self.db.list_social_links(active_only))
            .await
    }

    /// Add a social link
    pub async fn create_social_link(&self, input: SocialLinkInput) -> Result<SocialLink, AppError> {
        let now = Utc::now();
        let link = build_social_link(EntityId::new().0, input, now, now)?;
        self.store("upsert_social_link", self.db.upsert_social_link(&link))
            .await?;
        tracing::info!(link_id = %link.id, platform = %link.platform, "Social link created");
        Ok(link)
    }

    /// Replace a social link
    pub async fn update_social_link(
        &self,
        id: &str,
        input: SocialLinkInput,
    ) -> Result<SocialLink, AppError> {
        let existing = self
            .store("get_social_link", self.db.get_social_link(id))
            .await?
            .ok_or(AppError::NotFound("Social link"))?;
        let link = build_social_link(existing.id, input, existing.created_at, Utc::now())?;
        self.store("upsert_social_link", self.db.upsert_social_link(&link))
            .await?;
        Ok(link)
    }

    /// Flip the active flag of a social link
    pub async fn toggle_social_link(&self, id: &str) -> Result<SocialLink, AppError> {
        self.store("toggle_social_link", self.db.toggle_social_link(id))
            .await?
            .ok_or(AppError::NotFound("Social link"))
    }

    /// Delete a social link
    pub async fn delete_social_link(&self, id: &str) -> Result<(), AppError> {
        if !self
            .store("delete_social_link", self.db.delete_social_link(id))
            .await?
        {
            return Err(AppError::NotFound("Social link"));
        }
        Ok(())
    }

    async fn store<T>(
        &self,
        operation: &'static str,
        future: impl std::future::Future<Output = Result<T, AppError>>,
    ) -> Result<T, AppError> {
        with_deadline("content store", operation, self.store_timeout, future).await
    }
}

fn build_gallery_image(
    id: String,
    input: GalleryImageInput,
    created_at: chrono::DateTime<Utc>,
    updated_at: chrono::DateTime<Utc>,
) -> Result<GalleryImage, AppError> {
    Ok(GalleryImage {
        id,
        title: validate::required("Title", &input.title)?,
        description: input
            .description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty()),
        image_url: validate::http_url("Image URL", &input.image_url)?,
        display_order: input.display_order,
        is_active: input.is_active,
        created_at,
        updated_at,
    })
}

fn build_social_link(
    id: String,
    input: SocialLinkInput,
    created_at: chrono::DateTime<Utc>,
    updated_at: chrono::DateTime<Utc>,
) -> Result<SocialLink, AppError> {
    let platform = SocialPlatform::parse(&input.platform).ok_or_else(|| {
        AppError::Validation("Platform must be one of instagram, facebook, twitter".to_string())
    })?;

    Ok(SocialLink {
        id,
        platform: platform.as_str().to_string(),
        url: validate::http_url("URL", &input.url)?,
        display_order: input.display_order,
        is_active: input.is_active,
        created_at,
        updated_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn service() -> (ShowcaseService, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db = Database::connect(&temp_dir.path().join("test.db"))
            .await
            .unwrap();
        (
            ShowcaseService::new(Arc::new(db), Duration::from_secs(5)),
            temp_dir,
        )
    }

    fn image(title: &str, order: i64, active: bool) -> GalleryImageInput {
        GalleryImageInput {
            title: title.to_string(),
            description: Some("  ".to_string()),
            image_url: format!("https://cdn.example.com/{title}.jpg"),
            display_order: order,
            is_active: active,
        }
    }

    #[tokio::test]
    async fn public_gallery_is_active_and_ordered() {
        let (service, _temp_dir) = service().await;
        service.create_gallery_image(image("b", 2, true)).await.unwrap();
        service.create_gallery_image(image("a", 1, true)).await.unwrap();
        service.create_gallery_image(image("hidden", 0, false)).await.unwrap();

        let public = service.list_gallery(true).await.unwrap();
        let titles: Vec<_> = public.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["a", "b"]);
        assert!(public[0].description.is_none());

        assert_eq!(service.list_gallery(false).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn gallery_update_keeps_creation_time() {
        let (service, _temp_dir) = service().await;
        let created = service.create_gallery_image(image("a", 1, true)).await.unwrap();

        let updated = service
            .update_gallery_image(&created.id, image("renamed", 5, false))
            .await
            .unwrap();

        assert_eq!(updated.created_at, created.created_at);
        assert_eq!(updated.title, "renamed");
        assert!(matches!(
            service.update_gallery_image("missing", image("x", 0, true)).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn social_link_rules() {
        let (service, _temp_dir) = service().await;

        let bad_platform = service
            .create_social_link(SocialLinkInput {
                platform: "myspace".to_string(),
                url: "https://myspace.com/me".to_string(),
                display_order: 0,
                is_active: true,
            })
            .await;
        assert!(matches!(bad_platform, Err(AppError::Validation(_))));

        let bad_url = service
            .create_social_link(SocialLinkInput {
                platform: "instagram".to_string(),
                url: "javascript:alert(1)".to_string(),
                display_order: 0,
                is_active: true,
            })
            .await;
        assert!(matches!(bad_url, Err(AppError::Validation(_))));

        let link = service
            .create_social_link(SocialLinkInput {
                platform: "Instagram".to_string(),
                url: "https://instagram.com/p/abc".to_string(),
                display_order: 0,
                is_active: true,
            })
            .await
            .unwrap();
        assert_eq!(link.platform, "instagram");

        let toggled = service.toggle_social_link(&link.id).await.unwrap();
        assert!(!toggled.is_active);
        assert!(service.list_social(true).await.unwrap().is_empty());
    }
}
