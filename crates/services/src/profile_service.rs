use std::sync::Arc;

use portal_core::model::{AdminProfile, FilePayload, LearnerProfile, PICTURE_UPLOAD_LIMIT, UploadError};
use storage::repository::ProfileRepository;

use crate::defaults;
use crate::error::ProfileServiceError;

fn check_picture(picture: &FilePayload) -> Result<(), UploadError> {
    if picture.size_bytes() > PICTURE_UPLOAD_LIMIT {
        return Err(UploadError::TooLarge {
            size: picture.size_bytes(),
            limit: PICTURE_UPLOAD_LIMIT,
        });
    }
    Ok(())
}

/// Learner and admin profile pages.
#[derive(Clone)]
pub struct ProfileService {
    profiles: Arc<dyn ProfileRepository>,
}

impl ProfileService {
    #[must_use]
    pub fn new(profiles: Arc<dyn ProfileRepository>) -> Self {
        Self { profiles }
    }

    /// Load the learner profile, writing the default one if none exists.
    ///
    /// # Errors
    ///
    /// Returns `ProfileServiceError::Storage` if repository access fails.
    pub async fn learner(&self) -> Result<LearnerProfile, ProfileServiceError> {
        if let Some(profile) = self.profiles.load_learner().await? {
            return Ok(profile);
        }
        let profile = defaults::learner_profile()?;
        self.profiles.save_learner(&profile).await?;
        Ok(profile)
    }

    /// # Errors
    ///
    /// Returns `ProfileServiceError::Profile` if the name or email is blank or
    /// malformed; nothing is written in that case.
    pub async fn update_learner_details(
        &self,
        name: &str,
        email: &str,
    ) -> Result<LearnerProfile, ProfileServiceError> {
        let mut profile = self.learner().await?;
        profile.update_details(name, email)?;
        self.profiles.save_learner(&profile).await?;
        Ok(profile)
    }

    /// # Errors
    ///
    /// Returns `ProfileServiceError::Upload` if the picture is over 2 MB.
    pub async fn set_learner_picture(
        &self,
        picture: FilePayload,
    ) -> Result<LearnerProfile, ProfileServiceError> {
        check_picture(&picture)?;
        let mut profile = self.learner().await?;
        profile.set_picture(Some(picture));
        self.profiles.save_learner(&profile).await?;
        Ok(profile)
    }

    /// # Errors
    ///
    /// Returns `ProfileServiceError::Storage` if repository access fails.
    pub async fn remove_learner_picture(&self) -> Result<LearnerProfile, ProfileServiceError> {
        let mut profile = self.learner().await?;
        profile.set_picture(None);
        self.profiles.save_learner(&profile).await?;
        Ok(profile)
    }

    /// Load the admin profile, writing the default one if none exists.
    ///
    /// # Errors
    ///
    /// Returns `ProfileServiceError::Storage` if repository access fails.
    pub async fn admin(&self) -> Result<AdminProfile, ProfileServiceError> {
        if let Some(profile) = self.profiles.load_admin().await? {
            return Ok(profile);
        }
        let profile = defaults::admin_profile()?;
        self.profiles.save_admin(&profile).await?;
        Ok(profile)
    }

    /// # Errors
    ///
    /// Returns `ProfileServiceError::Profile` if the name or email is blank or
    /// malformed.
    pub async fn update_admin_details(
        &self,
        name: &str,
        email: &str,
    ) -> Result<AdminProfile, ProfileServiceError> {
        let mut profile = self.admin().await?;
        profile.update_details(name, email)?;
        self.profiles.save_admin(&profile).await?;
        Ok(profile)
    }

    /// # Errors
    ///
    /// Returns `ProfileServiceError::Upload` if the picture is over 2 MB.
    pub async fn set_admin_picture(
        &self,
        picture: FilePayload,
    ) -> Result<AdminProfile, ProfileServiceError> {
        check_picture(&picture)?;
        let mut profile = self.admin().await?;
        profile.set_picture(Some(picture));
        self.profiles.save_admin(&profile).await?;
        Ok(profile)
    }

    /// # Errors
    ///
    /// Returns `ProfileServiceError::Storage` if repository access fails.
    pub async fn remove_admin_picture(&self) -> Result<AdminProfile, ProfileServiceError> {
        let mut profile = self.admin().await?;
        profile.set_picture(None);
        self.profiles.save_admin(&profile).await?;
        Ok(profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use portal_core::model::ProfileError;
    use storage::repository::Storage;

    fn service() -> ProfileService {
        ProfileService::new(Storage::in_memory().profiles)
    }

    #[tokio::test]
    async fn missing_profiles_fall_back_to_defaults() {
        let service = service();
        let learner = service.learner().await.unwrap();
        assert_eq!(learner.name(), defaults::LEARNER_NAME);
        assert!(learner.enrolled_courses().is_empty());

        let admin = service.admin().await.unwrap();
        assert_eq!(admin.role(), defaults::ADMIN_ROLE);
        assert_eq!(admin.admin_since().to_string(), "2025-06-01");
    }

    #[tokio::test]
    async fn invalid_details_leave_profile_unchanged() {
        let service = service();
        let err = service.update_learner_details("", "jane@example.com").await.unwrap_err();
        assert!(matches!(err, ProfileServiceError::Profile(ProfileError::EmptyName)));

        let updated = service
            .update_learner_details("Janet Doe", "janet@example.com")
            .await
            .unwrap();
        assert_eq!(updated.email(), "janet@example.com");
        assert_eq!(service.learner().await.unwrap().name(), "Janet Doe");
    }

    #[tokio::test]
    async fn oversized_picture_is_rejected() {
        let service = service();
        let huge = FilePayload::from_persisted(
            "data:image/png;base64,AA==".into(),
            "huge.png".into(),
            PICTURE_UPLOAD_LIMIT + 1,
        );
        let err = service.set_admin_picture(huge).await.unwrap_err();
        assert!(matches!(
            err,
            ProfileServiceError::Upload(UploadError::TooLarge { .. })
        ));
        assert!(service.admin().await.unwrap().picture().is_none());
    }

    #[tokio::test]
    async fn picture_can_be_set_and_removed() {
        let service = service();
        let picture =
            FilePayload::encode(&[0x89, 0x50, 0x4e, 0x47], "me.png", "image/png", PICTURE_UPLOAD_LIMIT)
                .unwrap();
        let profile = service.set_learner_picture(picture.clone()).await.unwrap();
        assert_eq!(profile.picture(), Some(&picture));

        let profile = service.remove_learner_picture().await.unwrap();
        assert!(profile.picture().is_none());
    }
}
