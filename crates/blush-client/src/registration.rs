//! Onboarding draft, filled in screen by screen and submitted once.

use chrono::{NaiveDate, NaiveTime, SecondsFormat};
use thiserror::Error;
use tracing::info;

use blush_api::ApiError;
use blush_types::api::{ProfileUpdate, Prompt, UserProfile};
use blush_types::events::Route;

use crate::backend::{AccountApi, ProfileApi};
use crate::context::Context;

pub const PHOTO_SLOTS: usize = 6;
pub const MIN_PHOTOS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DatingMode {
    #[default]
    Date,
    Bff,
}

impl DatingMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Date => "Date",
            Self::Bff => "BFF",
        }
    }
}

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("Please add at least 4 photos to continue.")]
    NotEnoughPhotos,

    #[error(transparent)]
    Api(#[from] ApiError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct RegistrationDraft {
    pub phone_number: String,

    pub first_name: String,
    pub birthday: NaiveDate,
    pub gender: String,
    pub show_gender: bool,
    /// Men, Women or Everyone
    pub dating_preference: String,

    pub mode: DatingMode,
    pub intention: String,

    pub height: String,
    pub exercise: String,
    pub education: String,
    pub drinking: String,
    pub smoking: String,
    pub kids: String,

    pub interests: Vec<String>,
    pub values: Vec<String>,
    pub causes: Vec<String>,
    pub religion: String,
    pub politics: String,

    pub prompts: Vec<Prompt>,
    pub bio: String,

    pub photos: [Option<String>; PHOTO_SLOTS],
}

impl Default for RegistrationDraft {
    fn default() -> Self {
        Self {
            phone_number: String::new(),
            first_name: String::new(),
            birthday: NaiveDate::from_ymd_opt(2000, 1, 1).unwrap_or_default(),
            gender: String::new(),
            show_gender: true,
            dating_preference: "Everyone".into(),
            mode: DatingMode::Date,
            intention: String::new(),
            height: String::new(),
            exercise: String::new(),
            education: String::new(),
            drinking: String::new(),
            smoking: String::new(),
            kids: String::new(),
            interests: Vec::new(),
            values: Vec::new(),
            causes: Vec::new(),
            religion: String::new(),
            politics: String::new(),
            prompts: Vec::new(),
            bio: String::new(),
            photos: Default::default(),
        }
    }
}

impl RegistrationDraft {
    pub fn update(&mut self, f: impl FnOnce(&mut Self)) {
        f(self);
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn photo_count(&self) -> usize {
        self.photos.iter().filter(|p| p.is_some()).count()
    }

    /// The `PATCH /users/me` body for the whole draft.
    pub fn to_profile_update(&self) -> ProfileUpdate {
        let birthday = self
            .birthday
            .and_time(NaiveTime::MIN)
            .and_utc()
            .to_rfc3339_opts(SecondsFormat::Millis, true);

        ProfileUpdate {
            phone_number: Some(self.phone_number.clone()),
            first_name: Some(self.first_name.clone()),
            birthday: Some(birthday),
            gender: Some(self.gender.clone()),
            show_gender: Some(self.show_gender),
            dating_preference: Some(self.dating_preference.clone()),
            mode: Some(self.mode.as_str().to_string()),
            intention: Some(self.intention.clone()),
            height: Some(self.height.clone()),
            exercise: Some(self.exercise.clone()),
            education: Some(self.education.clone()),
            drinking: Some(self.drinking.clone()),
            smoking: Some(self.smoking.clone()),
            kids: Some(self.kids.clone()),
            interests: Some(self.interests.clone()),
            values: Some(self.values.clone()),
            causes: Some(self.causes.clone()),
            religion: Some(self.religion.clone()),
            politics: Some(self.politics.clone()),
            prompts: Some(self.prompts.clone()),
            bio: Some(self.bio.clone()),
            photos: Some(self.photos.to_vec()),
            ..Default::default()
        }
    }

    /// Send the draft, reload the profile and head to discovery.
    pub async fn submit<A: AccountApi + ProfileApi>(
        &self,
        api: &A,
        ctx: &Context,
    ) -> Result<UserProfile, SubmitError> {
        if self.photo_count() < MIN_PHOTOS {
            ctx.events.alert(
                "More Photos Required",
                "Please add at least 4 photos to continue.",
            );
            return Err(SubmitError::NotEnoughPhotos);
        }

        let profile = match api.update_profile(&self.to_profile_update()).await {
            Ok(profile) => profile,
            Err(e) => {
                if !ctx.intercept(&e).await {
                    if e.is_network() {
                        ctx.events.alert("Network Error", "Could not connect to server.");
                    } else {
                        ctx.events
                            .alert("Error", "Failed to save profile. Please try again.");
                    }
                }
                return Err(e.into());
            }
        };
        info!("Onboarding submitted (completed: {})", profile.onboarding_completed);

        ctx.session.refresh(api).await;
        ctx.events.navigate(Route::Discovery);
        Ok(profile)
    }
}
