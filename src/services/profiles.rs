use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use super::error::ServiceError;
use crate::api::requests::{DateRange, EducationRequest, ExperienceRequest, ProfileRequest};
use crate::auth::Identity;
use crate::database::{DocumentStore, FilterData, Repository, StoreError};
use crate::models::{EducationEntry, ExperienceEntry, Profile, ProfileView, Social, User, UserSummary};

const NO_PROFILE: &str = "There is no profile for this user";
const PROFILE_NOT_FOUND: &str = "Profile not found";

/// Target field set of an upsert, built from the present fields of one request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileFields {
    pub company: Option<String>,
    pub website: Option<String>,
    pub location: Option<String>,
    pub bio: Option<String>,
    pub status: Option<String>,
    pub githubusername: Option<String>,
    pub skills: Option<Vec<String>>,
    /// Always rebuilt from this request alone; absent links are dropped.
    pub social: Social,
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Split a comma-delimited skill list into trimmed, non-empty tokens.
pub fn parse_skills(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

impl From<ProfileRequest> for ProfileFields {
    fn from(req: ProfileRequest) -> Self {
        Self {
            company: present(req.company),
            website: present(req.website),
            location: present(req.location),
            bio: present(req.bio),
            status: present(Some(req.status)),
            githubusername: present(req.githubusername),
            // A list of only separators carries no skills
            skills: Some(parse_skills(&req.skills)).filter(|skills| !skills.is_empty()),
            social: Social {
                twitter: present(req.twitter),
                youtube: present(req.youtube),
                facebook: present(req.facebook),
                linkedin: present(req.linkedin),
                instagram: present(req.instagram),
            },
        }
    }
}

impl ProfileFields {
    /// Overwrite present fields in place and replace `social` wholesale.
    pub fn apply_to(&self, profile: &mut Profile) {
        overwrite(&mut profile.company, &self.company);
        overwrite(&mut profile.website, &self.website);
        overwrite(&mut profile.location, &self.location);
        overwrite(&mut profile.bio, &self.bio);
        overwrite(&mut profile.githubusername, &self.githubusername);
        if let Some(status) = &self.status {
            profile.status.clone_from(status);
        }
        if let Some(skills) = &self.skills {
            profile.skills.clone_from(skills);
        }
        profile.social.clone_from(&self.social);
    }

    /// A brand-new profile for `user`; `status` and `skills` are mandatory.
    pub fn create_for(&self, user: Uuid) -> Result<Profile, ServiceError> {
        let status = self.status.as_ref().ok_or(ServiceError::MissingField("status"))?;
        let skills = self.skills.as_ref().ok_or(ServiceError::MissingField("skills"))?;

        let mut profile = Profile {
            id: Uuid::new_v4(),
            user,
            status: status.clone(),
            skills: skills.clone(),
            company: None,
            website: None,
            location: None,
            bio: None,
            githubusername: None,
            social: Social::default(),
            experience: Default::default(),
            education: Default::default(),
            date: Utc::now(),
        };
        self.apply_to(&mut profile);
        Ok(profile)
    }
}

fn overwrite(target: &mut Option<String>, value: &Option<String>) {
    if value.is_some() {
        target.clone_from(value);
    }
}

pub fn experience_entry(req: ExperienceRequest, dates: DateRange) -> ExperienceEntry {
    ExperienceEntry {
        id: Uuid::new_v4(),
        title: req.title,
        company: req.company,
        location: present(req.location),
        from: dates.from,
        to: dates.to,
        current: req.current,
        description: present(req.description),
    }
}

pub fn education_entry(req: EducationRequest, dates: DateRange) -> EducationEntry {
    EducationEntry {
        id: Uuid::new_v4(),
        school: req.school,
        degree: req.degree,
        fieldofstudy: req.fieldofstudy,
        from: dates.from,
        to: dates.to,
        current: req.current,
        description: present(req.description),
    }
}

/// Profile upsert, reads, and the experience/education sub-collections.
///
/// Every list mutation targets the caller's own profile, located by user id,
/// so ownership of entries is implied by ownership of the profile.
#[derive(Clone)]
pub struct ProfileService {
    profiles: Repository<Profile>,
    users: Repository<User>,
    max_attempts: u32,
}

impl ProfileService {
    pub fn new(store: Arc<dyn DocumentStore>, max_attempts: u32) -> Self {
        Self {
            profiles: Repository::new(store.clone()),
            users: Repository::new(store),
            max_attempts,
        }
    }

    fn owner_filter(user_id: Uuid) -> FilterData {
        FilterData::eq("user", user_id.to_string())
    }

    /// Find-or-create the caller's profile from a sparse field set.
    #[instrument(name = "profiles.upsert", skip(self, fields), fields(user_id = %identity.id))]
    pub async fn upsert(&self, identity: &Identity, fields: ProfileFields) -> Result<ProfileView, ServiceError> {
        let filter = Self::owner_filter(identity.id);

        for _ in 0..self.max_attempts.max(1) {
            let updated = self
                .profiles
                .update_one::<_, ServiceError, _>(&filter, self.max_attempts, |profile| {
                    fields.apply_to(profile);
                    Ok(())
                })
                .await?;

            if let Some((profile, ())) = updated {
                debug!(profile_id = %profile.id, "Updated profile");
                return self.view(profile, PROFILE_NOT_FOUND).await;
            }

            let profile = fields.create_for(identity.id)?;
            match self.profiles.insert(&profile).await {
                Ok(_) => {
                    info!(profile_id = %profile.id, "Created profile");
                    return self.view(profile, PROFILE_NOT_FOUND).await;
                }
                // A concurrent upsert created it first; update that one instead
                Err(StoreError::Conflict(_)) => continue,
                Err(e) => return Err(e.into()),
            }
        }

        Err(StoreError::Conflict(format!("profile for user {}", identity.id)).into())
    }

    pub async fn me(&self, identity: &Identity) -> Result<ProfileView, ServiceError> {
        let profile = self
            .profiles
            .find_one(&Self::owner_filter(identity.id))
            .await?
            .ok_or(ServiceError::NotFound(NO_PROFILE))?;
        self.view(profile.doc, NO_PROFILE).await
    }

    pub async fn by_user(&self, user_id: Uuid) -> Result<ProfileView, ServiceError> {
        let profile = self
            .profiles
            .find_one(&Self::owner_filter(user_id))
            .await?
            .ok_or(ServiceError::NotFound(PROFILE_NOT_FOUND))?;
        self.view(profile.doc, PROFILE_NOT_FOUND).await
    }

    /// All profiles whose owner still exists.
    pub async fn list(&self) -> Result<Vec<ProfileView>, ServiceError> {
        let users: HashMap<Uuid, UserSummary> = self
            .users
            .find_all(&FilterData::all())
            .await?
            .iter()
            .map(|user| (user.id, UserSummary::from(user)))
            .collect();

        let profiles = self.profiles.find_all(&FilterData::all()).await?;
        Ok(profiles
            .into_iter()
            .filter_map(|profile| {
                let owner = users.get(&profile.user)?.clone();
                Some(ProfileView::new(profile, owner))
            })
            .collect())
    }

    #[instrument(name = "profiles.add_experience", skip(self, entry), fields(user_id = %identity.id))]
    pub async fn add_experience(&self, identity: &Identity, entry: ExperienceEntry) -> Result<ProfileView, ServiceError> {
        self.mutate(identity, |profile| {
            profile.experience.insert_head(entry.clone());
            Ok(())
        })
        .await
    }

    #[instrument(name = "profiles.remove_experience", skip(self), fields(user_id = %identity.id))]
    pub async fn remove_experience(&self, identity: &Identity, entry_id: Uuid) -> Result<ProfileView, ServiceError> {
        self.mutate(identity, |profile| {
            profile
                .experience
                .remove_by_id(entry_id)
                .map(|_| ())
                .ok_or(ServiceError::NotFound("Experience not found"))
        })
        .await
    }

    #[instrument(name = "profiles.add_education", skip(self, entry), fields(user_id = %identity.id))]
    pub async fn add_education(&self, identity: &Identity, entry: EducationEntry) -> Result<ProfileView, ServiceError> {
        self.mutate(identity, |profile| {
            profile.education.insert_head(entry.clone());
            Ok(())
        })
        .await
    }

    #[instrument(name = "profiles.remove_education", skip(self), fields(user_id = %identity.id))]
    pub async fn remove_education(&self, identity: &Identity, entry_id: Uuid) -> Result<ProfileView, ServiceError> {
        self.mutate(identity, |profile| {
            profile
                .education
                .remove_by_id(entry_id)
                .map(|_| ())
                .ok_or(ServiceError::NotFound("Education not found"))
        })
        .await
    }

    async fn mutate<F>(&self, identity: &Identity, apply: F) -> Result<ProfileView, ServiceError>
    where
        F: FnMut(&mut Profile) -> Result<(), ServiceError> + Send,
    {
        let (profile, ()) = self
            .profiles
            .update_one(&Self::owner_filter(identity.id), self.max_attempts, apply)
            .await?
            .ok_or(ServiceError::NotFound(NO_PROFILE))?;
        self.view(profile, NO_PROFILE).await
    }

    async fn view(&self, profile: Profile, missing: &'static str) -> Result<ProfileView, ServiceError> {
        let owner = self
            .users
            .find_by_id(profile.user)
            .await?
            .ok_or(ServiceError::NotFound(missing))?;
        Ok(ProfileView::new(profile, UserSummary::from(&owner.doc)))
    }
}
