use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use super::{BlogService, Destination, Outcome};
use crate::domain::{PostView, Profile, User};
use crate::error::{DomainError, RepoError};
use crate::forms::{FieldErrors, ProfileDraft, ProfileInput};
use crate::pagination::{Page, PageQuery};
use crate::visibility::{PostFilter, PostPredicate};

const USERNAME_TAKEN: &str = "A user with that username already exists.";
const EMAIL_TAKEN: &str = "A user with that email already exists.";

/// Context of a user's profile page.
#[derive(Debug, Clone, Serialize)]
pub struct ProfilePage {
    pub profile: Profile,
    /// The viewer is looking at their own profile.
    pub is_owner: bool,
    pub page: Page<PostView>,
}

/// Context of the profile edit page.
#[derive(Debug, Clone, Serialize)]
pub struct ProfileFormPage {
    pub form: ProfileInput,
    pub errors: FieldErrors,
}

impl BlogService {
    /// Posts of `username`: all of them for the owner, the public ones for anyone else.
    pub async fn profile(
        &self,
        viewer: Option<Uuid>,
        username: &str,
        page: PageQuery,
    ) -> Result<ProfilePage, DomainError> {
        let user = self
            .repos
            .users
            .find_by_username(username)
            .await?
            .ok_or_else(|| DomainError::not_found("user", username))?;

        let is_owner = viewer == Some(user.id);
        let mut filter = PostFilter::all().and(PostPredicate::AuthoredBy(user.id));
        if !is_owner {
            filter = filter & PostFilter::public(Utc::now());
        }

        let page = self.paginate(&filter, page).await?;
        Ok(ProfilePage {
            profile: user.profile(),
            is_owner,
            page,
        })
    }

    pub async fn profile_form(&self, requester: Uuid) -> Result<ProfileFormPage, DomainError> {
        let user = self.require_user(requester).await?;
        Ok(ProfileFormPage {
            form: ProfileInput::from_user(&user),
            errors: FieldErrors::new(),
        })
    }

    /// Edit the requester's own account, then go to the (possibly renamed) profile.
    pub async fn update_profile(
        &self,
        requester: Uuid,
        input: ProfileInput,
    ) -> Result<Outcome<ProfileFormPage>, DomainError> {
        let user = self.require_user(requester).await?;
        let draft = match input.clean() {
            Ok(draft) => draft,
            Err(errors) => return Ok(Outcome::Invalid(ProfileFormPage { form: input, errors })),
        };

        let errors = self.profile_conflicts(&user, &draft).await?;
        if !errors.is_empty() {
            return Ok(Outcome::Invalid(ProfileFormPage { form: input, errors }));
        }

        let updated = User {
            username: draft.username,
            first_name: draft.first_name,
            last_name: draft.last_name,
            email: draft.email,
            updated_at: Utc::now(),
            ..user
        };

        match self.repos.users.update(updated).await {
            Ok(saved) => Ok(Outcome::Redirect(Destination::Profile(saved.username))),
            Err(RepoError::Constraint(_)) => {
                let mut errors = FieldErrors::new();
                errors.add("username", USERNAME_TAKEN);
                Ok(Outcome::Invalid(ProfileFormPage { form: input, errors }))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn profile_conflicts(
        &self,
        user: &User,
        draft: &ProfileDraft,
    ) -> Result<FieldErrors, DomainError> {
        let mut errors = FieldErrors::new();

        let owner = self.repos.users.find_by_username(&draft.username).await?;
        if owner.is_some_and(|other| other.id != user.id) {
            errors.add("username", USERNAME_TAKEN);
        }

        if !draft.email.is_empty() {
            let owner = self.repos.users.find_by_email(&draft.email).await?;
            if owner.is_some_and(|other| other.id != user.id) {
                errors.add("email", EMAIL_TAKEN);
            }
        }

        Ok(errors)
    }
}
