use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use super::{BlogService, Destination, FormMode, Outcome};
use crate::domain::{Category, CommentView, Location, Post, PostView};
use crate::error::DomainError;
use crate::forms::{CommentInput, FieldErrors, INVALID_CHOICE, PostDraft, PostInput};
use crate::ownership;
use crate::pagination::{Page, PageQuery};
use crate::visibility::{self, PostFilter};

/// Context of the post detail page.
#[derive(Debug, Clone, Serialize)]
pub struct PostDetail {
    pub post: PostView,
    pub comments: Vec<CommentView>,
    pub form: CommentInput,
}

/// Context of the create/edit/delete post page.
#[derive(Debug, Clone, Serialize)]
pub struct PostFormPage {
    pub mode: FormMode,
    pub post_id: Option<Uuid>,
    pub form: PostInput,
    pub errors: FieldErrors,
    pub categories: Vec<Category>,
    pub locations: Vec<Location>,
}

impl BlogService {
    /// Home feed: every post the viewer may see, newest first.
    pub async fn post_list(
        &self,
        viewer: Option<Uuid>,
        page: PageQuery,
    ) -> Result<Page<PostView>, DomainError> {
        let filter = PostFilter::visible_to(viewer, Utc::now());
        self.paginate(&filter, page).await
    }

    pub async fn post_detail(
        &self,
        viewer: Option<Uuid>,
        post_id: Uuid,
    ) -> Result<PostDetail, DomainError> {
        let post = self.visible_post(viewer, post_id).await?;
        let comments = self.repos.comments.find_for_post(post.post.id).await?;
        Ok(PostDetail {
            post,
            comments,
            form: CommentInput::default(),
        })
    }

    /// Hidden posts are reported as missing, never as forbidden.
    pub(super) async fn visible_post(
        &self,
        viewer: Option<Uuid>,
        post_id: Uuid,
    ) -> Result<PostView, DomainError> {
        self.repos
            .posts
            .find_view(post_id)
            .await?
            .filter(|view| visibility::is_visible(view, viewer, Utc::now()))
            .ok_or_else(|| DomainError::not_found("post", post_id))
    }

    async fn find_post(&self, post_id: Uuid) -> Result<Post, DomainError> {
        self.repos
            .posts
            .find_by_id(post_id)
            .await?
            .ok_or_else(|| DomainError::not_found("post", post_id))
    }

    async fn post_form(
        &self,
        mode: FormMode,
        post_id: Option<Uuid>,
        form: PostInput,
        errors: FieldErrors,
    ) -> Result<PostFormPage, DomainError> {
        Ok(PostFormPage {
            mode,
            post_id,
            form,
            errors,
            categories: self.repos.categories.list_all().await?,
            locations: self.repos.locations.list_all().await?,
        })
    }

    /// Clean the form and check that the chosen category and location exist.
    async fn clean_post(
        &self,
        input: &PostInput,
    ) -> Result<Result<PostDraft, FieldErrors>, DomainError> {
        let draft = match input.clean() {
            Ok(draft) => draft,
            Err(errors) => return Ok(Err(errors)),
        };

        let mut errors = FieldErrors::new();
        if self
            .repos
            .categories
            .find_by_id(draft.category_id)
            .await?
            .is_none()
        {
            errors.add("category", INVALID_CHOICE);
        }
        if let Some(location_id) = draft.location_id {
            if self.repos.locations.find_by_id(location_id).await?.is_none() {
                errors.add("location", INVALID_CHOICE);
            }
        }
        Ok(errors.into_result(|| draft))
    }

    pub async fn new_post_form(&self) -> Result<PostFormPage, DomainError> {
        self.post_form(FormMode::Create, None, PostInput::default(), FieldErrors::new())
            .await
    }

    /// Create a post authored by `requester`, then go to their profile.
    pub async fn create_post(
        &self,
        requester: Uuid,
        input: PostInput,
    ) -> Result<Outcome<PostFormPage>, DomainError> {
        let author = self.require_user(requester).await?;
        let draft = match self.clean_post(&input).await? {
            Ok(draft) => draft,
            Err(errors) => {
                let page = self.post_form(FormMode::Create, None, input, errors).await?;
                return Ok(Outcome::Invalid(page));
            }
        };

        self.repos.posts.insert(Post::new(author.id, draft)).await?;
        Ok(Outcome::Redirect(Destination::Profile(author.username)))
    }

    pub async fn edit_post_form(
        &self,
        requester: Uuid,
        post_id: Uuid,
    ) -> Result<Outcome<PostFormPage>, DomainError> {
        let post = self.find_post(post_id).await?;
        if let Err(bounce) =
            ownership::ensure_owner(requester, &post, Destination::PostDetail(post.id))
        {
            return Ok(Outcome::Redirect(bounce));
        }

        let form = PostInput::from_post(&post);
        let page = self
            .post_form(FormMode::Edit, Some(post.id), form, FieldErrors::new())
            .await?;
        Ok(Outcome::Render(page))
    }

    pub async fn update_post(
        &self,
        requester: Uuid,
        post_id: Uuid,
        input: PostInput,
    ) -> Result<Outcome<PostFormPage>, DomainError> {
        let mut post = self.find_post(post_id).await?;
        if let Err(bounce) =
            ownership::ensure_owner(requester, &post, Destination::PostDetail(post.id))
        {
            return Ok(Outcome::Redirect(bounce));
        }

        let draft = match self.clean_post(&input).await? {
            Ok(draft) => draft,
            Err(errors) => {
                let page = self
                    .post_form(FormMode::Edit, Some(post.id), input, errors)
                    .await?;
                return Ok(Outcome::Invalid(page));
            }
        };

        post.apply(draft);
        let post = self.repos.posts.update(post).await?;
        Ok(Outcome::Redirect(Destination::PostDetail(post.id)))
    }

    pub async fn delete_post_form(
        &self,
        requester: Uuid,
        post_id: Uuid,
    ) -> Result<Outcome<PostFormPage>, DomainError> {
        let post = self.find_post(post_id).await?;
        if let Err(bounce) =
            ownership::ensure_owner(requester, &post, Destination::PostDetail(post.id))
        {
            return Ok(Outcome::Redirect(bounce));
        }

        Ok(Outcome::Render(PostFormPage {
            mode: FormMode::Delete,
            post_id: Some(post.id),
            form: PostInput::from_post(&post),
            errors: FieldErrors::new(),
            categories: Vec::new(),
            locations: Vec::new(),
        }))
    }

    /// Delete the post with its comments. Non-owners are bounced to the post.
    pub async fn delete_post(
        &self,
        requester: Uuid,
        post_id: Uuid,
    ) -> Result<Destination, DomainError> {
        let post = self.find_post(post_id).await?;
        if let Err(bounce) =
            ownership::ensure_owner(requester, &post, Destination::PostDetail(post.id))
        {
            return Ok(bounce);
        }

        let author = self.require_user(requester).await?;
        self.repos.posts.delete(post.id).await?;
        Ok(Destination::Profile(author.username))
    }
}
