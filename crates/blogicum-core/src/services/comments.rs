use serde::Serialize;
use uuid::Uuid;

use super::{BlogService, Destination, FormMode, Outcome};
use crate::domain::Comment;
use crate::error::DomainError;
use crate::forms::{CommentInput, FieldErrors};
use crate::ownership;

/// Context of the create/edit/delete comment page.
#[derive(Debug, Clone, Serialize)]
pub struct CommentFormPage {
    pub mode: FormMode,
    pub post_id: Uuid,
    pub comment_id: Option<Uuid>,
    pub form: CommentInput,
    pub errors: FieldErrors,
}

impl CommentFormPage {
    fn for_comment(mode: FormMode, comment: &Comment) -> Self {
        Self {
            mode,
            post_id: comment.post_id,
            comment_id: Some(comment.id),
            form: CommentInput::from_comment(comment),
            errors: FieldErrors::new(),
        }
    }
}

impl BlogService {
    /// A comment addressed through a post it does not belong to is missing.
    async fn comment_under_post(
        &self,
        post_id: Uuid,
        comment_id: Uuid,
    ) -> Result<Comment, DomainError> {
        self.repos
            .comments
            .find_by_id(comment_id)
            .await?
            .filter(|comment| comment.post_id == post_id)
            .ok_or_else(|| DomainError::not_found("comment", comment_id))
    }

    pub async fn new_comment_form(
        &self,
        requester: Uuid,
        post_id: Uuid,
    ) -> Result<CommentFormPage, DomainError> {
        let post = self.visible_post(Some(requester), post_id).await?;
        Ok(CommentFormPage {
            mode: FormMode::Create,
            post_id: post.post.id,
            comment_id: None,
            form: CommentInput::default(),
            errors: FieldErrors::new(),
        })
    }

    /// Comment on a post the requester can see, then return to the post.
    pub async fn create_comment(
        &self,
        requester: Uuid,
        post_id: Uuid,
        input: CommentInput,
    ) -> Result<Outcome<CommentFormPage>, DomainError> {
        let author = self.require_user(requester).await?;
        let post = self.visible_post(Some(author.id), post_id).await?;

        let draft = match input.clean() {
            Ok(draft) => draft,
            Err(errors) => {
                return Ok(Outcome::Invalid(CommentFormPage {
                    mode: FormMode::Create,
                    post_id: post.post.id,
                    comment_id: None,
                    form: input,
                    errors,
                }));
            }
        };

        let comment = Comment::new(post.post.id, author.id, draft.body);
        self.repos.comments.insert(comment).await?;
        Ok(Outcome::Redirect(Destination::PostDetail(post.post.id)))
    }

    pub async fn edit_comment_form(
        &self,
        requester: Uuid,
        post_id: Uuid,
        comment_id: Uuid,
    ) -> Result<Outcome<CommentFormPage>, DomainError> {
        let comment = self.comment_under_post(post_id, comment_id).await?;
        if let Err(bounce) =
            ownership::ensure_owner(requester, &comment, Destination::PostDetail(comment.post_id))
        {
            return Ok(Outcome::Redirect(bounce));
        }

        Ok(Outcome::Render(CommentFormPage::for_comment(
            FormMode::Edit,
            &comment,
        )))
    }

    /// Change the comment text. The post it belongs to never changes.
    pub async fn update_comment(
        &self,
        requester: Uuid,
        post_id: Uuid,
        comment_id: Uuid,
        input: CommentInput,
    ) -> Result<Outcome<CommentFormPage>, DomainError> {
        let mut comment = self.comment_under_post(post_id, comment_id).await?;
        if let Err(bounce) =
            ownership::ensure_owner(requester, &comment, Destination::PostDetail(comment.post_id))
        {
            return Ok(Outcome::Redirect(bounce));
        }

        let draft = match input.clean() {
            Ok(draft) => draft,
            Err(errors) => {
                let mut page = CommentFormPage::for_comment(FormMode::Edit, &comment);
                page.form = input;
                page.errors = errors;
                return Ok(Outcome::Invalid(page));
            }
        };

        comment.body = draft.body;
        let comment = self.repos.comments.update(comment).await?;
        Ok(Outcome::Redirect(Destination::PostDetail(comment.post_id)))
    }

    pub async fn delete_comment_form(
        &self,
        requester: Uuid,
        post_id: Uuid,
        comment_id: Uuid,
    ) -> Result<Outcome<CommentFormPage>, DomainError> {
        let comment = self.comment_under_post(post_id, comment_id).await?;
        if let Err(bounce) =
            ownership::ensure_owner(requester, &comment, Destination::PostDetail(comment.post_id))
        {
            return Ok(Outcome::Redirect(bounce));
        }

        Ok(Outcome::Render(CommentFormPage::for_comment(
            FormMode::Delete,
            &comment,
        )))
    }

    pub async fn delete_comment(
        &self,
        requester: Uuid,
        post_id: Uuid,
        comment_id: Uuid,
    ) -> Result<Destination, DomainError> {
        let comment = self.comment_under_post(post_id, comment_id).await?;
        let back = Destination::PostDetail(comment.post_id);
        if let Err(bounce) = ownership::ensure_owner(requester, &comment, back.clone()) {
            return Ok(bounce);
        }

        self.repos.comments.delete(comment.id).await?;
        Ok(back)
    }
}
