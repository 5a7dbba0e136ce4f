use garde::Validate;
use serde::Deserialize;

use crate::validation::sanitize::escape_html;

/// Text fields of a new post.
#[derive(Debug, Clone, Validate)]
pub struct PostInput {
    #[garde(length(chars, min = 1, max = 200))]
    pub title: String,
    #[garde(length(min = 1))]
    pub body: String,
    #[garde(length(min = 1))]
    pub category: String,
}

impl PostInput {
    pub fn sanitized(self) -> Self {
        Self {
            title: escape_html(&self.title),
            body: escape_html(&self.body),
            category: escape_html(&self.category),
        }
    }
}

/// Text fields of a post update. `None` keeps the stored value.
#[derive(Debug, Clone, Default, Validate)]
pub struct PostPatch {
    #[garde(length(chars, min = 1, max = 200))]
    pub title: Option<String>,
    #[garde(skip)]
    pub body: Option<String>,
    #[garde(skip)]
    pub category: Option<String>,
}

impl PostPatch {
    pub fn sanitized(self) -> Self {
        Self {
            title: self.title.as_deref().map(escape_html),
            body: self.body.as_deref().map(escape_html),
            category: self.category.as_deref().map(escape_html),
        }
    }
}

/// The request payload for creating or editing a comment.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CommentInput {
    #[serde(default)]
    #[garde(length(chars, min = 1, max = 1000))]
    pub text: String,
}

impl CommentInput {
    pub fn normalized(self) -> Self {
        Self {
            text: self.text.trim().to_string(),
        }
    }

    pub fn sanitized(self) -> Self {
        Self {
            text: escape_html(&self.text),
        }
    }
}

/// Text fields of a profile update. `None` keeps the stored value.
#[derive(Debug, Clone, Default, Validate)]
pub struct ProfilePatch {
    #[garde(length(chars, min = 1, max = 200))]
    pub name: Option<String>,
    #[garde(length(chars, max = 100))]
    pub bio: Option<String>,
    #[garde(length(chars, max = 200))]
    pub education: Option<String>,
    #[garde(length(chars, max = 200))]
    pub work: Option<String>,
}

impl ProfilePatch {
    pub fn sanitized(self) -> Self {
        Self {
            name: self.name.as_deref().map(escape_html),
            bio: self.bio.as_deref().map(escape_html),
            education: self.education.as_deref().map(escape_html),
            work: self.work.as_deref().map(escape_html),
        }
    }
}
