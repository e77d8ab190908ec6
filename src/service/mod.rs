//! Service layer
//!
//! Contains business logic separated from HTTP handlers.
//! Services orchestrate the content store and the bot verifier.

mod blog;
mod comment;
mod outreach;
mod retry;
mod showcase;
mod thread;
mod validate;

pub use blog::{BlogPostInput, BlogService, is_valid_slug};
pub use comment::{CommentInput, CommentService, CommentSettings};
pub use outreach::{ContactInput, OutreachService, SubscriptionInput};
pub use retry::{RetryPolicy, retry_read, with_deadline};
pub use showcase::{GalleryImageInput, ShowcaseService, SocialLinkInput};
pub use thread::{CommentThread, assemble_public_threads};
