use crate::account::protocol;
use crate::transport::{ApiTransport, unbuildable};
use factify_core::error::AnalysisError;
use factify_core::session::AuthContext;
use factify_core::social::{AnalysisSummary, Comment, NewPost, Post, require_id, require_text};
use factify_providers::endpoints::{
    FEED_PATH, MY_ANALYSES_PATH, build_add_comment_request, build_comments_request,
    build_delete_comment_request, build_delete_post_request, build_edit_comment_request,
    build_edit_post_request, build_get, build_like_request, build_share_request,
};
use factify_providers::parse::{
    SocialAck, parse_comments, parse_feed, parse_my_analyses, parse_social_ack,
};
use factify_providers::request::HttpRequest;

/// Community feed: shared analyses, likes and comments.
///
/// Reading the feed and a post's comments is public. Every write needs a
/// signed-in session; ownership checks happen on the backend and come back as
/// `Submission` errors carrying its message.
#[derive(Debug, Clone)]
pub struct SocialFeed {
    transport: ApiTransport,
}

impl SocialFeed {
    pub fn new(transport: ApiTransport) -> Self {
        Self { transport }
    }

    pub async fn feed(&self) -> Result<Vec<Post>, AnalysisError> {
        let req = build_get(self.transport.base_url(), FEED_PATH);
        let body = self.read(req, AuthContext::ANONYMOUS).await?;
        parse_feed(&body).map_err(protocol)
    }

    pub async fn comments(&self, post_id: &str) -> Result<Vec<Comment>, AnalysisError> {
        require_id(post_id, "Post")?;
        let req = build_comments_request(self.transport.base_url(), post_id).map_err(unbuildable)?;
        let body = self.read(req, AuthContext::ANONYMOUS).await?;
        parse_comments(&body).map_err(protocol)
    }

    /// The user's 20 most recent stored analyses, newest first.
    pub async fn my_analyses(&self) -> Result<Vec<AnalysisSummary>, AnalysisError> {
        let req = build_get(self.transport.base_url(), MY_ANALYSES_PATH);
        let body = self.read(req, AuthContext::REQUIRED).await?;
        parse_my_analyses(&body).map_err(protocol)
    }

    /// Returns the new post's id.
    pub async fn share(&self, post: &NewPost) -> Result<String, AnalysisError> {
        if post.content.is_none() && post.analysis_id.is_none() {
            return Err(AnalysisError::Validation(
                "Post must contain content or analysis reference.".into(),
            ));
        }
        let req = build_share_request(self.transport.base_url(), post);
        let ack = self.write(req).await?;
        ack.post_id
            .ok_or_else(|| AnalysisError::Protocol("share response carried no postId".into()))
    }

    pub async fn edit_post(&self, post_id: &str, content: &str) -> Result<(), AnalysisError> {
        require_id(post_id, "Post")?;
        require_text(content, "Content")?;
        let req = build_edit_post_request(self.transport.base_url(), post_id, content)
            .map_err(unbuildable)?;
        self.write(req).await.map(drop)
    }

    /// The backend also drops the post's comments.
    pub async fn delete_post(&self, post_id: &str) -> Result<(), AnalysisError> {
        require_id(post_id, "Post")?;
        let req =
            build_delete_post_request(self.transport.base_url(), post_id).map_err(unbuildable)?;
        self.write(req).await.map(drop)
    }

    /// Flips the user's like; returns whether the post is now liked.
    pub async fn toggle_like(&self, post_id: &str) -> Result<bool, AnalysisError> {
        require_id(post_id, "Post")?;
        let req = build_like_request(self.transport.base_url(), post_id).map_err(unbuildable)?;
        let ack = self.write(req).await?;
        ack.liked
            .ok_or_else(|| AnalysisError::Protocol("like response carried no liked flag".into()))
    }

    pub async fn add_comment(&self, post_id: &str, text: &str) -> Result<(), AnalysisError> {
        require_id(post_id, "Post")?;
        require_text(text, "Comment")?;
        let req = build_add_comment_request(self.transport.base_url(), post_id, text)
            .map_err(unbuildable)?;
        self.write(req).await.map(drop)
    }

    pub async fn edit_comment(&self, comment_id: &str, text: &str) -> Result<(), AnalysisError> {
        require_id(comment_id, "Comment")?;
        require_text(text, "Comment text")?;
        let req = build_edit_comment_request(self.transport.base_url(), comment_id, text)
            .map_err(unbuildable)?;
        self.write(req).await.map(drop)
    }

    pub async fn delete_comment(&self, comment_id: &str) -> Result<(), AnalysisError> {
        require_id(comment_id, "Comment")?;
        let req = build_delete_comment_request(self.transport.base_url(), comment_id)
            .map_err(unbuildable)?;
        self.write(req).await.map(drop)
    }

    async fn read(&self, req: HttpRequest, auth: AuthContext) -> Result<Vec<u8>, AnalysisError> {
        let resp = self
            .transport
            .send(req, auth)
            .await
            .map_err(|e| e.into_analysis(AnalysisError::Submission))?;
        Ok(resp.body)
    }

    async fn write(&self, req: HttpRequest) -> Result<SocialAck, AnalysisError> {
        let what = format!("{} {}", req.method, req.url);
        let body = self.read(req, AuthContext::REQUIRED).await?;
        let ack = parse_social_ack(&body).map_err(protocol)?;
        if !ack.success {
            log::warn!("{what} was not accepted: {:?}", ack.message);
            return Err(AnalysisError::Submission(
                ack.message
                    .unwrap_or_else(|| "the request was not accepted".to_string()),
            ));
        }
        Ok(ack)
    }
}
