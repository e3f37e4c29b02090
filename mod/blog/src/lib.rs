//! Blog module — accounts, follow graph, posts, engagement, notifications.
//!
//! # Resources
//!
//! - **User** — registered account with handle, profile and photo
//! - **FollowEdge** — directed subscription between two accounts
//! - **Post** — authored content, optionally forwarding another post and
//!   optionally attached to an audio track
//! - **LikeEdge / Comment** — engagement rows feeding denormalized counters
//! - **Music** — uploaded audio asset shared by posts that reference it
//! - **Session** — JWT issuance record
//!
//! # Usage
//!
//! ```ignore
//! use blog::{BlogModule, service::BlogConfig};
//!
//! let module = BlogModule::new(sql, blob, BlogConfig::default())?;
//! let router = module.routes(); // Mount under /blog
//! ```

pub mod model;
pub mod service;
pub mod api;

use std::sync::Arc;

use axum::Router;

use minstrel_core::Module;

use crate::service::{BlogConfig, BlogService};

/// Blog module implementing the Module trait.
///
/// Holds the BlogService and provides HTTP routes for all blog endpoints.
pub struct BlogModule {
    service: Arc<BlogService>,
}

impl BlogModule {
    /// Create a new BlogModule.
    pub fn new(
        sql: Arc<dyn minstrel_sql::SQLStore>,
        blob: Arc<dyn minstrel_blob::BlobStore>,
        config: BlogConfig,
    ) -> Result<Self, minstrel_core::ServiceError> {
        let service = BlogService::new(sql, blob, config)
            .map_err(minstrel_core::ServiceError::from)?;
        Ok(Self { service })
    }

    /// Get a reference to the underlying BlogService.
    pub fn service(&self) -> &Arc<BlogService> {
        &self.service
    }
}

impl Module for BlogModule {
    fn name(&self) -> &str {
        "blog"
    }

    fn routes(&self) -> Router {
        api::build_router(self.service.clone())
    }
}
