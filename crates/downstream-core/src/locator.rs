//! Build history search.
//!
//! [`BuildLocator`] walks a repository's build history newest-first and stops
//! at the first build matching the target branch and the [`MatchCriteria`].
//! The scan is bounded to `max_pages` pages of `page_size` builds.

use std::sync::Arc;

use tracing::{debug, info};

use crate::client::{BuildClient, ListOptions};
use crate::error::{DownstreamError, DownstreamResult};
use crate::model::{LocatedBuild, MatchCriteria};
use crate::target::Target;

pub const DEFAULT_PAGE_SIZE: u32 = 100;
pub const DEFAULT_MAX_PAGES: u32 = 5;

pub struct BuildLocator {
    client: Arc<dyn BuildClient>,
    page_size: u32,
    max_pages: u32,
}

impl BuildLocator {
    pub fn new(client: Arc<dyn BuildClient>) -> Self {
        Self {
            client,
            page_size: DEFAULT_PAGE_SIZE,
            max_pages: DEFAULT_MAX_PAGES,
        }
    }

    pub fn with_paging(mut self, page_size: u32, max_pages: u32) -> Self {
        self.page_size = page_size.max(1);
        self.max_pages = max_pages.max(1);
        self
    }

    /// Find the newest build of `target` accepted by `criteria`.
    ///
    /// Returns [`DownstreamError::NotFound`] when the reachable history has no
    /// match and [`DownstreamError::Transport`] on any API failure.
    pub async fn locate(
        &self,
        target: &Target,
        criteria: &MatchCriteria,
    ) -> DownstreamResult<LocatedBuild> {
        info!(
            "Listing last {} builds for {}",
            self.page_size.saturating_mul(self.max_pages),
            target.full_name()
        );

        let mut opts = ListOptions {
            branch: Some(target.branch().to_string()),
            event: criteria.event,
            page: 1,
            per_page: self.page_size,
        };

        for _ in 0..self.max_pages {
            let page = self
                .client
                .list_builds(target.org(), target.repo(), &opts)
                .await
                .map_err(|e| {
                    DownstreamError::transport(
                        format!("unable to list builds for {}", target.full_name()),
                        e,
                    )
                })?;
            debug!(
                repo = %target.full_name(),
                page = opts.page,
                count = page.builds.len(),
                next_page = page.next_page,
                "scanning build page"
            );

            if let Some(found) = page
                .builds
                .iter()
                .find(|b| b.number != 0 && criteria.accepts(target.branch(), b))
            {
                debug!(
                    repo = %target.full_name(),
                    number = found.number,
                    status = %found.status,
                    "found matching build"
                );
                return Ok(LocatedBuild {
                    number: found.number,
                    status: found.parsed_status(),
                });
            }

            if page.next_page == 0 {
                break;
            }
            opts.page = page.next_page;
        }

        Err(DownstreamError::NotFound {
            repo: target.full_name(),
            branch: target.branch().to_string(),
            event: criteria
                .event
                .map(|e| e.to_string())
                .unwrap_or_else(|| "any".to_string()),
            statuses: criteria.statuses.to_string(),
        })
    }
}
