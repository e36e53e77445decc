use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::PagerConfig;
use crate::cursor;
use crate::feed::{FeedClient, FeedError};
use crate::model::{self, ModelInput};
use crate::render::{self, PagerView};
use crate::store::{KeyValueStore, PostCache, StoreError};
use crate::window;

#[derive(Debug, Error)]
pub enum PagerError {
    #[error(transparent)]
    Feed(#[from] FeedError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// What `init` ended up doing.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InitOutcome {
    pub skipped: bool,
    pub rendered_from_cache: bool,
    pub fetched_snapshot: bool,
    pub fetched_post_dates: bool,
    pub pager_removed: bool,
}

#[derive(Clone, Debug)]
struct RenderState {
    total_posts: usize,
    post_dates: Vec<String>,
    current_page: usize,
}

/// Wires the cache, the feed and the view together for one page load.
pub struct Pager<S, V> {
    config: PagerConfig,
    feed: FeedClient,
    cache: PostCache<S>,
    view: V,
    state: Option<RenderState>,
}

impl<S: KeyValueStore, V: PagerView> Pager<S, V> {
    pub fn new(config: PagerConfig, feed: FeedClient, store: S, view: V) -> Self {
        Self {
            config,
            feed,
            cache: PostCache::new(store),
            view,
            state: None,
        }
    }

    pub fn config(&self) -> &PagerConfig {
        &self.config
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn cache(&self) -> &PostCache<S> {
        &self.cache
    }

    pub fn current_page(&self) -> Option<usize> {
        self.state.as_ref().map(|s| s.current_page)
    }

    /// Renders from cache when possible, then checks the feed and re-renders
    /// if the blog changed. Feed failures are returned as-is; whatever was
    /// already rendered stays in place.
    pub async fn init(&mut self) -> Result<InitOutcome, PagerError> {
        let mut outcome = InitOutcome::default();

        if !self.view.has_containers() {
            debug!("pager containers not found, nothing to do");
            outcome.skipped = true;
            return Ok(outcome);
        }

        if let Some(max_results) = self.view.pager_link_max_results() {
            debug!("pager link carries max-results={max_results}");
            self.config.max_results = Some(max_results);
        }

        let Some(page_size) = self.config.page_size(self.view.entry_count()) else {
            warn!("page size unknown (no max-results and no entries on page), nothing to do");
            outcome.skipped = true;
            return Ok(outcome);
        };

        let query = self.config.query().map(str::to_string);
        let label = self.config.label().map(str::to_string);
        let stored = self.cache.get(query.as_deref(), label.as_deref());

        if stored.has_dates() {
            info!(
                "rendering {} cached posts ({} dates)",
                stored.total_posts,
                stored.post_dates.len()
            );
            self.render(stored.total_posts, stored.post_dates.clone(), page_size, None);
            outcome.rendered_from_cache = true;

            if !self.config.check_for_updates {
                outcome.pager_removed = self.remove_if_single_page(page_size, stored.total_posts);
                return Ok(outcome);
            }
        }

        let snapshot = self
            .feed
            .fetch_snapshot(query.as_deref(), label.as_deref(), &mut self.cache)
            .await?;
        outcome.fetched_snapshot = true;

        let stale = stored.blog_updated.as_deref() != Some(snapshot.blog_updated.as_str());
        if stale || stored.post_dates.is_empty() {
            debug!(
                "refetching post dates (cached updated {:?}, feed updated {})",
                stored.blog_updated, snapshot.blog_updated
            );
            let ledger = self
                .feed
                .fetch_post_dates(&self.config, snapshot.total_posts, &mut self.cache)
                .await?;
            self.render(ledger.total_posts, ledger.post_dates, page_size, None);
            outcome.fetched_post_dates = true;
        } else {
            debug!("cached post dates are current");
        }

        let known_total = self
            .state
            .as_ref()
            .map(|s| s.total_posts)
            .unwrap_or(snapshot.total_posts);
        outcome.pager_removed = self.remove_if_single_page(page_size, known_total);
        Ok(outcome)
    }

    /// Re-renders around `target` using the post dates already known.
    /// Returns `false` when nothing has been rendered yet.
    pub fn jump(&mut self, target: usize) -> bool {
        let Some(state) = self.state.clone() else {
            return false;
        };
        let Some(page_size) = self.config.page_size(self.view.entry_count()) else {
            return false;
        };
        debug!("jumping to page {target}");
        self.render(state.total_posts, state.post_dates, page_size, Some(target));
        true
    }

    fn render(&mut self, total_posts: usize, post_dates: Vec<String>, page_size: usize, page: Option<usize>) {
        let total_pages = window::total_pages(total_posts, page_size);
        let current_page =
            page.unwrap_or_else(|| cursor::resolve_current_page(&self.config, &post_dates, page_size));

        let entries = model::build_model(ModelInput {
            current_page,
            total_pages,
            total_visible_numbers: self.config.total_visible_numbers,
            interactive_ellipsis: self.config.enable_interactive_ellipsis,
        });
        let nodes = render::render_nodes(&self.config, &entries, &post_dates, page_size);
        self.view.replace_numbers(nodes);

        self.state = Some(RenderState {
            total_posts,
            post_dates,
            current_page,
        });
    }

    fn remove_if_single_page(&mut self, page_size: usize, total_posts: usize) -> bool {
        if page_size >= total_posts {
            info!("{total_posts} posts fit on one page of {page_size}, removing pager");
            self.view.remove_pager();
            return true;
        }
        false
    }
}
