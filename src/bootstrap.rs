//! Wiring from configuration to a ready-to-serve application state

use crate::answer::AnswerService;
use crate::catalog::TaskCatalog;
use crate::config::DeskConfig;
use crate::error::DeskResult;
use crate::resolver::{AnswerResolver, HttpResolver, HttpResolverConfig, StaticResolver};
use crate::server::AppState;
use crate::uploads::UploadStore;
use crate::catalog_span;
use std::sync::Arc;
use tracing::{info, warn};

/// Resolver from configuration: HTTP when a URL is set, otherwise a static
/// resolver with no answers (computed tasks then fail).
pub fn build_resolver(config: &DeskConfig) -> Arc<dyn AnswerResolver> {
    match &config.resolver.url {
        Some(url) => {
            let resolver_config = HttpResolverConfig::new(url.clone())
                .with_timeout_ms(config.resolver.timeout_ms)
                .with_retry_attempts(config.resolver.retry_attempts);
            Arc::new(HttpResolver::new(resolver_config))
        }
        None => {
            warn!(
                computed_tasks = config.resolver.computed_tasks.len(),
                "No resolver URL configured; computed tasks will fail"
            );
            Arc::new(StaticResolver::new())
        }
    }
}

/// Load the task table and assemble handler state
pub fn build_state(config: &DeskConfig) -> DeskResult<Arc<AppState>> {
    let catalog = {
        let span = catalog_span!(path = %config.tasks.table_path.display());
        let _guard = span.enter();
        TaskCatalog::load(&config.tasks.table_path, config.tasks.sheet.as_deref())?
    };

    let status = catalog.status();
    info!(
        entries = status.entries,
        answers = status.answers,
        "Task catalog ready"
    );

    let resolver = build_resolver(config);
    let resolver_name = resolver.name().to_string();

    let service = Arc::new(AnswerService::new(
        Arc::new(catalog),
        resolver,
        config.resolver.computed_tasks.clone(),
    ));

    Ok(Arc::new(AppState::new(
        service,
        UploadStore::new(config.uploads.dir.clone(), config.uploads.max_bytes),
        config.server.index_html.clone(),
        resolver_name,
        config.uploads.max_bytes,
    )))
}
