// state module: AppState, initialization, and re-exports of submodules.

use anyhow::Result;

use crate::config::PortalConfig;

mod api;
mod auth;
mod invoices;
mod plans;
mod sessions;
mod users;

pub use api::*;
pub use auth::*;
pub use invoices::*;
pub use plans::*;
pub use sessions::*;
pub use users::*;

pub const PAGE_SIZES: [u32; 3] = [10, 20, 50];
pub const DEFAULT_PAGE_SIZE: u32 = 10;

#[derive(Clone)]
pub struct AppState {
    pub config: PortalConfig,
    pub api: ApiClient,
    pub sessions: SessionStore,
}

pub async fn init_state(config: PortalConfig) -> Result<AppState> {
    let api = ApiClient::new(&config.api_url, config.api_timeout)?;
    let sessions = SessionStore::new(config.session_ttl);

    Ok(AppState {
        config,
        api,
        sessions,
    })
}

/// Page number and size as sent to list endpoints: page starts at 1, size is
/// one of [`PAGE_SIZES`].
pub fn normalize_paging(page: Option<u32>, limit: Option<u32>) -> (u32, u32) {
    let page = page.filter(|p| *p >= 1).unwrap_or(1);
    let limit = limit
        .filter(|l| PAGE_SIZES.contains(l))
        .unwrap_or(DEFAULT_PAGE_SIZE);
    (page, limit)
}

pub(crate) fn clean_filter(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let trimmed = v.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}
