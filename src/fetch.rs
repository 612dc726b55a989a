use std::{
    cell::Cell,
    time::{Duration, Instant},
};

use anyhow::Context;
use url::Url;

use crate::{
    cache::{Cache, CacheResult},
    config::HttpConfig,
};

/// Blocking page fetcher in front of the page cache.
pub struct Fetcher {
    agent: ureq::Agent,
    user_agent: String,
    cache: Cache,
    delay: Duration,
    last_request: Cell<Option<Instant>>,
}

impl Fetcher {
    pub fn new(http: &HttpConfig, cache: Cache) -> Self {
        let cfg = ureq::Agent::config_builder()
            .timeout_connect(Some(Duration::from_secs(http.connect_timeout_secs)))
            .timeout_global(Some(Duration::from_secs(http.timeout_secs)))
            .build();
        Fetcher {
            agent: ureq::Agent::new_with_config(cfg),
            user_agent: http.user_agent.clone(),
            cache,
            delay: Duration::from_millis(http.delay_ms),
            last_request: Cell::new(None),
        }
    }

    pub fn cache(&self) -> &Cache {
        &self.cache
    }

    /// Page body for `url`, from the cache when a fresh copy exists.
    pub fn get(&self, url: &Url) -> anyhow::Result<String> {
        let key = url.as_str();
        if let CacheResult::Hit(body) = self.cache.get(key) {
            return Ok(body);
        }

        self.wait_turn();
        tracing::info!(%url, "fetching");
        let res = self
            .agent
            .get(key)
            .header("User-Agent", self.user_agent.as_str())
            .call();
        // failed requests count towards the delay too
        self.last_request.set(Some(Instant::now()));
        let res = res.with_context(|| format!("failed request for URL {url}"))?;

        let body = res
            .into_body()
            .read_to_string()
            .with_context(|| format!("failed to read body of {url}"))?;
        self.cache.set(key, &body);
        Ok(body)
    }

    fn wait_turn(&self) {
        if let Some(last) = self.last_request.get() {
            let elapsed = last.elapsed();
            if elapsed < self.delay {
                std::thread::sleep(self.delay - elapsed);
            }
        }
    }
}
