use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub port: u16,
    pub search_api_base_url: String,
    pub search_api_token: String,
    pub site_url: String,
    /// Configured brand terms, case-folded. Queries containing any of these
    /// are excluded from analysis and never reach the scoring pipeline.
    pub brand_terms: Vec<String>,
    pub metrics_data_dir: String,
    pub exclusions_path: String,
    pub days_back: i64,
    pub row_limit: u32,
    pub min_impressions: i64,
    pub max_position: f64,
    pub min_query_length: usize,
    pub analysis_cache_ttl_secs: u64,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number between 1-65535"))?,
            search_api_base_url: std::env::var("SEARCH_API_BASE_URL")
                .map_err(|_| anyhow::anyhow!("SEARCH_API_BASE_URL environment variable required"))
                .and_then(|url| {
                    if url.trim().is_empty() {
                        anyhow::bail!("SEARCH_API_BASE_URL cannot be empty");
                    }
                    if !url.starts_with("http://") && !url.starts_with("https://") {
                        anyhow::bail!("SEARCH_API_BASE_URL must start with http:// or https://");
                    }
                    Ok(url)
                })?,
            search_api_token: std::env::var("SEARCH_API_TOKEN")
                .map_err(|_| anyhow::anyhow!("SEARCH_API_TOKEN environment variable required"))
                .and_then(|token| {
                    if token.trim().is_empty() {
                        anyhow::bail!("SEARCH_API_TOKEN cannot be empty");
                    }
                    Ok(token)
                })?,
            site_url: std::env::var("SITE_URL")
                .map_err(|_| anyhow::anyhow!("SITE_URL environment variable required"))
                .and_then(|site| {
                    if site.trim().is_empty() {
                        anyhow::bail!("SITE_URL cannot be empty");
                    }
                    Ok(site)
                })?,
            brand_terms: std::env::var("BRAND_TERMS")
                .map(|raw| {
                    raw.split(',')
                        .map(|term| term.trim().to_lowercase())
                        .filter(|term| !term.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
            metrics_data_dir: std::env::var("METRICS_DATA_DIR")
                .unwrap_or_else(|_| "keyword_metrics_data".to_string()),
            exclusions_path: std::env::var("EXCLUSIONS_PATH")
                .unwrap_or_else(|_| "deleted_keywords.txt".to_string()),
            days_back: std::env::var("DAYS_BACK")
                .unwrap_or_else(|_| "90".to_string())
                .parse()
                .ok()
                .filter(|days| (1..=540).contains(days))
                .ok_or_else(|| anyhow::anyhow!("DAYS_BACK must be a number between 1 and 540"))?,
            row_limit: std::env::var("ROW_LIMIT")
                .unwrap_or_else(|_| "25000".to_string())
                .parse()
                .ok()
                .filter(|limit| (1..=25_000).contains(limit))
                .ok_or_else(|| anyhow::anyhow!("ROW_LIMIT must be a number between 1 and 25000"))?,
            min_impressions: std::env::var("MIN_IMPRESSIONS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("MIN_IMPRESSIONS must be a non-negative number"))?,
            max_position: std::env::var("MAX_POSITION")
                .unwrap_or_else(|_| "100".to_string())
                .parse()
                .ok()
                .filter(|pos: &f64| pos.is_finite() && *pos >= 1.0)
                .ok_or_else(|| anyhow::anyhow!("MAX_POSITION must be a number >= 1"))?,
            min_query_length: std::env::var("MIN_QUERY_LENGTH")
                .unwrap_or_else(|_| "3".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("MIN_QUERY_LENGTH must be a non-negative number"))?,
            analysis_cache_ttl_secs: std::env::var("ANALYSIS_CACHE_TTL_SECS")
                .unwrap_or_else(|_| "900".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("ANALYSIS_CACHE_TTL_SECS must be a number"))?,
        };

        // Log successful configuration load (without sensitive values)
        tracing::info!("Configuration loaded successfully");
        tracing::debug!("Search API base URL: {}", config.search_api_base_url);
        tracing::debug!("Target site: {}", config.site_url);
        tracing::debug!(
            "Analysis window: {} days, row limit {}",
            config.days_back,
            config.row_limit
        );
        if config.brand_terms.is_empty() {
            tracing::warn!("No BRAND_TERMS configured; brand queries will not be excluded");
        } else {
            tracing::debug!("Brand terms: {:?}", config.brand_terms);
        }
        tracing::debug!("Server Port: {}", config.port);

        Ok(config)
    }
}
