//! Location and maintenance of the on-disk quote cache.

use hobart_data::{CacheStats, DataError, SqliteCache};
use std::path::{Path, PathBuf};

/// Platform cache directory for Hobart.
///
/// - Linux: `~/.cache/hobart/`
/// - macOS: `~/Library/Caches/hobart/`
/// - Windows: `%LOCALAPPDATA%\hobart\`
pub(crate) fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("hobart")
}

/// Default cache database path.
pub(crate) fn default_cache_path() -> PathBuf {
    default_cache_dir().join("quotes.db")
}

/// Open the cache at `path`, creating its directory if needed.
pub(crate) fn open_cache(path: &Path) -> Result<SqliteCache, DataError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    SqliteCache::new(path)
}

/// Print cache statistics.
pub(crate) fn print_stats(path: &Path, stats: &CacheStats) {
    println!("Cache: {}", path.display());
    println!("  Quotes:  {}", stats.total_quotes);
    println!("  Symbols: {}", stats.unique_symbols);
    println!("  Windows: {}", stats.windows);
    match (stats.first_date, stats.last_date) {
        (Some(first), Some(last)) => println!("  Range:   {first} to {last}"),
        _ => println!("  Range:   (empty)"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_path_is_namespaced() {
        let path = default_cache_path();
        assert!(path.ends_with("hobart/quotes.db"));
    }

    #[test]
    fn test_open_creates_directory() {
        let dir = std::env::temp_dir().join(format!("hobart-cache-test-{}", std::process::id()));
        let path = dir.join("nested").join("quotes.db");

        let cache = open_cache(&path).unwrap();
        assert_eq!(cache.stats().unwrap().total_quotes, 0);
        assert!(path.exists());

        drop(cache);
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
