//! Assistant-mode tools: safe URL opener, clock, directory analysis

use std::collections::BTreeMap;
use std::path::Path;

use chrono::Local;
use serde::Serialize;
use serde_json::{json, Map, Value};
use url::Url;
use walkdir::WalkDir;

use crate::core::toolbox::{str_arg, ToolBox};
use crate::types::{error_result, unknown_tool, ToolDefinition};

/// Base domains the URL tool is willing to open
pub const SAFE_DOMAINS: &[&str] = &[
    "lmstudio.ai",
    "github.com",
    "google.com",
    "wikipedia.org",
    "weather.com",
    "stackoverflow.com",
    "python.org",
    "docs.python.org",
];

/// System prompt for assistant mode
pub const ASSISTANT_PROMPT: &str = "You are a helpful assistant that can open safe web links, tell the current time, and analyse directory contents. Use these capabilities whenever they might be helpful.";

/// Greeting printed when assistant mode starts
pub const ASSISTANT_GREETING: &str = "Hello! I can help you open safe web links, tell you the current time, and analyse directory contents. What would you like me to do?";

/// Launches a URL somewhere (the system browser in production)
pub type UrlOpener = Box<dyn FnMut(&str) -> std::io::Result<()> + Send>;

/// Tools exposed in assistant mode
pub struct AssistantTools {
    declarations: Vec<ToolDefinition>,
    opener: UrlOpener,
}

impl std::fmt::Debug for AssistantTools {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssistantTools")
            .field("declarations", &self.declarations.len())
            .finish()
    }
}

impl Default for AssistantTools {
    fn default() -> Self {
        Self::new()
    }
}

impl AssistantTools {
    /// Tools that open URLs in the system browser
    pub fn new() -> Self {
        Self::with_opener(Box::new(|url: &str| open::that(url)))
    }

    /// Tools with a custom URL launcher
    pub fn with_opener(opener: UrlOpener) -> Self {
        Self {
            declarations: declarations(),
            opener,
        }
    }
}

impl ToolBox for AssistantTools {
    fn declarations(&self) -> &[ToolDefinition] {
        &self.declarations
    }

    fn call(&mut self, name: &str, args: &Map<String, Value>) -> Value {
        match name {
            "open_safe_url" => match str_arg(args, "url") {
                Some(url) => open_safe_url(url, &mut self.opener),
                None => error_result("Missing required argument: url"),
            },
            "get_current_time" => get_current_time(),
            "analyse_directory" => analyse_directory(str_arg(args, "path").unwrap_or(".")),
            other => {
                tracing::warn!(tool = other, "model called an unknown tool");
                unknown_tool(other)
            }
        }
    }
}

fn declarations() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition::function(
            "open_safe_url",
            "Open a URL in the browser if it's deemed safe",
            json!({
                "type": "object",
                "properties": {
                    "url": {"type": "string", "description": "The URL to open"}
                },
                "required": ["url"]
            }),
        ),
        ToolDefinition::no_args(
            "get_current_time",
            "Get the current system time with timezone information",
        ),
        ToolDefinition::function(
            "analyse_directory",
            "Analyse the contents of a directory, counting files and folders",
            json!({
                "type": "object",
                "properties": {
                    "path": {
                        "type": "string",
                        "description": "The directory path to analyse. Defaults to current directory if not specified."
                    }
                },
                "required": []
            }),
        ),
    ]
}

// =============================================================================
// open_safe_url
// =============================================================================

/// Check a URL against the allow-list; `Ok` carries the normalised URL
pub fn check_url(raw: &str) -> Result<Url, String> {
    let candidate = if raw.starts_with("http://") || raw.starts_with("https://") {
        raw.to_string()
    } else {
        format!("http://{}", raw)
    };

    let invalid = || format!("Invalid URL format: {}", candidate);
    let parsed = Url::parse(&candidate).map_err(|_| invalid())?;
    let host = match parsed.host_str() {
        Some(h) if !h.is_empty() => h.to_lowercase(),
        _ => return Err(invalid()),
    };

    let labels: Vec<&str> = host.split('.').collect();
    let base_domain = labels[labels.len().saturating_sub(2)..].join(".");
    if SAFE_DOMAINS.contains(&base_domain.as_str()) {
        Ok(parsed)
    } else {
        Err(format!("Domain {} not in allowed list", host))
    }
}

/// Open `raw` with `opener` if its base domain is allowed
pub fn open_safe_url(raw: &str, opener: &mut UrlOpener) -> Value {
    let url = match check_url(raw) {
        Ok(url) => url,
        Err(message) => {
            tracing::info!(url = raw, %message, "refused to open url");
            return error_result(message);
        }
    };
    match opener(url.as_str()) {
        Ok(()) => json!({"status": "success", "message": format!("Opened {} in browser", url)}),
        Err(e) => error_result(e.to_string()),
    }
}

// =============================================================================
// get_current_time
// =============================================================================

pub fn get_current_time() -> Value {
    let now = Local::now();
    json!({
        "status": "success",
        "time": now.format("%Y-%m-%d %H:%M:%S %Z").to_string(),
        "timezone": now.offset().to_string(),
        "timestamp": now.timestamp_millis() as f64 / 1000.0,
    })
}

// =============================================================================
// analyse_directory
// =============================================================================

/// Counts gathered by `analyse_directory`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DirectoryStats {
    pub total_files: u64,
    pub total_dirs: u64,
    /// ".rs" → 3, "no_extension" → 1
    pub file_types: BTreeMap<String, u64>,
    pub total_size_bytes: u64,
}

/// Scan the direct entries of `path`; subdirectories only add to the size
pub fn scan_directory(path: &Path) -> std::io::Result<DirectoryStats> {
    let mut stats = DirectoryStats::default();

    for entry in std::fs::read_dir(path)? {
        let entry = entry?;
        let file_type = entry.file_type()?;
        let entry_path = entry.path();

        if entry_path.is_file() {
            stats.total_files += 1;
            let ext = entry_path
                .extension()
                .map(|e| format!(".{}", e.to_string_lossy().to_lowercase()))
                .unwrap_or_else(|| "no_extension".to_string());
            *stats.file_types.entry(ext).or_insert(0) += 1;
            stats.total_size_bytes += entry.metadata().map(|m| m.len()).unwrap_or(0);
        } else if file_type.is_dir() || entry_path.is_dir() {
            stats.total_dirs += 1;
            stats.total_size_bytes += WalkDir::new(&entry_path)
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file())
                .filter_map(|e| e.metadata().ok())
                .map(|m| m.len())
                .sum::<u64>();
        }
    }

    Ok(stats)
}

pub fn analyse_directory(path: &str) -> Value {
    let target = Path::new(path);
    match scan_directory(target) {
        Ok(stats) => {
            let absolute = std::fs::canonicalize(target).unwrap_or_else(|_| target.to_path_buf());
            json!({
                "status": "success",
                "stats": stats,
                "path": absolute.display().to_string(),
            })
        }
        Err(e) => error_result(e.to_string()),
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn recording_opener() -> (UrlOpener, Arc<Mutex<Vec<String>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let opener: UrlOpener = Box::new(move |url: &str| {
            sink.lock().unwrap().push(url.to_string());
            Ok(())
        });
        (opener, seen)
    }

    #[test]
    fn test_allow_list() {
        assert!(check_url("github.com/rust-lang/rust").is_ok());
        assert!(check_url("https://en.wikipedia.org/wiki/Rust").is_ok());
        assert!(check_url("docs.python.org/3/").is_ok());
        assert!(check_url("https://WWW.GOOGLE.COM/search").is_ok());
    }

    #[test]
    fn test_rejects_unknown_domain() {
        let err = check_url("https://evil.com/payload").unwrap_err();
        assert_eq!(err, "Domain evil.com not in allowed list");
    }

    #[test]
    fn test_rejects_lookalike_suffix() {
        // base domain is the last two labels: "github.com.evil.net" → "evil.net"
        assert!(check_url("github.com.evil.net").is_err());
    }

    #[test]
    fn test_rejects_missing_host() {
        let err = check_url("http://").unwrap_err();
        assert!(err.starts_with("Invalid URL format"));
    }

    #[test]
    fn test_open_safe_url_calls_opener() {
        let (mut opener, seen) = recording_opener();
        let result = open_safe_url("github.com", &mut opener);
        assert_eq!(result["status"], "success");
        assert_eq!(seen.lock().unwrap().as_slice(), ["http://github.com/"]);
    }

    #[test]
    fn test_open_unsafe_url_never_opens() {
        let (mut opener, seen) = recording_opener();
        let result = open_safe_url("evil.com", &mut opener);
        assert_eq!(result["status"], "error");
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn test_missing_url_argument() {
        let (opener, seen) = recording_opener();
        let mut tools = AssistantTools::with_opener(opener);
        let result = tools.call("open_safe_url", &Map::new());
        assert_eq!(result["status"], "error");
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn test_current_time_shape() {
        let result = get_current_time();
        assert_eq!(result["status"], "success");
        assert!(result["time"].as_str().unwrap().len() >= 19);
        assert!(result["timestamp"].as_f64().unwrap() > 1.6e9);
    }

    #[test]
    fn test_analyse_missing_directory() {
        let result = analyse_directory("/definitely/not/here/lmswitch");
        assert_eq!(result["status"], "error");
    }

    #[test]
    fn test_unknown_tool() {
        let (opener, _) = recording_opener();
        let mut tools = AssistantTools::with_opener(opener);
        let result = tools.call("rm_rf", &Map::new());
        assert_eq!(result["message"], "Unknown function: rm_rf");
    }

    #[test]
    fn test_declarations() {
        let (opener, _) = recording_opener();
        let tools = AssistantTools::with_opener(opener);
        let names: Vec<&str> = tools.declarations().iter().map(|d| d.name()).collect();
        assert_eq!(names, ["open_safe_url", "get_current_time", "analyse_directory"]);
    }
}
