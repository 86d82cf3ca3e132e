use std::path::PathBuf;
use std::sync::OnceLock;

/// XDG-compliant directory layout for moodlog.
///
/// On Linux this follows the XDG Base Directory Specification:
///   Config:  $XDG_CONFIG_HOME/moodlog  (~/.config/moodlog)
///   Data:    $XDG_DATA_HOME/moodlog    (~/.local/share/moodlog)
///
/// On macOS both live under ~/Library/Application Support/moodlog.
/// The resolved base paths are cached in OnceLock cells.

static DATA_DIR: OnceLock<PathBuf> = OnceLock::new();
static CONFIG_DIR: OnceLock<PathBuf> = OnceLock::new();

/// Root data directory: $XDG_DATA_HOME/moodlog
pub fn data_dir() -> &'static PathBuf {
    DATA_DIR.get_or_init(|| {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("moodlog")
    })
}

/// Root config directory: $XDG_CONFIG_HOME/moodlog
pub fn config_dir() -> &'static PathBuf {
    CONFIG_DIR.get_or_init(|| {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("moodlog")
    })
}

/// Config file path: <config_dir>/config.toml
pub fn config_file() -> PathBuf {
    config_dir().join("config.toml")
}

/// Reports directory: <data_dir>/reports
pub fn reports_dir() -> PathBuf {
    data_dir().join("reports")
}

/// Database path: <data_dir>/moodlog.db
pub fn db_path() -> PathBuf {
    data_dir().join("moodlog.db")
}

/// Report file for a user on a date: <reports_dir>/<user>_<date>.<ext>
pub fn report_path(user: &str, date: &chrono::NaiveDate, ext: &str) -> PathBuf {
    reports_dir().join(format!("{}_{date}.{ext}", sanitize(user)))
}

/// Keep file names portable: bytes outside [A-Za-z0-9_-] are written as
/// `%XX`, so distinct users never share a report file.
fn sanitize(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
            out.push(c);
        } else {
            let mut buf = [0u8; 4];
            for byte in c.encode_utf8(&mut buf).bytes() {
                out.push_str(&format!("%{byte:02X}"));
            }
        }
    }
    out
}
