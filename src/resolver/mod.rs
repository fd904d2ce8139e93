//! Virtual resource resolution for the `app`, `font` and `cursor` schemes
//!
//! Every resolved path stays inside the asset root of its scheme. Traversal is
//! rejected lexically first, then the canonical path is checked against the
//! canonical root so symlinks cannot lead outside either.

pub mod protocol;

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use url::Url;

use crate::deployment::{AssetKind, Deployment};
use crate::error::ResolveError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VirtualScheme {
    App,
    Font,
    Cursor,
}

impl VirtualScheme {
    pub const ALL: [VirtualScheme; 3] =
        [VirtualScheme::App, VirtualScheme::Font, VirtualScheme::Cursor];

    pub fn as_str(&self) -> &'static str {
        match self {
            VirtualScheme::App => "app",
            VirtualScheme::Font => "font",
            VirtualScheme::Cursor => "cursor",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "app" => Some(VirtualScheme::App),
            "font" => Some(VirtualScheme::Font),
            "cursor" => Some(VirtualScheme::Cursor),
            _ => None,
        }
    }

    /// Base URL the webview reaches this scheme at. Windows and Android
    /// serve custom schemes through `http://<scheme>.localhost`.
    pub fn base_url(&self) -> String {
        if cfg!(any(windows, target_os = "android")) {
            format!("http://{}.localhost/", self.as_str())
        } else {
            format!("{}://localhost/", self.as_str())
        }
    }

    pub fn asset_kind(&self) -> AssetKind {
        match self {
            VirtualScheme::App => AssetKind::App,
            VirtualScheme::Font => AssetKind::Font,
            VirtualScheme::Cursor => AssetKind::Cursor,
        }
    }
}

/// One resource load issued by the webview
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VirtualRequest {
    pub scheme: VirtualScheme,
    pub relative_path: String,
}

impl VirtualRequest {
    /// Map a request URL to a scheme and a still-encoded relative path.
    ///
    /// `app://localhost/a/b` and `http://app.localhost/a/b` both give `a/b`;
    /// `app://a/b` keeps the host as first segment.
    pub fn from_url(raw: &str) -> Option<Self> {
        let url = Url::parse(raw).ok()?;
        let host = url.host_str().unwrap_or("");

        let (scheme, prefix) = match url.scheme() {
            "http" | "https" => {
                let name = host.strip_suffix(".localhost")?;
                (VirtualScheme::parse(name)?, "")
            }
            other => {
                let scheme = VirtualScheme::parse(other)?;
                if host.is_empty() || host == "localhost" {
                    (scheme, "")
                } else {
                    (scheme, host)
                }
            }
        };

        let path = url.path().trim_start_matches('/');
        let relative_path = match (prefix.is_empty(), path.is_empty()) {
            (true, _) => path.to_string(),
            (false, true) => prefix.to_string(),
            (false, false) => format!("{}/{}", prefix, path),
        };

        Some(Self {
            scheme,
            relative_path,
        })
    }
}

/// Turn a requested relative path into a path that cannot leave its root.
///
/// Segments are percent-decoded; `.` and empty segments are dropped and `..`
/// pops a segment. Popping past the root, a decoded separator or a drive
/// prefix is an `AccessDenied`.
pub fn normalize_relative(relative: &str) -> Result<PathBuf, ResolveError> {
    let mut segments: Vec<String> = Vec::new();

    for raw in relative.split(['/', '\\']) {
        if raw.is_empty() || raw == "." {
            continue;
        }

        let decoded = urlencoding::decode(raw)
            .map_err(|e| ResolveError::failed(relative, format!("invalid url encoding: {}", e)))?;

        if decoded.contains('\0') {
            return Err(ResolveError::failed(relative, "path contains a NUL byte"));
        }
        if decoded.contains(['/', '\\', ':']) {
            return Err(ResolveError::AccessDenied(relative.to_string()));
        }

        match decoded.as_ref() {
            "" | "." => continue,
            ".." => {
                if segments.pop().is_none() {
                    return Err(ResolveError::AccessDenied(relative.to_string()));
                }
            }
            _ => segments.push(decoded.into_owned()),
        }
    }

    Ok(segments.iter().collect())
}

/// Join `relative` onto `root` and prove the target exists inside it.
/// Directories are accepted; see [`resolve_file_under`] for files only.
pub(crate) fn contained_path(root: &Path, relative: &str) -> Result<PathBuf, ResolveError> {
    let normalized = normalize_relative(relative)?;
    let candidate = root.join(&normalized);
    let shown = candidate.to_string_lossy().to_string();

    let canonical_root = root.canonicalize().map_err(|e| match e.kind() {
        ErrorKind::NotFound => ResolveError::NotFound(shown.clone()),
        _ => ResolveError::failed(shown.clone(), e),
    })?;
    let canonical = candidate.canonicalize().map_err(|e| match e.kind() {
        ErrorKind::NotFound => ResolveError::NotFound(shown.clone()),
        _ => ResolveError::failed(shown.clone(), e),
    })?;

    // Prevent symlink escape: canonical path must remain within root
    if !canonical.starts_with(&canonical_root) {
        return Err(ResolveError::AccessDenied(relative.to_string()));
    }

    Ok(candidate)
}

pub(crate) fn resolve_file_under(root: &Path, relative: &str) -> Result<PathBuf, ResolveError> {
    let path = contained_path(root, relative)?;
    if !path.is_file() {
        return Err(ResolveError::NotFound(path.to_string_lossy().to_string()));
    }
    Ok(path)
}

/// Resolver for the three virtual schemes
#[derive(Debug, Clone)]
pub struct VirtualResourceResolver {
    app_root: PathBuf,
    font_root: PathBuf,
    cursor_root: PathBuf,
    entry_document: String,
}

impl VirtualResourceResolver {
    pub fn new(deployment: &Deployment, entry_document: &str) -> Self {
        let root = |scheme: VirtualScheme| deployment.root(scheme.asset_kind()).path.clone();
        Self {
            app_root: root(VirtualScheme::App),
            font_root: root(VirtualScheme::Font),
            cursor_root: root(VirtualScheme::Cursor),
            entry_document: entry_document.to_string(),
        }
    }

    pub fn root(&self, scheme: VirtualScheme) -> &Path {
        match scheme {
            VirtualScheme::App => &self.app_root,
            VirtualScheme::Font => &self.font_root,
            VirtualScheme::Cursor => &self.cursor_root,
        }
    }

    pub fn entry_document(&self) -> &str {
        &self.entry_document
    }

    pub fn resolve(
        &self,
        scheme: VirtualScheme,
        relative_path: &str,
    ) -> Result<PathBuf, ResolveError> {
        let root = self.root(scheme);

        // Bare app:// loads the entry document
        let relative_path = if scheme == VirtualScheme::App
            && normalize_relative(relative_path).is_ok_and(|p| p.as_os_str().is_empty())
        {
            self.entry_document.as_str()
        } else {
            relative_path
        };

        let result = resolve_file_under(root, relative_path);
        match &result {
            Ok(path) => info!(
                "Resolved {}://{} under {:?} -> {:?}",
                scheme.as_str(),
                relative_path,
                root,
                path
            ),
            Err(e) => warn!(
                "Failed to resolve {}://{} under {:?}: {}",
                scheme.as_str(),
                relative_path,
                root,
                e
            ),
        }
        result
    }

    pub fn resolve_request(&self, request: &VirtualRequest) -> Result<PathBuf, ResolveError> {
        self.resolve(request.scheme, &request.relative_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HostConfig;
    use crate::deployment::DeploymentMode;
    use std::fs;

    fn fixture(mode: DeploymentMode) -> (tempfile::TempDir, VirtualResourceResolver) {
        let dir = tempfile::tempdir().unwrap();
        let config = HostConfig::default();
        let deployment = Deployment::from_base(mode, dir.path(), &config);

        fs::create_dir_all(deployment.font_root.path.join("sub")).unwrap();
        fs::create_dir_all(&deployment.cursor_root.path).unwrap();
        fs::write(deployment.app_root.path.join("index.html"), "<html></html>").unwrap();
        fs::write(deployment.app_root.path.join("main page.css"), "body{}").unwrap();
        fs::write(deployment.font_root.path.join("sub").join("Sans.ttf"), b"font").unwrap();
        fs::write(deployment.cursor_root.path.join("text.ani"), b"RIFF").unwrap();
        // Outside every root
        fs::write(dir.path().join("secret.txt"), "secret").unwrap();

        let resolver = VirtualResourceResolver::new(&deployment, &config.entry_document);
        (dir, resolver)
    }

    #[test]
    fn test_request_from_url_forms() {
        let request = VirtualRequest::from_url("app://localhost/css/main.css").unwrap();
        assert_eq!(request.scheme, VirtualScheme::App);
        assert_eq!(request.relative_path, "css/main.css");

        let request = VirtualRequest::from_url("font://sub/Sans.ttf").unwrap();
        assert_eq!(request.scheme, VirtualScheme::Font);
        assert_eq!(request.relative_path, "sub/Sans.ttf");

        let request = VirtualRequest::from_url("cursor://normal.ani").unwrap();
        assert_eq!(request.scheme, VirtualScheme::Cursor);
        assert_eq!(request.relative_path, "normal.ani");

        let request = VirtualRequest::from_url("http://font.localhost/Sans.ttf?v=2").unwrap();
        assert_eq!(request.scheme, VirtualScheme::Font);
        assert_eq!(request.relative_path, "Sans.ttf");

        assert!(VirtualRequest::from_url("https://example.com/index.html").is_none());
        assert!(VirtualRequest::from_url("ftp://localhost/index.html").is_none());
    }

    #[test]
    fn test_base_url_is_intercepted_on_this_platform() {
        for scheme in VirtualScheme::ALL {
            let request = VirtualRequest::from_url(&format!("{}normal.ani", scheme.base_url()))
                .unwrap();
            assert_eq!(request.scheme, scheme);
            assert_eq!(request.relative_path, "normal.ani");
        }
    }

    #[test]
    fn test_normalize_relative() {
        assert_eq!(normalize_relative("a/./b//c").unwrap(), PathBuf::from("a/b/c"));
        assert_eq!(normalize_relative("a/b/../c").unwrap(), PathBuf::from("a/c"));
        assert_eq!(normalize_relative("/etc/passwd").unwrap(), PathBuf::from("etc/passwd"));
        assert_eq!(normalize_relative("main%20page.css").unwrap(), PathBuf::from("main page.css"));
        assert_eq!(normalize_relative("").unwrap(), PathBuf::new());
    }

    #[test]
    fn test_normalize_rejects_escapes() {
        for path in [
            "..",
            "../secret.txt",
            "a/../../secret.txt",
            "..\\secret.txt",
            "%2e%2e/secret.txt",
            "a%2f..%2f..%2fsecret.txt",
            "C:\\Windows\\win.ini",
            "c:/windows",
        ] {
            assert!(
                matches!(normalize_relative(path), Err(ResolveError::AccessDenied(_))),
                "{} should be denied",
                path
            );
        }

        assert!(matches!(normalize_relative("a%00b"), Err(ResolveError::Failed { .. })));
    }

    #[test]
    fn test_traversal_never_escapes_any_root() {
        let (_dir, resolver) = fixture(DeploymentMode::Packaged);
        for scheme in VirtualScheme::ALL {
            for path in [
                "../secret.txt",
                "../../secret.txt",
                "../../../secret.txt",
                "x/../../secret.txt",
            ] {
                match resolver.resolve(scheme, path) {
                    Ok(resolved) => assert!(resolved.starts_with(resolver.root(scheme))),
                    Err(e) => assert!(
                        matches!(e, ResolveError::AccessDenied(_) | ResolveError::NotFound(_)),
                        "unexpected {:?}",
                        e
                    ),
                }
            }
        }
    }

    #[test]
    fn test_resolves_existing_files_exactly() {
        let (_dir, resolver) = fixture(DeploymentMode::Development);

        assert_eq!(
            resolver.resolve(VirtualScheme::Font, "sub/Sans.ttf").unwrap(),
            resolver.root(VirtualScheme::Font).join("sub").join("Sans.ttf")
        );
        assert_eq!(
            resolver.resolve(VirtualScheme::App, "main%20page.css").unwrap(),
            resolver.root(VirtualScheme::App).join("main page.css")
        );
        assert_eq!(
            resolver.resolve(VirtualScheme::App, "").unwrap(),
            resolver.root(VirtualScheme::App).join("index.html")
        );
    }

    #[test]
    fn test_mode_changes_only_the_root_prefix() {
        let (packaged_dir, packaged) = fixture(DeploymentMode::Packaged);
        let (dev_dir, dev) = fixture(DeploymentMode::Development);

        let a = packaged.resolve(VirtualScheme::Cursor, "text.ani").unwrap();
        let b = dev.resolve(VirtualScheme::Cursor, "text.ani").unwrap();

        assert_eq!(
            a.strip_prefix(packaged_dir.path()).unwrap(),
            b.strip_prefix(dev_dir.path()).unwrap()
        );
    }

    #[test]
    fn test_missing_cursor_does_not_affect_fonts() {
        let (_dir, resolver) = fixture(DeploymentMode::Packaged);

        assert!(matches!(
            resolver.resolve(VirtualScheme::Cursor, "normal.ani"),
            Err(ResolveError::NotFound(_))
        ));
        assert!(resolver.resolve(VirtualScheme::Font, "sub/Sans.ttf").is_ok());
    }

    #[test]
    fn test_directories_and_missing_roots_are_not_found() {
        let (dir, resolver) = fixture(DeploymentMode::Packaged);
        assert!(matches!(
            resolver.resolve(VirtualScheme::Font, "sub"),
            Err(ResolveError::NotFound(_))
        ));

        fs::remove_dir_all(resolver.root(VirtualScheme::Cursor)).unwrap();
        assert!(matches!(
            resolver.resolve(VirtualScheme::Cursor, "text.ani"),
            Err(ResolveError::NotFound(_))
        ));
        drop(dir);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_out_of_root_is_denied() {
        let (dir, resolver) = fixture(DeploymentMode::Packaged);
        std::os::unix::fs::symlink(
            dir.path().join("secret.txt"),
            resolver.root(VirtualScheme::App).join("leak.txt"),
        )
        .unwrap();

        assert!(matches!(
            resolver.resolve(VirtualScheme::App, "leak.txt"),
            Err(ResolveError::AccessDenied(_))
        ));
    }
}
