/// Deployment layout detection
/// Works out whether the host runs from a packaged bundle or from the source
/// tree and derives the three asset roots the virtual schemes are served from.
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

use crate::app::{DEPLOYMENT_ENV, ROOT_ENV};
use crate::config::HostConfig;
use crate::error::LocateError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeploymentMode {
    Packaged,
    Development,
}

impl DeploymentMode {
    /// Packaged unless built for `tauri dev`; `WEBDESK_DEPLOYMENT` wins if set
    pub fn detect() -> Self {
        std::env::var(DEPLOYMENT_ENV)
            .ok()
            .and_then(|value| Self::from_env_value(&value))
            .unwrap_or(if tauri::is_dev() {
                DeploymentMode::Development
            } else {
                DeploymentMode::Packaged
            })
    }

    pub fn from_env_value(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "packaged" | "bundle" => Some(DeploymentMode::Packaged),
            "development" | "dev" => Some(DeploymentMode::Development),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    App,
    Font,
    Cursor,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetRoot {
    pub kind: AssetKind,
    pub path: PathBuf,
}

/// Located deployment. Read-only for the process lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deployment {
    pub mode: DeploymentMode,
    pub base_dir: PathBuf,
    pub app_root: AssetRoot,
    pub font_root: AssetRoot,
    pub cursor_root: AssetRoot,
}

impl Deployment {
    /// Lay the asset roots out under `base_dir`
    pub fn from_base(mode: DeploymentMode, base_dir: &Path, config: &HostConfig) -> Self {
        let app_path = base_dir.join(&config.web_dir);
        Self {
            mode,
            base_dir: base_dir.to_path_buf(),
            font_root: AssetRoot {
                kind: AssetKind::Font,
                path: app_path.join(&config.font_dir),
            },
            cursor_root: AssetRoot {
                kind: AssetKind::Cursor,
                path: app_path.join(&config.cursor_dir),
            },
            app_root: AssetRoot {
                kind: AssetKind::App,
                path: app_path,
            },
        }
    }

    pub fn root(&self, kind: AssetKind) -> &AssetRoot {
        match kind {
            AssetKind::App => &self.app_root,
            AssetKind::Font => &self.font_root,
            AssetKind::Cursor => &self.cursor_root,
        }
    }
}

/// Locate the deployment using the environment and the bundled resource dir
pub fn locate<F>(config: &HostConfig, resource_dir: F) -> Result<Deployment, LocateError>
where
    F: FnOnce() -> Result<PathBuf, String>,
{
    let root_override = std::env::var(ROOT_ENV)
        .ok()
        .map(|value| PathBuf::from(value.trim()))
        .filter(|path| !path.as_os_str().is_empty());

    locate_with(DeploymentMode::detect(), root_override, config, resource_dir)
}

pub fn locate_with<F>(
    mode: DeploymentMode,
    root_override: Option<PathBuf>,
    config: &HostConfig,
    resource_dir: F,
) -> Result<Deployment, LocateError>
where
    F: FnOnce() -> Result<PathBuf, String>,
{
    let base_dir = match (root_override, mode) {
        (Some(root), _) => root,
        (None, DeploymentMode::Packaged) => resource_dir().map_err(LocateError::InstallLocation)?,
        (None, DeploymentMode::Development) => PathBuf::from(env!("CARGO_MANIFEST_DIR")),
    };

    let base_dir = if base_dir.is_absolute() {
        base_dir
    } else {
        std::env::current_dir()?.join(base_dir)
    };

    let deployment = Deployment::from_base(mode, &base_dir, config);
    info!("Deployment mode {:?}, base directory {:?}", mode, deployment.base_dir);
    Ok(deployment)
}

/// Result of the startup root check
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RootAudit {
    pub missing_roots: Vec<AssetKind>,
    pub missing_cursors: Vec<String>,
}

/// Log the state of every root. Never fatal: a missing root only makes the
/// matching scheme fail per request.
pub fn audit(deployment: &Deployment, config: &HostConfig) -> RootAudit {
    let mut report = RootAudit::default();

    if let Ok(cwd) = std::env::current_dir() {
        info!("Working directory: {:?}", cwd);
    }
    info!("App path: {:?}", deployment.app_root.path);

    for root in [&deployment.app_root, &deployment.font_root, &deployment.cursor_root] {
        if root.path.is_dir() {
            info!("{:?} root present: {:?}", root.kind, root.path);
        } else {
            error!("{:?} root missing: {:?}", root.kind, root.path);
            report.missing_roots.push(root.kind);
        }
    }

    let cursor_dir = &deployment.cursor_root.path;
    let present: Vec<String> = match fs::read_dir(cursor_dir) {
        Ok(entries) => entries
            .flatten()
            .map(|entry| entry.file_name().to_string_lossy().to_string())
            .collect(),
        Err(_) => Vec::new(),
    };
    if !present.is_empty() {
        info!("Cursor files: {:?}", present);
    }

    report.missing_cursors = config
        .required_cursors
        .iter()
        .filter(|name| !present.contains(name))
        .cloned()
        .collect();

    if report.missing_cursors.is_empty() {
        info!("All required cursor files are present");
    } else {
        warn!("Missing required cursor files: {:?}", report.missing_cursors);
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_base_layout() {
        let config = HostConfig::default();
        let deployment =
            Deployment::from_base(DeploymentMode::Packaged, Path::new("/opt/webdesk"), &config);

        assert_eq!(deployment.app_root.path, Path::new("/opt/webdesk/Web-Files"));
        assert_eq!(deployment.font_root.path, Path::new("/opt/webdesk/Web-Files/html"));
        assert_eq!(deployment.cursor_root.path, Path::new("/opt/webdesk/Web-Files/cursor"));
        assert_eq!(deployment.root(AssetKind::Font).kind, AssetKind::Font);
    }

    #[test]
    fn test_packaged_uses_resource_dir() {
        let dir = tempfile::tempdir().unwrap();
        let resources = dir.path().to_path_buf();
        let deployment = locate_with(
            DeploymentMode::Packaged,
            None,
            &HostConfig::default(),
            || Ok(resources),
        )
        .unwrap();

        assert_eq!(deployment.mode, DeploymentMode::Packaged);
        assert_eq!(deployment.base_dir, dir.path());
    }

    #[test]
    fn test_development_uses_source_tree() {
        let deployment = locate_with(
            DeploymentMode::Development,
            None,
            &HostConfig::default(),
            || Err("resource dir must not be consulted".to_string()),
        )
        .unwrap();

        assert_eq!(deployment.base_dir, Path::new(env!("CARGO_MANIFEST_DIR")));
    }

    #[test]
    fn test_unknown_install_location_is_fatal() {
        let result = locate_with(
            DeploymentMode::Packaged,
            None,
            &HostConfig::default(),
            || Err("no resource dir".to_string()),
        );

        assert!(matches!(result, Err(LocateError::InstallLocation(_))));
    }

    #[test]
    fn test_root_override_wins() {
        let dir = tempfile::tempdir().unwrap();
        let deployment = locate_with(
            DeploymentMode::Packaged,
            Some(dir.path().to_path_buf()),
            &HostConfig::default(),
            || Err("unused".to_string()),
        )
        .unwrap();

        assert_eq!(deployment.base_dir, dir.path());
    }

    #[test]
    fn test_mode_from_env_value() {
        assert_eq!(DeploymentMode::from_env_value("Packaged"), Some(DeploymentMode::Packaged));
        assert_eq!(DeploymentMode::from_env_value(" dev "), Some(DeploymentMode::Development));
        assert_eq!(DeploymentMode::from_env_value("staging"), None);
    }

    #[test]
    fn test_audit_reports_missing_cursors_without_failing() {
        let dir = tempfile::tempdir().unwrap();
        let config = HostConfig::default();
        let deployment = Deployment::from_base(DeploymentMode::Development, dir.path(), &config);
        fs::create_dir_all(&deployment.cursor_root.path).unwrap();
        fs::write(deployment.cursor_root.path.join("normal.ani"), b"RIFF").unwrap();

        let report = audit(&deployment, &config);

        assert_eq!(report.missing_cursors, vec!["text.ani", "link.ani"]);
        assert_eq!(report.missing_roots, vec![AssetKind::Font]);
    }
}
