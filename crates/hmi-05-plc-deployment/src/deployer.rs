//! Writes controller artifacts to disk and refreshes their status block.

use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use shared_types::{PlcSystemSnapshot, RepositoryArea, REPOSITORY_AREAS};
use tokio::io::AsyncWriteExt;
use tracing::{debug, error, info};

use crate::error::DeploymentError;
use crate::templates::{self, PlcProfile};
use crate::{HMI_DIR, PLC_DIR};

const CONFIG_FILE: &str = "plc-config.json";
const LADDER_FILE: &str = "ladder-logic.txt";
const IO_MAPPING_FILE: &str = "io-mapping.json";
const WATCHDOG_FILE: &str = "watchdog.log";
const SCAN_CYCLE_FILE: &str = "scan-cycle.log";
const VIEW_FILE: &str = "perspective-view.json";
const INDEX_FILE: &str = "index.html";

/// Artifacts the gateway serves back to browsers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Artifact {
    PlcConfig,
    PerspectiveView,
    HmiIndex,
}

impl Artifact {
    /// Location inside the area directory.
    pub fn relative_path(self) -> PathBuf {
        match self {
            Artifact::PlcConfig => Path::new(PLC_DIR).join(CONFIG_FILE),
            Artifact::PerspectiveView => Path::new(HMI_DIR).join(VIEW_FILE),
            Artifact::HmiIndex => Path::new(HMI_DIR).join(INDEX_FILE),
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            Artifact::PlcConfig | Artifact::PerspectiveView => "application/json",
            Artifact::HmiIndex => "text/html; charset=utf-8",
        }
    }
}

/// Outcome of [`PlcDeployer::deploy_all`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeploymentReport {
    /// Controller ids written successfully.
    pub deployed: Vec<String>,
    /// Controller ids that failed; the cause is logged.
    pub failed: Vec<String>,
}

impl DeploymentReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Artifact writer rooted at the repository base directory.
#[derive(Debug, Clone)]
pub struct PlcDeployer {
    base: PathBuf,
}

impl PlcDeployer {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    pub fn base_path(&self) -> &Path {
        &self.base
    }

    /// Resolve an area directory, refusing anything that leaves the base.
    pub fn area_dir(&self, control_path: &str) -> Result<PathBuf, DeploymentError> {
        let mut dir = self.base.clone();
        for segment in control_path.split('/').filter(|s| !s.is_empty()) {
            if segment == "." || segment == ".." || segment.contains('\\') {
                return Err(DeploymentError::InvalidPath(control_path.to_string()));
            }
            dir.push(segment);
        }
        Ok(dir)
    }

    /// Deploy every repository area. Failures are logged and reported, never
    /// propagated.
    pub async fn deploy_all(&self) -> DeploymentReport {
        info!(areas = REPOSITORY_AREAS.len(), "Deploying controllers to repository areas");
        let mut report = DeploymentReport::default();
        for area in REPOSITORY_AREAS.iter() {
            match self.deploy_area(area).await {
                Ok(_) => report.deployed.push(area.plc_id()),
                Err(e) => {
                    error!(plc = %area.plc_id(), path = area.path, error = %e, "Controller deployment failed");
                    report.failed.push(area.plc_id());
                }
            }
        }
        info!(
            deployed = report.deployed.len(),
            failed = report.failed.len(),
            "Controller deployment finished"
        );
        report
    }

    pub async fn deploy_area(&self, area: &RepositoryArea) -> Result<PathBuf, DeploymentError> {
        self.deploy_plc(&PlcProfile::from(area)).await
    }

    /// Write the full artifact set for one controller, creating the area
    /// directory if needed. Returns the area directory.
    pub async fn deploy_plc(&self, profile: &PlcProfile) -> Result<PathBuf, DeploymentError> {
        let area_dir = self.area_dir(&profile.control_path)?;
        let plc_dir = area_dir.join(PLC_DIR);
        let hmi_dir = area_dir.join(HMI_DIR);
        create_dir(&plc_dir).await?;
        create_dir(&hmi_dir).await?;

        let now = Utc::now();
        write_json(&plc_dir.join(CONFIG_FILE), &templates::plc_config(profile, now)).await?;
        write_text(&plc_dir.join(LADDER_FILE), &templates::ladder_logic(profile, now)).await?;
        write_json(&plc_dir.join(IO_MAPPING_FILE), &templates::io_mapping()).await?;
        write_text(&plc_dir.join(WATCHDOG_FILE), &templates::watchdog_header(profile, now)).await?;
        write_text(&plc_dir.join(SCAN_CYCLE_FILE), &templates::scan_cycle_header(profile, now)).await?;
        write_json(&hmi_dir.join(VIEW_FILE), &templates::perspective_view(profile, now)).await?;
        write_text(&hmi_dir.join(INDEX_FILE), &templates::hmi_index(profile)).await?;

        info!(plc = %profile.plc_id, path = %profile.control_path, "Controller deployed");
        Ok(area_dir)
    }

    /// Merge `snapshot` into `tags.system` of the area's config, stamp
    /// `lastUpdate` and append a watchdog line.
    ///
    /// Returns `Ok(false)` when the area has no deployed config yet.
    pub async fn update_plc_status(
        &self,
        control_path: &str,
        snapshot: &PlcSystemSnapshot,
    ) -> Result<bool, DeploymentError> {
        let plc_dir = self.area_dir(control_path)?.join(PLC_DIR);
        let config_path = plc_dir.join(CONFIG_FILE);

        let raw = match tokio::fs::read_to_string(&config_path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = control_path, "No controller config deployed yet");
                return Ok(false);
            }
            Err(e) => return Err(DeploymentError::io(&config_path, e)),
        };

        let mut config: Value =
            serde_json::from_str(&raw).map_err(|source| DeploymentError::MalformedConfig {
                path: config_path.clone(),
                source,
            })?;

        let update = serde_json::to_value(snapshot).map_err(|source| {
            DeploymentError::MalformedConfig {
                path: config_path.clone(),
                source,
            }
        })?;

        let system = config
            .pointer_mut("/tags/system")
            .and_then(Value::as_object_mut)
            .ok_or_else(|| DeploymentError::MissingSystemBlock(config_path.clone()))?;
        if let Value::Object(fields) = &update {
            for (key, value) in fields {
                system.insert(key.clone(), value.clone());
            }
        }

        let now = Utc::now();
        if let Value::Object(root) = &mut config {
            root.insert("lastUpdate".to_string(), Value::String(templates::iso(now)));
        }
        write_json(&config_path, &config).await?;

        let watchdog_path = plc_dir.join(WATCHDOG_FILE);
        let mut watchdog = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&watchdog_path)
            .await
            .map_err(|e| DeploymentError::io(&watchdog_path, e))?;
        watchdog
            .write_all(templates::watchdog_entry(&update, now).as_bytes())
            .await
            .map_err(|e| DeploymentError::io(&watchdog_path, e))?;

        Ok(true)
    }

    /// Raw bytes of a served artifact.
    pub async fn read_artifact(
        &self,
        control_path: &str,
        artifact: Artifact,
    ) -> Result<Vec<u8>, DeploymentError> {
        let path = self.area_dir(control_path)?.join(artifact.relative_path());
        tokio::fs::read(&path)
            .await
            .map_err(|e| DeploymentError::io(&path, e))
    }
}

async fn create_dir(path: &Path) -> Result<(), DeploymentError> {
    tokio::fs::create_dir_all(path)
        .await
        .map_err(|e| DeploymentError::io(path, e))
}

async fn write_text(path: &Path, contents: &str) -> Result<(), DeploymentError> {
    tokio::fs::write(path, contents)
        .await
        .map_err(|e| DeploymentError::io(path, e))
}

async fn write_json(path: &Path, value: &Value) -> Result<(), DeploymentError> {
    let pretty = serde_json::to_string_pretty(value).map_err(|source| {
        DeploymentError::MalformedConfig {
            path: path.to_path_buf(),
            source,
        }
    })?;
    write_text(path, &pretty).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::PlcStatus;

    fn snapshot() -> PlcSystemSnapshot {
        PlcSystemSnapshot {
            file_count: 42,
            directory_size: "1.5".to_string(),
            last_modified: Utc::now(),
            processing_load: "21.2".to_string(),
            status: PlcStatus::Active,
        }
    }

    #[tokio::test]
    async fn test_deploy_writes_full_artifact_set() {
        let dir = tempfile::tempdir().unwrap();
        let deployer = PlcDeployer::new(dir.path());

        let area_dir = deployer.deploy_area(&REPOSITORY_AREAS[3]).await.unwrap();
        assert_eq!(area_dir, dir.path().join("client/src/components"));

        for file in [CONFIG_FILE, LADDER_FILE, IO_MAPPING_FILE, WATCHDOG_FILE, SCAN_CYCLE_FILE] {
            assert!(area_dir.join(PLC_DIR).join(file).is_file(), "missing {file}");
        }
        for file in [VIEW_FILE, INDEX_FILE] {
            assert!(area_dir.join(HMI_DIR).join(file).is_file(), "missing {file}");
        }

        let config: Value = serde_json::from_slice(
            &deployer
                .read_artifact("client/src/components", Artifact::PlcConfig)
                .await
                .unwrap(),
        )
        .unwrap();
        assert_eq!(config["plcId"], "PLC4");
        assert_eq!(config["tags"]["system"]["status"], "Initializing");
    }

    #[tokio::test]
    async fn test_deploy_all_covers_every_area() {
        let dir = tempfile::tempdir().unwrap();
        let report = PlcDeployer::new(dir.path()).deploy_all().await;
        assert!(report.is_complete());
        assert_eq!(report.deployed.len(), REPOSITORY_AREAS.len());
        assert!(dir.path().join("workspace/.hmi/index.html").is_file());
    }

    #[tokio::test]
    async fn test_status_update_merges_and_appends_watchdog() {
        let dir = tempfile::tempdir().unwrap();
        let deployer = PlcDeployer::new(dir.path());
        deployer.deploy_area(&REPOSITORY_AREAS[0]).await.unwrap();

        assert!(deployer.update_plc_status("client", &snapshot()).await.unwrap());

        let config: Value = serde_json::from_slice(
            &deployer.read_artifact("client", Artifact::PlcConfig).await.unwrap(),
        )
        .unwrap();
        let system = &config["tags"]["system"];
        assert_eq!(system["fileCount"], 42);
        assert_eq!(system["directorySize"], "1.5");
        assert_eq!(system["status"], "Active");
        assert!(config["lastUpdate"].is_string());
        assert_eq!(config["plcId"], "PLC1");

        let watchdog =
            std::fs::read_to_string(dir.path().join("client/.plc/watchdog.log")).unwrap();
        let lines: Vec<&str> = watchdog.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("PLC PLC1 Watchdog Initialized - "));
        assert!(lines[1].starts_with("Status Update: "));
    }

    #[tokio::test]
    async fn test_status_update_before_deploy_is_soft() {
        let dir = tempfile::tempdir().unwrap();
        let deployer = PlcDeployer::new(dir.path());
        assert!(!deployer.update_plc_status("server", &snapshot()).await.unwrap());
    }

    #[tokio::test]
    async fn test_missing_artifact_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let deployer = PlcDeployer::new(dir.path());
        let err = deployer
            .read_artifact("client", Artifact::PerspectiveView)
            .await
            .unwrap_err();
        assert!(matches!(err, DeploymentError::NotFound(_)));
    }

    #[test]
    fn test_area_dir_rejects_traversal() {
        let deployer = PlcDeployer::new("/srv/repo");
        assert_eq!(
            deployer.area_dir("/client/src/").unwrap(),
            PathBuf::from("/srv/repo/client/src")
        );
        assert!(matches!(
            deployer.area_dir("client/../../etc"),
            Err(DeploymentError::InvalidPath(_))
        ));
    }
}
