//! Configuration health reporting.
//!
//! Checks that a validated configuration can actually run: the dataset file
//! exists and hosts are configured. Critical failures block `run`.

use crate::infrastructure::config::settings::Config;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    Healthy,
    Unhealthy(String),
}

#[derive(Debug, Clone)]
pub struct HealthCheck {
    name: &'static str,
    critical: bool,
    status: HealthStatus,
}

impl HealthCheck {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn critical(&self) -> bool {
        self.critical
    }

    pub fn status(&self) -> &HealthStatus {
        &self.status
    }

    pub fn is_healthy(&self) -> bool {
        matches!(self.status, HealthStatus::Healthy)
    }
}

#[derive(Debug, Clone)]
pub struct HealthReport {
    checks: Vec<HealthCheck>,
}

impl HealthReport {
    pub fn checks(&self) -> &[HealthCheck] {
        &self.checks
    }

    /// Whether every critical check passed.
    pub fn is_healthy(&self) -> bool {
        self.checks
            .iter()
            .filter(|check| check.critical())
            .all(HealthCheck::is_healthy)
    }
}

pub fn health_check(config: &Config) -> HealthReport {
    let mut checks = Vec::new();

    checks.push(HealthCheck {
        name: "fleet",
        critical: true,
        status: if config.fleet.size == 0 {
            HealthStatus::Unhealthy("fleet is empty".to_string())
        } else {
            HealthStatus::Healthy
        },
    });

    checks.push(HealthCheck {
        name: "dataset",
        critical: true,
        status: match &config.training.dataset {
            None => HealthStatus::Unhealthy("no training.dataset configured".to_string()),
            Some(path) if !path.is_file() => {
                HealthStatus::Unhealthy(format!("{} does not exist", path.display()))
            }
            Some(_) => HealthStatus::Healthy,
        },
    });

    checks.push(HealthCheck {
        name: "hosts",
        critical: false,
        status: if config.hosts.is_empty() {
            HealthStatus::Unhealthy("no deployment hosts; agents stay in simulation".to_string())
        } else {
            HealthStatus::Healthy
        },
    });

    let capacity: usize = config.hosts.iter().map(|h| h.max_capacity).sum();
    let wanted: usize = config.hosts.iter().map(|h| h.deploy_top).sum();
    checks.push(HealthCheck {
        name: "capacity",
        critical: false,
        status: if wanted > capacity {
            HealthStatus::Unhealthy(format!(
                "deploy_top asks for {wanted} agents but hosts hold {capacity}"
            ))
        } else {
            HealthStatus::Healthy
        },
    });

    HealthReport { checks }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::config::host::HostConfig;
    use std::io::Write;

    fn host(deploy_top: usize) -> HostConfig {
        HostConfig {
            id: "vps-1".into(),
            address: "http://vps-1.test".into(),
            max_capacity: 2,
            deploy_top,
        }
    }

    fn names(report: &HealthReport) -> Vec<(&'static str, bool)> {
        report
            .checks()
            .iter()
            .map(|c| (c.name(), c.is_healthy()))
            .collect()
    }

    #[test]
    fn test_missing_dataset_is_critical() {
        let report = health_check(&Config::default());
        assert!(!report.is_healthy());
        assert_eq!(
            names(&report),
            vec![
                ("fleet", true),
                ("dataset", false),
                ("hosts", false),
                ("capacity", true)
            ]
        );
    }

    #[test]
    fn test_existing_dataset_without_hosts_is_healthy() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "2024.01.02,00:00:00,1,2,0.5,1.5").unwrap();
        let mut config = Config::default();
        config.training.dataset = Some(file.path().to_path_buf());

        let report = health_check(&config);

        assert!(report.is_healthy());
        assert!(!report.checks()[2].is_healthy());
        assert!(!report.checks()[2].critical());
    }

    #[test]
    fn test_overcommitted_deploy_top_is_reported() {
        let mut config = Config::default();
        config.hosts = vec![host(5)];

        let report = health_check(&config);
        let capacity = &report.checks()[3];

        assert!(matches!(capacity.status(), HealthStatus::Unhealthy(m) if m.contains("5")));
    }
}
