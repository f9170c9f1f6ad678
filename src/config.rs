//! Process configuration and the virtual host table.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

const DEFAULT_LISTEN: &str = "127.0.0.1:8080";
const DEFAULT_VH_CONFIG: &str = "virtual_hosts.yaml";
const DEFAULT_DOCROOT: &str = "docroot_dirs";
const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct Config {
    pub listen_addr: String,
    /// Path of the YAML file mapping host names to document roots
    pub vh_config: PathBuf,
    /// Directory relative document roots are resolved against
    pub docroot_dir: PathBuf,
    /// How long a connection may sit without completing a request
    pub idle_timeout: Duration,
}

impl Config {
    pub fn load() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary key lookup, falling back to
    /// defaults for anything missing.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let listen_addr = lookup("LISTEN").unwrap_or_else(|| DEFAULT_LISTEN.to_string());
        let vh_config = lookup("VH_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_VH_CONFIG));
        let docroot_dir = lookup("DOCROOT")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DOCROOT));

        let idle_timeout = match lookup("IDLE_TIMEOUT_SECS") {
            None => DEFAULT_IDLE_TIMEOUT,
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    tracing::warn!(value = %raw, "Invalid IDLE_TIMEOUT_SECS, using default");
                    DEFAULT_IDLE_TIMEOUT
                }
            },
        };

        Self {
            listen_addr,
            vh_config,
            docroot_dir,
            idle_timeout,
        }
    }
}

#[derive(Debug, Deserialize)]
struct VirtualHostsFile {
    #[serde(default)]
    virtual_hosts: Vec<VirtualHostEntry>,
}

#[derive(Debug, Deserialize)]
struct VirtualHostEntry {
    #[serde(rename = "hostName")]
    host_name: String,
    #[serde(rename = "docRoot")]
    doc_root: PathBuf,
}

/// Immutable mapping from host name to document root.
///
/// Built once at startup and shared read-only by every connection.
#[derive(Debug, Clone, Default)]
pub struct VirtualHosts {
    roots: HashMap<String, PathBuf>,
}

impl VirtualHosts {
    pub fn new(roots: HashMap<String, PathBuf>) -> Self {
        Self { roots }
    }

    /// Reads the YAML host table at `path`, resolving relative roots
    /// against `docroot_dir`.
    pub fn load(path: &Path, docroot_dir: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading virtual host config {}", path.display()))?;
        Self::from_yaml(&raw, docroot_dir)
            .with_context(|| format!("parsing virtual host config {}", path.display()))
    }

    pub fn from_yaml(raw: &str, docroot_dir: &Path) -> Result<Self> {
        let file: VirtualHostsFile = serde_yaml::from_str(raw)?;

        let roots = file
            .virtual_hosts
            .into_iter()
            .map(|entry| {
                let root = if entry.doc_root.is_absolute() {
                    entry.doc_root
                } else {
                    docroot_dir.join(entry.doc_root)
                };
                (entry.host_name, root)
            })
            .collect();

        Ok(Self { roots })
    }

    /// Finds the document root for a `Host` header value.
    ///
    /// A `:port` suffix is ignored when the full value has no entry.
    pub fn lookup(&self, host: &str) -> Option<&Path> {
        if let Some(root) = self.roots.get(host) {
            return Some(root.as_path());
        }

        let (name, port) = host.rsplit_once(':')?;
        if port.is_empty() || !port.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        self.roots.get(name).map(PathBuf::as_path)
    }

    /// Checks that every root exists and is a directory, returning a table
    /// with canonicalized roots.
    pub fn validate(self) -> Result<Self> {
        let mut roots = HashMap::with_capacity(self.roots.len());

        for (host, root) in self.roots {
            let meta = std::fs::metadata(&root)
                .with_context(|| format!("doc root {} for host {host:?}", root.display()))?;
            if !meta.is_dir() {
                anyhow::bail!("doc root {} for host {host:?} is not a directory", root.display());
            }
            let canonical = root
                .canonicalize()
                .with_context(|| format!("canonicalizing doc root {}", root.display()))?;
            roots.insert(host, canonical);
        }

        Ok(Self { roots })
    }

    pub fn len(&self) -> usize {
        self.roots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    pub fn hosts(&self) -> impl Iterator<Item = (&str, &Path)> {
        self.roots.iter().map(|(h, r)| (h.as_str(), r.as_path()))
    }
}
