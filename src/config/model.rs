// src/config/model.rs

use serde::Deserialize;

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [scheduler]
/// workers = 8
/// max_retries = 2
/// cpu_binding = false
/// node_cpus = 16
/// ```
///
/// All sections are optional and have reasonable defaults. Unknown keys are
/// ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    /// Scheduling behaviour from `[scheduler]`.
    #[serde(default)]
    pub scheduler: Settings,
}

/// `[scheduler]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Worker count. If `None`, derived from the reserved CPU count.
    #[serde(default)]
    pub workers: Option<usize>,

    /// How many times a failing task is retried before it is marked failed.
    ///
    /// 0 means no retry.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// If true, worker ids are evenly spaced CPU stride numbers instead of
    /// `0..workers`. Only desirable when CPUs are numbered sequentially by
    /// socket.
    #[serde(default)]
    pub cpu_binding: bool,

    /// CPUs per node, used to compute stride numbers when `cpu_binding` is
    /// set. If `None`, the reserved CPU count is used.
    #[serde(default)]
    pub node_cpus: Option<usize>,
}

fn default_max_retries() -> u32 {
    0
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            workers: None,
            max_retries: default_max_retries(),
            cpu_binding: false,
            node_cpus: None,
        }
    }
}

impl Settings {
    /// Worker count to use for the run: the configured value if present,
    /// otherwise derived from the reserved CPUs of the allocation.
    pub fn effective_workers(&self) -> usize {
        self.workers
            .unwrap_or_else(|| default_worker_count(reserved_cpus()))
    }

    /// CPUs per node for stride computation.
    pub fn effective_node_cpus(&self) -> usize {
        self.node_cpus.unwrap_or_else(reserved_cpus)
    }
}

/// Derive a worker count from the reserved CPU count.
///
/// Small allocations get one worker per CPU; larger ones keep half the cores
/// free for the tasks' own child processes.
pub fn default_worker_count(reserved: usize) -> usize {
    if reserved <= 4 {
        reserved
    } else {
        reserved / 2
    }
}

/// Number of CPUs reserved for this allocation.
///
/// Checks `SLURM_CPUS_ON_NODE`, then `FANOUT_CPUS`, then falls back to the
/// parallelism reported by the OS.
pub fn reserved_cpus() -> usize {
    for var in ["SLURM_CPUS_ON_NODE", "FANOUT_CPUS"] {
        if let Some(n) = std::env::var(var).ok().and_then(|s| s.trim().parse().ok()) {
            return n;
        }
    }

    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}
