use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use waypoint_vault::ScheduleSpec;

/// Gateway configuration, read from flags or the environment.
#[derive(Debug, Clone, Parser)]
#[command(name = "waypoint-gateway", about = "URL shortener gateway")]
pub struct GatewayConfig {
    /// Address the HTTP server binds to.
    #[arg(long, env = "LISTEN_ADDR", default_value = "127.0.0.1:3000")]
    pub listen_addr: SocketAddr,

    /// Public base URL used when rendering short links.
    #[arg(long, env = "BASE_URL", default_value = "http://localhost:3000")]
    pub base_url: String,

    /// Path of the SQLite data file.
    #[arg(long, env = "DB_PATH", default_value = "./data/waypoint.db")]
    pub db_path: PathBuf,

    /// Directory holding backup snapshots.
    #[arg(long, env = "BACKUP_DIR", default_value = "./data/backups")]
    pub backup_dir: PathBuf,

    /// Whether the scheduled backup cycle runs.
    #[arg(long, env = "BACKUP_ENABLED", default_value_t = false)]
    pub backup_enabled: bool,

    /// Recurrence of the scheduled backup cycle.
    #[arg(long, env = "BACKUP_SCHEDULE", default_value = "daily@03:00")]
    pub backup_schedule: ScheduleSpec,

    /// Snapshots older than this many days are pruned.
    #[arg(long, env = "BACKUP_RETENTION_DAYS", default_value_t = 30)]
    pub backup_retention_days: u32,
}
