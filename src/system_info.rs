use sysinfo::System;

use crate::config::Config;

#[derive(Debug)]
pub struct SystemInfo {
    pub version: String,
    pub platform: String,
    pub arch: String,
    pub cpus: usize,
    pub cpu_model: String,
    pub memory_total_gb: f64,
    pub memory_free_gb: f64,
    pub memory_used_gb: f64,
    pub ffmpeg: String,
    pub ffprobe: String,
}

pub fn get_system_info() -> SystemInfo {
    let mut system = System::new();
    system.refresh_all();

    let memory_total = system.total_memory() as f64 / 1024.0 / 1024.0 / 1024.0;
    let memory_free = system.free_memory() as f64 / 1024.0 / 1024.0 / 1024.0;
    let memory_used = memory_total - memory_free;

    let cpu_count = system.cpus().len();
    let cpu_model = system
        .cpus()
        .first()
        .map(|cpu| cpu.brand().to_string())
        .unwrap_or_else(|| "unknown".to_string());

    SystemInfo {
        version: env!("CARGO_PKG_VERSION").to_string(),
        platform: std::env::consts::OS.to_string(),
        arch: std::env::consts::ARCH.to_string(),
        cpus: cpu_count,
        cpu_model,
        memory_total_gb: memory_total,
        memory_free_gb: memory_free,
        memory_used_gb: memory_used,
        ffmpeg: tool_version("ffmpeg"),
        ffprobe: tool_version("ffprobe"),
    }
}

/// First line of `<tool> -version` output, or "not available".
fn tool_version(tool: &str) -> String {
    match std::process::Command::new(tool).arg("-version").output() {
        Ok(output) if output.status.success() => String::from_utf8_lossy(&output.stdout)
            .lines()
            .next()
            .unwrap_or("unknown")
            .to_string(),
        _ => "not available".to_string(),
    }
}

pub fn print_startup_info(config: &Config) {
    println!("{}", "=".repeat(60));
    println!("🚀 Vodhost Backend Starting...");
    println!("{}", "=".repeat(60));

    let sys_info = get_system_info();
    println!("📊 System Information:");
    println!("  Version: {}", sys_info.version);
    println!("  Platform: {} ({})", sys_info.platform, sys_info.arch);
    println!("  CPUs: {} ({})", sys_info.cpus, sys_info.cpu_model);
    println!(
        "  Memory: {:.2} GB total, {:.2} GB free, {:.2} GB used",
        sys_info.memory_total_gb, sys_info.memory_free_gb, sys_info.memory_used_gb
    );
    println!("  FFmpeg: {}", sys_info.ffmpeg);
    println!("  FFprobe: {}", sys_info.ffprobe);
    println!("  Database: {:?}", config.database_path);
    println!("  Assets Dir: {:?}", config.assets_dir);
    println!("  Staging Dir: {:?}", config.staging_dir);
    println!(
        "  S3: bucket={} region={}{}",
        config.s3_bucket,
        config.s3_region,
        config
            .s3_endpoint
            .as_deref()
            .map(|endpoint| format!(" endpoint={}", endpoint))
            .unwrap_or_default()
    );
    println!(
        "  Upload caps: video {} MB, thumbnail {} MB",
        config.max_video_bytes / 1024 / 1024,
        config.max_thumbnail_bytes / 1024 / 1024
    );
    println!("{}", "=".repeat(60));
}
