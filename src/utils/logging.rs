/// 日志工具模块
///
/// 提供日志初始化以及格式化输出的辅助函数
use tracing::info;
use tracing_subscriber::EnvFilter;

/// 初始化日志
///
/// 优先使用 `RUST_LOG`；未设置时默认 `info`，`verbose` 时本 crate 输出 `debug`。
pub fn init(verbose: bool) {
    let default_directive = if verbose {
        "info,vocab_quality=debug"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    // 测试中可能被重复调用，忽略重复初始化
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 输出分隔线
pub fn separator(ch: char) {
    info!("{}", ch.to_string().repeat(60));
}

/// 记录程序启动信息
///
/// # 参数
/// - `stage`: 阶段名称
/// - `max_concurrent`: 最大并发请求数
pub fn log_startup(stage: &str, max_concurrent: usize) {
    separator('=');
    info!("🚀 {} - 启动", stage);
    info!("📊 最大并发请求数: {}", max_concurrent);
    info!(
        "🕒 开始时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    separator('=');
}

/// 记录文件开始处理
pub fn log_file_start(name: &str, words: usize) {
    info!("\n{}", "─".repeat(60));
    info!("📄 正在处理 {} ({} 个单词)", name, words);
    info!("{}", "─".repeat(60));
}

/// 输出完成时间
pub fn log_finished(stage: &str) {
    separator('=');
    info!(
        "✅ {} 完成: {}",
        stage,
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    separator('=');
}
