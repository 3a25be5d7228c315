use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tokio::sync::Semaphore;
use tracing::info;

use vocab_quality::clients::{LlmClient, RerankClient};
use vocab_quality::config::{Config, EndpointOverrides, RemoteSettings, CHAT_TIMEOUT, RERANK_TIMEOUT};
use vocab_quality::error::{AppError, ConfigError};
use vocab_quality::models::ScoreMode;
use vocab_quality::orchestrator::{BatchEvaluator, BatchRegenerator, EvaluateOptions, RegenerateOptions};
use vocab_quality::services::{ScoringBackend, ScoringService};
use vocab_quality::storage::find_files_nonempty;
use vocab_quality::tools::{self, RelatedOptions, RelatedWordsBuilder};
use vocab_quality::utils::{logging, RetryPolicy};
use vocab_quality::workflow::{EvaluateFlow, RegenerateFlow};

/// 日语词汇卡片质量评估与重新生成
#[derive(Parser, Debug)]
#[command(name = "vocab-quality")]
#[command(version)]
struct Cli {
    /// 配置文件路径
    #[arg(long, default_value = "config.toml", global = true)]
    config: PathBuf,

    /// 输出调试日志
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 评估词汇文件，写出评估报告
    Evaluate(EvaluateArgs),
    /// 根据评估报告重新生成低分单词
    Regenerate(RegenerateArgs),
    /// 统计评估报告
    Analyze(AnalyzeArgs),
    /// 按条数拆分词汇文件
    Split(SplitArgs),
    /// 合并词汇文件（同一单词以先出现的为准）
    Merge(MergeArgs),
    /// 去掉例句、词性和级别
    Minify(MinifyArgs),
    /// 从完整词汇文件恢复被精简的字段
    Enrich(EnrichArgs),
    /// 用 reranker 计算相关词
    Related(RelatedArgs),
}

/// 远程服务覆盖参数
#[derive(Args, Debug)]
struct EndpointArgs {
    /// 覆盖配置文件中的 base_url
    #[arg(long)]
    base_url: Option<String>,

    /// 覆盖配置文件中的模型名
    #[arg(long)]
    model: Option<String>,

    /// 直接给出 API 密钥（默认读取 env_var_name 指定的环境变量）
    #[arg(long)]
    api_key: Option<String>,
}

impl EndpointArgs {
    fn overrides(&self, temperature: Option<f32>) -> EndpointOverrides {
        EndpointOverrides {
            base_url: self.base_url.clone(),
            model: self.model.clone(),
            api_key: self.api_key.clone(),
            temperature,
        }
    }
}

#[derive(Args, Debug)]
struct EvaluateArgs {
    /// 词汇文件目录
    #[arg(long, default_value = "words")]
    words_dir: PathBuf,

    /// 选择文件的 glob 模式
    #[arg(long, default_value = "vocabulary_*.json")]
    glob: String,

    /// 显式指定文件（覆盖 --glob）
    #[arg(long, num_args = 1..)]
    files: Vec<PathBuf>,

    /// 评估报告输出目录
    #[arg(long, default_value = "evaluation_results")]
    output_dir: PathBuf,

    /// 评分模式
    #[arg(long, value_enum, default_value_t = ScoreMode::Similarity)]
    mode: ScoreMode,

    /// 同时进行的远程请求数
    #[arg(long)]
    concurrency: Option<usize>,

    /// 记录无法判断的 LLM 回复（判断模式）
    #[arg(long)]
    log_ambiguous: bool,

    #[command(flatten)]
    endpoint: EndpointArgs,
}

#[derive(Args, Debug)]
struct RegenerateArgs {
    /// 评估报告目录
    #[arg(long, default_value = "evaluation_results")]
    evaluation_dir: PathBuf,

    /// 词汇文件目录
    #[arg(long, default_value = "words")]
    words_dir: PathBuf,

    /// 低于该分数的单词需要重新生成
    #[arg(long)]
    threshold: Option<f64>,

    /// 同时进行的远程请求数
    #[arg(long)]
    concurrency: Option<usize>,

    /// 每个单词的最大尝试次数
    #[arg(long)]
    max_retries: Option<usize>,

    /// 生成温度
    #[arg(long)]
    temperature: Option<f32>,

    /// 只列出候选，不调用远程服务，不写文件
    #[arg(long)]
    dry_run: bool,

    /// 写出新旧内容对照，不修改词汇文件
    #[arg(long)]
    output_file: Option<PathBuf>,

    #[command(flatten)]
    endpoint: EndpointArgs,
}

#[derive(Args, Debug)]
struct AnalyzeArgs {
    /// 评估报告目录
    #[arg(long, default_value = "evaluation_results")]
    evaluation_dir: PathBuf,

    /// 输出最差 / 最好的单词数
    #[arg(long, default_value_t = 20)]
    top: usize,
}

#[derive(Args, Debug)]
struct SplitArgs {
    /// 要拆分的文件
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// 每个文件的词条数
    #[arg(long, default_value_t = 1000)]
    chunk_size: usize,

    /// 输出目录（默认与源文件相同）
    #[arg(long)]
    output_dir: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct MergeArgs {
    /// 按顺序合并的文件
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// 输出文件
    #[arg(long)]
    output: PathBuf,
}

#[derive(Args, Debug)]
struct MinifyArgs {
    #[arg(long, default_value = "words")]
    input_dir: PathBuf,

    #[arg(long, default_value = "vocabulary_*.json")]
    glob: String,

    /// 输出目录（默认与源文件相同）
    #[arg(long)]
    output_dir: Option<PathBuf>,

    #[arg(long, default_value = "_min")]
    suffix: String,
}

#[derive(Args, Debug)]
struct EnrichArgs {
    #[arg(long, default_value = "vocabulary")]
    input_dir: PathBuf,

    #[arg(long, default_value = "*.json")]
    input_glob: String,

    /// 完整词汇文件目录
    #[arg(long, default_value = "words")]
    reference_dir: PathBuf,

    #[arg(long, default_value = "vocabulary_*.json")]
    reference_glob: String,

    /// 输出目录（默认与源文件相同）
    #[arg(long)]
    output_dir: Option<PathBuf>,

    #[arg(long, default_value = "_enriched")]
    suffix: String,
}

#[derive(Args, Debug)]
struct RelatedArgs {
    #[arg(long, default_value = "vocabulary")]
    vocab_dir: PathBuf,

    #[arg(long, default_value = "n*_part*.json")]
    glob: String,

    /// 最低分数
    #[arg(long, default_value_t = 0.98)]
    threshold: f64,

    /// 跳过已有 related_words 的单词
    #[arg(long)]
    skip_existing: bool,

    /// 同时进行的远程请求数
    #[arg(long)]
    concurrency: Option<usize>,

    #[command(flatten)]
    endpoint: EndpointArgs,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 初始化日志
    logging::init(cli.verbose);

    // 加载配置
    let config = Config::load(&cli.config)?;

    match cli.command {
        Command::Evaluate(args) => run_evaluate(&config, args).await,
        Command::Regenerate(args) => run_regenerate(&config, args).await,
        Command::Analyze(args) => {
            let analysis = tools::analyze_reports(&args.evaluation_dir, args.top).await?;
            tools::print_analysis(&analysis);
            Ok(())
        }
        Command::Split(args) => run_split(args).await,
        Command::Merge(args) => {
            tools::merge_files(&args.files, &args.output).await?;
            Ok(())
        }
        Command::Minify(args) => run_minify(args).await,
        Command::Enrich(args) => run_enrich(args).await,
        Command::Related(args) => run_related(&config, args).await,
    }
}

async fn run_evaluate(config: &Config, args: EvaluateArgs) -> Result<()> {
    let concurrency = positive("concurrency", args.concurrency.unwrap_or(config.pipeline.evaluate_concurrency))?;
    let gate = Arc::new(Semaphore::new(concurrency));

    let backend = match args.mode {
        ScoreMode::Similarity => {
            let settings = config
                .reranker
                .openai
                .resolve(&args.endpoint.overrides(None), RERANK_TIMEOUT);
            settings.log("Reranker");
            ScoringBackend::Similarity(Arc::new(RerankClient::new(&settings)?))
        }
        ScoreMode::Judgment => {
            let settings = config
                .llm
                .openai
                .resolve(&args.endpoint.overrides(None), CHAT_TIMEOUT);
            settings.log("LLM");
            ScoringBackend::Judgment(Arc::new(LlmClient::new(&settings)?))
        }
    };
    let scoring = ScoringService::new(backend, gate).with_diagnostics(args.log_ambiguous);

    let options = EvaluateOptions {
        words_dir: args.words_dir,
        pattern: args.glob,
        files: args.files,
        output_dir: args.output_dir,
    };
    BatchEvaluator::new(EvaluateFlow::new(scoring), concurrency)
        .run(&options)
        .await?;
    Ok(())
}

async fn run_regenerate(config: &Config, args: RegenerateArgs) -> Result<()> {
    let pipeline = &config.pipeline;
    let concurrency = positive("concurrency", args.concurrency.unwrap_or(pipeline.regenerate_concurrency))?;
    let max_retries = positive("max_retries", args.max_retries.unwrap_or(pipeline.max_retries))?;

    let settings = config
        .llm
        .openai
        .resolve(&args.endpoint.overrides(args.temperature), CHAT_TIMEOUT);
    require_credential(&settings, &config.llm.openai.env_var_name, args.dry_run)?;
    settings.log("LLM");

    let flow = RegenerateFlow::new(
        Arc::new(LlmClient::new(&settings)?),
        Arc::new(Semaphore::new(concurrency)),
        RetryPolicy::new(max_retries, Duration::from_millis(pipeline.retry_delay_ms)),
    );
    let options = RegenerateOptions {
        evaluation_dir: args.evaluation_dir,
        words_dir: args.words_dir,
        threshold: args.threshold.unwrap_or(pipeline.threshold),
        dry_run: args.dry_run,
        output_file: args.output_file,
    };
    BatchRegenerator::new(flow, options, concurrency).run().await?;
    Ok(())
}

async fn run_split(args: SplitArgs) -> Result<()> {
    for path in &args.files {
        tools::split_file(path, args.chunk_size, args.output_dir.as_deref())
            .await
            .with_context(|| format!("拆分 {} 失败", path.display()))?;
    }
    Ok(())
}

async fn run_minify(args: MinifyArgs) -> Result<()> {
    let files = find_files_nonempty(&args.input_dir, &args.glob)?;
    for path in &files {
        tools::minify_file(path, args.output_dir.as_deref(), &args.suffix).await?;
    }
    Ok(())
}

async fn run_enrich(args: EnrichArgs) -> Result<()> {
    let reference = tools::load_reference(&args.reference_dir, &args.reference_glob).await?;
    // 跳过上一次生成的输出文件
    let files: Vec<PathBuf> = find_files_nonempty(&args.input_dir, &args.input_glob)?
        .into_iter()
        .filter(|path| !has_suffix(path, &args.suffix))
        .collect();
    for path in &files {
        tools::enrich_file(path, &reference, args.output_dir.as_deref(), &args.suffix).await?;
    }
    info!("✅ 已处理 {} 个文件", files.len());
    Ok(())
}

async fn run_related(config: &Config, args: RelatedArgs) -> Result<()> {
    let concurrency = positive("concurrency", args.concurrency.unwrap_or(config.pipeline.evaluate_concurrency))?;
    let settings = config
        .reranker
        .openai
        .resolve(&args.endpoint.overrides(None), RERANK_TIMEOUT);
    settings.log("Reranker");

    let files = find_files_nonempty(&args.vocab_dir, &args.glob)?;

    let builder = RelatedWordsBuilder::new(
        Arc::new(RerankClient::new(&settings)?),
        Arc::new(Semaphore::new(concurrency)),
        RelatedOptions {
            threshold: args.threshold,
            skip_existing: args.skip_existing,
            ..Default::default()
        },
    );
    let updated = builder.enrich_files(&files).await?;
    info!("✅ 已为 {} 个单词写入相关词", updated);
    Ok(())
}

/// 非试运行时必须有 API 密钥
fn require_credential(settings: &RemoteSettings, var_name: &str, dry_run: bool) -> Result<(), AppError> {
    if settings.api_key.is_none() && !dry_run {
        return Err(AppError::Config(ConfigError::MissingCredential {
            var_name: var_name.to_string(),
        }));
    }
    Ok(())
}

fn positive(name: &str, value: usize) -> Result<usize, AppError> {
    if value == 0 {
        return Err(AppError::Config(ConfigError::InvalidValue {
            name: name.to_string(),
            reason: "必须大于 0".to_string(),
        }));
    }
    Ok(value)
}

fn has_suffix(path: &Path, suffix: &str) -> bool {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().ends_with(suffix))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_directory_defaults() {
        let cli = Cli::try_parse_from(["vocab-quality", "evaluate"]).unwrap();
        let Command::Evaluate(args) = cli.command else {
            panic!("expected evaluate");
        };
        assert_eq!(args.output_dir, PathBuf::from("evaluation_results"));
        assert_eq!(args.words_dir, PathBuf::from("words"));

        let cli = Cli::try_parse_from(["vocab-quality", "regenerate", "--dry-run"]).unwrap();
        let Command::Regenerate(args) = cli.command else {
            panic!("expected regenerate");
        };
        assert_eq!(args.evaluation_dir, PathBuf::from("evaluation_results"));

        let cli = Cli::try_parse_from(["vocab-quality", "analyze"]).unwrap();
        let Command::Analyze(args) = cli.command else {
            panic!("expected analyze");
        };
        assert_eq!(args.evaluation_dir, PathBuf::from("evaluation_results"));
    }

    #[test]
    fn test_library_defaults_match_cli() {
        assert_eq!(EvaluateOptions::default().output_dir, PathBuf::from("evaluation_results"));
        assert_eq!(RegenerateOptions::default().evaluation_dir, PathBuf::from("evaluation_results"));
    }
}
