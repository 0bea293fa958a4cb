//! 配置管理模块
//!
//! 提供CLI参数解析和翻译服务配置管理功能

// 标准库导入
use std::path::PathBuf;

// 第三方crate导入
use clap::{Args, Parser, Subcommand};

// 本地模块导入
use crate::api_constants::{self, api_config, pipeline_config, service_config};
use crate::coordinator::FailurePolicy;
use crate::error::Result;
use crate::translation_error;

/// 翻译服务配置结构体
///
/// 支持Builder模式进行链式配置。
///
/// # Examples
///
/// ```rust
/// use md_translator::config::TranslatorConfig;
///
/// let config = TranslatorConfig::new()
///     .target_language("ZH")
///     .with_api_url("http://localhost:1188/translate")
///     .with_max_retries(2);
///
/// assert_eq!(config.target_lang(), "ZH");
/// assert_eq!(config.max_retries(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct TranslatorConfig {
    /// 源语言代码
    source_lang: String,
    /// 目标语言代码
    target_lang: String,
    /// 翻译API服务地址
    api_url: String,
    /// 单次请求超时（秒）
    timeout_secs: u64,
    /// 最大重试次数
    max_retries: usize,
}

impl TranslatorConfig {
    /// 创建新的配置实例
    ///
    /// 返回具有默认值的配置实例：
    /// - 源语言: 英语 ("EN")
    /// - 目标语言: 日语 ("JA")
    /// - API地址: 本地DeepLX服务
    /// - 超时: 30秒
    /// - 最大重试次数: 0
    pub fn new() -> Self {
        Self {
            source_lang: service_config::DEFAULT_SOURCE_LANG.to_string(),
            target_lang: service_config::DEFAULT_TARGET_LANG.to_string(),
            api_url: api_config::DEFAULT_API_URL.to_string(),
            timeout_secs: api_config::REQUEST_TIMEOUT_SECONDS,
            max_retries: service_config::DEFAULT_MAX_RETRIES,
        }
    }

    /// 获取源语言代码
    pub fn source_lang(&self) -> &str {
        &self.source_lang
    }

    /// 获取目标语言代码
    pub fn target_lang(&self) -> &str {
        &self.target_lang
    }

    /// 获取API地址
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// 获取请求超时（秒）
    pub fn timeout_secs(&self) -> u64 {
        self.timeout_secs
    }

    /// 获取最大重试次数
    pub fn max_retries(&self) -> usize {
        self.max_retries
    }

    /// 设置源语言代码
    pub fn source_language(mut self, lang: &str) -> Self {
        self.source_lang = lang.to_string();
        self
    }

    /// 设置目标语言代码
    pub fn target_language(mut self, lang: &str) -> Self {
        self.target_lang = lang.to_string();
        self
    }

    /// 设置API地址
    pub fn with_api_url(mut self, url: &str) -> Self {
        self.api_url = url.to_string();
        self
    }

    /// 设置请求超时（秒）
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// 设置最大重试次数
    pub fn with_max_retries(mut self, retries: usize) -> Self {
        self.max_retries = retries;
        self
    }

    /// 校验配置
    pub fn validate(&self) -> Result<()> {
        if !api_constants::is_valid_api_url(&self.api_url) {
            return Err(translation_error!(config, "api_url", format!("无效的API地址: {}", self.api_url)));
        }
        if !api_constants::is_supported_language(&self.source_lang) {
            return Err(translation_error!(config, "source_lang", format!("不支持的源语言: {}", self.source_lang)));
        }
        if !api_constants::is_supported_language(&self.target_lang) {
            return Err(translation_error!(config, "target_lang", format!("不支持的目标语言: {}", self.target_lang)));
        }
        if self.timeout_secs == 0 {
            return Err(translation_error!(config, "timeout", "超时时间必须大于0"));
        }
        Ok(())
    }
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// CLI参数结构
#[derive(Parser)]
#[command(author, version, about = "Markdown文档翻译工具 - 按块解析、并发翻译、持久化缓存、无损重组", long_about = None)]
pub struct Cli {
    /// 详细输出模式
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// 静默模式 (仅输出错误)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// 子命令
#[derive(Subcommand)]
pub enum Command {
    /// 翻译Markdown文档
    Translate(TranslateArgs),

    /// 解析文档并列出所有块
    Parse(ParseArgs),

    /// 导出分批的翻译目标文本
    Extract(ExtractArgs),

    /// 合并目录下的所有Markdown文件
    Merge(MergeArgs),

    /// 翻译缓存管理
    #[command(subcommand)]
    Cache(CacheCommand),
}

/// `translate` 子命令参数
#[derive(Args)]
pub struct TranslateArgs {
    /// 输入Markdown文件路径
    #[arg(value_name = "FILE")]
    pub input: PathBuf,

    /// 输出文件路径 (可选，默认为输入文件名+语言代码)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// 目标语言代码 (如: JA, ZH, KO)
    #[arg(short, long, default_value = service_config::DEFAULT_TARGET_LANG)]
    pub lang: String,

    /// 源语言代码
    #[arg(long, default_value = service_config::DEFAULT_SOURCE_LANG)]
    pub source_lang: String,

    /// 翻译API地址
    #[arg(short, long, default_value = api_config::DEFAULT_API_URL)]
    pub api: String,

    /// 同时进行的翻译任务数量
    #[arg(long, default_value_t = pipeline_config::DEFAULT_CONCURRENCY)]
    pub concurrency: usize,

    /// 翻译缓存数据库路径
    #[arg(long, value_name = "PATH", default_value = pipeline_config::DEFAULT_CACHE_PATH)]
    pub cache: PathBuf,

    /// 禁用持久化缓存 (仅在本次运行内去重)
    #[arg(long)]
    pub no_cache: bool,

    /// 单个块翻译失败时继续处理其余块，失败的块保留原文
    #[arg(long)]
    pub keep_going: bool,

    /// 打印解析出的块列表
    #[arg(long)]
    pub print_nodes: bool,

    /// 最大重试次数
    #[arg(long, default_value_t = service_config::DEFAULT_MAX_RETRIES)]
    pub max_retries: usize,

    /// 请求超时时间（秒）
    #[arg(long, default_value_t = api_config::REQUEST_TIMEOUT_SECONDS)]
    pub timeout: u64,

    /// 显示性能统计
    #[arg(long)]
    pub stats: bool,
}

impl TranslateArgs {
    /// 根据命令行参数构建翻译服务配置
    pub fn translator_config(&self) -> TranslatorConfig {
        TranslatorConfig::new()
            .source_language(&self.source_lang)
            .target_language(&self.lang)
            .with_api_url(&self.api)
            .with_timeout(self.timeout)
            .with_max_retries(self.max_retries)
    }

    /// 失败处理策略
    pub fn failure_policy(&self) -> FailurePolicy {
        if self.keep_going {
            FailurePolicy::Collect
        } else {
            FailurePolicy::Abort
        }
    }
}

/// `parse` 子命令参数
#[derive(Args)]
pub struct ParseArgs {
    /// 输入Markdown文件路径
    #[arg(value_name = "FILE")]
    pub input: PathBuf,

    /// 把解析结果重新渲染后写入该文件（用于检查往返一致性）
    #[arg(long, value_name = "FILE")]
    pub roundtrip: Option<PathBuf>,
}

/// `extract` 子命令参数
#[derive(Args)]
pub struct ExtractArgs {
    /// 输入Markdown文件路径
    #[arg(value_name = "FILE")]
    pub input: PathBuf,

    /// 输出目录
    #[arg(long, value_name = "DIR", default_value = pipeline_config::TARGET_OUTPUT_DIR)]
    pub out_dir: PathBuf,

    /// 每个批次的字节上限
    #[arg(long, default_value_t = pipeline_config::TARGET_BATCH_BYTES)]
    pub batch_bytes: usize,
}

/// `merge` 子命令参数
#[derive(Args)]
pub struct MergeArgs {
    /// 输入目录
    #[arg(value_name = "DIR")]
    pub input_dir: PathBuf,

    /// 输出文件路径 (默认为输入目录下的 merged.md)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

/// `cache` 子命令
#[derive(Subcommand)]
pub enum CacheCommand {
    /// 把缓存导出为JSON
    Dump {
        /// 翻译缓存数据库路径
        #[arg(long, value_name = "PATH", default_value = pipeline_config::DEFAULT_CACHE_PATH)]
        cache: PathBuf,

        /// 输出JSON文件
        #[arg(short, long, value_name = "FILE", default_value = pipeline_config::DEFAULT_DUMP_FILE)]
        output: PathBuf,
    },

    /// 从JSON导入缓存
    Load {
        /// 输入JSON文件
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// 翻译缓存数据库路径
        #[arg(long, value_name = "PATH", default_value = pipeline_config::DEFAULT_CACHE_PATH)]
        cache: PathBuf,

        /// 导入前清空已有条目
        #[arg(long)]
        replace: bool,
    },
}
