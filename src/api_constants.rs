/// 翻译API与流水线配置常量
///
/// 该文件定义了翻译服务、缓存和并发相关的常量配置，方便统一管理和维护

/// 默认翻译API配置
pub mod api_config {
    /// 默认翻译API地址 (本地DeepLX兼容接口)
    pub const DEFAULT_API_URL: &str = "http://localhost:1188/translate";

    /// 请求超时时间（秒）
    pub const REQUEST_TIMEOUT_SECONDS: u64 = 30;

    /// 默认User-Agent
    pub const DEFAULT_USER_AGENT: &str = "md-translator/0.1.0";
}

/// 翻译服务配置
pub mod service_config {
    /// 默认源语言
    pub const DEFAULT_SOURCE_LANG: &str = "EN";

    /// 默认目标语言
    pub const DEFAULT_TARGET_LANG: &str = "JA";

    /// 支持的语言代码
    pub const SUPPORTED_LANGUAGES: &[&str] = &[
        "auto", "zh", "en", "ja", "ko", "fr", "de", "es", "it", "pt", "ru",
        "nl", "sv", "da", "fi", "pl", "cs", "sk", "hu", "ro", "bg", "et",
        "lv", "lt", "sl", "el", "tr", "uk", "id", "nb",
    ];

    /// 默认最大重试次数（0表示失败即终止）
    pub const DEFAULT_MAX_RETRIES: usize = 0;

    /// 重试初始延迟（毫秒）
    pub const RETRY_INITIAL_DELAY_MS: u64 = 500;

    /// 重试最大延迟（毫秒）
    pub const RETRY_MAX_DELAY_MS: u64 = 8000;
}

/// 翻译流水线配置
pub mod pipeline_config {
    /// 同时进行的翻译任务上限
    pub const DEFAULT_CONCURRENCY: usize = 10;

    /// 默认缓存数据库路径
    pub const DEFAULT_CACHE_PATH: &str = "translations.db";

    /// 翻译目标批次的字节上限
    pub const TARGET_BATCH_BYTES: usize = 4096;

    /// 翻译目标批次的默认输出目录
    pub const TARGET_OUTPUT_DIR: &str = "translation-targets";

    /// 缓存导出的默认文件名
    pub const DEFAULT_DUMP_FILE: &str = "db_dump.json";

    /// 合并Markdown的默认文件名
    pub const MERGED_FILE_NAME: &str = "merged.md";
}

/// 验证API URL是否有效
pub fn is_valid_api_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

/// 验证语言代码是否支持（大小写不敏感，允许 `EN-US` 这类地区后缀）
pub fn is_supported_language(lang: &str) -> bool {
    let lower = lang.to_ascii_lowercase();
    let primary = lower.split('-').next().unwrap_or("");
    service_config::SUPPORTED_LANGUAGES.contains(&primary)
}
