use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;

/// 缺勤原因（门户下拉框里固定的几个选项）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReasonLabel {
    /// 法定保障，需要填写依据代码
    AmparoLegal,
    /// 医疗证明
    AtestadoMedico,
    /// 产假
    LicencaMaternidade,
    /// 服兵役
    ServicoMilitar,
}

impl ReasonLabel {
    pub const ALL: [ReasonLabel; 4] = [
        ReasonLabel::AmparoLegal,
        ReasonLabel::AtestadoMedico,
        ReasonLabel::LicencaMaternidade,
        ReasonLabel::ServicoMilitar,
    ];

    /// 下拉框里显示的标签，按这个文本精确匹配
    pub fn label(self) -> &'static str {
        match self {
            ReasonLabel::AmparoLegal => "Amparo Legal",
            ReasonLabel::AtestadoMedico => "Atestado Médico",
            ReasonLabel::LicencaMaternidade => "Licença Maternidade",
            ReasonLabel::ServicoMilitar => "Serviço Militar",
        }
    }

    /// 是否需要额外的依据代码
    pub fn requires_code(self) -> bool {
        matches!(self, ReasonLabel::AmparoLegal)
    }
}

impl fmt::Display for ReasonLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ReasonLabel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        ReasonLabel::ALL
            .into_iter()
            .find(|r| r.label().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ConfigError::UnknownReason {
                value: wanted.to_string(),
            })
    }
}

/// 程序配置
#[derive(Clone, Debug)]
pub struct Config {
    // --- 浏览器 ---
    /// 门户登录地址
    pub portal_url: String,
    /// 浏览器调试端口（连接模式）
    pub browser_debug_port: u16,
    /// 是否自己启动无头浏览器
    pub headless: bool,
    /// 浏览器可执行文件路径（无头模式）
    pub chrome_executable: Option<String>,
    // --- 输入输出 ---
    /// 学员表（.xlsx 等表格文件，或 TOML 导出）
    pub records_file: String,
    /// 表格文件中的工作表名
    pub records_sheet: String,
    /// 运行日志目录
    pub log_dir: String,
    // --- 登录 ---
    pub username: String,
    pub password: String,
    // --- 业务规则 ---
    /// 搜索结果行里必须出现的年份
    pub target_year: String,
    /// 搜索结果行里必须出现的课程标记
    pub program_marker: String,
    /// 课程详情里表示"已注册"的标记
    pub enrollment_marker: String,
    /// 与注册标记同时出现时跳过该课程的类别标记
    pub exclusion_marker: String,
    pub reason: ReasonLabel,
    pub justification_code: Option<String>,
    /// 放宽课程编号长度限制
    pub wide_admission: bool,
    /// 课程编号最大位数
    pub max_lesson_digits: usize,
    // --- 时间 ---
    pub element_timeout: Duration,
    pub page_timeout: Duration,
    /// 页面内跳转后的等待时间
    pub settle_delay: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            portal_url: "https://senaconline-interno.sp.senac.br/psp/cs90pss/?cmd=login&languageCd=POR"
                .to_string(),
            browser_debug_port: 9222,
            headless: false,
            chrome_executable: None,
            records_file: "atestados.xlsx".to_string(),
            records_sheet: "Plan1".to_string(),
            log_dir: "log".to_string(),
            username: String::new(),
            password: String::new(),
            target_year: "2025".to_string(),
            program_marker: "EMÉDIO".to_string(),
            enrollment_marker: "Matric".to_string(),
            exclusion_marker: "FIC".to_string(),
            reason: ReasonLabel::AmparoLegal,
            justification_code: Some("0000000001".to_string()),
            wide_admission: false,
            max_lesson_digits: 4,
            element_timeout: Duration::from_secs(15),
            page_timeout: Duration::from_secs(20),
            settle_delay: Duration::from_millis(2000),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            portal_url: env_or("PORTAL_URL", default.portal_url),
            browser_debug_port: env_parse("BROWSER_DEBUG_PORT").unwrap_or(default.browser_debug_port),
            headless: env_parse("HEADLESS").unwrap_or(default.headless),
            chrome_executable: std::env::var("CHROME_EXECUTABLE").ok().or(default.chrome_executable),
            records_file: env_or("RECORDS_FILE", default.records_file),
            records_sheet: env_or("RECORDS_SHEET", default.records_sheet),
            log_dir: env_or("LOG_DIR", default.log_dir),
            username: env_or("PORTAL_USER", default.username),
            password: env_or("PORTAL_PASSWORD", default.password),
            target_year: env_or("TARGET_YEAR", default.target_year),
            program_marker: env_or("PROGRAM_MARKER", default.program_marker),
            enrollment_marker: env_or("ENROLLMENT_MARKER", default.enrollment_marker),
            exclusion_marker: env_or("EXCLUSION_MARKER", default.exclusion_marker),
            reason: env_parse("REASON_LABEL").unwrap_or(default.reason),
            justification_code: std::env::var("JUSTIFICATION_CODE").ok().or(default.justification_code),
            wide_admission: env_parse("WIDE_ADMISSION").unwrap_or(default.wide_admission),
            max_lesson_digits: env_parse("MAX_LESSON_DIGITS").unwrap_or(default.max_lesson_digits),
            element_timeout: env_parse("ELEMENT_TIMEOUT_SECS").map(Duration::from_secs).unwrap_or(default.element_timeout),
            page_timeout: env_parse("PAGE_TIMEOUT_SECS").map(Duration::from_secs).unwrap_or(default.page_timeout),
            settle_delay: env_parse("SETTLE_DELAY_MS").map(Duration::from_millis).unwrap_or(default.settle_delay),
        }
    }

    /// 检查配置组合是否可用
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.target_year.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "target_year",
                reason: "不能为空".to_string(),
            });
        }
        if self.max_lesson_digits == 0 {
            return Err(ConfigError::Invalid {
                field: "max_lesson_digits",
                reason: "必须大于 0".to_string(),
            });
        }
        if self.reason.requires_code() && self.justification().is_none() {
            return Err(ConfigError::MissingJustification {
                reason: self.reason.label().to_string(),
            });
        }
        Ok(())
    }

    /// 当前原因实际要填写的依据代码
    pub fn justification(&self) -> Option<&str> {
        if !self.reason.requires_code() {
            return None;
        }
        self.justification_code
            .as_deref()
            .map(str::trim)
            .filter(|code| !code.is_empty())
    }
}

fn env_or(name: &str, default: String) -> String {
    std::env::var(name).unwrap_or(default)
}

fn env_parse<T: FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.trim().parse().ok())
}
