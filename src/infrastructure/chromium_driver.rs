//! Chrome 驱动 - 基础设施层
//!
//! 持有唯一的 page 资源，所有页面操作都通过注入 JS 完成

use async_trait::async_trait;
use chromiumoxide::{Browser, Page};
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::debug;

use super::driver::{AutomationDriver, DriverError, DriverResult, Locator};
use crate::browser;
use crate::config::Config;

/// 等待元素时的轮询间隔
const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// 门户把业务页面放在这个 iframe 里
pub const DEFAULT_CONTENT_FRAME: &str = "ptifrmtgtframe";

/// 定位脚本模板：先在顶层文档找，找不到再进内容 iframe 找
const LOCATE_TEMPLATE: &str = r#"
(() => {
    const find = (doc) => {
        if (!doc) return [];
        const kind = __KIND__;
        const value = __VALUE__;
        if (kind === 'id') {
            const el = doc.getElementById(value);
            return el ? [el] : [];
        }
        const snap = doc.evaluate(value, doc, null, 7, null);
        const out = [];
        for (let i = 0; i < snap.snapshotLength; i++) out.push(snap.snapshotItem(i));
        return out;
    };
    let nodes = find(document);
    if (nodes.length === 0) {
        const frame = document.getElementById(__FRAME__);
        if (frame && frame.contentDocument) nodes = find(frame.contentDocument);
    }
    __BODY__
})()
"#;

const EXISTS_BODY: &str = "return nodes.length > 0;";

const CLICKABLE_BODY: &str =
    "const el = nodes[0]; return !!el && !el.disabled && el.getClientRects().length > 0;";

const CLICK_BODY: &str = r#"
    const el = nodes[0];
    if (!el) return false;
    if (el.tagName === 'OPTION') {
        el.selected = true;
        const select = el.closest('select');
        if (select) select.dispatchEvent(new Event('change', { bubbles: true }));
        return true;
    }
    el.scrollIntoView({ block: 'center' });
    el.click();
    return true;
"#;

const READ_TEXT_BODY: &str =
    "const el = nodes[0]; return el ? (el.innerText ?? el.textContent ?? '') : null;";

const LIST_BODY: &str = "return nodes.map((n) => n.innerText ?? n.textContent ?? '');";

/// Chrome 驱动
///
/// 职责：
/// - 持有 Browser 和唯一的 Page
/// - 把 `AutomationDriver` 的每个能力翻译成一段 JS
/// - 不认识学员 / 课程
pub struct ChromiumDriver {
    _browser: Browser,
    page: Page,
    frame_id: String,
}

impl ChromiumDriver {
    pub fn new(browser: Browser, page: Page, frame_id: impl Into<String>) -> Self {
        Self {
            _browser: browser,
            page,
            frame_id: frame_id.into(),
        }
    }

    /// 按配置连接已打开的浏览器，或者启动一个无头浏览器
    pub async fn open(config: &Config) -> anyhow::Result<Self> {
        let (browser, page) = if config.headless {
            browser::launch_headless_browser(
                &config.portal_url,
                config.chrome_executable.as_deref(),
            )
            .await?
        } else {
            browser::connect_to_browser_and_page(
                config.browser_debug_port,
                Some(&config.portal_url),
                None,
            )
            .await?
        };

        Ok(Self::new(browser, page, DEFAULT_CONTENT_FRAME))
    }

    /// 执行 JS 代码并返回 JSON 结果
    async fn eval(&self, js_code: String) -> DriverResult<JsonValue> {
        let result = self.page.evaluate(js_code).await?;
        let json_value = result.into_value()?;
        Ok(json_value)
    }

    /// 执行 JS 代码并反序列化为指定类型
    async fn eval_as<T: DeserializeOwned>(&self, js_code: String) -> DriverResult<T> {
        let json_value = self.eval(js_code).await?;
        let typed_value = serde_json::from_value(json_value)?;
        Ok(typed_value)
    }

    /// 反复检查直到条件成立或超时
    async fn poll_until(
        &self,
        locator: &Locator,
        timeout: Duration,
        body: &str,
    ) -> DriverResult<()> {
        let script = locate_script(locator, &self.frame_id, body)?;
        let deadline = Instant::now() + timeout;

        loop {
            match self.eval_as::<bool>(script.clone()).await {
                Ok(true) => return Ok(()),
                Ok(false) => {}
                // 页面跳转期间执行上下文会被销毁，继续等
                Err(e) => debug!("等待 {} 时脚本失败: {}", locator, e),
            }

            if Instant::now() >= deadline {
                return Err(DriverError::timeout(locator, timeout));
            }
            sleep(POLL_INTERVAL).await;
        }
    }
}

#[async_trait]
impl AutomationDriver for ChromiumDriver {
    async fn navigate(&self, target: &str) -> DriverResult<()> {
        debug!("导航到: {}", target);
        self.page.goto(target).await?;
        Ok(())
    }

    async fn await_element(&self, locator: &Locator, timeout: Duration) -> DriverResult<()> {
        self.poll_until(locator, timeout, EXISTS_BODY).await
    }

    async fn await_clickable(&self, locator: &Locator, timeout: Duration) -> DriverResult<()> {
        self.poll_until(locator, timeout, CLICKABLE_BODY).await
    }

    async fn fill(&self, locator: &Locator, text: &str) -> DriverResult<()> {
        let body = format!(
            r#"
            const el = nodes[0];
            if (!el) return false;
            if (document.activeElement) document.activeElement.blur();
            el.focus();
            el.value = '';
            el.value = {};
            el.dispatchEvent(new Event('input', {{ bubbles: true }}));
            el.dispatchEvent(new Event('change', {{ bubbles: true }}));
            el.blur();
            return true;
            "#,
            serde_json::to_string(text)?
        );
        let script = locate_script(locator, &self.frame_id, &body)?;
        if self.eval_as::<bool>(script).await? {
            Ok(())
        } else {
            Err(DriverError::not_found(locator))
        }
    }

    async fn click(&self, locator: &Locator) -> DriverResult<()> {
        let script = locate_script(locator, &self.frame_id, CLICK_BODY)?;
        if self.eval_as::<bool>(script).await? {
            Ok(())
        } else {
            Err(DriverError::not_found(locator))
        }
    }

    async fn read_text(&self, locator: &Locator) -> DriverResult<String> {
        let script = locate_script(locator, &self.frame_id, READ_TEXT_BODY)?;
        self.eval_as::<Option<String>>(script)
            .await?
            .ok_or_else(|| DriverError::not_found(locator))
    }

    async fn list_children(&self, locator: &Locator) -> DriverResult<Vec<String>> {
        let script = locate_script(locator, &self.frame_id, LIST_BODY)?;
        self.eval_as(script).await
    }

    async fn close(&self) -> DriverResult<()> {
        self.page.clone().close().await?;
        Ok(())
    }
}

/// 拼出定位脚本，所有外部字符串都经过 JSON 转义
fn locate_script(locator: &Locator, frame_id: &str, body: &str) -> DriverResult<String> {
    let (kind, value) = match locator {
        Locator::Id(id) => ("id", id),
        Locator::XPath(expr) => ("xpath", expr),
    };

    // body 最后替换，避免其中的文本再被当成占位符
    Ok(LOCATE_TEMPLATE
        .replace("__KIND__", &serde_json::to_string(kind)?)
        .replace("__VALUE__", &serde_json::to_string(value)?)
        .replace("__FRAME__", &serde_json::to_string(frame_id)?)
        .replace("__BODY__", body))
}
