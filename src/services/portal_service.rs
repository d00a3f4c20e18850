//! 门户操作服务 - 业务能力层
//!
//! 把驱动的原子能力组合成门户上的一个个动作。
//! 可选的界面元素（菜单、登录框、页签）等不到就跳过；
//! 决定结果的元素（搜索框、课程表、表单字段）等不到就报错，由调用方决定如何记录。

use anyhow::{anyhow, Context, Result};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::infrastructure::{AutomationDriver, DriverResult, Locator};
use crate::models::Record;
use crate::services::selectors;

/// 一次缺勤说明要填写的内容
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AbsenceForm {
    /// `dd/mm/yyyy`
    pub start: String,
    /// `dd/mm/yyyy`
    pub end: String,
    pub reason_label: String,
    pub justification: Option<String>,
}

impl AbsenceForm {
    pub fn new(record: &Record, config: &Config) -> Self {
        Self {
            start: record.start_text(),
            end: record.end_text(),
            reason_label: config.reason.label().to_string(),
            justification: config.justification().map(str::to_string),
        }
    }
}

/// 门户操作服务
///
/// 职责：
/// - 登录、进入考勤入口、搜索学员、读取课程表、填写缺勤表单
/// - 只处理当前页面上的一个动作
/// - 不关心流程顺序，也不做取消检查
pub struct PortalService {
    portal_url: String,
    element_timeout: Duration,
    page_timeout: Duration,
    settle_delay: Duration,
}

impl PortalService {
    pub fn new(config: &Config) -> Self {
        Self {
            portal_url: config.portal_url.clone(),
            element_timeout: config.element_timeout,
            page_timeout: config.page_timeout,
            settle_delay: config.settle_delay,
        }
    }

    // ========== 会话 ==========

    /// 打开门户并登录
    ///
    /// 打不开门户是致命错误；登录框等不到时照常继续（可能已登录）
    pub async fn login(
        &self,
        driver: &dyn AutomationDriver,
        username: &str,
        password: &str,
    ) -> Result<()> {
        info!("🔐 正在打开门户并登录...");
        driver
            .navigate(&self.portal_url)
            .await
            .with_context(|| format!("无法打开门户: {}", self.portal_url))?;

        self.fill_when_ready(driver, &selectors::user_field(), username)
            .await;
        self.fill_when_ready(driver, &selectors::password_field(), password)
            .await;
        self.click_when_ready(driver, &selectors::login_button())
            .await;
        Ok(())
    }

    /// 通过菜单进入学员考勤搜索页，返回成功点击的菜单数
    pub async fn open_entry_screen(&self, driver: &dyn AutomationDriver) -> usize {
        let menu = selectors::entry_menu();
        let mut clicked = 0;
        for item in &menu {
            if self.click_when_ready(driver, item).await {
                clicked += 1;
            }
        }
        if clicked < menu.len() {
            warn!("入口菜单只点击了 {}/{} 项", clicked, menu.len());
        }
        clicked
    }

    /// 等待页面内跳转完成
    pub async fn settle(&self) {
        if !self.settle_delay.is_zero() {
            sleep(self.settle_delay).await;
        }
    }

    // ========== 搜索 ==========

    /// 按学员 ID 搜索，返回结果表每一行的文本
    ///
    /// 没有结果表视为没有结果
    pub async fn search(
        &self,
        driver: &dyn AutomationDriver,
        identifier: &str,
    ) -> DriverResult<Vec<String>> {
        self.fill_required(driver, &selectors::search_field(), identifier)
            .await?;
        self.click_required(driver, &selectors::search_button())
            .await?;

        match driver
            .await_element(&selectors::results_table(), self.page_timeout)
            .await
        {
            Ok(()) => driver.list_children(&selectors::result_rows()).await,
            Err(e) if e.is_absent() => {
                debug!("学员 {} 没有搜索结果表: {}", identifier, e);
                Ok(Vec::new())
            }
            Err(e) => Err(e),
        }
    }

    /// 找到第一行同时包含目标年份和课程标记的结果（不排序，先到先得）
    pub fn find_match(rows: &[String], target_year: &str, program_marker: &str) -> Option<usize> {
        let year = target_year.to_uppercase();
        let program = program_marker.to_uppercase();
        rows.iter().position(|row| {
            let text = row.to_uppercase();
            text.contains(&year) && text.contains(&program)
        })
    }

    /// 打开搜索结果中的一行
    pub async fn open_result(&self, driver: &dyn AutomationDriver, index: usize) -> DriverResult<()> {
        self.click_required(driver, &selectors::result_row_link(index))
            .await?;
        self.settle().await;
        Ok(())
    }

    // ========== 课程表 ==========

    /// 读取课程表第一列（每次都重新读取，不缓存）
    pub async fn lesson_cells(&self, driver: &dyn AutomationDriver) -> DriverResult<Vec<String>> {
        driver
            .await_element(&selectors::lesson_table(), self.page_timeout)
            .await?;
        driver.list_children(&selectors::lesson_first_cells()).await
    }

    pub async fn open_lesson(&self, driver: &dyn AutomationDriver, position: usize) -> DriverResult<()> {
        self.click_required(driver, &selectors::lesson_link(position))
            .await?;
        self.settle().await;
        Ok(())
    }

    /// 读取课程详情里的标记文本
    pub async fn read_marker(&self, driver: &dyn AutomationDriver) -> DriverResult<String> {
        let panel = selectors::marker_panel();
        driver.await_element(&panel, self.page_timeout).await?;
        driver.read_text(&panel).await
    }

    /// 从课程详情回到课程表
    pub async fn back_to_lessons(&self, driver: &dyn AutomationDriver) -> DriverResult<()> {
        self.click_required(driver, &selectors::back_link()).await?;
        self.settle().await;
        Ok(())
    }

    // ========== 缺勤表单 ==========

    /// 填写并提交缺勤说明（应用 → 保存）
    pub async fn submit_absence(&self, driver: &dyn AutomationDriver, form: &AbsenceForm) -> Result<()> {
        // 页签可能已经是当前页
        self.click_when_ready(driver, &selectors::absence_tab())
            .await;

        self.fill_required(driver, &selectors::start_date_field(), &form.start)
            .await
            .context("填写开始日期失败")?;
        self.fill_required(driver, &selectors::end_date_field(), &form.end)
            .await
            .context("填写结束日期失败")?;

        self.select_reason(driver, &form.reason_label).await?;

        if let Some(code) = form.justification.as_deref() {
            self.fill_required(driver, &selectors::justification_field(), code)
                .await
                .context("填写依据代码失败")?;
        }

        self.click_required(driver, &selectors::apply_button())
            .await
            .context("点击应用失败")?;
        self.click_required(driver, &selectors::save_button())
            .await
            .context("点击保存失败")?;

        debug!("✓ 缺勤说明已提交: {} a {}", form.start, form.end);
        Ok(())
    }

    /// 按标签精确匹配选择缺勤原因
    async fn select_reason(&self, driver: &dyn AutomationDriver, label: &str) -> Result<()> {
        driver
            .await_element(&selectors::reason_select(), self.element_timeout)
            .await
            .context("缺勤原因下拉框未出现")?;

        let options = driver.list_children(&selectors::reason_options()).await?;
        let index = options
            .iter()
            .position(|option| option.trim() == label)
            .ok_or_else(|| anyhow!("门户没有提供缺勤原因 '{}' (可选: {:?})", label, options))?;

        driver.click(&selectors::reason_option(index)).await?;
        debug!("✓ 已选择缺勤原因: {}", label);
        Ok(())
    }

    // ========== 等待后操作 ==========

    /// 等元素出现后填写；等不到就跳过
    async fn fill_when_ready(&self, driver: &dyn AutomationDriver, locator: &Locator, text: &str) -> bool {
        match self.fill_required(driver, locator, text).await {
            Ok(()) => true,
            Err(e) => {
                debug!("跳过填写 {}: {}", locator, e);
                false
            }
        }
    }

    /// 等元素可点击后点击；等不到就跳过
    async fn click_when_ready(&self, driver: &dyn AutomationDriver, locator: &Locator) -> bool {
        match self.click_required(driver, locator).await {
            Ok(()) => true,
            Err(e) => {
                debug!("跳过点击 {}: {}", locator, e);
                false
            }
        }
    }

    async fn fill_required(&self, driver: &dyn AutomationDriver, locator: &Locator, text: &str) -> DriverResult<()> {
        driver.await_element(locator, self.element_timeout).await?;
        driver.fill(locator, text).await
    }

    async fn click_required(&self, driver: &dyn AutomationDriver, locator: &Locator) -> DriverResult<()> {
        driver.await_clickable(locator, self.element_timeout).await?;
        driver.click(locator).await
    }
}
