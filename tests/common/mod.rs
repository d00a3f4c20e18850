//! 集成测试用的假门户
//!
//! 按 `selectors` 的函数识别元素，记录每一次调用，不真正等待。

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;

use lesson_launcher::config::{Config, ReasonLabel};
use lesson_launcher::control::ControlToken;
use lesson_launcher::infrastructure::{AutomationDriver, DriverError, DriverResult, Locator};
use lesson_launcher::models::{progress_channel, ProgressEvent, ProgressReceiver, Record};
use lesson_launcher::orchestrator::WorkflowEngine;
use lesson_launcher::services::{selectors, MemoryLogSink};

/// 没有等待、没有跳转延迟的配置
pub fn test_config() -> Config {
    Config {
        username: "operador".to_string(),
        password: "segredo".to_string(),
        element_timeout: Duration::from_millis(10),
        page_timeout: Duration::from_millis(10),
        settle_delay: Duration::ZERO,
        ..Config::default()
    }
}

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

pub fn record(id: &str) -> Record {
    Record::new(id, date(2025, 2, 1), date(2025, 2, 10))
}

/// 读完通道里已有的事件
pub fn drain(events: &mut ProgressReceiver) -> Vec<ProgressEvent> {
    let mut out = Vec::new();
    while let Ok(event) = events.try_recv() {
        out.push(event);
    }
    out
}

/// 引擎加上能在断言时读取的假门户、内存日志和事件
pub struct Harness {
    pub portal: FakePortal,
    pub sink: Arc<MemoryLogSink>,
    pub control: ControlToken,
    pub events: ProgressReceiver,
    pub engine: WorkflowEngine,
}

pub fn harness(portal: FakePortal, config: Config) -> Harness {
    let sink = Arc::new(MemoryLogSink::new());
    let control = ControlToken::new();
    portal.attach(control.clone());
    let (tx, events) = progress_channel();
    let engine = WorkflowEngine::new(
        config,
        Box::new(portal.clone()),
        Box::new(sink.clone()),
        control.clone(),
        tx,
    );
    Harness {
        portal,
        sink,
        control,
        events,
        engine,
    }
}

/// 课程表中的一行
#[derive(Debug, Clone)]
pub struct FakeLesson {
    pub number: String,
    pub marker: String,
    pub opens: bool,
}

impl FakeLesson {
    pub fn enrolled(number: &str) -> Self {
        Self {
            number: number.to_string(),
            marker: "Matriculado".to_string(),
            opens: true,
        }
    }

    pub fn conflict(number: &str) -> Self {
        Self {
            marker: "Matriculado | Curso FIC".to_string(),
            ..Self::enrolled(number)
        }
    }

    pub fn no_marker(number: &str) -> Self {
        Self {
            marker: "Trancado".to_string(),
            ..Self::enrolled(number)
        }
    }

    /// 链接点不开
    pub fn broken(number: &str) -> Self {
        Self {
            opens: false,
            ..Self::enrolled(number)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Navigate(String),
    Fill(Locator, String),
    Click(Locator),
}

/// 第 n 次保存之后对控制令牌做的动作
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hook {
    Pause,
    Cancel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Page {
    Start,
    Search,
    Results,
    Lessons,
    Detail(usize),
}

struct Student {
    results: Vec<String>,
    lessons: Vec<FakeLesson>,
}

struct PortalState {
    students: HashMap<String, Student>,
    page: Page,
    pending_search: String,
    current: Option<String>,
    calls: Vec<Call>,
    saves: Vec<(String, String)>,
    save_hooks: HashMap<usize, Hook>,
    control: Option<ControlToken>,
    missing: Vec<Locator>,
    closed: bool,
}

/// 假门户，克隆得到的是同一个门户
#[derive(Clone)]
pub struct FakePortal {
    state: Arc<Mutex<PortalState>>,
}

impl Default for FakePortal {
    fn default() -> Self {
        Self::new()
    }
}

impl FakePortal {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(PortalState {
                students: HashMap::new(),
                page: Page::Start,
                pending_search: String::new(),
                current: None,
                calls: Vec::new(),
                saves: Vec::new(),
                save_hooks: HashMap::new(),
                control: None,
                missing: Vec::new(),
                closed: false,
            })),
        }
    }

    /// 学员只有一行、匹配 2025 年 EMÉDIO 的注册
    pub fn with_student(self, id: &str, lessons: Vec<FakeLesson>) -> Self {
        let row = format!("{} Ana Souza EMÉDIO 2025", id);
        self.with_results(id, &[row.as_str()], lessons)
    }

    pub fn with_results(self, id: &str, rows: &[&str], lessons: Vec<FakeLesson>) -> Self {
        self.lock().students.insert(
            id.to_string(),
            Student {
                results: rows.iter().map(|s| s.to_string()).collect(),
                lessons,
            },
        );
        self
    }

    /// 让某个元素在页面上不存在
    pub fn without(self, locator: Locator) -> Self {
        self.lock().missing.push(locator);
        self
    }

    pub fn on_save(self, nth: usize, hook: Hook) -> Self {
        self.lock().save_hooks.insert(nth, hook);
        self
    }

    pub fn attach(&self, control: ControlToken) {
        self.lock().control = Some(control);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    /// (学员, 课程) 每次保存一条
    pub fn saves(&self) -> Vec<(String, String)> {
        self.lock().saves.clone()
    }

    /// 依次搜索过的学员 ID
    pub fn searched(&self) -> Vec<String> {
        let field = selectors::search_field();
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Fill(locator, text) if locator == field => Some(text),
                _ => None,
            })
            .collect()
    }

    pub fn fills_of(&self, locator: &Locator) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Fill(l, text) if &l == locator => Some(text),
                _ => None,
            })
            .collect()
    }

    pub fn clicks_of(&self, locator: &Locator) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, Call::Click(l) if l == locator))
            .count()
    }

    pub fn closed(&self) -> bool {
        self.lock().closed
    }

    fn lock(&self) -> MutexGuard<'_, PortalState> {
        self.state.lock().unwrap()
    }
}

impl PortalState {
    fn student(&self) -> Option<&Student> {
        self.current.as_ref().and_then(|id| self.students.get(id))
    }

    fn lessons(&self) -> &[FakeLesson] {
        self.student().map(|s| s.lessons.as_slice()).unwrap_or(&[])
    }

    fn exists(&self, locator: &Locator) -> bool {
        if self.missing.contains(locator) {
            return false;
        }
        if *locator == selectors::results_table() {
            return self.page == Page::Results && self.student().is_some();
        }
        if *locator == selectors::lesson_table() {
            return self.page == Page::Lessons;
        }
        if *locator == selectors::marker_panel() {
            return matches!(self.page, Page::Detail(_));
        }
        if let Some(pos) = index_of(locator, selectors::lesson_link) {
            return self.page == Page::Lessons
                && self.lessons().get(pos).map(|l| l.opens).unwrap_or(false);
        }
        true
    }

    fn after_save(&mut self) {
        if let (Page::Detail(pos), Some(id)) = (self.page, self.current.clone()) {
            let number = self.lessons()[pos].number.clone();
            self.saves.push((id, number));
        }
        let hook = self.save_hooks.get(&self.saves.len()).copied();
        if let (Some(hook), Some(control)) = (hook, self.control.as_ref()) {
            match hook {
                Hook::Pause => control.pause(),
                Hook::Cancel => control.cancel(),
            }
        }
    }
}

fn index_of(locator: &Locator, build: fn(usize) -> Locator) -> Option<usize> {
    (0..64).find(|&i| build(i) == *locator)
}

#[async_trait]
impl AutomationDriver for FakePortal {
    async fn navigate(&self, target: &str) -> DriverResult<()> {
        let mut state = self.lock();
        state.calls.push(Call::Navigate(target.to_string()));
        state.page = Page::Start;
        Ok(())
    }

    async fn await_element(&self, locator: &Locator, timeout: Duration) -> DriverResult<()> {
        if self.lock().exists(locator) {
            Ok(())
        } else {
            Err(DriverError::timeout(locator, timeout))
        }
    }

    async fn await_clickable(&self, locator: &Locator, timeout: Duration) -> DriverResult<()> {
        self.await_element(locator, timeout).await
    }

    async fn fill(&self, locator: &Locator, text: &str) -> DriverResult<()> {
        let mut state = self.lock();
        state.calls.push(Call::Fill(locator.clone(), text.to_string()));
        if !state.exists(locator) {
            return Err(DriverError::not_found(locator));
        }
        if *locator == selectors::search_field() {
            state.pending_search = text.to_string();
        }
        Ok(())
    }

    async fn click(&self, locator: &Locator) -> DriverResult<()> {
        let mut state = self.lock();
        state.calls.push(Call::Click(locator.clone()));
        if !state.exists(locator) {
            return Err(DriverError::not_found(locator));
        }

        if selectors::entry_menu().contains(locator) {
            state.page = Page::Search;
        } else if *locator == selectors::search_button() {
            state.current = Some(state.pending_search.clone());
            state.page = Page::Results;
        } else if let Some(row) = index_of(locator, selectors::result_row_link) {
            let rows = state.student().map(|s| s.results.len()).unwrap_or(0);
            if row >= rows {
                return Err(DriverError::not_found(locator));
            }
            state.page = Page::Lessons;
        } else if let Some(pos) = index_of(locator, selectors::lesson_link) {
            state.page = Page::Detail(pos);
        } else if *locator == selectors::back_link() {
            state.page = Page::Lessons;
        } else if *locator == selectors::save_button() {
            state.after_save();
        }
        Ok(())
    }

    async fn read_text(&self, locator: &Locator) -> DriverResult<String> {
        let state = self.lock();
        match state.page {
            Page::Detail(pos) if *locator == selectors::marker_panel() => {
                Ok(state.lessons()[pos].marker.clone())
            }
            _ => Err(DriverError::not_found(locator)),
        }
    }

    async fn list_children(&self, locator: &Locator) -> DriverResult<Vec<String>> {
        let state = self.lock();
        if *locator == selectors::result_rows() {
            Ok(state.student().map(|s| s.results.clone()).unwrap_or_default())
        } else if *locator == selectors::lesson_first_cells() {
            Ok(state.lessons().iter().map(|l| l.number.clone()).collect())
        } else if *locator == selectors::reason_options() {
            let mut options = vec![String::new()];
            options.extend(ReasonLabel::ALL.iter().map(|r| r.label().to_string()));
            Ok(options)
        } else {
            Ok(Vec::new())
        }
    }

    async fn close(&self) -> DriverResult<()> {
        self.lock().closed = true;
        Ok(())
    }
}
