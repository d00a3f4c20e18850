//! 门户页面元素定位
//!
//! 所有页面结构知识集中在这里，流程代码只认函数名

use crate::infrastructure::Locator;

const RESULT_ROWS: &str = r#"//*[@id="PTSRCHRESULTS"]/tbody/tr"#;
const LESSON_TABLE: &str = r#"//*[@id="STDNT_ENRL$scroll$0"]"#;
const LESSON_FIRST_CELLS: &str = r#"//*[@id="STDNT_ENRL$scroll$0"]//tr[td]/td[1]"#;
const REASON_OPTIONS: &str = r#"//*[@id="DIG_APR_EST_WRK_ATTEND_REASON"]/option"#;

// ========== 登录 ==========

pub fn user_field() -> Locator {
    Locator::id("userid")
}

pub fn password_field() -> Locator {
    Locator::id("pwd")
}

pub fn login_button() -> Locator {
    Locator::xpath(r#"//*[@id="login"]/div/div[1]/div[8]/input"#)
}

// ========== 入口菜单 ==========

/// 门户首页 → 课程管理 → 考勤 → 学员考勤
pub fn entry_menu() -> Vec<Locator> {
    vec![
        Locator::xpath(r#"//*[@id="pthnavbca_PORTAL_ROOT_OBJECT"]"#),
        Locator::xpath(r#"//*[@id="fldra_HCSR_CURRICULUM_MANAGEMENT"]"#),
        Locator::xpath(r#"//*[@id="fldra_HCSR_ATTENDANCE_ROSTER"]"#),
        Locator::xpath(r#"//*[@id="crefli_HC_STDNT_ATTENDANCE_GBL"]/a"#),
    ]
}

// ========== 搜索 ==========

pub fn search_field() -> Locator {
    Locator::id("OR_ATND_SRCH_EMPLID")
}

pub fn search_button() -> Locator {
    Locator::id("#ICSearch")
}

pub fn results_table() -> Locator {
    Locator::id("PTSRCHRESULTS")
}

pub fn result_rows() -> Locator {
    Locator::xpath(RESULT_ROWS)
}

/// 第 `index` 行（从 0 开始）里的链接
pub fn result_row_link(index: usize) -> Locator {
    Locator::xpath(format!("({})[{}]//a", RESULT_ROWS, index + 1))
}

// ========== 课程表 ==========

pub fn lesson_table() -> Locator {
    Locator::xpath(LESSON_TABLE)
}

pub fn lesson_first_cells() -> Locator {
    Locator::xpath(LESSON_FIRST_CELLS)
}

/// 第一列第 `position` 个单元格（从 0 开始）里的链接
pub fn lesson_link(position: usize) -> Locator {
    Locator::xpath(format!("({})[{}]//a", LESSON_FIRST_CELLS, position + 1))
}

// ========== 课程详情 ==========

pub fn marker_panel() -> Locator {
    Locator::id("ACE_DERIVED_AA2_")
}

pub fn back_link() -> Locator {
    Locator::id("DERIVED_AA2_DERIVED_LINK10$0")
}

pub fn absence_tab() -> Locator {
    Locator::id("ICTAB_1")
}

pub fn start_date_field() -> Locator {
    Locator::id("DIG_APR_EST_WRK_START_DT")
}

pub fn end_date_field() -> Locator {
    Locator::id("DIG_APR_EST_WRK_END_DT")
}

pub fn reason_select() -> Locator {
    Locator::id("DIG_APR_EST_WRK_ATTEND_REASON")
}

pub fn reason_options() -> Locator {
    Locator::xpath(REASON_OPTIONS)
}

pub fn reason_option(index: usize) -> Locator {
    Locator::xpath(format!("({})[{}]", REASON_OPTIONS, index + 1))
}

pub fn justification_field() -> Locator {
    Locator::id("DIG_APR_EST_WRK_REASON_DESCR")
}

pub fn apply_button() -> Locator {
    Locator::id("DIG_APR_EST_WRK_PROCESS_BTN")
}

pub fn save_button() -> Locator {
    Locator::id("#ICSave")
}
