//! 基础设施层 - 持有稀缺资源（浏览器页面），只暴露能力

pub mod chromium_driver;
pub mod driver;

pub use chromium_driver::ChromiumDriver;
pub use driver::{AutomationDriver, DriverError, DriverResult, Locator};
