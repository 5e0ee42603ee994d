//! Values injected into every rendered page.

use serde::Serialize;
use serde_json::{Map, Value};

pub const APP_NAME: &str = "CryptoScore Pro";
pub const CURRENT_YEAR: i32 = 2025;

#[derive(Clone, Debug, Serialize)]
pub struct TemplateGlobals {
    pub app_name: &'static str,
    pub current_year: i32,
}

impl Default for TemplateGlobals {
    fn default() -> Self {
        TemplateGlobals {
            app_name: APP_NAME,
            current_year: CURRENT_YEAR,
        }
    }
}

impl TemplateGlobals {
    /// Merge the globals into a page context. Keys set by the page win.
    pub fn render(&self, page: Value) -> Value {
        let mut ctx = Map::new();
        ctx.insert("app_name".into(), Value::from(self.app_name));
        ctx.insert("current_year".into(), Value::from(self.current_year));
        match page {
            Value::Object(fields) => ctx.extend(fields),
            Value::Null => {}
            other => {
                ctx.insert("content".into(), other);
            }
        }
        Value::Object(ctx)
    }
}
