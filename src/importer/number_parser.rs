// ==========================================
// 物料库存对账系统 - 区域数字解析
// ==========================================
// 优先级:
// 1. "1.234,56" / "8,00" / "600 800,00": 逗号为小数点，点与空白为千分位
// 2. "1.234.567": 点为千分位
// 3. 其余: 去掉逗号与空白后按普通小数解析（取最长合法前缀）
// ==========================================

use once_cell::sync::Lazy;
use regex::Regex;

static COMMA_DECIMAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[\d\s.]+,\d{2}$").unwrap_or_else(|e| panic!("invalid regex: {e}"))
});

static DOT_THOUSANDS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d{1,3}(\.\d{3})+$").unwrap_or_else(|e| panic!("invalid regex: {e}"))
});

static LEADING_DECIMAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[+-]?(\d+\.?\d*|\.\d+)([eE][+-]?\d+)?")
        .unwrap_or_else(|e| panic!("invalid regex: {e}"))
});

/// 解析区域格式数字文本
///
/// 空文本或无法解析时返回 None
pub fn parse_locale_number(raw: &str) -> Option<f64> {
    let text = raw.trim();
    if text.is_empty() {
        return None;
    }

    let normalized: String = if COMMA_DECIMAL.is_match(text) {
        text.chars()
            .filter(|c| !c.is_whitespace() && *c != '.')
            .map(|c| if c == ',' { '.' } else { c })
            .collect()
    } else if DOT_THOUSANDS.is_match(text) {
        text.chars().filter(|c| *c != '.').collect()
    } else {
        text.chars()
            .filter(|c| !c.is_whitespace() && *c != ',')
            .collect()
    };

    LEADING_DECIMAL
        .find(&normalized)
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .filter(|v| v.is_finite())
}
