// ==========================================
// 线盘分配系统 - 输入校验器
// ==========================================
// 职责: API 入口处的字段格式与取值范围校验
// 说明: 标识格式规则来自配置 (config_kv), 引擎层不做任何校验
// ==========================================

use regex::Regex;

use crate::api::error::{ApiError, ApiResult};
use crate::config::ValidationPatterns;

// ==========================================
// InputValidator - 输入校验器
// ==========================================
#[derive(Debug, Clone)]
pub struct InputValidator {
    coil_reference: Regex,
    order_id: Regex,
    line_item: Regex,
}

impl InputValidator {
    /// 根据标识格式规则创建校验器
    ///
    /// # 返回
    /// - Err(ApiError::InvalidInput): 规则不是合法的正则表达式
    pub fn new(patterns: &ValidationPatterns) -> ApiResult<Self> {
        Ok(Self {
            coil_reference: compile("reference", &patterns.coil_reference)?,
            order_id: compile("order_id", &patterns.order_id)?,
            line_item: compile("line_item", &patterns.line_item)?,
        })
    }

    // ===== 线盘字段 =====

    pub fn validate_coil_reference(&self, reference: &str) -> ApiResult<()> {
        check_pattern("reference", &self.coil_reference, reference)
    }

    /// 校验线盘参数
    pub fn validate_coil(
        &self,
        reference: &str,
        product_id: &str,
        quantity: i64,
        recommended_balance: i64,
        acceptable_loss: i64,
    ) -> ApiResult<()> {
        self.validate_coil_reference(reference)?;
        validate_product_id(product_id)?;
        validate_positive("quantity", quantity)?;
        validate_non_negative("recommended_balance", recommended_balance)?;
        validate_non_negative("acceptable_loss", acceptable_loss)?;
        Ok(())
    }

    // ===== 订单行字段 =====

    pub fn validate_line_key(&self, order_id: &str, line_item: &str) -> ApiResult<()> {
        check_pattern("order_id", &self.order_id, order_id)?;
        check_pattern("line_item", &self.line_item, line_item)
    }

    /// 校验订单行参数
    pub fn validate_line(
        &self,
        order_id: &str,
        line_item: &str,
        product_id: &str,
        quantity: i64,
    ) -> ApiResult<()> {
        self.validate_line_key(order_id, line_item)?;
        validate_product_id(product_id)?;
        validate_positive("quantity", quantity)
    }
}

fn compile(field: &str, pattern: &str) -> ApiResult<Regex> {
    Regex::new(pattern).map_err(|e| {
        ApiError::InvalidInput(format!("字段{}的校验规则无效 ({}): {}", field, pattern, e))
    })
}

fn check_pattern(field: &str, regex: &Regex, value: &str) -> ApiResult<()> {
    if regex.is_match(value) {
        Ok(())
    } else {
        Err(ApiError::validation(
            field,
            format!("'{}' 不符合格式 {}", value, regex.as_str()),
        ))
    }
}

fn validate_product_id(product_id: &str) -> ApiResult<()> {
    if product_id.trim().is_empty() {
        return Err(ApiError::validation("product_id", "材料标识不能为空"));
    }
    Ok(())
}

fn validate_positive(field: &str, value: i64) -> ApiResult<()> {
    if value <= 0 {
        return Err(ApiError::validation(field, format!("必须大于0, 实际为{}", value)));
    }
    Ok(())
}

fn validate_non_negative(field: &str, value: i64) -> ApiResult<()> {
    if value < 0 {
        return Err(ApiError::validation(field, format!("不能为负数, 实际为{}", value)));
    }
    Ok(())
}
