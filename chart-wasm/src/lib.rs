//! Bridge WASM <-> JavaScript trung lập framework.
//!
//! Phía JavaScript lo việc tải và hiển thị; bridge chỉ nhận bản ghi đã tải
//! dưới dạng object thuần và trả về bảng đã hợp nhất.

use chart_core::{
    build_flowsheet, consolidate_medications, consolidate_orders, ChartConfig, ChartError,
    ClinicalOrder, ConceptDetail, MedicationOrder, ObservationMatrix, PriorityOrder,
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use serde_wasm_bindgen::{from_value, to_value};
use wasm_bindgen::prelude::*;

#[derive(Deserialize, Default)]
struct JsChartConfig {
    #[serde(default)]
    priority_order: Option<Vec<String>>,
    #[serde(default)]
    status_order: Option<Vec<String>>,
    #[serde(default)]
    placeholder: Option<String>,
}

impl From<JsChartConfig> for ChartConfig {
    fn from(cfg: JsChartConfig) -> Self {
        let mut base = ChartConfig::default();
        if let Some(tokens) = cfg.priority_order {
            base.priority_order = PriorityOrder::new(tokens);
        }
        if let Some(tokens) = cfg.status_order {
            base.status_order = PriorityOrder::new(tokens);
        }
        if let Some(placeholder) = cfg.placeholder {
            base.placeholder = placeholder;
        }
        base
    }
}

fn read_config(config: Option<JsValue>) -> Result<ChartConfig, JsValue> {
    let cfg = match config {
        Some(js_cfg) if !js_cfg.is_undefined() && !js_cfg.is_null() => {
            let cfg: JsChartConfig = from_value(js_cfg)
                .map_err(|err| JsValue::from_str(&format!("Không đọc được config: {err}")))?;
            ChartConfig::from(cfg)
        }
        _ => ChartConfig::default(),
    };
    cfg.validate()
        .map_err(|err| JsValue::from_str(&format_chart_error(err)))?;
    Ok(cfg)
}

fn init() {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();
}

/// Y lệnh xét nghiệm, chẩn đoán hình ảnh: chỉ giữ bản hiện hành, gom theo ngày.
#[wasm_bindgen(js_name = consolidateOrders)]
pub fn consolidate_orders_js(
    orders: JsValue,
    config: Option<JsValue>,
) -> Result<JsValue, JsValue> {
    init();

    let orders: Vec<ClinicalOrder> = from_value(orders)
        .map_err(|err| JsValue::from_str(&format!("Không đọc được y lệnh: {err}")))?;
    let cfg = read_config(config)?;

    to_value(&consolidate_orders(&orders, &cfg))
        .map_err(|err| JsValue::from_str(&format!("Không serialize y lệnh: {err}")))
}

/// Y lệnh thuốc xếp theo trạng thái, rồi mức ưu tiên, rồi khoảng cách ngày bắt
/// đầu tới `today` (`YYYY-MM-DD`, mặc định là ngày UTC hiện tại).
#[wasm_bindgen(js_name = consolidateMedications)]
pub fn consolidate_medications_js(
    medications: JsValue,
    today: Option<String>,
    config: Option<JsValue>,
) -> Result<JsValue, JsValue> {
    init();

    let medications: Vec<MedicationOrder> = from_value(medications)
        .map_err(|err| JsValue::from_str(&format!("Không đọc được y lệnh thuốc: {err}")))?;
    let cfg = read_config(config)?;
    let today = parse_today(today.as_deref())
        .map_err(|err| JsValue::from_str(&format_chart_error(err)))?;

    to_value(&consolidate_medications(&medications, &cfg, today))
        .map_err(|err| JsValue::from_str(&format!("Không serialize y lệnh thuốc: {err}")))
}

/// Flowsheet chỉ số sống từ ma trận quan sát và metadata khái niệm.
#[wasm_bindgen(js_name = buildFlowsheet)]
pub fn build_flowsheet_js(
    observations: JsValue,
    concepts: JsValue,
    config: Option<JsValue>,
) -> Result<JsValue, JsValue> {
    init();

    let observations: ObservationMatrix = from_value(observations)
        .map_err(|err| JsValue::from_str(&format!("Không đọc được dữ liệu quan sát: {err}")))?;
    let concepts: Vec<ConceptDetail> = if concepts.is_undefined() || concepts.is_null() {
        Vec::new()
    } else {
        from_value(concepts)
            .map_err(|err| JsValue::from_str(&format!("Không đọc được metadata khái niệm: {err}")))?
    };
    let cfg = read_config(config)?;

    to_value(&build_flowsheet(&observations, &concepts, &cfg.placeholder))
        .map_err(|err| JsValue::from_str(&format!("Không serialize flowsheet: {err}")))
}

/// Tóm tắt toàn bộ bệnh án từ một object đầu vào, cùng dạng với đầu vào của CLI.
#[wasm_bindgen(js_name = summarizeChart)]
pub fn summarize_chart(input: JsValue, config: Option<JsValue>) -> Result<JsValue, JsValue> {
    init();

    let input_value = from_value::<serde_json::Value>(input)
        .map_err(|err| JsValue::from_str(&format!("Không đọc được dữ liệu bệnh án: {err}")))?;
    let cfg = read_config(config)?;

    let snapshot = chart_core::summarize_value(&input_value, &cfg)
        .map_err(|err| JsValue::from_str(&format_chart_error(err)))?;

    to_value(&snapshot)
        .map_err(|err| JsValue::from_str(&format!("Không serialize snapshot: {err}")))
}

fn parse_today(today: Option<&str>) -> Result<NaiveDate, ChartError> {
    match today {
        Some(text) => chart_core::parse_day(text)
            .ok_or_else(|| ChartError::Parse(format!("Ngày today không hợp lệ: {text}"))),
        None => Ok(Utc::now().date_naive()),
    }
}

fn format_chart_error(err: ChartError) -> String {
    format!("Chart error: {err}")
}
