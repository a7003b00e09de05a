//! Logic lõi hợp nhất y lệnh và chỉ số sống thành các bảng sẵn sàng hiển thị.
//!
//! Y lệnh được rút gọn về bản sửa đổi hiện hành, xếp hạng theo mức ưu tiên và
//! trạng thái rồi gom theo ngày. Chỉ số sống được dàn thành flowsheet, các khái
//! niệm liên quan dùng chung một dòng.

use serde::{Deserialize, Serialize};

pub mod flowsheet;
pub mod group;
pub mod rank;
pub mod records;
pub mod revision;
pub mod sort;
pub mod summary;

pub use flowsheet::{
    build_flowsheet, CompositeValue, ConceptDetail, ConceptGroup, ConceptIndex, FlowSheet,
    FlowSheetRow, GroupDefinition, GroupMember, MemberCell, MemberRole, ObservationMatrix,
    ObservedValue,
};
pub use group::{
    day_key, day_key_or_undated, group_by_date, parse_day, sort_groups_descending, DateGroup,
    UNDATED_KEY,
};
pub use rank::{rank, PriorityOrder, UNRANKED};
pub use records::{ClinicalOrder, MedicationOrder, OrderKind, OrderRecord};
pub use revision::{is_involved_in_revision, resolve_revisions, superseded_ids, Revisable};
pub use sort::{
    sort_by_date_distance, sort_by_priority_then_status, sort_by_rank, sort_by_ranks,
    sort_orders_by_date_distance, RankKey, RankPass,
};
pub use summary::{
    consolidate_medications, consolidate_orders, summarize, summarize_str, summarize_value,
    ChartInput, ChartSnapshot, VitalsInput,
};

/// Ký hiệu hiển thị cho thành phần nhóm không được đo.
pub const DEFAULT_PLACEHOLDER: &str = "--";

/// Cấu hình thứ tự ưu tiên và hiển thị cho bộ sắp xếp và flowsheet.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ChartConfig {
    /// Mức khẩn của y lệnh, khẩn nhất đứng đầu.
    pub priority_order: PriorityOrder,
    /// Trạng thái vòng đời, khóa chính khi liệt kê y lệnh.
    pub status_order: PriorityOrder,
    /// Thay cho giá trị vắng mặt trong ô tổng hợp, không được rỗng.
    pub placeholder: String,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            priority_order: PriorityOrder::order_priority(),
            status_order: PriorityOrder::lifecycle_status(),
            placeholder: DEFAULT_PLACEHOLDER.to_string(),
        }
    }
}

impl ChartConfig {
    /// Kiểm tra cấu hình trước khi dùng.
    pub fn validate(&self) -> Result<(), ChartError> {
        self.priority_order.validate()?;
        self.status_order.validate()?;
        if self.placeholder.is_empty() {
            return Err(ChartError::InvalidConfig(
                "placeholder không được rỗng".to_string(),
            ));
        }
        Ok(())
    }
}

/// Lỗi ở ranh giới đọc dữ liệu và cấu hình.
///
/// Bản thân các hàm hợp nhất không bao giờ lỗi.
#[derive(Debug, thiserror::Error)]
pub enum ChartError {
    #[error("Dữ liệu đầu vào thiếu thông tin tối thiểu")]
    MissingData,
    #[error("Không đọc được dữ liệu: {0}")]
    Parse(String),
    #[error("Cấu hình không hợp lệ: {0}")]
    InvalidConfig(String),
}

impl From<serde_json::Error> for ChartError {
    fn from(err: serde_json::Error) -> Self {
        ChartError::Parse(err.to_string())
    }
}
