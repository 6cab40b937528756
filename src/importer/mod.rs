// ==========================================
// 施肥推荐引擎 - 导入层
// ==========================================
// 职责: 外部参考表（CSV / Excel）导入为参考数据快照
// ==========================================

pub mod error;
pub mod file_parser;
pub mod reference_importer;

pub use error::{ImportError, ImportResult};
pub use file_parser::{CsvParser, ExcelParser, FileParser, RawRecord, UniversalFileParser};
pub use reference_importer::ReferenceImporter;
