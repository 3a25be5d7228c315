//! 持久化层
//!
//! - `json_file`：JSON 读写，写入采用"临时文件 + 重命名"
//! - `discovery`：按 glob 查找输入文件
//! - `vocabulary_store`：词汇文件加载与带备份的保存
//! - `report_store`：评估报告读写

pub mod discovery;
pub mod json_file;
pub mod report_store;
pub mod vocabulary_store;

pub use discovery::{ensure_dir, find_files, find_files_nonempty};
pub use json_file::{read_json, write_json, JsonStyle};
pub use report_store::{discover_reports, level_from_stem, read_report, report_path, write_report, ReportFile};
pub use vocabulary_store::{load_vocabulary, VocabularyStore};
