// ==========================================
// 施肥推荐引擎 - 参考数据目录（可热替换）
// ==========================================
// 职责: 持有当前参考数据快照，支持整体原子替换
// 红线: 进行中的调用始终看到同一个快照（Arc 克隆后与目录解耦）
// ==========================================

use crate::reference::store::ReferenceData;
use arc_swap::ArcSwap;
use std::sync::Arc;

/// 读取方无锁获取一致快照，写入方原子替换
pub struct ReferenceCatalog {
    current: ArcSwap<ReferenceData>,
}

impl ReferenceCatalog {
    pub fn new(data: ReferenceData) -> Self {
        Self {
            current: ArcSwap::from_pointee(data),
        }
    }

    /// 获取当前快照
    pub fn snapshot(&self) -> Arc<ReferenceData> {
        self.current.load_full()
    }

    /// 整体替换快照，返回旧快照
    pub fn replace(&self, data: ReferenceData) -> Arc<ReferenceData> {
        tracing::info!(
            crops = data.crops().len(),
            products = data.products().len(),
            soils = data.soils().len(),
            "参考数据已替换"
        );
        self.current.swap(Arc::new(data))
    }
}

impl Default for ReferenceCatalog {
    fn default() -> Self {
        Self::new(ReferenceData::builtin())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::crop::CropRequirement;

    #[test]
    fn test_snapshot_survives_replace() {
        let catalog = ReferenceCatalog::default();
        let before = catalog.snapshot();

        let replacement = ReferenceData::new(
            vec![CropRequirement::new("Millet", 40.0, 20.0, 20.0, 3)],
            before.products().to_vec(),
            before.soils().to_vec(),
        );
        catalog.replace(replacement);

        // 旧快照仍然完整可用
        assert_eq!(before.crops().len(), 10);
        assert!(before.find_crop("Wheat").is_ok());

        let after = catalog.snapshot();
        assert_eq!(after.crop_names(), vec!["Millet".to_string()]);
        assert!(after.find_crop("Wheat").is_err());
    }

    #[test]
    fn test_replace_returns_previous_snapshot() {
        let catalog = ReferenceCatalog::default();
        let current = catalog.snapshot();

        let previous = catalog.replace(ReferenceData::new(Vec::new(), Vec::new(), Vec::new()));
        assert!(Arc::ptr_eq(&previous, &current));
        assert!(catalog.snapshot().crops().is_empty());
    }
}
