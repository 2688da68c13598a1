//! The ERP queries the commands depend on, behind a trait so pipelines can be
//! exercised without a database.

use std::collections::HashMap;

use cookiesync_core::{ItemInfo, StockRecord, WipRecord};
use cookiesync_erp::{ErpClient, ErpError};

pub(crate) trait ErpSource {
    async fn stock_levels(&mut self) -> Result<Vec<StockRecord>, ErpError>;

    async fn wip_levels(&mut self) -> Result<Vec<WipRecord>, ErpError>;

    async fn item_info(&mut self, codes: &[String]) -> Result<HashMap<String, ItemInfo>, ErpError>;
}

impl ErpSource for ErpClient {
    async fn stock_levels(&mut self) -> Result<Vec<StockRecord>, ErpError> {
        ErpClient::stock_levels(self).await
    }

    async fn wip_levels(&mut self) -> Result<Vec<WipRecord>, ErpError> {
        ErpClient::wip_levels(self).await
    }

    async fn item_info(&mut self, codes: &[String]) -> Result<HashMap<String, ItemInfo>, ErpError> {
        ErpClient::item_info(self, codes).await
    }
}

/// Canned ERP results for pipeline tests.
#[cfg(test)]
#[derive(Default)]
pub(crate) struct FakeErp {
    pub stock: Vec<StockRecord>,
    pub wip: Vec<WipRecord>,
    pub items: HashMap<String, ItemInfo>,
    /// Fail `item_info` with a missing-setting error.
    pub fail_item_info: bool,
    pub item_info_requests: Vec<Vec<String>>,
}

#[cfg(test)]
impl ErpSource for FakeErp {
    async fn stock_levels(&mut self) -> Result<Vec<StockRecord>, ErpError> {
        Ok(self.stock.clone())
    }

    async fn wip_levels(&mut self) -> Result<Vec<WipRecord>, ErpError> {
        Ok(self.wip.clone())
    }

    async fn item_info(&mut self, codes: &[String]) -> Result<HashMap<String, ItemInfo>, ErpError> {
        self.item_info_requests.push(codes.to_vec());
        if self.fail_item_info {
            return Err(ErpError::NotConfigured("ERP_HOST"));
        }
        Ok(codes
            .iter()
            .filter_map(|code| self.items.get(code).map(|info| (code.clone(), info.clone())))
            .collect())
    }
}
