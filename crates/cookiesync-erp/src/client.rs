use std::collections::HashMap;

use cookiesync_core::{ItemInfo, StockRecord, WipRecord};
use tiberius::{AuthMethod, Client, Config, Query};
use tokio::net::TcpStream;
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};

use crate::queries::{item_info_query, stock_query, wip_query, ITEM_INFO_CHUNK};
use crate::rows::{item_info, require_columns, stock_record, wip_record, NamedRow};
use crate::{ErpConfig, ErpError};

const APPLICATION_NAME: &str = "cookiesync";

/// An open TDS connection to the ERP database.
pub struct ErpClient {
    client: Client<Compat<TcpStream>>,
    config: ErpConfig,
}

impl ErpClient {
    /// Opens a TCP connection and logs in with SQL Server authentication.
    ///
    /// # Errors
    ///
    /// Returns [`ErpError::Io`] if the server is unreachable and
    /// [`ErpError::Sql`] if the TLS handshake or login fails.
    pub async fn connect(config: ErpConfig) -> Result<Self, ErpError> {
        let mut tds = Config::new();
        tds.host(&config.host);
        tds.port(config.port);
        tds.database(&config.database);
        tds.application_name(APPLICATION_NAME);
        tds.authentication(AuthMethod::sql_server(&config.username, &config.password));
        if config.trust_cert {
            tds.trust_cert();
        }

        let tcp = TcpStream::connect(tds.get_addr()).await?;
        tcp.set_nodelay(true)?;
        let client = Client::connect(tds, tcp.compat_write()).await?;

        tracing::info!(
            host = %config.host,
            port = config.port,
            database = %config.database,
            "connected to ERP"
        );
        Ok(Self { client, config })
    }

    /// Current stock per cookie and warehouse.
    ///
    /// Runs the configured custom query verbatim when there is one.
    /// Otherwise the built-in query runs for the configured period and
    /// warehouses.
    ///
    /// # Errors
    ///
    /// Returns [`ErpError`] if the query fails or a row cannot be decoded.
    pub async fn stock_levels(&mut self) -> Result<Vec<StockRecord>, ErpError> {
        let rows = match self.config.stock_query.clone() {
            Some(sql) => self.fetch(&sql, Vec::new()).await?,
            None => {
                let mut params = vec![
                    self.config.stock_period.clone(),
                    self.config.movement_since.clone(),
                ];
                params.extend(self.config.warehouses.iter().cloned());
                self.fetch(&stock_query(self.config.warehouses.len()), params)
                    .await?
            }
        };
        require_columns(&rows, &["cookie_code", "qty"])?;
        let records: Vec<StockRecord> = rows.iter().map(stock_record).collect::<Result<_, _>>()?;
        tracing::info!(
            rows = records.len(),
            period = %self.config.stock_period,
            "fetched ERP stock"
        );
        Ok(records)
    }

    /// Work in progress per manufacturing order.
    ///
    /// # Errors
    ///
    /// Returns [`ErpError`] if the query fails or a row cannot be decoded.
    pub async fn wip_levels(&mut self) -> Result<Vec<WipRecord>, ErpError> {
        let rows = match (self.config.wip_query.clone(), self.config.wip_since.clone()) {
            (Some(sql), _) => self.fetch(&sql, Vec::new()).await?,
            (None, Some(since)) => self.fetch(&wip_query(true), vec![since]).await?,
            (None, None) => self.fetch(&wip_query(false), Vec::new()).await?,
        };
        require_columns(
            &rows,
            &["cookie_code", "mo_number_type", "mo_number", "wip_qty"],
        )?;
        let records: Vec<WipRecord> = rows.iter().map(wip_record).collect::<Result<_, _>>()?;
        tracing::info!(rows = records.len(), "fetched ERP work in progress");
        Ok(records)
    }

    /// Item master data for `codes`, keyed by code. Codes the ERP does not
    /// know are absent from the result.
    ///
    /// # Errors
    ///
    /// Returns [`ErpError`] if a query fails or a row cannot be decoded.
    pub async fn item_info(
        &mut self,
        codes: &[String],
    ) -> Result<HashMap<String, ItemInfo>, ErpError> {
        let mut info = HashMap::new();
        for chunk in codes.chunks(ITEM_INFO_CHUNK) {
            let rows = self
                .fetch(&item_info_query(chunk.len()), chunk.to_vec())
                .await?;
            for row in &rows {
                let item = item_info(row)?;
                if !item.code.is_empty() {
                    info.insert(item.code.clone(), item);
                }
            }
        }
        tracing::info!(
            requested = codes.len(),
            found = info.len(),
            "fetched ERP item info"
        );
        Ok(info)
    }

    async fn fetch(&mut self, sql: &str, params: Vec<String>) -> Result<Vec<NamedRow>, ErpError> {
        tracing::debug!(params = params.len(), "running ERP query");
        let mut query = Query::new(sql.to_string());
        for param in params {
            query.bind(param);
        }
        let rows = query
            .query(&mut self.client)
            .await?
            .into_first_result()
            .await?;
        Ok(rows.into_iter().map(NamedRow::from_row).collect())
    }
}
