//! Built-in SQL for the ERP tables, with positional `@Pn` parameters.
//!
//! Custom queries replace these entirely and must return the same column
//! aliases.

/// SQL Server rejects requests with more than 2100 parameters.
pub const ITEM_INFO_CHUNK: usize = 500;

fn placeholders(first: usize, count: usize) -> String {
    (first..first + count)
        .map(|n| format!("@P{n}"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Current stock per cookie and warehouse: the period's opening balance
/// (`INVLC`) plus every movement (`INVLA`) dated on or after the first of the
/// period, signed by direction.
///
/// Parameters: `@P1` period (`YYYYMM`), `@P2` first movement date
/// (`YYYYMMDD`), then one per warehouse.
#[must_use]
pub fn stock_query(warehouse_count: usize) -> String {
    format!(
        "SELECT
    LC.LC001 AS cookie_code,
    LC.LC003 AS warehouse_code,
    LC.LC004 + COALESCE(SUM(LA.LA011 * LA.LA005), 0) AS qty,
    MB.MB004 AS unit
FROM INVLC LC
LEFT JOIN INVLA LA
    ON LA.LA001 = LC.LC001
    AND LA.LA009 = LC.LC003
    AND LA.LA004 >= @P2
LEFT JOIN INVMB MB
    ON MB.MB001 = LC.LC001
WHERE LC.LC001 IS NOT NULL
    AND LC.LC002 = @P1
    AND LC.LC003 IN ({})
GROUP BY LC.LC001, LC.LC003, LC.LC004, MB.MB004",
        placeholders(3, warehouse_count)
    )
}

/// Issued-but-not-produced quantity of every manufacturing order in
/// production (`TA011 = '3'`).
///
/// With `since`, `@P1` is the earliest opening date (`YYYYMMDD`).
#[must_use]
pub fn wip_query(since: bool) -> String {
    let mut sql = String::from(
        "SELECT
    TA.TA001 AS mo_number_type,
    TA.TA002 AS mo_number,
    TA.TA006 AS cookie_code,
    TA.TA016 - TA.TA017 AS wip_qty,
    TA.TA007 AS unit
FROM MOCTA TA
WHERE TA.TA011 = '3'",
    );
    if since {
        sql.push_str("\n    AND TA.TA003 >= @P1");
    }
    sql
}

/// Name and weights from the item master for `count` codes.
#[must_use]
pub fn item_info_query(count: usize) -> String {
    format!(
        "SELECT
    MB.MB001 AS item_code,
    MB.MB002 AS item_name,
    MB.MB104 AS raw_weight,
    MB.MB105 AS cooked_weight
FROM INVMB MB
WHERE MB.MB001 IN ({})",
        placeholders(1, count)
    )
}
