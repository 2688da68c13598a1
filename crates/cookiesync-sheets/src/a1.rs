//! A1-notation helpers.

/// Quotes a sheet title for use in a range. Embedded single quotes are
/// doubled.
#[must_use]
pub fn quote_sheet(title: &str) -> String {
    format!("'{}'", title.replace('\'', "''"))
}

/// Column letters for a 1-based column number: 1 → `A`, 27 → `AA`.
#[must_use]
pub fn column_letter(mut column: usize) -> String {
    let mut letters = Vec::new();
    while column > 0 {
        let rem = (column - 1) % 26;
        // rem < 26
        #[allow(clippy::cast_possible_truncation)]
        letters.push(char::from(b'A' + rem as u8));
        column = (column - 1) / 26;
    }
    letters.iter().rev().collect()
}

/// The whole sheet.
#[must_use]
pub fn sheet_range(title: &str) -> String {
    quote_sheet(title)
}

/// One row spanning `columns` columns, e.g. `'Stock'!A7:E7`.
#[must_use]
pub fn row_range(title: &str, row: usize, columns: usize) -> String {
    format!(
        "{}!A{row}:{}{row}",
        quote_sheet(title),
        column_letter(columns)
    )
}

/// The block of `rows` rows and `columns` columns starting at A1.
#[must_use]
pub fn block_range(title: &str, rows: usize, columns: usize) -> String {
    format!(
        "{}!A1:{}{}",
        quote_sheet(title),
        column_letter(columns),
        rows.max(1)
    )
}

/// Columns A through `columns`, all rows. Used as the table for appends.
#[must_use]
pub fn columns_range(title: &str, columns: usize) -> String {
    format!("{}!A:{}", quote_sheet(title), column_letter(columns))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_letters() {
        assert_eq!(column_letter(1), "A");
        assert_eq!(column_letter(5), "E");
        assert_eq!(column_letter(26), "Z");
        assert_eq!(column_letter(27), "AA");
        assert_eq!(column_letter(703), "AAA");
    }

    #[test]
    fn titles_are_quoted() {
        assert_eq!(quote_sheet("庫存狀態"), "'庫存狀態'");
        assert_eq!(quote_sheet("Bob's"), "'Bob''s'");
    }

    #[test]
    fn ranges() {
        assert_eq!(row_range("Stock", 7, 5), "'Stock'!A7:E7");
        assert_eq!(block_range("Stock", 3, 9), "'Stock'!A1:I3");
        assert_eq!(block_range("Stock", 0, 2), "'Stock'!A1:B1");
        assert_eq!(columns_range("Stock", 6), "'Stock'!A:F");
        assert_eq!(sheet_range("Stock"), "'Stock'");
    }
}
